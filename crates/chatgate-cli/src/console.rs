//! CLI console utilities

use colored::*;

/// Formatted status output
///
/// Replay writes wire events to stdout, so its console is built with
/// `stderr` and never interleaves with the stream.
pub struct CliConsole {
    verbose: bool,
    stderr: bool,
}

impl CliConsole {
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            stderr: false,
        }
    }

    /// Console that writes everything to stderr
    pub const fn stderr(verbose: bool) -> Self {
        Self {
            verbose,
            stderr: true,
        }
    }

    fn line(&self, text: String) {
        if self.stderr {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.verbose {
            self.line(format!("{} {}", "ℹ".blue().bold(), message));
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.line(format!("{} {}", "✓".green().bold(), message.green()));
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.line(format!("{} {}", "⚠".yellow().bold(), message.yellow()));
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        self.line(String::new());
        self.line(title.bold().underline().to_string());
        self.line("=".repeat(title.len()).dimmed().to_string());
    }

    /// Print a separator
    pub fn print_separator(&self) {
        if self.verbose {
            self.line("-".repeat(50).dimmed().to_string());
        }
    }

    /// Print an indented `key: value` pair
    pub fn field(&self, key: &str, value: impl std::fmt::Display) {
        self.line(format!("  {} {}", format!("{}:", key).dimmed(), value));
    }
}

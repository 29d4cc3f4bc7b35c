//! Rate-limit probe

use crate::args::ProbeArgs;
use crate::console::CliConsole;
use chatgate_core::config::load_config;
use chatgate_core::error::GatewayError;
use chatgate_core::rate_limit::{RateLimitHeaders, TieredRateLimiter, WindowedCounterStore};
use chatgate_core::types::RequestContext;
use colored::*;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Evaluate `count` admissions for one caller against a fresh store
pub async fn execute(config_file: Option<&Path>, args: &ProbeArgs) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let config = load_config(config_file)?;

    let limiter = TieredRateLimiter::new(
        Arc::new(WindowedCounterStore::new()),
        Arc::new(config.rate_limit),
    );
    let sweep = CancellationToken::new();
    let _sweeper = limiter.spawn_sweeper(sweep.clone());
    let _stop_sweeper = sweep.drop_guard();
    let mut context = RequestContext::new(args.addr.clone(), args.route.clone());
    if let Some(identity) = &args.identity {
        context = context.with_identity(identity.clone());
    }

    console.print_header("Rate-limit probe");
    let plan = limiter.plan(&context);
    if plan.is_empty() {
        console.warn("Rate limiting is disabled; every request is admitted");
    }
    for check in &plan {
        console.field(
            check.tier.as_str(),
            format!(
                "{} ({} per {}s)",
                check.key,
                check.limit,
                check.window.as_secs()
            ),
        );
    }
    console.print_separator();

    let mut admitted = 0u32;
    for attempt in 1..=args.count {
        match limiter.check(&context) {
            Ok(admission) => {
                admitted += 1;
                println!("#{:<4} {}", attempt, "allowed".green());
                if let Some(headers) = admission.headers {
                    print_headers(&headers);
                }
            }
            Err(GatewayError::RateLimitExceeded { tier, headers, .. }) => {
                println!(
                    "#{:<4} {} by {} tier (429)",
                    attempt,
                    "denied".red(),
                    tier
                );
                print_headers(&headers);
            }
            Err(e) => return Err(e.into()),
        }
    }

    console.print_separator();
    console.success(&format!("{} of {} admitted", admitted, args.count));
    Ok(())
}

fn print_headers(headers: &RateLimitHeaders) {
    for (name, value) in headers.pairs() {
        println!("      {} {}", format!("{}:", name).dimmed(), value);
    }
}

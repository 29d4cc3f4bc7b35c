//! Incremental Server-Sent Events decoder for model backend responses
//!
//! Network reads do not line up with SSE frames: a read may end in the
//! middle of an event, in the middle of a line, or in the middle of a
//! multi-byte UTF-8 character. The decoder buffers all three cases and only
//! yields complete events.

mod event;

pub use event::SseEvent;

/// Buffered SSE parser
///
/// ```text
/// event: content_block_delta
/// data: {"type":"content_block_delta", ...}
///
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Decoded text not yet terminated by a blank line
    buffer: String,
    /// Trailing bytes of a UTF-8 character cut by a read boundary
    pending_utf8: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read, returning every event it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let bytes = if self.pending_utf8.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending_utf8);
            joined.extend_from_slice(chunk);
            joined
        };

        let (text, rest) = split_utf8(&bytes);
        self.pending_utf8 = rest;
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = self.next_boundary() {
            let block: String = self.buffer.drain(..end).collect();
            self.buffer.drain(..delimiter_len);
            if let Some(event) = parse_block(&block) {
                events.push(event);
            }
        }
        events
    }

    /// Flush an event left unterminated when the byte stream ended
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.pending_utf8.clear();
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending_utf8.clear();
    }

    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty() || !self.pending_utf8.is_empty()
    }

    pub fn remaining(&self) -> &str {
        &self.buffer
    }

    /// Position and length of the earliest blank-line delimiter
    fn next_boundary(&self) -> Option<(usize, usize)> {
        let lf = self.buffer.find("\n\n").map(|pos| (pos, 2));
        let crlf = self.buffer.find("\r\n\r\n").map(|pos| (pos, 4));
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        }
    }
}

/// Decode as much of `bytes` as is valid UTF-8, returning the undecoded tail
///
/// A tail is only kept when it is the truncated prefix of a character.
/// Each invalid sequence becomes U+FFFD and decoding resumes after it.
fn split_utf8(bytes: &[u8]) -> (String, Vec<u8>) {
    let mut text = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                return (text, Vec::new());
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                text.push_str(&String::from_utf8_lossy(valid));
                match e.error_len() {
                    None => return (text, after.to_vec()),
                    Some(len) => {
                        tracing::warn!(
                            position = text.len(),
                            "Invalid UTF-8 in provider stream, replacing"
                        );
                        text.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    }
                }
            }
        }
    }
}

/// Parse one event block; blocks without `data:` lines yield nothing
fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut id = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => event_type = Some(value.trim().to_string()),
            "data" => data.push(value),
            "id" => id = Some(value.trim().to_string()),
            // retry and unknown fields
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data.join("\n"),
        id,
    })
}

#[cfg(test)]
mod tests;

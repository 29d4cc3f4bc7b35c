//! Pairs tool invocations with results that arrive later in the stream

use chatgate_session::ToolCallRecord;
use serde_json::Value;
use std::collections::HashMap;

/// A call seen on the stream whose result has not arrived yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingToolCall {
    pub call_id: String,
    pub name: String,
    /// Final arguments; buffered JSON text is parsed when possible
    pub arguments: Value,
}

impl PendingToolCall {
    pub fn into_record(self, result: Value) -> ToolCallRecord {
        ToolCallRecord::new(self.name, self.arguments, result)
    }
}

/// Arguments as they are assembled from fragments
#[derive(Debug, Clone, Default)]
enum ArgumentBuffer {
    #[default]
    Empty,
    Text(String),
    Value(Value),
}

impl ArgumentBuffer {
    fn merge(&mut self, arguments: Value) {
        match arguments {
            Value::Null => {}
            Value::String(fragment) => match self {
                Self::Text(text) => text.push_str(&fragment),
                _ => *self = Self::Text(fragment),
            },
            value => *self = Self::Value(value),
        }
    }

    fn finalize(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Value(value) => value,
            Self::Text(text) if text.trim().is_empty() => Value::Null,
            Self::Text(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct InFlight {
    name: String,
    arguments: ArgumentBuffer,
}

/// In-flight map from call id to invocation
///
/// Built fresh for each stream. A call id is matched at most once; a second
/// result for the same id finds nothing.
#[derive(Debug, Default)]
pub struct ToolCallCorrelator {
    in_flight: HashMap<String, InFlight>,
}

impl ToolCallCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call, or merge another fragment of one already pending
    ///
    /// String arguments are appended to earlier string fragments; any other
    /// JSON value replaces what was buffered. The first non-empty name wins.
    pub fn observe_call(&mut self, call_id: &str, name: &str, arguments: Value) {
        let entry = self.in_flight.entry(call_id.to_string()).or_default();
        if entry.name.is_empty() && !name.is_empty() {
            entry.name = name.to_string();
        }
        entry.arguments.merge(arguments);
    }

    /// Remove and return the call this result answers
    ///
    /// `None` when the id was never observed or was already matched.
    pub fn observe_result(&mut self, call_id: &str) -> Option<PendingToolCall> {
        let in_flight = self.in_flight.remove(call_id)?;
        Some(PendingToolCall {
            call_id: call_id.to_string(),
            name: in_flight.name,
            arguments: in_flight.arguments.finalize(),
        })
    }

    pub fn is_pending(&self, call_id: &str) -> bool {
        self.in_flight.contains_key(call_id)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Discard every unmatched call, returning their ids
    pub fn clear(&mut self) -> Vec<String> {
        self.in_flight.drain().map(|(id, _)| id).collect()
    }
}

//! Log event type posted to the internal bus.

use serde::{Deserialize, Serialize};

use crate::dispatch::severity::LogLevel;

/// A single log event. Built per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Free-form category, e.g. "Net" or "Login".
    pub tag: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEvent {
    pub fn new(tag: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            level,
            message: message.into(),
        }
    }

    /// Text used for captures: `[tag] message`.
    pub fn formatted(&self) -> String {
        format_capture(&self.tag, &self.message)
    }
}

pub(crate) fn format_capture(tag: &str, message: &str) -> String {
    format!("[{}] {}", tag, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted() {
        let event = LogEvent::new("Net", LogLevel::Warning, "timeout");
        assert_eq!(event.formatted(), "[Net] timeout");
    }

    #[test]
    fn test_event_json_shape() {
        let event = LogEvent::new("X", LogLevel::Fatal, "boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["tag"], "X");
        assert_eq!(json["level"], "Fatal");
        assert_eq!(json["message"], "boom");
    }
}

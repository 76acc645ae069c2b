//! Detection events and their timestamped form.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timestamp::format_offset;

/// A time position, in seconds, at which a frame is sampled.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SampleOffset(f64);

impl SampleOffset {
    /// Create an offset. Negative and non-finite values are clamped to zero.
    pub fn new(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self(seconds)
        } else {
            Self(0.0)
        }
    }

    /// Offset in seconds.
    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Display form (`MM:SS`).
    pub fn timestamp(&self) -> String {
        format_offset(self.0)
    }
}

impl fmt::Display for SampleOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// One event reported by the classifier for a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    /// Human-readable description of what was seen
    pub description: String,
    /// Whether the classifier flagged the moment as dangerous
    #[serde(default)]
    pub is_dangerous: bool,
}

impl DetectionEvent {
    pub fn new(description: impl Into<String>, is_dangerous: bool) -> Self {
        Self {
            description: description.into(),
            is_dangerous,
        }
    }
}

/// A detection event bound to the offset that produced it.
///
/// This is the unit of pipeline output and of saved records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimestampedEvent {
    /// `MM:SS` display timestamp
    pub timestamp: String,
    pub description: String,
    #[serde(default)]
    pub is_dangerous: bool,
}

impl TimestampedEvent {
    /// Bind a detection event to the offset it was sampled at.
    pub fn at(offset: SampleOffset, event: DetectionEvent) -> Self {
        Self {
            timestamp: offset.timestamp(),
            description: event.description,
            is_dangerous: event.is_dangerous,
        }
    }

    /// Whole seconds this event points at, for seeking.
    pub fn seek_seconds(&self) -> Option<u64> {
        crate::timestamp::parse_timestamp(&self.timestamp).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_event_wire_format() {
        let event: DetectionEvent =
            serde_json::from_str(r#"{"description":"Person detected","isDangerous":true}"#).unwrap();
        assert_eq!(event, DetectionEvent::new("Person detected", true));

        let missing_flag: DetectionEvent =
            serde_json::from_str(r#"{"description":"Empty hallway"}"#).unwrap();
        assert!(!missing_flag.is_dangerous);
    }

    #[test]
    fn test_timestamped_event_from_offset() {
        let event = TimestampedEvent::at(
            SampleOffset::new(63.4),
            DetectionEvent::new("Door forced open", true),
        );
        assert_eq!(event.timestamp, "01:03");
        assert_eq!(event.seek_seconds(), Some(63));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["isDangerous"], serde_json::json!(true));
        assert_eq!(json["timestamp"], serde_json::json!("01:03"));
    }

    #[test]
    fn test_sample_offset_clamps_invalid_values() {
        assert_eq!(SampleOffset::new(-1.0).seconds(), 0.0);
        assert_eq!(SampleOffset::new(f64::NAN).seconds(), 0.0);
        assert_eq!(SampleOffset::new(9.0).seconds(), 9.0);
    }
}

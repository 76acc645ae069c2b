//! Timestamp formatting and parsing for detected moments.
//!
//! Moments are displayed as `MM:SS`. Minutes are not wrapped into hours, so a
//! moment at 62 minutes 5 seconds reads `62:05`. Parsing also accepts `SS` and
//! `HH:MM:SS` so that values typed by hand can still be used to seek.

/// Format an offset in seconds as `MM:SS`.
///
/// Sub-second precision is dropped. Negative or non-finite offsets format as
/// `00:00`.
///
/// # Examples
/// ```
/// use vwatch_models::timestamp::format_offset;
/// assert_eq!(format_offset(3.0), "00:03");
/// assert_eq!(format_offset(75.9), "01:15");
/// ```
pub fn format_offset(offset_secs: f64) -> String {
    let whole = whole_seconds(offset_secs);
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Truncate an offset to whole seconds, clamping invalid values to zero.
pub fn whole_seconds(offset_secs: f64) -> u64 {
    if offset_secs.is_finite() && offset_secs > 0.0 {
        offset_secs.floor() as u64
    } else {
        0
    }
}

/// Parse a timestamp string to whole seconds.
///
/// Supports formats:
/// - `MM:SS`
/// - `HH:MM:SS`
/// - `SS`
///
/// # Examples
/// ```
/// use vwatch_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("00:03").unwrap(), 3);
/// assert_eq!(parse_timestamp("62:05").unwrap(), 3725);
/// assert_eq!(parse_timestamp("01:00:00").unwrap(), 3600);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<u64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    match parts.len() {
        1 => parse_component("seconds", parts[0]),
        2 => {
            let minutes = parse_component("minutes", parts[0])?;
            let seconds = parse_component("seconds", parts[1])?;
            combine(&[(minutes, 60), (seconds, 1)]).ok_or_else(|| overflow(ts))
        }
        3 => {
            let hours = parse_component("hours", parts[0])?;
            let minutes = parse_component("minutes", parts[1])?;
            let seconds = parse_component("seconds", parts[2])?;
            combine(&[(hours, 3600), (minutes, 60), (seconds, 1)]).ok_or_else(|| overflow(ts))
        }
        _ => Err(TimestampError::InvalidFormat(ts.to_string())),
    }
}

/// Sum of `value * unit` over all components; `None` on overflow.
fn combine(components: &[(u64, u64)]) -> Option<u64> {
    components
        .iter()
        .try_fold(0u64, |total, &(value, unit)| {
            value.checked_mul(unit).and_then(|secs| total.checked_add(secs))
        })
}

fn overflow(ts: &str) -> TimestampError {
    TimestampError::InvalidValue("timestamp", ts.to_string())
}

fn parse_component(name: &'static str, value: &str) -> Result<u64, TimestampError> {
    let value = value.trim();
    if value.starts_with('-') {
        return Err(TimestampError::Negative);
    }
    value
        .parse::<u64>()
        .map_err(|_| TimestampError::InvalidValue(name, value.to_string()))
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp contains negative values
    Negative,
    /// Invalid numeric value for a component
    InvalidValue(&'static str, String),
    /// Invalid timestamp format
    InvalidFormat(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative => write!(f, "Timestamp cannot be negative"),
            Self::InvalidValue(component, value) => {
                write!(f, "Invalid {} value: {}", component, value)
            }
            Self::InvalidFormat(ts) => write!(
                f,
                "Invalid timestamp format '{}'. Use MM:SS, HH:MM:SS or SS",
                ts
            ),
        }
    }
}

impl std::error::Error for TimestampError {}

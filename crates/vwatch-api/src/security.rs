//! Input validation for video sources, names and IDs.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::warn;
use url::Url;

/// Maximum source length (path or URL).
pub const MAX_SOURCE_LENGTH: usize = 2048;

/// Maximum display name length.
pub const MAX_NAME_LENGTH: usize = 200;

/// Cloud metadata and link-local endpoints a URL source must never reach.
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://169\.254\.",
        r"^https?://metadata\.google\.internal",
        r"^https?://\[?fe80:",
        r"^https?://0\.0\.0\.0",
    ]
    .into_iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Result of source validation.
#[derive(Debug, PartialEq, Eq)]
pub enum SourceValidationResult {
    /// Source is a usable local path or URL.
    Valid(String),
    /// Source is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL targets a blocked endpoint.
    Blocked(String),
    /// Source exceeds maximum length.
    TooLong,
}

impl SourceValidationResult {
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Valid(source) => Ok(source),
            Self::Invalid(msg) | Self::Blocked(msg) => Err(msg),
            Self::TooLong => Err(format!(
                "Source exceeds maximum length of {} characters",
                MAX_SOURCE_LENGTH
            )),
        }
    }
}

/// Validate a video source: a local path, or an http(s) URL.
pub fn validate_source(source: &str) -> SourceValidationResult {
    if source.len() > MAX_SOURCE_LENGTH {
        return SourceValidationResult::TooLong;
    }

    let source = source.trim();
    if source.is_empty() {
        return SourceValidationResult::Invalid("Source cannot be empty".to_string());
    }
    if source.chars().any(char::is_control) {
        return SourceValidationResult::Invalid(
            "Source contains control characters".to_string(),
        );
    }

    if !source.contains("://") {
        return SourceValidationResult::Valid(source.to_string());
    }

    let parsed = match Url::parse(source) {
        Ok(u) => u,
        Err(e) => return SourceValidationResult::Invalid(format!("Invalid URL format: {}", e)),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return SourceValidationResult::Invalid(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return SourceValidationResult::Invalid("URL must have a valid host".to_string());
    }

    if BLOCKED_PATTERNS.iter().any(|p| p.is_match(source)) {
        warn!(source = %source, "Blocked URL pattern detected");
        return SourceValidationResult::Blocked(
            "URL appears to target an internal or restricted endpoint".to_string(),
        );
    }

    SourceValidationResult::Valid(source.to_string())
}

/// Trim a display name, drop control characters and cap its length.
pub fn sanitize_name(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LENGTH)
        .collect()
}

/// Run and video IDs: alphanumerics, hyphens and underscores, at most 64 chars.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_paths_pass_through() {
        assert_eq!(
            validate_source("  /videos/lobby.mp4 "),
            SourceValidationResult::Valid("/videos/lobby.mp4".to_string())
        );
        assert!(validate_source("clips/door cam.webm").into_result().is_ok());
    }

    #[test]
    fn test_http_urls() {
        assert!(validate_source("https://cdn.example.com/a.mp4").into_result().is_ok());
        assert!(validate_source("http://10.0.0.5:8080/stream.mp4").into_result().is_ok());
    }

    #[test]
    fn test_rejected_sources() {
        assert!(matches!(validate_source(""), SourceValidationResult::Invalid(_)));
        assert!(matches!(validate_source("   "), SourceValidationResult::Invalid(_)));
        assert!(matches!(
            validate_source("ftp://example.com/a.mp4"),
            SourceValidationResult::Invalid(_)
        ));
        assert!(matches!(
            validate_source("file:///etc/passwd"),
            SourceValidationResult::Invalid(_)
        ));
        assert!(matches!(
            validate_source("http://169.254.169.254/latest/meta-data"),
            SourceValidationResult::Blocked(_)
        ));
        assert_eq!(
            validate_source(&"a".repeat(MAX_SOURCE_LENGTH + 1)),
            SourceValidationResult::TooLong
        );
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  Lobby\u{0007} cam "), "Lobby cam");
        assert_eq!(sanitize_name(&"x".repeat(500)).len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_id("abc_123"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../etc"));
        assert!(!is_valid_id(&"a".repeat(65)));
    }
}

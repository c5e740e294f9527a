//! Field helpers for structured log events

/// Default number of characters of user content kept in a log preview.
pub const PREVIEW_CHARS: usize = 100;

/// Privacy-safe preview of query or answer text.
///
/// `limit` is `None` when content logging is off, in which case nothing is
/// returned. Otherwise the trimmed text is cut to `limit` characters with
/// `...` appended if anything was dropped.
///
/// ```rust
/// use ragchat::logging::content_preview;
///
/// assert_eq!(content_preview("what is vLLM?", None), None);
/// assert_eq!(content_preview("what is vLLM?", Some(100)).as_deref(), Some("what is vLLM?"));
/// assert_eq!(content_preview("what is vLLM?", Some(4)).as_deref(), Some("what..."));
/// ```
pub fn content_preview(text: &str, limit: Option<usize>) -> Option<String> {
    let limit = limit?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate_chars(text, limit))
}

/// Preview limit for a logging configuration.
pub fn preview_limit(config: &crate::config::LoggingConfig) -> Option<usize> {
    config
        .enable_content_logging
        .then_some(config.preview_chars)
}

/// Truncate on a character boundary.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    #[test]
    fn test_preview_disabled() {
        assert_eq!(content_preview("secret", None), None);
    }

    #[test]
    fn test_preview_empty_is_none() {
        assert_eq!(content_preview("   ", Some(10)), None);
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(150);
        let preview = content_preview(&long, Some(PREVIEW_CHARS)).unwrap();
        assert_eq!(preview.len(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(120);
        let preview = content_preview(&text, Some(PREVIEW_CHARS)).unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_preview_limit_follows_config() {
        let mut config = LoggingConfig::default();
        assert_eq!(preview_limit(&config), None);

        config.enable_content_logging = true;
        config.preview_chars = 12;
        assert_eq!(preview_limit(&config), Some(12));
    }
}

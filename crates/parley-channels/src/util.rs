//! Common utilities for channel adapters

/// Maximum length of text to log (to prevent sensitive data exposure)
pub const MAX_LOG_TEXT_LENGTH: usize = 50;

/// Discord message character limit
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Patterns that indicate potentially sensitive content
pub const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "api-key",
    "bearer",
    "authorization",
    "credential",
    "-----begin",
];

/// Mask potentially sensitive text for logging
///
/// Redacts text containing a sensitive pattern and truncates long messages.
///
/// # Examples
/// ```
/// use parley_channels::util::mask_for_logging;
///
/// assert!(mask_for_logging("my password is hunter2").contains("REDACTED"));
/// assert_eq!(mask_for_logging("Hello"), "Hello");
/// ```
#[must_use]
pub fn mask_for_logging(text: &str) -> String {
    let lower = text.to_lowercase();
    if SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "[REDACTED - potentially sensitive content]".to_string();
    }

    if text.chars().count() > MAX_LOG_TEXT_LENGTH {
        let head: String = text.chars().take(MAX_LOG_TEXT_LENGTH).collect();
        format!("{}...[truncated]", head)
    } else {
        text.to_string()
    }
}

/// Split text into chunks of at most `limit` characters
///
/// Prefers breaking after a newline, then after a space, within each chunk;
/// falls back to a hard split. Never splits inside a character.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let remaining = chars.len() - start;
        if remaining <= limit {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let window = &chars[start..start + limit];
        let cut = window
            .iter()
            .rposition(|c| *c == '\n')
            .or_else(|| window.iter().rposition(|c| *c == ' '))
            .filter(|pos| *pos > 0)
            .map(|pos| pos + 1)
            .unwrap_or(limit);

        chunks.push(chars[start..start + cut].iter().collect());
        start += cut;
    }

    chunks
}

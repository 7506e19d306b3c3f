//! Common utilities for LLM providers

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Longest upstream error text passed through unchanged
const MAX_PASSTHROUGH_ERROR_LENGTH: usize = 200;

/// Mask API key for safe display in logs
///
/// # Examples
/// ```
/// use parley_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY || !key.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &key[..KEY_MASK_VISIBLE_CHARS],
        &key[key.len() - KEY_MASK_VISIBLE_CHARS..]
    )
}

/// Trim an upstream error body for logs and error values
///
/// Bodies can be large HTML pages or echo request data; keep only a bounded
/// prefix and drop anything that looks like a bearer key.
#[must_use]
pub fn summarize_error_body(body: &str) -> String {
    let body = body.trim();
    if body.contains("sk-") || body.to_lowercase().contains("bearer ") {
        return "upstream error (details withheld)".to_string();
    }
    if body.chars().count() > MAX_PASSTHROUGH_ERROR_LENGTH {
        let prefix: String = body.chars().take(MAX_PASSTHROUGH_ERROR_LENGTH).collect();
        return format!("{}...", prefix);
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key_long() {
        let key = "sk-1234567890abcdefghij";
        let masked = mask_api_key(key);
        assert_eq!(masked, "sk-1...ghij");
        assert!(!masked.contains("567890"));
    }

    #[test]
    fn test_mask_api_key_short() {
        assert_eq!(mask_api_key("short"), "****");
        assert_eq!(mask_api_key("12345678"), "****");
        assert_eq!(mask_api_key(""), "****");
    }

    #[test]
    fn test_summarize_error_body() {
        assert_eq!(summarize_error_body("  bad request "), "bad request");
        assert!(summarize_error_body("Incorrect API key provided: sk-abc").contains("withheld"));
        let long = "e".repeat(500);
        assert!(summarize_error_body(&long).len() < 210);
    }
}

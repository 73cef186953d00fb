// Helper functions for safe logging

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.chars().count() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            // First char, not first byte; local parts may start multibyte
            if let Some(first) = parts[0].chars().next() {
                return format!("{}***@{}", first, parts[1]);
            }
        }
    }
    "***@***.***".to_string()
}

/// Masks API keys for safe logging and display, showing only the last 4
/// characters
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}{}", "•".repeat(3), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
    }

    #[test]
    fn test_safe_email_log_multibyte_local_part() {
        assert_eq!(safe_email_log("ü@example.com"), "ü***@example.com");
        assert_eq!(safe_email_log("日本語@example.com"), "日***@example.com");
    }

    #[test]
    fn test_safe_email_log_handles_invalid_input() {
        assert_eq!(safe_email_log("no-at-sign"), "***@***.***");
        assert_eq!(safe_email_log("ab"), "***@***.***");
        assert_eq!(safe_email_log("@example.com"), "***@***.***");
    }

    #[test]
    fn test_mask_api_key_keeps_last_four() {
        assert_eq!(mask_api_key("sk-abcdef5a2f"), "•••5a2f");
        assert_eq!(mask_api_key("ab"), "•••ab");
    }
}

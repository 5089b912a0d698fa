//! Token redaction for logs and debug surfaces.

const MASK_PREFIX_LEN: usize = 6;
const MASK_SUFFIX_LEN: usize = 4;

/// Mask a token down to a short prefix and suffix. Values too short to
/// mask safely are replaced with asterisks.
pub fn mask(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= MASK_PREFIX_LEN + MASK_SUFFIX_LEN {
        return "*".repeat(chars.len().min(8));
    }

    let prefix: String = chars[..MASK_PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - MASK_SUFFIX_LEN..].iter().collect();
    format!("{prefix}...{suffix}")
}

#[cfg(test)]
mod tests {
    use super::mask;

    #[test]
    fn mask_keeps_prefix_and_suffix() {
        assert_eq!(mask("abcdef1234567890"), "abcdef...7890");
    }

    #[test]
    fn mask_short_values_redacts_fully() {
        assert_eq!(mask("abcd"), "****");
    }

    #[test]
    fn mask_empty_is_empty() {
        assert_eq!(mask(""), "");
    }
}

//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. Budgets are
//! enforced in characters (`max_tokens * CHARS_PER_TOKEN`) so no rounding
//! creeps in when many short messages are summed.

pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count for a string. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Character allowance for a token budget.
pub fn char_budget(max_tokens: usize) -> usize {
    max_tokens.saturating_mul(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test"), 1);
        assert_eq!(estimate_tokens("tests"), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn budget_saturates() {
        assert_eq!(char_budget(10), 40);
        assert_eq!(char_budget(usize::MAX), usize::MAX);
    }
}

//! Random token alphabet for share links and access tokens.
//!
//! The alphabet excludes visually ambiguous characters (0/O, 1/l/I) so
//! tokens survive being read aloud or retyped from an email. Uniqueness is
//! the caller's concern: the service layer retries against the relevant
//! repository index up to [`MAX_GENERATION_ATTEMPTS`] times.

use rand::Rng;

/// Alphanumeric alphabet with ambiguous glyphs removed.
pub const SAFE_CHARS: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fixed length of a transfer share link.
pub const SHARE_LINK_LENGTH: usize = 16;

/// Default length of a per-recipient access token.
pub const ACCESS_TOKEN_LENGTH: usize = 32;

/// Bound on uniqueness retries before giving up. Exhaustion signals a
/// systemic failure (generator misconfiguration), not transient contention.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Generate a random string of `length` characters from [`SAFE_CHARS`].
pub fn random_token(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| SAFE_CHARS[rng.random_range(0..SAFE_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length() {
        assert_eq!(random_token(SHARE_LINK_LENGTH).len(), SHARE_LINK_LENGTH);
        assert_eq!(random_token(ACCESS_TOKEN_LENGTH).len(), ACCESS_TOKEN_LENGTH);
        assert_eq!(random_token(0).len(), 0);
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for c in "01lIO".chars() {
            assert!(!SAFE_CHARS.contains(&(c as u8)), "alphabet contains {}", c);
        }
        let token = random_token(2048);
        assert!(token.bytes().all(|b| SAFE_CHARS.contains(&b)));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..1000).map(|_| random_token(SHARE_LINK_LENGTH)).collect();
        assert_eq!(tokens.len(), 1000);
    }
}

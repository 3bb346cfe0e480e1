//! Identifier helpers.

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base-36 string of the given length.
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// Check that an identifier only uses `[A-Za-z0-9_-]` and fits `max_len`.
pub fn is_safe_identifier(id: &str, max_len: usize) -> bool {
    !id.is_empty()
        && id.len() <= max_len
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_base36() {
        let s = random_base36(9);
        assert_eq!(s.len(), 9);
        assert!(s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_safe_identifier() {
        assert!(is_safe_identifier("guest_abc123", 128));
        assert!(is_safe_identifier("job_42", 128));
        assert!(is_safe_identifier("a-b_c", 5));
        assert!(!is_safe_identifier("", 128));
        assert!(!is_safe_identifier("has space", 128));
        assert!(!is_safe_identifier("semi;colon", 128));
        assert!(!is_safe_identifier(&"a".repeat(129), 128));
    }
}

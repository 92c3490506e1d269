use subtle::ConstantTimeEq;

/// Compare a presented secret against an expected one in constant time.
///
/// Length mismatch returns early; only the length is observable.
pub fn secrets_match(expected: &str, presented: &str) -> bool {
    let expected_bytes = expected.as_bytes();
    let presented_bytes = presented.as_bytes();

    if expected_bytes.len() != presented_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(presented_bytes).into()
}

/// True when `presented` equals any non-empty entry of `allowed`.
///
/// Every entry is compared so the position of a match is not observable.
pub fn matches_any(allowed: &[String], presented: &str) -> bool {
    if presented.is_empty() {
        return false;
    }

    allowed
        .iter()
        .filter(|candidate| !candidate.is_empty())
        .fold(false, |found, candidate| {
            secrets_match(candidate, presented) | found
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3creT"));
        assert!(!secrets_match("s3cret", "s3cre"));
        assert!(!secrets_match("s3cret", ""));
    }

    #[test]
    fn test_matches_any() {
        let allowed = vec!["first".to_string(), "second".to_string()];
        assert!(matches_any(&allowed, "second"));
        assert!(!matches_any(&allowed, "third"));
    }

    #[test]
    fn test_empty_key_never_matches() {
        let allowed = vec![String::new(), "key".to_string()];
        assert!(!matches_any(&allowed, ""));
        assert!(!matches_any(&[], "key"));
    }
}

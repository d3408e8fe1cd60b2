//! Numeric literal lexemes.

/// Parse an integer lexeme in any supported base.
///
/// `0x`, `0o` and `0b` select the base and `_` separators are ignored.
/// Values up to `u64::MAX` are accepted and keep their bit pattern, so
/// `0xFFFF_FFFF_FFFF_FFFF` is `-1`.
pub fn parse_int(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let (radix, digits) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, radix)
        .ok()
        .map(|value| value as i64)
}

pub fn parse_real(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_bases() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("1_000_000"), Some(1_000_000));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b1010"), Some(10));
        assert_eq!(parse_int("0xFFFF_FFFF_FFFF_FFFF"), Some(-1));
    }

    #[test]
    fn test_parse_int_rejects_garbage() {
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("12a"), None);
        assert_eq!(parse_int("18446744073709551616"), None);
    }

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real("2.5"), Some(2.5));
        assert_eq!(parse_real("1_000.25"), Some(1000.25));
        assert_eq!(parse_real("1e3"), Some(1000.0));
        assert_eq!(parse_real("x"), None);
    }
}

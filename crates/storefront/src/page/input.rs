//! Lenient parsing of numbers typed into form controls.

/// Parse the leading integer of a form value.
///
/// Mirrors how browsers read numeric inputs in page scripts: leading
/// whitespace and an optional sign are accepted, parsing stops at the first
/// non-digit, and a value without any leading digits is `None`.
///
/// ```
/// use zapmarket_storefront::page::parse_int;
///
/// assert_eq!(parse_int(" 12abc"), Some(12));
/// assert_eq!(parse_int("-3"), Some(-3));
/// assert_eq!(parse_int("abc"), None);
/// ```
#[must_use]
pub fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, trimmed.get(1..).unwrap_or_default()),
        Some(b'+') => (false, trimmed.get(1..).unwrap_or_default()),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    // Overlong inputs saturate rather than fail.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Read a quantity from a form value, treating missing, non-numeric or
/// non-positive input as one.
#[must_use]
pub fn quantity_or_one(raw: Option<&str>) -> u32 {
    raw.and_then(parse_int)
        .filter(|q| *q > 0)
        .map_or(1, |q| u32::try_from(q).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_plain() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("  7"), Some(7));
        assert_eq!(parse_int("+5"), Some(5));
    }

    #[test]
    fn test_parse_int_stops_at_non_digit() {
        assert_eq!(parse_int("3.9"), Some(3));
        assert_eq!(parse_int("10 items"), Some(10));
    }

    #[test]
    fn test_parse_int_rejects_non_numeric() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("x1"), None);
    }

    #[test]
    fn test_parse_int_saturates() {
        assert_eq!(parse_int("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn test_quantity_or_one() {
        assert_eq!(quantity_or_one(Some("3")), 3);
        assert_eq!(quantity_or_one(Some("abc")), 1);
        assert_eq!(quantity_or_one(Some("0")), 1);
        assert_eq!(quantity_or_one(Some("-2")), 1);
        assert_eq!(quantity_or_one(None), 1);
    }
}

//! Load-file line parsing.
//!
//! A load file holds one tuple per line:
//! ```text
//! 272, 'Baby Take a Bow'
//! 216,"Shirley Temple"
//!   12 , plain text up to the end of the line
//! ```

/// Parse `key, value` from one load-file line.
///
/// Leading blanks are skipped and the key is the leading integer (anything
/// unparsable reads as 0). A comma is required. The value may be wrapped in
/// `'` or `"`, in which case it ends at the matching quote; otherwise it runs
/// to the end of the line. A missing value is the empty string.
///
/// Returns `None` when the line has no comma.
pub fn parse_load_line(line: &str) -> Option<(i32, String)> {
    let rest = line.trim_start_matches([' ', '\t']);
    let key = parse_leading_int(rest);

    let (_, after_comma) = rest.split_once(',')?;
    let value = after_comma.trim_start_matches([' ', '\t']);

    let value = match value.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let quoted = &value[1..];
            match quoted.find(quote) {
                Some(end) => &quoted[..end],
                None => quoted,
            }
        }
        _ => value,
    };

    Some((key, value.to_string()))
}

/// Leading decimal integer of `s`, or 0 if there is none.
///
/// Leading whitespace and a single sign are accepted and parsing stops at the
/// first non-digit. Out-of-range values saturate.
pub(crate) fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value * 10 + i64::from(b - b'0');
        if value > i64::from(i32::MAX) + 1 {
            break;
        }
    }
    if negative {
        value = -value;
    }

    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_values() {
        assert_eq!(
            parse_load_line("272,'Baby Take a Bow'"),
            Some((272, "Baby Take a Bow".to_string()))
        );
        assert_eq!(
            parse_load_line("216, \"Shirley Temple\" trailing"),
            Some((216, "Shirley Temple".to_string()))
        );
        assert_eq!(
            parse_load_line("1,'it\"s'"),
            Some((1, "it\"s".to_string()))
        );
    }

    #[test]
    fn test_parse_unquoted_value_runs_to_end() {
        assert_eq!(
            parse_load_line("  \t12 ,  plain text "),
            Some((12, "plain text ".to_string()))
        );
    }

    #[test]
    fn test_parse_unterminated_quote() {
        assert_eq!(parse_load_line("5,'open"), Some((5, "open".to_string())));
    }

    #[test]
    fn test_parse_missing_value() {
        assert_eq!(parse_load_line("7,"), Some((7, String::new())));
        assert_eq!(parse_load_line("7,   \t"), Some((7, String::new())));
        assert_eq!(parse_load_line("7,''"), Some((7, String::new())));
    }

    #[test]
    fn test_parse_requires_comma() {
        assert_eq!(parse_load_line("42 'no comma'"), None);
        assert_eq!(parse_load_line(""), None);
    }

    #[test]
    fn test_parse_non_numeric_key_is_zero() {
        assert_eq!(parse_load_line("abc,x"), Some((0, "x".to_string())));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("123abc"), 123);
        assert_eq!(parse_leading_int("  -45"), -45);
        assert_eq!(parse_leading_int("+8"), 8);
        assert_eq!(parse_leading_int("x1"), 0);
        assert_eq!(parse_leading_int("-"), 0);
        assert_eq!(parse_leading_int("99999999999"), i32::MAX);
        assert_eq!(parse_leading_int("-2147483648"), i32::MIN);
        assert_eq!(parse_leading_int("-99999999999"), i32::MIN);
    }
}

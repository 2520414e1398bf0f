//! Classification of bare tokens into numbers and names.
use logos::Logos;

/// Shape of a whole bare token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
enum Shape {
    #[regex(r"[+-]?[0-9]+", priority = 10)]
    Integer,
    #[regex(r"[+-]?([0-9]+\.[0-9]*|\.[0-9]+)", priority = 9)]
    Real,
    #[regex(r#"[^ \t\n\r\x0B\x0C()\[\]{}'",]+"#, priority = 1)]
    Bare,
}

/// What a bare token reads as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Classified {
    Long(i64),
    Real(f64),
    Name,
}

/// Classifies a bare token: integer first, then real, then name.
///
/// Returns `None` when `token` is empty or contains a delimiter, i.e. when it
/// is not a single bare token.
pub(crate) fn classify(token: &str) -> Option<Classified> {
    let mut lexer = Shape::lexer(token);
    let shape = match (lexer.next(), lexer.next()) {
        (Some(Ok(shape)), None) => shape,
        _ => return None,
    };

    let classified = match shape {
        Shape::Integer => match to_long(token) {
            Some(value) => Classified::Long(value),
            None => to_real(token).map_or(Classified::Name, Classified::Real),
        },
        Shape::Real => to_real(token).map_or(Classified::Name, Classified::Real),
        Shape::Bare => Classified::Name,
    };
    Some(classified)
}

/// Whether `name` can be written as the head of a list and read back.
pub fn is_valid_name(name: &str) -> bool {
    !name.starts_with(';') && classify(name) == Some(Classified::Name)
}

fn split_sign(token: &str) -> (bool, &str) {
    match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    }
}

/// Reads an optionally signed run of decimal digits.
///
/// Overflow is not an integer; the caller falls back to a real.
pub(crate) fn to_long(token: &str) -> Option<i64> {
    let (negative, digits) = split_sign(token);
    if digits.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            return None;
        }
        let digit = i64::from(byte - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}

/// Reads an optionally signed decimal with at most one point.
///
/// Fractional digits are added with increasing decimal weight; there is no
/// exponent notation.
pub(crate) fn to_real(token: &str) -> Option<f64> {
    let (negative, digits) = split_sign(token);

    let mut value = 0.0_f64;
    let mut precision = 10.0_f64;
    let mut dot = false;
    let mut any_digit = false;
    for byte in digits.bytes() {
        match byte {
            b'.' if dot => return None,
            b'.' => dot = true,
            b'0'..=b'9' => {
                let digit = f64::from(byte - b'0');
                any_digit = true;
                if dot {
                    value += digit / precision;
                    precision *= 10.0;
                } else {
                    value = value * 10.0 + digit;
                }
            }
            _ => return None,
        }
    }

    if !any_digit {
        return None;
    }
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod test {
    use super::{classify, is_valid_name, to_long, to_real, Classified};
    use rstest::rstest;

    #[rstest]
    #[case("42", Classified::Long(42))]
    #[case("-7", Classified::Long(-7))]
    #[case("+7", Classified::Long(7))]
    #[case("007", Classified::Long(7))]
    #[case("12.5", Classified::Real(12.5))]
    #[case("-0.25", Classified::Real(-0.25))]
    #[case("3.", Classified::Real(3.0))]
    #[case(".5", Classified::Real(0.5))]
    #[case("12.5.6", Classified::Name)]
    #[case("3.1.4", Classified::Name)]
    #[case("-", Classified::Name)]
    #[case("+", Classified::Name)]
    #[case(".", Classified::Name)]
    #[case("1e5", Classified::Name)]
    #[case("12abc", Classified::Name)]
    #[case("name", Classified::Name)]
    #[case("a;b", Classified::Name)]
    #[case("héllo", Classified::Name)]
    fn classifies(#[case] token: &str, #[case] expected: Classified) {
        assert_eq!(Some(expected), classify(token));
    }

    #[rstest]
    #[case("")]
    #[case("a b")]
    #[case("a(")]
    #[case("\"a\"")]
    #[case("a,b")]
    fn not_a_single_token(#[case] token: &str) {
        assert_eq!(None, classify(token));
    }

    #[test]
    fn real_digits_accumulate() {
        let value = to_real("3.14").unwrap();
        assert!((value - 314.0 / 100.0).abs() < 1e-12);
    }

    #[test]
    fn integer_bounds() {
        assert_eq!(Some(i64::MAX), to_long("9223372036854775807"));
        assert_eq!(Some(i64::MIN), to_long("-9223372036854775808"));
        assert_eq!(None, to_long("9223372036854775808"));
        assert!(matches!(
            classify("9223372036854775808"),
            Some(Classified::Real(_))
        ));
    }

    #[rstest]
    #[case("point", true)]
    #[case("x-1", true)]
    #[case("-x", true)]
    #[case("+", true)]
    #[case(".", true)]
    #[case("é", true)]
    #[case("-.5", false)]
    #[case("12", false)]
    #[case("1.5", false)]
    #[case(";x", false)]
    #[case("two words", false)]
    #[case("", false)]
    fn names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(valid, is_valid_name(name));
    }
}

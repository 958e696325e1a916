//! Constraint validation: declared `min`/`max` bounds and `minlen`/`maxlen`
//! length limits, checked after a value was coerced.
//!
//! Bound literals are parsed by the caller-supplied `parse_bound`, which the
//! assignment engine wires to the same coercion strategy that produced the
//! value, so a bound and the value it limits are always compared in the same
//! representation. Bounds only apply to ordered types (see
//! [`Value::compare`]); lengths only to string-like ones (see
//! [`Value::text_len`]). Both intervals are closed.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{CoerceError, ConstraintError};
use crate::meta::{Constraints, FieldMeta};
use crate::value::Value;

/// The bounds in force for a value, rendered as an interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(lo), Some(hi)) => write!(f, "[{lo}, {hi}]"),
            (Some(lo), None) => write!(f, "[{lo}, +∞)"),
            (None, Some(hi)) => write!(f, "(-∞, {hi}]"),
            (None, None) => write!(f, "(-∞, +∞)"),
        }
    }
}

/// Check `value` against the constraints declared in `meta`.
pub fn check<T, P>(value: &T, meta: &FieldMeta, parse_bound: P) -> Result<(), ConstraintError>
where
    T: Value,
    P: Fn(&str) -> Result<T, CoerceError>,
{
    check_bounds(value, &meta.constraints, &parse_bound)?;
    check_length(value, &meta.constraints)
}

fn check_bounds<T, P>(value: &T, c: &Constraints, parse_bound: &P) -> Result<(), ConstraintError>
where
    T: Value,
    P: Fn(&str) -> Result<T, CoerceError>,
{
    let bound = |which: &'static str, literal: &Option<String>| {
        literal
            .as_deref()
            .map(|lit| {
                parse_bound(lit).map_err(|source| ConstraintError::InvalidBound {
                    which,
                    literal: lit.to_string(),
                    source,
                })
            })
            .transpose()
    };
    let min = bound("min", &c.min)?;
    let max = bound("max", &c.max)?;
    if min.is_none() && max.is_none() {
        return Ok(());
    }

    let below = min
        .as_ref()
        .is_some_and(|lo| value.compare(lo) == Some(Ordering::Less));
    let above = max
        .as_ref()
        .is_some_and(|hi| value.compare(hi) == Some(Ordering::Greater));
    if below || above {
        return Err(ConstraintError::OutOfBounds {
            value: shown(value),
            interval: Interval {
                min: min.as_ref().map(plain),
                max: max.as_ref().map(plain),
            },
        });
    }
    Ok(())
}

fn check_length<T: Value>(value: &T, c: &Constraints) -> Result<(), ConstraintError> {
    let Some(len) = value.text_len() else {
        return Ok(());
    };
    if let Some(min) = c.min_len
        && len < min
    {
        return Err(ConstraintError::TooShort {
            value: shown(value),
            len,
            min,
        });
    }
    if let Some(max) = c.max_len
        && len > max
    {
        return Err(ConstraintError::TooLong {
            value: shown(value),
            len,
            max,
        });
    }
    Ok(())
}

fn plain<T: Value>(value: &T) -> String {
    value.to_text().unwrap_or_else(|| value.display())
}

/// String-like values are quoted so empty or padded strings stay visible.
fn shown<T: Value>(value: &T) -> String {
    let text = plain(value);
    if value.text_len().is_some() {
        format!("{text:?}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::Version;
    use crate::types::IntMode;
    use crate::value::{Coerced, parse_int};

    fn meta(entries: &[(&str, &str)]) -> FieldMeta {
        FieldMeta::parse("", entries)
    }

    fn int_bound(lit: &str) -> Result<i64, CoerceError> {
        parse_int(lit, IntMode::DEC | IntMode::HEX, i64::from_str_radix)
    }

    fn string_bound(lit: &str) -> Result<String, CoerceError> {
        match String::parse_primitive(false, lit, IntMode::empty()) {
            Coerced::Done(s) => Ok(s),
            Coerced::Failed(e) => Err(e),
            Coerced::Unsupported => unreachable!(),
        }
    }

    #[test]
    fn closed_interval() {
        let m = meta(&[("min", "10"), ("max", "20")]);
        for ok in [10, 15, 20] {
            assert!(check(&ok, &m, int_bound).is_ok(), "{ok}");
        }
        for bad in [9, 21] {
            assert!(matches!(
                check(&bad, &m, int_bound),
                Err(ConstraintError::OutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn out_of_bounds_message_names_both_bounds() {
        let m = meta(&[("min", "10"), ("max", "20")]);
        let err = check(&21i64, &m, int_bound).unwrap_err();
        assert_eq!(err.to_string(), "Value 21 out of bounds [10, 20]");
    }

    #[test]
    fn one_sided_intervals() {
        let lower = meta(&[("min", "10")]);
        let err = check(&9i64, &lower, int_bound).unwrap_err();
        assert_eq!(err.to_string(), "Value 9 out of bounds [10, +∞)");
        assert!(check(&i64::MAX, &lower, int_bound).is_ok());

        let upper = meta(&[("max", "20")]);
        let err = check(&21i64, &upper, int_bound).unwrap_err();
        assert_eq!(err.to_string(), "Value 21 out of bounds (-∞, 20]");
        assert!(check(&i64::MIN, &upper, int_bound).is_ok());
    }

    #[test]
    fn bounds_parse_through_the_given_parser() {
        let m = meta(&[("max", "0x10")]);
        assert!(check(&16i64, &m, int_bound).is_ok());
        assert!(check(&17i64, &m, int_bound).is_err());
    }

    #[test]
    fn string_bounds_are_lexicographic_and_quoted() {
        let m = meta(&[("min", "b"), ("max", "zz")]);
        for ok in ["b", "dd", "zz"] {
            assert!(check(&ok.to_string(), &m, string_bound).is_ok(), "{ok}");
        }
        let err = check(&"zza".to_string(), &m, string_bound).unwrap_err();
        assert_eq!(err.to_string(), r#"Value "zza" out of bounds [b, zz]"#);
        assert!(check(&"a".to_string(), &m, string_bound).is_err());
    }

    #[test]
    fn explicit_ordering_is_used() {
        let m = meta(&[("min", "1.2"), ("max", "2.0")]);
        let parse = |lit: &str| -> Result<Version, CoerceError> {
            lit.parse().map_err(|e| CoerceError::Custom(Box::new(e)))
        };
        assert!(check(&Version { major: 1, minor: 10 }, &m, parse).is_ok());
        let err = check(&Version { major: 2, minor: 1 }, &m, parse).unwrap_err();
        assert_eq!(err.to_string(), "Value 2.1 out of bounds [1.2, 2.0]");
    }

    #[test]
    fn unordered_types_skip_bounds() {
        let m = meta(&[("min", "true")]);
        let parse = |_: &str| Ok(true);
        assert!(check(&false, &m, parse).is_ok());
    }

    #[test]
    fn bad_bound_literal() {
        let m = meta(&[("min", "ten")]);
        let err = check(&5i64, &m, int_bound).unwrap_err();
        assert!(matches!(err, ConstraintError::InvalidBound { which: "min", .. }));
    }

    #[test]
    fn length_limits_are_inclusive() {
        let m = meta(&[("minlen", "2"), ("maxlen", "4")]);
        for ok in ["ab", "abc", "abcd"] {
            assert!(check(&ok.to_string(), &m, string_bound).is_ok(), "{ok}");
        }
        assert!(matches!(
            check(&"a".to_string(), &m, string_bound),
            Err(ConstraintError::TooShort { len: 1, min: 2, .. })
        ));
        assert!(matches!(
            check(&"abcde".to_string(), &m, string_bound),
            Err(ConstraintError::TooLong { len: 5, max: 4, .. })
        ));
    }

    #[test]
    fn lengths_count_characters() {
        let m = meta(&[("maxlen", "3")]);
        assert!(check(&"äöü".to_string(), &m, string_bound).is_ok());
    }

    #[test]
    fn length_limits_ignore_non_strings() {
        let m = meta(&[("maxlen", "1")]);
        assert!(check(&12345i64, &m, int_bound).is_ok());
    }

    #[test]
    fn interval_display() {
        let i = Interval {
            min: None,
            max: None,
        };
        assert_eq!(i.to_string(), "(-∞, +∞)");
    }
}

//! Leaf values and the capabilities the coercion chain dispatches on.
//!
//! A field type takes part in assignment by implementing [`Value`]. Every
//! method has a default meaning "this type does not have the capability", so
//! an implementation only spells out what the type supports:
//!
//! - [`Value::text_parser`]: the type can parse itself from text (the
//!   text-unmarshal strategy);
//! - [`Value::parse_primitive`]: the type is a primitive kind (bool,
//!   integer, string) handled by the primitive strategy;
//! - [`Value::scanner`]: the type can be scanned from its full textual form
//!   (the generic-scan strategy);
//! - [`Value::compare`]: the type is ordered, enabling `min`/`max`;
//! - [`Value::text_len`]: the type is string-like, enabling
//!   `minlen`/`maxlen`;
//! - [`Value::render_primitive`] / [`Value::to_text`] / [`Value::display`]:
//!   rendering for the writer.
//!
//! Types that cannot implement `Value` in your crate (or whose textual form
//! you want to override) can be handled with a registered coercion, see
//! [`register_type_coercion`](crate::register_type_coercion).
//!
//! ```
//! use std::cmp::Ordering;
//! use secfig::{Parser, Value, parse_from_str};
//!
//! #[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord)]
//! struct Level(u8);
//!
//! impl std::str::FromStr for Level {
//!     type Err = std::num::ParseIntError;
//!     fn from_str(s: &str) -> Result<Self, Self::Err> {
//!         s.trim_start_matches('L').parse().map(Level)
//!     }
//! }
//!
//! impl Value for Level {
//!     fn text_parser() -> Option<Parser<Self>> {
//!         Some(parse_from_str::<Level>)
//!     }
//!     fn compare(&self, other: &Self) -> Option<Ordering> {
//!         Some(self.cmp(other))
//!     }
//!     fn to_text(&self) -> Option<String> {
//!         Some(format!("L{}", self.0))
//!     }
//! }
//! ```

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BoxError, CoerceError};
use crate::types::IntMode;

/// A text-to-value conversion used by the text and scan capabilities.
pub type Parser<T> = fn(&str) -> Result<T, BoxError>;

/// Outcome of one coercion strategy.
#[derive(Debug)]
pub enum Coerced<T> {
    /// The strategy applied and produced a value.
    Done(T),
    /// The strategy does not apply to this type; try the next one.
    Unsupported,
    /// The strategy applied and rejected the text; stop here.
    Failed(CoerceError),
}

impl<T> Coerced<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Coerced<U> {
        match self {
            Coerced::Done(v) => Coerced::Done(f(v)),
            Coerced::Unsupported => Coerced::Unsupported,
            Coerced::Failed(e) => Coerced::Failed(e),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Coerced::Unsupported)
    }
}

impl<T> From<Result<T, CoerceError>> for Coerced<T> {
    fn from(result: Result<T, CoerceError>) -> Self {
        match result {
            Ok(v) => Coerced::Done(v),
            Err(e) => Coerced::Failed(e),
        }
    }
}

/// A type that can be the destination of a variable.
///
/// `Default` is the zero value: the writer skips fields equal to it.
pub trait Value: Any + Default + PartialEq + fmt::Debug {
    /// Parse-self-from-text capability.
    fn text_parser() -> Option<Parser<Self>> {
        None
    }

    /// Primitive-kind conversion. `mode` is the field's declared integer
    /// mode, possibly empty.
    fn parse_primitive(_blank: bool, _text: &str, _mode: IntMode) -> Coerced<Self> {
        Coerced::Unsupported
    }

    /// Scan capability: parse the complete text as this type.
    fn scanner() -> Option<Parser<Self>> {
        None
    }

    /// Three-way comparison, for types with an ordering.
    fn compare(&self, _other: &Self) -> Option<Ordering> {
        None
    }

    /// Length in characters, for string-like types.
    fn text_len(&self) -> Option<usize> {
        None
    }

    /// Primitive-kind rendering in a notation `mode` reads back. The
    /// counterpart of [`parse_primitive`](Self::parse_primitive).
    fn render_primitive(&self, _mode: IntMode) -> Option<String> {
        None
    }

    /// Self-describing textual form, preferred by the writer.
    fn to_text(&self) -> Option<String> {
        None
    }

    /// Fallback rendering for the writer and for error messages.
    fn display(&self) -> String {
        format!("{self:?}")
    }
}

/// [`Parser`] for any `FromStr` type.
pub fn parse_from_str<T>(text: &str) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>().map_err(Into::into)
}

/// [`Parser`] for the scan capability: leading whitespace is skipped, the
/// rest must parse completely.
pub fn scan_fully<T>(text: &str) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_from_str(text.trim_start())
}

/// Parse a boolean literal: `true`/`yes`/`on`/`1` or `false`/`no`/`off`/`0`,
/// case-insensitive.
pub fn parse_bool(text: &str) -> Result<bool, CoerceError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CoerceError::InvalidBool(text.to_string())),
    }
}

/// Parse an integer literal according to `mode`.
///
/// - decimal only: plain digits;
/// - decimal + hex: `0x` selects hex;
/// - decimal + octal: a leading `0` selects octal;
/// - all three: `0x`, `0o`, `0b` or a leading `0` select the base;
/// - hex only: digits are hex, `0x` optional;
/// - octal only: digits are octal;
/// - hex + octal: a `0` prefix is required to tell them apart.
pub fn parse_int<T>(
    text: &str,
    mode: IntMode,
    from_radix: fn(&str, u32) -> Result<T, ParseIntError>,
) -> Result<T, CoerceError> {
    let trimmed = text.trim();
    let (sign, body) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    let has_0x = body.starts_with("0x") || body.starts_with("0X");
    let has_0 = body.starts_with('0');

    let (radix, digits) = match mode {
        m if m == IntMode::DEC => (10, body),
        m if m == IntMode::DEC | IntMode::HEX => {
            if has_0x {
                (16, &body[2..])
            } else {
                (10, body)
            }
        }
        m if m == IntMode::DEC | IntMode::OCT => {
            if has_0 && !has_0x {
                with_prefix(body)
            } else {
                (10, body)
            }
        }
        m if m == IntMode::HEX => {
            if has_0x {
                (16, &body[2..])
            } else {
                (16, body)
            }
        }
        m if m == IntMode::OCT => (8, body),
        m if m == IntMode::HEX | IntMode::OCT => {
            if has_0 {
                with_prefix(body)
            } else {
                return Err(CoerceError::AmbiguousInt(text.to_string()));
            }
        }
        _ => with_prefix(body),
    };

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(CoerceError::InvalidInt {
            text: text.to_string(),
            reason: "no digits".into(),
        });
    }
    from_radix(&format!("{sign}{digits}"), radix).map_err(|e| CoerceError::InvalidInt {
        text: text.to_string(),
        reason: e.to_string(),
    })
}

/// Render an integer magnitude so that [`parse_int`] under `mode` returns
/// the same value: decimal whenever decimal is accepted, otherwise octal
/// with a `0` prefix, otherwise hex with `0x`.
pub fn render_int<T>(negative: bool, magnitude: T, mode: IntMode) -> String
where
    T: fmt::Display + fmt::LowerHex + fmt::Octal,
{
    let sign = if negative { "-" } else { "" };
    if mode.is_empty() || mode.contains(IntMode::DEC) {
        format!("{sign}{magnitude}")
    } else if mode.contains(IntMode::OCT) {
        format!("{sign}0{magnitude:o}")
    } else {
        format!("{sign}0x{magnitude:x}")
    }
}

/// Base from a literal's own prefix.
fn with_prefix(body: &str) -> (u32, &str) {
    let lower = body.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0b") => (2, &body[2..]),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..]),
        _ => (10, body),
    }
}

impl Value for bool {
    fn parse_primitive(blank: bool, text: &str, _mode: IntMode) -> Coerced<Self> {
        if blank {
            return Coerced::Done(true);
        }
        parse_bool(text).into()
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

impl Value for String {
    fn parse_primitive(blank: bool, text: &str, _mode: IntMode) -> Coerced<Self> {
        if blank {
            return Coerced::Failed(CoerceError::BlankUnsupported);
        }
        Coerced::Done(text.to_string())
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.as_str().cmp(other.as_str()))
    }

    fn text_len(&self) -> Option<usize> {
        Some(self.chars().count())
    }

    fn display(&self) -> String {
        self.clone()
    }
}

macro_rules! int_values {
    ($($ty:ty => |$v:ident| $split:expr),* $(,)?) => {$(
        impl Value for $ty {
            fn parse_primitive(blank: bool, text: &str, mode: IntMode) -> Coerced<Self> {
                if blank {
                    return Coerced::Failed(CoerceError::BlankUnsupported);
                }
                parse_int(text, mode.or(IntMode::DEC | IntMode::HEX), <$ty>::from_str_radix).into()
            }

            fn render_primitive(&self, mode: IntMode) -> Option<String> {
                let $v = *self;
                let (negative, magnitude) = $split;
                Some(render_int(negative, magnitude, mode))
            }

            fn compare(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }

            fn display(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

macro_rules! signed_int_values {
    ($($ty:ty),* $(,)?) => {
        int_values!($($ty => |v| (v < 0, v.unsigned_abs())),*);
    };
}

macro_rules! unsigned_int_values {
    ($($ty:ty),* $(,)?) => {
        int_values!($($ty => |v| (false, v)),*);
    };
}

signed_int_values!(i8, i16, i32, i64, i128, isize);
unsigned_int_values!(u8, u16, u32, u64, u128, usize);

macro_rules! scanned_values {
    ($($ty:ty),* $(,)?) => {$(
        impl Value for $ty {
            fn scanner() -> Option<Parser<Self>> {
                Some(scan_fully::<$ty>)
            }

            fn compare(&self, other: &Self) -> Option<Ordering> {
                self.partial_cmp(other)
            }

            fn display(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

scanned_values!(f32, f64);

/// Scanned without trimming, so a quoted blank reads back as itself.
impl Value for char {
    fn scanner() -> Option<Parser<Self>> {
        Some(parse_from_str::<char>)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

impl Value for PathBuf {
    fn text_parser() -> Option<Parser<Self>> {
        Some(parse_from_str::<PathBuf>)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }

    fn to_text(&self) -> Option<String> {
        Some(self.as_path().display().to_string())
    }
}

/// Ordered, but without a textual form of its own: register a coercion (and
/// a rendering) for it.
impl Value for Duration {
    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

//! The ordered coercion chain.
//!
//! Strategies are tried in [`Strategy::CHAIN`] order. The first one that
//! does not answer [`Coerced::Unsupported`] decides the outcome: its value is
//! used, or its error is returned without consulting later strategies.

use std::any::type_name;

use crate::error::CoerceError;
use crate::meta::FieldMeta;
use crate::registry::Registry;
use crate::value::{Coerced, Parser, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A coercion registered for the exact type.
    Registered,
    /// The type parses itself from text.
    Text,
    /// Built-in handling of bool, integer and string kinds.
    Primitive,
    /// Full-input scan of the type's textual form.
    Scan,
}

impl Strategy {
    pub const CHAIN: [Strategy; 4] = [
        Strategy::Registered,
        Strategy::Text,
        Strategy::Primitive,
        Strategy::Scan,
    ];

    /// Run this one strategy for `T`.
    pub fn apply<T: Value>(
        self,
        registry: &Registry,
        blank: bool,
        text: &str,
        meta: &FieldMeta,
    ) -> Coerced<T> {
        match self {
            Strategy::Registered => match registry.coercion::<T>() {
                Some(f) => f(blank, text).map_err(CoerceError::Custom).into(),
                None => Coerced::Unsupported,
            },
            Strategy::Text => parse_with(T::text_parser(), blank, text),
            Strategy::Primitive => T::parse_primitive(blank, text, meta.int_mode),
            Strategy::Scan => parse_with(T::scanner(), blank, text),
        }
    }
}

fn parse_with<T: Value>(
    parser: Option<Parser<T>>,
    blank: bool,
    text: &str,
) -> Coerced<T> {
    let Some(parse) = parser else {
        return Coerced::Unsupported;
    };
    if blank {
        return Coerced::Failed(CoerceError::BlankUnsupported);
    }
    parse(text)
        .map_err(|source| CoerceError::Invalid {
            text: text.to_string(),
            ty: type_name::<T>(),
            source,
        })
        .into()
}

/// Convert `text` into a `T`, reporting which strategy produced it.
///
/// Returns [`Coerced::Unsupported`] only when every strategy declined.
pub fn coerce<T: Value>(
    registry: &Registry,
    blank: bool,
    text: &str,
    meta: &FieldMeta,
) -> Coerced<(T, Strategy)> {
    for strategy in Strategy::CHAIN {
        match strategy.apply::<T>(registry, blank, text, meta) {
            Coerced::Done(value) => {
                log::trace!("coerced {text:?} as {} via {strategy:?}", type_name::<T>());
                return Coerced::Done((value, strategy));
            }
            Coerced::Failed(e) => return Coerced::Failed(e),
            Coerced::Unsupported => continue,
        }
    }
    Coerced::Unsupported
}

//! Field metadata: the alias / integer-mode / callback tag and the bound
//! entries declared next to a field.
//!
//! A descriptor is parsed once, when the owning type's field table is first
//! built. Parse problems are kept in [`FieldMeta::error`] and reported when a
//! record is assigned to the field, so a bad descriptor on one field never
//! prevents the rest of the type from being used.

use crate::error::TagError;
use crate::types::IntMode;

/// Declared bounds. `None` disables that side of the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Lower bound literal, parsed like a value of the field's type.
    pub min: Option<String>,
    /// Upper bound literal, parsed like a value of the field's type.
    pub max: Option<String>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

/// Everything declared about one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    /// Explicit name. `None` derives the name from the field; `-` hides the field.
    pub ident: Option<String>,
    pub int_mode: IntMode,
    /// Callback invoked on the owning section after a successful assignment.
    pub callback: Option<String>,
    pub constraints: Constraints,
    pub error: Option<TagError>,
}

impl FieldMeta {
    /// Parse a field descriptor.
    ///
    /// `tag` is a comma-separated list whose first token is the alias,
    /// followed by optional `int=<dho>` and `cb=<name>` tokens; other tokens
    /// are ignored. `entries` holds the `min`, `max`, `minlen` and `maxlen`
    /// entries. An empty `min`/`max` literal leaves that bound unset, as
    /// does a negative length.
    pub fn parse(tag: &str, entries: &[(&str, &str)]) -> Self {
        let mut meta = FieldMeta::default();
        let mut tokens = tag.split(',');
        if let Some(ident) = tokens.next().map(str::trim)
            && !ident.is_empty()
        {
            meta.ident = Some(ident.to_string());
        }
        for token in tokens.map(str::trim) {
            if let Some(mode) = token.strip_prefix("int=") {
                meta.int_mode = IntMode::parse(mode);
            } else if let Some(cb) = token.strip_prefix("cb=")
                && !cb.is_empty()
            {
                meta.callback = Some(cb.to_string());
            }
        }

        for &(key, value) in entries {
            let result = match key {
                "min" => {
                    meta.constraints.min = bound_literal(value);
                    Ok(())
                }
                "max" => {
                    meta.constraints.max = bound_literal(value);
                    Ok(())
                }
                "minlen" => length(value, "minlen").map(|n| meta.constraints.min_len = n),
                "maxlen" => length(value, "maxlen").map(|n| meta.constraints.max_len = n),
                other => Err(TagError::UnknownKey(other.to_string())),
            };
            if let Err(e) = result {
                meta.error.get_or_insert(e);
            }
        }
        meta
    }

    /// True when the alias is `-`: the field is neither matched nor written.
    pub fn is_hidden(&self) -> bool {
        self.ident.as_deref() == Some("-")
    }
}

fn bound_literal(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn length(value: &str, key: &'static str) -> Result<Option<usize>, TagError> {
    let invalid = || TagError::InvalidLength {
        key,
        value: value.to_string(),
    };
    let n: i64 = value.trim().parse().map_err(|_| invalid())?;
    if n < 0 {
        return Ok(None);
    }
    usize::try_from(n).map(Some).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_descriptor() {
        let meta = FieldMeta::parse("", &[]);
        assert_eq!(meta, FieldMeta::default());
    }

    #[test]
    fn alias_mode_and_callback() {
        let meta = FieldMeta::parse("port,int=dh,cb=on_port", &[]);
        assert_eq!(meta.ident.as_deref(), Some("port"));
        assert_eq!(meta.int_mode, IntMode::DEC | IntMode::HEX);
        assert_eq!(meta.callback.as_deref(), Some("on_port"));
        assert!(meta.error.is_none());
    }

    #[test]
    fn options_without_alias() {
        let meta = FieldMeta::parse(",int=o", &[]);
        assert_eq!(meta.ident, None);
        assert_eq!(meta.int_mode, IntMode::OCT);
    }

    #[test]
    fn unknown_tag_tokens_are_ignored() {
        let meta = FieldMeta::parse("name,omitempty", &[]);
        assert_eq!(meta.ident.as_deref(), Some("name"));
        assert!(meta.error.is_none());
    }

    #[test]
    fn bounds_and_lengths() {
        let meta = FieldMeta::parse(
            "",
            &[("min", "10"), ("max", "20"), ("minlen", "2"), ("maxlen", "8")],
        );
        assert_eq!(meta.constraints.min.as_deref(), Some("10"));
        assert_eq!(meta.constraints.max.as_deref(), Some("20"));
        assert_eq!(meta.constraints.min_len, Some(2));
        assert_eq!(meta.constraints.max_len, Some(8));
    }

    #[test]
    fn empty_bound_and_negative_length_are_unset() {
        let meta = FieldMeta::parse("", &[("min", ""), ("maxlen", "-1")]);
        assert_eq!(meta.constraints, Constraints::default());
        assert!(meta.error.is_none());
    }

    #[test]
    fn non_numeric_length_is_recorded() {
        let meta = FieldMeta::parse("", &[("minlen", "two"), ("maxlen", "x")]);
        assert_eq!(
            meta.error,
            Some(TagError::InvalidLength {
                key: "minlen",
                value: "two".into()
            })
        );
    }

    #[test]
    fn unknown_entry_is_recorded() {
        let meta = FieldMeta::parse("", &[("step", "2")]);
        assert_eq!(meta.error, Some(TagError::UnknownKey("step".into())));
    }

    #[test]
    fn hidden_alias() {
        assert!(FieldMeta::parse("-", &[]).is_hidden());
        assert!(!FieldMeta::parse("x", &[]).is_hidden());
    }
}

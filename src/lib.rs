//! Typed binding of git-config style files onto Rust structs. Declare the
//! shape, hand over the text, and get the fields filled in.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! secfig::section! {
//!     #[derive(Debug, Default)]
//!     pub struct Core {
//!         pub editor: String,
//!         pub verbose: bool,
//!         pub exclude: Vec<String> => ("exclude-path"),
//!     }
//! }
//!
//! secfig::section! {
//!     #[derive(Debug, Default)]
//!     pub struct Remote {
//!         pub url: String,
//!         pub port: u16 => ("", min = "1"),
//!     }
//! }
//!
//! secfig::config! {
//!     #[derive(Debug, Default)]
//!     pub struct Settings {
//!         pub core: Core,
//!         pub remote: BTreeMap<String, Remote>,
//!     }
//! }
//!
//! let text = r#"
//! [core]
//! editor = vim
//! verbose
//! exclude-path = target
//! exclude-path = .git
//!
//! [remote "origin"]
//! url = https://example.org/repo
//! port = 443
//! "#;
//!
//! let mut settings = Settings::default();
//! secfig::read_str_into(&mut settings, text)?;
//! assert!(settings.core.verbose);
//! assert_eq!(settings.core.exclude, ["target", ".git"]);
//! assert_eq!(settings.remote["origin"].port, 443);
//! # Ok::<(), secfig::SecfigError>(())
//! ```
//!
//! # The format
//!
//! A file is a sequence of `[section]` or `[section "subsection"]` headers,
//! each followed by `name = value` lines. `;` and `#` start comments, values
//! may be quoted to keep leading or trailing blanks and comment characters,
//! and a trailing `\` continues a value on the next line. A bare `name` with
//! no `=` is a *blank* assignment: `true` for a bool, a reset for a
//! multi-valued variable, an error for most other types. See the [`records`]
//! tokenizer for the exact rules.
//!
//! # Struct as schema
//!
//! The root struct (declared with [`config!`]) lists the sections; each
//! section struct (declared with [`section!`]) lists the variables. Names
//! are matched case-insensitively with `-` and `_` ignored, so a field
//! `reg_types_1` answers to `reg-types-1` and `RegTypes1`. A descriptor
//! after the type changes the defaults:
//!
//! - **alias**: `=> ("name")` replaces the field name. `"-"` hides the field
//!   from both reading and writing.
//! - **integer syntax**: `int=` followed by any of `d`, `h`, `o` restricts
//!   which integer notations are accepted.
//! - **callback**: `cb=method` names a `fn(&mut self)` on the section struct,
//!   run after every successful assignment to the field.
//! - **constraints**: `min`, `max` (bounds parsed like a value of the field's
//!   type) and `minlen`, `maxlen` (character counts for string-like types).
//!
//! Fields of type `Vec<T>` collect every assignment; `Option<T>` fields become
//! `Some` on first assignment; root fields of type `Option<S>` or
//! `BTreeMap<String, S>` are allocated on first use, one map entry per
//! subsection.
//!
//! # Converting values
//!
//! Text becomes a value through an ordered chain: a registered coercion for
//! the exact type, the type's own text parser, built-in handling of bool,
//! integer and string, then a full-input scan. The first step that applies
//! decides; its error is final. Implement [`Value`] for your own types, or
//! register a coercion with [`register_type_coercion`] (process-wide) or
//! [`SecfigBuilder::coercion`] (one builder) for types you do not own.
//!
//! # Strict mode
//!
//! Strict mode is **on by default**: a record naming a section, subsection or
//! variable the struct does not declare fails the read with the origin and
//! line number:
//!
//! ```text
//! app.conf:5: invalid variable: section "core" variable "edtior"
//! ```
//!
//! Turn it off with [`.strict(false)`](SecfigBuilder::strict) to log such
//! records at `warn` level and carry on. Conversion and constraint failures
//! are errors either way.
//!
//! # Writing
//!
//! [`write()`] and [`to_string()`] produce text that reads back into an equal
//! struct: every present section instance, then every variable whose value
//! differs from the type's default, quoted where needed. Integers are written
//! in a notation their field's `int=` mode accepts. A map key containing a
//! newline cannot be written as a subsection and fails the write.
//!
//! # Error handling
//!
//! Reads return [`SecfigError`], which wraps the per-record [`SetError`] with
//! its origin and line. With the `rich-errors` feature both implement
//! `miette::Diagnostic`. See the [`error`] module for the full set.

pub mod error;
pub mod types;

mod builder;
mod coerce;
mod meta;
mod read;
mod registry;
mod resolve;
mod section;
mod set;
mod validate;
mod value;
mod write;

#[cfg(test)]
mod fixtures;

use std::io;
use std::path::Path;

pub use builder::{Secfig, SecfigBuilder};
pub use coerce::Strategy;
pub use error::{SecfigError, SetError};
pub use meta::{Constraints, FieldMeta};
pub use read::{Records, records};
pub use registry::{
    CoerceFn, Registry, RenderFn, clear_type_registrations, register_type_coercion,
    register_type_rendering,
};
pub use section::{
    Assigned, Config, Field, FieldInfo, Section, SectionField, Slot, SlotRef, Variable,
};
pub use set::{set, set_with};
pub use types::{IntMode, Record};
pub use validate::Interval;
pub use value::{Coerced, Parser, Value, parse_from_str, scan_fully};
pub use write::{to_string_with, write_with};

/// Apply the records in `text` to `root` with default settings.
///
/// Shorthand for `Secfig::builder::<C>().read_str_into(root, text)`.
pub fn read_str_into<C: Config>(root: &mut C, text: &str) -> Result<(), SecfigError> {
    Secfig::builder::<C>().read_str_into(root, text)
}

/// Read the file at `path` into `root` with default settings.
pub fn read_file_into<C: Config>(root: &mut C, path: impl AsRef<Path>) -> Result<(), SecfigError> {
    Secfig::builder::<C>().read_file_into(root, path)
}

/// Write `root` using the process-wide renderings.
pub fn write<C: Config, W: io::Write>(root: &C, out: &mut W) -> Result<(), SecfigError> {
    Secfig::builder::<C>().write(root, out)
}

/// Render `root` as text using the process-wide renderings.
pub fn to_string<C: Config>(root: &C) -> Result<String, SecfigError> {
    Secfig::builder::<C>().to_string(root)
}

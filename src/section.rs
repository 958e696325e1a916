//! The target object model.
//!
//! A configuration is a root struct whose fields are sections; a section is a
//! struct whose fields are variables. Both are declared with the [`config!`]
//! and [`section!`] macros, which keep the struct definition as written and
//! generate a static field table plus positional accessors:
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! secfig::section! {
//!     #[derive(Debug, Default)]
//!     pub struct Server {
//!         pub host: String,
//!         pub port: u16 => ("", min = "1"),
//!         pub aliases: Vec<String> => ("alias"),
//!     }
//! }
//!
//! secfig::config! {
//!     #[derive(Debug, Default)]
//!     pub struct Settings {
//!         pub server: BTreeMap<String, Server>,
//!     }
//! }
//!
//! let mut settings = Settings::default();
//! secfig::read_str_into(&mut settings, "[server \"www\"]\nport = 8080\n").unwrap();
//! assert_eq!(settings.server["www"].port, 8080);
//! ```
//!
//! The shape of every field is decided by its type:
//!
//! | Field type                 | Role                                        |
//! |----------------------------|---------------------------------------------|
//! | `T: Value`                 | single variable                             |
//! | `Option<T>`                | single variable, `Some` once assigned       |
//! | `Vec<T>`                   | multi-valued variable                       |
//! | a [`section!`] struct      | embedded: its fields join the outer section |
//!
//! and for root fields:
//!
//! | Field type                 | Role                                        |
//! |----------------------------|---------------------------------------------|
//! | a [`section!`] struct      | section                                     |
//! | `Option<S>`                | section, allocated on first use             |
//! | `BTreeMap<String, S>`      | section with subsections, one entry each    |
//! | `HashMap<String, S>`       | same, written in key order                  |
//!
//! Any other field type is rejected at compile time.
//!
//! Field descriptors follow the type after `=>`: the tag string
//! (`"alias,int=dho,cb=callback"`) and optional `min`, `max`, `minlen` and
//! `maxlen` entries. Callback names listed in a trailing `callbacks { .. }`
//! block are `fn(&mut self)` methods of the section, invoked after a
//! successful assignment to a field whose tag names them.

use std::collections::{BTreeMap, HashMap};

use crate::error::AssignError;
use crate::meta::FieldMeta;
use crate::registry::Registry;
use crate::set;
use crate::value::Value;
use crate::write;

/// Static description of one declared field.
#[derive(Debug)]
pub struct FieldInfo {
    /// The field name as written in the struct.
    pub name: &'static str,
    pub meta: FieldMeta,
}

impl FieldInfo {
    pub fn new(name: &'static str, meta: FieldMeta) -> Self {
        Self { name, meta }
    }

    /// The field name without a raw-identifier prefix.
    pub fn ident(&self) -> &'static str {
        self.name.trim_start_matches("r#")
    }

    /// The name the writer uses: the alias, or the field name in lowercase
    /// with underscores written as hyphens.
    pub fn key(&self) -> String {
        match &self.meta.ident {
            Some(alias) => alias.clone(),
            None => self.ident().to_lowercase().replace('_', "-"),
        }
    }
}

/// What the engine did with an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assigned {
    Stored,
    /// A blank assignment reset a multi-valued variable.
    Cleared,
}

/// A field that holds values: the object-safe view of `T`, `Option<T>` and
/// `Vec<T>`.
pub trait Variable {
    fn assign(
        &mut self,
        blank: bool,
        text: &str,
        meta: &FieldMeta,
        registry: &Registry,
    ) -> Result<Assigned, AssignError>;

    /// Rendered values to write, one line each. Empty when there is nothing
    /// to write. `meta` selects the notation, e.g. the integer mode.
    fn render(&self, meta: &FieldMeta, registry: &Registry) -> Vec<String>;
}

pub enum Slot<'a> {
    Variable(&'a mut dyn Variable),
    Embedded(&'a mut dyn Section),
}

pub enum SlotRef<'a> {
    Variable(&'a dyn Variable),
    Embedded(&'a dyn Section),
}

/// A field of a section. Implemented for the variable shapes here and for
/// every [`section!`] struct, which embeds.
pub trait Field {
    fn as_slot(&mut self) -> Slot<'_>;
    fn as_slot_ref(&self) -> SlotRef<'_>;
}

/// A struct declared with [`section!`].
pub trait Section {
    fn fields(&self) -> &'static [FieldInfo];

    /// The field at `index` in [`fields`](Section::fields).
    fn slot(&mut self, index: usize) -> Option<Slot<'_>>;

    fn slot_ref(&self, index: usize) -> Option<SlotRef<'_>>;

    /// Invoke the declared callback `name`. False when there is none.
    fn invoke(&mut self, name: &str) -> bool;
}

/// A root field: one section, an optional one, or a map of subsections.
pub trait SectionField {
    /// The section instance for `subsection`, allocated if needed. `None`
    /// when a non-empty subsection is given for a section without
    /// subsections.
    fn instance(&mut self, subsection: Option<&str>) -> Option<&mut dyn Section>;

    /// Every present instance with its subsection, in key order.
    fn instances(&self) -> Vec<(Option<&str>, &dyn Section)>;
}

/// A struct declared with [`config!`].
pub trait Config {
    fn sections(&self) -> &'static [FieldInfo];

    fn section_mut(&mut self, index: usize) -> Option<&mut dyn SectionField>;

    fn section_ref(&self, index: usize) -> Option<&dyn SectionField>;
}

impl<T: Value> Variable for T {
    fn assign(
        &mut self,
        blank: bool,
        text: &str,
        meta: &FieldMeta,
        registry: &Registry,
    ) -> Result<Assigned, AssignError> {
        *self = set::coerce_checked(registry, blank, text, meta)?;
        Ok(Assigned::Stored)
    }

    fn render(&self, meta: &FieldMeta, registry: &Registry) -> Vec<String> {
        if *self == T::default() {
            return Vec::new();
        }
        vec![write::render_value(self, meta, registry)]
    }
}

impl<T: Value> Variable for Option<T> {
    fn assign(
        &mut self,
        blank: bool,
        text: &str,
        meta: &FieldMeta,
        registry: &Registry,
    ) -> Result<Assigned, AssignError> {
        *self = Some(set::coerce_checked(registry, blank, text, meta)?);
        Ok(Assigned::Stored)
    }

    fn render(&self, meta: &FieldMeta, registry: &Registry) -> Vec<String> {
        self.iter()
            .map(|value| write::render_value(value, meta, registry))
            .collect()
    }
}

impl<T: Value> Variable for Vec<T> {
    fn assign(
        &mut self,
        blank: bool,
        text: &str,
        meta: &FieldMeta,
        registry: &Registry,
    ) -> Result<Assigned, AssignError> {
        if blank {
            self.clear();
            return Ok(Assigned::Cleared);
        }
        self.push(set::coerce_checked(registry, blank, text, meta)?);
        Ok(Assigned::Stored)
    }

    fn render(&self, meta: &FieldMeta, registry: &Registry) -> Vec<String> {
        self.iter()
            .map(|value| write::render_value(value, meta, registry))
            .collect()
    }
}

impl<T: Value> Field for T {
    fn as_slot(&mut self) -> Slot<'_> {
        Slot::Variable(self)
    }

    fn as_slot_ref(&self) -> SlotRef<'_> {
        SlotRef::Variable(self)
    }
}

impl<T: Value> Field for Option<T> {
    fn as_slot(&mut self) -> Slot<'_> {
        Slot::Variable(self)
    }

    fn as_slot_ref(&self) -> SlotRef<'_> {
        SlotRef::Variable(self)
    }
}

impl<T: Value> Field for Vec<T> {
    fn as_slot(&mut self) -> Slot<'_> {
        Slot::Variable(self)
    }

    fn as_slot_ref(&self) -> SlotRef<'_> {
        SlotRef::Variable(self)
    }
}

fn is_plain(subsection: Option<&str>) -> bool {
    subsection.is_none_or(str::is_empty)
}

impl<S: Section> SectionField for S {
    fn instance(&mut self, subsection: Option<&str>) -> Option<&mut dyn Section> {
        if !is_plain(subsection) {
            return None;
        }
        Some(self)
    }

    fn instances(&self) -> Vec<(Option<&str>, &dyn Section)> {
        vec![(None, self as &dyn Section)]
    }
}

impl<S: Section + Default> SectionField for Option<S> {
    fn instance(&mut self, subsection: Option<&str>) -> Option<&mut dyn Section> {
        if !is_plain(subsection) {
            return None;
        }
        if self.is_none() {
            log::debug!("allocating optional section {}", std::any::type_name::<S>());
        }
        Some(self.get_or_insert_with(S::default))
    }

    fn instances(&self) -> Vec<(Option<&str>, &dyn Section)> {
        self.iter().map(|s| (None, s as &dyn Section)).collect()
    }
}

/// Map entries keyed by the empty string stand for the section written
/// without a subsection.
fn entry_key(key: &str) -> Option<&str> {
    (!key.is_empty()).then_some(key)
}

impl<S: Section + Default> SectionField for BTreeMap<String, S> {
    fn instance(&mut self, subsection: Option<&str>) -> Option<&mut dyn Section> {
        let key = subsection.unwrap_or_default();
        if !self.contains_key(key) {
            log::debug!("allocating subsection {key:?}");
        }
        Some(self.entry(key.to_string()).or_default())
    }

    fn instances(&self) -> Vec<(Option<&str>, &dyn Section)> {
        self.iter()
            .map(|(k, s)| (entry_key(k), s as &dyn Section))
            .collect()
    }
}

impl<S: Section + Default> SectionField for HashMap<String, S> {
    fn instance(&mut self, subsection: Option<&str>) -> Option<&mut dyn Section> {
        let key = subsection.unwrap_or_default();
        if !self.contains_key(key) {
            log::debug!("allocating subsection {key:?}");
        }
        Some(self.entry(key.to_string()).or_default())
    }

    fn instances(&self) -> Vec<(Option<&str>, &dyn Section)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(k, s)| (entry_key(k), s as &dyn Section))
            .collect()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_meta {
    () => {
        $crate::FieldMeta::default()
    };
    ($tag:literal $(, $key:ident = $val:literal)* $(,)?) => {
        $crate::FieldMeta::parse($tag, &[$((::std::stringify!($key), $val)),*])
    };
}

/// Declare a section struct.
///
/// ```
/// secfig::section! {
///     #[derive(Debug, Default)]
///     pub struct Log {
///         pub level: String => ("", minlen = "1"),
///         pub rotate: bool,
///         pub changes: u32 => ("-"),
///         pub file: std::path::PathBuf => ("path,cb=on_file"),
///     }
///     callbacks { on_file }
/// }
///
/// impl Log {
///     fn on_file(&mut self) {
///         self.changes += 1;
///     }
/// }
/// ```
#[macro_export]
macro_rules! section {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fattr:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> ($($desc:tt)*))?
            ),* $(,)?
        }
        $(callbacks { $($cb:ident),* $(,)? })?
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $($(#[$fattr])* $fvis $field: $ty,)*
        }

        impl $crate::Section for $name {
            fn fields(&self) -> &'static [$crate::FieldInfo] {
                static FIELDS: ::std::sync::LazyLock<::std::vec::Vec<$crate::FieldInfo>> =
                    ::std::sync::LazyLock::new(|| {
                        ::std::vec![$(
                            $crate::FieldInfo::new(
                                ::std::stringify!($field),
                                $crate::__field_meta!($($($desc)*)?),
                            )
                        ),*]
                    });
                &FIELDS
            }

            #[allow(unused_mut)]
            fn slot(&mut self, index: usize) -> ::std::option::Option<$crate::Slot<'_>> {
                let mut position = 0usize..;
                $(
                    if position.next() == ::std::option::Option::Some(index) {
                        return ::std::option::Option::Some($crate::Field::as_slot(&mut self.$field));
                    }
                )*
                ::std::option::Option::None
            }

            #[allow(unused_mut)]
            fn slot_ref(&self, index: usize) -> ::std::option::Option<$crate::SlotRef<'_>> {
                let mut position = 0usize..;
                $(
                    if position.next() == ::std::option::Option::Some(index) {
                        return ::std::option::Option::Some($crate::Field::as_slot_ref(&self.$field));
                    }
                )*
                ::std::option::Option::None
            }

            fn invoke(&mut self, name: &str) -> bool {
                match name {
                    $($(::std::stringify!($cb) => {
                        self.$cb();
                        true
                    })*)?
                    _ => false,
                }
            }
        }

        impl $crate::Field for $name {
            fn as_slot(&mut self) -> $crate::Slot<'_> {
                $crate::Slot::Embedded(self)
            }

            fn as_slot_ref(&self) -> $crate::SlotRef<'_> {
                $crate::SlotRef::Embedded(self)
            }
        }
    };
}

/// Declare the root configuration struct. Only the alias of a root field's
/// descriptor is used.
#[macro_export]
macro_rules! config {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fattr:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> ($($desc:tt)*))?
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $($(#[$fattr])* $fvis $field: $ty,)*
        }

        impl $crate::Config for $name {
            fn sections(&self) -> &'static [$crate::FieldInfo] {
                static FIELDS: ::std::sync::LazyLock<::std::vec::Vec<$crate::FieldInfo>> =
                    ::std::sync::LazyLock::new(|| {
                        ::std::vec![$(
                            $crate::FieldInfo::new(
                                ::std::stringify!($field),
                                $crate::__field_meta!($($($desc)*)?),
                            )
                        ),*]
                    });
                &FIELDS
            }

            #[allow(unused_mut)]
            fn section_mut(
                &mut self,
                index: usize,
            ) -> ::std::option::Option<&mut dyn $crate::SectionField> {
                let mut position = 0usize..;
                $(
                    if position.next() == ::std::option::Option::Some(index) {
                        return ::std::option::Option::Some(&mut self.$field as &mut dyn $crate::SectionField);
                    }
                )*
                ::std::option::Option::None
            }

            #[allow(unused_mut)]
            fn section_ref(
                &self,
                index: usize,
            ) -> ::std::option::Option<&dyn $crate::SectionField> {
                let mut position = 0usize..;
                $(
                    if position.next() == ::std::option::Option::Some(index) {
                        return ::std::option::Option::Some(&self.$field as &dyn $crate::SectionField);
                    }
                )*
                ::std::option::Option::None
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Base, Core, Server, Settings};

    fn names(fields: &[FieldInfo]) -> Vec<&str> {
        fields.iter().map(|f| f.name).collect()
    }

    #[test]
    fn field_table_follows_declaration_order() {
        let core = Core::default();
        let fields = core.fields();
        assert_eq!(fields[0].name, "name");
        assert!(names(fields).contains(&"base"));
        assert!(std::ptr::eq(fields, Core::default().fields()));
    }

    #[test]
    fn descriptors_are_parsed_into_metadata() {
        let core = Core::default();
        let mode = core.fields().iter().find(|f| f.name == "mode").unwrap();
        assert_eq!(mode.meta.ident.as_deref(), Some("file-mode"));
        let port = core.fields().iter().find(|f| f.name == "port").unwrap();
        assert_eq!(port.meta.constraints.min.as_deref(), Some("1"));
        assert_eq!(port.meta.callback.as_deref(), Some("on_port"));
    }

    #[test]
    fn keys_use_alias_or_hyphenated_name() {
        let core = Core::default();
        let keys: Vec<String> = core.fields().iter().map(FieldInfo::key).collect();
        assert!(keys.contains(&"file-mode".to_string()));
        assert!(keys.contains(&"listen-backlog".to_string()));
        let raw = FieldInfo::new("r#type", FieldMeta::default());
        assert_eq!(raw.ident(), "type");
        assert_eq!(raw.key(), "type");
    }

    #[test]
    fn slots_distinguish_embedded_sections() {
        let mut core = Core::default();
        let base = core.fields().iter().position(|f| f.name == "base").unwrap();
        assert!(matches!(core.slot(base), Some(Slot::Embedded(_))));
        assert!(matches!(core.slot(0), Some(Slot::Variable(_))));
        assert!(core.slot(core.fields().len()).is_none());
        assert!(matches!(core.slot_ref(base), Some(SlotRef::Embedded(_))));
    }

    #[test]
    fn invoke_runs_declared_callbacks_only() {
        let mut base = Base::default();
        assert!(base.invoke("on_label"));
        assert_eq!(base.label_changes, 1);
        assert!(!base.invoke("on_missing"));
    }

    #[test]
    fn plain_section_rejects_subsection() {
        let mut settings = Settings::default();
        assert!(settings.core.instance(None).is_some());
        assert!(settings.core.instance(Some("")).is_some());
        assert!(settings.core.instance(Some("x")).is_none());
    }

    #[test]
    fn optional_section_is_allocated_on_use() {
        let mut settings = Settings::default();
        assert!(settings.extra.instances().is_empty());
        assert!(settings.extra.instance(Some("x")).is_none());
        assert!(settings.extra.is_none());
        assert!(settings.extra.instance(None).is_some());
        assert!(settings.extra.is_some());
        assert_eq!(settings.extra.instances().len(), 1);
    }

    #[test]
    fn map_entries_are_allocated_per_subsection() {
        let mut servers: BTreeMap<String, Server> = BTreeMap::new();
        servers.instance(Some("b")).unwrap();
        servers.instance(Some("a")).unwrap();
        servers.instance(Some("b")).unwrap();
        servers.instance(None).unwrap();
        assert_eq!(servers.len(), 3);
        let keys: Vec<_> = servers.instances().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, [None, Some("a"), Some("b")]);
    }

    #[test]
    fn hash_map_instances_are_sorted() {
        let mut servers: HashMap<String, Server> = HashMap::new();
        for key in ["zeta", "alpha", "mid"] {
            servers.instance(Some(key)).unwrap();
        }
        let keys: Vec<_> = servers.instances().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, [Some("alpha"), Some("mid"), Some("zeta")]);
    }

    #[test]
    fn config_exposes_sections() {
        let mut settings = Settings::default();
        let sections = settings.sections();
        assert_eq!(names(sections), ["core", "servers", "extra", "hidden"]);
        assert_eq!(sections[1].meta.ident.as_deref(), Some("server"));
        assert!(settings.section_mut(1).is_some());
        assert!(settings.section_ref(sections.len()).is_none());
    }

    #[test]
    fn vec_blank_clears() {
        let reg = Registry::new();
        let mut tags = vec!["a".to_string()];
        let meta = FieldMeta::default();
        assert_eq!(tags.assign(true, "", &meta, &reg).unwrap(), Assigned::Cleared);
        assert!(tags.is_empty());
        assert_eq!(tags.assign(false, "b", &meta, &reg).unwrap(), Assigned::Stored);
        assert_eq!(tags, ["b"]);
    }

    #[test]
    fn single_values_are_untouched_on_failure() {
        let reg = Registry::new();
        let mut port: u16 = 80;
        let meta = FieldMeta::default();
        assert!(port.assign(false, "http", &meta, &reg).is_err());
        assert_eq!(port, 80);
        let mut maybe: Option<u16> = None;
        assert!(maybe.assign(false, "-1", &meta, &reg).is_err());
        assert_eq!(maybe, None);
    }

    #[test]
    fn render_skips_zero_values_but_not_present_options() {
        let reg = Registry::new();
        let meta = FieldMeta::default();
        assert!(0u16.render(&meta, &reg).is_empty());
        assert_eq!(8u16.render(&meta, &reg), ["8"]);
        assert_eq!(Some(0u16).render(&meta, &reg), ["0"]);
        assert!(None::<u16>.render(&meta, &reg).is_empty());
        assert_eq!(vec![0u16, 3].render(&meta, &reg), ["0", "3"]);
    }

    #[test]
    fn render_follows_the_integer_mode() {
        let reg = Registry::new();
        let octal = FieldMeta::parse(",int=o", &[]);
        let hex = FieldMeta::parse(",int=h", &[]);
        assert_eq!(0o644u32.render(&octal, &reg), ["0644"]);
        assert_eq!(vec![8u8, 255].render(&hex, &reg), ["0x8", "0xff"]);
        assert_eq!(Some(-9i16).render(&octal, &reg), ["-011"]);
    }
}

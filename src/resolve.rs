//! Name resolution: which declared field a section or variable name denotes.
//!
//! Lookup runs in two passes over the candidate fields:
//!
//! 1. **Alias pass**: a field whose declared alias equals the name,
//!    ignoring case.
//! 2. **Structural pass**: among fields without an alias, one whose field
//!    name equals the name ignoring case, with `-` and `_` treated as
//!    insignificant. `reg-types-1`, `reg_types_1` and `RegTypes1` all denote
//!    a field `reg_types_1`.
//!
//! Fields of embedded sections are candidates too. Within a pass, direct
//! fields are tried before embedded ones, then declaration order decides;
//! the first match wins. A field aliased `-` never matches.
//!
//! Resolution is pure: it reads field tables and never touches values.

use crate::section::{Config, FieldInfo, Section, Slot, SlotRef};

/// A resolved variable: the index path through embedded sections, ending at
/// the variable itself.
#[derive(Debug, Clone)]
pub struct FieldPath {
    pub indices: Vec<usize>,
    pub info: &'static FieldInfo,
}

impl FieldPath {
    /// Indices of the embedded sections leading to the variable.
    pub fn owner(&self) -> &[usize] {
        &self.indices[..self.indices.len().saturating_sub(1)]
    }

    /// Index of the variable within its owning section.
    pub fn leaf(&self) -> usize {
        self.indices.last().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Alias,
    Structural,
}

impl Pass {
    fn matches(self, info: &FieldInfo, name: &str) -> bool {
        match (self, info.meta.ident.as_deref()) {
            (_, Some("-")) => false,
            (Pass::Alias, Some(alias)) => alias.to_lowercase() == name.to_lowercase(),
            (Pass::Alias, None) | (Pass::Structural, Some(_)) => false,
            (Pass::Structural, None) => fold(info.ident()) == fold(name),
        }
    }
}

/// Case- and separator-insensitive form of a name.
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the root field (section) named `name`.
pub fn section_index<C: Config + ?Sized>(root: &C, name: &str) -> Option<usize> {
    let fields = root.sections();
    [Pass::Alias, Pass::Structural]
        .into_iter()
        .find_map(|pass| fields.iter().position(|info| pass.matches(info, name)))
}

/// Path to the variable named `name` in `section`, searching embedded
/// sections.
pub fn variable_path(section: &dyn Section, name: &str) -> Option<FieldPath> {
    [Pass::Alias, Pass::Structural]
        .into_iter()
        .find_map(|pass| search(section, name, pass))
}

fn search(section: &dyn Section, name: &str, pass: Pass) -> Option<FieldPath> {
    let fields = section.fields();
    let mut embedded = Vec::new();
    for (i, info) in fields.iter().enumerate() {
        match section.slot_ref(i) {
            Some(SlotRef::Variable(_)) if pass.matches(info, name) => {
                return Some(FieldPath {
                    indices: vec![i],
                    info,
                });
            }
            Some(SlotRef::Embedded(inner)) => embedded.push((i, inner)),
            _ => {}
        }
    }
    embedded.into_iter().find_map(|(i, inner)| {
        let mut path = search(inner, name, pass)?;
        path.indices.insert(0, i);
        Some(path)
    })
}

/// The embedded section reached by following `path` from `section`.
pub fn descend<'a>(section: &'a mut dyn Section, path: &[usize]) -> Option<&'a mut dyn Section> {
    match path.split_first() {
        None => Some(section),
        Some((&i, rest)) => match section.slot(i)? {
            Slot::Embedded(inner) => descend(inner, rest),
            Slot::Variable(_) => None,
        },
    }
}

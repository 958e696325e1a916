//! The assignment engine: apply one `section / subsection / variable = value`
//! record to a configuration.

use std::any::type_name;

use crate::coerce::{Strategy, coerce};
use crate::error::{AssignError, CoerceError, Location, SetError};
use crate::meta::FieldMeta;
use crate::registry::{self, Registry};
use crate::resolve;
use crate::section::{Assigned, Config, Slot};
use crate::validate;
use crate::value::{Coerced, Value};

/// Apply one record using the process-wide registry.
///
/// `value` is `None` for a blank assignment (a bare `name` line). See
/// [`set_with`].
pub fn set<C: Config + ?Sized>(
    root: &mut C,
    section: &str,
    subsection: Option<&str>,
    variable: &str,
    value: Option<&str>,
) -> Result<(), SetError> {
    set_with(&registry::global(), root, section, subsection, variable, value)
}

/// Apply one record using `registry` for registered coercions.
///
/// The section is resolved against the root fields, allocating optional
/// sections and map entries as needed; the variable is resolved within the
/// section, including embedded sections. A multi-valued variable gets the
/// coerced value appended, or is cleared by a blank assignment. A single
/// variable is replaced only if coercion and validation both succeed.
/// Afterwards the field's callback, if any, runs on the section that
/// declares the field.
pub fn set_with<C: Config + ?Sized>(
    registry: &Registry,
    root: &mut C,
    section: &str,
    subsection: Option<&str>,
    variable: &str,
    value: Option<&str>,
) -> Result<(), SetError> {
    let invalid_section = || SetError::InvalidSection {
        section: section.to_string(),
    };
    let index = resolve::section_index(root, section).ok_or_else(invalid_section)?;
    let target = root
        .section_mut(index)
        .ok_or_else(invalid_section)?
        .instance(subsection)
        .ok_or_else(|| SetError::InvalidSubsection {
            section: section.to_string(),
            subsection: subsection.unwrap_or_default().to_string(),
        })?;

    let location = Location {
        section: section.to_string(),
        subsection: subsection.map(str::to_string),
        variable: variable.to_string(),
    };
    let Some(path) = resolve::variable_path(&*target, variable) else {
        return Err(SetError::InvalidVariable(location));
    };
    let meta = &path.info.meta;
    if let Some(source) = &meta.error {
        return Err(SetError::InvalidTag {
            location,
            source: source.clone(),
        });
    }

    let Some(owner) = resolve::descend(target, path.owner()) else {
        return Err(SetError::InvalidVariable(location));
    };
    let assigned = match owner.slot(path.leaf()) {
        Some(Slot::Variable(var)) => var
            .assign(value.is_none(), value.unwrap_or_default(), meta, registry)
            .map_err(|e| e.at(location.clone()))?,
        _ => return Err(SetError::InvalidVariable(location)),
    };
    log::trace!("set {location} = {value:?} ({assigned:?})");

    if assigned == Assigned::Stored
        && let Some(callback) = &meta.callback
        && !owner.invoke(callback)
    {
        log::debug!("no callback {callback:?} for {location}");
    }
    Ok(())
}

/// Coerce `text` to a `T` and check it against the declared constraints.
///
/// Bounds are parsed with the strategy that produced the value.
pub(crate) fn coerce_checked<T: Value>(
    registry: &Registry,
    blank: bool,
    text: &str,
    meta: &FieldMeta,
) -> Result<T, AssignError> {
    let (value, strategy) = match coerce::<T>(registry, blank, text, meta) {
        Coerced::Done(done) => done,
        Coerced::Failed(e) => return Err(e.into()),
        Coerced::Unsupported => return Err(AssignError::Unsupported(type_name::<T>())),
    };
    validate::check(&value, meta, |literal| bound(strategy, registry, literal, meta))?;
    Ok(value)
}

fn bound<T: Value>(
    strategy: Strategy,
    registry: &Registry,
    literal: &str,
    meta: &FieldMeta,
) -> Result<T, CoerceError> {
    match strategy.apply::<T>(registry, false, literal, meta) {
        Coerced::Done(value) => Ok(value),
        Coerced::Failed(e) => Err(e),
        Coerced::Unsupported => Err(CoerceError::Custom(
            format!("{strategy:?} coercion no longer available").into(),
        )),
    }
}

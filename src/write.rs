//! The serializer: write a configuration back out in the textual format.
//!
//! Every present section instance becomes a `[name]` or `[name "sub"]`
//! header followed by one `key = value` line per non-zero variable (one per
//! element for multi-valued ones) and a blank line. Embedded sections are
//! flattened into the enclosing block. Fields aliased `-` are skipped.
//!
//! A header holds a single line, so a map key containing a newline cannot be
//! written and fails with [`io::ErrorKind::InvalidInput`].

use std::io;

use crate::meta::FieldMeta;
use crate::registry::Registry;
use crate::section::{Config, Section, SlotRef};
use crate::value::Value;

/// Render a value: a registered rendering, else the primitive form for the
/// field's integer mode, else the type's textual form, else its display form.
pub(crate) fn render_value<T: Value>(value: &T, meta: &FieldMeta, registry: &Registry) -> String {
    if let Some(render) = registry.rendering::<T>() {
        return render(value);
    }
    value
        .render_primitive(meta.int_mode)
        .or_else(|| value.to_text())
        .unwrap_or_else(|| value.display())
}

/// Render `root` to a string.
pub fn to_string_with<C: Config + ?Sized>(registry: &Registry, root: &C) -> io::Result<String> {
    let mut out = String::new();
    for (i, info) in root.sections().iter().enumerate() {
        if info.meta.is_hidden() {
            continue;
        }
        let Some(holder) = root.section_ref(i) else {
            continue;
        };
        let name = info.key();
        for (subsection, section) in holder.instances() {
            match subsection {
                Some(sub) => {
                    let sub = escape_subsection(&name, sub)?;
                    out.push_str(&format!("[{name} \"{sub}\"]\n"));
                }
                None => out.push_str(&format!("[{name}]\n")),
            }
            write_variables(registry, section, &mut out);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Write `root` to `out`, using `registry` for registered renderings.
pub fn write_with<C: Config + ?Sized, W: io::Write>(
    registry: &Registry,
    root: &C,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(to_string_with(registry, root)?.as_bytes())
}

fn write_variables(registry: &Registry, section: &dyn Section, out: &mut String) {
    for (i, info) in section.fields().iter().enumerate() {
        match section.slot_ref(i) {
            Some(SlotRef::Embedded(inner)) => write_variables(registry, inner, out),
            Some(SlotRef::Variable(var)) if !info.meta.is_hidden() => {
                let key = info.key();
                for value in var.render(&info.meta, registry) {
                    out.push_str(&format!("{key} = {}\n", quote(&value)));
                }
            }
            _ => {}
        }
    }
}

fn escape_subsection(section: &str, sub: &str) -> io::Result<String> {
    if sub.contains('\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("subsection {sub:?} of section {section:?} contains a newline"),
        ));
    }
    Ok(sub.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quote a rendered value when reading it back verbatim would lose or
/// misread characters.
fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.contains(['"', '\\', ';', '#', '\n', '\t', '\u{8}']);
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

//! Reading the textual format.
//!
//! [`records`] tokenizes config text into [`Record`]s; the driver functions
//! feed them to the assignment engine and attach the origin and line number
//! to any failure.
//!
//! ```text
//! ; comment            # also a comment
//! [section]
//! name = value         ; trailing comment
//! flag                 ; blank assignment
//! [section "sub"]
//! quoted = "  keeps ; spaces  "
//! long = first \
//!        second
//! ```
//!
//! Section names are letters, digits, `-`, `_` and `.`; variable names are
//! letters, digits, `-` and `_`, starting with a letter. Values are trimmed;
//! inside double quotes whitespace and comment characters are kept. The
//! escapes `\\`, `\"`, `\n`, `\t` and `\b` are recognized, and a `\` at the
//! end of a line continues the value on the next one.

use std::iter::Enumerate;
use std::path::{Path, PathBuf};
use std::str::Lines;

use crate::error::SecfigError;
use crate::registry::Registry;
use crate::section::Config;
use crate::set;
use crate::types::Record;

/// Iterator over the records of one config text. Stops after the first
/// syntax error.
pub struct Records<'a> {
    origin: &'a str,
    lines: Enumerate<Lines<'a>>,
    section: Option<(String, Option<String>)>,
    failed: bool,
}

/// Tokenize `text`. `origin` names the source in syntax errors.
pub fn records<'a>(text: &'a str, origin: &'a str) -> Records<'a> {
    Records {
        origin,
        lines: text.lines().enumerate(),
        section: None,
        failed: false,
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record, SecfigError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.advance().transpose()?;
        self.failed = result.is_err();
        Some(result)
    }
}

impl<'a> Records<'a> {
    fn advance(&mut self) -> Result<Option<Record>, SecfigError> {
        while let Some((index, text)) = self.lines.next() {
            let line = index + 1;
            let mut cur = Cursor::new(text);
            cur.skip_ws();
            match cur.peek() {
                None | Some(';' | '#') => continue,
                Some('[') => self.section = Some(self.header(&mut cur, line)?),
                Some(_) => return self.variable(cur, line).map(Some),
            }
        }
        Ok(None)
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> SecfigError {
        SecfigError::Syntax {
            origin: self.origin.to_string(),
            line,
            message: message.into(),
        }
    }

    fn header(
        &self,
        cur: &mut Cursor<'_>,
        line: usize,
    ) -> Result<(String, Option<String>), SecfigError> {
        cur.bump();
        cur.skip_ws();
        let name = cur.take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if name.is_empty() {
            return Err(self.syntax(line, "missing section name"));
        }
        cur.skip_ws();
        let subsection = if cur.peek() == Some('"') {
            cur.bump();
            let sub = self.subsection(cur, line)?;
            cur.skip_ws();
            Some(sub)
        } else {
            None
        };
        if cur.bump() != Some(']') {
            return Err(self.syntax(line, "expected ']' to close section header"));
        }
        cur.skip_ws();
        if !cur.at_end_or_comment() {
            return Err(self.syntax(line, "unexpected text after section header"));
        }
        Ok((name.to_string(), subsection))
    }

    fn subsection(&self, cur: &mut Cursor<'_>, line: usize) -> Result<String, SecfigError> {
        let mut sub = String::new();
        loop {
            match cur.bump() {
                None => return Err(self.syntax(line, "unterminated subsection name")),
                Some('"') => return Ok(sub),
                Some('\\') => match cur.bump() {
                    Some(c @ ('\\' | '"')) => sub.push(c),
                    _ => return Err(self.syntax(line, "invalid escape in subsection name")),
                },
                Some(c) => sub.push(c),
            }
        }
    }

    fn variable(&mut self, mut cur: Cursor<'a>, line: usize) -> Result<Record, SecfigError> {
        let Some((section, subsection)) = self.section.clone() else {
            return Err(self.syntax(line, "variable outside of any section"));
        };
        let name = cur.take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_'));
        if !name.starts_with(char::is_alphabetic) {
            return Err(self.syntax(line, "invalid variable name"));
        }
        cur.skip_ws();
        let value = if cur.at_end_or_comment() {
            None
        } else if cur.peek() == Some('=') {
            cur.bump();
            Some(self.value(cur, line)?)
        } else {
            return Err(self.syntax(line, format!("expected '=' after {name:?}")));
        };
        Ok(Record {
            section,
            subsection,
            variable: name.to_string(),
            value,
            line,
        })
    }

    fn value(&mut self, mut cur: Cursor<'a>, mut line: usize) -> Result<String, SecfigError> {
        let mut value = String::new();
        // Unquoted whitespace, kept only if more content follows.
        let mut pending = String::new();
        let mut quoted = false;
        let mut started = false;
        loop {
            let Some(c) = cur.bump() else {
                if quoted {
                    return Err(self.syntax(line, "unterminated quoted value"));
                }
                return Ok(value);
            };
            let literal = match c {
                '\\' => match cur.bump() {
                    None => {
                        let Some((index, next)) = self.lines.next() else {
                            return Err(self.syntax(line, "line continuation at end of input"));
                        };
                        line = index + 1;
                        cur = Cursor::new(next);
                        continue;
                    }
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('b') => '\u{8}',
                    Some(other) => {
                        return Err(self.syntax(line, format!("invalid escape '\\{other}'")));
                    }
                },
                '"' => {
                    quoted = !quoted;
                    value.push_str(&pending);
                    pending.clear();
                    started = true;
                    continue;
                }
                ';' | '#' if !quoted => return Ok(value),
                c if c.is_whitespace() && !quoted => {
                    if started {
                        pending.push(c);
                    }
                    continue;
                }
                c => c,
            };
            value.push_str(&pending);
            pending.clear();
            value.push(literal);
            started = true;
        }
    }
}

/// Position within one line.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|c: char| !pred(c)).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn at_end_or_comment(&self) -> bool {
        matches!(self.peek(), None | Some(';' | '#'))
    }
}

/// Feed every record of `text` to the engine.
///
/// In lenient mode (`strict == false`) records naming an unknown section,
/// subsection or variable are logged and skipped.
pub(crate) fn apply<C: Config + ?Sized>(
    registry: &Registry,
    strict: bool,
    text: &str,
    origin: &str,
    root: &mut C,
) -> Result<(), SecfigError> {
    for record in records(text, origin) {
        let record = record?;
        let result = set::set_with(
            registry,
            root,
            &record.section,
            record.subsection.as_deref(),
            &record.variable,
            record.value.as_deref(),
        );
        match result {
            Ok(()) => {}
            Err(e) if !strict && e.is_unknown_key() => {
                log::warn!("{origin}:{}: skipping {e}", record.line);
            }
            Err(source) => {
                return Err(SecfigError::Set {
                    origin: origin.to_string(),
                    line: record.line,
                    source,
                });
            }
        }
    }
    Ok(())
}

/// Read one file into `root`.
pub(crate) fn apply_file<C: Config + ?Sized>(
    registry: &Registry,
    strict: bool,
    path: &Path,
    root: &mut C,
) -> Result<(), SecfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| SecfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("reading {}", path.display());
    apply(registry, strict, &text, &path.display().to_string(), root)
}

/// Read each existing file in order into `root`, so later files override
/// single values set by earlier ones and extend multi-valued ones. Missing
/// files are skipped; other I/O errors are propagated.
///
/// Returns the files that were read.
pub(crate) fn apply_files<C: Config + ?Sized>(
    registry: &Registry,
    strict: bool,
    paths: &[PathBuf],
    root: &mut C,
) -> Result<Vec<PathBuf>, SecfigError> {
    let mut loaded = Vec::new();
    for path in paths {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(SecfigError::IoError {
                    path: path.clone(),
                    source: e,
                });
            }
        };
        apply(registry, strict, &text, &path.display().to_string(), root)?;
        loaded.push(path.clone());
    }
    Ok(loaded)
}

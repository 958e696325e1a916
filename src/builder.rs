use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{BoxError, SecfigError};
use crate::read;
use crate::registry::{self, Registry};
use crate::section::Config;
use crate::value::Value;
use crate::write;

/// Entry point for reading and writing a secfig configuration.
pub struct Secfig;

impl Secfig {
    pub fn builder<C: Config>() -> SecfigBuilder<C> {
        SecfigBuilder::new()
    }
}

/// Builder for reading configuration text into a `C` and writing it back.
///
/// Three knobs, all optional:
///
/// - **Files**: [`file()`](Self::file) / [`files()`](Self::files): what
///   [`load()`](Self::load) reads, in order.
/// - **Strictness**: [`strict()`](Self::strict): whether unknown sections and
///   variables are errors or warnings.
/// - **Conversions**: [`coercion()`](Self::coercion) and
///   [`rendering()`](Self::rendering): per-type hooks layered over the
///   process-wide registry.
pub struct SecfigBuilder<C: Config> {
    files: Vec<PathBuf>,
    strict: bool,
    registry: Registry,
    _phantom: PhantomData<C>,
}

impl<C: Config> SecfigBuilder<C> {
    fn new() -> Self {
        Self {
            files: Vec::new(),
            strict: true,
            registry: Registry::new(),
            _phantom: PhantomData,
        }
    }

    /// Append a file for [`load()`](Self::load). Files are read in the order
    /// given, so later files override single values from earlier ones.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Append several files, see [`file()`](Self::file).
    pub fn files<P: Into<PathBuf>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown sections, subsections and variables are errors;
    /// otherwise they are logged and skipped.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Use `f` to convert text into `T` for this builder only, ahead of any
    /// process-wide registration for `T`.
    pub fn coercion<T, F>(mut self, f: F) -> Self
    where
        T: Value,
        F: Fn(bool, &str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.registry.register_coercion(f);
        self
    }

    /// Use `f` to render `T` values for this builder only.
    pub fn rendering<T, F>(mut self, f: F) -> Self
    where
        T: Value,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.registry.register_rendering(f);
        self
    }

    /// The process-wide registry with this builder's entries on top.
    fn effective_registry(&self) -> Arc<Registry> {
        let global = registry::global();
        if self.registry.is_empty() {
            return global;
        }
        Arc::new(global.layered(&self.registry))
    }

    /// Read every configured file that exists into a default `C`.
    pub fn load(&self) -> Result<C, SecfigError>
    where
        C: Default,
    {
        let mut config = C::default();
        self.load_into(&mut config)?;
        Ok(config)
    }

    /// Read every configured file that exists into `root`. Missing files are
    /// skipped. Returns the files that were read.
    pub fn load_into(&self, root: &mut C) -> Result<Vec<PathBuf>, SecfigError> {
        let loaded = read::apply_files(&self.effective_registry(), self.strict, &self.files, root)?;
        log::debug!("loaded {} of {} config files", loaded.len(), self.files.len());
        Ok(loaded)
    }

    /// Parse `text` into a default `C`.
    pub fn load_str(&self, text: &str) -> Result<C, SecfigError>
    where
        C: Default,
    {
        let mut config = C::default();
        self.read_str_into(&mut config, text)?;
        Ok(config)
    }

    /// Apply the records in `text` to `root`, in order.
    pub fn read_str_into(&self, root: &mut C, text: &str) -> Result<(), SecfigError> {
        read::apply(&self.effective_registry(), self.strict, text, "<string>", root)
    }

    /// Read all of `reader` and apply it to `root`.
    pub fn read_into<R: io::Read>(&self, root: &mut C, mut reader: R) -> Result<(), SecfigError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(SecfigError::Read)?;
        read::apply(&self.effective_registry(), self.strict, &text, "<reader>", root)
    }

    /// Read the file at `path` and apply it to `root`. Unlike
    /// [`load()`](Self::load), a missing file is an error.
    pub fn read_file_into(&self, root: &mut C, path: impl AsRef<Path>) -> Result<(), SecfigError> {
        read::apply_file(&self.effective_registry(), self.strict, path.as_ref(), root)
    }

    /// Write `root` to `out`.
    pub fn write<W: io::Write>(&self, root: &C, out: &mut W) -> Result<(), SecfigError> {
        write::write_with(&self.effective_registry(), root, out)?;
        Ok(())
    }

    /// Render `root` as text.
    pub fn to_string(&self, root: &C) -> Result<String, SecfigError> {
        Ok(write::to_string_with(&self.effective_registry(), root)?)
    }
}

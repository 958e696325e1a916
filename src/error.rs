use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::validate::Interval;

/// Boxed error returned by user-supplied converters and text parsers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The section, subsection and variable a record was addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub section: String,
    pub subsection: Option<String>,
    pub variable: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section {:?}", self.section)?;
        if let Some(sub) = &self.subsection {
            write!(f, " subsection {sub:?}")?;
        }
        write!(f, " variable {:?}", self.variable)
    }
}

/// A field descriptor that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("invalid {key} constraint ({value})")]
    InvalidLength { key: &'static str, value: String },

    #[error("unknown field attribute '{0}'")]
    UnknownKey(String),
}

/// A coercion strategy applied to the value but could not convert it.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("blank value not supported for type")]
    BlankUnsupported,

    #[error("failed to parse bool {0:?}")]
    InvalidBool(String),

    #[error("failed to parse {text:?} as integer: {reason}")]
    InvalidInt { text: String, reason: String },

    #[error("ambiguous integer value {0:?}; must include '0' prefix")]
    AmbiguousInt(String),

    #[error("failed to parse {text:?} as {ty}: {source}")]
    Invalid {
        text: String,
        ty: &'static str,
        source: BoxError,
    },

    #[error("{0}")]
    Custom(BoxError),
}

/// A coerced value violated its declared bounds or length limits.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("Value {value} out of bounds {interval}")]
    OutOfBounds { value: String, interval: Interval },

    #[error("Value {value} too short: length {len} is below minimum {min}")]
    TooShort { value: String, len: usize, min: usize },

    #[error("Value {value} too long: length {len} exceeds maximum {max}")]
    TooLong { value: String, len: usize, max: usize },

    #[error("invalid {which} bound {literal:?}: {source}")]
    InvalidBound {
        which: &'static str,
        literal: String,
        source: CoerceError,
    },
}

/// Failure to store text into one variable. Becomes a [`SetError`] once the
/// record's location is attached.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("unsupported type {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Coerce(#[from] CoerceError),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),
}

impl AssignError {
    pub fn at(self, location: Location) -> SetError {
        match self {
            AssignError::Unsupported(ty) => SetError::UnsupportedType { location, ty },
            AssignError::Coerce(source) => SetError::Coerce { location, source },
            AssignError::Constraint(source) => SetError::Constraint { location, source },
        }
    }
}

/// Failure to apply one record to a target.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum SetError {
    #[error("invalid section: section {section:?}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(secfig::invalid_section), help("check the section name against the config struct"))
    )]
    InvalidSection { section: String },

    #[error("invalid subsection: section {section:?} subsection {subsection:?}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(secfig::invalid_subsection), help("only map-valued sections accept a subsection"))
    )]
    InvalidSubsection { section: String, subsection: String },

    #[error("invalid variable: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::invalid_variable)))]
    InvalidVariable(Location),

    #[error("{source}: {location}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::invalid_tag)))]
    InvalidTag { location: Location, source: TagError },

    #[error("unsupported type {ty}: {location}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(secfig::unsupported_type), help("register a coercion for this type"))
    )]
    UnsupportedType { location: Location, ty: &'static str },

    #[error("{source}: {location}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::coerce)))]
    Coerce { location: Location, source: CoerceError },

    #[error("{source}: {location}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::constraint)))]
    Constraint {
        location: Location,
        source: ConstraintError,
    },
}

impl SetError {
    /// True when the record named a section, subsection or variable the
    /// target does not have.
    pub fn is_unknown_key(&self) -> bool {
        matches!(
            self,
            SetError::InvalidSection { .. }
                | SetError::InvalidSubsection { .. }
                | SetError::InvalidVariable(_)
        )
    }

    /// The variable location, for errors raised after the section resolved.
    pub fn location(&self) -> Option<&Location> {
        match self {
            SetError::InvalidSection { .. } | SetError::InvalidSubsection { .. } => None,
            SetError::InvalidVariable(location)
            | SetError::InvalidTag { location, .. }
            | SetError::UnsupportedType { location, .. }
            | SetError::Coerce { location, .. }
            | SetError::Constraint { location, .. } => Some(location),
        }
    }
}

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum SecfigError {
    #[error("{origin}:{line}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::set)))]
    Set {
        origin: String,
        line: usize,
        source: SetError,
    },

    #[error("{origin}:{line}: {message}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::syntax)))]
    Syntax {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("Failed to read {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::io)))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read config: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::read)))]
    Read(std::io::Error),

    #[error("Failed to write config: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(secfig::write)))]
    Write(#[from] std::io::Error),
}

impl SecfigError {
    /// The per-record failure, if this error came from applying a record.
    pub fn set_error(&self) -> Option<&SetError> {
        match self {
            SecfigError::Set { source, .. } => Some(source),
            _ => None,
        }
    }
}

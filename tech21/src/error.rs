//!
//! # Technology Conversion Result and Error Types
//!
//! Errors fall into three tiers, by how much of a conversion they abort:
//! * [TechError::Structural] aborts the current cell only,
//! * [TechError::Reference] skips the offending rule, and the rest of its cell proceeds,
//! * [TechError::Style] aborts the whole conversion.
//!

// Local Imports
use tech21raw::{utils, StoreError};

/// # [TechError] Result Type
pub type TechResult<T> = Result<T, TechError>;

/// # Structural Problems
///
/// Kinds of [TechError::Structural] failure, each fatal to one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structural {
    /// Two examples whose regions overlap
    ClusterConflict,
    /// An example without a highlight marker
    MissingHighlight,
    /// An example with more than one highlight marker
    AmbiguousCluster,
    /// A marker of the named kind where none is allowed, e.g. a port in an arc cell
    UnexpectedMarker(String),
    /// A layer pattern with neither 256 nor 128 cells
    PatternCount(usize),
    /// A second entity of the same name
    DuplicateName(String),
    /// Anything else malformed
    Malformed(String),
}
impl std::fmt::Display for Structural {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ClusterConflict => write!(f, "examples are too close (cluster conflict)"),
            Self::MissingHighlight => write!(f, "missing highlight"),
            Self::AmbiguousCluster => write!(f, "ambiguous cluster: too many highlight markers"),
            Self::UnexpectedMarker(kind) => write!(f, "unexpected {} marker", kind),
            Self::PatternCount(n) => write!(f, "pattern has {} cells, expected 256 or 128", n),
            Self::DuplicateName(name) => write!(f, "duplicate entity name `{}`", name),
            Self::Malformed(msg) => write!(f, "{}", msg),
        }
    }
}

///
/// # Technology Conversion Error Enumeration
///
pub enum TechError {
    /// Malformed cell. Conversion of `cell` is abandoned; a batch continues with the next cell.
    Structural { cell: String, kind: Structural },
    /// Dangling reference from `entity`. The offending rule is skipped.
    Reference { entity: String, message: String },
    /// Unrecognized or unplaceable polygon style. Fatal to the whole conversion.
    Style {
        entity: String,
        style: String,
        message: String,
    },
    /// Errors from the underlying object store
    Store(StoreError),
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl TechError {
    /// Create a [TechError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [TechError::Str] variant
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
    /// Create a [TechError::Structural]
    pub fn structural(cell: impl Into<String>, kind: Structural) -> Self {
        Self::Structural {
            cell: cell.into(),
            kind,
        }
    }
    /// Create a [TechError::Structural] of kind [Structural::Malformed]
    pub fn malformed(cell: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::structural(cell, Structural::Malformed(msg.into()))
    }
    /// Create a [TechError::Reference]
    pub fn reference(entity: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Reference {
            entity: entity.into(),
            message: msg.into(),
        }
    }
    /// Whether this error must abort an entire conversion, rather than a single cell or rule
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Structural { .. } | Self::Reference { .. } => false,
            _ => true,
        }
    }
    /// The [Structural] kind, if we are structural
    pub fn structural_kind(&self) -> Option<&Structural> {
        match self {
            Self::Structural { kind, .. } => Some(kind),
            _ => None,
        }
    }
}
impl std::fmt::Debug for TechError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TechError::Structural { cell, kind } => {
                write!(f, "Structural Error in cell `{}`: {}", cell, kind)
            }
            TechError::Reference { entity, message } => {
                write!(f, "Reference Error in `{}`: {}", entity, message)
            }
            TechError::Style {
                entity,
                style,
                message,
            } => write!(f, "Style Error in `{}`, style `{}`: {}", entity, style, message),
            TechError::Store(err) => err.fmt(f),
            TechError::Boxed(err) => err.fmt(f),
            TechError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for TechError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for TechError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<StoreError> for TechError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
impl From<String> for TechError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for TechError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<utils::ser::Error> for TechError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}

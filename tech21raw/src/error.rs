//!
//! # Object-Store Result and Error Types
//!

// Local Imports
pub use crate::utils::{self, ErrorContext};

/// # [StoreError] Result Type
pub type StoreResult<T> = Result<T, StoreError>;

///
/// # Object-Store Error Enumeration
///
pub enum StoreError {
    /// Reference to a cell or instance which does not exist
    Missing {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Invalid [crate::ChangeList], rejected before any of it was applied
    Commit { index: usize, message: String },
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl StoreError {
    /// Create a [StoreError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create a [StoreError::Missing] for `what`, within `ctx`
    pub fn missing(what: impl Into<String>, ctx: ErrorContext) -> Self {
        Self::Missing {
            message: what.into(),
            stack: vec![ctx],
        }
    }
}
impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StoreError::Missing { message, stack } => {
                write!(f, "Missing: {} \n - {:?}", message, stack)
            }
            StoreError::Commit { index, message } => {
                write!(f, "Commit Rejected at change #{}: {}", index, message)
            }
            StoreError::Boxed(err) => err.fmt(f),
            StoreError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for StoreError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<String> for StoreError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for StoreError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<utils::ser::Error> for StoreError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}

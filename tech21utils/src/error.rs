//!
//! # Tech21 Error-Helper Utilities
//!
//! Per-cell converters implement [`ErrorHelper`] so every failure they raise
//! names the cell (and entity) being converted. [`Unwrapper`] applies the same
//! handling post-fix to [`Option`]s and [`Result`]s.
//!
//! ```rust
//! use tech21utils::{ErrorContext, ErrorHelper, Unwrapper};
//!
//! struct CellReader {
//!     cell: ErrorContext,
//! }
//! impl ErrorHelper for CellReader {
//!     type Error = String;
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("{} (in {})", msg.into(), self.cell)
//!     }
//! }
//! let rdr = CellReader { cell: ErrorContext::Cell("arc-metal-1".into()) };
//! let e: Result<i32, String> = None.unwrapper(&rdr, "no highlight");
//! assert_eq!(e.unwrap_err(), "no highlight (in cell `arc-metal-1`)");
//! ```
//!

///
/// # ErrorHelper
///
/// Implemented by converters carrying state worth reporting on failure,
/// typically the name of the cell or entity in progress.
/// Only `err` is required; the remaining methods build on it.
///
pub trait ErrorHelper {
    type Error;

    /// Create a [Self::Error] from message `msg`
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap `opt`, failing with `msg` if it is [None]
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Assert boolean condition `b`, failing with `msg` if it does not hold
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix [`ErrorHelper`] handling for [`Option`]s and [`Result`]s:
/// `thing.unwrapper(&helper, "message")?`.
/// Not generally implemented for new types.
///
pub trait Unwrapper {
    type Ok;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper;
}
impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        helper.unwrap(self, msg)
    }
}
impl<T, E: std::fmt::Debug> Unwrapper for Result<T, E> {
    type Ok = T;
    /// Note the original error is folded into the message.
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<T, H::Error>
    where
        H: ErrorHelper,
    {
        match self {
            Ok(t) => Ok(t),
            Err(e) => helper.fail(format!("{}: {:?}", msg.into(), e)),
        }
    }
}

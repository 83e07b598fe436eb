//!
//! # Tech21 Raw Object Store
//!
//! The geometric object store beneath technology conversion:
//! [Library]s of [Cell]s, each holding placed [Instance]s of artwork [Prototype]s
//! with free-form attributes.
//!
//! Instances live in one flat arena per [Library], keyed by [InstKey].
//! Queries run through the [ObjectStore] trait,
//! and mutations are collected into [ChangeList]s which [Library::commit] applies as a unit.
//!

// Internal modules & re-exports
pub use tech21utils as utils;

pub mod bbox;
pub use bbox::*;

pub mod changes;
pub use changes::*;

pub mod data;
pub use data::*;

pub mod error;
pub use error::*;

pub mod geom;
pub use geom::*;

pub mod store;
pub use store::*;

pub mod translate;
pub use translate::*;

#[cfg(test)]
mod tests;

/// Integer layout coordinate
pub type Int = isize;

//!
//! # Tech21 Technology Conversion
//!
//! Converts between a structured [Technology] model of an IC fabrication process
//! and its graphical, editable rendition as a [tech21raw::Library] of cells.
//!
//! * [generate] draws each layer, arc and node of a [Technology] into its own cell,
//!   nodes at several sizes so that their parametric rules remain recoverable.
//! * [parse] reads those cells back, clustering each into examples and fitting rules across them.
//! * [edit] and [session] support interactive edits of individual fields,
//!   keeping the model and its drawings in step.
//!

// Internal modules & re-exports
pub use tech21raw as raw;
pub use tech21utils as utils;

pub mod error;
pub use error::*;

pub mod techpoint;
pub use techpoint::*;

pub mod pattern;
pub use pattern::*;

pub mod model;
pub use model::*;

pub mod tags;

pub mod cluster;
pub mod compact;
pub mod labels;
pub mod place;
pub mod sequence;

pub mod prefs;
pub use prefs::Preferences;

pub mod generate;
pub use generate::{generate, generate_into, GenerateReport};

pub mod parse;
pub use parse::{parse_library, ParseReport};

pub mod edit;
pub use edit::{EditRequest, EntityRef, Prompter};

pub mod session;
pub use session::Session;

#[cfg(test)]
mod tests;

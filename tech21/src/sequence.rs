//!
//! # Cross-Library Entity Sequencing
//!
//! Resolves the named entities visible through a chain of dependent libraries
//! into one deterministic order.
//!

// Std-Lib
use std::collections::HashSet;

// Crates.io
use log::warn;

// Local imports
use tech21raw::{CellKey, Library};

/// # Sequenced Entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced {
    /// Name, without its kind prefix
    pub name: String,
    /// Index into the resolver's chain of the library defining us
    pub library: usize,
    pub cell: CellKey,
}

/// # Resolved Sequence
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub entries: Vec<Sequenced>,
    /// Staleness warnings
    pub warnings: Vec<String>,
}
impl Resolved {
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

/// # Sequence Resolver
///
/// Holds a chain of libraries, least-derived first.
#[derive(Debug, Clone)]
pub struct SequenceResolver<'l> {
    chain: Vec<&'l Library>,
}
impl<'l> SequenceResolver<'l> {
    pub fn new(chain: Vec<&'l Library>) -> Self {
        Self { chain }
    }
    /// The most-derived library
    pub fn target(&self) -> Option<&'l Library> {
        self.chain.last().copied()
    }
    pub fn library(&self, index: usize) -> Option<&'l Library> {
        self.chain.get(index).copied()
    }
    /// The explicit order held by the most-derived library's attribute `attr`, if any
    pub fn explicit_order(&self, attr: &str) -> Option<Vec<String>> {
        let list = self.target()?.lib_attr(attr)?.as_list()?;
        Some(list.to_vec())
    }
    /// Resolve every entity whose cell name starts with `prefix`.
    ///
    /// Libraries are scanned most-derived first, cells in name order, and the first
    /// occurrence of each name wins. Entities named in `explicit` come first, in its order,
    /// followed by the rest in discovery order.
    pub fn resolve(&self, prefix: &str, explicit: Option<&[String]>) -> Resolved {
        let mut resolved = Resolved::default();
        for (index, lib) in self.chain.iter().enumerate().rev() {
            for key in lib.cell_keys() {
                let cell = &lib.cells[key];
                let name = match cell.name.strip_prefix(prefix) {
                    Some(n) => n,
                    None => continue,
                };
                match resolved.entries.iter().find(|e| e.name == name) {
                    None => resolved.entries.push(Sequenced {
                        name: name.to_string(),
                        library: index,
                        cell: key,
                    }),
                    Some(kept) => {
                        let kept_lib = self.chain[kept.library];
                        let kept_cell = &kept_lib.cells[kept.cell];
                        if cell.modified > kept_cell.modified {
                            let msg = format!(
                                "`{}` in library `{}` is newer than the `{}` overriding it in `{}`",
                                cell.name, lib.name, kept_cell.name, kept_lib.name
                            );
                            warn!("{}", msg);
                            resolved.warnings.push(msg);
                        }
                    }
                }
            }
        }

        if let Some(explicit) = explicit {
            let mut ordered = Vec::with_capacity(resolved.entries.len());
            let mut placed: HashSet<String> = HashSet::new();
            for name in explicit.iter() {
                if placed.contains(name) {
                    continue;
                }
                if let Some(e) = resolved.entries.iter().find(|e| &e.name == name) {
                    ordered.push(e.clone());
                    placed.insert(name.clone());
                }
            }
            for e in resolved.entries.iter() {
                if !placed.contains(&e.name) {
                    ordered.push(e.clone());
                }
            }
            resolved.entries = ordered;
        }
        resolved
    }
}

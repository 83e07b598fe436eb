//!
//! # Change Lists
//!
//! Conversions never mutate a [Library] incrementally.
//! They record a [ChangeList] of commands, which [Library::commit] checks in full
//! and only then applies. A rejected list leaves the library untouched.
//!

// Std-Lib
use std::collections::{HashMap, HashSet};

// Crates.io
use chrono::{NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

// Local imports
use crate::{
    data::{AttrValue, Attrs, CellKey, Connection, InstKey, Library, Prototype},
    geom::{Point, Shape},
    store::ObjectStore,
    StoreError, StoreResult,
};

/// Identifier of an instance created earlier in the same [ChangeList]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingId(pub usize);

/// Reference to an instance, either pending or already in the [Library]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InstRef {
    Pending(PendingId),
    Existing(InstKey),
}
impl From<PendingId> for InstRef {
    fn from(p: PendingId) -> Self {
        Self::Pending(p)
    }
}
impl From<InstKey> for InstRef {
    fn from(k: InstKey) -> Self {
        Self::Existing(k)
    }
}

/// # Change Commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Change {
    /// Create cell `name`, replacing any existing cell of the same name
    CreateCell { name: String },
    DeleteCell { name: String },
    CreateInstance {
        id: PendingId,
        cell: String,
        proto: Prototype,
        shape: Shape,
        attrs: Attrs,
    },
    /// Zero-width connection between two instances of `cell`
    Connect { cell: String, a: InstRef, b: InstRef },
    SetAttr {
        inst: InstRef,
        key: String,
        value: AttrValue,
    },
    Translate { inst: InstRef, delta: Point },
    SetLibAttr { key: String, value: AttrValue },
}

/// # Change List
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeList {
    changes: Vec<Change>,
    next: usize,
    /// Modification time stamped onto every cell touched. Defaults to the commit time.
    pub stamp: Option<NaiveDateTime>,
}
impl ChangeList {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.changes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
    pub fn create_cell(&mut self, name: impl Into<String>) {
        self.changes.push(Change::CreateCell { name: name.into() });
    }
    pub fn delete_cell(&mut self, name: impl Into<String>) {
        self.changes.push(Change::DeleteCell { name: name.into() });
    }
    /// Add an instance creation, returning its [PendingId]
    pub fn create_instance(
        &mut self,
        cell: impl Into<String>,
        proto: Prototype,
        shape: Shape,
        attrs: Attrs,
    ) -> PendingId {
        let id = PendingId(self.next);
        self.next += 1;
        self.changes.push(Change::CreateInstance {
            id,
            cell: cell.into(),
            proto,
            shape,
            attrs,
        });
        id
    }
    pub fn connect(&mut self, cell: impl Into<String>, a: impl Into<InstRef>, b: impl Into<InstRef>) {
        self.changes.push(Change::Connect {
            cell: cell.into(),
            a: a.into(),
            b: b.into(),
        });
    }
    pub fn set_attr(&mut self, inst: impl Into<InstRef>, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.changes.push(Change::SetAttr {
            inst: inst.into(),
            key: key.into(),
            value: value.into(),
        });
    }
    pub fn translate(&mut self, inst: impl Into<InstRef>, delta: Point) {
        self.changes.push(Change::Translate {
            inst: inst.into(),
            delta,
        });
    }
    pub fn set_lib_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.changes.push(Change::SetLibAttr {
            key: key.into(),
            value: value.into(),
        });
    }
    /// Append all of `other`, renumbering its pending ids after ours
    pub fn append(&mut self, other: ChangeList) {
        let offset = self.next;
        let shift = |r: InstRef| match r {
            InstRef::Pending(PendingId(i)) => InstRef::Pending(PendingId(i + offset)),
            e => e,
        };
        for change in other.changes {
            let change = match change {
                Change::CreateInstance {
                    id,
                    cell,
                    proto,
                    shape,
                    attrs,
                } => Change::CreateInstance {
                    id: PendingId(id.0 + offset),
                    cell,
                    proto,
                    shape,
                    attrs,
                },
                Change::Connect { cell, a, b } => Change::Connect {
                    cell,
                    a: shift(a),
                    b: shift(b),
                },
                Change::SetAttr { inst, key, value } => Change::SetAttr {
                    inst: shift(inst),
                    key,
                    value,
                },
                Change::Translate { inst, delta } => Change::Translate {
                    inst: shift(inst),
                    delta,
                },
                other => other,
            };
            self.changes.push(change);
        }
        self.next += other.next;
    }
}

/// Result of a successful [Library::commit]
#[derive(Debug, Default)]
pub struct Committed {
    ids: HashMap<PendingId, InstKey>,
    /// Cells created or modified, by name
    pub cells: Vec<String>,
}
impl Committed {
    /// Get the [InstKey] assigned to pending instance `id`
    pub fn key(&self, id: PendingId) -> Option<InstKey> {
        self.ids.get(&id).copied()
    }
}

impl Library {
    /// Check `changes` against our current contents, then apply them all.
    /// Fails without modifying anything if any command is invalid.
    pub fn commit(&mut self, changes: ChangeList) -> StoreResult<Committed> {
        self.check(&changes)?;
        let stamp = changes.stamp.unwrap_or_else(|| Utc::now().naive_utc());
        let mut done = Committed::default();
        for change in changes.changes {
            match change {
                Change::CreateCell { name } => {
                    if let Some(old) = self.cell_key(&name) {
                        self.remove_cell(old);
                    }
                    self.add_cell(&name, stamp);
                    done.cells.push(name);
                }
                Change::DeleteCell { name } => {
                    if let Some(old) = self.cell_key(&name) {
                        self.remove_cell(old);
                    }
                }
                Change::CreateInstance {
                    id,
                    cell,
                    proto,
                    shape,
                    attrs,
                } => {
                    let ckey = self.committed_cell(&cell, stamp, &mut done)?;
                    let key = self.create_instance(ckey, proto, shape)?;
                    self.insts[key].attrs = attrs;
                    done.ids.insert(id, key);
                }
                Change::Connect { cell, a, b } => {
                    let ckey = self.committed_cell(&cell, stamp, &mut done)?;
                    let (a, b) = (resolve(&done, a)?, resolve(&done, b)?);
                    self.cells[ckey].connections.push(Connection { a, b, width: 0 });
                }
                Change::SetAttr { inst, key, value } => {
                    let inst = resolve(&done, inst)?;
                    self.set_attr(inst, &key, value)?;
                    self.stamp_owner(inst, stamp, &mut done);
                }
                Change::Translate { inst, delta } => {
                    let inst = resolve(&done, inst)?;
                    ObjectStore::translate(self, inst, delta)?;
                    self.stamp_owner(inst, stamp, &mut done);
                }
                Change::SetLibAttr { key, value } => {
                    self.attrs.insert(key, value);
                }
            }
        }
        debug!("Committed changes to {} cells of `{}`", done.cells.len(), self.name);
        Ok(done)
    }
    /// Validate every command of `changes`, simulating cell creation and deletion
    fn check(&self, changes: &ChangeList) -> StoreResult<()> {
        let mut cells: HashSet<String> = self.cells.values().map(|c| c.name.clone()).collect();
        let mut deleted: HashSet<CellKey> = HashSet::new();
        let mut pending: HashMap<PendingId, String> = HashMap::new();
        for (index, change) in changes.changes.iter().enumerate() {
            let reject = |message: String| Err(StoreError::Commit { index, message });
            // Cell owning `r`, if it (still) exists
            let owner = |r: &InstRef, deleted: &HashSet<CellKey>, pending: &HashMap<PendingId, String>| match r {
                InstRef::Pending(p) => pending.get(p).cloned(),
                InstRef::Existing(k) => self
                    .insts
                    .get(*k)
                    .filter(|i| !deleted.contains(&i.cell))
                    .map(|i| self.cells[i.cell].name.clone()),
            };
            match change {
                Change::CreateCell { name } | Change::DeleteCell { name } => {
                    if let Some(k) = self.cell_key(name) {
                        deleted.insert(k);
                    }
                    pending.retain(|_, c| c != name);
                    if let Change::CreateCell { .. } = change {
                        cells.insert(name.clone());
                    } else {
                        cells.remove(name);
                    }
                }
                Change::CreateInstance { id, cell, .. } => {
                    if !cells.contains(cell) {
                        return reject(format!("no cell `{}`", cell));
                    }
                    if pending.insert(*id, cell.clone()).is_some() {
                        return reject(format!("duplicate pending id {:?}", id));
                    }
                }
                Change::Connect { cell, a, b } => {
                    for r in [a, b] {
                        match owner(r, &deleted, &pending) {
                            Some(c) if &c == cell => (),
                            Some(c) => return reject(format!("{:?} belongs to `{}`, not `{}`", r, c, cell)),
                            None => return reject(format!("unknown instance {:?}", r)),
                        }
                    }
                }
                Change::SetAttr { inst, .. } | Change::Translate { inst, .. } => {
                    if owner(inst, &deleted, &pending).is_none() {
                        return reject(format!("unknown instance {:?}", inst));
                    }
                }
                Change::SetLibAttr { .. } => (),
            }
        }
        Ok(())
    }
    /// Key of cell `name`, recording it as modified
    fn committed_cell(&mut self, name: &str, stamp: NaiveDateTime, done: &mut Committed) -> StoreResult<CellKey> {
        let key = self
            .cell_key(name)
            .ok_or_else(|| StoreError::msg(format!("no cell `{}`", name)))?;
        self.cells[key].modified = stamp;
        if !done.cells.iter().any(|c| c == name) {
            done.cells.push(name.to_string());
        }
        Ok(key)
    }
    fn stamp_owner(&mut self, inst: InstKey, stamp: NaiveDateTime, done: &mut Committed) {
        if let Some(cell) = self.insts.get(inst).map(|i| i.cell) {
            let c = &mut self.cells[cell];
            c.modified = stamp;
            if !done.cells.iter().any(|n| n == &c.name) {
                done.cells.push(c.name.clone());
            }
        }
    }
}

fn resolve(done: &Committed, r: InstRef) -> StoreResult<InstKey> {
    match r {
        InstRef::Existing(k) => Ok(k),
        InstRef::Pending(p) => done
            .key(p)
            .ok_or_else(|| StoreError::msg(format!("unresolved pending instance {:?}", p))),
    }
}

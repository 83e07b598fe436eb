//!
//! # Raw Object-Store Data Model
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

// Local imports
use crate::{
    bbox::{BoundBox, BoundBoxTrait},
    geom::Shape,
    utils::SerdeFile,
    ErrorContext, Int, StoreError, StoreResult,
};

// Create key-types for each internal type stored in [SlotMap]s
new_key_type! {
    /// Keys for [Cell] entries
    pub struct CellKey;
    /// Keys for [Instance] entries
    pub struct InstKey;
}

/// # Artwork Prototypes
///
/// The primitive kinds every placed [Instance] is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Prototype {
    FilledBox,
    FilledPolygon,
    /// Outlined box
    Box,
    ClosedPolygon,
    CrossedBox,
    OpenedPolygon,
    OpenedDottedPolygon,
    OpenedDashedPolygon,
    OpenedThickerPolygon,
    /// Disjoint line segments, one per consecutive pair of vertices
    Vectors,
    Circle,
    ThickCircle,
    FilledCircle,
    /// Circular arcs. Start and extent angles are attributes.
    CircleArc,
    ThickCircleArc,
    /// Invisible pin, carrying text
    InvisiblePin,
    PortMarker,
    GrabPoint,
    Highlight,
}

/// # Attribute Values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrList(Vec<String>),
}
impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
    /// Floating-point value, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(l) => Some(l),
            _ => None,
        }
    }
}
impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}
impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}
impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}
impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
impl From<Vec<String>> for AttrValue {
    fn from(l: Vec<String>) -> Self {
        Self::StrList(l)
    }
}

/// Attribute map, ordered by key so that serialized output is stable
pub type Attrs = BTreeMap<String, AttrValue>;

/// # Placed Instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    /// Parent cell
    pub cell: CellKey,
    pub proto: Prototype,
    pub shape: Shape,
    pub attrs: Attrs,
}
impl Instance {
    pub fn bbox(&self) -> BoundBox {
        self.shape.bbox()
    }
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }
}

/// # Connection
///
/// Zero-width link between two port-marker [Instance]s of the same cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub a: InstKey,
    pub b: InstKey,
    pub width: Int,
}

/// # Cell
///
/// Named container of [Instance]s, in placement order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub name: String,
    /// Last-modification time
    pub modified: NaiveDateTime,
    pub insts: Vec<InstKey>,
    pub connections: Vec<Connection>,
}
impl Cell {
    pub fn new(name: impl Into<String>, modified: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            modified,
            insts: Vec::new(),
            connections: Vec::new(),
        }
    }
}

/// # Library
///
/// Owns the [Cell] and [Instance] arenas, plus library-level attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub cells: SlotMap<CellKey, Cell>,
    pub insts: SlotMap<InstKey, Instance>,
    pub attrs: Attrs,
}
impl Library {
    /// Create a new and empty [Library]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Find a cell by name
    pub fn cell_key(&self, name: &str) -> Option<CellKey> {
        self.cells
            .iter()
            .find(|(_, c)| c.name == name)
            .map(|(k, _)| k)
    }
    /// Get the [Cell] at `key`
    pub fn cell(&self, key: CellKey) -> StoreResult<&Cell> {
        self.cells
            .get(key)
            .ok_or_else(|| StoreError::missing("cell key", ErrorContext::Library(self.name.clone())))
    }
    /// Get the [Cell] named `name`
    pub fn cell_named(&self, name: &str) -> StoreResult<&Cell> {
        self.cells
            .values()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::Missing {
                message: "no such cell".into(),
                stack: vec![ErrorContext::Library(self.name.clone()), ErrorContext::Cell(name.into())],
            })
    }
    /// Get the [Instance] at `key`
    pub fn inst(&self, key: InstKey) -> StoreResult<&Instance> {
        self.insts
            .get(key)
            .ok_or_else(|| StoreError::missing("instance key", ErrorContext::Library(self.name.clone())))
    }
    /// Cell keys, sorted by cell name
    pub fn cell_keys(&self) -> Vec<CellKey> {
        let mut keys: Vec<CellKey> = self.cells.keys().collect();
        keys.sort_by(|a, b| self.cells[*a].name.cmp(&self.cells[*b].name));
        keys
    }
    /// Iterate over the instances of `cell`, in placement order
    pub fn instances(&self, cell: CellKey) -> StoreResult<impl Iterator<Item = (InstKey, &Instance)> + '_> {
        let c = self.cell(cell)?;
        Ok(c.insts
            .iter()
            .filter_map(move |k| self.insts.get(*k).map(|i| (*k, i))))
    }
    /// Add a new, empty cell. No check is made for name collisions; see [crate::ChangeList].
    pub(crate) fn add_cell(&mut self, name: &str, modified: NaiveDateTime) -> CellKey {
        self.cells.insert(Cell::new(name, modified))
    }
    /// Remove cell `key` and all of its instances
    pub(crate) fn remove_cell(&mut self, key: CellKey) -> Option<Cell> {
        let cell = self.cells.remove(key)?;
        for k in cell.insts.iter() {
            self.insts.remove(*k);
        }
        Some(cell)
    }
    /// Set the modification time of cell `key`
    pub fn touch(&mut self, key: CellKey, modified: NaiveDateTime) -> StoreResult<()> {
        let name = self.name.clone();
        match self.cells.get_mut(key) {
            Some(c) => {
                c.modified = modified;
                Ok(())
            }
            None => Err(StoreError::missing("cell key", ErrorContext::Library(name))),
        }
    }
    /// Get library-level attribute `key`
    pub fn lib_attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }
}
impl SerdeFile for Library {}

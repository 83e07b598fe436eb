//!
//! # Object-Store Interface
//!
//! The narrow interface conversion code consumes:
//! instance creation, bounds queries, attribute reads and writes, and region queries.
//! [Library] is the in-memory implementation.
//!

// Local imports
use crate::{
    bbox::{BoundBox, BoundBoxTrait},
    data::{AttrValue, CellKey, InstKey, Instance, Library, Prototype},
    geom::{Point, Shape},
    translate::Translate,
    ErrorContext, StoreError, StoreResult,
};

/// # Object Store
pub trait ObjectStore {
    /// Place a new instance of `proto` with geometry `shape` into `cell`
    fn create_instance(&mut self, cell: CellKey, proto: Prototype, shape: Shape) -> StoreResult<InstKey>;
    /// Bounding box of instance `inst`
    fn bounds(&self, inst: InstKey) -> StoreResult<BoundBox>;
    /// Read attribute `key` of `inst`
    fn get_attr(&self, inst: InstKey, key: &str) -> StoreResult<Option<&AttrValue>>;
    /// Write attribute `key` of `inst`
    fn set_attr(&mut self, inst: InstKey, key: &str, value: AttrValue) -> StoreResult<()>;
    /// All instances of `cell`, in placement order
    fn cell_instances(&self, cell: CellKey) -> StoreResult<Vec<InstKey>>;
    /// Instances of `cell` whose bounds intersect `region`, edges inclusive, in placement order
    fn query_in_region(&self, cell: CellKey, region: &BoundBox) -> StoreResult<Vec<InstKey>>;
    /// Rigidly move `inst` by `delta`
    fn translate(&mut self, inst: InstKey, delta: Point) -> StoreResult<()>;
}

impl Library {
    fn inst_mut(&mut self, inst: InstKey) -> StoreResult<&mut Instance> {
        let lib = self.name.clone();
        self.insts
            .get_mut(inst)
            .ok_or_else(|| StoreError::missing("instance key", ErrorContext::Library(lib)))
    }
}

impl ObjectStore for Library {
    fn create_instance(&mut self, cell: CellKey, proto: Prototype, shape: Shape) -> StoreResult<InstKey> {
        if !self.cells.contains_key(cell) {
            return Err(StoreError::missing("cell key", ErrorContext::Library(self.name.clone())));
        }
        let key = self.insts.insert(Instance {
            cell,
            proto,
            shape,
            attrs: Default::default(),
        });
        self.cells[cell].insts.push(key);
        Ok(key)
    }
    fn bounds(&self, inst: InstKey) -> StoreResult<BoundBox> {
        Ok(self.inst(inst)?.shape.bbox())
    }
    fn get_attr(&self, inst: InstKey, key: &str) -> StoreResult<Option<&AttrValue>> {
        Ok(self.inst(inst)?.attrs.get(key))
    }
    fn set_attr(&mut self, inst: InstKey, key: &str, value: AttrValue) -> StoreResult<()> {
        self.inst_mut(inst)?.attrs.insert(key.to_string(), value);
        Ok(())
    }
    fn cell_instances(&self, cell: CellKey) -> StoreResult<Vec<InstKey>> {
        Ok(self.cell(cell)?.insts.clone())
    }
    fn query_in_region(&self, cell: CellKey, region: &BoundBox) -> StoreResult<Vec<InstKey>> {
        Ok(self
            .instances(cell)?
            .filter(|(_, i)| i.bbox().intersects(region))
            .map(|(k, _)| k)
            .collect())
    }
    fn translate(&mut self, inst: InstKey, delta: Point) -> StoreResult<()> {
        self.inst_mut(inst)?.shape.translate(delta);
        Ok(())
    }
}

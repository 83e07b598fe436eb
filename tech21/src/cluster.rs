//!
//! # Geometry Clustering
//!
//! Groups the role-tagged instances of one cell into disjoint spatial [Example]s.
//! Each example grows from a seed instance by repeated region queries
//! against its accumulated bounding box, until no further instance is found.
//!

// Std-Lib
use std::collections::HashMap;

// Local imports
use crate::tags::{self, Role};
use crate::{Structural, TechError, TechResult};
use tech21raw::utils::{EnumStr, ErrorHelper};
use tech21raw::{BoundBox, BoundBoxTrait, CellKey, InstKey, ObjectStore};

/// # Sample Role
///
/// The [Role]s which participate in clustering, with their payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleRole {
    LayerPatch(String),
    Port,
    GrabPoint,
    Highlight,
}

/// # Sample
///
/// One placed instance within an [Example].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub inst: InstKey,
    pub role: SampleRole,
    pub bbox: BoundBox,
    /// Position in the cell's placement order
    pub order: usize,
}

/// # Example
///
/// One spatial cluster of placed geometry, holding exactly one highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Accumulated bounds, excluding any grab point
    pub bbox: BoundBox,
    /// Samples in placement order
    pub samples: Vec<Sample>,
}
impl Example {
    /// Our highlight [Sample]. Examples produced by [cluster] always have one.
    pub fn highlight(&self) -> Option<&Sample> {
        self.samples.iter().find(|s| s.role == SampleRole::Highlight)
    }
    /// Layer patches, in placement order, with their layer names
    pub fn patches(&self) -> impl Iterator<Item = (&Sample, &str)> {
        self.samples.iter().filter_map(|s| match &s.role {
            SampleRole::LayerPatch(layer) => Some((s, layer.as_str())),
            _ => None,
        })
    }
    pub fn ports(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.role == SampleRole::Port)
    }
    pub fn area(&self) -> i128 {
        self.bbox.area()
    }
}

/// # Clusterer
///
/// Clustering state for one cell.
struct Clusterer<'s, S: ObjectStore> {
    store: &'s S,
    cell: CellKey,
    cell_name: String,
    expect_ports: bool,
}
impl<S: ObjectStore> ErrorHelper for Clusterer<'_, S> {
    type Error = TechError;
    fn err(&self, msg: impl Into<String>) -> TechError {
        TechError::malformed(&self.cell_name, msg)
    }
}
impl<'s, S: ObjectStore> Clusterer<'s, S> {
    fn structural(&self, kind: Structural) -> TechError {
        TechError::structural(&self.cell_name, kind)
    }
    /// Classify `inst` by its role attribute. Instances without a clustering role yield `None`.
    fn role(&self, inst: InstKey) -> TechResult<Option<SampleRole>> {
        let role = match self.store.get_attr(inst, tags::ROLE)?.and_then(|v| v.as_str()) {
            Some(r) => r,
            None => return Ok(None),
        };
        let role = match Role::from_str(role) {
            Some(Role::LayerPatch) => {
                let layer = self.store.get_attr(inst, tags::LAYER)?.and_then(|v| v.as_str());
                let layer = self.unwrap(layer, "layer patch without a layer")?;
                SampleRole::LayerPatch(layer.to_string())
            }
            Some(Role::Port) => SampleRole::Port,
            Some(Role::GrabPoint) => SampleRole::GrabPoint,
            Some(Role::Highlight) => SampleRole::Highlight,
            _ => return Ok(None),
        };
        if !self.expect_ports && (role == SampleRole::Port || role == SampleRole::GrabPoint) {
            let kind = match role {
                SampleRole::Port => Role::Port,
                _ => Role::GrabPoint,
            };
            return Err(self.structural(Structural::UnexpectedMarker(kind.to_str().into())));
        }
        Ok(Some(role))
    }
    fn run(&self) -> TechResult<Vec<Example>> {
        // Collect all role-bearing instances, in placement order
        let mut samples: HashMap<InstKey, Sample> = HashMap::new();
        let mut order: Vec<InstKey> = Vec::new();
        for (index, inst) in self.store.cell_instances(self.cell)?.into_iter().enumerate() {
            if let Some(role) = self.role(inst)? {
                let bbox = self.store.bounds(inst)?;
                samples.insert(
                    inst,
                    Sample {
                        inst,
                        role,
                        bbox,
                        order: index,
                    },
                );
                order.push(inst);
            }
        }

        // Instance to owning-example map
        let mut owner: HashMap<InstKey, usize> = HashMap::new();
        let mut examples: Vec<Example> = Vec::new();
        for seed in order.iter() {
            if owner.contains_key(seed) {
                continue;
            }
            let idx = examples.len();
            owner.insert(*seed, idx);
            let first = &samples[seed];
            let mut members = vec![first.clone()];
            // Bounds exclude grab points. Until some other sample lands, search around the seed.
            let mut bbox = match first.role {
                SampleRole::GrabPoint => BoundBox::empty(),
                _ => first.bbox,
            };
            loop {
                let mut added = false;
                let region = match bbox.is_empty() {
                    true => first.bbox,
                    false => bbox,
                };
                for hit in self.store.query_in_region(self.cell, &region)?.into_iter() {
                    let sample = match samples.get(&hit) {
                        Some(s) => s,
                        None => continue, // No clustering role
                    };
                    match owner.get(&hit) {
                        Some(o) if *o == idx => continue,
                        Some(_) => return Err(self.structural(Structural::ClusterConflict)),
                        None => (),
                    }
                    owner.insert(hit, idx);
                    if sample.role != SampleRole::GrabPoint {
                        bbox = bbox.union(&sample.bbox);
                    }
                    members.push(sample.clone());
                    added = true;
                }
                if !added {
                    break;
                }
            }
            members.sort_by_key(|s| s.order);
            examples.push(Example { bbox, samples: members });
        }

        for ex in examples.iter() {
            match ex.samples.iter().filter(|s| s.role == SampleRole::Highlight).count() {
                0 => return Err(self.structural(Structural::MissingHighlight)),
                1 => (),
                _ => return Err(self.structural(Structural::AmbiguousCluster)),
            }
        }
        choose_canonical(&mut examples);
        Ok(examples)
    }
}

/// Cluster the instances of `cell` into [Example]s, canonical example first.
/// Port markers and grab points are an error unless `expect_ports` is set.
pub fn cluster<S: ObjectStore>(store: &S, cell: CellKey, cell_name: &str, expect_ports: bool) -> TechResult<Vec<Example>> {
    Clusterer {
        store,
        cell,
        cell_name: cell_name.to_string(),
        expect_ports,
    }
    .run()
}

/// Move the canonical example to the front of `examples`.
///
/// The canonical example has the smallest area. Among equal areas, a candidate
/// replaces the current best unless it lies both no further left and no higher.
pub fn choose_canonical(examples: &mut Vec<Example>) {
    if examples.is_empty() {
        return;
    }
    let mut best = 0;
    for (i, ex) in examples.iter().enumerate().skip(1) {
        let (area, best_area) = (ex.area(), examples[best].area());
        let (cx, cy) = ex.bbox.center();
        let (bx, by) = examples[best].bbox.center();
        if area < best_area || (area == best_area && !(cx >= bx && cy <= by)) {
            best = i;
        }
    }
    let canonical = examples.remove(best);
    examples.insert(0, canonical);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_built_examples() {
        let mut ex = Example {
            bbox: BoundBox::empty(),
            samples: Vec::new(),
        };
        assert!(ex.highlight().is_none());
        assert_eq!(ex.area(), 0);
        choose_canonical(&mut Vec::new());

        let bbox = BoundBox::from_points(Default::default(), tech21raw::Point::new(4, 4));
        ex.samples.push(Sample {
            inst: InstKey::default(),
            role: SampleRole::GrabPoint,
            bbox,
            order: 0,
        });
        assert!(ex.highlight().is_none());
    }
}

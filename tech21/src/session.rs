//!
//! # Editing Session
//!
//! The state threaded through interactive editing:
//! the technology, the library drawing it and its dependencies,
//! the layer-pattern clipboard, and rendering preferences.
//!

// Crates.io
use log::{debug, info};

// Local imports
use crate::compact;
use crate::edit::{self, EntityRef, Prompter};
use crate::generate::{generate_into, GenerateReport};
use crate::model::Technology;
use crate::parse::{parse_library, ParseReport};
use crate::pattern::{grid_positions, LayerPattern, PATTERN_SIZE};
use crate::prefs::Preferences;
use crate::tags::{self, Role};
use crate::{Structural, TechError, TechResult};
use tech21raw::utils::EnumStr;
use tech21raw::{AttrValue, BoundBox, ChangeList, Committed, InstKey, Library};

/// # Session
#[derive(Debug, Clone)]
pub struct Session {
    pub technology: Technology,
    /// The library being edited
    pub library: Library,
    /// Libraries beneath `library`, least-derived first
    pub dependencies: Vec<Library>,
    /// Copied layer pattern
    pub clipboard: Option<LayerPattern>,
    pub preferences: Preferences,
}
impl Session {
    /// Create a session by generating `technology` into a new library
    pub fn from_technology(technology: Technology, preferences: Preferences) -> TechResult<(Self, GenerateReport)> {
        let mut library = Library::new(&technology.general.name);
        let report = generate_into(&technology, &preferences, &mut library, &[], |_| true)?;
        let session = Self {
            technology,
            library,
            dependencies: Vec::new(),
            clipboard: None,
            preferences,
        };
        Ok((session, report))
    }
    /// Create a session by parsing `library` atop `dependencies`
    pub fn from_library(
        library: Library,
        dependencies: Vec<Library>,
        preferences: Preferences,
    ) -> TechResult<(Self, ParseReport)> {
        let chain: Vec<&Library> = dependencies.iter().chain(std::iter::once(&library)).collect();
        let (technology, report) = parse_library(&chain)?;
        let session = Self {
            technology,
            library,
            dependencies,
            clipboard: None,
            preferences,
        };
        Ok((session, report))
    }
    /// Our library chain, least-derived first
    pub fn chain(&self) -> Vec<&Library> {
        self.dependencies.iter().chain(std::iter::once(&self.library)).collect()
    }
    /// Re-read the technology from the library chain
    pub fn reparse(&mut self) -> TechResult<ParseReport> {
        let (technology, report) = parse_library(&self.chain())?;
        self.technology = technology;
        Ok(report)
    }
    /// Regenerate every cell of the technology into our library.
    /// See [generate_into] for the role of `checkpoint`.
    pub fn regenerate<F: FnMut(&str) -> bool>(&mut self, checkpoint: F) -> TechResult<GenerateReport> {
        generate_into(
            &self.technology,
            &self.preferences,
            &mut self.library,
            &self.dependencies,
            checkpoint,
        )
    }
    /// Commit `changes` to our library
    pub fn commit(&mut self, changes: ChangeList) -> TechResult<Committed> {
        Ok(self.library.commit(changes)?)
    }
    /// Edit `field` of `entity` with a value from `prompter`.
    /// Updates the technology, and returns the library changes to commit; `None` if cancelled.
    pub fn edit<P: Prompter>(
        &mut self,
        entity: &EntityRef,
        field: &str,
        prompter: &mut P,
    ) -> TechResult<Option<ChangeList>> {
        edit::edit(
            &mut self.technology,
            &self.library,
            &self.preferences,
            entity,
            field,
            prompter,
        )
    }
    /// Changes compacting the examples of node cell `cell`
    pub fn compact_cell(&self, cell: &str) -> TechResult<ChangeList> {
        compact::compact_cell(&self.library, cell)
    }

    /// Pattern-grid instances of layer `layer`'s cell, with their bounds and states
    fn pattern_grid(&self, layer: &str) -> TechResult<(Vec<InstKey>, Vec<(BoundBox, bool)>)> {
        let name = format!("{}{}", tags::LAYER_PREFIX, layer);
        let key = self
            .library
            .cell_key(&name)
            .ok_or_else(|| TechError::msg(format!("no cell `{}`", name)))?;
        let mut keys = Vec::new();
        let mut cells = Vec::new();
        for (k, inst) in self.library.instances(key)? {
            if inst.attr(tags::ROLE).and_then(AttrValue::as_str) == Some(Role::Pattern.to_str()) {
                keys.push(k);
                cells.push((
                    inst.bbox(),
                    inst.attr(tags::PATTERN_ON).and_then(AttrValue::as_bool).unwrap_or(false),
                ));
            }
        }
        if cells.len() != PATTERN_SIZE * PATTERN_SIZE && cells.len() != PATTERN_SIZE * PATTERN_SIZE / 2 {
            return Err(TechError::structural(name, Structural::PatternCount(cells.len())));
        }
        Ok((keys, cells))
    }
    /// The pattern currently drawn in layer `layer`'s cell
    pub fn drawn_pattern(&self, layer: &str) -> TechResult<LayerPattern> {
        let (_, cells) = self.pattern_grid(layer)?;
        LayerPattern::from_cells(&cells).ok_or_else(|| TechError::malformed(layer, "pattern cells are not a regular grid"))
    }
    /// Replace layer `layer`'s pattern by the result of `op` on the drawn one.
    /// Updates the technology, and returns the changes to the pattern cells which differ.
    fn update_pattern<F: FnOnce(&mut LayerPattern)>(&mut self, layer: &str, op: F) -> TechResult<ChangeList> {
        let (keys, cells) = self.pattern_grid(layer)?;
        let boxes: Vec<BoundBox> = cells.iter().map(|c| c.0).collect();
        let positions = grid_positions(&boxes)
            .ok_or_else(|| TechError::malformed(layer, "pattern cells are not a regular grid"))?;
        let mut pattern = self.drawn_pattern(layer)?;
        op(&mut pattern);

        let mut changes = ChangeList::new();
        for ((key, (x, y)), (_, on)) in keys.into_iter().zip(positions).zip(cells) {
            let want = pattern.get(x, y);
            if want != on {
                changes.set_attr(key, tags::PATTERN_ON, want);
            }
        }
        match self.technology.layer_mut(layer) {
            Some(l) => l.pattern = pattern,
            None => debug!("Pattern of `{}` edited without a technology layer", layer),
        }
        info!("Pattern of layer `{}`: {} cells change", layer, changes.len());
        Ok(changes)
    }
    /// Switch every cell of `layer`'s pattern off
    pub fn clear_pattern(&mut self, layer: &str) -> TechResult<ChangeList> {
        self.update_pattern(layer, |p| p.clear())
    }
    pub fn invert_pattern(&mut self, layer: &str) -> TechResult<ChangeList> {
        self.update_pattern(layer, |p| p.invert())
    }
    /// Toggle cell (`x`, `y`) of `layer`'s pattern
    pub fn toggle_pattern(&mut self, layer: &str, x: usize, y: usize) -> TechResult<ChangeList> {
        if x >= PATTERN_SIZE || y >= PATTERN_SIZE {
            return TechError::fail(format!("pattern cell ({}, {}) out of range", x, y));
        }
        self.update_pattern(layer, |p| p.toggle(x, y))
    }
    /// Copy `layer`'s drawn pattern to the clipboard
    pub fn copy_pattern(&mut self, layer: &str) -> TechResult<()> {
        self.clipboard = Some(self.drawn_pattern(layer)?);
        Ok(())
    }
    /// Paste the clipboard into `layer`'s pattern
    pub fn paste_pattern(&mut self, layer: &str) -> TechResult<ChangeList> {
        let copied = match self.clipboard {
            Some(p) => p,
            None => return TechError::fail("nothing to paste: the pattern clipboard is empty"),
        };
        self.update_pattern(layer, |p| *p = copied)
    }
}

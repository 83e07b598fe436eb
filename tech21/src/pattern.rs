//!
//! # Layer Stipple Patterns
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use tech21raw::{BoundBox, BoundBoxTrait, Int};

/// Pattern edge length, in cells
pub const PATTERN_SIZE: usize = 16;

/// # Layer Pattern
///
/// Sixteen rows of sixteen cells. Cell (x, y) is bit `15 - x` of row `y`,
/// and row zero is the top.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct LayerPattern {
    pub rows: [u16; PATTERN_SIZE],
}
impl LayerPattern {
    /// Create from row bitmasks. Sixteen rows are taken as-is.
    /// Eight rows are a legacy half-height pattern, repeated into rows 8 through 15.
    /// Any other count is rejected.
    pub fn from_rows(rows: &[u16]) -> Option<Self> {
        let mut pat = Self::default();
        match rows.len() {
            16 => pat.rows.copy_from_slice(rows),
            8 => {
                pat.rows[..8].copy_from_slice(rows);
                pat.rows[8..].copy_from_slice(rows);
            }
            _ => return None,
        }
        Some(pat)
    }
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.rows[y] & (1 << (15 - x)) != 0
    }
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        match on {
            true => self.rows[y] |= 1 << (15 - x),
            false => self.rows[y] &= !(1 << (15 - x)),
        }
    }
    pub fn toggle(&mut self, x: usize, y: usize) {
        self.rows[y] ^= 1 << (15 - x);
    }
    pub fn clear(&mut self) {
        self.rows = [0; PATTERN_SIZE];
    }
    pub fn invert(&mut self) {
        for row in self.rows.iter_mut() {
            *row = !*row;
        }
    }
    /// Number of cells switched on
    pub fn count(&self) -> u32 {
        self.rows.iter().map(|r| r.count_ones()).sum()
    }
    /// Rebuild from the grid cells of a layer cell, each a bounding box and on/off flag.
    /// Takes 256 cells, or 128 in the legacy half-height layout. See [grid_positions].
    pub fn from_cells(cells: &[(BoundBox, bool)]) -> Option<Self> {
        let boxes: Vec<BoundBox> = cells.iter().map(|c| c.0).collect();
        let mut rows = vec![0u16; cells.len() / PATTERN_SIZE];
        for ((x, y), (_, on)) in grid_positions(&boxes)?.into_iter().zip(cells.iter()) {
            if *on {
                rows[y] |= 1 << (PATTERN_SIZE - 1 - x);
            }
        }
        Self::from_rows(&rows)
    }
}

/// # Pattern-Grid Positions
///
/// Locate each of `cells`, the bounding boxes of a layer cell's pattern-grid instances,
/// as a (column, row) pair. The grid is sixteen columns wide and `cells.len() / 16` rows tall,
/// row zero at the top.
/// Returns `None` unless there are a whole number of rows, each of equal-pitch cells.
pub fn grid_positions(cells: &[BoundBox]) -> Option<Vec<(usize, usize)>> {
    if cells.is_empty() || cells.len() % PATTERN_SIZE != 0 {
        return None;
    }
    let nrows = (cells.len() / PATTERN_SIZE) as Int;
    let mut bbox = BoundBox::empty();
    for c in cells.iter() {
        bbox = c.union(&bbox);
    }
    let (pitch_x, pitch_y) = (bbox.width() / PATTERN_SIZE as Int, bbox.height() / nrows);
    if pitch_x <= 0 || pitch_y <= 0 {
        return None;
    }
    cells
        .iter()
        .map(|c| {
            let x = (c.p0.x - bbox.p0.x) / pitch_x;
            let y = (bbox.p1.y - c.p1.y) / pitch_y;
            match x < PATTERN_SIZE as Int && y < nrows {
                true => Some((x as usize, y as usize)),
                false => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tech21raw::Point;

    #[test]
    fn bits() {
        let mut p = LayerPattern::default();
        p.set(0, 0, true);
        p.set(15, 3, true);
        assert_eq!(p.rows[0], 0x8000);
        assert_eq!(p.rows[3], 0x0001);
        assert!(p.get(15, 3) && !p.get(14, 3));
        p.toggle(15, 3);
        assert!(!p.get(15, 3));
        p.invert();
        assert_eq!(p.count(), 255);
        p.clear();
        assert_eq!(p, LayerPattern::default());
    }
    #[test]
    fn half_height_patterns_repeat() {
        let rows: Vec<u16> = (0..8).map(|i| 0x1111 << i).collect();
        let p = LayerPattern::from_rows(&rows).unwrap();
        for y in 0..8 {
            assert_eq!(p.rows[y + 8], p.rows[y]);
            for x in 0..16 {
                assert_eq!(p.get(x, y + 8), p.get(x, y));
            }
        }
        assert!(LayerPattern::from_rows(&rows[..7]).is_none());
    }
    #[test]
    fn locates_grid_cells() {
        // An 8-row grid at pitch 2, row zero at the top
        let cells: Vec<BoundBox> = (0..128)
            .map(|i| {
                let (x, y) = ((i % 16) as Int, (i / 16) as Int);
                BoundBox::from_points(Point::new(2 * x, -2 * y - 2), Point::new(2 * x + 2, -2 * y))
            })
            .collect();
        let pos = grid_positions(&cells).unwrap();
        assert_eq!(pos[0], (0, 0));
        assert_eq!(pos[17], (1, 1));
        assert_eq!(pos[127], (15, 7));
        assert!(grid_positions(&cells[..100]).is_none());
    }
    #[test]
    fn from_grid_cells() {
        // Full-height grid, listed bottom row first
        let mut cells = Vec::new();
        for y in (0..16).rev() {
            for x in 0..16 {
                let lo = Point::new(3 * x as Int, -3 * y as Int - 3);
                let bbox = BoundBox::from_points(lo, Point::new(lo.x + 3, lo.y + 3));
                cells.push((bbox, x == y));
            }
        }
        let p = LayerPattern::from_cells(&cells).unwrap();
        assert_eq!(p.count(), 16);
        assert!(p.get(0, 0) && p.get(15, 15) && !p.get(1, 0));
        assert!(LayerPattern::from_cells(&cells[..32]).is_none());
    }
}

//!
//! # Example Layout Compaction
//!
//! Arranges a node cell's size-variant examples without overlap.
//! One example is centered horizontally with its top on the origin;
//! four are packed into quadrants around the origin;
//! any other count is left as-is.
//!

// Local imports
use crate::cluster::{cluster, Example};
use crate::{TechError, TechResult};
use tech21raw::{BoundBox, ChangeList, Int, Library, Point};

/// Offsets moving each of `boxes` into its compacted position
pub fn offsets(boxes: &[BoundBox]) -> Vec<Point> {
    match boxes.len() {
        1 => {
            let b = &boxes[0];
            vec![Point::new(-(b.p0.x + b.width() / 2), -b.p1.y)]
        }
        4 => quadrants(boxes),
        n => vec![Point::new(0, 0); n],
    }
}

/// Four-example arrangement.
/// Smallest top-left, wide top-right, tall bottom-left, biggest bottom-right.
fn quadrants(boxes: &[BoundBox]) -> Vec<Point> {
    let mut by_area: Vec<usize> = (0..4).collect();
    by_area.sort_by_key(|i| boxes[*i].area());
    let (smallest, biggest) = (by_area[0], by_area[3]);
    let (m0, m1) = (by_area[1], by_area[2]);
    let wide = |i: usize| boxes[i].width() >= boxes[i].height();
    let aspect = |i: usize| boxes[i].width() as f64 / (boxes[i].height().max(1)) as f64;
    let (stretch_x, stretch_y) = match (wide(m0), wide(m1)) {
        (true, false) => (m0, m1),
        (false, true) => (m1, m0),
        _ if aspect(m1) > aspect(m0) => (m1, m0),
        _ => (m0, m1),
    };

    let s = &boxes[smallest];
    let separation = s.width().min(s.height());
    let left_col = s.width().max(boxes[stretch_y].width());
    let right_col = boxes[stretch_x].width().max(boxes[biggest].width());
    let top_row = s.height().max(boxes[stretch_x].height());
    let bottom_row = boxes[stretch_y].height().max(boxes[biggest].height());
    let total_width = left_col + separation + right_col;
    let total_height = top_row + separation + bottom_row;

    let left = -(total_width / 2);
    let bottom = -(total_height / 2);
    let top = bottom + total_height;
    let right_x = left + left_col + separation;
    let lower_top = top - top_row - separation;

    // Target (left, top) for each
    let mut targets = [(0 as Int, 0 as Int); 4];
    targets[smallest] = (left, top);
    targets[stretch_x] = (right_x, top);
    targets[stretch_y] = (left, lower_top);
    targets[biggest] = (right_x, lower_top);
    boxes
        .iter()
        .zip(targets.iter())
        .map(|(b, (x, y))| Point::new(x - b.p0.x, y - b.p1.y))
        .collect()
}

/// Change list rigidly translating every sample of `examples` into its compacted position
pub fn compact(examples: &[Example]) -> ChangeList {
    let boxes: Vec<BoundBox> = examples.iter().map(|e| e.bbox).collect();
    let mut changes = ChangeList::new();
    for (ex, delta) in examples.iter().zip(offsets(&boxes)) {
        if delta == Point::new(0, 0) {
            continue;
        }
        for s in ex.samples.iter() {
            changes.translate(s.inst, delta);
        }
    }
    changes
}

/// Cluster node cell `cell` of `lib` and compact its examples
pub fn compact_cell(lib: &Library, cell: &str) -> TechResult<ChangeList> {
    let key = lib
        .cell_key(cell)
        .ok_or_else(|| TechError::msg(format!("no cell `{}`", cell)))?;
    let examples = cluster(lib, key, cell, true)?;
    Ok(compact(&examples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tech21raw::{BoundBoxTrait, Translate};

    fn bx(x: Int, y: Int, w: Int, h: Int) -> BoundBox {
        BoundBox::from_points(Point::new(x, y), Point::new(x + w, y + h))
    }
    #[test]
    fn single_centers_under_origin() {
        let offs = offsets(&[bx(100, 50, 10, 20)]);
        assert_eq!(offs, vec![Point::new(-105, -70)]);
    }
    #[test]
    fn other_counts_are_untouched() {
        assert_eq!(offsets(&[bx(0, 0, 1, 1), bx(5, 5, 1, 1)]), vec![Point::new(0, 0); 2]);
    }
    #[test]
    fn four_pack_into_quadrants() {
        // Strictly increasing areas, scattered along a row
        let boxes = [bx(0, 0, 10, 10), bx(30, 0, 20, 10), bx(80, 0, 10, 21), bx(120, 0, 20, 21)];
        let placed: Vec<BoundBox> = boxes
            .iter()
            .zip(offsets(&boxes))
            .map(|(b, d)| {
                let mut b = *b;
                b.translate(d);
                b
            })
            .collect();
        let sep = 10;
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert!(!placed[i].intersects(&placed[j]), "{} and {} overlap", i, j);
            }
        }
        // Smallest top-left, wide top-right, tall bottom-left, biggest bottom-right
        assert_eq!(placed[1].p0.x - placed[0].p1.x, sep);
        assert_eq!(placed[0].p0.y - placed[2].p1.y, sep);
        assert_eq!(placed[3].p0.x - placed[2].p1.x, sep);
        assert_eq!(placed[1].p0.y - placed[3].p1.y, sep);
        assert_eq!(placed[0].p1.y, placed[1].p1.y);
        // Centered on the origin
        let all = placed.iter().fold(BoundBox::empty(), |acc, b| acc.union(b));
        assert_eq!(all.p0.x + all.p1.x, 0);
        assert!((all.p0.y + all.p1.y).abs() <= 1);
    }
}

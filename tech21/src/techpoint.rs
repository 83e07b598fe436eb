//!
//! # Parametric Coordinates
//!
//! A [TechPoint] places a vertex relative to a node's footprint,
//! so that one rule yields geometry at every node size.
//! Each axis is an [EdgeRule]: `center + multiplier * extent + adder`.
//! Multipliers of -1/2 and 1/2 pin a coordinate to the low or high edge,
//! zero pins it to the center, and anything else scales proportionally.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use tech21raw::{BoundBox, Dir, Int, Point};

/// # Edge Rule
///
/// One axis of a [TechPoint].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct EdgeRule {
    pub multiplier: f64,
    pub adder: Int,
}
impl EdgeRule {
    pub fn new(multiplier: f64, adder: Int) -> Self {
        Self { multiplier, adder }
    }
    /// Distance `adder` in from the low (left or bottom) edge
    pub fn from_low(adder: Int) -> Self {
        Self::new(-0.5, adder)
    }
    /// Distance `adder` from the high (right or top) edge. Typically negative, to land inside.
    pub fn from_high(adder: Int) -> Self {
        Self::new(0.5, adder)
    }
    /// Offset `adder` from the center
    pub fn from_center(adder: Int) -> Self {
        Self::new(0.0, adder)
    }
    /// Proportional to the extent
    pub fn ratio(multiplier: f64) -> Self {
        Self::new(multiplier, 0)
    }
    /// Evaluate over the span `lo..hi`
    pub fn eval(&self, lo: Int, hi: Int) -> Int {
        let center = (lo + hi) as f64 / 2.0;
        let extent = (hi - lo) as f64;
        (center + self.multiplier * extent + self.adder as f64).round() as Int
    }
}

/// # Tech Point
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TechPoint {
    pub x: EdgeRule,
    pub y: EdgeRule,
}
impl TechPoint {
    pub fn new(x: EdgeRule, y: EdgeRule) -> Self {
        Self { x, y }
    }
    /// The footprint's center
    pub fn center() -> Self {
        Self::new(EdgeRule::from_center(0), EdgeRule::from_center(0))
    }
    /// Lower-left footprint corner, inset by (`dx`, `dy`)
    pub fn lower_left(dx: Int, dy: Int) -> Self {
        Self::new(EdgeRule::from_low(dx), EdgeRule::from_low(dy))
    }
    /// Upper-right footprint corner, inset by (`dx`, `dy`)
    pub fn upper_right(dx: Int, dy: Int) -> Self {
        Self::new(EdgeRule::from_high(-dx), EdgeRule::from_high(-dy))
    }
    /// Offset (`dx`, `dy`) from the center
    pub fn from_center(dx: Int, dy: Int) -> Self {
        Self::new(EdgeRule::from_center(dx), EdgeRule::from_center(dy))
    }
    /// Get the rule for axis `dir`
    pub fn axis(&self, dir: Dir) -> &EdgeRule {
        match dir {
            Dir::Horiz => &self.x,
            Dir::Vert => &self.y,
        }
    }
    /// Evaluate within footprint `frame`
    pub fn eval(&self, frame: &BoundBox) -> Point {
        Point::new(
            self.x.eval(frame.p0.x, frame.p1.x),
            self.y.eval(frame.p0.y, frame.p1.y),
        )
    }
}

/// Tolerance in layout units when checking a fitted rule against every example
const FIT_TOLERANCE: f64 = 1.0;
/// Snapping slack on top of the half-unit rounding of center-relative coordinates
const SNAP_EPSILON: f64 = 1e-9;

/// # Edge-Rule Fitting
///
/// Recover the [EdgeRule] placing coordinates `coords[k]` within spans `spans[k]`,
/// one entry per example.
///
/// With at least two distinct extents the multiplier is the slope of
/// center-relative position against extent, snapped to a multiple of 1/2 when
/// within half-unit rounding error of one, and the adder the intercept.
/// Without extent variation the rule is taken as center-relative.
/// Returns `None` if the examples disagree.
pub fn fit_edge(spans: &[(Int, Int)], coords: &[Int]) -> Option<EdgeRule> {
    if spans.is_empty() || spans.len() != coords.len() {
        return None;
    }
    let rel = |k: usize| coords[k] as f64 - (spans[k].0 + spans[k].1) as f64 / 2.0;
    let ext = |k: usize| (spans[k].1 - spans[k].0) as f64;

    let rule = match (1..spans.len()).find(|k| ext(*k) != ext(0)) {
        None => EdgeRule::from_center(rel(0).round() as Int),
        Some(k) => {
            let dext = ext(k) - ext(0);
            let mut m = (rel(k) - rel(0)) / dext;
            let snapped = (m * 2.0).round() / 2.0;
            if (m - snapped).abs() <= 0.5 / dext.abs() + SNAP_EPSILON {
                m = snapped;
            }
            let adder = (rel(0) - m * ext(0)).round() as Int;
            EdgeRule::new(m, adder)
        }
    };
    let agrees = (0..spans.len()).all(|k| {
        let predicted = rule.eval(spans[k].0, spans[k].1);
        ((predicted - coords[k]) as f64).abs() <= FIT_TOLERANCE
    });
    match agrees {
        true => Some(rule),
        false => None,
    }
}

/// Fit a [TechPoint] to `points[k]` within `frames[k]`. See [fit_edge].
pub fn fit_point(frames: &[BoundBox], points: &[Point]) -> Option<TechPoint> {
    let xs: Vec<(Int, Int)> = frames.iter().map(|f| (f.p0.x, f.p1.x)).collect();
    let ys: Vec<(Int, Int)> = frames.iter().map(|f| (f.p0.y, f.p1.y)).collect();
    let px: Vec<Int> = points.iter().map(|p| p.x).collect();
    let py: Vec<Int> = points.iter().map(|p| p.y).collect();
    Some(TechPoint::new(fit_edge(&xs, &px)?, fit_edge(&ys, &py)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_against_edges() {
        let frame = BoundBox::from_points(Point::new(-5, -5), Point::new(5, 5));
        assert_eq!(TechPoint::lower_left(1, 2).eval(&frame), Point::new(-4, -3));
        assert_eq!(TechPoint::upper_right(1, 2).eval(&frame), Point::new(4, 3));
        assert_eq!(TechPoint::from_center(1, -1).eval(&frame), Point::new(1, -1));
        let p = TechPoint::new(EdgeRule::ratio(0.25), EdgeRule::ratio(-0.25));
        let wide = BoundBox::from_points(Point::new(-10, -5), Point::new(10, 5));
        assert_eq!(p.eval(&wide), Point::new(5, -3));
        assert_eq!(p.axis(Dir::Horiz), &EdgeRule::ratio(0.25));
    }
    #[test]
    fn fits_edge_rules() {
        let spans = [(-5, 5), (-10, 10)];
        assert_eq!(fit_edge(&spans, &[-4, -9]), Some(EdgeRule::from_low(1)));
        assert_eq!(fit_edge(&spans, &[3, 8]), Some(EdgeRule::from_high(-2)));
        assert_eq!(fit_edge(&spans, &[2, 2]), Some(EdgeRule::from_center(2)));
        assert_eq!(fit_edge(&spans, &[4, 8]), Some(EdgeRule::ratio(0.4)));
        // No extent variation: center-relative
        assert_eq!(fit_edge(&[(0, 10), (20, 30)], &[3, 23]), Some(EdgeRule::from_center(-2)));
        // Three examples which no single rule explains
        assert_eq!(fit_edge(&[(-5, 5), (-10, 10), (-20, 20)], &[-4, -9, 0]), None);
        assert_eq!(fit_edge(&[], &[]), None);
    }
    #[test]
    fn fits_points() {
        let frames = [
            BoundBox::from_points(Point::new(0, 0), Point::new(10, 10)),
            BoundBox::from_points(Point::new(30, 0), Point::new(50, 20)),
        ];
        let tp = TechPoint::new(EdgeRule::from_high(-1), EdgeRule::from_low(2));
        let pts: Vec<Point> = frames.iter().map(|f| tp.eval(f)).collect();
        assert_eq!(fit_point(&frames, &pts), Some(tp));
    }
}

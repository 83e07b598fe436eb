//!
//! # Bounding Boxes
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::{
    geom::{ordered, Point, Rect, Shape, ShapeTrait},
    Int,
};

/// # Bounding Box
///
/// Inclusive axis-aligned extent, `p0` lower-left and `p1` upper-right.
/// The empty box has its corners inverted, so that it absorbs into any union.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Box spanning corners `a` and `b`, given in either order
    pub fn from_points(a: Point, b: Point) -> Self {
        let (p0, p1) = ordered(a, b);
        Self { p0, p1 }
    }
    /// Zero-area box at `pt`
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    pub fn empty() -> Self {
        Self {
            p0: Point::new(Int::MAX, Int::MAX),
            p1: Point::new(Int::MIN, Int::MIN),
        }
    }
    /// Smallest box holding every point of `pts`. Empty if there are none.
    pub fn around(pts: impl IntoIterator<Item = Point>) -> Self {
        pts.into_iter()
            .fold(Self::empty(), |acc, pt| acc.join(&Self::from_point(pt)))
    }
    pub fn is_empty(&self) -> bool {
        self.p1.x < self.p0.x || self.p1.y < self.p0.y
    }
    /// Whether `pt` lies inside or on our edge
    pub fn contains(&self, pt: &Point) -> bool {
        (self.p0.x..=self.p1.x).contains(&pt.x) && (self.p0.y..=self.p1.y).contains(&pt.y)
    }
    /// Whether we share any point with `other`. Touching edges count.
    pub fn intersects(&self, other: &BoundBox) -> bool {
        !self.clip(other).is_empty()
    }
    /// Grow outward by `delta` on every side
    pub fn expand(&mut self, delta: Int) {
        let d = Point::new(delta, delta);
        self.p0 = self.p0 - d;
        self.p1 = self.p1 + d;
    }
    /// (width, height)
    pub fn size(&self) -> (Int, Int) {
        (self.width(), self.height())
    }
    pub fn width(&self) -> Int {
        self.p1.x - self.p0.x
    }
    pub fn height(&self) -> Int {
        self.p1.y - self.p0.y
    }
    /// Area, widened to avoid overflow on large boxes
    pub fn area(&self) -> i128 {
        match self.is_empty() {
            true => 0,
            false => self.width() as i128 * self.height() as i128,
        }
    }
    /// Center, in floating-point so odd sizes stay exact
    pub fn center(&self) -> (f64, f64) {
        let sum = self.p0 + self.p1;
        (sum.x as f64 / 2.0, sum.y as f64 / 2.0)
    }
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.p0, self.p1)
    }
    /// Overlap with `other`, or the empty box
    fn clip(&self, other: &BoundBox) -> BoundBox {
        let lo = Point::new(self.p0.x.max(other.p0.x), self.p0.y.max(other.p0.y));
        let hi = Point::new(self.p1.x.min(other.p1.x), self.p1.y.min(other.p1.y));
        match lo.x <= hi.x && lo.y <= hi.y {
            true => BoundBox { p0: lo, p1: hi },
            false => BoundBox::empty(),
        }
    }
    /// Smallest box holding both ourselves and `other`
    fn join(&self, other: &BoundBox) -> BoundBox {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => {
                let (lo, _) = ordered(self.p0, other.p0);
                let (_, hi) = ordered(self.p1, other.p1);
                BoundBox { p0: lo, p1: hi }
            }
        }
    }
}

///
/// # Bounding Box Trait
///
/// Anything with a rectangular extent. Implementors supply [BoundBoxTrait::bbox];
/// union and intersection follow from it.
///
pub trait BoundBoxTrait {
    fn bbox(&self) -> BoundBox;
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().clip(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().join(bbox)
    }
}
impl BoundBoxTrait for BoundBox {
    fn bbox(&self) -> BoundBox {
        *self
    }
}
impl BoundBoxTrait for Point {
    fn bbox(&self) -> BoundBox {
        BoundBox::from_point(*self)
    }
}
impl BoundBoxTrait for Rect {
    fn bbox(&self) -> BoundBox {
        BoundBox::from_points(self.p0, self.p1)
    }
}
impl BoundBoxTrait for Shape {
    fn bbox(&self) -> BoundBox {
        let mut bbox = BoundBox::around(self.vertices());
        if !bbox.is_empty() {
            bbox.expand(self.halo());
        }
        bbox
    }
}

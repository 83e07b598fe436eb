//!
//! # Rigid Translation
//!

use crate::{BoundBox, Path, Point, Polygon, Rect, Shape, ShapeTrait};

/// Move by vector `v`, in place
pub trait Translate {
    fn translate(&mut self, v: Point);
}

impl Translate for Point {
    fn translate(&mut self, v: Point) {
        *self = *self + v;
    }
}
impl Translate for BoundBox {
    /// Empty boxes stay empty
    fn translate(&mut self, v: Point) {
        if !self.is_empty() {
            self.p0.translate(v);
            self.p1.translate(v);
        }
    }
}

/// Implement [Translate] for [ShapeTrait] types, by moving each of their anchors
macro_rules! translate_anchors {
    ($($t:ty),* $(,)?) => {
        $(impl Translate for $t {
            fn translate(&mut self, v: Point) {
                for pt in self.anchors_mut() {
                    pt.translate(v);
                }
            }
        })*
    };
}
translate_anchors!(Rect, Polygon, Path, Shape);

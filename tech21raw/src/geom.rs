//!
//! # Geometry Module
//!
//! Integer-coordinate [Point]s and the three drawable outlines an [crate::Instance] can carry:
//! [Rect], [Polygon] and [Path], unified as [Shape].
//!

// Std-Lib
use std::ops::{Add, Neg, Sub};

// Crates.io
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

// Local imports
use crate::Int;

/// # Layout Point
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: Int,
    pub y: Int,
}
impl Point {
    pub fn new(x: Int, y: Int) -> Self {
        Self { x, y }
    }
    /// The origin
    pub fn zero() -> Self {
        Self::default()
    }
    /// Our coordinate along `dir`
    pub fn along(&self, dir: Dir) -> Int {
        match dir {
            Dir::Horiz => self.x,
            Dir::Vert => self.y,
        }
    }
}
impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Layout axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Dir {
    Horiz,
    Vert,
}

/// # Rectangle
///
/// Axis-aligned, with `p0` the lower-left corner and `p1` the upper-right.
/// All constructors maintain that ordering.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub p0: Point,
    pub p1: Point,
}
impl Rect {
    /// Create from any two opposite corners
    pub fn new(a: Point, b: Point) -> Self {
        let (lo, hi) = ordered(a, b);
        Self { p0: lo, p1: hi }
    }
    /// Size (`w`, `h`) around `center`. Odd sizes carry their extra unit up and to the right.
    pub fn centered(center: Point, w: Int, h: Int) -> Self {
        Self::from_size(center - Point::new(w / 2, h / 2), w, h)
    }
    /// Size (`w`, `h`) up and to the right of `lo`
    pub fn from_size(lo: Point, w: Int, h: Int) -> Self {
        Self::new(lo, lo + Point::new(w, h))
    }
    /// Center, rounded toward negative infinity
    pub fn center(&self) -> Point {
        let sum = self.p0 + self.p1;
        Point::new(sum.x.div_euclid(2), sum.y.div_euclid(2))
    }
    pub fn width(&self) -> Int {
        self.p1.x - self.p0.x
    }
    pub fn height(&self) -> Int {
        self.p1.y - self.p0.y
    }
}

/// Order corners `a` and `b` into (lower-left, upper-right)
pub(crate) fn ordered(a: Point, b: Point) -> (Point, Point) {
    (
        Point::new(a.x.min(b.x), a.y.min(b.y)),
        Point::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// # Polygon
///
/// Vertex list, implicitly closed from the last point back to the first.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

/// # Path
///
/// Open polyline drawn at `width`. Zero-width paths are hairlines.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Path {
    pub points: Vec<Point>,
    pub width: Int,
}

/// # Shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
    Path(Path),
}
impl Default for Shape {
    fn default() -> Self {
        Rect::default().into()
    }
}
impl Shape {
    /// Our [Rect], if we are one
    pub fn as_rect(&self) -> Option<&Rect> {
        match self {
            Shape::Rect(r) => Some(r),
            _ => None,
        }
    }
}

/// # Shape Operations
///
/// Implemented by each outline type, and forwarded by [Shape] through [enum_dispatch].
#[enum_dispatch]
pub trait ShapeTrait {
    /// Vertices, in drawing order
    fn vertices(&self) -> Vec<Point>;
    /// Mutable references to every stored coordinate pair
    fn anchors_mut(&mut self) -> Vec<&mut Point>;
    /// Whether the outline returns to its first vertex
    fn is_closed(&self) -> bool {
        true
    }
    /// Extra extent drawn around the vertices
    fn halo(&self) -> Int {
        0
    }
}
impl ShapeTrait for Rect {
    /// Counter-clockwise from `p0`
    fn vertices(&self) -> Vec<Point> {
        let (lo, hi) = (self.p0, self.p1);
        vec![lo, Point::new(hi.x, lo.y), hi, Point::new(lo.x, hi.y)]
    }
    fn anchors_mut(&mut self) -> Vec<&mut Point> {
        vec![&mut self.p0, &mut self.p1]
    }
}
impl ShapeTrait for Polygon {
    fn vertices(&self) -> Vec<Point> {
        self.points.clone()
    }
    fn anchors_mut(&mut self) -> Vec<&mut Point> {
        self.points.iter_mut().collect()
    }
}
impl ShapeTrait for Path {
    fn vertices(&self) -> Vec<Point> {
        self.points.clone()
    }
    fn anchors_mut(&mut self) -> Vec<&mut Point> {
        self.points.iter_mut().collect()
    }
    fn is_closed(&self) -> bool {
        false
    }
    fn halo(&self) -> Int {
        self.width / 2
    }
}

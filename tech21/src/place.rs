//!
//! # Polygon-Style Placement
//!
//! Maps each [PolyStyle] to the artwork [Prototype] and [Shape] which draw it, and back.
//!

// Std-Lib
use std::f64::consts::PI;

// Local imports
use crate::model::PolyStyle;
use crate::tags;
use crate::{TechError, TechResult};
use tech21raw::{AttrValue, Attrs, Path, Point, Polygon, Prototype, Rect, Shape};

/// # Evaluated Rule Geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// From a two-corner rule
    Rect(Rect),
    /// From a point-list rule
    Points(Vec<Point>),
}
impl Geometry {
    fn count(&self) -> usize {
        match self {
            Self::Rect(_) => 2,
            Self::Points(p) => p.len(),
        }
    }
}

/// # Placement
///
/// Everything needed to create one instance, less its role and layer attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub proto: Prototype,
    pub shape: Shape,
    pub attrs: Attrs,
}

/// Place `geom` drawn in `style`, for `entity`.
/// Fails with a [TechError::Style] if the geometry cannot be drawn that way.
pub fn place(entity: &str, style: PolyStyle, geom: Geometry, message: Option<&str>) -> TechResult<Placement> {
    let fail = |msg: &str| -> TechResult<Placement> {
        Err(TechError::Style {
            entity: entity.to_string(),
            style: style.to_string(),
            message: msg.to_string(),
        })
    };
    let n = geom.count();
    match style {
        PolyStyle::FilledRect => Ok(closed(Prototype::FilledBox, geom)),
        PolyStyle::Filled => Ok(closed(Prototype::FilledPolygon, geom)),
        PolyStyle::ClosedRect => Ok(closed(Prototype::Box, geom)),
        PolyStyle::Closed => Ok(closed(Prototype::ClosedPolygon, geom)),
        PolyStyle::Crossed => Ok(closed(Prototype::CrossedBox, geom)),
        PolyStyle::Opened => Ok(opened(Prototype::OpenedPolygon, geom)),
        PolyStyle::OpenedDotted => Ok(opened(Prototype::OpenedDottedPolygon, geom)),
        PolyStyle::OpenedDashed => Ok(opened(Prototype::OpenedDashedPolygon, geom)),
        PolyStyle::OpenedThicker => Ok(opened(Prototype::OpenedThickerPolygon, geom)),
        PolyStyle::Vectors if n % 2 != 0 => fail("vectors need an even number of points"),
        PolyStyle::Vectors => Ok(opened(Prototype::Vectors, geom)),
        PolyStyle::Circle | PolyStyle::ThickCircle | PolyStyle::Disc if n != 2 => {
            fail("circles need a center and an edge point")
        }
        PolyStyle::Circle => Ok(closed(Prototype::Circle, geom)),
        PolyStyle::ThickCircle => Ok(closed(Prototype::ThickCircle, geom)),
        PolyStyle::Disc => Ok(closed(Prototype::FilledCircle, geom)),
        PolyStyle::CircleArc | PolyStyle::ThickCircleArc => match geom {
            Geometry::Points(pts) if pts.len() == 3 => {
                let proto = match style {
                    PolyStyle::CircleArc => Prototype::CircleArc,
                    _ => Prototype::ThickCircleArc,
                };
                Ok(circle_arc(proto, pts))
            }
            _ => fail("circular arcs need a center, a start and an end point"),
        },
        PolyStyle::TextCenter => Ok(text("center", geom, message)),
        PolyStyle::TextUpperLeft => Ok(text("upper-left", geom, message)),
        PolyStyle::TextUpperRight => Ok(text("upper-right", geom, message)),
        PolyStyle::TextBoxed => Ok(text("boxed", geom, message)),
    }
}

/// Recover the [PolyStyle] drawn by `proto`, with attributes `attrs`.
/// Markers and untagged text draw no style.
pub fn style_of(proto: Prototype, attrs: &Attrs) -> Option<PolyStyle> {
    let style = match proto {
        Prototype::FilledBox => PolyStyle::FilledRect,
        Prototype::FilledPolygon => PolyStyle::Filled,
        Prototype::Box => PolyStyle::ClosedRect,
        Prototype::ClosedPolygon => PolyStyle::Closed,
        Prototype::CrossedBox => PolyStyle::Crossed,
        Prototype::OpenedPolygon => PolyStyle::Opened,
        Prototype::OpenedDottedPolygon => PolyStyle::OpenedDotted,
        Prototype::OpenedDashedPolygon => PolyStyle::OpenedDashed,
        Prototype::OpenedThickerPolygon => PolyStyle::OpenedThicker,
        Prototype::Vectors => PolyStyle::Vectors,
        Prototype::Circle => PolyStyle::Circle,
        Prototype::ThickCircle => PolyStyle::ThickCircle,
        Prototype::FilledCircle => PolyStyle::Disc,
        Prototype::CircleArc => PolyStyle::CircleArc,
        Prototype::ThickCircleArc => PolyStyle::ThickCircleArc,
        Prototype::InvisiblePin => match attrs.get(tags::ANCHOR).and_then(|a| a.as_str())? {
            "center" => PolyStyle::TextCenter,
            "upper-left" => PolyStyle::TextUpperLeft,
            "upper-right" => PolyStyle::TextUpperRight,
            "boxed" => PolyStyle::TextBoxed,
            _ => return None,
        },
        Prototype::PortMarker | Prototype::GrabPoint | Prototype::Highlight => return None,
    };
    Some(style)
}

/// Points of a placed rule shape: the two corners of a rectangle, or every vertex otherwise
pub fn shape_points(shape: &Shape) -> Geometry {
    match shape {
        Shape::Rect(r) => Geometry::Rect(r.clone()),
        Shape::Polygon(p) => Geometry::Points(p.points.clone()),
        Shape::Path(p) => Geometry::Points(p.points.clone()),
    }
}

fn closed(proto: Prototype, geom: Geometry) -> Placement {
    let shape = match geom {
        Geometry::Rect(r) => Shape::Rect(r),
        Geometry::Points(points) => Shape::Polygon(Polygon { points }),
    };
    Placement {
        proto,
        shape,
        attrs: Attrs::new(),
    }
}
fn opened(proto: Prototype, geom: Geometry) -> Placement {
    let shape = match geom {
        Geometry::Rect(r) => Shape::Rect(r),
        Geometry::Points(points) => Shape::Path(Path { points, width: 0 }),
    };
    Placement {
        proto,
        shape,
        attrs: Attrs::new(),
    }
}
fn circle_arc(proto: Prototype, pts: Vec<Point>) -> Placement {
    let angle = |p: &Point| ((p.y - pts[0].y) as f64).atan2((p.x - pts[0].x) as f64) * 180.0 / PI;
    let start = angle(&pts[1]);
    let mut extent = angle(&pts[2]) - start;
    if extent <= 0.0 {
        extent += 360.0;
    }
    let mut attrs = Attrs::new();
    attrs.insert(tags::ARC_START.into(), AttrValue::Float(start));
    attrs.insert(tags::ARC_EXTENT.into(), AttrValue::Float(extent));
    Placement {
        proto,
        shape: Shape::Path(Path { points: pts, width: 0 }),
        attrs,
    }
}
fn text(anchor: &str, geom: Geometry, message: Option<&str>) -> Placement {
    let mut placement = closed(Prototype::InvisiblePin, geom);
    placement.attrs.insert(tags::ANCHOR.into(), anchor.into());
    placement
        .attrs
        .insert(tags::MESSAGE.into(), message.unwrap_or_default().into());
    placement
}

//!
//! # tech21raw unit tests
//!

use super::*;
use chrono::NaiveDate;

/// Create a [Library] with one cell `c`, holding two boxes: `a` at the origin and `b` off to the right
fn two_boxes() -> StoreResult<(Library, Committed)> {
    let mut lib = Library::new("lib");
    let mut changes = ChangeList::new();
    changes.create_cell("c");
    let mut attrs = Attrs::new();
    attrs.insert("layer".into(), "metal-1".into());
    changes.create_instance(
        "c",
        Prototype::FilledBox,
        Shape::Rect(Rect::new(Point::new(0, 0), Point::new(10, 10))),
        attrs,
    );
    changes.create_instance(
        "c",
        Prototype::Highlight,
        Shape::Rect(Rect::new(Point::new(20, 0), Point::new(30, 10))),
        Attrs::new(),
    );
    let done = lib.commit(changes)?;
    Ok((lib, done))
}

#[test]
fn point() {
    let p = Point::new(1, 2);
    assert_eq!(p + Point::new(3, 4), Point::new(4, 6));
    assert_eq!(p - Point::new(1, 1), Point::new(0, 1));
    assert_eq!(-p, Point::new(-1, -2));
    assert_eq!(p.along(Dir::Vert), 2);
    assert_eq!(BoundBox::around(vec![p, Point::zero()]).size(), (1, 2));
    assert!(BoundBox::around(Vec::new()).is_empty());
}
#[test]
fn rects() {
    let r = Rect::new(Point::new(10, 4), Point::new(0, 0));
    assert_eq!(r.p0, Point::new(0, 0));
    assert_eq!((r.width(), r.height()), (10, 4));
    assert_eq!(r.center(), Point::new(5, 2));
    let c = Rect::centered(Point::new(0, 0), 5, 4);
    assert_eq!((c.p0, c.p1), (Point::new(-2, -2), Point::new(3, 2)));
}
#[test]
fn bbox_ops() {
    let a = BoundBox::from_points(Point::new(0, 0), Point::new(10, 10));
    let b = BoundBox::from_points(Point::new(10, 10), Point::new(20, 20));
    let c = BoundBox::from_points(Point::new(11, 0), Point::new(20, 9));
    // Touching corners intersect; disjoint boxes do not
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(!a.intersects(&BoundBox::empty()));
    assert_eq!(BoundBox::empty().union(&a), a);
    assert_eq!(a.union(&c).size(), (20, 10));
    assert_eq!(a.area(), 100);
    assert_eq!(BoundBox::empty().area(), 0);
    assert_eq!(b.center(), (15.0, 15.0));
}
#[test]
fn shape_bbox() {
    let poly = Shape::Polygon(Polygon {
        points: vec![Point::new(0, 0), Point::new(4, 8), Point::new(-2, 3)],
    });
    assert_eq!(poly.bbox(), BoundBox::from_points(Point::new(-2, 0), Point::new(4, 8)));
    let path = Shape::Path(Path {
        points: vec![Point::new(0, 0), Point::new(10, 0)],
        width: 2,
    });
    assert_eq!(path.bbox(), BoundBox::from_points(Point::new(-1, -1), Point::new(11, 1)));
    assert!(!path.is_closed());
    let mut moved = path.clone();
    moved.translate(Point::new(1, 1));
    assert_eq!(moved.vertices()[1], Point::new(11, 1));
}
#[test]
fn commit_creates() -> StoreResult<()> {
    let (lib, done) = two_boxes()?;
    let cell = lib.cell_key("c").unwrap();
    assert_eq!(lib.cell(cell)?.insts.len(), 2);
    let a = done.key(PendingId(0)).unwrap();
    assert_eq!(lib.get_attr(a, "layer")?, Some(&AttrValue::from("metal-1")));
    assert_eq!(lib.bounds(a)?.size(), (10, 10));
    assert_eq!(done.cells, vec!["c".to_string()]);
    Ok(())
}
#[test]
fn query_region() -> StoreResult<()> {
    let (lib, done) = two_boxes()?;
    let cell = lib.cell_key("c").unwrap();
    let region = BoundBox::from_points(Point::new(5, 5), Point::new(20, 5));
    let hits = lib.query_in_region(cell, &region)?;
    assert_eq!(hits, vec![done.key(PendingId(0)).unwrap(), done.key(PendingId(1)).unwrap()]);
    let region = BoundBox::from_points(Point::new(12, 0), Point::new(18, 10));
    assert!(lib.query_in_region(cell, &region)?.is_empty());
    assert_eq!(lib.cell_instances(cell)?.len(), 2);
    Ok(())
}
#[test]
fn commit_is_atomic() -> StoreResult<()> {
    let (mut lib, done) = two_boxes()?;
    let a = done.key(PendingId(0)).unwrap();
    let mut changes = ChangeList::new();
    changes.set_attr(a, "layer", "metal-2");
    changes.create_instance("nope", Prototype::FilledBox, Shape::default(), Attrs::new());
    match lib.commit(changes) {
        Err(StoreError::Commit { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected commit error, got {:?}", other),
    }
    // The valid first change was not applied either
    assert_eq!(lib.get_attr(a, "layer")?, Some(&AttrValue::from("metal-1")));
    Ok(())
}
#[test]
fn commit_replaces_cells() -> StoreResult<()> {
    let (mut lib, done) = two_boxes()?;
    let a = done.key(PendingId(0)).unwrap();
    let mut changes = ChangeList::new();
    changes.create_cell("c");
    // Instances of the replaced cell are gone
    changes.set_attr(a, "layer", "metal-2");
    assert!(lib.commit(changes).is_err());

    let mut changes = ChangeList::new();
    changes.create_cell("c");
    lib.commit(changes)?;
    assert!(lib.inst(a).is_err());
    assert!(lib.cell_named("c")?.insts.is_empty());
    Ok(())
}
#[test]
fn append_renumbers() -> StoreResult<()> {
    let mut first = ChangeList::new();
    first.create_cell("p");
    let p0 = first.create_instance("p", Prototype::PortMarker, Shape::default(), Attrs::new());
    let mut second = ChangeList::new();
    let q0 = second.create_instance("p", Prototype::PortMarker, Shape::default(), Attrs::new());
    second.connect("p", q0, q0);
    second.translate(q0, Point::new(3, 0));
    first.append(second);
    first.connect("p", p0, PendingId(1));

    let mut lib = Library::new("lib");
    let done = lib.commit(first)?;
    let (k0, k1) = (done.key(PendingId(0)).unwrap(), done.key(PendingId(1)).unwrap());
    let cell = lib.cell_named("p")?;
    assert_eq!(cell.connections.len(), 2);
    assert_eq!((cell.connections[0].a, cell.connections[0].b), (k1, k1));
    assert_eq!((cell.connections[1].a, cell.connections[1].b), (k0, k1));
    assert_eq!(lib.bounds(k1)?.p0, Point::new(3, 0));
    Ok(())
}
#[test]
fn commit_stamps_cells() -> StoreResult<()> {
    let (mut lib, done) = two_boxes()?;
    let when = NaiveDate::from_ymd(2001, 2, 3).and_hms(4, 5, 6);
    let mut changes = ChangeList::new();
    changes.stamp = Some(when);
    changes.translate(done.key(PendingId(1)).unwrap(), Point::new(0, 5));
    lib.commit(changes)?;
    assert_eq!(lib.cell_named("c")?.modified, when);
    Ok(())
}
#[test]
fn library_markup() -> StoreResult<()> {
    use utils::SerializationFormat::Yaml;
    let (lib, _) = two_boxes()?;
    let s = Yaml.to_string(&lib)?;
    let back: Library = Yaml.from_str(&s)?;
    assert_eq!(back.cell_named("c")?, lib.cell_named("c")?);
    Ok(())
}

//!
//! # tech21 unit tests
//!

// Crates.io
use chrono::{NaiveDate, NaiveDateTime};

// Local imports
use super::*;
use crate::cluster::{cluster, Example, SampleRole};
use crate::labels::FieldValue;
use crate::sequence::SequenceResolver;
use crate::tags::Role;
use tech21raw::utils::EnumStr;
use tech21raw::{AttrValue, Attrs, BoundBox, BoundBoxTrait, CellKey, ChangeList, Int, Library, PendingId, Point, Prototype, Rect, Shape};

/// Layer `name`, with a distinct color and a diagonal-stripe pattern
fn layer(name: &str, function: LayerFunction, color: Color, transparent_layer: usize) -> LayerDescription {
    let mut rows = [0u16; 16];
    for (y, row) in rows.iter_mut().enumerate() {
        *row = 0x8421u16.rotate_right(y as u32 % 4);
    }
    LayerDescription {
        name: name.into(),
        function,
        graphics: Graphics {
            color,
            opacity: 0.8,
            foreground: true,
            transparent_layer,
            fill: FillStyle::Patterned,
        },
        pattern: LayerPattern::from_rows(&rows).unwrap(),
        ..Default::default()
    }
}

/// Create the [Technology] used by a number of tests.
/// Every rule is in the canonical form which parsing recovers.
pub fn demo_tech() -> Technology {
    let mut general = GeneralDescription::new("demo", 200.0);
    general.description = "Two-layer demonstration process".into();
    general.min_resistance = 10.0;
    general.gate_shrinkage = 0.25;
    general.include_ground = true;

    let mut metal = layer("metal-1", LayerFunction::Metal1, Color::new(96, 209, 255), 1);
    metal.cif = "CMF".into();
    metal.gds = "49".into();
    metal.spice = SpiceParams {
        resistance: 0.06,
        capacitance: 0.07,
        edge_capacitance: 0.0,
    };
    metal.height3d = 17.0;
    metal.thickness3d = 1.0;
    let mut poly = layer("poly-1", LayerFunction::Poly1, Color::new(255, 155, 192), 2);
    poly.graphics.fill = FillStyle::Solid;
    poly.cif = "CPG".into();
    let diff = layer("diffusion", LayerFunction::Diff, Color::new(107, 226, 96), 3);
    let mut implant = layer("implant", LayerFunction::ImplantN, Color::new(255, 255, 0), 0);
    implant.extra.insert(LayerExtra::NType);
    implant.graphics.fill = FillStyle::PatternedOutlined;
    implant.graphics.foreground = false;
    let mut contact = layer("contact", LayerFunction::Contact1, Color::new(180, 180, 180), 0);
    contact.extra.insert(LayerExtra::ConnMetal);
    contact.extra.insert(LayerExtra::ConnPoly);

    general.rules = Some(DesignRules {
        foundry: "mosis".into(),
        spacings: vec![
            SpacingRule {
                first: 0,
                second: 0,
                spacing: 3.0,
                rule: "M1.2".into(),
            },
            SpacingRule {
                first: 1,
                second: 2,
                spacing: 1.5,
                rule: "P.5".into(),
            },
        ],
    });

    let rule = |layer: &str, width_offset: Int| LayerRule {
        layer: layer.into(),
        style: PolyStyle::FilledRect,
        width_offset,
    };
    let mut m1 = ArcDescription::new("metal-1", ArcFunction::Metal1, 3);
    m1.angle_increment = 45;
    m1.layers.push(rule("metal-1", 0));
    let mut p1 = ArcDescription::new("poly", ArcFunction::Poly1, 2);
    p1.extendable = false;
    p1.layers.push(rule("poly-1", 0));
    let mut d1 = ArcDescription::new("diff", ArcFunction::Diff, 3);
    d1.wipable = true;
    d1.antenna_ratio = 0.5;
    d1.layers.push(rule("diffusion", 0));
    d1.layers.push(rule("implant", -4));

    let tech_layers = vec![metal, poly, diff, implant, contact];
    let nodes = vec![pin(), contact_node(), transistor(), tap()];
    Technology {
        general,
        layers: tech_layers,
        arcs: vec![m1, p1, d1],
        nodes,
    }
}

fn full(layer: &str) -> NodeLayerRule {
    NodeLayerRule::boxed(
        layer,
        PolyStyle::FilledRect,
        TechPoint::lower_left(0, 0),
        TechPoint::upper_right(0, 0),
    )
}

/// Square metal pin, with a group member which also takes poly
fn pin() -> NodeDescription {
    let mut node = NodeDescription::new("metal-1-pin", NodeFunction::Pin, Extent::new(4, 4));
    node.square = true;
    node.wipes = true;
    node.layers.push(full("metal-1"));
    node.ports.push(PortRule::new("metal-1", &["metal-1"], 0));
    let mut alt = PortRule::new("alt", &["poly"], 0);
    alt.points = vec![TechPoint::from_center(-1, -1), TechPoint::from_center(1, 1)];
    node.group.push(NodeGroupMember {
        name: "metal-1-poly-pin".into(),
        function: NodeFunction::Pin,
        ports: vec![PortRule::new("metal-1", &["metal-1", "poly"], 0), alt],
    });
    node
}

/// Metal-to-poly contact, with a cut array
fn contact_node() -> NodeDescription {
    let mut node = NodeDescription::new("metal-1-poly-contact", NodeFunction::Contact, Extent::new(4, 4));
    node.lockable = true;
    node.layers.push(full("metal-1"));
    node.layers.push(full("poly-1"));
    node.layers.push(NodeLayerRule {
        layer: "contact".into(),
        style: PolyStyle::FilledRect,
        representation: Representation::MultiCutBox(MultiCut {
            cut_x: 2,
            cut_y: 2,
            indent: 1,
            separation: 2,
        }),
        points: Vec::new(),
        message: None,
    });
    node.ports.push(PortRule::new("contact", &["metal-1", "poly"], 0));
    node
}

/// N-type transistor: horizontal poly gate over vertical diffusion
fn transistor() -> NodeDescription {
    use EdgeRule as E;
    let mut node = NodeDescription::new("n-transistor", NodeFunction::TransN, Extent::new(12, 12));
    node.size_offset = SizeOffset::new(1, 1, 1, 1);
    node.layers.push(NodeLayerRule::boxed(
        "poly-1",
        PolyStyle::FilledRect,
        TechPoint::new(E::from_low(0), E::from_center(-1)),
        TechPoint::new(E::from_high(0), E::from_center(1)),
    ));
    node.layers.push(NodeLayerRule::boxed(
        "diffusion",
        PolyStyle::FilledRect,
        TechPoint::new(E::from_center(-2), E::from_low(0)),
        TechPoint::new(E::from_center(2), E::from_high(0)),
    ));
    let port = |name: &str, arc: &str, topology: usize, angle: i64, lo: TechPoint, hi: TechPoint| PortRule {
        name: name.into(),
        arcs: vec![arc.into()],
        angle,
        range: 90,
        topology,
        points: vec![lo, hi],
    };
    node.ports = vec![
        port(
            "poly-left",
            "poly",
            0,
            180,
            TechPoint::new(E::from_low(0), E::from_center(-1)),
            TechPoint::new(E::from_low(2), E::from_center(1)),
        ),
        port(
            "diff-top",
            "diff",
            1,
            90,
            TechPoint::new(E::from_center(-2), E::from_high(-2)),
            TechPoint::new(E::from_center(2), E::from_high(0)),
        ),
        port(
            "poly-right",
            "poly",
            0,
            0,
            TechPoint::new(E::from_high(-2), E::from_center(-1)),
            TechPoint::new(E::from_high(0), E::from_center(1)),
        ),
        port(
            "diff-bottom",
            "diff",
            2,
            270,
            TechPoint::new(E::from_center(-2), E::from_low(0)),
            TechPoint::new(E::from_center(2), E::from_low(2)),
        ),
    ];
    node
}

/// Substrate tap: full metal, a fixed-size contact, and a poly triangle
fn tap() -> NodeDescription {
    use EdgeRule as E;
    let mut node = NodeDescription::new("substrate-tap", NodeFunction::Substrate, Extent::new(10, 10));
    node.layers.push(full("metal-1"));
    node.layers.push(NodeLayerRule {
        layer: "contact".into(),
        style: PolyStyle::FilledRect,
        representation: Representation::MinBox,
        points: vec![TechPoint::from_center(-1, -1), TechPoint::from_center(1, 1)],
        message: None,
    });
    node.layers.push(NodeLayerRule {
        layer: "poly-1".into(),
        style: PolyStyle::Filled,
        representation: Representation::Points,
        points: vec![
            TechPoint::lower_left(0, 0),
            TechPoint::new(E::from_high(0), E::from_low(0)),
            TechPoint::new(E::from_center(0), E::from_high(0)),
        ],
        message: None,
    });
    node
}

fn stamp(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd(year, 1, 1).and_hms(0, 0, 0)
}

fn attrs(pairs: &[(&str, AttrValue)]) -> Attrs {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}
fn role(role: Role) -> (&'static str, AttrValue) {
    (tags::ROLE, role.to_str().into())
}
fn on_layer(layer: &str) -> (&'static str, AttrValue) {
    (tags::LAYER, layer.into())
}
fn rect(x0: Int, y0: Int, x1: Int, y1: Int) -> Shape {
    Shape::Rect(Rect::new(Point::new(x0, y0), Point::new(x1, y1)))
}

/// Create a [Library] holding the single cell `name`, populated by `build`
fn one_cell<F: FnOnce(&mut ChangeList)>(name: &str, build: F) -> TechResult<(Library, CellKey)> {
    let mut lib = Library::new("scratch");
    let mut changes = ChangeList::new();
    changes.create_cell(name);
    build(&mut changes);
    lib.commit(changes)?;
    let key = lib.cell_key(name).unwrap();
    Ok((lib, key))
}

/// Highlight size of `ex`
fn size(ex: &Example) -> (Int, Int) {
    ex.highlight().unwrap().bbox.size()
}

#[test]
fn round_trip() -> TechResult<()> {
    let tech = demo_tech();
    assert!(tech.validate().is_empty());
    let uncompacted = Preferences {
        compact: false,
        ..Default::default()
    };
    for prefs in [Preferences::default(), uncompacted] {
        let (lib, report) = generate(&tech, &prefs)?;
        assert!(report.skipped.is_empty(), "{:?}", report.skipped);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert!(!report.aborted);
        // Info cell, plus one cell per entity
        assert_eq!(report.committed.len(), 1 + 5 + 3 + 4);

        let (parsed, report) = parse_library(&[&lib])?;
        assert!(report.skipped.is_empty(), "{:?}", report.skipped);
        assert_eq!(parsed.general, tech.general);
        assert_eq!(parsed.layers, tech.layers);
        assert_eq!(parsed.arcs, tech.arcs);
        for (got, want) in parsed.nodes.iter().zip(tech.nodes.iter()) {
            assert_eq!(got, want);
        }
        assert_eq!(parsed, tech);
    }
    Ok(())
}

#[test]
fn generation_is_deterministic() -> TechResult<()> {
    let tech = demo_tech();
    let (a, _) = generate(&tech, &Preferences::default())?;
    let (b, _) = generate(&tech, &Preferences::default())?;
    assert_eq!(a.attrs, b.attrs);
    let layers = a.lib_attr(tags::LAYER_SEQUENCE).and_then(AttrValue::as_list).unwrap();
    assert_eq!(layers, ["metal-1", "poly-1", "diffusion", "implant", "contact"]);
    let nodes = a.lib_attr(tags::NODE_SEQUENCE).and_then(AttrValue::as_list).unwrap();
    assert_eq!(nodes[0], "metal-1-pin");
    for key in a.cell_keys() {
        let other = b.cell_key(&a.cells[key].name).unwrap();
        let shapes = |lib: &Library, k: CellKey| -> TechResult<Vec<Shape>> {
            Ok(lib.instances(k)?.map(|(_, i)| i.shape.clone()).collect())
        };
        assert_eq!(shapes(&a, key)?, shapes(&b, other)?);
    }
    Ok(())
}

#[test]
fn two_disjoint_examples() -> TechResult<()> {
    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance("node-x", Prototype::Highlight, rect(0, 0, 10, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance(
            "node-x",
            Prototype::FilledBox,
            rect(2, 2, 8, 8),
            attrs(&[role(Role::LayerPatch), on_layer("metal-1")]),
        );
        c.create_instance("node-x", Prototype::PortMarker, rect(0, 0, 2, 2), attrs(&[role(Role::Port)]));
        c.create_instance("node-x", Prototype::Highlight, rect(20, 0, 40, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance(
            "node-x",
            Prototype::FilledBox,
            rect(20, 0, 40, 10),
            attrs(&[role(Role::LayerPatch), on_layer("metal-1")]),
        );
    })?;
    let examples = cluster(&lib, key, "node-x", true)?;
    assert_eq!(examples.len(), 2);
    assert_eq!(size(&examples[0]), (10, 10));
    assert_eq!(examples[0].samples.len(), 3);
    assert_eq!(examples[0].ports().count(), 1);
    assert_eq!(size(&examples[1]), (20, 10));
    Ok(())
}

#[test]
fn roles_are_ignored() -> TechResult<()> {
    // An untagged bar touching both examples, and a label inside the first
    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance("node-x", Prototype::Highlight, rect(0, 0, 10, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance("node-x", Prototype::Highlight, rect(20, 0, 30, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance("node-x", Prototype::Box, rect(0, -2, 30, 0), Attrs::new());
        c.create_instance(
            "node-x",
            Prototype::InvisiblePin,
            rect(5, 5, 5, 5),
            attrs(&[role(Role::Label), (tags::MESSAGE, "Function: pin".into())]),
        );
    })?;
    let examples = cluster(&lib, key, "node-x", true)?;
    assert_eq!(examples.len(), 2);
    assert!(examples.iter().all(|e| e.samples.len() == 1));
    Ok(())
}

#[test]
fn overlapping_examples_conflict() -> TechResult<()> {
    // The second example's bar reaches over the first
    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance("node-x", Prototype::Highlight, rect(0, 0, 10, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance("node-x", Prototype::Highlight, rect(-10, -10, -5, 20), attrs(&[role(Role::Highlight)]));
        c.create_instance(
            "node-x",
            Prototype::FilledBox,
            rect(-10, 15, 20, 20),
            attrs(&[role(Role::LayerPatch), on_layer("metal-1")]),
        );
    })?;
    let err = cluster(&lib, key, "node-x", true).unwrap_err();
    assert_eq!(err.structural_kind(), Some(&Structural::ClusterConflict));
    assert!(!err.is_fatal());
    Ok(())
}

#[test]
fn highlight_counts() -> TechResult<()> {
    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance(
            "node-x",
            Prototype::FilledBox,
            rect(0, 0, 10, 10),
            attrs(&[role(Role::LayerPatch), on_layer("metal-1")]),
        );
    })?;
    let err = cluster(&lib, key, "node-x", true).unwrap_err();
    assert_eq!(err.structural_kind(), Some(&Structural::MissingHighlight));

    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance("node-x", Prototype::Highlight, rect(0, 0, 10, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance("node-x", Prototype::Highlight, rect(5, 5, 15, 15), attrs(&[role(Role::Highlight)]));
    })?;
    let err = cluster(&lib, key, "node-x", true).unwrap_err();
    assert_eq!(err.structural_kind(), Some(&Structural::AmbiguousCluster));
    Ok(())
}

#[test]
fn canonical_tie_break() -> TechResult<()> {
    // Equal areas: a later example replaces the first only if further left or higher
    let cases = [
        ((0, 0), (20, 0), (0, 0)),
        ((20, 0), (0, 0), (0, 0)),
        ((0, 0), (0, 20), (0, 20)),
        ((0, 20), (0, 0), (0, 20)),
    ];
    for (first, second, want) in cases {
        let (lib, key) = one_cell("node-x", |c| {
            for (x, y) in [first, second] {
                c.create_instance(
                    "node-x",
                    Prototype::Highlight,
                    rect(x, y, x + 10, y + 10),
                    attrs(&[role(Role::Highlight)]),
                );
            }
        })?;
        let examples = cluster(&lib, key, "node-x", true)?;
        assert_eq!(examples[0].bbox.p0, Point::new(want.0, want.1));
    }
    // Smaller area always wins
    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance("node-x", Prototype::Highlight, rect(0, 0, 10, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance("node-x", Prototype::Highlight, rect(50, -50, 54, -46), attrs(&[role(Role::Highlight)]));
    })?;
    assert_eq!(size(&cluster(&lib, key, "node-x", true)?[0]), (4, 4));
    Ok(())
}

#[test]
fn grab_points_leave_bounds_alone() -> TechResult<()> {
    // The grab point is placed first, so it seeds the first example
    let (lib, key) = one_cell("node-x", |c| {
        c.create_instance("node-x", Prototype::GrabPoint, rect(8, 8, 12, 12), attrs(&[role(Role::GrabPoint)]));
        c.create_instance("node-x", Prototype::Highlight, rect(0, 0, 10, 10), attrs(&[role(Role::Highlight)]));
        c.create_instance("node-x", Prototype::Highlight, rect(30, 0, 40, 10), attrs(&[role(Role::Highlight)]));
    })?;
    let examples = cluster(&lib, key, "node-x", true)?;
    assert_eq!(examples.len(), 2);
    // Equal areas keep the first-found example
    let canonical = &examples[0];
    assert_eq!(canonical.bbox, BoundBox::from_points(Point::new(0, 0), Point::new(10, 10)));
    assert_eq!(canonical.area(), 100);
    assert!(canonical.samples.iter().any(|s| s.role == SampleRole::GrabPoint));

    // A lone grab point has no highlight
    let (lib, key) = one_cell("node-y", |c| {
        c.create_instance("node-y", Prototype::GrabPoint, rect(0, 0, 2, 2), attrs(&[role(Role::GrabPoint)]));
    })?;
    assert!(cluster(&lib, key, "node-y", true).is_err());
    Ok(())
}

#[test]
fn markers_in_arc_cells() -> TechResult<()> {
    for marker in [Role::Port, Role::GrabPoint] {
        let (lib, key) = one_cell("arc-x", |c| {
            c.create_instance("arc-x", Prototype::Highlight, rect(0, 0, 40, 4), attrs(&[role(Role::Highlight)]));
            c.create_instance("arc-x", Prototype::PortMarker, rect(0, 0, 4, 4), attrs(&[role(marker)]));
        })?;
        let err = cluster(&lib, key, "arc-x", false).unwrap_err();
        assert_eq!(
            err.structural_kind(),
            Some(&Structural::UnexpectedMarker(marker.to_str().into()))
        );
        // Parsing skips the cell, and carries on
        let (tech, report) = parse_library(&[&lib])?;
        assert!(tech.arcs.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "arc-x");
    }
    Ok(())
}

#[test]
fn legacy_patterns() -> TechResult<()> {
    let mut lib = Library::new("legacy");
    let mut changes = ChangeList::new();
    // Half-height grid on `old`, a short one on `bad`
    for (name, rows) in [("old", 8), ("bad", 5)] {
        let cell = format!("{}{}", tags::LAYER_PREFIX, name);
        changes.create_cell(&cell);
        changes.create_instance(
            &cell,
            Prototype::FilledBox,
            rect(0, 0, 10, 10),
            attrs(&[role(Role::LayerPatch), on_layer(name), (tags::FILL, "patterned".into())]),
        );
        for y in 0..rows {
            for x in 0..16 {
                let on = (x + y) % 3 == 0;
                changes.create_instance(
                    &cell,
                    Prototype::Box,
                    rect(x * 2, -10 - (y + 1) * 2, x * 2 + 2, -10 - y * 2),
                    attrs(&[role(Role::Pattern), (tags::PATTERN_ON, on.into())]),
                );
            }
        }
    }
    lib.commit(changes)?;

    let (tech, report) = parse_library(&[&lib])?;
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "layer-bad");
    let old = tech.layer("old").unwrap();
    assert_eq!(old.graphics.fill, FillStyle::Patterned);
    for y in 0..8 {
        assert_eq!(old.pattern.rows[y], old.pattern.rows[y + 8]);
        for x in 0..16 {
            assert_eq!(old.pattern.get(x, y), (x + y) % 3 == 0);
        }
    }
    Ok(())
}

#[test]
fn layer_cells_reject_markers() -> TechResult<()> {
    let tech = demo_tech();
    let (mut lib, _) = generate(&tech, &Preferences::default())?;
    let mut changes = ChangeList::new();
    changes.create_instance(
        "layer-poly-1",
        Prototype::Highlight,
        rect(0, 0, 4, 4),
        attrs(&[role(Role::Highlight)]),
    );
    lib.commit(changes)?;
    let (parsed, report) = parse_library(&[&lib])?;
    assert!(parsed.layer("poly-1").is_none());
    assert_eq!(report.skipped[0].0, "layer-poly-1");
    // References to the skipped layer are dropped with a warning
    assert!(!report.warnings.is_empty());
    Ok(())
}

/// Libraries `a` holding layers a, b and c, and `b` overriding layer b, stamped in `year`
fn sequenced(year: i32) -> TechResult<(Library, Library)> {
    let mut a = Library::new("a");
    let mut changes = ChangeList::new();
    for name in ["a", "b", "c"] {
        changes.create_cell(format!("{}{}", tags::LAYER_PREFIX, name));
    }
    changes.stamp = Some(stamp(2021));
    a.commit(changes)?;

    let mut b = Library::new("b");
    let mut changes = ChangeList::new();
    changes.create_cell(format!("{}b", tags::LAYER_PREFIX));
    changes.set_lib_attr(tags::LAYER_SEQUENCE, vec!["c".to_string(), "a".into(), "b".into()]);
    changes.stamp = Some(stamp(year));
    b.commit(changes)?;
    Ok((a, b))
}

#[test]
fn sequence_resolution() -> TechResult<()> {
    let (a, b) = sequenced(2022)?;
    let resolver = SequenceResolver::new(vec![&a, &b]);
    let explicit = resolver.explicit_order(tags::LAYER_SEQUENCE);
    let resolved = resolver.resolve(tags::LAYER_PREFIX, explicit.as_deref());
    assert_eq!(resolved.names(), ["c", "a", "b"]);
    assert!(resolved.warnings.is_empty());
    // The derived library's `b` wins
    let b_entry = resolved.entries.iter().find(|e| e.name == "b").unwrap();
    assert_eq!(b_entry.library, 1);

    // Without an explicit order: discovery order, most-derived first
    let plain = resolver.resolve(tags::LAYER_PREFIX, None);
    assert_eq!(plain.names(), ["b", "a", "c"]);

    // An overriding cell older than the one it overrides draws a warning, and nothing else changes
    let (a, b) = sequenced(2020)?;
    let resolver = SequenceResolver::new(vec![&a, &b]);
    let explicit = resolver.explicit_order(tags::LAYER_SEQUENCE);
    let resolved = resolver.resolve(tags::LAYER_PREFIX, explicit.as_deref());
    assert_eq!(resolved.names(), ["c", "a", "b"]);
    assert_eq!(resolved.warnings.len(), 1);
    Ok(())
}

#[test]
fn derived_libraries_override() -> TechResult<()> {
    let tech = demo_tech();
    let (base, _) = generate(&tech, &Preferences::default())?;

    let mut changed = tech.clone();
    changed.layer_mut("poly-1").unwrap().graphics.color = Color::new(1, 2, 3);
    let mut derived = Library::new("derived");
    let report = generate_into(&changed, &Preferences::default(), &mut derived, &[base.clone()], |name| {
        name == "layer-poly-1"
    })?;
    // Stopped at the first cell which is not the overridden layer
    assert!(report.aborted);
    assert!(report.committed.is_empty());

    let plan = generate::Generator::new(&changed, &Preferences::default()).layer_cell(&changed.layers[1])?;
    derived.commit(plan.changes)?;
    let (parsed, report) = parse_library(&[&base, &derived])?;
    assert!(report.skipped.is_empty());
    assert_eq!(parsed.layers.len(), tech.layers.len());
    assert_eq!(parsed.layer("poly-1").unwrap().graphics.color, Color::new(1, 2, 3));
    assert_eq!(parsed.layer("metal-1"), tech.layer("metal-1"));
    assert_eq!(parsed.general.description, tech.general.description);
    Ok(())
}

#[test]
fn compacted_examples_are_separated() -> TechResult<()> {
    let tech = demo_tech();
    let (lib, _) = generate(&tech, &Preferences::default())?;
    let key = lib.cell_key("node-n-transistor").unwrap();
    let examples = cluster(&lib, key, "node-n-transistor", true)?;
    assert_eq!(examples.len(), 4);
    let boxes: Vec<BoundBox> = examples.iter().map(|e| e.bbox).collect();
    for i in 0..4 {
        for j in (i + 1)..4 {
            assert!(!boxes[i].intersects(&boxes[j]));
        }
    }
    // Separation is the smallest example's short side
    let sep = 12;
    let (small, wide, tall, big) = (boxes[0], boxes[1], boxes[2], boxes[3]);
    assert_eq!(size(&examples[1]), (22, 12));
    assert_eq!(size(&examples[2]), (12, 22));
    assert_eq!(wide.p0.x - small.p1.x, sep);
    assert_eq!(small.p0.y - tall.p1.y, sep);
    assert_eq!(big.p0.x - tall.p1.x, sep);

    // Compacting again moves nothing
    let (session, _) = Session::from_technology(tech, Preferences::default())?;
    assert!(session.compact_cell("node-n-transistor")?.is_empty());
    Ok(())
}

#[test]
fn compact_after_generation() -> TechResult<()> {
    let tech = demo_tech();
    let prefs = Preferences {
        compact: false,
        ..Default::default()
    };
    let (mut session, _) = Session::from_technology(tech.clone(), prefs)?;
    let changes = session.compact_cell("node-substrate-tap")?;
    assert!(!changes.is_empty());
    session.commit(changes)?;
    let key = session.library.cell_key("node-substrate-tap").unwrap();
    let examples = cluster(&session.library, key, "node-substrate-tap", true)?;
    let all = examples.iter().fold(BoundBox::empty(), |acc, e| e.bbox.union(&acc));
    assert_eq!(all.p0.x + all.p1.x, 0);
    assert_eq!(session.reparse()?.skipped.len(), 0);
    assert_eq!(session.technology, tech);
    Ok(())
}

#[test]
fn minbox_holds_its_size() -> TechResult<()> {
    let (lib, _) = generate(&demo_tech(), &Preferences::default())?;
    let key = lib.cell_key("node-substrate-tap").unwrap();
    let examples = cluster(&lib, key, "node-substrate-tap", true)?;
    let patch = |ex: &Example, layer: &str| ex.patches().find(|(_, l)| *l == layer).map(|(s, _)| s.bbox).unwrap();
    let mut seen = 0;
    for ex in examples.iter() {
        let metal = patch(ex, "metal-1");
        let cut = patch(ex, "contact");
        assert_eq!(metal.size(), size(ex));
        assert_eq!(cut.size(), (2, 2));
        assert_eq!(cut.center(), metal.center());
        if size(ex) == (10, 10) || size(ex) == (20, 10) {
            seen += 1;
        }
    }
    assert_eq!(seen, 2);
    // Only the main example marks its fixed-size box
    let marked = examples
        .iter()
        .flat_map(|e| e.patches())
        .filter(|(s, _)| lib.inst(s.inst).ok().and_then(|i| i.attr(tags::MIN_BOX)).is_some())
        .count();
    assert_eq!(marked, 1);
    Ok(())
}

#[test]
fn multicut_variants() -> TechResult<()> {
    let (lib, _) = generate(&demo_tech(), &Preferences::default())?;
    let key = lib.cell_key("node-metal-1-poly-contact").unwrap();
    let examples = cluster(&lib, key, "node-metal-1-poly-contact", true)?;
    let cuts = |ex: &Example| {
        ex.patches()
            .filter(|(s, _)| {
                lib.inst(s.inst).ok().and_then(|i| i.attr(tags::MULTICUT)).and_then(AttrValue::as_bool) == Some(true)
            })
            .count()
    };
    let count = |w: Int, h: Int| examples.iter().find(|e| size(e) == (w, h)).map(|e| cuts(e));
    // Two-cut target: 2 * 2 + 2 * 1 + 2
    assert_eq!(count(4, 4), Some(1));
    assert_eq!(count(8, 4), Some(2));
    assert_eq!(count(4, 8), Some(2));
    assert_eq!(count(8, 8), Some(4));
    Ok(())
}

#[test]
fn topology_connectors() -> TechResult<()> {
    let (lib, _) = generate(&demo_tech(), &Preferences::default())?;
    // Transistor poly ports share a group; the pin member's two ports share another
    assert_eq!(lib.cell_named("node-n-transistor")?.connections.len(), 1);
    assert_eq!(lib.cell_named("node-metal-1-pin")?.connections.len(), 1);
    assert!(lib.cell_named("node-substrate-tap")?.connections.is_empty());

    let key = lib.cell_key("node-n-transistor").unwrap();
    let examples = cluster(&lib, key, "node-n-transistor", true)?;
    let main = &examples[0];
    let roles: Vec<Option<&str>> = main
        .ports()
        .map(|s| lib.inst(s.inst).ok().and_then(|i| i.attr(tags::GATE_ROLE)).and_then(AttrValue::as_str))
        .collect();
    assert_eq!(roles, [Some("gate"), Some("gated"), Some("gate"), Some("gated")]);
    Ok(())
}

#[test]
fn group_members_sit_aside() -> TechResult<()> {
    let (lib, _) = generate(&demo_tech(), &Preferences::default())?;
    let key = lib.cell_key("node-metal-1-pin").unwrap();
    let examples = cluster(&lib, key, "node-metal-1-pin", true)?;
    // Square: two variants, plus the member
    assert_eq!(examples.len(), 3);
    let member = examples
        .iter()
        .find(|e| {
            lib.inst(e.highlight().unwrap().inst)
                .ok()
                .and_then(|i| i.attr(tags::GROUP_MEMBER))
                .is_some()
        })
        .unwrap();
    assert_eq!(size(member), (4, 4));
    assert_eq!(member.ports().count(), 2);
    assert!(member.bbox.p0.x > examples[0].bbox.p1.x);
    assert_eq!(member.bbox.center().1, examples[0].bbox.center().1);
    Ok(())
}

#[test]
fn skipped_cells_and_rules() -> TechResult<()> {
    let mut tech = demo_tech();
    let mut ghost = NodeDescription::new("ghost", NodeFunction::Node, Extent::new(4, 4));
    ghost.layers.push(full("no-such-layer"));
    ghost.layers.push(full("metal-1"));
    ghost.ports.push(PortRule::new("ghost", &["metal-1", "elsewhere"], 0));
    tech.nodes.push(ghost);
    tech.nodes.push(NodeDescription::new("empty", NodeFunction::Node, Extent::new(4, 4)));
    assert_eq!(tech.validate().len(), 2);

    let (lib, report) = generate(&tech, &Preferences::default())?;
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "node-empty");
    assert!(report.committed.contains(&"node-ghost".to_string()));
    assert!(report.warnings.iter().any(|w| w.contains("no-such-layer")));
    assert!(lib.cell_key("node-empty").is_none());

    // The dangling rule is gone, and so is the foreign arc
    let (parsed, _) = parse_library(&[&lib])?;
    let ghost = parsed.node("ghost").unwrap();
    assert_eq!(ghost.layers.len(), 1);
    assert_eq!(ghost.ports[0].arcs, ["metal-1"]);
    Ok(())
}

#[test]
fn bad_styles_are_fatal() -> TechResult<()> {
    // Generation: a disc drawn through three points
    let mut tech = demo_tech();
    let mut node = NodeDescription::new("disc", NodeFunction::Node, Extent::new(4, 4));
    node.layers.push(NodeLayerRule {
        layer: "metal-1".into(),
        style: PolyStyle::Disc,
        representation: Representation::Points,
        points: vec![TechPoint::center(), TechPoint::lower_left(0, 0), TechPoint::upper_right(0, 0)],
        message: None,
    });
    tech.nodes.push(node);
    let mut lib = Library::new("fatal");
    let err = generate_into(&tech, &Preferences::default(), &mut lib, &[], |_| true).unwrap_err();
    assert!(matches!(err, TechError::Style { .. }));
    assert!(lib.cells.is_empty());

    // Parsing: a layer patch drawn as a grab point
    let (mut lib, _) = generate(&demo_tech(), &Preferences::default())?;
    let mut changes = ChangeList::new();
    changes.create_cell("node-odd");
    changes.create_instance("node-odd", Prototype::Highlight, rect(0, 0, 4, 4), attrs(&[role(Role::Highlight)]));
    changes.create_instance(
        "node-odd",
        Prototype::GrabPoint,
        rect(0, 0, 4, 4),
        attrs(&[role(Role::LayerPatch), on_layer("metal-1")]),
    );
    lib.commit(changes)?;
    assert!(matches!(parse_library(&[&lib]), Err(TechError::Style { .. })));
    Ok(())
}

#[test]
fn checkpoint_aborts() -> TechResult<()> {
    let tech = demo_tech();
    let mut lib = Library::new("partial");
    let mut asked = 0;
    let report = generate_into(&tech, &Preferences::default(), &mut lib, &[], |_| {
        asked += 1;
        asked <= 3
    })?;
    assert!(report.aborted);
    assert_eq!(report.committed.len(), 3);
    assert_eq!(lib.cells.len(), 3);
    assert_eq!(asked, 4);
    // Sequence arrays are only written once every cell is in
    assert!(lib.lib_attr(tags::LAYER_SEQUENCE).is_none());
    for name in report.committed.iter() {
        assert!(lib.cell_key(name).is_some());
    }
    Ok(())
}

#[test]
fn commits_are_atomic() -> TechResult<()> {
    let (mut session, _) = Session::from_technology(demo_tech(), Preferences::default())?;
    let (cells, insts) = (session.library.cells.len(), session.library.insts.len());
    let mut changes = ChangeList::new();
    changes.create_cell("scratch");
    changes.set_attr(PendingId(99), tags::COLOR, "0,0,0");
    assert!(matches!(session.commit(changes), Err(TechError::Store(_))));
    assert!(session.library.cell_key("scratch").is_none());
    assert_eq!(session.library.cells.len(), cells);
    assert_eq!(session.library.insts.len(), insts);
    Ok(())
}

/// Answers one prompt with a fixed value
struct Answer(Option<FieldValue>);
impl Prompter for Answer {
    fn prompt(&mut self, _request: &EditRequest) -> Option<FieldValue> {
        self.0.take()
    }
}

#[test]
fn color_edits_propagate() -> TechResult<()> {
    let (mut session, _) = Session::from_technology(demo_tech(), Preferences::default())?;
    let metal = EntityRef::Layer("metal-1".into());
    let mut answer = Answer(Some(FieldValue::Str("255,0,0, 0.5,off".into())));
    let changes = session.edit(&metal, "color", &mut answer)?.unwrap();
    session.commit(changes)?;

    let graphics = &session.technology.layer("metal-1").unwrap().graphics;
    assert_eq!(graphics.color, Color::new(255, 0, 0));
    assert!(!graphics.foreground);
    let mut cells = std::collections::HashSet::new();
    for key in session.library.cell_keys() {
        for (_, inst) in session.library.instances(key)? {
            if inst.attr(tags::LAYER).and_then(AttrValue::as_str) == Some("metal-1") {
                assert_eq!(inst.attr(tags::COLOR).and_then(AttrValue::as_str), Some("255,0,0"));
                cells.insert(session.library.cells[key].name.clone());
            }
        }
    }
    for name in ["layer-metal-1", "arc-metal-1", "node-metal-1-pin", "node-substrate-tap"] {
        assert!(cells.contains(name), "{} not recolored", name);
    }
    // Other layers keep theirs
    let poly = session.library.cell_named("arc-poly")?;
    for key in poly.insts.iter() {
        let inst = session.library.inst(*key)?;
        assert_ne!(inst.attr(tags::COLOR).and_then(AttrValue::as_str), Some("255,0,0"));
    }

    // The label was rewritten, so a fresh parse agrees
    let edited = session.technology.clone();
    session.reparse()?;
    assert_eq!(session.technology, edited);

    // Cancelled prompts change nothing
    let mut cancel = Answer(None);
    assert!(session.edit(&metal, "Color", &mut cancel)?.is_none());
    Ok(())
}

#[test]
fn structural_edits_regenerate() -> TechResult<()> {
    let (mut session, _) = Session::from_technology(demo_tech(), Preferences::default())?;
    let arc = EntityRef::Arc("metal-1".into());
    let changes = session.edit(&arc, "default width", &mut Answer(Some(FieldValue::Int(5))))?.unwrap();
    session.commit(changes)?;
    let key = session.library.cell_key("arc-metal-1").unwrap();
    let examples = cluster(&session.library, key, "arc-metal-1", false)?;
    assert_eq!(size(&examples[0]).1, 20);

    // Squaring a node drops its stretched variants
    let node = EntityRef::Node("n-transistor".into());
    let changes = session.edit(&node, "Square node", &mut Answer(Some(FieldValue::Bool(true))))?.unwrap();
    session.commit(changes)?;
    let key = session.library.cell_key("node-n-transistor").unwrap();
    assert_eq!(cluster(&session.library, key, "node-n-transistor", true)?.len(), 2);

    let edited = session.technology.clone();
    let report = session.reparse()?;
    assert!(report.skipped.is_empty());
    assert_eq!(session.technology, edited);

    // Values of the wrong type are refused
    let bad = session.edit(&arc, "Default width", &mut Answer(Some(FieldValue::Str("wide".into()))));
    assert!(bad.is_err());
    Ok(())
}

/// Role, layer and gate role of every instance in cell `name`, sorted
fn drawn(lib: &Library, name: &str) -> TechResult<Vec<String>> {
    let key = lib.cell_key(name).unwrap();
    let text = |v: Option<&AttrValue>| v.and_then(AttrValue::as_str).unwrap_or("").to_string();
    let mut rv: Vec<String> = lib
        .instances(key)?
        .map(|(_, i)| {
            let role = text(i.attr(tags::ROLE));
            format!("{}/{}/{}", role, text(i.attr(tags::LAYER)), text(i.attr(tags::GATE_ROLE)))
        })
        .collect();
    rv.sort();
    Ok(rv)
}

#[test]
fn function_edits_regenerate() -> TechResult<()> {
    let (mut session, _) = Session::from_technology(demo_tech(), Preferences::default())?;
    let node = EntityRef::Node("n-transistor".into());
    let changes = session.edit(&node, "Function", &mut Answer(Some(FieldValue::Choice("pin".into()))))?.unwrap();
    session.commit(changes)?;
    let diff = EntityRef::Layer("diffusion".into());
    let changes = session.edit(&diff, "Extra functions", &mut Answer(Some(FieldValue::Str("pseudo".into()))))?.unwrap();
    session.commit(changes)?;
    assert!(session.technology.layer("diffusion").unwrap().is_pseudo());

    let (fresh, _) = generate(&session.technology, &Preferences::default())?;
    for name in ["node-n-transistor", "arc-diff", "layer-diffusion"] {
        assert_eq!(drawn(&session.library, name)?, drawn(&fresh, name)?, "{} is stale", name);
    }
    // No longer a transistor, so no gate roles
    let gates = drawn(&session.library, "node-n-transistor")?;
    assert!(gates.iter().all(|d| d.ends_with('/')));
    // The pseudo-layer is no longer drawn by the arc
    let patches = drawn(&session.library, "arc-diff")?;
    assert!(!patches.iter().any(|d| d.contains("/diffusion/")));

    let edited = session.technology.clone();
    session.reparse()?;
    assert_eq!(session.technology.node("n-transistor").unwrap().function, NodeFunction::Pin);
    assert_eq!(session.technology.layer("diffusion"), edited.layer("diffusion"));
    Ok(())
}

#[test]
fn info_edits_relabel() -> TechResult<()> {
    let (mut session, _) = Session::from_technology(demo_tech(), Preferences::default())?;
    let answer = FieldValue::Float(250.0);
    let changes = session.edit(&EntityRef::Info, "scale", &mut Answer(Some(answer)))?.unwrap();
    assert_eq!(changes.len(), 1);
    session.commit(changes)?;
    session.reparse()?;
    assert_eq!(session.technology.general.scale, 250.0);
    Ok(())
}

#[test]
fn pattern_operations() -> TechResult<()> {
    let tech = demo_tech();
    let original = tech.layer("metal-1").unwrap().pattern;
    let (mut session, _) = Session::from_technology(tech, Preferences::default())?;
    assert_eq!(session.drawn_pattern("metal-1")?, original);

    // Nothing to paste yet
    assert!(session.paste_pattern("poly-1").is_err());
    assert!(session.toggle_pattern("metal-1", 16, 0).is_err());

    let changes = session.toggle_pattern("metal-1", 1, 0)?;
    assert_eq!(changes.len(), 1);
    session.commit(changes)?;
    let toggled = session.drawn_pattern("metal-1")?;
    assert_eq!(toggled.get(1, 0), !original.get(1, 0));
    assert_eq!(session.technology.layer("metal-1").unwrap().pattern, toggled);

    session.copy_pattern("metal-1")?;
    let changes = session.clear_pattern("poly-1")?;
    session.commit(changes)?;
    assert_eq!(session.drawn_pattern("poly-1")?.count(), 0);

    let changes = session.paste_pattern("poly-1")?;
    assert_eq!(changes.len() as u32, toggled.count());
    session.commit(changes)?;
    assert_eq!(session.drawn_pattern("poly-1")?, toggled);

    let changes = session.invert_pattern("poly-1")?;
    assert_eq!(changes.len(), 256);
    session.commit(changes)?;
    assert_eq!(session.drawn_pattern("poly-1")?.count(), 256 - toggled.count());

    // The technology follows the drawing
    let expected = session.technology.clone();
    session.reparse()?;
    assert_eq!(session.technology, expected);
    Ok(())
}

#[test]
fn sessions_from_libraries() -> TechResult<()> {
    let tech = demo_tech();
    let (lib, _) = generate(&tech, &Preferences::default())?;
    let (mut session, report) = Session::from_library(lib, Vec::new(), Preferences::default())?;
    assert!(report.skipped.is_empty());
    assert_eq!(session.technology, tech);
    let report = session.regenerate(|_| true)?;
    assert!(!report.aborted);
    assert_eq!(session.chain().len(), 1);
    assert_eq!(session.reparse()?.skipped.len(), 0);
    assert_eq!(session.technology, tech);
    Ok(())
}

#[test]
fn technology_markup() -> TechResult<()> {
    use tech21raw::utils::SerializationFormat;
    let tech = demo_tech();
    let yaml = SerializationFormat::Yaml.to_string(&tech)?;
    let back: Technology = SerializationFormat::Yaml.from_str(&yaml)?;
    assert_eq!(back, tech);
    // Libraries, generated or not, carry through markup too
    let (lib, _) = generate(&tech, &Preferences::default())?;
    let json = SerializationFormat::Json.to_string(&lib)?;
    let lib: Library = SerializationFormat::Json.from_str(&json)?;
    let (parsed, _) = parse_library(&[&lib])?;
    assert_eq!(parsed, tech);
    Ok(())
}

#[test]
fn sample_roles() -> TechResult<()> {
    let (lib, _) = generate(&demo_tech(), &Preferences::default())?;
    let key = lib.cell_key("arc-diff").unwrap();
    let examples = cluster(&lib, key, "arc-diff", false)?;
    assert_eq!(examples.len(), 1);
    let layers: Vec<&SampleRole> = examples[0].samples.iter().map(|s| &s.role).collect();
    assert_eq!(
        layers,
        [
            &SampleRole::LayerPatch("diffusion".into()),
            &SampleRole::LayerPatch("implant".into()),
            &SampleRole::Highlight,
        ]
    );
    // Compacted: centered, top on the origin
    let bbox = examples[0].bbox;
    assert_eq!(bbox.p1.y, 0);
    assert_eq!(bbox.p0.x + bbox.p1.x, 0);
    Ok(())
}

#[test]
fn markup_schema() -> TechResult<()> {
    let schema = technology_schema()?;
    assert!(schema.contains("\"title\": \"Technology\""));
    for field in ["multiplier", "default_width", "transparent_layer", "spacings"] {
        assert!(schema.contains(field), "schema lacks `{}`", field);
    }
    Ok(())
}

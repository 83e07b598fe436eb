//!
//! # Technology to Library Generation
//!
//! Draws each entity of a [Technology] into its own library cell:
//! layers as a color swatch plus pattern grid, arcs as a demonstration segment,
//! and nodes as a set of size-variant examples with ports.
//! Every cell also carries descriptive labels for each of its entity's fields.
//!
//! Generation never touches a [Library] directly. Each cell becomes a [CellPlan] holding
//! the [ChangeList] which creates it, and [generate_into] commits those one cell at a time.
//!

// Crates.io
use log::{debug, info, warn};

// Local imports
use crate::compact;
use crate::labels::{self, Described};
use crate::model::*;
use crate::pattern::PATTERN_SIZE;
use crate::place::{place, Geometry};
use crate::prefs::Preferences;
use crate::sequence::SequenceResolver;
use crate::tags::{self, Role};
use crate::{TechError, TechResult};
use tech21raw::utils::{EnumStr, ErrorHelper};
use tech21raw::{
    AttrValue, Attrs, BoundBox, BoundBoxTrait, ChangeList, Int, Library, PendingId, Point, Prototype, Rect, Shape,
    Translate,
};

/// Name of the cell holding entity `name` of kind `prefix`
pub fn cell_name(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

/// # Cell Plan
///
/// The changes creating one generated cell.
#[derive(Debug, Clone)]
pub struct CellPlan {
    pub name: String,
    pub changes: ChangeList,
    /// Skipped rules and other non-fatal problems
    pub warnings: Vec<String>,
}

/// # Generation Report
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    /// Cells committed, in order
    pub committed: Vec<String>,
    /// Cells not generated, each with the reason
    pub skipped: Vec<(String, String)>,
    pub warnings: Vec<String>,
    /// Set if a checkpoint stopped generation early
    pub aborted: bool,
}

/// One instance to be created
#[derive(Debug, Clone)]
struct Item {
    proto: Prototype,
    shape: Shape,
    attrs: Attrs,
    /// Index of the port rule placed, for port markers
    port: Option<usize>,
}
impl Translate for Item {
    fn translate(&mut self, v: Point) {
        self.shape.translate(v);
    }
}

/// # Cell Builder
///
/// Accumulates the instances of one cell, then lays out its labels beneath them.
struct CellBuilder<'p> {
    name: String,
    prefs: &'p Preferences,
    changes: ChangeList,
    bbox: BoundBox,
    labels: Vec<(String, String)>,
    warnings: Vec<String>,
}
impl ErrorHelper for CellBuilder<'_> {
    type Error = TechError;
    fn err(&self, msg: impl Into<String>) -> TechError {
        TechError::malformed(&self.name, msg)
    }
}
impl<'p> CellBuilder<'p> {
    fn new(name: String, prefs: &'p Preferences) -> Self {
        let mut changes = ChangeList::new();
        changes.create_cell(&name);
        Self {
            name,
            prefs,
            changes,
            bbox: BoundBox::empty(),
            labels: Vec::new(),
            warnings: Vec::new(),
        }
    }
    fn add(&mut self, item: Item) -> PendingId {
        self.bbox = item.shape.bbox().union(&self.bbox);
        self.changes.create_instance(&self.name, item.proto, item.shape, item.attrs)
    }
    /// Queue a descriptive label
    fn label(&mut self, field: &str, text: String) {
        self.labels.push((field.to_string(), text));
    }
    fn labels<D: Described>(&mut self, entity: &D) {
        for (field, text) in entity.labels() {
            self.label(field.to_str(), text);
        }
    }
    /// Record a skipped rule
    fn skip(&mut self, err: TechError) {
        warn!("{}", err);
        self.warnings.push(err.to_string());
    }
    /// Place the queued labels in a column beneath everything else, and finish
    fn finish(mut self) -> CellPlan {
        let pitch = self.prefs.label_pitch;
        let (x, mut y) = match self.bbox.is_empty() {
            true => (0, 0),
            false => (self.bbox.p0.x, self.bbox.p0.y - 2 * pitch),
        };
        for (field, text) in std::mem::take(&mut self.labels) {
            let mut attrs = Attrs::new();
            attrs.insert(tags::ROLE.into(), Role::Label.to_str().into());
            attrs.insert(tags::FIELD.into(), field.into());
            attrs.insert(tags::MESSAGE.into(), text.into());
            let pos = Point::new(x, y);
            self.changes
                .create_instance(&self.name, Prototype::InvisiblePin, Shape::Rect(Rect::new(pos, pos)), attrs);
            y -= pitch;
        }
        debug!("Planned cell `{}` with {} changes", self.name, self.changes.len());
        CellPlan {
            name: self.name,
            changes: self.changes,
            warnings: self.warnings,
        }
    }
}

/// Attributes shared by every layer patch of `layer`
pub fn patch_attrs(layer: &LayerDescription) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert(tags::ROLE.into(), Role::LayerPatch.to_str().into());
    attrs.insert(tags::LAYER.into(), layer.name.clone().into());
    attrs.insert(tags::COLOR.into(), layer.graphics.color.to_string().into());
    attrs.insert(tags::FILL.into(), layer.graphics.fill.to_str().into());
    attrs
}

/// Size-variant scale factors
fn variant_scales(square: bool) -> &'static [(Int, Int)] {
    match square {
        true => &[(1, 1), (2, 2)],
        false => &[(1, 1), (2, 1), (1, 2), (2, 2)],
    }
}

/// # Generator
///
/// Plans the cells of one [Technology], drawn per a set of [Preferences].
#[derive(Debug, Clone, Copy)]
pub struct Generator<'t> {
    pub tech: &'t Technology,
    pub prefs: &'t Preferences,
}
impl<'t> Generator<'t> {
    pub fn new(tech: &'t Technology, prefs: &'t Preferences) -> Self {
        Self { tech, prefs }
    }
    /// Plan every cell. Cells failing with a structural error are skipped and reported;
    /// a fatal error fails the whole plan, before anything is committed.
    pub fn plan(&self) -> TechResult<(Vec<CellPlan>, Vec<(String, String)>)> {
        let mut plans = Vec::new();
        let mut skipped = Vec::new();
        let mut keep = |name: String, rv: TechResult<CellPlan>| -> TechResult<()> {
            match rv {
                Ok(plan) => plans.push(plan),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping cell `{}`: {}", name, e);
                    skipped.push((name, e.to_string()));
                }
            }
            Ok(())
        };
        keep(tags::INFO_CELL.to_string(), self.info_cell())?;
        for layer in self.tech.layers.iter() {
            keep(cell_name(tags::LAYER_PREFIX, &layer.name), self.layer_cell(layer))?;
        }
        for arc in self.tech.arcs.iter() {
            keep(cell_name(tags::ARC_PREFIX, &arc.name), self.arc_cell(arc))?;
        }
        for node in self.tech.nodes.iter() {
            keep(cell_name(tags::NODE_PREFIX, &node.name), self.node_cell(node))?;
        }
        Ok((plans, skipped))
    }

    /// The general-information cell
    pub fn info_cell(&self) -> TechResult<CellPlan> {
        let mut cell = CellBuilder::new(tags::INFO_CELL.into(), self.prefs);
        cell.labels(&self.tech.general);
        if let Some(rules) = &self.tech.general.rules {
            for rule in rules.spacings.iter() {
                let (a, b) = (self.tech.layers.get(rule.first), self.tech.layers.get(rule.second));
                match (a, b) {
                    (Some(a), Some(b)) => cell.label(labels::SPACING_FIELD, labels::spacing_text(&a.name, &b.name, rule)),
                    _ => cell.skip(TechError::reference(
                        tags::INFO_CELL,
                        format!("spacing rule `{}` names unknown layer index", rule.rule),
                    )),
                }
            }
        }
        Ok(cell.finish())
    }

    /// A layer's cell: color swatch, 16x16 pattern grid, and labels
    pub fn layer_cell(&self, layer: &LayerDescription) -> TechResult<CellPlan> {
        let mut cell = CellBuilder::new(cell_name(tags::LAYER_PREFIX, &layer.name), self.prefs);
        let swatch = self.prefs.swatch_size;
        cell.add(Item {
            proto: Prototype::FilledBox,
            shape: Shape::Rect(Rect::from_size(Point::new(0, 0), swatch, swatch)),
            attrs: patch_attrs(layer),
            port: None,
        });
        let pitch = self.prefs.pattern_pitch;
        let top = -swatch;
        for y in 0..PATTERN_SIZE {
            for x in 0..PATTERN_SIZE {
                let lo = Point::new(x as Int * pitch, top - (y as Int + 1) * pitch);
                let mut attrs = Attrs::new();
                attrs.insert(tags::ROLE.into(), Role::Pattern.to_str().into());
                attrs.insert(tags::PATTERN_ON.into(), layer.pattern.get(x, y).into());
                cell.add(Item {
                    proto: Prototype::Box,
                    shape: Shape::Rect(Rect::from_size(lo, pitch, pitch)),
                    attrs,
                    port: None,
                });
            }
        }
        cell.labels(layer);
        Ok(cell.finish())
    }

    /// An arc's cell: a horizontal demonstration segment, and labels
    pub fn arc_cell(&self, arc: &ArcDescription) -> TechResult<CellPlan> {
        let mut cell = CellBuilder::new(cell_name(tags::ARC_PREFIX, &arc.name), self.prefs);
        let max_offset = arc.layers.iter().map(|l| l.width_offset).max().unwrap_or(0);
        let mut width = (4 * arc.default_width).max(2 * max_offset);
        if width <= 0 {
            width = self.prefs.arc_demo_width;
        }
        let half_len = 2 * width;

        let mut items = Vec::new();
        for rule in arc.layers.iter() {
            let layer = match self.tech.layer(&rule.layer) {
                Some(l) => l,
                None => {
                    cell.skip(TechError::reference(&arc.name, format!("unknown layer `{}`", rule.layer)));
                    continue;
                }
            };
            if layer.is_pseudo() {
                debug!("Arc `{}` skips pseudo-layer `{}`", arc.name, layer.name);
                continue;
            }
            let w = width - rule.width_offset;
            cell.assert(w > 0, format!("layer `{}` offset exceeds the arc width", rule.layer))?;
            let ext = if arc.extendable { w / 2 } else { 0 };
            let lo = Point::new(-half_len - ext, -(w / 2));
            let rect = Rect::from_size(lo, 2 * (half_len + ext), w);
            let placed = place(&cell.name, rule.style, Geometry::Rect(rect), None)?;
            let mut attrs = patch_attrs(layer);
            attrs.extend(placed.attrs);
            items.push(Item {
                proto: placed.proto,
                shape: placed.shape,
                attrs,
                port: None,
            });
        }
        let ext = if arc.extendable { width / 2 } else { 0 };
        let lo = Point::new(-half_len - ext, -(width / 2));
        items.push(highlight(Rect::from_size(lo, 2 * (half_len + ext), width)));

        // Compact as a single example
        let bbox = items.iter().fold(BoundBox::empty(), |b, i| i.shape.bbox().union(&b));
        let delta = compact::offsets(&[bbox])[0];
        for mut item in items.into_iter() {
            item.translate(delta);
            cell.add(item);
        }
        cell.labels(arc);
        Ok(cell.finish())
    }

    /// A node's cell: size-variant examples, any group members, and labels
    pub fn node_cell(&self, node: &NodeDescription) -> TechResult<CellPlan> {
        let mut cell = CellBuilder::new(cell_name(tags::NODE_PREFIX, &node.name), self.prefs);
        let main_frame = frame(node.default_size.width, node.default_size.height);

        // Evaluate each variant around the origin
        let mut variants: Vec<Vec<Item>> = Vec::new();
        for (index, (sx, sy)) in variant_scales(node.square).iter().enumerate() {
            let main = index == 0;
            let (w, h) = variant_size(node, *sx, *sy);
            if w <= 0 || h <= 0 || node.layers.is_empty() {
                cell.assert(!main, "node has no geometry at its minimum size")?;
                debug!("Node `{}` skips empty variant {}x{}", node.name, sx, sy);
                continue;
            }
            let frame = frame(w, h);
            let mut items = self.node_layers(&mut cell, node, &frame, &main_frame, main)?;
            items.extend(self.port_markers(node.function, &node.ports, &frame, main));
            items.push(highlight(frame.to_rect()));
            variants.push(items);
        }

        // Lay out along a row, then compact
        let gap = self.prefs.example_gap;
        let mut boxes = Vec::with_capacity(variants.len());
        let mut cursor: Int = 0;
        for items in variants.iter_mut() {
            let bbox = items_bbox(items);
            let delta = Point::new(cursor - bbox.p0.x, 0);
            items.iter_mut().for_each(|i| i.translate(delta));
            cursor += bbox.width() + gap;
            boxes.push(items_bbox(items));
        }
        let compactable = boxes.iter().all(|b| b.width() > 0 && b.height() > 0);
        if self.prefs.compact && compactable {
            for (items, delta) in variants.iter_mut().zip(compact::offsets(&boxes)) {
                items.iter_mut().for_each(|i| i.translate(delta));
            }
        }

        let mut arrangement = BoundBox::empty();
        let mut main_center_y = 0;
        for (index, items) in variants.into_iter().enumerate() {
            arrangement = items_bbox(&items).union(&arrangement);
            if index == 0 {
                main_center_y = footprint_center_y(&items);
            }
            self.emit(&mut cell, items, &node.ports);
        }

        // Group members, to the right at the main size
        let mut cursor = arrangement.p1.x + self.prefs.group_gap;
        for member in node.group.iter() {
            let mut items = self.node_layers(&mut cell, node, &main_frame, &main_frame, false)?;
            items.extend(self.port_markers(member.function, &member.ports, &main_frame, true));
            let mut hl = highlight(main_frame.to_rect());
            hl.attrs.insert(tags::GROUP_MEMBER.into(), member.name.clone().into());
            hl.attrs.insert(tags::FUNCTION.into(), member.function.to_str().into());
            items.push(hl);
            let bbox = items_bbox(&items);
            let delta = Point::new(cursor - bbox.p0.x, main_center_y - footprint_center_y(&items));
            items.iter_mut().for_each(|i| i.translate(delta));
            cursor += bbox.width() + self.prefs.group_gap;
            self.emit(&mut cell, items, &member.ports);
        }

        cell.labels(node);
        Ok(cell.finish())
    }

    /// Create `items`, connecting canonical ports of equal topology
    fn emit(&self, cell: &mut CellBuilder, items: Vec<Item>, rules: &[PortRule]) {
        let mut ports: Vec<(usize, PendingId)> = Vec::new();
        let mut links: Vec<(PendingId, PendingId)> = Vec::new();
        for item in items.into_iter() {
            let canonical = item.attrs.contains_key(tags::ARCS);
            let port = item.port;
            let id = cell.add(item);
            if let (Some(k), true) = (port, canonical) {
                let topology = rules[k].topology;
                if let Some((_, earlier)) = ports.iter().find(|(j, _)| rules[*j].topology == topology) {
                    links.push((id, *earlier));
                }
                ports.push((k, id));
            }
        }
        for (a, b) in links {
            cell.changes.connect(&cell.name, a, b);
        }
    }

    /// Evaluate every layer rule of `node` in `frame`
    fn node_layers(
        &self,
        cell: &mut CellBuilder,
        node: &NodeDescription,
        frame: &BoundBox,
        main_frame: &BoundBox,
        main: bool,
    ) -> TechResult<Vec<Item>> {
        let mut items = Vec::new();
        for rule in node.layers.iter() {
            let layer = match self.tech.layer(&rule.layer) {
                Some(l) => l,
                None => {
                    if main {
                        cell.skip(TechError::reference(&node.name, format!("unknown layer `{}`", rule.layer)));
                    }
                    continue;
                }
            };
            let geoms: Vec<Geometry> = match &rule.representation {
                Representation::Box => vec![Geometry::Rect(corners(cell, rule, frame)?)],
                Representation::MinBox => vec![Geometry::Rect(corners(cell, rule, main_frame)?)],
                Representation::Points => {
                    vec![Geometry::Points(rule.points.iter().map(|p| p.eval(frame)).collect())]
                }
                Representation::MultiCutBox(cut) => cuts(node, cut, frame).into_iter().map(Geometry::Rect).collect(),
            };
            for geom in geoms.into_iter() {
                let placed = place(&cell.name, rule.style, geom, rule.message.as_deref())?;
                let mut attrs = patch_attrs(layer);
                attrs.extend(placed.attrs);
                match rule.representation {
                    Representation::MinBox if main => {
                        attrs.insert(tags::MIN_BOX.into(), true.into());
                    }
                    Representation::MultiCutBox(_) => {
                        attrs.insert(tags::MULTICUT.into(), true.into());
                    }
                    _ => (),
                }
                items.push(Item {
                    proto: placed.proto,
                    shape: placed.shape,
                    attrs,
                    port: None,
                });
            }
        }
        Ok(items)
    }

    /// Port markers for `ports` in `frame`. Connection details only go on `canonical` examples.
    fn port_markers(&self, function: NodeFunction, ports: &[PortRule], frame: &BoundBox, canonical: bool) -> Vec<Item> {
        let mut items = Vec::with_capacity(ports.len());
        for (k, port) in ports.iter().enumerate() {
            let pts: Vec<Point> = port.points.iter().map(|p| p.eval(frame)).collect();
            let rect = match pts.as_slice() {
                [a, b, ..] => Rect::new(*a, *b),
                [a] => Rect::new(*a, *a),
                [] => frame.to_rect(),
            };
            let mut attrs = Attrs::new();
            attrs.insert(tags::ROLE.into(), Role::Port.to_str().into());
            attrs.insert(tags::NAME.into(), port.name.clone().into());
            if canonical {
                let arcs: Vec<String> = port
                    .arcs
                    .iter()
                    .filter(|a| match self.tech.arc(a) {
                        Some(_) => true,
                        None => {
                            warn!("Port `{}` drops arc `{}` from another technology", port.name, a);
                            false
                        }
                    })
                    .cloned()
                    .collect();
                if function.is_transistor() {
                    if let Some(role) = gate_role(self.tech, &arcs) {
                        attrs.insert(tags::GATE_ROLE.into(), role.into());
                    }
                }
                attrs.insert(tags::ARCS.into(), AttrValue::StrList(arcs));
                if port.angle != 0 {
                    attrs.insert(tags::ANGLE.into(), port.angle.into());
                }
                if port.range != 180 {
                    attrs.insert(tags::RANGE.into(), port.range.into());
                }
            }
            items.push(Item {
                proto: Prototype::PortMarker,
                shape: Shape::Rect(rect),
                attrs,
                port: Some(k),
            });
        }
        items
    }
}

/// Transistor port classification, from the first connecting arc with a gate-relevant function
fn gate_role(tech: &Technology, arcs: &[String]) -> Option<&'static str> {
    let arc = tech.arc(arcs.first()?)?;
    if arc.function.is_poly() {
        Some("gate")
    } else if arc.function.is_diffusion() {
        Some("gated")
    } else {
        None
    }
}

/// Footprint of size (`w`, `h`), centered on the origin
fn frame(w: Int, h: Int) -> BoundBox {
    Rect::centered(Point::new(0, 0), w, h).bbox()
}

/// Full footprint of `node` at scale (`sx`, `sy`).
/// Contact-cut nodes grow to hold two cuts rather than doubling.
fn variant_size(node: &NodeDescription, sx: Int, sy: Int) -> (Int, Int) {
    let content = node.content();
    let o = &node.size_offset;
    let scale = |c: Int, s: Int, cut: Option<Int>| match (s, cut) {
        (1, _) => c,
        (_, Some(cut)) => cut,
        (s, None) => c * s,
    };
    let two_cut = node.multicut().map(|m| (m.two_cut(m.cut_x), m.two_cut(m.cut_y)));
    let cw = scale(content.width, sx, two_cut.map(|t| t.0));
    let ch = scale(content.height, sy, two_cut.map(|t| t.1));
    (cw + o.lx + o.hx, ch + o.ly + o.hy)
}

/// The two-corner rectangle of a box rule, in `frame`
fn corners(cell: &CellBuilder, rule: &NodeLayerRule, frame: &BoundBox) -> TechResult<Rect> {
    match rule.points.as_slice() {
        [a, b] => Ok(Rect::new(a.eval(frame), b.eval(frame))),
        _ => cell.fail(format!("box rule on `{}` needs exactly two points", rule.layer)),
    }
}

/// Content box of `node` in `frame`
pub fn content_box(node: &NodeDescription, frame: &BoundBox) -> BoundBox {
    let o = &node.size_offset;
    BoundBox::from_points(
        Point::new(frame.p0.x + o.lx, frame.p0.y + o.ly),
        Point::new(frame.p1.x - o.hx, frame.p1.y - o.hy),
    )
}

/// Cut rectangles filling the content box of `node` in `frame`
fn cuts(node: &NodeDescription, cut: &MultiCut, frame: &BoundBox) -> Vec<Rect> {
    let content = content_box(node, frame);
    let axis = |lo: Int, hi: Int, size: Int| -> Vec<Int> {
        let region = hi - lo - 2 * cut.indent;
        let n = ((region + cut.separation) / (size + cut.separation).max(1)).max(1);
        let total = n * size + (n - 1) * cut.separation;
        let start = lo + cut.indent + (region - total) / 2;
        (0..n).map(|i| start + i * (size + cut.separation)).collect()
    };
    let xs = axis(content.p0.x, content.p1.x, cut.cut_x);
    let ys = axis(content.p0.y, content.p1.y, cut.cut_y);
    let mut rects = Vec::with_capacity(xs.len() * ys.len());
    for y in ys.iter() {
        for x in xs.iter() {
            rects.push(Rect::from_size(Point::new(*x, *y), cut.cut_x, cut.cut_y));
        }
    }
    rects
}

fn highlight(rect: Rect) -> Item {
    let mut attrs = Attrs::new();
    attrs.insert(tags::ROLE.into(), Role::Highlight.to_str().into());
    Item {
        proto: Prototype::Highlight,
        shape: Shape::Rect(rect),
        attrs,
        port: None,
    }
}

fn items_bbox(items: &[Item]) -> BoundBox {
    items.iter().fold(BoundBox::empty(), |b, i| i.shape.bbox().union(&b))
}

/// Center-y of the highlight among `items`
fn footprint_center_y(items: &[Item]) -> Int {
    items
        .iter()
        .find(|i| i.proto == Prototype::Highlight)
        .map(|i| {
            let b = i.shape.bbox();
            (b.p0.y + b.p1.y).div_euclid(2)
        })
        .unwrap_or(0)
}

/// Sequence-array changes for `tech`, resolved across `chain` (least-derived first),
/// with model order as the explicit order
pub fn sequence_changes(tech: &Technology, chain: Vec<&Library>) -> (ChangeList, Vec<String>) {
    let resolver = SequenceResolver::new(chain);
    let mut changes = ChangeList::new();
    let mut warnings = Vec::new();
    let kinds: Vec<(&str, &str, Vec<String>)> = vec![
        (
            tags::LAYER_PREFIX,
            tags::LAYER_SEQUENCE,
            tech.layers.iter().map(|l| l.name.clone()).collect(),
        ),
        (
            tags::ARC_PREFIX,
            tags::ARC_SEQUENCE,
            tech.arcs.iter().map(|a| a.name.clone()).collect(),
        ),
        (
            tags::NODE_PREFIX,
            tags::NODE_SEQUENCE,
            tech.nodes.iter().map(|n| n.name.clone()).collect(),
        ),
    ];
    for (prefix, attr, order) in kinds {
        let resolved = resolver.resolve(prefix, Some(order.as_slice()));
        warnings.extend(resolved.warnings.iter().cloned());
        changes.set_lib_attr(attr, AttrValue::StrList(resolved.names()));
    }
    changes.set_lib_attr(tags::TECHNOLOGY, tech.general.name.clone());
    (changes, warnings)
}

/// Generate `tech` into `lib`, one cell at a time.
///
/// Every cell is planned before any is committed, so a fatal error leaves `lib` untouched.
/// `checkpoint` is consulted with each cell's name before committing it; returning `false`
/// stops generation there, leaving the cells already committed in place.
/// Once every cell is in, the sequence arrays are resolved across `deps` (least-derived first) and `lib`.
pub fn generate_into<F>(
    tech: &Technology,
    prefs: &Preferences,
    lib: &mut Library,
    deps: &[Library],
    mut checkpoint: F,
) -> TechResult<GenerateReport>
where
    F: FnMut(&str) -> bool,
{
    let (plans, skipped) = Generator::new(tech, prefs).plan()?;
    let mut report = GenerateReport {
        skipped,
        ..Default::default()
    };
    for plan in plans.into_iter() {
        if !checkpoint(&plan.name) {
            info!("Generation stopped before cell `{}`", plan.name);
            report.aborted = true;
            return Ok(report);
        }
        lib.commit(plan.changes)?;
        report.warnings.extend(plan.warnings);
        report.committed.push(plan.name);
    }
    let chain: Vec<&Library> = deps.iter().chain(std::iter::once(&*lib)).collect();
    let (changes, warnings) = sequence_changes(tech, chain);
    report.warnings.extend(warnings);
    lib.commit(changes)?;
    info!(
        "Generated {} cells of technology `{}` into `{}`",
        report.committed.len(),
        tech.general.name,
        lib.name
    );
    Ok(report)
}

/// Generate `tech` into a new [Library] of the same name
pub fn generate(tech: &Technology, prefs: &Preferences) -> TechResult<(Library, GenerateReport)> {
    let mut lib = Library::new(&tech.general.name);
    let report = generate_into(tech, prefs, &mut lib, &[], |_| true)?;
    Ok((lib, report))
}

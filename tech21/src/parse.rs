//!
//! # Library to Technology Parsing
//!
//! Recovers a [Technology] from the cells of a library written by [crate::generate],
//! or edited by hand since. Parametric rules are fitted across each node's size-variant examples.
//!
//! A cell failing with a structural error is skipped and reported, as are dangling references
//! within a cell. Unplaceable polygon styles abort the whole parse.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use log::{debug, info, warn};

// Local imports
use crate::cluster::{cluster, Example, Sample};
use crate::generate::content_box;
use crate::labels::{self, Described};
use crate::model::*;
use crate::pattern::{LayerPattern, PATTERN_SIZE};
use crate::place::{shape_points, style_of, Geometry};
use crate::sequence::SequenceResolver;
use crate::tags::{self, Role};
use crate::techpoint::{fit_point, TechPoint};
use crate::{Structural, TechError, TechResult};
use tech21raw::utils::{EnumStr, ErrorHelper, Unwrapper};
use tech21raw::{AttrValue, BoundBox, CellKey, InstKey, Instance, Int, Library, Point};

/// # Parse Report
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Cells not parsed, each with the reason
    pub skipped: Vec<(String, String)>,
    /// Dropped rules and other non-fatal problems
    pub warnings: Vec<String>,
}

/// Parse the technology visible through `chain`, a list of libraries, least-derived first.
/// The most-derived library names the technology and holds its explicit entity order.
pub fn parse_library(chain: &[&Library]) -> TechResult<(Technology, ParseReport)> {
    let resolver = SequenceResolver::new(chain.to_vec());
    let target = match resolver.target() {
        Some(t) => t,
        None => return TechError::fail("no libraries to parse"),
    };
    let mut report = ParseReport::default();
    let name = target
        .lib_attr(tags::TECHNOLOGY)
        .and_then(AttrValue::as_str)
        .unwrap_or(&target.name)
        .to_string();
    let mut tech = Technology::new(GeneralDescription::new(name, 1.0));

    let layers = resolver.resolve(tags::LAYER_PREFIX, resolver.explicit_order(tags::LAYER_SEQUENCE).as_deref());
    report.warnings.extend(layers.warnings.iter().cloned());
    for entry in layers.entries.iter() {
        let lib = chain[entry.library];
        let mut cx = CellParser::new(lib, entry.cell, tags::LAYER_PREFIX, &entry.name);
        let rv = cx.layer();
        report.warnings.append(&mut cx.warnings);
        if let Some(layer) = keep(&mut report, &cx.cell_name, rv)? {
            tech.layers.push(layer);
        }
    }

    let arcs = resolver.resolve(tags::ARC_PREFIX, resolver.explicit_order(tags::ARC_SEQUENCE).as_deref());
    report.warnings.extend(arcs.warnings.iter().cloned());
    for entry in arcs.entries.iter() {
        let lib = chain[entry.library];
        let mut cx = CellParser::new(lib, entry.cell, tags::ARC_PREFIX, &entry.name);
        let rv = cx.arc(&tech);
        report.warnings.append(&mut cx.warnings);
        if let Some(arc) = keep(&mut report, &cx.cell_name, rv)? {
            tech.arcs.push(arc);
        }
    }

    let nodes = resolver.resolve(tags::NODE_PREFIX, resolver.explicit_order(tags::NODE_SEQUENCE).as_deref());
    report.warnings.extend(nodes.warnings.iter().cloned());
    for entry in nodes.entries.iter() {
        let lib = chain[entry.library];
        let mut cx = CellParser::new(lib, entry.cell, tags::NODE_PREFIX, &entry.name);
        let rv = cx.node(&tech);
        report.warnings.append(&mut cx.warnings);
        if let Some(node) = keep(&mut report, &cx.cell_name, rv)? {
            tech.nodes.push(node);
        }
    }

    // General information, from the most-derived library holding it
    match chain.iter().rev().find_map(|lib| lib.cell_key(tags::INFO_CELL).map(|k| (*lib, k))) {
        Some((lib, key)) => {
            let mut cx = CellParser::new(lib, key, "", tags::INFO_CELL);
            let rv = cx.info(&mut tech);
            report.warnings.append(&mut cx.warnings);
            keep(&mut report, tags::INFO_CELL, rv)?;
        }
        None => debug!("No `{}` cell; general information takes defaults", tags::INFO_CELL),
    }

    for problem in tech.validate() {
        warn!("{}", problem);
        report.warnings.push(problem.to_string());
    }
    info!(
        "Parsed technology `{}`: {} layers, {} arcs, {} nodes",
        tech.general.name,
        tech.layers.len(),
        tech.arcs.len(),
        tech.nodes.len()
    );
    Ok((tech, report))
}

/// Unwrap the result of parsing `cell`. Cells failing non-fatally are skipped and reported.
fn keep<T>(report: &mut ParseReport, cell: &str, rv: TechResult<T>) -> TechResult<Option<T>> {
    match rv {
        Ok(t) => Ok(Some(t)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Skipping cell `{}`: {}", cell, e);
            report.skipped.push((cell.to_string(), e.to_string()));
            Ok(None)
        }
    }
}

/// # Cell Parser
///
/// Parsing state for one cell.
struct CellParser<'l> {
    lib: &'l Library,
    key: CellKey,
    cell_name: String,
    /// Entity name, without its prefix
    name: String,
    warnings: Vec<String>,
}
impl ErrorHelper for CellParser<'_> {
    type Error = TechError;
    fn err(&self, msg: impl Into<String>) -> TechError {
        TechError::malformed(&self.cell_name, msg)
    }
}
impl<'l> CellParser<'l> {
    fn new(lib: &'l Library, key: CellKey, prefix: &str, name: &str) -> Self {
        Self {
            lib,
            key,
            cell_name: format!("{}{}", prefix, name),
            name: name.to_string(),
            warnings: Vec::new(),
        }
    }
    /// Log and record a dropped rule
    fn warn(&mut self, err: TechError) {
        warn!("{}", err);
        self.warnings.push(err.to_string());
    }
    fn inst(&self, key: InstKey) -> TechResult<&'l Instance> {
        Ok(self.lib.inst(key)?)
    }
    /// Instances of our cell, in placement order
    fn instances(&self) -> TechResult<Vec<(InstKey, &'l Instance)>> {
        Ok(self.lib.instances(self.key)?.collect())
    }
    fn role(inst: &Instance) -> Option<Role> {
        inst.attr(tags::ROLE).and_then(AttrValue::as_str).and_then(Role::from_str)
    }
    /// Text of every descriptive label, in placement order
    fn labels(&self) -> TechResult<Vec<&'l str>> {
        Ok(self
            .instances()?
            .into_iter()
            .filter(|(_, i)| Self::role(i) == Some(Role::Label))
            .filter_map(|(_, i)| i.attr(tags::MESSAGE).and_then(AttrValue::as_str))
            .collect())
    }
    /// Apply our labels to `entity`. Bad values are dropped with a warning.
    fn apply_labels<D: Described>(&mut self, entity: &mut D) -> TechResult<()> {
        for txt in self.labels()? {
            match entity.apply_label(txt) {
                Ok(true) => (),
                Ok(false) => debug!("Cell `{}` ignores label `{}`", self.cell_name, txt),
                Err(e) => {
                    let err = TechError::reference(&self.cell_name, e);
                    self.warn(err);
                }
            }
        }
        Ok(())
    }
    /// The polygon style drawn by `inst`. Unrecognized styles are fatal.
    fn style(&self, inst: &Instance) -> TechResult<PolyStyle> {
        match style_of(inst.proto, &inst.attrs) {
            Some(s) => Ok(s),
            None => Err(TechError::Style {
                entity: self.cell_name.clone(),
                style: format!("{:?}", inst.proto),
                message: "no polygon style draws this prototype".into(),
            }),
        }
    }

    /// Parse a layer cell
    fn layer(&mut self) -> TechResult<LayerDescription> {
        let mut layer = LayerDescription {
            name: self.name.clone(),
            ..Default::default()
        };
        let mut cells: Vec<(BoundBox, bool)> = Vec::new();
        for (_, inst) in self.instances()? {
            match Self::role(inst) {
                Some(Role::Pattern) => {
                    let on = inst.attr(tags::PATTERN_ON).and_then(AttrValue::as_bool).unwrap_or(false);
                    cells.push((inst.bbox(), on));
                }
                Some(Role::LayerPatch) => {
                    if let Some(fill) = inst.attr(tags::FILL).and_then(AttrValue::as_str).and_then(FillStyle::from_str) {
                        layer.graphics.fill = fill;
                    }
                }
                Some(r @ (Role::Port | Role::GrabPoint | Role::Highlight)) => {
                    return Err(TechError::structural(
                        &self.cell_name,
                        Structural::UnexpectedMarker(r.to_str().into()),
                    ));
                }
                _ => (),
            }
        }
        if cells.len() != PATTERN_SIZE * PATTERN_SIZE && cells.len() != PATTERN_SIZE * PATTERN_SIZE / 2 {
            return Err(TechError::structural(
                &self.cell_name,
                Structural::PatternCount(cells.len()),
            ));
        }
        layer.pattern = LayerPattern::from_cells(&cells).unwrapper(self, "pattern cells are not a regular grid")?;
        self.apply_labels(&mut layer)?;
        Ok(layer)
    }

    /// Parse an arc cell
    fn arc(&mut self, tech: &Technology) -> TechResult<ArcDescription> {
        let examples = cluster(self.lib, self.key, &self.cell_name, false)?;
        self.assert(examples.len() == 1, format!("expected one example, found {}", examples.len()))?;
        let ex = &examples[0];
        let width = self.frame(ex)?.height();

        let mut arc = ArcDescription::new(self.name.clone(), ArcFunction::Unknown, 0);
        for (sample, layer) in ex.patches() {
            if tech.layer(layer).is_none() {
                self.warn(TechError::reference(&self.cell_name, format!("unknown layer `{}`", layer)));
                continue;
            }
            let inst = self.inst(sample.inst)?;
            arc.layers.push(LayerRule {
                layer: layer.to_string(),
                style: self.style(inst)?,
                width_offset: width - sample.bbox.height(),
            });
        }
        self.apply_labels(&mut arc)?;
        Ok(arc)
    }

    /// Parse the general-information cell into `tech`
    fn info(&mut self, tech: &mut Technology) -> TechResult<()> {
        let mut spacings = Vec::new();
        for txt in self.labels()? {
            match labels::split_label(txt) {
                Some((field, value)) if field.eq_ignore_ascii_case(labels::SPACING_FIELD) => {
                    match labels::parse_spacing(value) {
                        Some(s) => spacings.push(s),
                        None => self.warn(TechError::reference(
                            &self.cell_name,
                            format!("invalid spacing `{}`", value),
                        )),
                    }
                }
                _ => match tech.general.apply_label(txt) {
                    Ok(_) => (),
                    Err(e) => self.warn(TechError::reference(&self.cell_name, e)),
                },
            }
        }
        for (first, second, spacing, rule) in spacings.into_iter() {
            match (tech.layer_index(&first), tech.layer_index(&second)) {
                (Some(first), Some(second)) => {
                    let rules = tech.general.rules.get_or_insert_with(|| DesignRules {
                        foundry: "none".into(),
                        spacings: Vec::new(),
                    });
                    rules.spacings.push(SpacingRule {
                        first,
                        second,
                        spacing,
                        rule,
                    });
                }
                _ => self.warn(TechError::reference(
                    &self.cell_name,
                    format!("spacing rule `{}` names unknown layer `{}` or `{}`", rule, first, second),
                )),
            }
        }
        Ok(())
    }

    /// Parse a node cell
    fn node(&mut self, tech: &Technology) -> TechResult<NodeDescription> {
        let examples = cluster(self.lib, self.key, &self.cell_name, true)?;
        let (variants, members): (Vec<&Example>, Vec<&Example>) =
            examples.iter().partition(|e| self.group_member(e).is_none());
        self.assert(
            !variants.is_empty() && std::ptr::eq(variants[0], &examples[0]),
            "canonical example is a group member",
        )?;
        let main = variants[0];
        let frames = variants.iter().map(|e| self.frame(e)).collect::<TechResult<Vec<BoundBox>>>()?;
        let size = frames[0].size();

        let mut node = NodeDescription::new(self.name.clone(), NodeFunction::Unknown, Extent::new(size.0, size.1));
        self.apply_labels(&mut node)?;
        node.layers = self.node_layers(tech, &node, &variants, &frames)?;
        node.ports = self.ports(tech, main, &variants, &frames)?;
        for member in members.into_iter() {
            let m = self.member(tech, &node, member)?;
            node.group.push(m);
        }
        Ok(node)
    }

    /// Highlight bounds of `ex`
    fn frame(&self, ex: &Example) -> TechResult<BoundBox> {
        Ok(ex.highlight().unwrapper(self, "example without a highlight")?.bbox)
    }

    /// Group-member name and function, from the highlight of `ex`
    fn group_member(&self, ex: &Example) -> Option<(String, NodeFunction)> {
        let hl = self.lib.inst(ex.highlight()?.inst).ok()?;
        let name = hl.attr(tags::GROUP_MEMBER)?.as_str()?.to_string();
        let function = hl
            .attr(tags::FUNCTION)
            .and_then(AttrValue::as_str)
            .and_then(NodeFunction::from_str)
            .unwrap_or(NodeFunction::Unknown);
        Some((name, function))
    }

    /// Layer rules, one per patch of the canonical example.
    /// Patches of each layer are matched across examples by order.
    fn node_layers(
        &mut self,
        tech: &Technology,
        node: &NodeDescription,
        variants: &[&Example],
        frames: &[BoundBox],
    ) -> TechResult<Vec<NodeLayerRule>> {
        // Per example, patches grouped by layer, cuts apart
        let grouped: Vec<HashMap<&str, Vec<&Sample>>> = variants
            .iter()
            .map(|ex| self.by_layer(ex, false))
            .collect::<TechResult<_>>()?;
        let cuts: Vec<HashMap<&str, Vec<&Sample>>> = variants
            .iter()
            .map(|ex| self.by_layer(ex, true))
            .collect::<TechResult<_>>()?;

        let mut rules = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut cut_layers: Vec<&str> = Vec::new();
        for (sample, layer) in variants[0].patches() {
            if tech.layer(layer).is_none() {
                if !seen.contains_key(layer) {
                    self.warn(TechError::reference(&self.cell_name, format!("unknown layer `{}`", layer)));
                }
                seen.insert(layer, 0);
                continue;
            }
            let inst = self.inst(sample.inst)?;
            let style = self.style(inst)?;
            let message = match style {
                PolyStyle::TextCenter | PolyStyle::TextUpperLeft | PolyStyle::TextUpperRight | PolyStyle::TextBoxed => inst
                    .attr(tags::MESSAGE)
                    .and_then(AttrValue::as_str)
                    .map(str::to_string),
                _ => None,
            };

            if is_cut(inst) {
                if cut_layers.contains(&layer) {
                    continue;
                }
                cut_layers.push(layer);
                let multicut = self.multicut(node, layer, &cuts, frames)?;
                rules.push(NodeLayerRule {
                    layer: layer.to_string(),
                    style,
                    representation: Representation::MultiCutBox(multicut),
                    points: Vec::new(),
                    message,
                });
                continue;
            }

            let index = seen.entry(layer).or_insert(0);
            let k = *index;
            *index += 1;

            if inst.attr(tags::MIN_BOX).and_then(AttrValue::as_bool) == Some(true) {
                let rect = inst.shape.as_rect().unwrapper(self, "minimum-size box is not a rectangle")?;
                let points = [rect.p0, rect.p1]
                    .iter()
                    .map(|p| self.fit(&frames[..1], &[*p], &format!("layer `{}`", layer)))
                    .collect::<TechResult<Vec<TechPoint>>>()?;
                rules.push(NodeLayerRule {
                    layer: layer.to_string(),
                    style,
                    representation: Representation::MinBox,
                    points,
                    message,
                });
                continue;
            }

            // The same patch in every example which has it
            let mut fr: Vec<BoundBox> = Vec::new();
            let mut geoms: Vec<Geometry> = Vec::new();
            for (frame, groups) in frames.iter().zip(grouped.iter()) {
                if let Some(s) = groups.get(layer).and_then(|v| v.get(k)) {
                    fr.push(*frame);
                    geoms.push(shape_points(&self.inst(s.inst)?.shape));
                }
            }
            let representation = match &geoms[0] {
                Geometry::Rect(_) => Representation::Box,
                Geometry::Points(_) => Representation::Points,
            };
            let per_example: Vec<Vec<Point>> = geoms
                .into_iter()
                .map(|g| match g {
                    Geometry::Rect(r) => vec![r.p0, r.p1],
                    Geometry::Points(p) => p,
                })
                .collect();
            let npoints = per_example[0].len();
            self.assert(
                per_example.iter().all(|p| p.len() == npoints),
                format!("examples of layer `{}` differ in point count", layer),
            )?;
            let mut points = Vec::with_capacity(npoints);
            for i in 0..npoints {
                let pts: Vec<Point> = per_example.iter().map(|p| p[i]).collect();
                points.push(self.fit(&fr, &pts, &format!("layer `{}`", layer))?);
            }
            rules.push(NodeLayerRule {
                layer: layer.to_string(),
                style,
                representation,
                points,
                message,
            });
        }
        Ok(rules)
    }

    /// Patches of `ex` by layer, either cut-array members or everything else
    fn by_layer<'e>(&self, ex: &'e Example, cuts: bool) -> TechResult<HashMap<&'e str, Vec<&'e Sample>>> {
        let mut map: HashMap<&str, Vec<&Sample>> = HashMap::new();
        for (sample, layer) in ex.patches() {
            if is_cut(self.inst(sample.inst)?) == cuts {
                map.entry(layer).or_default().push(sample);
            }
        }
        Ok(map)
    }

    /// Fit one point of `what` across `frames`
    fn fit(&self, frames: &[BoundBox], points: &[Point], what: &str) -> TechResult<TechPoint> {
        self.unwrap(
            fit_point(frames, points),
            format!("examples of {} disagree on a point", what),
        )
    }

    /// Cut-array parameters of `layer`. The cut size comes from the canonical example,
    /// the indent and separation from the first example holding two cuts side by side.
    fn multicut(
        &self,
        node: &NodeDescription,
        layer: &str,
        cuts: &[HashMap<&str, Vec<&Sample>>],
        frames: &[BoundBox],
    ) -> TechResult<MultiCut> {
        let first = self.unwrap(cuts[0].get(layer).and_then(|v| v.first()), "cut array without cuts")?;
        let (cut_x, cut_y) = first.bbox.size();
        let content = content_box(node, &frames[0]);
        let mut multicut = MultiCut {
            cut_x,
            cut_y,
            indent: first.bbox.p0.x - content.p0.x,
            separation: 0,
        };
        for (frame, groups) in frames.iter().zip(cuts.iter()) {
            let mut xs: Vec<Int> = groups
                .get(layer)
                .map(|v| v.iter().map(|s| s.bbox.p0.x).collect())
                .unwrap_or_default();
            xs.sort_unstable();
            xs.dedup();
            if xs.len() >= 2 {
                let content = content_box(node, frame);
                multicut.indent = xs[0] - content.p0.x;
                multicut.separation = xs[1] - (xs[0] + cut_x);
                break;
            }
        }
        Ok(multicut)
    }

    /// Port rules from the markers of `main`, fitted across every example naming each port
    fn ports(
        &mut self,
        tech: &Technology,
        main: &Example,
        variants: &[&Example],
        frames: &[BoundBox],
    ) -> TechResult<Vec<PortRule>> {
        let mut ports = Vec::new();
        let markers: Vec<&Sample> = main.ports().collect();
        for sample in markers.iter() {
            let inst = self.inst(sample.inst)?;
            let name = self.port_name(inst)?;
            let mut fr = Vec::new();
            let mut lo = Vec::new();
            let mut hi = Vec::new();
            for (frame, ex) in frames.iter().zip(variants.iter()) {
                for s in ex.ports() {
                    if self.port_name(self.inst(s.inst)?)? == name {
                        fr.push(*frame);
                        lo.push(s.bbox.p0);
                        hi.push(s.bbox.p1);
                        break;
                    }
                }
            }
            let what = format!("port `{}`", name);
            let points = vec![self.fit(&fr, &lo, &what)?, self.fit(&fr, &hi, &what)?];
            ports.push(self.port_rule(tech, inst, name, points));
        }
        self.topologies(&markers, &mut ports);
        Ok(ports)
    }

    fn port_name(&self, inst: &Instance) -> TechResult<String> {
        let name = inst.attr(tags::NAME).and_then(AttrValue::as_str);
        Ok(self.unwrap(name, "port marker without a name")?.to_string())
    }

    /// Port rule carried by marker `inst`
    fn port_rule(&mut self, tech: &Technology, inst: &Instance, name: String, points: Vec<TechPoint>) -> PortRule {
        let mut arcs = Vec::new();
        for arc in inst.attr(tags::ARCS).and_then(AttrValue::as_list).unwrap_or_default() {
            match tech.arc(arc) {
                Some(_) => arcs.push(arc.clone()),
                None => self.warn(TechError::reference(
                    &self.cell_name,
                    format!("port `{}` names unknown arc `{}`", name, arc),
                )),
            }
        }
        PortRule {
            name,
            arcs,
            angle: inst.attr(tags::ANGLE).and_then(AttrValue::as_int).unwrap_or(0),
            range: inst.attr(tags::RANGE).and_then(AttrValue::as_int).unwrap_or(180),
            topology: 0,
            points,
        }
    }

    /// Number the connected components among `markers`' connections, in order of first appearance
    fn topologies(&self, markers: &[&Sample], ports: &mut [PortRule]) {
        let index: HashMap<InstKey, usize> = markers.iter().enumerate().map(|(i, s)| (s.inst, i)).collect();
        let mut parent: Vec<usize> = (0..markers.len()).collect();
        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }
        if let Ok(cell) = self.lib.cell(self.key) {
            for conn in cell.connections.iter() {
                if let (Some(a), Some(b)) = (index.get(&conn.a), index.get(&conn.b)) {
                    let (ra, rb) = (root(&mut parent, *a), root(&mut parent, *b));
                    if ra != rb {
                        parent[ra.max(rb)] = ra.min(rb);
                    }
                }
            }
        }
        let mut numbers: HashMap<usize, usize> = HashMap::new();
        for (i, port) in ports.iter_mut().enumerate() {
            let r = root(&mut parent, i);
            let next = numbers.len();
            port.topology = *numbers.entry(r).or_insert(next);
        }
    }

    /// Parse group member `ex` of `node`
    fn member(&mut self, tech: &Technology, node: &NodeDescription, ex: &Example) -> TechResult<NodeGroupMember> {
        let (name, function) = self.unwrap(self.group_member(ex), "group member without a name")?;
        let frame = self.frame(ex)?;
        let markers: Vec<&Sample> = ex.ports().collect();
        let mut ports = Vec::with_capacity(markers.len());
        for sample in markers.iter() {
            let inst = self.inst(sample.inst)?;
            let port_name = self.port_name(inst)?;
            let points = match node.port(&port_name) {
                Some(p) => p.points.clone(),
                None => {
                    let what = format!("port `{}`", port_name);
                    vec![
                        self.fit(&[frame], &[sample.bbox.p0], &what)?,
                        self.fit(&[frame], &[sample.bbox.p1], &what)?,
                    ]
                }
            };
            ports.push(self.port_rule(tech, inst, port_name, points));
        }
        self.topologies(&markers, &mut ports);
        Ok(NodeGroupMember { name, function, ports })
    }
}

/// Whether `inst` is one cut of a contact-cut array
fn is_cut(inst: &Instance) -> bool {
    inst.attr(tags::MULTICUT).and_then(AttrValue::as_bool) == Some(true)
}

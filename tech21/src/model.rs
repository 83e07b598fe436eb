//!
//! # Technology Entity Model
//!
//! Structured descriptions of a fabrication technology:
//! its [LayerDescription]s, [ArcDescription]s and [NodeDescription]s,
//! plus the technology-wide [GeneralDescription].
//!

// Std-Lib
use std::collections::{BTreeSet, HashSet};

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::pattern::LayerPattern;
use crate::techpoint::TechPoint;
use crate::{Structural, TechError};
use tech21raw::utils::{enumstr, EnumStr, SerdeFile};
use tech21raw::Int;

enumstr!(
    /// # Layer Function
    #[derive(JsonSchema)]
    LayerFunction {
        Unknown: "unknown",
        Metal1: "metal-1",
        Metal2: "metal-2",
        Metal3: "metal-3",
        Metal4: "metal-4",
        Metal5: "metal-5",
        Metal6: "metal-6",
        Poly1: "poly-1",
        Poly2: "poly-2",
        Gate: "gate",
        Diff: "diffusion",
        DiffP: "p-diffusion",
        DiffN: "n-diffusion",
        Implant: "implant",
        ImplantP: "p-implant",
        ImplantN: "n-implant",
        Contact1: "contact-1",
        Contact2: "contact-2",
        Contact3: "contact-3",
        Contact4: "contact-4",
        Contact5: "contact-5",
        Well: "well",
        WellP: "p-well",
        WellN: "n-well",
        Substrate: "substrate",
        Transistor: "transistor",
        Resistor: "resistor",
        Capacitor: "capacitor",
        Guard: "guard-ring",
        Isolation: "isolation",
        Overglass: "overglass",
        Control: "control",
        Art: "art",
    }
);

enumstr!(
    /// # Extra Layer-Function Flags
    #[derive(JsonSchema)]
    LayerExtra {
        PType: "p-type",
        NType: "n-type",
        Depletion: "depletion",
        Enhancement: "enhancement",
        Light: "light",
        Heavy: "heavy",
        Pseudo: "pseudo",
        NonElectrical: "nonelectrical",
        ConnMetal: "connects-metal",
        ConnPoly: "connects-poly",
        ConnDiff: "connects-diff",
        InsideTransistor: "inside-transistor",
        Thick: "thick",
    }
);

enumstr!(
    /// # Layer Fill Style
    #[derive(JsonSchema)]
    FillStyle {
        Solid: "solid",
        Patterned: "patterned",
        PatternedOutlined: "patterned/outlined",
    }
);

enumstr!(
    /// # Arc Function
    #[derive(JsonSchema)]
    ArcFunction {
        Unknown: "unknown",
        Metal1: "metal-1",
        Metal2: "metal-2",
        Metal3: "metal-3",
        Metal4: "metal-4",
        Metal5: "metal-5",
        Metal6: "metal-6",
        Poly1: "poly-1",
        Poly2: "poly-2",
        Diff: "diffusion",
        DiffP: "p-diffusion",
        DiffN: "n-diffusion",
        DiffS: "substrate-diffusion",
        DiffW: "well-diffusion",
        Bus: "bus",
        Unrouted: "unrouted",
        NonElectrical: "nonelectrical",
    }
);
impl ArcFunction {
    pub fn is_poly(&self) -> bool {
        matches!(self, Self::Poly1 | Self::Poly2)
    }
    pub fn is_diffusion(&self) -> bool {
        matches!(
            self,
            Self::Diff | Self::DiffP | Self::DiffN | Self::DiffS | Self::DiffW
        )
    }
}

enumstr!(
    /// # Node Function
    #[derive(JsonSchema)]
    NodeFunction {
        Unknown: "unknown",
        Pin: "pin",
        Contact: "contact",
        Node: "node",
        Connect: "connect",
        TransN: "nmos-transistor",
        TransP: "pmos-transistor",
        TransDepN: "nmos-depletion-transistor",
        TransDepP: "pmos-depletion-transistor",
        TransNpn: "npn-transistor",
        TransPnp: "pnp-transistor",
        Resistor: "resistor",
        Capacitor: "capacitor",
        Diode: "diode",
        Well: "well",
        Substrate: "substrate",
        Art: "art",
    }
);
impl NodeFunction {
    pub fn is_transistor(&self) -> bool {
        matches!(
            self,
            Self::TransN | Self::TransP | Self::TransDepN | Self::TransDepP | Self::TransNpn | Self::TransPnp
        )
    }
}

enumstr!(
    /// # Polygon Style
    ///
    /// How a layer rule's geometry is drawn.
    #[derive(JsonSchema)]
    PolyStyle {
        FilledRect: "filled-rectangle",
        Filled: "filled",
        ClosedRect: "closed-rectangle",
        Closed: "closed",
        Opened: "opened",
        OpenedDotted: "opened-dotted",
        OpenedDashed: "opened-dashed",
        OpenedThicker: "opened-thicker",
        Crossed: "crossed",
        Vectors: "vectors",
        Circle: "circle",
        ThickCircle: "thick-circle",
        Disc: "disc",
        CircleArc: "circle-arc",
        ThickCircleArc: "thick-circle-arc",
        TextCenter: "text-center",
        TextUpperLeft: "text-upper-left",
        TextUpperRight: "text-upper-right",
        TextBoxed: "text-boxed",
    }
);

/// # RGB Color
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// # Layer Display Graphics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Graphics {
    pub color: Color,
    pub opacity: f64,
    /// Drawn in the foreground
    pub foreground: bool,
    /// Transparent-layer number, zero for none
    pub transparent_layer: usize,
    pub fill: FillStyle,
}
impl Default for Graphics {
    fn default() -> Self {
        Self {
            color: Color::default(),
            opacity: 1.0,
            foreground: true,
            transparent_layer: 0,
            fill: FillStyle::Solid,
        }
    }
}

/// # SPICE Parasitics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SpiceParams {
    pub resistance: f64,
    pub capacitance: f64,
    pub edge_capacitance: f64,
}

/// # Layer Description
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LayerDescription {
    pub name: String,
    pub function: LayerFunction,
    #[serde(default)]
    pub extra: BTreeSet<LayerExtra>,
    #[serde(default)]
    pub graphics: Graphics,
    #[serde(default)]
    pub pattern: LayerPattern,
    /// Foreign layer names
    #[serde(default)]
    pub cif: String,
    #[serde(default)]
    pub gds: String,
    #[serde(default)]
    pub skill: String,
    #[serde(default)]
    pub spice: SpiceParams,
    /// 3D-view height and thickness
    #[serde(default)]
    pub height3d: f64,
    #[serde(default)]
    pub thickness3d: f64,
}
impl Default for LayerFunction {
    fn default() -> Self {
        Self::Unknown
    }
}
impl LayerDescription {
    /// Pseudo-layers carry no geometry of their own; arc demonstrations skip them
    pub fn is_pseudo(&self) -> bool {
        self.extra.contains(&LayerExtra::Pseudo)
    }
}

/// # Arc Layer Rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LayerRule {
    pub layer: String,
    pub style: PolyStyle,
    /// Amount by which this layer is narrower than the arc's full width
    #[serde(default)]
    pub width_offset: Int,
}

/// # Arc Description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ArcDescription {
    pub name: String,
    pub function: ArcFunction,
    pub default_width: Int,
    #[serde(default)]
    pub fixed_angle: bool,
    #[serde(default)]
    pub extendable: bool,
    #[serde(default)]
    pub wipable: bool,
    #[serde(default)]
    pub angle_increment: i64,
    #[serde(default)]
    pub antenna_ratio: f64,
    pub layers: Vec<LayerRule>,
}
impl ArcDescription {
    pub fn new(name: impl Into<String>, function: ArcFunction, default_width: Int) -> Self {
        Self {
            name: name.into(),
            function,
            default_width,
            fixed_angle: true,
            extendable: true,
            wipable: false,
            angle_increment: 90,
            antenna_ratio: 0.0,
            layers: Vec::new(),
        }
    }
}

/// # Node Size
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Extent {
    pub width: Int,
    pub height: Int,
}
impl Extent {
    pub fn new(width: Int, height: Int) -> Self {
        Self { width, height }
    }
}

/// # Size Offset
///
/// Distances from each side of a node's full footprint in to its content box.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct SizeOffset {
    pub lx: Int,
    pub hx: Int,
    pub ly: Int,
    pub hy: Int,
}
impl SizeOffset {
    pub fn new(lx: Int, hx: Int, ly: Int, hy: Int) -> Self {
        Self { lx, hx, ly, hy }
    }
}
impl std::fmt::Display for SizeOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.lx, self.hx, self.ly, self.hy)
    }
}

/// # Contact-Cut Array Parameters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct MultiCut {
    pub cut_x: Int,
    pub cut_y: Int,
    /// Distance from the content edge to the outermost cuts
    pub indent: Int,
    /// Distance between adjacent cuts
    pub separation: Int,
}
impl MultiCut {
    /// Content size along one axis holding exactly two cuts of size `cut`
    pub fn two_cut(&self, cut: Int) -> Int {
        2 * cut + 2 * self.indent + self.separation
    }
}

/// # Node Layer Representation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub enum Representation {
    /// Two corner points, scaled with the node
    Box,
    /// Two corner points, fixed at the node's minimum size
    MinBox,
    /// Arbitrary point list
    Points,
    /// As many cuts as fit the content box
    MultiCutBox(MultiCut),
}

/// # Node Layer Rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NodeLayerRule {
    pub layer: String,
    pub style: PolyStyle,
    pub representation: Representation,
    /// Empty for [Representation::MultiCutBox]
    #[serde(default)]
    pub points: Vec<TechPoint>,
    /// Text drawn by the text styles
    #[serde(default)]
    pub message: Option<String>,
}
impl NodeLayerRule {
    /// A [Representation::Box] rule spanning `lo` to `hi`
    pub fn boxed(layer: impl Into<String>, style: PolyStyle, lo: TechPoint, hi: TechPoint) -> Self {
        Self {
            layer: layer.into(),
            style,
            representation: Representation::Box,
            points: vec![lo, hi],
            message: None,
        }
    }
    pub fn multicut(&self) -> Option<&MultiCut> {
        match &self.representation {
            Representation::MultiCutBox(m) => Some(m),
            _ => None,
        }
    }
}

/// # Port Rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PortRule {
    pub name: String,
    /// Names of the arcs which may connect here
    pub arcs: Vec<String>,
    #[serde(default)]
    pub angle: i64,
    #[serde(default = "default_range")]
    pub range: i64,
    /// Ports sharing a topology number are electrically connected
    #[serde(default)]
    pub topology: usize,
    /// Lower-left and upper-right corners of the port area
    pub points: Vec<TechPoint>,
}
fn default_range() -> i64 {
    180
}
impl PortRule {
    /// A port named `name` covering the whole footprint
    pub fn new(name: impl Into<String>, arcs: &[&str], topology: usize) -> Self {
        Self {
            name: name.into(),
            arcs: arcs.iter().map(|a| a.to_string()).collect(),
            angle: 0,
            range: 180,
            topology,
            points: vec![TechPoint::lower_left(0, 0), TechPoint::upper_right(0, 0)],
        }
    }
}

/// # Node-Group Member
///
/// An alternate node drawn with the owning node's layer rules,
/// differing only in function and ports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NodeGroupMember {
    pub name: String,
    pub function: NodeFunction,
    pub ports: Vec<PortRule>,
}

/// # Node Description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NodeDescription {
    pub name: String,
    pub function: NodeFunction,
    #[serde(default)]
    pub serpentine: bool,
    #[serde(default)]
    pub square: bool,
    /// Invisible when connected to one or two arcs
    #[serde(default)]
    pub wipes: bool,
    #[serde(default)]
    pub lockable: bool,
    /// Full footprint at the minimum size
    pub default_size: Extent,
    #[serde(default)]
    pub size_offset: SizeOffset,
    pub layers: Vec<NodeLayerRule>,
    #[serde(default)]
    pub ports: Vec<PortRule>,
    #[serde(default)]
    pub group: Vec<NodeGroupMember>,
}
impl NodeDescription {
    pub fn new(name: impl Into<String>, function: NodeFunction, default_size: Extent) -> Self {
        Self {
            name: name.into(),
            function,
            serpentine: false,
            square: false,
            wipes: false,
            lockable: false,
            default_size,
            size_offset: SizeOffset::default(),
            layers: Vec::new(),
            ports: Vec::new(),
            group: Vec::new(),
        }
    }
    /// Content size at the minimum footprint
    pub fn content(&self) -> Extent {
        let o = &self.size_offset;
        Extent::new(
            self.default_size.width - o.lx - o.hx,
            self.default_size.height - o.ly - o.hy,
        )
    }
    /// The contact-cut parameters, if any rule is a cut array
    pub fn multicut(&self) -> Option<&MultiCut> {
        self.layers.iter().find_map(|l| l.multicut())
    }
    pub fn is_multicut(&self) -> bool {
        self.multicut().is_some()
    }
    pub fn port(&self, name: &str) -> Option<&PortRule> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// # Foundry Spacing Rule
///
/// Minimum spacing between the layers at indices `first` and `second`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SpacingRule {
    pub first: usize,
    pub second: usize,
    pub spacing: f64,
    #[serde(default)]
    pub rule: String,
}

/// # Foundry Design Rules
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DesignRules {
    pub foundry: String,
    pub spacings: Vec<SpacingRule>,
}
impl DesignRules {
    /// Spacing between layer indices `a` and `b`, in either order
    pub fn spacing(&self, a: usize, b: usize) -> Option<&SpacingRule> {
        self.spacings
            .iter()
            .find(|s| (s.first, s.second) == (a, b) || (s.first, s.second) == (b, a))
    }
}

/// # General Technology Description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GeneralDescription {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Nanometers per unit
    pub scale: f64,
    #[serde(default)]
    pub min_resistance: f64,
    #[serde(default)]
    pub min_capacitance: f64,
    #[serde(default)]
    pub gate_shrinkage: f64,
    #[serde(default)]
    pub include_gate: bool,
    #[serde(default)]
    pub include_ground: bool,
    #[serde(default)]
    pub rules: Option<DesignRules>,
}
impl GeneralDescription {
    pub fn new(name: impl Into<String>, scale: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            scale,
            min_resistance: 0.0,
            min_capacitance: 0.0,
            gate_shrinkage: 0.0,
            include_gate: false,
            include_ground: false,
            rules: None,
        }
    }
}

/// # Technology
///
/// The complete structured model. Entity order is significant:
/// it becomes the order of the generated sequence arrays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Technology {
    pub general: GeneralDescription,
    #[serde(default)]
    pub layers: Vec<LayerDescription>,
    #[serde(default)]
    pub arcs: Vec<ArcDescription>,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}
impl Technology {
    pub fn new(general: GeneralDescription) -> Self {
        Self {
            general,
            layers: Vec::new(),
            arcs: Vec::new(),
            nodes: Vec::new(),
        }
    }
    pub fn layer(&self, name: &str) -> Option<&LayerDescription> {
        self.layers.iter().find(|l| l.name == name)
    }
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut LayerDescription> {
        self.layers.iter_mut().find(|l| l.name == name)
    }
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }
    pub fn arc(&self, name: &str) -> Option<&ArcDescription> {
        self.arcs.iter().find(|a| a.name == name)
    }
    pub fn arc_mut(&mut self, name: &str) -> Option<&mut ArcDescription> {
        self.arcs.iter_mut().find(|a| a.name == name)
    }
    pub fn node(&self, name: &str) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.name == name)
    }
    pub fn node_mut(&mut self, name: &str) -> Option<&mut NodeDescription> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }
    /// Check for duplicate names and dangling references.
    /// Returns every problem found, without modifying anything.
    pub fn validate(&self) -> Vec<TechError> {
        let mut errs = Vec::new();
        let mut dups = |kind: &str, names: Vec<&str>| {
            let mut seen = HashSet::new();
            for name in names {
                if !seen.insert(name) {
                    errs.push(TechError::structural(
                        format!("{}-{}", kind, name),
                        Structural::DuplicateName(name.to_string()),
                    ));
                }
            }
        };
        dups("layer", self.layers.iter().map(|l| l.name.as_str()).collect());
        dups("arc", self.arcs.iter().map(|a| a.name.as_str()).collect());
        // Group members share the node namespace
        dups(
            "node",
            self.nodes
                .iter()
                .flat_map(|n| std::iter::once(n.name.as_str()).chain(n.group.iter().map(|g| g.name.as_str())))
                .collect(),
        );

        for arc in self.arcs.iter() {
            for rule in arc.layers.iter() {
                if self.layer(&rule.layer).is_none() {
                    errs.push(TechError::reference(
                        &arc.name,
                        format!("unknown layer `{}`", rule.layer),
                    ));
                }
            }
        }
        for node in self.nodes.iter() {
            for rule in node.layers.iter() {
                if self.layer(&rule.layer).is_none() {
                    errs.push(TechError::reference(
                        &node.name,
                        format!("unknown layer `{}`", rule.layer),
                    ));
                }
            }
            let ports = node.ports.iter().chain(node.group.iter().flat_map(|g| g.ports.iter()));
            for port in ports {
                for arc in port.arcs.iter() {
                    if self.arc(arc).is_none() {
                        errs.push(TechError::reference(
                            &node.name,
                            format!("port `{}` connects unknown arc `{}`", port.name, arc),
                        ));
                    }
                }
            }
        }
        if let Some(rules) = &self.general.rules {
            for s in rules.spacings.iter() {
                if s.first >= self.layers.len() || s.second >= self.layers.len() {
                    errs.push(TechError::reference(
                        &self.general.name,
                        format!("spacing rule `{}` names unknown layer index", s.rule),
                    ));
                }
            }
        }
        errs
    }
}
impl SerdeFile for Technology {}

/// JSON schema of the [Technology] markup format
pub fn technology_schema() -> Result<String, TechError> {
    let schema = schemars::schema_for!(Technology);
    serde_json::to_string_pretty(&schema).map_err(|e| TechError::Boxed(Box::new(e)))
}

/// Parse a comma-separated list of [EnumStr] values, ignoring case
pub(crate) fn parse_enum_list<T: EnumStr + Ord>(txt: &str) -> Option<BTreeSet<T>> {
    txt.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str_nocase)
        .collect()
}

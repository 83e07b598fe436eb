//!
//! # Descriptive Labels
//!
//! Every generated cell carries `Field: value` text objects describing its entity's scalar fields.
//! The [Described] trait maps entities to and from those labels, and doubles as the
//! typed accessor behind interactive field edits.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::model::*;
use tech21raw::utils::{enumstr, EnumStr};
use tech21raw::Int;

/// # Field Kind
///
/// The type of value a field holds, with its choices if enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
    Choice(Vec<String>),
}

/// # Field Value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Choice(String),
}
impl FieldValue {
    /// Parse label text `txt` as a value of `kind`
    pub fn parse(kind: &FieldKind, txt: &str) -> Option<Self> {
        let txt = txt.trim();
        match kind {
            FieldKind::Str => Some(Self::Str(txt.to_string())),
            FieldKind::Int => txt.parse().ok().map(Self::Int),
            FieldKind::Float => txt.parse().ok().map(Self::Float),
            FieldKind::Bool => match txt.to_ascii_lowercase().as_str() {
                "yes" | "true" => Some(Self::Bool(true)),
                "no" | "false" => Some(Self::Bool(false)),
                _ => None,
            },
            FieldKind::Choice(choices) => choices
                .iter()
                .find(|c| c.eq_ignore_ascii_case(txt))
                .map(|c| Self::Choice(c.clone())),
        }
    }
    /// Whether we are a valid value of `kind`
    pub fn fits(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Self::Str(_), FieldKind::Str) => true,
            (Self::Int(_), FieldKind::Int) => true,
            (Self::Float(_), FieldKind::Float) => true,
            (Self::Bool(_), FieldKind::Bool) => true,
            (Self::Choice(c), FieldKind::Choice(choices)) => choices.contains(c),
            _ => false,
        }
    }
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Choice(s) => Some(s),
            _ => None,
        }
    }
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Str(s) | Self::Choice(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(true) => write!(f, "Yes"),
            Self::Bool(false) => write!(f, "No"),
        }
    }
}

/// Split label text into its field name and value, at the first colon
pub fn split_label(txt: &str) -> Option<(&str, &str)> {
    let (field, value) = txt.split_once(':')?;
    Some((field.trim(), value.trim()))
}

/// Label text for `field` holding `value`
pub fn label_text(field: &str, value: &FieldValue) -> String {
    format!("{}: {}", field, value)
}

///
/// # Described Entities
///
/// Entities with a fixed set of labelled scalar fields.
///
pub trait Described {
    type Field: EnumStr;

    fn kind(field: Self::Field) -> FieldKind;
    fn get(&self, field: Self::Field) -> FieldValue;
    /// Set `field` to `value`, which must fit its [FieldKind]
    fn set(&mut self, field: Self::Field, value: FieldValue) -> Result<(), String>;

    /// Every field and its label text, in declaration order
    fn labels(&self) -> Vec<(Self::Field, String)> {
        Self::Field::variants()
            .iter()
            .map(|f| (*f, label_text(f.to_str(), &self.get(*f))))
            .collect()
    }
    /// Apply label text `txt`. Returns `Ok(false)` if it names none of our fields.
    fn apply_label(&mut self, txt: &str) -> Result<bool, String> {
        let (name, value) = match split_label(txt) {
            Some(s) => s,
            None => return Ok(false),
        };
        let field = match Self::Field::from_str_nocase(name) {
            Some(f) => f,
            None => return Ok(false),
        };
        let kind = Self::kind(field);
        let value = match FieldValue::parse(&kind, value) {
            Some(v) => v,
            None => return Err(format!("invalid value `{}` for `{}`", value, field.to_str())),
        };
        self.set(field, value)?;
        Ok(true)
    }
}

/// Failure for a `value` which does not fit `field`
fn mismatch<T>(field: impl EnumStr, value: &FieldValue) -> Result<T, String> {
    Err(format!("invalid value `{}` for `{}`", value, field.to_str()))
}

/// Parse a choice-valued field into its enum
fn choice<E: EnumStr>(field: impl EnumStr, value: &FieldValue) -> Result<E, String> {
    match value.as_str().and_then(E::from_str_nocase) {
        Some(e) => Ok(e),
        None => mismatch(field, value),
    }
}

fn choices<E: EnumStr>() -> FieldKind {
    FieldKind::Choice(E::choices())
}

enumstr!(
    /// # Layer Label Fields
    LayerField {
        Function: "Function",
        Extra: "Extra functions",
        Color: "Color",
        Transparency: "Transparency",
        Style: "Style",
        Cif: "CIF Layer",
        Gds: "GDS-II Layer",
        Skill: "SKILL Layer",
        SpiceResistance: "SPICE Resistance",
        SpiceCapacitance: "SPICE Capacitance",
        SpiceEdgeCapacitance: "SPICE Edge Capacitance",
        Height: "3D Height",
        Thickness: "3D Thickness",
    }
);

/// Format [Graphics] color, opacity and foreground flag, as `r,g,b, opacity,on`
fn color_text(g: &Graphics) -> String {
    let fg = if g.foreground { "on" } else { "off" };
    format!("{}, {},{}", g.color, g.opacity, fg)
}
fn parse_color(txt: &str) -> Option<(Color, f64, bool)> {
    let parts: Vec<&str> = txt.split(',').map(str::trim).collect();
    if parts.len() != 5 {
        return None;
    }
    let color = Color::new(parts[0].parse().ok()?, parts[1].parse().ok()?, parts[2].parse().ok()?);
    let opacity = parts[3].parse().ok()?;
    let fg = match parts[4].to_ascii_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => return None,
    };
    Some((color, opacity, fg))
}
fn transparency_text(layer: usize) -> String {
    match layer {
        0 => "none".into(),
        n => format!("layer {}", n),
    }
}
fn parse_transparency(txt: &str) -> Option<usize> {
    let txt = txt.trim().to_ascii_lowercase();
    if txt == "none" {
        return Some(0);
    }
    txt.strip_prefix("layer")?.trim().parse().ok()
}

impl Described for LayerDescription {
    type Field = LayerField;
    fn kind(field: LayerField) -> FieldKind {
        use LayerField::*;
        match field {
            Function => choices::<LayerFunction>(),
            Style => choices::<FillStyle>(),
            Extra | Color | Transparency | Cif | Gds | Skill => FieldKind::Str,
            SpiceResistance | SpiceCapacitance | SpiceEdgeCapacitance | Height | Thickness => FieldKind::Float,
        }
    }
    fn get(&self, field: LayerField) -> FieldValue {
        use FieldValue::{Choice, Float, Str};
        match field {
            LayerField::Function => Choice(self.function.to_str().into()),
            LayerField::Extra => Str(self.extra.iter().map(|e| e.to_str()).collect::<Vec<_>>().join(",")),
            LayerField::Color => Str(color_text(&self.graphics)),
            LayerField::Transparency => Str(transparency_text(self.graphics.transparent_layer)),
            LayerField::Style => Choice(self.graphics.fill.to_str().into()),
            LayerField::Cif => Str(self.cif.clone()),
            LayerField::Gds => Str(self.gds.clone()),
            LayerField::Skill => Str(self.skill.clone()),
            LayerField::SpiceResistance => Float(self.spice.resistance),
            LayerField::SpiceCapacitance => Float(self.spice.capacitance),
            LayerField::SpiceEdgeCapacitance => Float(self.spice.edge_capacitance),
            LayerField::Height => Float(self.height3d),
            LayerField::Thickness => Float(self.thickness3d),
        }
    }
    fn set(&mut self, field: LayerField, value: FieldValue) -> Result<(), String> {
        if !value.fits(&Self::kind(field)) {
            return mismatch(field, &value);
        }
        let text = value.as_str().unwrap_or_default();
        let float = value.as_float().unwrap_or_default();
        match field {
            LayerField::Function => self.function = choice(field, &value)?,
            LayerField::Extra => match parse_enum_list(text) {
                Some(extra) => self.extra = extra,
                None => return mismatch(field, &value),
            },
            LayerField::Color => match parse_color(text) {
                Some((color, opacity, fg)) => {
                    self.graphics.color = color;
                    self.graphics.opacity = opacity;
                    self.graphics.foreground = fg;
                }
                None => return mismatch(field, &value),
            },
            LayerField::Transparency => match parse_transparency(text) {
                Some(t) => self.graphics.transparent_layer = t,
                None => return mismatch(field, &value),
            },
            LayerField::Style => self.graphics.fill = choice(field, &value)?,
            LayerField::Cif => self.cif = text.into(),
            LayerField::Gds => self.gds = text.into(),
            LayerField::Skill => self.skill = text.into(),
            LayerField::SpiceResistance => self.spice.resistance = float,
            LayerField::SpiceCapacitance => self.spice.capacitance = float,
            LayerField::SpiceEdgeCapacitance => self.spice.edge_capacitance = float,
            LayerField::Height => self.height3d = float,
            LayerField::Thickness => self.thickness3d = float,
        }
        Ok(())
    }
}

enumstr!(
    /// # Arc Label Fields
    ArcField {
        Function: "Function",
        DefaultWidth: "Default width",
        FixedAngle: "Fixed-angle",
        Extend: "Extend arcs",
        Wipes: "Wipes pins",
        AngleIncrement: "Angle increment",
        AntennaRatio: "Antenna ratio",
    }
);
impl Described for ArcDescription {
    type Field = ArcField;
    fn kind(field: ArcField) -> FieldKind {
        match field {
            ArcField::Function => choices::<ArcFunction>(),
            ArcField::DefaultWidth | ArcField::AngleIncrement => FieldKind::Int,
            ArcField::FixedAngle | ArcField::Extend | ArcField::Wipes => FieldKind::Bool,
            ArcField::AntennaRatio => FieldKind::Float,
        }
    }
    fn get(&self, field: ArcField) -> FieldValue {
        match field {
            ArcField::Function => FieldValue::Choice(self.function.to_str().into()),
            ArcField::DefaultWidth => FieldValue::Int(self.default_width as i64),
            ArcField::FixedAngle => FieldValue::Bool(self.fixed_angle),
            ArcField::Extend => FieldValue::Bool(self.extendable),
            ArcField::Wipes => FieldValue::Bool(self.wipable),
            ArcField::AngleIncrement => FieldValue::Int(self.angle_increment),
            ArcField::AntennaRatio => FieldValue::Float(self.antenna_ratio),
        }
    }
    fn set(&mut self, field: ArcField, value: FieldValue) -> Result<(), String> {
        if !value.fits(&Self::kind(field)) {
            return mismatch(field, &value);
        }
        let flag = value.as_bool().unwrap_or_default();
        match field {
            ArcField::Function => self.function = choice(field, &value)?,
            ArcField::DefaultWidth => self.default_width = value.as_int().unwrap_or_default() as Int,
            ArcField::FixedAngle => self.fixed_angle = flag,
            ArcField::Extend => self.extendable = flag,
            ArcField::Wipes => self.wipable = flag,
            ArcField::AngleIncrement => self.angle_increment = value.as_int().unwrap_or_default(),
            ArcField::AntennaRatio => self.antenna_ratio = value.as_float().unwrap_or_default(),
        }
        Ok(())
    }
}

enumstr!(
    /// # Node Label Fields
    NodeField {
        Function: "Function",
        Serpentine: "Serpentine transistor",
        Square: "Square node",
        Wipes: "Invisible with 1 or 2 arcs",
        Lockable: "Lockable",
        SizeOffset: "Size offset",
    }
);
fn parse_size_offset(txt: &str) -> Option<SizeOffset> {
    let parts: Vec<Int> = txt
        .split(',')
        .map(|s| s.trim().parse().ok())
        .collect::<Option<Vec<Int>>>()?;
    match parts.as_slice() {
        [lx, hx, ly, hy] => Some(SizeOffset::new(*lx, *hx, *ly, *hy)),
        _ => None,
    }
}
impl Described for NodeDescription {
    type Field = NodeField;
    fn kind(field: NodeField) -> FieldKind {
        match field {
            NodeField::Function => choices::<NodeFunction>(),
            NodeField::SizeOffset => FieldKind::Str,
            _ => FieldKind::Bool,
        }
    }
    fn get(&self, field: NodeField) -> FieldValue {
        match field {
            NodeField::Function => FieldValue::Choice(self.function.to_str().into()),
            NodeField::Serpentine => FieldValue::Bool(self.serpentine),
            NodeField::Square => FieldValue::Bool(self.square),
            NodeField::Wipes => FieldValue::Bool(self.wipes),
            NodeField::Lockable => FieldValue::Bool(self.lockable),
            NodeField::SizeOffset => FieldValue::Str(self.size_offset.to_string()),
        }
    }
    fn set(&mut self, field: NodeField, value: FieldValue) -> Result<(), String> {
        if !value.fits(&Self::kind(field)) {
            return mismatch(field, &value);
        }
        let flag = value.as_bool().unwrap_or_default();
        match field {
            NodeField::Function => self.function = choice(field, &value)?,
            NodeField::Serpentine => self.serpentine = flag,
            NodeField::Square => self.square = flag,
            NodeField::Wipes => self.wipes = flag,
            NodeField::Lockable => self.lockable = flag,
            NodeField::SizeOffset => match value.as_str().and_then(parse_size_offset) {
                Some(o) => self.size_offset = o,
                None => return mismatch(field, &value),
            },
        }
        Ok(())
    }
}

enumstr!(
    /// # General-Information Label Fields
    InfoField {
        Name: "Technology",
        Description: "Description",
        Scale: "Scale",
        MinResistance: "Minimum resistance",
        MinCapacitance: "Minimum capacitance",
        GateShrinkage: "Gate shrinkage",
        IncludeGate: "Include gate in resistance",
        IncludeGround: "Include ground",
        Foundry: "Foundry",
    }
);
/// Field name of the per-rule spacing lines in the info cell
pub const SPACING_FIELD: &str = "Spacing";

impl Described for GeneralDescription {
    type Field = InfoField;
    fn kind(field: InfoField) -> FieldKind {
        use InfoField::*;
        match field {
            Name | Description | Foundry => FieldKind::Str,
            Scale | MinResistance | MinCapacitance | GateShrinkage => FieldKind::Float,
            IncludeGate | IncludeGround => FieldKind::Bool,
        }
    }
    fn get(&self, field: InfoField) -> FieldValue {
        match field {
            InfoField::Name => FieldValue::Str(self.name.clone()),
            InfoField::Description => FieldValue::Str(self.description.clone()),
            InfoField::Scale => FieldValue::Float(self.scale),
            InfoField::MinResistance => FieldValue::Float(self.min_resistance),
            InfoField::MinCapacitance => FieldValue::Float(self.min_capacitance),
            InfoField::GateShrinkage => FieldValue::Float(self.gate_shrinkage),
            InfoField::IncludeGate => FieldValue::Bool(self.include_gate),
            InfoField::IncludeGround => FieldValue::Bool(self.include_ground),
            InfoField::Foundry => FieldValue::Str(match &self.rules {
                Some(r) => r.foundry.clone(),
                None => "none".into(),
            }),
        }
    }
    fn set(&mut self, field: InfoField, value: FieldValue) -> Result<(), String> {
        if !value.fits(&Self::kind(field)) {
            return mismatch(field, &value);
        }
        let text = value.as_str().unwrap_or_default().to_string();
        let float = value.as_float().unwrap_or_default();
        let flag = value.as_bool().unwrap_or_default();
        match field {
            InfoField::Name => self.name = text,
            InfoField::Description => self.description = text,
            InfoField::Scale => self.scale = float,
            InfoField::MinResistance => self.min_resistance = float,
            InfoField::MinCapacitance => self.min_capacitance = float,
            InfoField::GateShrinkage => self.gate_shrinkage = float,
            InfoField::IncludeGate => self.include_gate = flag,
            InfoField::IncludeGround => self.include_ground = flag,
            InfoField::Foundry => {
                if text == "none" {
                    // Rules without spacings need no foundry
                    if self.rules.as_ref().map_or(true, |r| r.spacings.is_empty()) {
                        self.rules = None;
                    }
                } else if let Some(r) = self.rules.as_mut() {
                    r.foundry = text;
                } else {
                    self.rules = Some(DesignRules {
                        foundry: text,
                        spacings: Vec::new(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Label text of one foundry spacing rule, naming its layers
pub fn spacing_text(first: &str, second: &str, rule: &SpacingRule) -> String {
    format!("{}: {}, {}, {}, {}", SPACING_FIELD, first, second, rule.spacing, rule.rule)
}

/// Parse the value of a spacing label into (first layer, second layer, spacing, rule name)
pub fn parse_spacing(value: &str) -> Option<(String, String, f64, String)> {
    let parts: Vec<&str> = value.splitn(4, ',').map(str::trim).collect();
    match parts.as_slice() {
        [a, b, s, r] => Some((a.to_string(), b.to_string(), s.parse().ok()?, r.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_labels() {
        let mut layer = LayerDescription::default();
        layer.name = "metal-1".into();
        layer.function = LayerFunction::Metal1;
        layer.graphics.color = Color::new(96, 209, 255);
        layer.graphics.opacity = 0.8;
        layer.graphics.transparent_layer = 1;
        layer.extra.insert(LayerExtra::Thick);
        layer.spice.resistance = 0.06;

        let labels: Vec<String> = layer.labels().into_iter().map(|(_, t)| t).collect();
        assert_eq!(labels[0], "Function: metal-1");
        assert_eq!(labels[1], "Extra functions: thick");
        assert_eq!(labels[2], "Color: 96,209,255, 0.8,on");
        assert_eq!(labels[3], "Transparency: layer 1");
        assert!(labels.contains(&"SPICE Resistance: 0.06".to_string()));

        let mut back = LayerDescription::default();
        back.name = "metal-1".into();
        for txt in labels.iter() {
            assert_eq!(back.apply_label(txt), Ok(true));
        }
        assert_eq!(back, layer);
    }
    #[test]
    fn labels_ignore_case_and_unknown_fields() {
        let mut arc = ArcDescription::new("m1", ArcFunction::Metal1, 3);
        assert_eq!(arc.apply_label("DEFAULT WIDTH: 7"), Ok(true));
        assert_eq!(arc.default_width, 7);
        assert_eq!(arc.apply_label("extend ARCS: no"), Ok(true));
        assert!(!arc.extendable);
        assert_eq!(arc.apply_label("Function: POLY-1"), Ok(true));
        assert_eq!(arc.function, ArcFunction::Poly1);
        assert_eq!(arc.apply_label("Colour: blue"), Ok(false));
        assert_eq!(arc.apply_label("no colon here"), Ok(false));
        assert!(arc.apply_label("Default width: wide").is_err());
    }
    #[test]
    fn typed_set_rejects_mismatches() {
        let mut node = NodeDescription::new("pin", NodeFunction::Pin, Extent::new(4, 4));
        assert!(node.set(NodeField::Square, FieldValue::Int(1)).is_err());
        assert!(node
            .set(NodeField::Function, FieldValue::Choice("flux-capacitor".into()))
            .is_err());
        node.set(NodeField::SizeOffset, FieldValue::Str("1,1,2,2".into())).unwrap();
        assert_eq!(node.size_offset, SizeOffset::new(1, 1, 2, 2));
        assert_eq!(node.get(NodeField::Square).to_string(), "No");
    }
    #[test]
    fn info_labels() {
        let mut general = GeneralDescription::new("demo", 100.0);
        general.rules = Some(DesignRules {
            foundry: "MOSIS".into(),
            spacings: Vec::new(),
        });
        let mut back = GeneralDescription::new("", 0.0);
        for (_, txt) in general.labels() {
            assert_eq!(back.apply_label(&txt), Ok(true));
        }
        assert_eq!(back, general);
        let rule = SpacingRule {
            first: 0,
            second: 1,
            spacing: 1.5,
            rule: "M1.S.1".into(),
        };
        let txt = spacing_text("metal-1", "metal-2", &rule);
        let (_, value) = split_label(&txt).unwrap();
        assert_eq!(
            parse_spacing(value),
            Some(("metal-1".into(), "metal-2".into(), 1.5, "M1.S.1".into()))
        );
    }
}

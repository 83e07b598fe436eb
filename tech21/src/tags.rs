//!
//! # Instance Attribute Keys and Roles
//!
//! The attribute vocabulary shared by generation and parsing.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use tech21raw::utils::enumstr;

/// Role of an instance within a generated cell. See [Role].
pub const ROLE: &str = "role";
/// Layer name, on layer patches
pub const LAYER: &str = "layer";
/// Layer color as `r,g,b`, on layer patches
pub const COLOR: &str = "color";
/// Layer fill style, on layer patches
pub const FILL: &str = "fill";
/// On/off state of one layer-pattern cell
pub const PATTERN_ON: &str = "pattern_on";
/// Port name, on port markers
pub const NAME: &str = "name";
/// Connectable arc names, on canonical port markers
pub const ARCS: &str = "arcs";
pub const ANGLE: &str = "angle";
pub const RANGE: &str = "range";
/// `gate` or `gated`, on transistor port markers
pub const GATE_ROLE: &str = "gate_role";
/// Label field name, on descriptive text
pub const FIELD: &str = "field";
/// Text content, on descriptive labels and text-style patches
pub const MESSAGE: &str = "message";
/// Text anchor, on text-style patches
pub const ANCHOR: &str = "anchor";
/// Marks a fixed-size patch in the main example
pub const MIN_BOX: &str = "min_box";
/// Marks one cut of a contact-cut array
pub const MULTICUT: &str = "multicut";
/// Group-member name, on member highlights
pub const GROUP_MEMBER: &str = "group_member";
/// Group-member node function, on member highlights
pub const FUNCTION: &str = "function";
/// Start and extent angles in degrees, on circular arcs
pub const ARC_START: &str = "arc_start";
pub const ARC_EXTENT: &str = "arc_extent";

/// Library attribute naming the technology
pub const TECHNOLOGY: &str = "technology";
pub const LAYER_SEQUENCE: &str = "layer_sequence";
pub const ARC_SEQUENCE: &str = "arc_sequence";
pub const NODE_SEQUENCE: &str = "node_sequence";

/// Cell-name prefixes
pub const LAYER_PREFIX: &str = "layer-";
pub const ARC_PREFIX: &str = "arc-";
pub const NODE_PREFIX: &str = "node-";
/// Name of the general-information cell
pub const INFO_CELL: &str = "factors";

enumstr!(
    /// # Instance Role
    ///
    /// Value of the [ROLE] attribute.
    Role {
        LayerPatch: "layer-patch",
        Port: "port",
        GrabPoint: "grab-point",
        Highlight: "highlight",
        Pattern: "pattern",
        Label: "label",
    }
);

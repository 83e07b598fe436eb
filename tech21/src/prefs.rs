//!
//! # Rendering Preferences
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use tech21raw::utils::SerdeFile;
use tech21raw::Int;

/// # Preferences
///
/// Sizes and spacings used when drawing generated cells.
/// Missing entries of a preferences file take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// Edge length of one layer-pattern cell
    pub pattern_pitch: Int,
    /// Edge length of a layer cell's color swatch
    pub swatch_size: Int,
    /// Vertical distance between descriptive labels
    pub label_pitch: Int,
    /// Arc demonstration width, where an arc's own rules give none
    pub arc_demo_width: Int,
    /// Space between node examples before compaction
    pub example_gap: Int,
    /// Space between a node's examples and its group members
    pub group_gap: Int,
    /// Compact node examples
    pub compact: bool,
}
impl Default for Preferences {
    fn default() -> Self {
        Self {
            pattern_pitch: 2,
            swatch_size: 10,
            label_pitch: 6,
            arc_demo_width: 10,
            example_gap: 20,
            group_gap: 20,
            compact: true,
        }
    }
}
impl SerdeFile for Preferences {}

#[cfg(test)]
mod tests {
    use super::*;
    use tech21raw::utils::SerializationFormat;

    #[test]
    fn partial_files_take_defaults() {
        let prefs: Preferences = SerializationFormat::Toml
            .from_str("pattern_pitch = 4\ncompact = false\n")
            .unwrap();
        assert_eq!(prefs.pattern_pitch, 4);
        assert!(!prefs.compact);
        assert_eq!(prefs.swatch_size, Preferences::default().swatch_size);
    }
}

//!
//! # Tech21 Converters
//!
//! File-level conversions between technology markup and library markup.
//! The core logic for the `tech2lib` and `lib2tech` programs.
//!

pub mod lib2tech;
pub mod tech2lib;

/// Load each of the dependency libraries at `paths`, least-derived first
pub(crate) fn load_deps(paths: &[String]) -> Result<Vec<tech21raw::Library>, tech21utils::Error> {
    use tech21utils::SerdeFile;
    paths.iter().map(tech21raw::Library::load).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use tech21::*;

    /// A small technology: one layer, one arc, one pin
    pub fn tiny_tech() -> Technology {
        let mut tech = Technology::new(GeneralDescription::new("tiny", 100.0));
        tech.layers.push(LayerDescription {
            name: "metal-1".into(),
            function: LayerFunction::Metal1,
            ..Default::default()
        });
        let mut arc = ArcDescription::new("metal-1", ArcFunction::Metal1, 3);
        arc.layers.push(LayerRule {
            layer: "metal-1".into(),
            style: PolyStyle::FilledRect,
            width_offset: 0,
        });
        tech.arcs.push(arc);
        let mut pin = NodeDescription::new("metal-1-pin", NodeFunction::Pin, Extent::new(4, 4));
        pin.layers.push(NodeLayerRule::boxed(
            "metal-1",
            PolyStyle::FilledRect,
            TechPoint::lower_left(0, 0),
            TechPoint::upper_right(0, 0),
        ));
        pin.ports.push(PortRule::new("metal-1", &["metal-1"], 0));
        tech.nodes.push(pin);
        tech
    }

    /// Path of scratch file `fname`, in the system temporary directory
    pub fn scratch(fname: &str) -> String {
        let path = std::env::temp_dir().join(format!("tech21converters_{}", fname));
        path.to_string_lossy().into_owned()
    }
}

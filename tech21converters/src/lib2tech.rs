//!
//! # Library to Technology Conversion
//!

// Std-Lib
use std::error::Error;

// Crates.io
use log::{info, warn};

// Local imports
use tech21::{parse_library, technology_schema, ParseReport};
use tech21raw::Library;
use tech21utils::SerdeFile;

/// # Library to Technology Options
#[derive(Debug, Clone, Default)]
pub struct ToTechOptions {
    /// Library input file
    pub lib: String,
    /// Technology output file
    pub out: String,
    /// Dependency library files, least-derived first
    pub deps: Vec<String>,
    /// Write the technology markup schema instead
    pub schema: bool,
    pub verbose: bool,
}

/// Parse the library at `options.lib`, atop its dependencies, into a technology file at `options.out`.
/// Returns `None` when writing the schema.
pub fn convert(options: &ToTechOptions) -> Result<Option<ParseReport>, Box<dyn Error>> {
    if options.schema {
        std::fs::write(&options.out, technology_schema()?)?;
        info!("Wrote technology schema to {:?}", &options.out);
        return Ok(None);
    }
    let lib = Library::load(&options.lib)?;
    let deps = crate::load_deps(&options.deps)?;
    let chain: Vec<&Library> = deps.iter().chain(std::iter::once(&lib)).collect();

    let (tech, report) = parse_library(&chain)?;
    for (cell, why) in report.skipped.iter() {
        warn!("Skipped cell `{}`: {}", cell, why);
    }
    tech.save_as(&options.out)?;
    if options.verbose {
        println!("wrote {:?}", &options.out);
    }
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech2lib::{self, ToLibOptions};
    use crate::testing::{scratch, tiny_tech};
    use tech21::Technology;

    #[test]
    fn round_trips_through_files() -> Result<(), Box<dyn Error>> {
        let tech = tiny_tech();
        let tech_path = scratch("lib2tech_in.json");
        tech.save_as(&tech_path)?;
        let lib_path = scratch("lib2tech_lib.yaml");
        tech2lib::convert(&ToLibOptions {
            tech: tech_path,
            out: lib_path.clone(),
            ..Default::default()
        })?;

        let options = ToTechOptions {
            lib: lib_path,
            out: scratch("lib2tech_out.yaml"),
            ..Default::default()
        };
        let report = convert(&options)?.unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(Technology::load(&options.out)?, tech);
        Ok(())
    }
    #[test]
    fn writes_schema() -> Result<(), Box<dyn Error>> {
        let options = ToTechOptions {
            out: scratch("schema.json"),
            schema: true,
            ..Default::default()
        };
        assert!(convert(&options)?.is_none());
        let text = std::fs::read_to_string(&options.out)?;
        assert!(text.contains("\"Technology\""));
        Ok(())
    }
}

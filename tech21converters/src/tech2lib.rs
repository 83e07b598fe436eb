//!
//! # Technology to Library Conversion
//!

// Std-Lib
use std::error::Error;

// Crates.io
use log::{info, warn};

// Local imports
use tech21::{generate_into, GenerateReport, Preferences, Technology};
use tech21raw::Library;
use tech21utils::SerdeFile;

/// # Technology to Library Options
///
/// Mirrors the `tech2lib` program's command-line options, without the `clap` annotations.
#[derive(Debug, Clone, Default)]
pub struct ToLibOptions {
    /// Technology input file
    pub tech: String,
    /// Library output file
    pub out: String,
    /// Rendering preferences file. Defaults apply when empty.
    pub prefs: String,
    /// Dependency library files, least-derived first
    pub deps: Vec<String>,
    pub verbose: bool,
}

/// Generate the technology at `options.tech` into a new library file at `options.out`
pub fn convert(options: &ToLibOptions) -> Result<GenerateReport, Box<dyn Error>> {
    let tech = Technology::load(&options.tech)?;
    let prefs = match options.prefs.is_empty() {
        true => Preferences::default(),
        false => Preferences::load(&options.prefs)?,
    };
    let deps = crate::load_deps(&options.deps)?;

    let mut lib = Library::new(&tech.general.name);
    let report = generate_into(&tech, &prefs, &mut lib, &deps, |_| true)?;
    for (cell, why) in report.skipped.iter() {
        warn!("Skipped cell `{}`: {}", cell, why);
    }
    lib.save_as(&options.out)?;
    info!("Wrote {} cells to {:?}", lib.cells.len(), &options.out);
    if options.verbose {
        println!("wrote {:?}", &options.out);
    }
    Ok(report)
}

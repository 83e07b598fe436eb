//!
//! # Technology to Library Conversion CLI
//!
//! Draws a technology markup file into an editable library of cells.
//!

use clap::Parser;
use std::error::Error;

// Use our own crate, note by name, not `crate::` or `super::`.
use tech21converters::tech2lib::{convert, ToLibOptions};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// Technology to Library Converter
#[derive(Parser)]
struct ProgramOptions {
    /// Technology Input File (json, yaml, or toml)
    #[clap(short = 'i', long, default_value = "")]
    tech: String,
    /// Library Output File
    #[clap(short = 'o', long, default_value = "")]
    out: String,
    /// Rendering Preferences File
    #[clap(short = 'p', long, default_value = "")]
    prefs: String,
    /// Dependency Library Files, least-derived first
    #[clap(short = 'd', long = "dep")]
    deps: Vec<String>,
    /// Verbose Output Mode
    #[clap(short, long)]
    verbose: bool,
}
impl From<&ProgramOptions> for ToLibOptions {
    fn from(p: &ProgramOptions) -> Self {
        Self {
            tech: p.tech.clone(),
            out: p.out.clone(),
            prefs: p.prefs.clone(),
            deps: p.deps.clone(),
            verbose: p.verbose,
        }
    }
}

/// The main entry point.
/// All logic is offloaded to `_main` for sake of testing.
fn main() -> Result<(), Box<dyn Error>> {
    let options = ProgramOptions::parse();
    _main(&options)
}

/// All the real logic, with `ProgramOptions` argument for sake of testing
fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let level = if options.verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();

    let report = convert(&options.into())?;
    if options.verbose {
        println!(
            "{} cells generated, {} skipped, {} warnings",
            report.committed.len(),
            report.skipped.len(),
            report.warnings.len()
        );
    }
    Ok(())
}

//!
//! # Library to Technology Conversion CLI
//!
//! Reads a technology back out of a library of cells, and its dependencies.
//!

use clap::Parser;
use std::error::Error;

use tech21converters::lib2tech::{convert, ToTechOptions};

/// Library to Technology Converter
#[derive(Parser)]
struct ProgramOptions {
    /// Library Input File
    #[clap(short = 'i', long, default_value = "")]
    lib: String,
    /// Technology Output File
    #[clap(short = 'o', long, default_value = "")]
    out: String,
    /// Dependency Library Files, least-derived first
    #[clap(short = 'd', long = "dep")]
    deps: Vec<String>,
    /// Write the technology JSON schema to the output file, and exit
    #[clap(long)]
    schema: bool,
    /// Verbose Output Mode
    #[clap(short, long)]
    verbose: bool,
}
impl From<&ProgramOptions> for ToTechOptions {
    fn from(p: &ProgramOptions) -> Self {
        Self {
            lib: p.lib.clone(),
            out: p.out.clone(),
            deps: p.deps.clone(),
            schema: p.schema,
            verbose: p.verbose,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let options = ProgramOptions::parse();
    _main(&options)
}

fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let level = if options.verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();

    if let Some(report) = convert(&options.into())? {
        if options.verbose {
            for w in report.warnings.iter() {
                println!("warning: {}", w);
            }
        }
    }
    Ok(())
}

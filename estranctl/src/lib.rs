//! Library part of the `estranctl` utility.
//!
//! The binary is a thin dispatcher.  Everything below the command line
//! lives in the domain crates: `formats` for file parsing, `sources`
//! for the network clients, `tides` and `currents` for the
//! computations.  This crate only glues them to `clap` options and
//! decides where output goes.
//!

use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use eyre::Result;

use estran_sources::Sources;

/// Re-export
///
pub use cli::*;
pub use cmds::*;

mod cli;
mod cmds;

/// Everything the online commands need, loaded once at startup.
///
#[derive(Debug)]
pub struct Context {
    /// Configured sources
    pub sources: Sources,
    /// Cache directory, created on first use
    pub cache: PathBuf,
}

impl Context {
    /// Load the sources file and settle the cache directory.  On a
    /// fresh install the bundled defaults are written out first.
    ///
    pub fn load(config: &Option<PathBuf>) -> Result<Self> {
        if config.is_none() {
            let def = Sources::default_file()?;
            if !def.exists() {
                if let Some(dir) = def.parent() {
                    Sources::install_defaults(dir)?;
                }
            }
        }
        let sources = Sources::load(config)?;
        let cache = cache_dir()?;
        if !cache.exists() {
            fs::create_dir_all(&cache)?;
        }
        Ok(Context { sources, cache })
    }
}

/// Where all the caches go (`hdm.json`, `spm.json`, GRIB files, ...).
///
pub fn cache_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().ok_or_else(|| eyre::eyre!("no base directories"))?;
    Ok(base.cache_dir().join("estran"))
}

/// Text result of a command, to the output file or stdout.
///
pub fn write_output(output: &Option<PathBuf>, text: &str) -> Result<()> {
    match output {
        Some(fname) => fs::write(fname, text)?,
        _ => println!("{}", text),
    }
    Ok(())
}

/// Display our version.
///
pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

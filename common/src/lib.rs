//! This library is there to share some common code amongst all estran modules.
//!

mod angle;
mod cache;
mod config;
mod daterange;
mod hour;
mod location;
mod logging;
mod macros;

use clap::{crate_name, crate_version};
pub use angle::*;
pub use cache::*;
pub use config::*;
pub use daterange::*;
pub use hour::*;
pub use location::*;
pub use logging::*;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}

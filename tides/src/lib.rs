//! Tide computations and rendering.
//!
//! The almanac data itself comes from `estran-sources`, this crate
//! turns it into printable LaTeX strips and implements the twelfths
//! rule for on-the-spot height & time calculations.
//!

pub use ephem::*;
pub use latex::*;
pub use twelfths::*;

mod ephem;
mod latex;
mod twelfths;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

//! Module to deal with the different kinds of sources we can connect to to fetch data.
//!
//! The different submodules deal with the differences between sources:
//!
//! - headers (some SHOM endpoints insist on a browser-looking `Referer`)
//! - payloads (XML harbor lists, JSON tide almanacs, scraped HTML indexes).
//!

pub use adresse::*;
pub use error::*;
pub use hdm::*;
pub use meteoconsult::*;
pub use meteofrance::*;
pub use mfgrib::*;
pub use oceano::*;
pub use site::*;
pub use sources::*;
pub use spm::*;
pub use wfs::*;

mod adresse;
mod error;
mod hdm;
mod meteoconsult;
mod meteofrance;
mod mfgrib;
mod oceano;
mod site;
mod sources;
mod spm;
mod wfs;

#[macro_use]
mod macros;

/// Default configuration filename
const CONFIG: &str = "sources.hcl";

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// SHOM matches harbor names on their alphabetic letters only, so
/// `Le Conquet`, `le-conquet` and `LeConquet` are all the same name.
///
pub fn lean(text: &str) -> String {
    text.to_lowercase().chars().filter(|c| c.is_alphabetic()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lean() {
        assert_eq!("leconquet", lean("Le Conquet"));
        assert_eq!("îledesein", lean("Île-de-Sein (2)"));
    }
}

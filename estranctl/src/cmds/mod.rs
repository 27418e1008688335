//! One module per command group, dispatched from `main`.
//!

use eyre::eyre;
use eyre::Result;

use estran_sources::{Hdm, HdmConfig, Site};

use crate::Context;

/// Re-export
///
pub use angle::*;

pub mod ais;
mod angle;
pub mod currents;
pub mod gpx;
pub mod grib;
pub mod list;
pub mod meteo;
pub mod nmea;
pub mod oceano;
pub mod tides;
pub mod wfs;

/// One configured site or a readable error.
///
pub(crate) fn site<'a>(ctx: &'a Context, name: &str) -> Result<&'a Site> {
    ctx.sources
        .get(name)
        .ok_or_else(|| eyre!("no source {} configured", name))
}

/// The discovered SHOM endpoints, cached.
///
pub(crate) fn hdm_config(ctx: &Context) -> Result<HdmConfig> {
    let hdm = Hdm::new(site(ctx, "hdm")?);
    hdm.config(&ctx.cache)
}

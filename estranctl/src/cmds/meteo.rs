//! The `meteo` command.
//!

use eyre::Result;
use tracing::debug;

use estran_sources::{wind_table, Adresse, MeteoFrance};

use crate::cmds::site;
use crate::{Context, MeteoOpts};

/// Geocode the place then print the marine forecast as a wind table.
///
pub fn meteo(ctx: &Context, opts: &MeteoOpts) -> Result<String> {
    let geocoder = Adresse::new(site(ctx, "adresse")?)?;
    let place = geocoder.search(&opts.place)?;
    debug!("{} at ({}, {})", place.name, place.lat, place.lon);

    let mf = MeteoFrance::new(site(ctx, "meteofrance")?)?;
    let forecast = mf.marine(place.lat, place.lon)?;
    Ok(wind_table(&forecast))
}

//! The `oceano` command.
//!

use eyre::{eyre, Result};
use tracing::debug;

use estran_currents::mercator;
use estran_sources::{find, Oceano, Render, Target, Wfs, ALL_PARAMETERS, SPOTS_LAYER};

use crate::cmds::site;
use crate::{Context, OceanoOpts};

/// Resolve the spot then either print the page URL or save a
/// rendering next to the current directory.
///
pub fn oceano(ctx: &Context, opts: &OceanoOpts) -> Result<String> {
    let s = site(ctx, "clevisu")?;
    let spots = Wfs::new(&s.base_url).features_cached(&SPOTS_LAYER, &ctx.cache)?;

    let found = find(&spots, &opts.spot);
    let spot = found
        .first()
        .ok_or_else(|| eyre!("no spot matching {}", opts.spot))?;
    debug!("spot {} for {}", spot.name, opts.spot);

    let target = if opts.latlon {
        let (x, y) = spot
            .point_3857()
            .ok_or_else(|| eyre!("no geometry for {}", spot.name))?;
        let (lon, lat) = mercator::inverse(x, y);
        Target::LatLon { lat, lon }
    } else {
        Target::Spot(spot.name.clone())
    };

    let mut client = Oceano::new(site(ctx, "oceano")?);
    if opts.all {
        client = client.with_parameters(ALL_PARAMETERS);
    }

    if opts.image {
        let fname = client.save(Render::Image, &target, None)?;
        Ok(format!("saved {}", fname.display()))
    } else if opts.text {
        let data = client.fetch(Render::Text, &target)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    } else {
        Ok(client.url(Render::Html, &target))
    }
}

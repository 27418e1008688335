//! The `currents` command group, atlas interpolation without any
//! network access.
//!

use std::fs;

use eyre::{eyre, Result};

use estran_common::BB;
use estran_currents::{classify_grid, Coastline, CurrentMesh};
use estran_formats::read_atlas;

use crate::{cache_dir, CurrentsAtOpts, CurrentsMeshOpts, CurrentsOpts, CurrentsSubCommand};

pub fn dispatch(opts: &CurrentsOpts) -> Result<String> {
    match &opts.subcmd {
        CurrentsSubCommand::At(aopts) => at(aopts),
        CurrentsSubCommand::Mesh(mopts) => mesh(mopts),
    }
}

/// Build the mesh and report its size, plus the land/sea grid tally
/// when a bounding box was given.
///
fn mesh(opts: &CurrentsMeshOpts) -> Result<String> {
    let bbox = opts.bbox.as_deref().map(parse_bbox).transpose()?;
    let points = read_atlas(&fs::read_to_string(&opts.atlas)?, bbox)?;
    let mut coast = coastline(opts.coast.as_path())?;

    let mesh = CurrentMesh::build(points, &mut coast)?;
    let mut out = format!(
        "{}: {} points, {} triangles",
        opts.atlas.display(),
        mesh.len(),
        mesh.triangle_count()
    );
    if let Some(bb) = bbox {
        let stats = classify_grid(&bb, &mut coast)?;
        out.push_str(&format!("\ngrid: {} sea, {} land", stats.sea, stats.land));
    }
    coast.save_memo()?;
    Ok(out)
}

/// Interpolated current at one point.
///
fn at(opts: &CurrentsAtOpts) -> Result<String> {
    let points = read_atlas(&fs::read_to_string(&opts.atlas)?, None)?;
    let mut coast = coastline(opts.coast.as_path())?;

    let mesh = CurrentMesh::build(points, &mut coast)?;
    let answer = match mesh.interpolate(opts.lon, opts.lat, opts.coeff, opts.hour)? {
        Some((u, v)) => {
            // Atlas units are hundredths of knots.
            let (u, v) = (u / 100., v / 100.);
            let speed = u.hypot(v);
            let heading = (u.atan2(v).to_degrees() + 360.) % 360.;
            format!(
                "({:.4}, {:.4}) H{:+} coeff {}: {:.2} kt heading {:.0}° (u {:.2}, v {:.2})",
                opts.lat, opts.lon, opts.hour, opts.coeff, speed, heading, u, v
            )
        }
        _ => format!("({:.4}, {:.4}): on land or outside the atlas", opts.lat, opts.lon),
    };
    coast.save_memo()?;
    Ok(answer)
}

fn coastline(path: &std::path::Path) -> Result<Coastline> {
    let cache = cache_dir()?;
    fs::create_dir_all(&cache)?;
    Ok(Coastline::from_geojson_file(path)?.with_memo(&cache.join("coast_memo.json")))
}

/// `MINLON,MINLAT,MAXLON,MAXLAT` into a bounding box.
///
fn parse_bbox(text: &str) -> Result<BB> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()?;
    let [min_lon, min_lat, max_lon, max_lat] = parts[..] else {
        return Err(eyre!("expected MINLON,MINLAT,MAXLON,MAXLAT, got {text}"));
    };
    Ok(BB {
        min_lon,
        min_lat,
        max_lon,
        max_lat,
    })
}

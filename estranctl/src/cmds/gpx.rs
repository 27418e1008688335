//! The `gpx` command group.
//!

use std::fs;
use std::path::Path;

use eyre::Result;

use estran_formats::{
    format_distance, format_speed, read_gpx, write_geojson, write_gpx, write_kml, Track,
};

use crate::{GpxMergeOpts, GpxOpts, GpxSubCommand};

/// Metres per nautical mile
const NM: f64 = 1852.;

pub fn dispatch(opts: &GpxOpts) -> Result<String> {
    match &opts.subcmd {
        GpxSubCommand::Merge(mopts) => merge(mopts),
    }
}

/// Merge every input into a single multi-segment track, one info line
/// per input, then write it out.
///
fn merge(opts: &GpxMergeOpts) -> Result<String> {
    let mut merged = Track::new(&opts.output);
    let mut lines = vec![];

    for file in &opts.files {
        let content = fs::read_to_string(file)?;
        for mut t in read_gpx(&content)? {
            if opts.reduce > 0. {
                t.reduce_points(opts.reduce);
            }
            lines.push(info_line(file, &t, opts));
            merged.segments.append(&mut t.segments);
        }
    }

    let one = std::slice::from_ref(&merged);
    let (fname, data) = if opts.kml {
        (format!("{}.kml", opts.output), write_kml(&opts.output, one)?)
    } else if opts.gpx {
        (format!("{}.gpx", opts.output), write_gpx("estranctl", one)?)
    } else {
        (format!("{}.geojson", opts.output), write_geojson(one)?)
    };
    fs::write(&fname, data)?;

    lines.push(format!(
        "{}: {} points into {}",
        merged.name,
        merged.len(),
        fname
    ));
    Ok(lines.join("\n"))
}

/// One line per input track, in metric or nautical units.
///
fn info_line(file: &Path, t: &Track, opts: &GpxMergeOpts) -> String {
    let length = if opts.elevation {
        t.length_3d()
    } else {
        t.length_2d()
    };
    let md = t.moving_data();
    let avg = if md.moving_time > 0 {
        md.moving_distance / md.moving_time as f64
    } else {
        0.
    };

    let (length, avg, max) = if opts.nautic {
        (
            format!("{:.2} nm", length / NM),
            format!("{:.1} kt", avg * 3600. / NM),
            format!("{:.1} kt", md.max_speed * 3600. / NM),
        )
    } else {
        (format_distance(length), format_speed(avg), format_speed(md.max_speed))
    };

    let span = match t.time_bounds() {
        Some((b, e)) => format!(
            ", {} to {}",
            b.format("%Y-%m-%d %H:%M"),
            e.format("%Y-%m-%d %H:%M")
        ),
        _ => String::new(),
    };

    format!(
        "{}: {} points, {}, avg {}, max {}{}",
        file.display(),
        t.len(),
        length,
        avg,
        max,
        span
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
 <trk>
  <name>leg</name>
  <trkseg>
   <trkpt lat="48.3800" lon="-4.4900">
    <time>2023-08-12T09:00:00Z</time>
   </trkpt>
   <trkpt lat="48.3810" lon="-4.4890">
    <time>2023-08-12T09:01:00Z</time>
   </trkpt>
  </trkseg>
 </trk>
</gpx>
"#;

    #[test]
    fn test_merge_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("leg.gpx");
        fs::File::create(&input)
            .unwrap()
            .write_all(GPX.as_bytes())
            .unwrap();

        let out = dir.path().join("out");
        let opts = GpxMergeOpts {
            output: out.to_string_lossy().into_owned(),
            kml: false,
            gpx: false,
            reduce: 1.0,
            nautic: false,
            elevation: false,
            files: vec![input],
        };
        let res = merge(&opts).unwrap();
        assert!(res.contains("2 points"), "{res}");
        assert!(dir.path().join("out.geojson").exists());
    }

    #[test]
    fn test_info_line_nautic() {
        let mut t = Track::new("leg");
        t.segments.push(vec![
            estran_formats::TrackPoint::new(48.38, -4.49),
            estran_formats::TrackPoint::new(48.39, -4.49),
        ]);
        let opts = GpxMergeOpts {
            output: "merged".to_string(),
            kml: false,
            gpx: false,
            reduce: 0.,
            nautic: true,
            elevation: false,
            files: vec![],
        };
        let line = info_line(Path::new("leg.gpx"), &t, &opts);
        // One minute of latitude is one nautical mile.
        assert!(line.contains("0.60 nm"), "{line}");
    }
}

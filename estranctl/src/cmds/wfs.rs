//! The `harbors` and `zones` listings.
//!

use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use estran_currents::mercator;
use estran_sources::{find, Feature, FeatureMap, Wfs, HARBORS_LAYER, ZONES_LAYER};

use crate::cmds::hdm_config;
use crate::{Context, FindOpts};

pub fn harbors(ctx: &Context, opts: &FindOpts) -> Result<String> {
    let map = layer(ctx, true)?;
    Ok(render(&map, &opts.pattern, "toponyme"))
}

pub fn zones(ctx: &Context, opts: &FindOpts) -> Result<String> {
    let map = layer(ctx, false)?;
    Ok(render(&map, &opts.pattern, "libelle"))
}

fn layer(ctx: &Context, harbors: bool) -> Result<FeatureMap> {
    let cfg = hdm_config(ctx)?;
    let wfs = Wfs::new(&cfg.wfs_harbor_url);
    let layer = if harbors { &HARBORS_LAYER } else { &ZONES_LAYER };
    wfs.features_cached(layer, &ctx.cache)
}

/// Table with one feature per row, the whole layer when no pattern.
///
fn render(map: &FeatureMap, pattern: &Option<String>, label: &str) -> String {
    let list: Vec<&Feature> = match pattern {
        Some(p) => find(map, p),
        _ => map.values().collect(),
    };

    let mut builder = Builder::default();
    builder.push_record(["Name", "Label", "Lat", "Lon"]);
    for f in &list {
        let (lat, lon) = match f.point_3857() {
            Some((x, y)) => {
                let (lon, lat) = mercator::inverse(x, y);
                (format!("{:.4}", lat), format!("{:.4}", lon))
            }
            _ => (String::new(), String::new()),
        };
        builder.push_record([f.name.as_str(), f.prop(label).unwrap_or(""), lat.as_str(), lon.as_str()]);
    }
    format!(
        "{}\n{} feature(s)",
        builder.build().with(Style::modern()),
        list.len()
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn feature(name: &str, lon: f64, lat: f64) -> Feature {
        let (x, y) = mercator::forward(lon, lat);
        Feature {
            name: name.to_string(),
            properties: json!({"toponyme": name}),
            geometry: json!({"type": "Point", "coordinates": [x, y]}),
        }
    }

    #[test]
    fn test_render_all() {
        let mut map = FeatureMap::new();
        map.insert("BREST".into(), feature("BREST", -4.49, 48.38));
        map.insert("CAMARET".into(), feature("CAMARET", -4.59, 48.27));

        let out = render(&map, &None, "toponyme");
        assert!(out.contains("BREST"));
        assert!(out.contains("CAMARET"));
        assert!(out.contains("2 feature(s)"));
        assert!(out.contains("48.3800"));
    }

    #[test]
    fn test_render_filtered() {
        let mut map = FeatureMap::new();
        map.insert("BREST".into(), feature("BREST", -4.49, 48.38));
        map.insert("CAMARET".into(), feature("CAMARET", -4.59, 48.27));

        let out = render(&map, &Some("camaret".to_string()), "toponyme");
        assert!(out.contains("CAMARET"));
        assert!(!out.contains("BREST"));
        assert!(out.contains("1 feature(s)"));
    }
}

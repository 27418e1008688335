//! GeoJSON output for tracks.
//!

use chrono::SecondsFormat;
use eyre::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};

use crate::Track;

/// 9 decimals on angles is about 0.1 mm, plenty.
fn round9(v: f64) -> f64 {
    (v * 1e9).round() / 1e9
}

/// 3 decimals on elevations.
fn round3(v: f64) -> f64 {
    (v * 1e3).round() / 1e3
}

/// Render tracks as a `FeatureCollection`, one `LineString` feature per
/// segment with the timestamps carried in a `coordTimes` property the
/// way Leaflet and friends expect them.
///
#[tracing::instrument(skip(tracks))]
pub fn write_geojson(tracks: &[Track]) -> Result<String> {
    let mut features = vec![];

    for track in tracks {
        for seg in &track.segments {
            let coords: Vec<Vec<f64>> = seg
                .iter()
                .map(|p| {
                    let mut c = vec![round9(p.lon), round9(p.lat)];
                    if let Some(ele) = p.ele {
                        c.push(round3(ele));
                    }
                    c
                })
                .collect();

            let times: Vec<JsonValue> = seg
                .iter()
                .map(|p| match p.time {
                    Some(t) => JsonValue::String(t.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    None => JsonValue::Null,
                })
                .collect();

            let mut properties = JsonObject::new();
            properties.insert("name".into(), JsonValue::String(track.name.clone()));
            properties.insert("coordTimes".into(), JsonValue::Array(times));

            features.push(Feature {
                geometry: Some(Geometry::new(Value::LineString(coords))),
                properties: Some(properties),
                ..Default::default()
            });
        }
    }

    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    Ok(GeoJson::from(fc).to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::TrackPoint;

    use super::*;

    #[test]
    fn test_write_geojson() {
        let mut t = Track::new("Rade de Brest");
        t.segments.push(vec![
            TrackPoint {
                lat: 48.3812000004,
                lon: -4.4972,
                ele: Some(2.0004),
                time: Some(Utc.with_ymd_and_hms(2024, 5, 12, 10, 41, 45).unwrap()),
            },
            TrackPoint::new(48.3820, -4.4960),
        ]);
        let out = write_geojson(&[t]).unwrap();

        let parsed: GeoJson = out.parse().unwrap();
        let GeoJson::FeatureCollection(fc) = parsed else {
            panic!("not a collection")
        };
        assert_eq!(1, fc.features.len());
        let f = &fc.features[0];
        let props = f.properties.as_ref().unwrap();
        assert_eq!("Rade de Brest", props["name"]);
        assert_eq!("2024-05-12T10:41:45Z", props["coordTimes"][0]);
        assert!(props["coordTimes"][1].is_null());

        // rounding applied
        assert!(out.contains("48.3812,"));
        assert!(out.contains("2.0"));
    }
}

//! In-memory track model shared by the GPX/KML/GeoJSON converters.
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean earth radius in metres.
const EARTH_RADIUS: f64 = 6_371_000.;

/// One nautical mile in metres.
pub const NM: f64 = 1852.;

/// Below this ground speed (m/s) a leg counts as stopped.
const STOPPED_SPEED: f64 = 0.5;

/// A single recorded fix.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    /// Elevation in metres when the recorder had one.
    pub ele: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        TrackPoint {
            lat,
            lon,
            ..Default::default()
        }
    }

    /// Great-circle distance to `other` in metres (haversine).
    ///
    pub fn distance_2d(&self, other: &TrackPoint) -> f64 {
        let (la1, la2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.).sin().powi(2) + la1.cos() * la2.cos() * (dlon / 2.).sin().powi(2);
        2. * EARTH_RADIUS * a.sqrt().asin()
    }

    /// Distance including the elevation delta when both ends have one.
    ///
    pub fn distance_3d(&self, other: &TrackPoint) -> f64 {
        let flat = self.distance_2d(other);
        match (self.ele, other.ele) {
            (Some(e1), Some(e2)) => (flat.powi(2) + (e2 - e1).powi(2)).sqrt(),
            _ => flat,
        }
    }
}

/// Summary of the moving parts of a track.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovingData {
    /// Seconds spent moving.
    pub moving_time: i64,
    /// Seconds spent stopped.
    pub stopped_time: i64,
    /// Metres covered while moving.
    pub moving_distance: f64,
    /// Best observed speed in m/s.
    pub max_speed: f64,
}

/// A named track, segmented the way GPX segments them.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub segments: Vec<Vec<TrackPoint>>,
}

impl Track {
    pub fn new(name: &str) -> Self {
        Track {
            name: name.to_string(),
            segments: vec![],
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.segments.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn length_with(&self, dist: impl Fn(&TrackPoint, &TrackPoint) -> f64) -> f64 {
        self.segments
            .iter()
            .map(|seg| seg.windows(2).map(|w| dist(&w[0], &w[1])).sum::<f64>())
            .sum()
    }

    /// Flat track length in metres.
    ///
    pub fn length_2d(&self) -> f64 {
        self.length_with(TrackPoint::distance_2d)
    }

    /// Track length including elevation changes, in metres.
    ///
    pub fn length_3d(&self) -> f64 {
        self.length_with(TrackPoint::distance_3d)
    }

    /// First and last timestamps over all segments.
    ///
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut times = self.points().filter_map(|p| p.time);
        let first = times.next()?;
        let last = times.last().unwrap_or(first);
        Some((first, last))
    }

    /// Moving time, stopped time, moving distance and max speed over the
    /// timestamped legs.
    ///
    pub fn moving_data(&self) -> MovingData {
        let mut md = MovingData::default();
        for seg in &self.segments {
            let mut speeds = Vec::with_capacity(seg.len());
            for w in seg.windows(2) {
                let (Some(t1), Some(t2)) = (w[0].time, w[1].time) else {
                    continue;
                };
                let secs = (t2 - t1).num_seconds();
                if secs <= 0 {
                    continue;
                }
                let dist = w[0].distance_2d(&w[1]);
                let speed = dist / secs as f64;
                if speed > STOPPED_SPEED {
                    md.moving_time += secs;
                    md.moving_distance += dist;
                } else {
                    md.stopped_time += secs;
                }
                speeds.push(speed);
            }
            md.max_speed = md.max_speed.max(smoothed_max(&speeds));
        }
        md
    }

    /// Drop points closer than `min_dist` metres from the previous kept
    /// one.  Segment boundaries and endpoints are preserved.
    ///
    pub fn reduce_points(&mut self, min_dist: f64) {
        for seg in &mut self.segments {
            if seg.len() < 3 {
                continue;
            }
            let mut kept = vec![seg[0]];
            for p in &seg[1..seg.len() - 1] {
                if kept[kept.len() - 1].distance_2d(p) >= min_dist {
                    kept.push(*p);
                }
            }
            kept.push(seg[seg.len() - 1]);
            *seg = kept;
        }
    }
}

/// Smoothed maximum of consecutive leg speeds, the minimum over each
/// window of 3 legs so a lone glitchy fix does not set the record.
/// Segments too short to window fall back to the plain maximum.
///
fn smoothed_max(speeds: &[f64]) -> f64 {
    if speeds.len() < 3 {
        return speeds.iter().copied().fold(0., f64::max);
    }
    speeds
        .windows(3)
        .map(|w| w.iter().copied().fold(f64::INFINITY, f64::min))
        .fold(0., f64::max)
}

/// `1.23 km / 0.66 nm` style rendering.
///
pub fn format_distance(metres: f64) -> String {
    format!("{:.2} km / {:.2} nm", metres / 1000., metres / NM)
}

/// `2.5 m/s / 4.9 kt` style rendering.
///
pub fn format_speed(ms: f64) -> String {
    format!("{:.1} m/s / {:.1} kt", ms, ms * 3600. / NM)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fix(lat: f64, lon: f64, secs: i64) -> TrackPoint {
        TrackPoint {
            lat,
            lon,
            ele: None,
            time: Some(Utc.timestamp_opt(1_715_500_000 + secs, 0).unwrap()),
        }
    }

    #[test]
    fn test_distance_2d() {
        // one minute of latitude is one nautical mile
        let a = TrackPoint::new(48.0, -4.5);
        let b = TrackPoint::new(48.0 + 1. / 60., -4.5);
        let d = a.distance_2d(&b);
        assert!((d - NM).abs() < 5., "d = {d}");
    }

    #[test]
    fn test_distance_3d() {
        let mut a = TrackPoint::new(48.0, -4.5);
        let mut b = TrackPoint::new(48.0, -4.5);
        a.ele = Some(0.);
        b.ele = Some(30.);
        assert!((a.distance_3d(&b) - 30.).abs() < 1e-9);
    }

    #[test]
    fn test_lengths_and_bounds() {
        let mut t = Track::new("leg");
        t.segments.push(vec![
            fix(48.0, -4.5, 0),
            fix(48.0 + 1. / 60., -4.5, 600),
            fix(48.0 + 2. / 60., -4.5, 1200),
        ]);
        assert!((t.length_2d() - 2. * NM).abs() < 10.);
        let (first, last) = t.time_bounds().unwrap();
        assert_eq!(1200, (last - first).num_seconds());
    }

    #[test]
    fn test_moving_data() {
        let mut t = Track::new("leg");
        t.segments.push(vec![
            fix(48.0, -4.5, 0),
            // ~1852 m in 600 s, about 3 m/s
            fix(48.0 + 1. / 60., -4.5, 600),
            // no movement for 300 s
            fix(48.0 + 1. / 60., -4.5, 900),
        ]);
        let md = t.moving_data();
        assert_eq!(600, md.moving_time);
        assert_eq!(300, md.stopped_time);
        assert!((md.moving_distance - NM).abs() < 10.);
        assert!(md.max_speed > 3.0 && md.max_speed < 3.2);
    }

    #[test]
    fn test_max_speed_ignores_glitch() {
        let mut t = Track::new("leg");
        // Steady ~3.1 m/s legs with one impossible 30 m/s jump.
        //
        t.segments.push(vec![
            fix(48.0, -4.5, 0),
            fix(48.0 + 1. / 60., -4.5, 600),
            fix(48.0 + 2. / 60., -4.5, 1200),
            fix(48.0 + 3. / 60., -4.5, 1260),
            fix(48.0 + 4. / 60., -4.5, 1860),
            fix(48.0 + 5. / 60., -4.5, 2460),
        ]);
        let md = t.moving_data();
        assert!(md.max_speed > 3.0 && md.max_speed < 3.2, "{}", md.max_speed);
    }

    #[test]
    fn test_reduce_points() {
        let mut t = Track::new("leg");
        t.segments.push(vec![
            fix(48.0, -4.5, 0),
            fix(48.000001, -4.5, 10),
            fix(48.01, -4.5, 600),
            fix(48.0100001, -4.5, 610),
        ]);
        t.reduce_points(100.);
        assert_eq!(3, t.len());
        // endpoints survive
        assert_eq!(48.0100001, t.segments[0][2].lat);
    }

    #[test]
    fn test_formatting() {
        assert_eq!("1.85 km / 1.00 nm", format_distance(NM));
        assert_eq!("2.0 m/s / 3.9 kt", format_speed(2.));
    }
}

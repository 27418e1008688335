//! Triangulated current mesh.
//!
//! Atlas points are projected to mercator and Delaunay-triangulated.
//! The hull of the triangulation does not know about the shore, so a
//! triangle survives only if its three vertices and its centroid are
//! at sea.  Queries locate the containing triangle and blend the three
//! vertex currents by barycentric weights.
//!

use delaunator::{triangulate, Point as MeshPoint};
use eyre::{eyre, Result};
use tracing::{debug, info};

use estran_common::BB;
use estran_formats::{AtlasPoint, I_INCREMENT, J_INCREMENT};

use crate::mercator;
use crate::Coastline;

/// Points on a shared edge count as inside
const EPSILON: f64 = 1e-9;

/// The mesh, ready for queries.
///
#[derive(Debug)]
pub struct CurrentMesh {
    points: Vec<AtlasPoint>,
    /// Mercator projection of each point
    coords: Vec<(f64, f64)>,
    /// Kept triangles, indices into `points`
    triangles: Vec<[usize; 3]>,
}

impl CurrentMesh {
    /// Triangulate and prune against the coastline.
    ///
    pub fn build(points: Vec<AtlasPoint>, coast: &mut Coastline) -> Result<Self> {
        if points.len() < 3 {
            return Err(eyre!("not enough atlas points ({})", points.len()));
        }

        let coords: Vec<(f64, f64)> = points
            .iter()
            .map(|p| mercator::forward(p.lon, p.lat))
            .collect();
        let cloud: Vec<MeshPoint> = coords
            .iter()
            .map(|&(x, y)| MeshPoint { x, y })
            .collect();

        let triangulation = triangulate(&cloud);
        debug!(
            "{} raw triangles over {} points",
            triangulation.triangles.len() / 3,
            points.len()
        );

        let mut triangles = vec![];
        for t in triangulation.triangles.chunks_exact(3) {
            let (a, b, c) = (t[0], t[1], t[2]);

            if coast.is_land(points[a].lon, points[a].lat)
                || coast.is_land(points[b].lon, points[b].lat)
                || coast.is_land(points[c].lon, points[c].lat)
            {
                continue;
            }

            let cx = (coords[a].0 + coords[b].0 + coords[c].0) / 3.;
            let cy = (coords[a].1 + coords[b].1 + coords[c].1) / 3.;
            let (clon, clat) = mercator::inverse(cx, cy);
            if coast.is_land(clon, clat) {
                continue;
            }

            triangles.push([a, b, c]);
        }
        coast.save_memo()?;
        info!("mesh: {} triangles kept", triangles.len());

        Ok(CurrentMesh {
            points,
            coords,
            triangles,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Current at a point, `None` outside the mesh (on land or beyond
    /// the hull).  Components come back in atlas units.
    ///
    pub fn interpolate(
        &self,
        lon: f64,
        lat: f64,
        coeff: f64,
        hour: i32,
    ) -> Result<Option<(f64, f64)>> {
        let (x, y) = mercator::forward(lon, lat);

        for t in &self.triangles {
            let Some((wa, wb, wc)) = barycentric(
                (x, y),
                self.coords[t[0]],
                self.coords[t[1]],
                self.coords[t[2]],
            ) else {
                continue;
            };
            if wa < -EPSILON || wb < -EPSILON || wc < -EPSILON {
                continue;
            }

            let (ua, va) = self.points[t[0]].current_at(coeff, hour)?;
            let (ub, vb) = self.points[t[1]].current_at(coeff, hour)?;
            let (uc, vc) = self.points[t[2]].current_at(coeff, hour)?;

            let u = wa * ua + wb * ub + wc * uc;
            let v = wa * va + wb * vb + wc * vc;
            return Ok(Some((u, v)));
        }
        Ok(None)
    }
}

/// Barycentric weights of `p` in the triangle `(a, b, c)`, `None` for
/// a degenerate triangle.
///
fn barycentric(
    p: (f64, f64),
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
) -> Option<(f64, f64, f64)> {
    let det = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
    if det.abs() < f64::EPSILON {
        return None;
    }
    let wa = ((b.1 - c.1) * (p.0 - c.0) + (c.0 - b.0) * (p.1 - c.1)) / det;
    let wb = ((c.1 - a.1) * (p.0 - c.0) + (a.0 - c.0) * (p.1 - c.1)) / det;
    Some((wa, wb, 1. - wa - wb))
}

/// Land/sea tally of the atlas grid over a bounding box, stepping at
/// the atlas increments.
///
#[derive(Debug, Default, Eq, PartialEq)]
pub struct GridStats {
    pub sea: usize,
    pub land: usize,
}

pub fn classify_grid(bbox: &BB, coast: &mut Coastline) -> Result<GridStats> {
    let mut stats = GridStats::default();

    let mut lon = bbox.min_lon;
    while lon <= bbox.max_lon + I_INCREMENT {
        let mut lat = bbox.min_lat;
        while lat <= bbox.max_lat + J_INCREMENT {
            if coast.is_land(lon, lat) {
                stats.land += 1;
            } else {
                stats.sea += 1;
            }
            lat += J_INCREMENT;
        }
        lon += I_INCREMENT;
    }
    coast.save_memo()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use estran_formats::Components;

    use super::*;

    fn uniform(n: i32) -> Components {
        Components {
            u: [n; 13],
            v: [-n; 13],
        }
    }

    fn point(lon: f64, lat: f64, n: i32) -> AtlasPoint {
        AtlasPoint {
            lat,
            lon,
            spring: uniform(n),
            neap: uniform(n / 2),
        }
    }

    // Four sea points around a land-free square, no land anywhere
    fn open_water() -> Coastline {
        Coastline::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{},
   "geometry":{"type":"Polygon","coordinates":[[[50,50],[51,50],[51,51],[50,51],[50,50]]]}}]}"#,
        )
        .unwrap()
    }

    fn square() -> Vec<AtlasPoint> {
        vec![
            point(-4.50, 48.30, 100),
            point(-4.40, 48.30, 100),
            point(-4.40, 48.40, 200),
            point(-4.50, 48.40, 200),
        ]
    }

    #[test]
    fn test_build() {
        let mut coast = open_water();
        let mesh = CurrentMesh::build(square(), &mut coast).unwrap();
        assert_eq!(4, mesh.len());
        assert_eq!(2, mesh.triangle_count());
    }

    #[test]
    fn test_interpolate_at_vertex() {
        let mut coast = open_water();
        let mesh = CurrentMesh::build(square(), &mut coast).unwrap();

        let (u, v) = mesh
            .interpolate(-4.50, 48.30, 95., 0)
            .unwrap()
            .expect("inside");
        assert!((u - 100.).abs() < 1e-6);
        assert!((v - -100.).abs() < 1e-6);
    }

    #[test]
    fn test_interpolate_blend() {
        let mut coast = open_water();
        let mesh = CurrentMesh::build(square(), &mut coast).unwrap();

        // Midpoint of the western edge, halfway between 100 and 200
        let (u, _) = mesh
            .interpolate(-4.50, 48.35, 95., 0)
            .unwrap()
            .expect("inside");
        assert!((u - 150.).abs() < 1.);
    }

    #[test]
    fn test_outside_hull() {
        let mut coast = open_water();
        let mesh = CurrentMesh::build(square(), &mut coast).unwrap();
        assert!(mesh.interpolate(-5.0, 48.35, 95., 0).unwrap().is_none());
    }

    #[test]
    fn test_land_pruning() {
        // The whole square is on land, nothing survives
        let mut coast = Coastline::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{},
   "geometry":{"type":"Polygon","coordinates":[[[-5,48],[-4,48],[-4,49],[-5,49],[-5,48]]]}}]}"#,
        )
        .unwrap();
        let mesh = CurrentMesh::build(square(), &mut coast).unwrap();
        assert_eq!(0, mesh.triangle_count());
        assert!(mesh.interpolate(-4.45, 48.35, 95., 0).unwrap().is_none());
    }

    #[test]
    fn test_bad_hour() {
        let mut coast = open_water();
        let mesh = CurrentMesh::build(square(), &mut coast).unwrap();
        assert!(mesh.interpolate(-4.45, 48.35, 95., 7).is_err());
    }

    #[test]
    fn test_classify_grid() {
        let mut coast = open_water();
        let bb = BB {
            min_lon: -4.50,
            min_lat: 48.30,
            max_lon: -4.49,
            max_lat: 48.31,
        };
        let stats = classify_grid(&bb, &mut coast).unwrap();
        assert_eq!(0, stats.land);
        assert!(stats.sea > 0);
    }
}

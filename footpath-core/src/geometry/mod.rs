//! Spherical and local-planar geometry helpers.
//!
//! Everything here is pure. Coordinates are always `(lat, lng)` in degrees;
//! conversion from the `(lng, lat)` wire order happens in the loader.

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::{EARTH_RADIUS_M, Meters};

/// Meters per degree of latitude used by the local equirectangular projection
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Equality within `epsilon` degrees on both axes. Identical points are
    /// always equal, even for a zero `epsilon`.
    pub fn approx_eq(&self, other: &LatLng, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lng - other.lng).abs() <= epsilon
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(p: LatLng) -> Self {
        Coord { x: p.lng, y: p.lat }
    }
}

impl From<Coord<f64>> for LatLng {
    fn from(c: Coord<f64>) -> Self {
        LatLng::new(c.y, c.x)
    }
}

impl From<Point<f64>> for LatLng {
    fn from(p: Point<f64>) -> Self {
        LatLng::new(p.y(), p.x())
    }
}

impl From<LatLng> for Point<f64> {
    fn from(p: LatLng) -> Self {
        Point::new(p.lng, p.lat)
    }
}

/// Great-circle distance in meters
pub fn haversine_meters(a: LatLng, b: LatLng) -> Meters {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let sa = (d_lat / 2.0).sin();
    let sb = (d_lng / 2.0).sin();
    let h = (sa * sa + a.lat.to_radians().cos() * b.lat.to_radians().cos() * sb * sb)
        .clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing from `a` to `b`, in degrees within `[0, 360)`
pub fn bearing_degrees(a: LatLng, b: LatLng) -> f64 {
    let la = a.lat.to_radians();
    let lb = b.lat.to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let y = d_lng.sin() * lb.cos();
    let x = la.cos() * lb.sin() - la.sin() * lb.cos() * d_lng.cos();
    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;
    // -0.0 and rounding right below 360 both have to land inside the range
    if bearing >= 360.0 { 0.0 } else { bearing.abs() }
}

/// Foot of the perpendicular from a point onto a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Projected position, clamped to the segment
    pub point: LatLng,
    /// Clamped position along `a -> b`, in `[0, 1]`
    pub t: f64,
    /// Distance from the query point to `point`
    pub distance_m: Meters,
    /// False when the unclamped parameter fell outside `[0, 1]`
    /// or when the segment is degenerate
    pub on_segment: bool,
}

/// Projects `p` onto the segment `a-b`.
///
/// Uses a local equirectangular approximation with longitude scaled by the
/// cosine of the mean latitude of the three points. Footpath segments span
/// meters to tens of meters, where the curvature error is far below survey
/// precision.
pub fn project_point_onto_segment(p: LatLng, a: LatLng, b: LatLng) -> SegmentProjection {
    let ref_lat = ((a.lat + b.lat + p.lat) / 3.0).to_radians();
    let m_lat = METERS_PER_DEGREE;
    let m_lng = METERS_PER_DEGREE * ref_lat.cos();

    let to_xy = |c: LatLng| (c.lat * m_lat, c.lng * m_lng);
    let (px, py) = to_xy(p);
    let (ax, ay) = to_xy(a);
    let (bx, by) = to_xy(b);

    let (vx, vy) = (bx - ax, by - ay);
    let len2 = vx * vx + vy * vy;
    if len2 == 0.0 || !len2.is_finite() {
        return SegmentProjection {
            point: a,
            t: 0.0,
            distance_m: haversine_meters(p, a),
            on_segment: false,
        };
    }

    let raw_t = ((px - ax) * vx + (py - ay) * vy) / len2;
    let on_segment = (0.0..=1.0).contains(&raw_t);
    let t = raw_t.clamp(0.0, 1.0);

    let (fx, fy) = (ax + t * vx, ay + t * vy);
    let distance_m = ((px - fx).powi(2) + (py - fy).powi(2)).sqrt();

    let point = if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        LatLng::new(fx / m_lat, fy / m_lng)
    };

    SegmentProjection {
        point,
        t,
        distance_m,
        on_segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn east_of(origin: LatLng, meters: f64) -> LatLng {
        let d_lng = meters / (EARTH_RADIUS_M * origin.lat.to_radians().cos()) * 180.0
            / std::f64::consts::PI;
        LatLng::new(origin.lat, origin.lng + d_lng)
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let p = LatLng::new(52.73, -1.73);
        assert_eq!(haversine_meters(p, p), 0.0);
    }

    #[test]
    fn approx_eq_with_zero_epsilon() {
        let p = LatLng::new(52.73, -1.73);
        assert!(p.approx_eq(&p, 0.0));
        assert!(!p.approx_eq(&LatLng::new(52.73, -1.7300001), 0.0));
        assert!(p.approx_eq(&LatLng::new(52.73, -1.7300001), 1e-6));
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine_meters(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = LatLng::new(52.7300, -1.7300);
        let b = LatLng::new(52.7312, -1.7281);
        assert!((haversine_meters(a, b) - haversine_meters(b, a)).abs() < 1e-9);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let o = LatLng::new(10.0, 10.0);
        assert!(bearing_degrees(o, LatLng::new(11.0, 10.0)).abs() < 1e-9);
        assert!((bearing_degrees(o, LatLng::new(10.0, 10.001)) - 90.0).abs() < 0.01);
        assert!((bearing_degrees(o, LatLng::new(9.0, 10.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_degrees(o, LatLng::new(10.0, 9.999)) - 270.0).abs() < 0.01);
    }

    #[test]
    fn bearing_stays_in_range() {
        let o = LatLng::new(52.73, -1.73);
        for i in 0..36 {
            let angle = f64::from(i) * 10.0_f64.to_radians();
            let p = LatLng::new(o.lat + 0.001 * angle.cos(), o.lng + 0.001 * angle.sin());
            let b = bearing_degrees(o, p);
            assert!((0.0..360.0).contains(&b), "bearing {b} out of range");
        }
    }

    #[test]
    fn projection_midpoint_of_segment() {
        let a = LatLng::new(52.73, -1.73);
        let b = east_of(a, 40.0);
        let mid = LatLng::new(a.lat + 0.0001, (a.lng + b.lng) / 2.0);
        let proj = project_point_onto_segment(mid, a, b);
        assert!(proj.on_segment);
        assert!((proj.t - 0.5).abs() < 1e-6);
        assert!((proj.distance_m - 11.132).abs() < 0.01, "got {}", proj.distance_m);
        assert!((proj.point.lat - a.lat).abs() < 1e-9);
    }

    #[test]
    fn projection_beyond_end_is_clamped_and_flagged() {
        let a = LatLng::new(52.73, -1.73);
        let b = east_of(a, 40.0);
        let beyond = east_of(a, 60.0);
        let proj = project_point_onto_segment(beyond, a, b);
        assert!(!proj.on_segment);
        assert_eq!(proj.t, 1.0);
        assert_eq!(proj.point, b);
        assert!((proj.distance_m - 20.0).abs() < 0.1);
    }

    #[test]
    fn projection_on_degenerate_segment() {
        let a = LatLng::new(52.73, -1.73);
        let p = east_of(a, 5.0);
        let proj = project_point_onto_segment(p, a, a);
        assert!(!proj.on_segment);
        assert_eq!(proj.point, a);
        assert!((proj.distance_m - 5.0).abs() < 1e-6);
    }

    #[test]
    fn projection_distance_shrinks_when_approaching() {
        let a = LatLng::new(52.73, -1.73);
        let b = east_of(a, 40.0);
        let mut last = f64::INFINITY;
        for step in (0..10).rev() {
            let p = LatLng::new(a.lat + 0.00002 * f64::from(step), (a.lng + b.lng) / 2.0);
            let d = project_point_onto_segment(p, a, b).distance_m;
            assert!(d <= last);
            last = d;
        }
        assert!(last < 1e-6);
    }
}

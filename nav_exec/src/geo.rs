//! # Geodesic positions
//!
//! Positions on a spherical earth and the geodesic operations used by the filter, the controller
//! and the simulation. All angles exposed by this module are in radians unless the name says
//! otherwise (`_deg`).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::angle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Mean radius of the earth.
///
/// Units: meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Positions closer than this are considered to be the same place (target reached).
///
/// Units: meters
pub const PROXIMITY_THRESHOLD_M: f64 = 3.0;

/// Per-axis tolerance below which two readings are considered identical.
///
/// Units: degrees
pub const PRECISE_THRESHOLD_DEG: f64 = 1e-8;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position fix on the earth's surface.
///
/// Values are never mutated once produced, every update creates a new position. Equality and
/// hashing compare the bit patterns of all four fields, use [`GeoPosition::proximity_eq`] or
/// [`GeoPosition::precise_eq`] for tolerance based comparisons.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude, nominally in [-90, 90].
    ///
    /// Units: degrees
    pub lat_deg: f64,

    /// Longitude, nominally in [-180, 180].
    ///
    /// Units: degrees
    pub lon_deg: f64,

    /// Altitude above mean sea level.
    ///
    /// Units: meters
    pub alt_m: f64,

    /// Ground speed reported with the fix.
    ///
    /// Units: kilometers/hour
    pub speed_kmh: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeoPosition {
    /// Create a new position with zero altitude and speed.
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            ..Default::default()
        }
    }

    /// Returns true if both latitude and longitude are exactly zero.
    ///
    /// This is what the position sentence decoder reports before it has a fix.
    pub fn is_zero(&self) -> bool {
        self.lat_deg == 0.0 && self.lon_deg == 0.0
    }

    /// Great circle distance to `other` using the haversine formula.
    ///
    /// Units: meters
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        let lat_0 = self.lat_deg.to_radians();
        let lat_1 = other.lat_deg.to_radians();
        let d_lat = lat_1 - lat_0;
        let d_lon = (other.lon_deg - self.lon_deg).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat_0.cos() * lat_1.cos() * (d_lon / 2.0).sin().powi(2);
        let a = util::maths::clamp(&a, &0.0, &1.0);

        EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial bearing of the great circle from this position to `other`, in (-pi, pi].
    ///
    /// Zero is north, positive angles are clockwise (east). When both positions are identical the
    /// bearing is undefined and 0 is returned.
    pub fn bearing_to(&self, other: &GeoPosition) -> f64 {
        let lat_0 = self.lat_deg.to_radians();
        let lat_1 = other.lat_deg.to_radians();
        let d_lon = (other.lon_deg - self.lon_deg).to_radians();

        let y = d_lon.sin() * lat_1.cos();
        let x = lat_0.cos() * lat_1.sin() - lat_0.sin() * lat_1.cos() * d_lon.cos();

        angle::normalize_rad(y.atan2(x))
    }

    /// Position reached by travelling `distance_m` along the great circle starting at this
    /// position with initial bearing `bearing_rad`.
    ///
    /// The longitude of the result is wrapped into [-180, 180]. Altitude and speed are carried
    /// over from this position.
    pub fn destination_point(&self, bearing_rad: f64, distance_m: f64) -> GeoPosition {
        let lat_0 = self.lat_deg.to_radians();
        let lon_0 = self.lon_deg.to_radians();
        let ang_dist = distance_m / EARTH_RADIUS_M;

        let sin_lat_1 = lat_0.sin() * ang_dist.cos() + lat_0.cos() * ang_dist.sin() * bearing_rad.cos();
        let lat_1 = util::maths::clamp(&sin_lat_1, &-1.0, &1.0).asin();

        let lon_1 = lon_0
            + (bearing_rad.sin() * ang_dist.sin() * lat_0.cos())
                .atan2(ang_dist.cos() - lat_0.sin() * lat_1.sin());

        GeoPosition {
            lat_deg: lat_1.to_degrees(),
            lon_deg: angle::normalize_deg(lon_1.to_degrees()),
            alt_m: self.alt_m,
            speed_kmh: self.speed_kmh,
        }
    }

    /// "Reached" equality, true if the positions are less than 3 meters apart.
    ///
    /// This relation is not transitive and must not be used to group positions.
    pub fn proximity_eq(&self, other: &GeoPosition) -> bool {
        self.distance_to(other) < PROXIMITY_THRESHOLD_M
    }

    /// "Identical reading" equality, true if both latitude and longitude differ by less than
    /// 1e-8 degrees.
    pub fn precise_eq(&self, other: &GeoPosition) -> bool {
        (self.lat_deg - other.lat_deg).abs() < PRECISE_THRESHOLD_DEG
            && (self.lon_deg - other.lon_deg).abs() < PRECISE_THRESHOLD_DEG
    }
}

impl PartialEq for GeoPosition {
    fn eq(&self, other: &Self) -> bool {
        self.lat_deg.to_bits() == other.lat_deg.to_bits()
            && self.lon_deg.to_bits() == other.lon_deg.to_bits()
            && self.alt_m.to_bits() == other.alt_m.to_bits()
            && self.speed_kmh.to_bits() == other.speed_kmh.to_bits()
    }
}

impl Eq for GeoPosition {}

impl Hash for GeoPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat_deg.to_bits().hash(state);
        self.lon_deg.to_bits().hash(state);
        self.alt_m.to_bits().hash(state);
        self.speed_kmh.to_bits().hash(state);
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[lat={}, lon={}]", self.lat_deg, self.lon_deg)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::{collections::HashSet, f64::consts::PI};

    fn sample_positions() -> Vec<GeoPosition> {
        vec![
            GeoPosition::new(50.0, 20.0),
            GeoPosition::new(50.0001, 19.999),
            GeoPosition::new(-33.8688, 151.2093),
            GeoPosition::new(0.0, 179.9999),
            GeoPosition::new(0.0, -179.9999),
            GeoPosition::new(89.9, 0.0),
            GeoPosition::new(-45.0, -75.5),
        ]
    }

    #[test]
    fn test_distance_identity_and_symmetry() {
        let ps = sample_positions();

        for a in &ps {
            assert_eq!(a.distance_to(a), 0.0);

            for b in &ps {
                assert_abs_diff_eq!(a.distance_to(b), b.distance_to(a), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_distance_known() {
        // One thousandth of a degree of latitude
        let a = GeoPosition::new(50.0, 20.0);
        let b = GeoPosition::new(50.001, 20.0);
        assert_abs_diff_eq!(a.distance_to(&b), 111.19, epsilon = 0.01);

        // Across the antimeridian is short
        let c = GeoPosition::new(0.0, 179.9999);
        let d = GeoPosition::new(0.0, -179.9999);
        assert!(c.distance_to(&d) < 25.0);
    }

    #[test]
    fn test_out_of_range_is_finite() {
        let a = GeoPosition::new(95.0, 400.0);
        let b = GeoPosition::new(-120.0, -720.0);

        assert!(a.distance_to(&b).is_finite());
        assert!(a.bearing_to(&b).is_finite());
        assert!(a.destination_point(1.0, 1000.0).lat_deg.is_finite());
    }

    #[test]
    fn test_bearing() {
        let o = GeoPosition::new(50.0, 20.0);

        assert_abs_diff_eq!(o.bearing_to(&GeoPosition::new(50.001, 20.0)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(o.bearing_to(&GeoPosition::new(50.0, 20.001)), PI / 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(o.bearing_to(&GeoPosition::new(50.0, 19.999)), -PI / 2.0, epsilon = 1e-4);

        // Due south is +pi, never -pi
        assert_eq!(o.bearing_to(&GeoPosition::new(49.999, 20.0)), PI);

        // Coincident points
        assert_eq!(o.bearing_to(&o), 0.0);
    }

    #[test]
    fn test_destination_round_trip() {
        for a in sample_positions().iter().filter(|p| p.lat_deg.abs() < 80.0) {
            for i in -7..=8 {
                let bearing = i as f64 * PI / 8.0;

                for &dist in &[5.0, 120.0, 2500.0] {
                    let b = a.destination_point(bearing, dist);

                    assert_abs_diff_eq!(a.distance_to(&b), dist, epsilon = 1e-6 * dist.max(1.0));
                    assert_abs_diff_eq!(
                        angle::shortest_delta(bearing, a.bearing_to(&b)),
                        0.0,
                        epsilon = 1e-6
                    );
                    assert!(b.lon_deg >= -180.0 && b.lon_deg <= 180.0);
                }
            }
        }
    }

    #[test]
    fn test_destination_carries_alt_speed() {
        let a = GeoPosition {
            lat_deg: 50.0,
            lon_deg: 20.0,
            alt_m: 123.0,
            speed_kmh: 1.2,
        };
        let b = a.destination_point(0.3, 40.0);

        assert_eq!(b.alt_m, 123.0);
        assert_eq!(b.speed_kmh, 1.2);
    }

    #[test]
    fn test_equalities() {
        let a = GeoPosition::new(50.0, 20.0);

        // 2.78 m north
        let near = GeoPosition::new(50.000025, 20.0);
        assert!(a.proximity_eq(&near));
        assert!(!a.precise_eq(&near));
        assert_ne!(a, near);

        let same_reading = GeoPosition::new(50.000_000_001, 20.000_000_001);
        assert!(a.precise_eq(&same_reading));
        assert_ne!(a, same_reading);

        // Not transitive
        let b = GeoPosition::new(50.00002, 20.0);
        let c = GeoPosition::new(50.00004, 20.0);
        assert!(a.proximity_eq(&b) && b.proximity_eq(&c));
        assert!(!a.proximity_eq(&c));
    }

    #[test]
    fn test_hash_is_bitwise() {
        let mut set = HashSet::new();
        set.insert(GeoPosition::new(50.0, 20.0));
        set.insert(GeoPosition::new(50.0, 20.0));
        set.insert(GeoPosition::new(50.000025, 20.0));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(GeoPosition::new(50.5, -1.25).to_string(), "[lat=50.5, lon=-1.25]");
    }
}

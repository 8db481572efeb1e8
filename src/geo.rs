//! Great-circle geometry for the room locator.
//!
//! Everything here is pure: the functions take two [Coordinate]s and hand
//! back a distance in kilometers, an initial compass bearing in degrees, or
//! the [Cardinal] sector a bearing falls into. Missing or malformed
//! coordinates are refused with [GeoError::InvalidCoordinate] instead of
//! quietly producing NaN.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean radius of the earth, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Width of one cardinal sector, in degrees.
const SECTOR_DEGREES: f64 = 45.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Degrees north of the equator, in `[-90, 90]`
    pub latitude: f64,
    /// Degrees east of the prime meridian, in `[-180, 180]`
    pub longitude: f64,
}

/// Things that can go wrong when doing geometry on bad input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// A latitude or longitude was NaN, infinite, or out of range.
    InvalidCoordinate {
        /// The latitude that was given
        latitude: f64,
        /// The longitude that was given
        longitude: f64,
    },

    /// A bearing was NaN or infinite.
    InvalidBearing(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeoError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "invalid coordinate ({}, {})", latitude, longitude),
            GeoError::InvalidBearing(bearing) => write!(f, "invalid bearing {}", bearing),
        }
    }
}

impl std::error::Error for GeoError {}

impl Coordinate {
    /// Builds a [Coordinate], refusing anything that isn't a finite point on
    /// the globe.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coord = Coordinate {
            latitude,
            longitude,
        };
        coord.validate()?;
        Ok(coord)
    }

    /// True if both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Returns the coordinate back if it is valid, and
    /// [GeoError::InvalidCoordinate] otherwise.
    pub fn validate(self) -> Result<Self, GeoError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Great-circle distance between `a` and `b` in kilometers, using the
/// haversine formula.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> Result<f64, GeoError> {
    let a = a.validate()?;
    let b = b.validate()?;

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Ok(EARTH_RADIUS_KM * c)
}

/// Initial compass bearing from `a` towards `b`, in degrees within `[0, 360)`.
/// North is 0 and the angle grows clockwise.
pub fn bearing_degrees(a: &Coordinate, b: &Coordinate) -> Result<f64, GeoError> {
    let a = a.validate()?;
    let b = b.validate()?;

    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let theta = y.atan2(x).to_degrees();

    Ok((theta + 360.0) % 360.0)
}

/// One of the eight compass sectors, each 45° wide and centered on its name.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinal {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

const SECTORS: [Cardinal; 8] = [
    Cardinal::North,
    Cardinal::Northeast,
    Cardinal::East,
    Cardinal::Southeast,
    Cardinal::South,
    Cardinal::Southwest,
    Cardinal::West,
    Cardinal::Northwest,
];

impl Cardinal {
    /// Picks the sector for a bearing with `round(bearing / 45) mod 8`.
    /// Halfway bearings round up, so 22.5° is Northeast and 337.5° wraps
    /// around to North.
    pub fn from_bearing(bearing: f64) -> Result<Self, GeoError> {
        if !bearing.is_finite() {
            return Err(GeoError::InvalidBearing(bearing));
        }
        let normalized = bearing.rem_euclid(360.0);
        let idx = (normalized / SECTOR_DEGREES + 0.5).floor() as usize % SECTORS.len();
        Ok(SECTORS[idx])
    }

    /// The human readable name of the sector.
    pub fn label(&self) -> &'static str {
        match self {
            Cardinal::North => "North",
            Cardinal::Northeast => "Northeast",
            Cardinal::East => "East",
            Cardinal::Southeast => "Southeast",
            Cardinal::South => "South",
            Cardinal::Southwest => "Southwest",
            Cardinal::West => "West",
            Cardinal::Northwest => "Northwest",
        }
    }
}

impl fmt::Display for Cardinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Shorthand for `Cardinal::from_bearing(bearing)?.label()`.
pub fn cardinal_label(bearing: f64) -> Result<&'static str, GeoError> {
    Cardinal::from_bearing(bearing).map(|c| c.label())
}

//! Where is the user standing?
//!
//! The guidance core never looks this up by itself. Whoever drives it asks a
//! [Geolocator] once and, if that fails, falls back to the configured
//! origin with [locate_or_fallback].

use crate::config::GuideConfig;
use crate::geo::Coordinate;

use log::{debug, warn};
use rand::prelude::*;
use std::fmt;

/// Ways a position request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    /// No position source is available at all.
    Unavailable,
    /// The source didn't answer in time.
    Timeout,
    /// The user said no.
    PermissionDenied,
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GeolocationError::Unavailable => "position unavailable",
            GeolocationError::Timeout => "position request timed out",
            GeolocationError::PermissionDenied => "permission to read position denied",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for GeolocationError {}

/// `Geolocator`
///
/// A one-shot position source. Each call either produces a [Coordinate] or
/// says why it couldn't.
pub trait Geolocator {
    /// Asks for the current position.
    fn current_position(&mut self) -> Result<Coordinate, GeolocationError>;
}

/// A [Geolocator] that always answers the same thing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGeolocator {
    position: Option<Coordinate>,
}

impl FixedGeolocator {
    /// Always reports `position`.
    pub fn new(position: Coordinate) -> Self {
        FixedGeolocator {
            position: Some(position),
        }
    }

    /// Always reports [GeolocationError::Unavailable].
    pub fn unavailable() -> Self {
        FixedGeolocator { position: None }
    }
}

impl From<Option<Coordinate>> for FixedGeolocator {
    fn from(position: Option<Coordinate>) -> Self {
        FixedGeolocator { position }
    }
}

impl Geolocator for FixedGeolocator {
    fn current_position(&mut self) -> Result<Coordinate, GeolocationError> {
        self.position.ok_or(GeolocationError::Unavailable)
    }
}

// Wider than this and the jitter would cover the whole globe anyway
const MAX_NOISE_DEG: f64 = 180.0;

/// A pretend GPS that wanders a little around a center point, for demos and
/// for exercising the fallback path.
#[derive(Debug, Clone)]
pub struct SimulatedGeolocator {
    center: Coordinate,
    noise_deg: f64,
    failure: Option<GeolocationError>,
    rng: StdRng,
}

impl SimulatedGeolocator {
    /// Start a builder for a simulated source around `center`.
    pub fn builder(center: Coordinate) -> SimulatedGeolocatorBuilder {
        SimulatedGeolocatorBuilder {
            center,
            noise_deg: 0.00005,
            failure: None,
            seed: None,
        }
    }

    /// Make every following request fail with `error`, or recover with `None`.
    pub fn set_failure(&mut self, failure: Option<GeolocationError>) {
        self.failure = failure;
    }
}

impl Geolocator for SimulatedGeolocator {
    fn current_position(&mut self) -> Result<Coordinate, GeolocationError> {
        if let Some(error) = self.failure {
            return Err(error);
        }

        let jitter = |rng: &mut StdRng, noise: f64| {
            if noise > 0.0 {
                rng.gen_range(-noise..noise)
            } else {
                0.0
            }
        };
        let latitude = (self.center.latitude + jitter(&mut self.rng, self.noise_deg))
            .clamp(-90.0, 90.0);
        let longitude = (self.center.longitude + jitter(&mut self.rng, self.noise_deg))
            .clamp(-180.0, 180.0);

        Ok(Coordinate {
            latitude,
            longitude,
        })
    }
}

/// Builder for [SimulatedGeolocator].
#[derive(Debug, Clone)]
pub struct SimulatedGeolocatorBuilder {
    center: Coordinate,
    noise_deg: f64,
    failure: Option<GeolocationError>,
    seed: Option<u64>,
}

impl SimulatedGeolocatorBuilder {
    /// Largest offset, in degrees, added to each component. Anything that
    /// isn't a finite number means no noise; more than 180° is capped.
    pub fn noise(self, noise_deg: f64) -> Self {
        let noise_deg = if noise_deg.is_finite() {
            noise_deg.abs().min(MAX_NOISE_DEG)
        } else {
            0.0
        };
        SimulatedGeolocatorBuilder { noise_deg, ..self }
    }

    /// Start out failing with `error`.
    pub fn failing(self, error: GeolocationError) -> Self {
        SimulatedGeolocatorBuilder {
            failure: Some(error),
            ..self
        }
    }

    /// Fix the random seed so positions are reproducible.
    pub fn seed(self, seed: u64) -> Self {
        SimulatedGeolocatorBuilder {
            seed: Some(seed),
            ..self
        }
    }

    /// Finish building.
    pub fn build(self) -> SimulatedGeolocator {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SimulatedGeolocator {
            center: self.center,
            noise_deg: self.noise_deg,
            failure: self.failure,
            rng,
        }
    }
}

/// A position and whether it actually came from the geolocator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    /// Where we think the user is
    pub position: Coordinate,
    /// True if `position` is the configured fallback
    pub is_fallback: bool,
}

/// Asks `geolocator` for a position, and hands back the configured fallback
/// origin if it can't give a usable one. The failure is logged, not
/// returned, so guidance can carry on.
pub fn locate_or_fallback(geolocator: &mut impl Geolocator, config: &GuideConfig) -> Located {
    match geolocator.current_position().map(Coordinate::validate) {
        Ok(Ok(position)) => {
            debug!("Located user at {}", position);
            Located {
                position,
                is_fallback: false,
            }
        }
        Ok(Err(e)) => {
            warn!("Geolocator gave {}, using fallback {}", e, config.fallback_origin);
            Located {
                position: config.fallback_origin,
                is_fallback: true,
            }
        }
        Err(e) => {
            warn!("Could not locate user ({}), using fallback {}", e, config.fallback_origin);
            Located {
                position: config.fallback_origin,
                is_fallback: true,
            }
        }
    }
}

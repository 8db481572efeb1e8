//! Tunables for guidance, read from a small [ron] file. Every field has a
//! default, so an empty `()` is a complete configuration:
//!
//! ```text
//! (
//!     walking_speed_kmh: 1.4,
//!     fallback_origin: (latitude: -12.0464, longitude: -77.0428),
//!     narration_language: "en-US",
//!     narration_rate: 1.2,
//!     narration_enabled: true,
//! )
//! ```

use crate::geo::{Coordinate, GeoError};

use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{Read, Write},
    ops::RangeInclusive,
    path::Path,
};

/// Pace used for ETAs, in km/h. Slower than a typical stroll on purpose;
/// it is the accessibility pace the app has always quoted.
pub const DEFAULT_WALKING_SPEED_KMH: f64 = 1.4;

/// Where we pretend the user is when geolocation fails.
pub const DEFAULT_FALLBACK_ORIGIN: Coordinate = Coordinate {
    latitude: -12.0464,
    longitude: -77.0428,
};

/// Language tag handed to the narrator.
pub const DEFAULT_NARRATION_LANGUAGE: &str = "en-US";

/// Speech rate handed to the narrator.
pub const DEFAULT_NARRATION_RATE: f32 = 1.2;

/// Slowest and fastest speech rates a config may ask for.
pub const NARRATION_RATE_RANGE: RangeInclusive<f32> = 0.1..=10.0;

/// All the knobs that shape a guidance session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Walking pace used to turn distance into minutes
    pub walking_speed_kmh: f64,
    /// Origin used when the user's location can't be found
    pub fallback_origin: Coordinate,
    /// Language tag for spoken instructions
    pub narration_language: String,
    /// Speech rate for spoken instructions, 1.0 is normal
    pub narration_rate: f32,
    /// Whether a fresh guide starts with narration switched on
    pub narration_enabled: bool,
}

impl Default for GuideConfig {
    fn default() -> Self {
        GuideConfig {
            walking_speed_kmh: DEFAULT_WALKING_SPEED_KMH,
            fallback_origin: DEFAULT_FALLBACK_ORIGIN,
            narration_language: DEFAULT_NARRATION_LANGUAGE.to_owned(),
            narration_rate: DEFAULT_NARRATION_RATE,
            narration_enabled: true,
        }
    }
}

/// Errors while reading or writing a [GuideConfig].
#[derive(Debug)]
pub enum ConfigError {
    /// Returned when io fails when reading or writing files.
    IoError(std::io::Error),

    /// Returned when serialization fails.
    RonError(ron::Error),

    /// Returned when deserialization fails.
    RonSpannedError(ron::de::SpannedError),

    /// The fallback origin is not a real coordinate.
    InvalidFallback(GeoError),

    /// The walking speed must be a positive, finite number.
    InvalidWalkingSpeed(f64),

    /// The speech rate is outside [NARRATION_RATE_RANGE].
    InvalidNarrationRate(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ConfigError as CE;
        let msg = match self {
            CE::IoError(error) => Cow::from(format!("io error: {}", error)),
            CE::RonError(error) => Cow::from(format!("ron error: {}", error)),
            CE::RonSpannedError(error) => Cow::from(format!("ron spanning error: {}", error)),
            CE::InvalidFallback(error) => Cow::from(format!("bad fallback origin: {}", error)),
            CE::InvalidWalkingSpeed(speed) => {
                Cow::from(format!("walking speed must be positive, got {}", speed))
            }
            CE::InvalidNarrationRate(rate) => Cow::from(format!(
                "narration rate must be between {} and {}, got {}",
                NARRATION_RATE_RANGE.start(),
                NARRATION_RATE_RANGE.end(),
                rate
            )),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl GuideConfig {
    /// Read a [GuideConfig] from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading guide config from {}", path.display());
        let mut handle = File::open(path).map_err(ConfigError::IoError)?;
        Self::from_reader(&mut handle)
    }

    /// Read a [GuideConfig] from the [Read]able object provided.
    pub fn from_reader(reader: &mut impl Read) -> Result<Self, ConfigError> {
        let mut raw_text = Vec::new();
        reader
            .read_to_end(&mut raw_text)
            .map_err(ConfigError::IoError)?;

        let config = ron::de::from_bytes::<GuideConfig>(&raw_text)
            .map_err(ConfigError::RonSpannedError)?;
        config.validate()
    }

    /// Write out a [GuideConfig] to the [Write]able object provided.
    pub fn to_writer(&self, writer: &mut impl Write) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::RonError)?;
        writer
            .write_all(text.as_bytes())
            .map_err(ConfigError::IoError)
    }

    /// Checks the values that serde can't check for us.
    pub fn validate(self) -> Result<Self, ConfigError> {
        self.fallback_origin
            .validate()
            .map_err(ConfigError::InvalidFallback)?;
        if !(self.walking_speed_kmh.is_finite() && self.walking_speed_kmh > 0.0) {
            return Err(ConfigError::InvalidWalkingSpeed(self.walking_speed_kmh));
        }
        if !NARRATION_RATE_RANGE.contains(&self.narration_rate) {
            return Err(ConfigError::InvalidNarrationRate(self.narration_rate));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = GuideConfig::from_reader(&mut Cursor::new("()")).unwrap();
        assert_eq!(config, GuideConfig::default());
        assert_eq!(config.walking_speed_kmh, 1.4);
        assert_eq!(config.fallback_origin.latitude, -12.0464);
        assert_eq!(config.fallback_origin.longitude, -77.0428);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let text = "(walking_speed_kmh: 5.0, narration_language: \"es-ES\")";
        let config = GuideConfig::from_reader(&mut Cursor::new(text)).unwrap();
        assert_eq!(config.walking_speed_kmh, 5.0);
        assert_eq!(config.narration_language, "es-ES");
        assert_eq!(config.narration_rate, DEFAULT_NARRATION_RATE);
        assert!(config.narration_enabled);
    }

    #[test]
    fn write_and_read_path() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        let config = GuideConfig {
            walking_speed_kmh: 4.5,
            narration_enabled: false,
            ..GuideConfig::default()
        };

        config.to_writer(tempfile.as_file_mut()).unwrap();
        let read_config = GuideConfig::from_path(tempfile.path()).unwrap();
        assert_eq!(config, read_config);
    }

    #[test]
    fn zero_speed_is_rejected() {
        let res = GuideConfig::from_reader(&mut Cursor::new("(walking_speed_kmh: 0.0)"));
        assert!(matches!(res, Err(ConfigError::InvalidWalkingSpeed(_))));
    }

    #[test]
    fn narration_rate_out_of_range_is_rejected() {
        for text in [
            "(narration_rate: 1.0e-30)",
            "(narration_rate: 0.0)",
            "(narration_rate: -1.2)",
            "(narration_rate: 50.0)",
        ] {
            let res = GuideConfig::from_reader(&mut Cursor::new(text));
            assert!(
                matches!(res, Err(ConfigError::InvalidNarrationRate(_))),
                "{} was accepted",
                text
            );
        }

        let nan = GuideConfig {
            narration_rate: f32::NAN,
            ..GuideConfig::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(ConfigError::InvalidNarrationRate(_))
        ));

        let slow = GuideConfig::from_reader(&mut Cursor::new("(narration_rate: 0.1)")).unwrap();
        assert_eq!(slow.narration_rate, 0.1);
    }

    #[test]
    fn bad_fallback_is_rejected() {
        let text = "(fallback_origin: (latitude: 100.0, longitude: 0.0))";
        let res = GuideConfig::from_reader(&mut Cursor::new(text));
        assert!(matches!(res, Err(ConfigError::InvalidFallback(_))));
    }

    #[test]
    fn bundled_config_is_the_default() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/guide.ron");
        assert_eq!(GuideConfig::from_path(path).unwrap(), GuideConfig::default());
    }

    #[test]
    fn garbage_is_a_ron_error() {
        let res = GuideConfig::from_reader(&mut Cursor::new("walking_speed_kmh = 3"));
        assert!(matches!(res, Err(ConfigError::RonSpannedError(_))));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = GuideConfig::from_path(dir.path().join("nope.ron"));
        assert!(matches!(res, Err(ConfigError::IoError(_))));
    }
}

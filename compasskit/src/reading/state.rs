//! Core reading types for the compass pipeline.

use std::time::Instant;

use super::aggregate::normalize_heading;

/// One orientation sample from the heading sensor.
///
/// `heading` is always in `[0,360)` after construction; raw platform
/// values (negative, overflowing, non-finite) are normalized by
/// [`normalize_heading`]. `accuracy` is the platform's precision
/// estimate in degrees, with any negative value acting as the
/// "invalid" sentinel.
#[derive(Debug, Clone)]
pub struct HeadingReading {
    /// Display heading in degrees, normalized to `[0,360)`.
    pub heading: f64,

    /// True-north heading in degrees.
    pub true_heading: f64,

    /// Magnetic heading in degrees.
    pub magnetic_heading: f64,

    /// Precision estimate in degrees; negative means invalid.
    pub accuracy: f64,

    /// When the sample was taken.
    pub timestamp: Instant,
}

impl HeadingReading {
    /// Create a reading from raw platform values, normalizing the
    /// display heading.
    pub fn new(magnetic_heading: f64, true_heading: f64, accuracy: f64) -> Self {
        Self::with_timestamp(magnetic_heading, true_heading, accuracy, Instant::now())
    }

    /// Create a reading with an explicit timestamp.
    pub fn with_timestamp(
        magnetic_heading: f64,
        true_heading: f64,
        accuracy: f64,
        timestamp: Instant,
    ) -> Self {
        Self {
            heading: normalize_heading(magnetic_heading),
            true_heading,
            magnetic_heading,
            accuracy,
            timestamp,
        }
    }

    /// Cardinal direction for this reading.
    pub fn cardinal_direction(&self) -> CardinalDirection {
        CardinalDirection::from_heading(self.heading)
    }

    /// Accuracy tier for this reading.
    pub fn accuracy_tier(&self) -> AccuracyTier {
        AccuracyTier::from_accuracy(self.accuracy)
    }

    /// Heading formatted for display, e.g. `"272°"`.
    pub fn formatted_heading(&self) -> String {
        format!("{:.0}°", self.heading)
    }
}

/// One position fix from the location sensor.
#[derive(Debug, Clone)]
pub struct PositionReading {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,

    /// Altitude above sea level in meters.
    pub altitude: f64,

    /// Horizontal accuracy in meters.
    pub accuracy: f64,

    /// When the fix was taken.
    pub timestamp: Instant,
}

impl PositionReading {
    /// Create a position reading stamped with the current time.
    pub fn new(latitude: f64, longitude: f64, altitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            accuracy,
            timestamp: Instant::now(),
        }
    }

    /// Coordinate formatted for display, e.g. `"53.550000, 10.000000"`.
    pub fn formatted_coordinate(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }

    /// Altitude formatted for display, e.g. `"12.5 m"`.
    pub fn formatted_altitude(&self) -> String {
        format!("{:.1} m", self.altitude)
    }
}

/// The 8 principal compass points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CardinalDirection {
    /// Derive the cardinal direction from a heading in degrees.
    ///
    /// Sectors are 22.5° wide and centered on the 8 points; the North
    /// sector wraps across 0° and covers `[337.5,360) ∪ [0,22.5)`.
    /// Periodic in 360°, so any real heading maps to the same sector
    /// as its normalized form. Non-finite input falls back to North.
    pub fn from_heading(heading: f64) -> Self {
        if !heading.is_finite() {
            return Self::North;
        }
        let adjusted = normalize_heading(heading);
        match adjusted {
            h if h < 22.5 => Self::North,
            h if h < 67.5 => Self::NorthEast,
            h if h < 112.5 => Self::East,
            h if h < 157.5 => Self::SouthEast,
            h if h < 202.5 => Self::South,
            h if h < 247.5 => Self::SouthWest,
            h if h < 292.5 => Self::West,
            h if h < 337.5 => Self::NorthWest,
            _ => Self::North,
        }
    }

    /// Short display label, e.g. `"NE"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::North => "N",
            Self::NorthEast => "NE",
            Self::East => "E",
            Self::SouthEast => "SE",
            Self::South => "S",
            Self::SouthWest => "SW",
            Self::West => "W",
            Self::NorthWest => "NW",
        }
    }
}

impl std::fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Coarse classification of a heading sample's precision estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyTier {
    /// Negative sentinel - the platform could not estimate precision.
    Invalid,
    /// Better than 5°.
    High,
    /// Better than 15°.
    Medium,
    /// 15° or worse.
    Low,
}

impl AccuracyTier {
    /// Classify a raw precision estimate in degrees.
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy < 0.0 {
            Self::Invalid
        } else if accuracy < 5.0 {
            Self::High
        } else if accuracy < 15.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Display label, e.g. `"High"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

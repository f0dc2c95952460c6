use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::math;

/// How long a track may go unmatched before it is evicted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    Frames(usize),
    Seconds(f32),
}

impl Tolerance {
    /// Tolerance in frames at the given fps.
    #[inline]
    pub fn frames(&self, fps: f32) -> usize {
        match *self {
            Tolerance::Frames(n) => n,
            Tolerance::Seconds(s) => math::frames_for(s, fps),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Centroid distance (px) below which an observation may continue a track
    pub max_distance: f32,
    /// Evict once consecutive misses exceed this
    pub max_missed: Tolerance,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_distance: 50.0,
            max_missed: Tolerance::Frames(10),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Length of the rolling history
    pub window_seconds: f32,
    /// A box is flat when width / height is strictly above this
    pub flat_aspect_ratio: f32,
    /// Share of flat samples in the window required to call a fall
    pub min_flat_fraction: f32,
    /// Latest height must be at most this share of the tallest upright height in the window
    pub max_height_ratio: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_seconds: 1.0,
            flat_aspect_ratio: 1.0,
            min_flat_fraction: 0.6,
            max_height_ratio: 0.8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub tracker: TrackerConfig,
    pub classifier: ClassifierConfig,
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tracker.max_distance must be positive, got {}",
                self.max_distance
            )));
        }

        if let Tolerance::Seconds(s) = self.max_missed {
            if !(s.is_finite() && s >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "tracker.max_missed seconds must be non-negative, got {}",
                    s
                )));
            }
        }

        Ok(())
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "classifier.window_seconds must be positive, got {}",
                self.window_seconds
            )));
        }

        if !(self.flat_aspect_ratio.is_finite() && self.flat_aspect_ratio > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "classifier.flat_aspect_ratio must be positive, got {}",
                self.flat_aspect_ratio
            )));
        }

        if !(self.min_flat_fraction > 0.0 && self.min_flat_fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "classifier.min_flat_fraction must be in (0, 1], got {}",
                self.min_flat_fraction
            )));
        }

        if !(self.max_height_ratio > 0.0 && self.max_height_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "classifier.max_height_ratio must be in (0, 1], got {}",
                self.max_height_ratio
            )));
        }

        Ok(())
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.tracker.validate()?;
        self.classifier.validate()
    }

    pub fn from_json(src: &str) -> Result<Self, Error> {
        let config: MonitorConfig = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }
}

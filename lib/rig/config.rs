use super::{Geometry, Point};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

/// The reason why parsing rig configuration failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse rig configuration")]
pub struct ParseRigConfigError(ron::de::SpannedError);

/// Runtime configuration for the physical rig.
#[derive(Debug, Display, Clone, PartialEq, Deserialize, Serialize)]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    /// The center of square `a1` on the machine plane.
    #[serde(default)]
    pub origin: Point,

    /// The distance between the centers of adjacent squares, in millimeters.
    #[serde(default = "RigConfig::default_pitch")]
    pub pitch: f64,

    /// The locations of the storage slots, in claim order.
    #[serde(default = "RigConfig::default_slots")]
    pub slots: Vec<Point>,

    /// How long to wait for the confirmation of a single action.
    #[serde(default = "RigConfig::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl RigConfig {
    fn default_pitch() -> f64 {
        50.
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(60)
    }

    // Two columns of 16 slots each flanking the board.
    fn default_slots() -> Vec<Point> {
        let pitch = Self::default_pitch();
        let column = move |x: f64| (0..16).map(move |i| Point::new(x, i as f64 * pitch / 2.));
        column(-2. * pitch).chain(column(9. * pitch)).collect()
    }

    /// The coordinate mapper for this layout.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.origin, self.pitch)
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        RigConfig {
            origin: Point::default(),
            pitch: Self::default_pitch(),
            slots: Self::default_slots(),
            timeout: Self::default_timeout(),
        }
    }
}

impl FromStr for RigConfig {
    type Err = ParseRigConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

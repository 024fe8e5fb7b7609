use derive_more::Display;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use test_strategy::Arbitrary;

/// A location on the machine plane, in millimeters.
#[derive(Debug, Display, Default, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(Arbitrary))]
#[display(fmt = "({:.3}, {:.3})", x, y)]
#[serde(deny_unknown_fields)]
pub struct Point {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

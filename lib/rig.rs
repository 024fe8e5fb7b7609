mod action;
mod config;
mod geometry;
mod plan;
mod point;
mod slots;

pub use action::*;
pub use config::*;
pub use geometry::*;
pub use plan::*;
pub use point::*;
pub use slots::*;

//! Mobility type definitions.
//!
//! Geometry primitives and the [`MobilityBehavior`] variants attached to
//! nodes. Behaviors only carry parameters; stepping positions over time is
//! the engine's job.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D vector, used both for positions (m) and velocities (m/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(&self, other: &Vector2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn add_scaled(&self, direction: &Vector2, factor: f64) -> Vector2 {
        Vector2::new(self.x + direction.x * factor, self.y + direction.y * factor)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Axis-aligned rectangle `[x_min, x_max] x [y_min, y_max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Area {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// Finite bounds with a non-empty interior
    pub fn is_valid(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_min < self.x_max
            && self.y_min < self.y_max
    }

    pub fn contains(&self, point: &Vector2) -> bool {
        point.x >= self.x_min && point.x <= self.x_max && point.y >= self.y_min && point.y <= self.y_max
    }

    /// True when the interiors overlap; touching edges do not count
    pub fn intersects(&self, other: &Area) -> bool {
        self.x_min < other.x_max
            && other.x_min < self.x_max
            && self.y_min < other.y_max
            && other.y_min < self.y_max
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new((self.x_min + self.x_max) / 2.0, (self.y_min + self.y_max) / 2.0)
    }

    /// Uniformly distributed point inside the area
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector2 {
        Vector2::new(
            rng.gen_range(self.x_min..=self.x_max),
            rng.gen_range(self.y_min..=self.y_max),
        )
    }

    /// Nearest point inside the area
    pub fn clamp(&self, point: Vector2) -> Vector2 {
        Vector2::new(
            point.x.clamp(self.x_min, self.x_max),
            point.y.clamp(self.y_min, self.y_max),
        )
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]x[{}, {}]", self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

/// Closed speed interval in m/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl SpeedRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min <= self.max
    }

    /// Uniformly distributed speed inside the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// Motion behavior of a single node, fixed for the node's lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum MobilityBehavior {
    /// Random walk reflected at the area bounds; speed re-drawn at each turn
    BoundedRandomWalk { area: Area, speed: SpeedRange },
    /// Straight-line motion from a fixed start
    ConstantVelocity { initial_position: Vector2, velocity: Vector2 },
    /// Endless sequence of uniform waypoints inside `area`, pausing at each one
    RandomWaypoint { area: Area, speed: SpeedRange, pause: f64 },
}

impl MobilityBehavior {
    /// Short model name for logs and exports
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::BoundedRandomWalk { .. } => "bounded_random_walk",
            Self::ConstantVelocity { .. } => "constant_velocity",
            Self::RandomWaypoint { .. } => "random_waypoint",
        }
    }

    /// Area the node is confined to, if the model confines it
    pub fn bounds(&self) -> Option<&Area> {
        match self {
            Self::BoundedRandomWalk { area, .. } | Self::RandomWaypoint { area, .. } => Some(area),
            Self::ConstantVelocity { .. } => None,
        }
    }
}

//! Position stepping for mobility behaviors.
//!
//! Each node carries its own seeded random stream so that adding or
//! removing one node never perturbs the trajectory of another.

use rand::rngs::StdRng;
use rand::Rng;
use std::f64::consts::TAU;

use crate::mobility::{Area, MobilityBehavior, SpeedRange, Vector2};

#[derive(Debug, Clone)]
enum MotionState {
    Walk {
        area: Area,
        speed_range: SpeedRange,
        /// Unit heading
        direction: Vector2,
        speed: f64,
        /// Distance left before the next turn
        remaining: f64,
    },
    Constant {
        origin: Vector2,
        velocity: Vector2,
        elapsed: f64,
    },
    Waypoint {
        area: Area,
        speed_range: SpeedRange,
        pause: f64,
        target: Vector2,
        speed: f64,
        /// Pause time left at the current waypoint
        paused_for: f64,
    },
}

/// Moving state of one node
#[derive(Debug, Clone)]
pub struct NodeMotion {
    position: Vector2,
    state: MotionState,
    walk_distance: f64,
    rng: StdRng,
    waypoints_visited: u64,
}

impl NodeMotion {
    /// Initial placement: uniform in the area for walkers and waypoint
    /// nodes, the fixed start for constant-velocity nodes.
    pub fn new(behavior: &MobilityBehavior, walk_distance: f64, mut rng: StdRng) -> Self {
        let (position, state) = match *behavior {
            MobilityBehavior::BoundedRandomWalk { area, speed } => {
                let position = area.sample(&mut rng);
                let direction = random_heading(&mut rng);
                let speed_now = speed.sample(&mut rng);
                (
                    position,
                    MotionState::Walk {
                        area,
                        speed_range: speed,
                        direction,
                        speed: speed_now,
                        remaining: walk_distance,
                    },
                )
            }
            MobilityBehavior::ConstantVelocity {
                initial_position,
                velocity,
            } => (
                initial_position,
                MotionState::Constant {
                    origin: initial_position,
                    velocity,
                    elapsed: 0.0,
                },
            ),
            MobilityBehavior::RandomWaypoint { area, speed, pause } => {
                let position = area.sample(&mut rng);
                let target = area.sample(&mut rng);
                let speed_now = speed.sample(&mut rng);
                (
                    position,
                    MotionState::Waypoint {
                        area,
                        speed_range: speed,
                        pause,
                        target,
                        speed: speed_now,
                        paused_for: 0.0,
                    },
                )
            }
        };

        Self {
            position,
            state,
            walk_distance,
            rng,
            waypoints_visited: 0,
        }
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    /// Current waypoint target, for waypoint nodes
    pub fn target(&self) -> Option<Vector2> {
        match &self.state {
            MotionState::Waypoint { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn waypoints_visited(&self) -> u64 {
        self.waypoints_visited
    }

    /// Move the node forward by `dt` simulated seconds
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        if let MotionState::Constant {
            origin,
            velocity,
            elapsed,
        } = &mut self.state
        {
            *elapsed += dt;
            self.position = origin.add_scaled(velocity, *elapsed);
        } else if matches!(self.state, MotionState::Walk { .. }) {
            self.advance_walk(dt);
        } else {
            self.advance_waypoint(dt);
        }
    }

    fn advance_walk(&mut self, dt: f64) {
        let MotionState::Walk {
            area,
            speed_range,
            direction,
            speed,
            remaining,
        } = &mut self.state
        else {
            return;
        };

        let mut travel = *speed * dt;
        while travel > 0.0 {
            let leg = travel.min(*remaining);
            let mut next = self.position.add_scaled(direction, leg);

            // reflect off the bounds
            if next.x < area.x_min {
                next.x = 2.0 * area.x_min - next.x;
                direction.x = -direction.x;
            } else if next.x > area.x_max {
                next.x = 2.0 * area.x_max - next.x;
                direction.x = -direction.x;
            }
            if next.y < area.y_min {
                next.y = 2.0 * area.y_min - next.y;
                direction.y = -direction.y;
            } else if next.y > area.y_max {
                next.y = 2.0 * area.y_max - next.y;
                direction.y = -direction.y;
            }
            self.position = area.clamp(next);

            travel -= leg;
            *remaining -= leg;
            if *remaining <= 0.0 {
                *direction = random_heading(&mut self.rng);
                let new_speed = speed_range.sample(&mut self.rng);
                // keep the leftover distance consistent with the new speed
                travel *= new_speed / *speed;
                *speed = new_speed;
                *remaining = self.walk_distance;
            }
        }
    }

    fn advance_waypoint(&mut self, dt: f64) {
        let MotionState::Waypoint {
            area,
            speed_range,
            pause,
            target,
            speed,
            paused_for,
        } = &mut self.state
        else {
            return;
        };

        let mut time_left = dt;
        while time_left > 0.0 {
            if *paused_for > 0.0 {
                let wait = time_left.min(*paused_for);
                *paused_for -= wait;
                time_left -= wait;
                if *paused_for <= 0.0 {
                    *target = area.sample(&mut self.rng);
                    *speed = speed_range.sample(&mut self.rng);
                }
                continue;
            }

            let distance = self.position.distance_to(target);
            let reach = *speed * time_left;
            if reach < distance {
                let heading = Vector2::new(
                    (target.x - self.position.x) / distance,
                    (target.y - self.position.y) / distance,
                );
                self.position = self.position.add_scaled(&heading, reach);
                time_left = 0.0;
            } else {
                self.position = *target;
                time_left -= if *speed > 0.0 { distance / *speed } else { time_left };
                self.waypoints_visited += 1;
                if *pause > 0.0 {
                    *paused_for = *pause;
                } else {
                    *target = area.sample(&mut self.rng);
                    *speed = speed_range.sample(&mut self.rng);
                }
            }
        }
    }
}

fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vector2 {
    let angle = rng.gen_range(0.0..TAU);
    Vector2::new(angle.cos(), angle.sin())
}

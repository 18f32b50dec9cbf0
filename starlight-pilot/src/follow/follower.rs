use crate::config::FollowerConfig;
use crate::drive::{select_best_path, window_center};
use log::debug;
use serde::Serialize;
use std::f32::consts::{PI, TAU};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum FollowerState {
    #[default]
    Idle,
    Rotating,
    /// Entered once the heading is within tolerance; emits a single forward
    /// move and falls back to `Idle` on the same tick.
    Advancing,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PathTarget {
    pub corridor_index: i32,
    pub target_heading_angle: f32,
}

/// Camera motion requested by one follower tick.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Motion {
    pub rotation: f32,
    pub forward: f32,
}

impl Motion {
    pub fn is_still(&self) -> bool {
        self.rotation == 0.0 && self.forward == 0.0
    }
}

/// Wraps `angle` into `[-π, π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Picks the best window of `scores` and turns its centre corridor into a
/// heading, seen from a camera at world X `camera_x`.
pub fn plan_target(scores: &[f32], camera_x: f32, config: &FollowerConfig) -> Option<PathTarget> {
    let start = select_best_path(scores, config.window_size)?;
    let center = window_center(start, config.window_size);

    let slice_width = config.world_width / scores.len() as f32;
    let target_x = (center as f32 + 0.5) * slice_width - config.world_width / 2.0;
    let heading = (target_x - camera_x).atan2(config.lookahead_z);

    Some(PathTarget {
        corridor_index: center as i32,
        target_heading_angle: heading,
    })
}

#[derive(Debug, Clone)]
pub struct PathFollower {
    config: FollowerConfig,
    state: FollowerState,
    target: Option<PathTarget>,
    autonomous: bool,
}

impl PathFollower {
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            config,
            state: FollowerState::Idle,
            target: None,
            autonomous: false,
        }
    }

    pub fn state(&self) -> FollowerState {
        self.state
    }

    pub fn target(&self) -> Option<PathTarget> {
        self.target
    }

    pub fn autonomous(&self) -> bool {
        self.autonomous
    }

    pub fn set_autonomous(&mut self, autonomous: bool) {
        self.autonomous = autonomous;
    }

    /// Plans a new target from `scores` and starts rotating toward it. Only
    /// valid from `Idle`; returns whether a target was taken.
    pub fn step_forward(&mut self, scores: &[f32], camera_x: f32) -> bool {
        if self.state != FollowerState::Idle {
            debug!("Follower is {:?}, step ignored", self.state);
            return false;
        }

        match plan_target(scores, camera_x, &self.config) {
            Some(target) => {
                self.target = Some(target);
                self.state = FollowerState::Rotating;
                true
            }
            None => {
                debug!("No corridor window fits {} scores", scores.len());
                false
            }
        }
    }

    /// Advances the state machine by one control tick.
    pub fn tick(&mut self, heading: f32, camera_x: f32, scores: &[f32]) -> Motion {
        match self.state {
            FollowerState::Idle => {
                if self.autonomous && self.step_forward(scores, camera_x) {
                    self.rotate(heading)
                } else {
                    Motion::default()
                }
            }
            FollowerState::Rotating => self.rotate(heading),
            FollowerState::Advancing => self.advance(),
        }
    }

    /// Drops the target and returns to `Idle`.
    pub fn stop(&mut self) {
        self.state = FollowerState::Idle;
        self.target = None;
    }

    fn rotate(&mut self, heading: f32) -> Motion {
        let Some(target) = self.target else {
            self.state = FollowerState::Idle;
            return Motion::default();
        };

        let difference = normalize_angle(target.target_heading_angle - heading);
        if difference.abs() < self.config.rotation_tolerance {
            self.state = FollowerState::Advancing;
            return self.advance();
        }

        Motion {
            rotation: difference.signum() * self.config.pan_speed,
            forward: 0.0,
        }
    }

    fn advance(&mut self) -> Motion {
        self.state = FollowerState::Idle;
        Motion {
            rotation: 0.0,
            forward: self.config.forward_distance,
        }
    }
}

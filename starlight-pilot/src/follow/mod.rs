pub mod camera;
pub mod follower;

pub use camera::{CameraController, CameraPose, KinematicCamera};
pub use follower::{normalize_angle, plan_target, FollowerState, Motion, PathFollower, PathTarget};

use serde::{Deserialize, Serialize};

/// Camera position on the ground plane plus its yaw. `heading` is 0 when
/// looking down +Z and grows toward +X.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub heading: f32,
}

/// Whatever moves the camera. The follower only ever turns it or pushes it
/// along its heading.
pub trait CameraController: Send + 'static {
    fn pose(&self) -> CameraPose;

    fn rotate_by(&mut self, angle: f32);

    fn move_forward(&mut self, distance: f32);

    /// Replaces the pose after the camera was moved from outside.
    fn set_pose(&mut self, pose: CameraPose);
}

/// Camera that just integrates the motions it is given.
#[derive(Debug, Clone, Default)]
pub struct KinematicCamera {
    pose: CameraPose,
}

impl KinematicCamera {
    pub fn new(pose: CameraPose) -> Self {
        Self { pose }
    }
}

impl CameraController for KinematicCamera {
    fn pose(&self) -> CameraPose {
        self.pose
    }

    fn rotate_by(&mut self, angle: f32) {
        self.pose.heading += angle;
    }

    fn move_forward(&mut self, distance: f32) {
        let (sin, cos) = self.pose.heading.sin_cos();
        self.pose.x += distance * sin;
        self.pose.z += distance * cos;
    }

    fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
    }
}

use crate::drive::Obstacle;
use crate::follow::PathTarget;
use serde::Serialize;

pub mod cycle;
pub mod detections;
pub mod guard;
pub mod runtime;

pub use cycle::{analyze_frame, decide, FrameAnalysis};
pub use detections::DetectionTracker;
pub use guard::{CyclePermit, SingleFlight};
pub use runtime::{FollowerCommand, FollowerStatus, FrameSource, Pilot, PilotHandle, PilotTasks};

/// Everything one analysis cycle publishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleOutput {
    pub sequence: u64,
    /// Size of the captured frame, the space obstacles and goals live in.
    pub view: (u32, u32),
    /// Corridor scores before normalisation, edge penalty included.
    pub raw_scores: Vec<f32>,
    /// Normalised corridor scores.
    pub scores: Vec<f32>,
    /// `scores` after obstacle and goal adjustment.
    pub adjusted_scores: Vec<f32>,
    pub target: Option<PathTarget>,
    pub obstacles: Vec<Obstacle>,
}

/// The cycle a detection should be compared against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CycleStart {
    pub sequence: u64,
    pub view: (u32, u32),
}

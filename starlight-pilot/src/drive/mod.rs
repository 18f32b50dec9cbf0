pub mod adjust;
pub mod obstacle;
pub mod property;
pub mod score;
pub mod select;

pub use adjust::{adjust_scores, corridor_index, Goal, Obstacle};
pub use obstacle::project_detections;
pub use score::{normalize_scores, score_corridors, CorridorScores};
pub use select::{select_best_path, window_center};

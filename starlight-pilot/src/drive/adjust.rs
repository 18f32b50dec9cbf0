use crate::config::AdjustConfig;
use serde::{Deserialize, Serialize};

/// A detected object in view coordinates. `depth` runs from 0 (at the camera)
/// to 1 (horizon).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub screen_x: f32,
    pub screen_y: f32,
    pub depth: f32,
    pub class_id: u32,
}

/// A point in view coordinates the operator wants to head for.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub screen_x: f32,
    pub screen_y: f32,
}

/// Corridor containing `screen_x` in a view `view_width` pixels wide.
pub fn corridor_index(screen_x: f32, view_width: f32, num_corridors: usize) -> Option<usize> {
    if num_corridors == 0 || !(view_width > 0.0) {
        return None;
    }

    let slice_width = view_width / num_corridors as f32;
    let index = (screen_x / slice_width).floor();
    if index.is_finite() && index >= 0.0 && (index as usize) < num_corridors {
        Some(index as usize)
    } else {
        None
    }
}

/// Pushes scores away from detected obstacles and toward the goal.
///
/// With `proximity = max(0, 1 - y / height)`, an obstacle costs its corridor
/// `proximity² + obstacle_base_penalty` and each direct neighbour
/// `adjacent_penalty_factor * proximity`. A goal adds
/// `goal_distance_weight * max(0, 1 - distance / width)` to every corridor and
/// `goal_flat_gain` to the one whose centre is closest, the leftmost on ties.
pub fn adjust_scores(
    scores: &[f32],
    obstacles: &[Obstacle],
    goal: Option<&Goal>,
    view: (u32, u32),
    config: &AdjustConfig,
) -> Vec<f32> {
    let mut adjusted = scores.to_vec();
    let num_corridors = adjusted.len();
    if num_corridors == 0 || view.0 == 0 || view.1 == 0 {
        return adjusted;
    }
    let (view_width, view_height) = (view.0 as f32, view.1 as f32);

    for obstacle in obstacles {
        let Some(index) = corridor_index(obstacle.screen_x, view_width, num_corridors) else {
            continue;
        };

        let proximity = (1.0 - obstacle.screen_y / view_height).max(0.0);
        adjusted[index] -= proximity * proximity + config.obstacle_base_penalty;

        let adjacent = config.adjacent_penalty_factor * proximity;
        if index > 0 {
            adjusted[index - 1] -= adjacent;
        }
        if index + 1 < num_corridors {
            adjusted[index + 1] -= adjacent;
        }
    }

    if let Some(goal) = goal {
        let slice_width = view_width / num_corridors as f32;
        let mut closest = None;
        let mut closest_distance = f32::INFINITY;

        for (index, score) in adjusted.iter_mut().enumerate() {
            let center = (index as f32 + 0.5) * slice_width;
            let distance = (center - goal.screen_x).abs();
            *score += (1.0 - distance / view_width).max(0.0) * config.goal_distance_weight;

            if distance < closest_distance {
                closest_distance = distance;
                closest = Some(index);
            }
        }

        if let Some(index) = closest {
            adjusted[index] += config.goal_flat_gain;
        }
    }

    adjusted
}

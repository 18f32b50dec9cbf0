use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum DistanceCategory {
    VeryNear,
    RelativelyNear,
    Near,
    Far,
    Unknown,
}

impl Display for DistanceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceCategory::VeryNear => write!(f, "Very near"),
            DistanceCategory::RelativelyNear => write!(f, "Relatively near"),
            DistanceCategory::Near => write!(f, "Near"),
            DistanceCategory::Far => write!(f, "Far"),
            DistanceCategory::Unknown => write!(f, "Unknown distance"),
        }
    }
}

/// Depth estimate in `[0, 1]` for a point `y` pixels down a view of
/// `view_height` rows: 0 at the bottom edge, 1 at the top. The perspective
/// power bends the scale so that depth collapses quickly near the bottom.
pub fn perspective_depth(y: f32, view_height: u32, power: f32) -> Option<f32> {
    if view_height == 0 || !y.is_finite() {
        return None;
    }

    let normalized_y = (y / view_height as f32).clamp(0.0, 1.0);
    Some(1.0 - normalized_y.powf(power))
}

impl DistanceCategory {
    pub fn from_depth(depth: f32) -> Self {
        if !depth.is_finite() {
            return DistanceCategory::Unknown;
        }

        let nearness = 1.0 - depth;
        if nearness > 0.90 {
            DistanceCategory::VeryNear
        } else if nearness > 0.75 {
            DistanceCategory::RelativelyNear
        } else if nearness > 0.50 {
            DistanceCategory::Near
        } else {
            DistanceCategory::Far
        }
    }
}

use log::error;
use std::f32::consts::PI;
use std::fmt::{Display, Formatter};

const CLOCK_FACE: [&str; 13] = [
    "9 o'clock",
    "9:30",
    "10 o'clock",
    "10:30",
    "11 o'clock",
    "11:30",
    "12 o'clock",
    "12:30",
    "1 o'clock",
    "1:30",
    "2 o'clock",
    "2:30",
    "3 o'clock",
];

/// Heading or screen position expressed as a position on the forward half of
/// a clock face, 12 o'clock being straight ahead.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum DirectionCategory {
    Clock(&'static str),
    Unknown,
}

impl Display for DirectionCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectionCategory::Clock(s) => write!(f, "{} direction", s),
            DirectionCategory::Unknown => write!(f, "Unknown direction"),
        }
    }
}

impl DirectionCategory {
    /// Maps a heading in radians (0 ahead, positive to the right) onto the clock
    /// face. Angles behind the camera are clamped to 9 or 3 o'clock.
    pub fn from_angle(angle: f32) -> Self {
        if !angle.is_finite() {
            return DirectionCategory::Unknown;
        }

        let clamped = angle.clamp(-PI / 2.0, PI / 2.0);
        let index = (((clamped + PI / 2.0) / PI) * 12.0).round() as usize;
        DirectionCategory::Clock(CLOCK_FACE[index.min(12)])
    }

    /// Direction of a screen point seen from the bottom centre of a
    /// `view_width` x `view_height` view. `y` grows downwards.
    pub fn get_direction(x: f32, y: f32, view_width: u32, view_height: u32) -> Self {
        if view_width == 0 || view_height == 0 {
            error!("View dimensions cannot be zero for direction calculation.");
            return DirectionCategory::Unknown;
        }

        let dx = x - view_width as f32 / 2.0;
        let dy = view_height as f32 - y;
        Self::from_angle(dx.atan2(dy))
    }
}

pub mod direction;
pub mod distance;

pub use direction::DirectionCategory;
pub use distance::DistanceCategory;

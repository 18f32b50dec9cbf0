pub mod channel;
pub mod gradient;

/// First source row of the ground-facing region (the bottom two thirds).
pub const fn region_start(height: u32) -> u32 {
    height / 3
}

pub const fn region_height(height: u32) -> u32 {
    height - region_start(height)
}

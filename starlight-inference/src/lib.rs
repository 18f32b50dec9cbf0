pub mod detect;
pub mod engine;
pub mod external;
pub mod utils;

/// Square input edge expected by the external detector.
pub const DETECTOR_INPUT_SIZE: u32 = 640;

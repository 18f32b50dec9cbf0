use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::Serialize;
use starlight_inference::DETECTOR_INPUT_SIZE;
use std::time::Duration;

// --- Scoring ---
pub const RED_CHANNEL: usize = 0;
pub const BLUE_CHANNEL: usize = 2;
pub const DEFAULT_NUM_CORRIDORS: usize = 27;
pub const DEFAULT_NUM_BANDS: usize = 5;
pub const COARSE_NUM_CORRIDORS: usize = 10;
pub const COARSE_NUM_BANDS: usize = 1;
/// Intensity above which a pixel counts as glare.
pub const HIGH_INTENSITY_THRESHOLD: u8 = 160;
/// Share of glare pixels that triggers the glare penalty.
pub const HIGH_INTENSITY_RATIO: f32 = 0.1;
pub const GLARE_PENALTY_FACTOR: f32 = 0.5;
/// Nearest row is weighted `1 + ROW_WEIGHT_MULTIPLIER`, farthest row `~1`.
pub const ROW_WEIGHT_MULTIPLIER: f32 = 2.0;
pub const GRADIENT_WEIGHT: f32 = 0.4;
pub const INTENSITY_WEIGHT: f32 = 0.6;
pub const EDGE_PENALTY: f32 = 0.1;
pub const NEUTRAL_SCORE: f32 = 0.5;

// --- Adjusting ---
pub const OBSTACLE_BASE_PENALTY: f32 = 0.05;
pub const ADJACENT_PENALTY_FACTOR: f32 = 0.1;
pub const GOAL_DISTANCE_WEIGHT: f32 = 0.0;
pub const GOAL_FLAT_GAIN: f32 = 0.1;
/// Power used to turn an obstacle's screen height into a depth estimate.
/// Below 1.0 the estimate drops quickly toward the bottom of the frame.
pub const DEPTH_PERSPECTIVE_POWER: f32 = 0.7;

// --- Following ---
pub const WINDOW_SIZE: usize = 5;
pub const PAN_SPEED: f32 = 0.01;
pub const FORWARD_DISTANCE: f32 = 5.0;
pub const ROTATION_TOLERANCE: f32 = 1.0;
pub const LOOKAHEAD_Z: f32 = 10.0;
pub const WORLD_WIDTH: f32 = 512.0;

// --- Runtime ---
pub const CYCLE_PERIOD: Duration = Duration::from_millis(300);
pub const FOLLOWER_TICK: Duration = Duration::from_millis(16);
pub const DETECTOR_QUEUE: usize = 1;

/// Named scoring presets. Both run the same scorer; they differ only in the
/// channel read and how finely the view is split.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum Profile {
    /// Red channel, 27 corridors of 5 depth bands.
    #[default]
    Gradient,
    /// Blue channel, 10 corridors, no depth bands.
    Coarse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub channel_offset: usize,
    pub num_corridors: usize,
    pub num_bands: usize,
    pub high_intensity_threshold: u8,
    pub high_intensity_ratio: f32,
    pub glare_penalty_factor: f32,
    pub row_weight_multiplier: f32,
    pub gradient_weight: f32,
    pub intensity_weight: f32,
    pub edge_penalty: f32,
    pub neutral_score: f32,
    /// Frames are resampled to this size before analysis when set.
    pub analysis_size: Option<(u32, u32)>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

impl ScoringConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let (channel_offset, num_corridors, num_bands) = match profile {
            Profile::Gradient => (RED_CHANNEL, DEFAULT_NUM_CORRIDORS, DEFAULT_NUM_BANDS),
            Profile::Coarse => (BLUE_CHANNEL, COARSE_NUM_CORRIDORS, COARSE_NUM_BANDS),
        };

        Self {
            channel_offset,
            num_corridors,
            num_bands,
            high_intensity_threshold: HIGH_INTENSITY_THRESHOLD,
            high_intensity_ratio: HIGH_INTENSITY_RATIO,
            glare_penalty_factor: GLARE_PENALTY_FACTOR,
            row_weight_multiplier: ROW_WEIGHT_MULTIPLIER,
            gradient_weight: GRADIENT_WEIGHT,
            intensity_weight: INTENSITY_WEIGHT,
            edge_penalty: EDGE_PENALTY,
            neutral_score: NEUTRAL_SCORE,
            analysis_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustConfig {
    pub obstacle_base_penalty: f32,
    pub adjacent_penalty_factor: f32,
    pub goal_distance_weight: f32,
    pub goal_flat_gain: f32,
    pub depth_perspective_power: f32,
}

impl Default for AdjustConfig {
    fn default() -> Self {
        Self {
            obstacle_base_penalty: OBSTACLE_BASE_PENALTY,
            adjacent_penalty_factor: ADJACENT_PENALTY_FACTOR,
            goal_distance_weight: GOAL_DISTANCE_WEIGHT,
            goal_flat_gain: GOAL_FLAT_GAIN,
            depth_perspective_power: DEPTH_PERSPECTIVE_POWER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowerConfig {
    pub window_size: usize,
    pub pan_speed: f32,
    pub forward_distance: f32,
    pub rotation_tolerance: f32,
    /// Forward distance used when turning a corridor into a heading.
    pub lookahead_z: f32,
    /// Width of the world the view spans, used to place corridors in world X.
    pub world_width: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            pan_speed: PAN_SPEED,
            forward_distance: FORWARD_DISTANCE,
            rotation_tolerance: ROTATION_TOLERANCE,
            lookahead_z: LOOKAHEAD_Z,
            world_width: WORLD_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeConfig {
    pub cycle_period: Duration,
    pub follower_tick: Duration,
    pub detector_input_size: (u32, u32),
    pub detector_grayscale: bool,
    pub detector_queue: usize,
    /// Detections older than this many cycles are discarded. `None` accepts
    /// any age.
    pub max_detection_age: Option<u64>,
    pub autonomous: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_period: CYCLE_PERIOD,
            follower_tick: FOLLOWER_TICK,
            detector_input_size: (DETECTOR_INPUT_SIZE, DETECTOR_INPUT_SIZE),
            detector_grayscale: true,
            detector_queue: DETECTOR_QUEUE,
            max_detection_age: None,
            autonomous: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PilotConfig {
    pub profile: Profile,
    pub scoring: ScoringConfig,
    pub adjust: AdjustConfig,
    pub follower: FollowerConfig,
    pub runtime: RuntimeConfig,
}

impl PilotConfig {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            scoring: ScoringConfig::for_profile(profile),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        if scoring.num_corridors == 0 || scoring.num_bands == 0 {
            bail!(
                "Need at least one corridor and one band, got {} and {}",
                scoring.num_corridors,
                scoring.num_bands
            );
        }
        if scoring.channel_offset >= 4 {
            bail!("Channel offset {} is outside an RGBA pixel", scoring.channel_offset);
        }
        if let Some((width, height)) = scoring.analysis_size {
            if width == 0 || height == 0 {
                bail!("Analysis size must be positive, got {}x{}", width, height);
            }
        }

        let window = self.follower.window_size;
        if window == 0 || window > scoring.num_corridors {
            bail!(
                "Window size {} must be within 1..={}",
                window,
                scoring.num_corridors
            );
        }
        if self.follower.pan_speed <= 0.0 || self.follower.rotation_tolerance <= 0.0 {
            bail!("Pan speed and rotation tolerance must be positive");
        }
        // A pan step must be able to land inside the tolerance band.
        if self.follower.rotation_tolerance <= self.follower.pan_speed / 2.0 {
            bail!(
                "Rotation tolerance {} must exceed half the pan speed {}",
                self.follower.rotation_tolerance,
                self.follower.pan_speed
            );
        }

        let runtime = &self.runtime;
        if runtime.cycle_period.is_zero() || runtime.follower_tick.is_zero() {
            bail!("Cycle period and follower tick must be non-zero");
        }
        let (width, height) = runtime.detector_input_size;
        if width == 0 || height == 0 {
            bail!("Detector input size must be positive, got {}x{}", width, height);
        }

        Ok(())
    }
}

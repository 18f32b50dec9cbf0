use crate::config::PilotConfig;
use crate::drive::{adjust_scores, score_corridors, CorridorScores, Goal, Obstacle};
use crate::follow::plan_target;
use crate::pipeline::CycleOutput;
use anyhow::{bail, Context, Result};
use starlight_inference::detect::request::DetectorRequest;
use starlight_media::{ChannelMap, FlipFrame, Frame, GradientMap, PixelLayout, ResizeFrame};

/// Result of the CPU-bound half of a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub sequence: u64,
    pub view: (u32, u32),
    pub scores: CorridorScores,
}

/// Flips a bottom-up RGBA readback, derives the detector request from it and
/// scores the corridors. Consumes the frame.
pub fn analyze_frame(
    sequence: u64,
    mut frame: Frame,
    config: &PilotConfig,
) -> Result<(FrameAnalysis, DetectorRequest)> {
    if frame.layout() != PixelLayout::Rgba {
        bail!("Expected an RGBA frame, got {:?}", frame.layout());
    }

    let view = frame.get_size();
    frame.flip_vertically();

    let runtime = &config.runtime;
    let request = DetectorRequest::prepare(
        sequence,
        &frame,
        runtime.detector_input_size,
        runtime.detector_grayscale,
    )
    .context("Failed to prepare detector request")?;

    let scoring = &config.scoring;
    if let Some(size) = scoring.analysis_size {
        if size != view {
            frame.resize_to(size)?;
        }
    }

    let channel = ChannelMap::extract(&frame, scoring.channel_offset)?;
    let gradients = GradientMap::compute(&channel);
    let scores = score_corridors(&channel, &gradients, scoring)?;

    Ok((
        FrameAnalysis {
            sequence,
            view,
            scores,
        },
        request,
    ))
}

/// Folds the latest obstacles and goal into the scores and plans a target.
pub fn decide(
    analysis: FrameAnalysis,
    obstacles: &[Obstacle],
    goal: Option<&Goal>,
    camera_x: f32,
    config: &PilotConfig,
) -> CycleOutput {
    let FrameAnalysis {
        sequence,
        view,
        scores,
    } = analysis;

    let adjusted_scores = adjust_scores(&scores.normalized, obstacles, goal, view, &config.adjust);
    let target = plan_target(&adjusted_scores, camera_x, &config.follower);

    CycleOutput {
        sequence,
        view,
        raw_scores: scores.raw,
        scores: scores.normalized,
        adjusted_scores,
        target,
        obstacles: obstacles.to_vec(),
    }
}

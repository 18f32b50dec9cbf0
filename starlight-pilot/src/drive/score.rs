use crate::config::ScoringConfig;
use anyhow::{bail, Result};
use bitvec::prelude::BitVec;
use rayon::prelude::*;
use serde::Serialize;
use starlight_media::{ChannelMap, GradientMap};

/// Per-corridor drivability for one frame, left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorridorScores {
    /// Mean band score of every corridor.
    pub unpenalized: Vec<f32>,
    /// `unpenalized` with the edge penalty applied to the outermost corridors.
    pub raw: Vec<f32>,
    /// `raw` min-max normalised into `[0, 1]`.
    pub normalized: Vec<f32>,
}

/// Running sums over one corridor/band cell.
#[derive(Debug, Default, Copy, Clone)]
struct CellStats {
    gradient_sum: f32,
    intensity_sum: f32,
    pixel_count: usize,
    high_intensity_count: usize,
}

impl CellStats {
    fn band_score(&self, config: &ScoringConfig) -> f32 {
        if self.pixel_count == 0 {
            return 0.0;
        }

        let count = self.pixel_count as f32;
        let avg_gradient = self.gradient_sum / count;
        let avg_intensity = self.intensity_sum / count;
        let high_ratio = self.high_intensity_count as f32 / count;

        let glare_penalty = if high_ratio > config.high_intensity_ratio {
            config.glare_penalty_factor
        } else {
            1.0
        };

        config.gradient_weight * (1.0 - avg_gradient / 255.0)
            + config.intensity_weight * (avg_intensity / 255.0 * glare_penalty)
    }
}

struct Scorer<'a> {
    channel: &'a ChannelMap,
    gradients: &'a GradientMap,
    glare: BitVec,
    row_weights: Vec<f32>,
    slice_width: usize,
    band_height: usize,
    config: &'a ScoringConfig,
}

impl Scorer<'_> {
    fn cell(&self, corridor: usize, band: usize) -> CellStats {
        let width = self.channel.width();
        let height = self.channel.height();

        let x_start = corridor * self.slice_width;
        let x_end = ((corridor + 1) * self.slice_width).min(width);
        let y_start = band * self.band_height;
        let y_end = ((band + 1) * self.band_height).min(height);

        let mut stats = CellStats::default();
        for y in y_start..y_end {
            let row_weight = self.row_weights[y];
            for x in x_start..x_end {
                stats.gradient_sum += self.gradients[[y, x]] * row_weight;
                stats.intensity_sum += self.channel[[y, x]] as f32 * row_weight;
            }

            let row = y * width;
            stats.high_intensity_count += self.glare[row + x_start..row + x_end].count_ones();
            stats.pixel_count += x_end - x_start;
        }

        stats
    }

    fn corridor(&self, corridor: usize) -> f32 {
        let bands = self.config.num_bands;
        let total: f32 = (0..bands)
            .map(|band| self.cell(corridor, band).band_score(self.config))
            .sum();
        total / bands as f32
    }
}

/// Splits the ground region into `num_corridors` vertical corridors of
/// `num_bands` depth bands each and reduces every corridor to one score.
/// Smooth (low gradient) and bright-but-not-glaring ground scores high;
/// rows nearer the camera weigh up to `1 + row_weight_multiplier` times more.
pub fn score_corridors(
    channel: &ChannelMap,
    gradients: &GradientMap,
    config: &ScoringConfig,
) -> Result<CorridorScores> {
    if channel.dim() != gradients.dim() {
        bail!(
            "Channel map {:?} and gradient map {:?} differ in size",
            channel.dim(),
            gradients.dim()
        );
    }

    let num_corridors = config.num_corridors;
    let num_bands = config.num_bands;
    if num_corridors == 0 || num_bands == 0 {
        bail!("Need at least one corridor and one band");
    }

    let (height, width) = channel.dim();
    if width < num_corridors || height < num_bands {
        bail!(
            "Ground region {}x{} is too small for {} corridors of {} bands",
            width,
            height,
            num_corridors,
            num_bands
        );
    }

    let region_height = height as f32;
    let row_weights = (0..height)
        .map(|y| 1.0 + ((region_height - y as f32) / region_height) * config.row_weight_multiplier)
        .collect();

    let scorer = Scorer {
        channel,
        gradients,
        glare: channel.saturation_mask(config.high_intensity_threshold),
        row_weights,
        slice_width: width / num_corridors,
        band_height: height / num_bands,
        config,
    };

    let unpenalized = (0..num_corridors)
        .into_par_iter()
        .map(|corridor| scorer.corridor(corridor))
        .collect::<Vec<_>>();

    let mut raw = unpenalized.clone();
    let last = raw.len() - 1;
    raw[0] = (raw[0] - config.edge_penalty).max(0.0);
    if last > 0 {
        raw[last] = (raw[last] - config.edge_penalty).max(0.0);
    }

    let normalized = normalize_scores(&raw, config.neutral_score);

    Ok(CorridorScores {
        unpenalized,
        raw,
        normalized,
    })
}

/// Min-max normalisation. When every score is the same there is no range to
/// spread over and every corridor gets `neutral`.
pub fn normalize_scores(scores: &[f32], neutral: f32) -> Vec<f32> {
    let (min, max) = scores
        .iter()
        .filter(|score| score.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &score| {
            (min.min(score), max.max(score))
        });

    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return vec![neutral; scores.len()];
    }

    scores
        .iter()
        .map(|&score| {
            if score.is_finite() {
                (score - min) / range
            } else {
                0.0
            }
        })
        .collect()
}

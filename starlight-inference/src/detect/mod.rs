use crate::utils::graph::{Box, Point};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod request;
pub mod response;

/// Boxes covering at least this share of the detector input are dropped.
pub const MAX_BOX_AREA_RATIO: f32 = 0.05;
pub const NMS_IOU_THRESHOLD: f32 = 0.5;

/// One detection in the detector's input coordinate space, corners as
/// `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
    #[serde(rename = "box")]
    pub corners: [f32; 4],
    pub score: f32,
    #[serde(rename = "class")]
    pub class_id: u32,
}

impl DetectResult {
    pub fn bounding(&self) -> Box<f32> {
        let [x1, y1, x2, y2] = self.corners;
        Box::from_corners(x1, y1, x2, y2)
    }

    pub fn center(&self) -> Point<f32> {
        self.bounding().center()
    }

    pub fn area(&self) -> f32 {
        self.bounding().area()
    }

    pub fn iou(&self, other: &DetectResult) -> f32 {
        let [ax1, ay1, ax2, ay2] = self.corners;
        let [bx1, by1, bx2, by2] = other.corners;

        let intersection_width = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
        let intersection_height = (ay2.min(by2) - ay1.max(by1)).max(0.0);
        let intersection = intersection_width * intersection_height;

        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

pub trait NMSImplement {
    fn non_maximum_suppression(self, iou_threshold: f32) -> Vec<DetectResult>;
    fn filter_large_boxes(self, max_area: f32) -> Vec<DetectResult>;
}

impl NMSImplement for Vec<DetectResult> {
    fn non_maximum_suppression(self, iou_threshold: f32) -> Vec<DetectResult> {
        let mut candidates = self;
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let mut kept: Vec<DetectResult> = Vec::new();
        for candidate in candidates {
            if kept.iter().all(|best| best.iou(&candidate) < iou_threshold) {
                kept.push(candidate);
            }
        }

        kept
    }

    fn filter_large_boxes(self, max_area: f32) -> Vec<DetectResult> {
        self.into_par_iter()
            .filter(|result| {
                let bounding = result.bounding();
                let area = bounding.area();
                bounding.has_extent() && area.is_finite() && area < max_area
            })
            .collect()
    }
}

/// Size filter then NMS, for a detector fed `input_size` frames.
pub fn post_process(results: Vec<DetectResult>, input_size: (u32, u32)) -> Vec<DetectResult> {
    let max_area = input_size.0 as f32 * input_size.1 as f32 * MAX_BOX_AREA_RATIO;
    results
        .filter_large_boxes(max_area)
        .non_maximum_suppression(NMS_IOU_THRESHOLD)
}

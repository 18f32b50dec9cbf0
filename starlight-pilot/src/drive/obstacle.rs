use crate::config::AdjustConfig;
use crate::drive::property::distance::perspective_depth;
use crate::drive::property::{DirectionCategory, DistanceCategory};
use crate::drive::Obstacle;
use log::debug;
use starlight_inference::detect::{post_process, DetectResult};

/// Filters raw detections (`post_process`) and places the survivors in the
/// view. Detector coordinates are relative to the `input_size` frame it was
/// fed; the view is the full captured frame.
pub fn project_detections(
    results: Vec<DetectResult>,
    input_size: (u32, u32),
    view: (u32, u32),
    config: &AdjustConfig,
) -> Vec<Obstacle> {
    if input_size.0 == 0 || input_size.1 == 0 || view.0 == 0 || view.1 == 0 {
        return Vec::new();
    }

    let from = (input_size.0 as f32, input_size.1 as f32);
    let to = (view.0 as f32, view.1 as f32);

    post_process(results, input_size)
        .into_iter()
        .filter_map(|result| {
            let center = result.center().rescale(from, to);
            let depth = perspective_depth(center.y, view.1, config.depth_perspective_power)?;

            debug!(
                "Obstacle of class {} at {}, {}",
                result.class_id,
                DirectionCategory::get_direction(center.x, center.y, view.0, view.1),
                DistanceCategory::from_depth(depth),
            );

            Some(Obstacle {
                screen_x: center.x,
                screen_y: center.y,
                depth,
                class_id: result.class_id,
            })
        })
        .collect()
}

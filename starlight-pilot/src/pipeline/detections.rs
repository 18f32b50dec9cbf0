use crate::config::{AdjustConfig, PilotConfig};
use crate::drive::{project_detections, Obstacle};
use crate::pipeline::CycleStart;
use log::{debug, warn};
use starlight_inference::detect::response::DetectorResponse;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Turns detector responses into the obstacle set used by later cycles.
#[derive(Debug, Clone)]
pub struct DetectionTracker {
    adjust: AdjustConfig,
    input_size: (u32, u32),
    max_age: Option<u64>,
}

impl DetectionTracker {
    pub fn new(config: &PilotConfig) -> Self {
        Self {
            adjust: config.adjust.clone(),
            input_size: config.runtime.detector_input_size,
            max_age: config.runtime.max_detection_age,
        }
    }

    /// Obstacle set to publish for `response`, or `None` to keep the current
    /// one. A detector error clears the set.
    pub fn apply(&self, response: DetectorResponse, current: Option<CycleStart>) -> Option<Vec<Obstacle>> {
        let sequence = response.sequence;
        let results = match response.into_result() {
            Ok(results) => results,
            Err(e) => {
                warn!("{:#}, clearing obstacles", e);
                return Some(Vec::new());
            }
        };

        let Some(current) = current else {
            debug!("Detections arrived before the first cycle");
            return None;
        };

        if let (Some(max_age), Some(sequence)) = (self.max_age, sequence) {
            let age = current.sequence.saturating_sub(sequence);
            if age > max_age {
                debug!(
                    "Dropped detections of cycle {}, {} cycles old",
                    sequence, age
                );
                return None;
            }
        }

        Some(project_detections(results, self.input_size, current.view, &self.adjust))
    }

    pub fn spawn(
        self,
        mut responses: mpsc::Receiver<DetectorResponse>,
        cycles: watch::Receiver<Option<CycleStart>>,
        obstacles: watch::Sender<Arc<Vec<Obstacle>>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(response) = responses.recv().await {
                let current = *cycles.borrow();
                if let Some(found) = self.apply(response, current) {
                    debug!("{} obstacles in view", found.len());
                    obstacles.send_replace(Arc::new(found));
                }
            }
            debug!("Detection tracker stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlight_inference::detect::DetectResult;

    fn tracker(max_age: Option<u64>) -> DetectionTracker {
        let mut config = PilotConfig::default();
        config.runtime.max_detection_age = max_age;
        DetectionTracker::new(&config)
    }

    fn cycle(sequence: u64) -> Option<CycleStart> {
        Some(CycleStart {
            sequence,
            view: (320, 320),
        })
    }

    fn found(sequence: u64) -> DetectorResponse {
        DetectorResponse::success(
            sequence,
            vec![DetectResult {
                corners: [100.0, 100.0, 120.0, 120.0],
                score: 0.9,
                class_id: 2,
            }],
        )
    }

    #[test]
    fn stale_detections_are_accepted_by_default() {
        let obstacles = tracker(None).apply(found(1), cycle(40)).unwrap();
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].screen_x, 55.0);
    }

    #[test]
    fn age_bound_discards_old_responses() {
        let tracker = tracker(Some(2));
        assert!(tracker.apply(found(7), cycle(9)).is_some());
        assert!(tracker.apply(found(6), cycle(9)).is_none());
        // Unnumbered responses cannot be aged.
        let unnumbered = DetectorResponse {
            sequence: None,
            ..found(0)
        };
        assert!(tracker.apply(unnumbered, cycle(9)).is_some());
    }

    #[test]
    fn error_clears_obstacles() {
        let obstacles = tracker(Some(0))
            .apply(DetectorResponse::failure(Some(1), "timeout"), cycle(9))
            .unwrap();
        assert!(obstacles.is_empty());
    }

    #[test]
    fn nothing_to_project_onto_before_first_cycle() {
        assert!(tracker(None).apply(found(1), None).is_none());
    }

    #[tokio::test]
    async fn publishes_projected_obstacles() {
        let (response_tx, response_rx) = mpsc::channel(4);
        let (_cycle_tx, cycle_rx) = watch::channel(cycle(3));
        let (obstacle_tx, mut obstacle_rx) = watch::channel(Arc::new(Vec::new()));

        tracker(None).spawn(response_rx, cycle_rx, obstacle_tx);
        response_tx.send(found(3)).await.unwrap();

        obstacle_rx.changed().await.unwrap();
        assert_eq!(obstacle_rx.borrow().len(), 1);
    }
}

use anyhow::Result;
use futures::future::BoxFuture;
use starlight_inference::detect::request::DetectorRequest;
use starlight_inference::detect::DetectResult;
use starlight_inference::engine::{detector_link, spawn_detector_bridge, Detector, DetectorEndpoint};
use starlight_media::{Frame, PixelLayout};
use starlight_pilot::follow::{CameraPose, FollowerState, KinematicCamera};
use starlight_pilot::pipeline::{FollowerCommand, FrameSource, PilotHandle, PilotTasks};
use starlight_pilot::{CycleOutput, Pilot, PilotConfig, Profile};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hands out a fresh flat-gray frame on every capture.
struct EndlessGray {
    captures: Arc<AtomicUsize>,
}

impl FrameSource for EndlessGray {
    fn capture(&mut self) -> Result<Option<Frame>> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Frame::filled(64, 48, PixelLayout::Rgba, &[128, 128, 128, 255]).map(Some)
    }
}

/// Always sees one small object right of centre.
struct FixedDetector;

impl Detector for FixedDetector {
    fn detect(&self, _request: DetectorRequest) -> BoxFuture<'static, Result<Vec<DetectResult>>> {
        Box::pin(async {
            Ok(vec![DetectResult {
                corners: [330.0, 300.0, 370.0, 340.0],
                score: 0.8,
                class_id: 1,
            }])
        })
    }
}

fn config() -> PilotConfig {
    let mut config = PilotConfig::for_profile(Profile::Coarse);
    config.runtime.detector_input_size = (640, 640);
    config
}

struct Running {
    handle: PilotHandle,
    captures: Arc<AtomicUsize>,
    _tasks: PilotTasks,
    _detector: DetectorEndpoint,
}

fn start(config: PilotConfig) -> Running {
    let captures = Arc::new(AtomicUsize::new(0));
    let (sender, endpoint, responses) = detector_link(1);
    let (handle, tasks) = Pilot::spawn(
        config,
        EndlessGray {
            captures: captures.clone(),
        },
        KinematicCamera::default(),
        sender,
        responses,
    )
    .unwrap();

    Running {
        handle,
        captures,
        _tasks: tasks,
        _detector: endpoint,
    }
}

async fn wait_for_sequence(handle: &PilotHandle, sequence: u64) -> Arc<CycleOutput> {
    let mut outputs = handle.outputs();
    loop {
        if let Some(output) = outputs.borrow_and_update().clone() {
            if output.sequence >= sequence {
                return output;
            }
        }
        outputs.changed().await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_cycle_publishes_scores_and_target() {
    let running = start(config());
    let handle = &running.handle;

    let output = tokio::time::timeout(Duration::from_secs(5), wait_for_sequence(&handle, 1))
        .await
        .unwrap();

    assert_eq!(output.view, (64, 48));
    assert_eq!(output.scores.len(), 10);
    assert_eq!(output.scores[0], 0.0);
    assert_eq!(output.scores[9], 0.0);
    assert_eq!(output.target.map(|target| target.corridor_index), Some(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn still_camera_skips_cycles_until_it_moves() {
    let mut config = config();
    config.runtime.cycle_period = Duration::from_millis(20);
    let running = start(config);
    let (handle, captures) = (&running.handle, &running.captures);

    tokio::time::timeout(Duration::from_secs(5), wait_for_sequence(&handle, 1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(captures.load(Ordering::SeqCst), 1);
    assert_eq!(handle.latest_output().unwrap().sequence, 1);

    handle
        .command(FollowerCommand::SetPose(CameraPose {
            x: 3.0,
            ..CameraPose::default()
        }))
        .await
        .unwrap();

    let output = tokio::time::timeout(Duration::from_secs(5), wait_for_sequence(&handle, 2))
        .await
        .unwrap();
    assert_eq!(output.sequence, 2);
    assert_eq!(captures.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn step_turns_then_advances() {
    let running = start(config());
    let handle = &running.handle;
    let output = tokio::time::timeout(Duration::from_secs(5), wait_for_sequence(&handle, 1))
        .await
        .unwrap();
    let target = output.target.unwrap().target_heading_angle;
    assert!(target < -1.0);

    handle.command(FollowerCommand::Step).await.unwrap();

    let mut updates = handle.follower_updates();
    let status = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let status = *updates.borrow_and_update();
            if status.pose.z > 0.0 {
                return status;
            }
            updates.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    // Turned left just far enough to be inside the one radian tolerance.
    assert_eq!(status.state, FollowerState::Idle);
    assert!(status.pose.heading < 0.0);
    assert!((target - status.pose.heading).abs() < 1.0);
    assert!((target - status.pose.heading).abs() > 0.9);
    let travelled = (status.pose.x.powi(2) + status.pose.z.powi(2)).sqrt();
    assert!((travelled - 5.0).abs() < 1e-3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn detections_penalize_their_corridor_on_the_next_cycle() {
    let mut config = config();
    config.runtime.cycle_period = Duration::from_millis(20);

    let (sender, endpoint, responses) = detector_link(1);
    spawn_detector_bridge(Arc::new(FixedDetector), endpoint);
    let (handle, _tasks) = Pilot::spawn(
        config,
        EndlessGray {
            captures: Arc::new(AtomicUsize::new(0)),
        },
        KinematicCamera::default(),
        sender,
        responses,
    )
    .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.obstacles().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let obstacles = handle.obstacles();
    assert_eq!(obstacles.len(), 1);
    assert_eq!((obstacles[0].screen_x, obstacles[0].screen_y), (35.0, 24.0));

    handle
        .command(FollowerCommand::SetPose(CameraPose {
            z: 1.0,
            ..CameraPose::default()
        }))
        .await
        .unwrap();

    let output = tokio::time::timeout(Duration::from_secs(5), wait_for_sequence(&handle, 2))
        .await
        .unwrap();
    assert_eq!(output.obstacles.len(), 1);

    // Centre (35, 24) falls in corridor 5 of 10, halfway down the view.
    assert!((output.adjusted_scores[5] - (output.scores[5] - 0.3)).abs() < 1e-5);
    assert!((output.adjusted_scores[4] - (output.scores[4] - 0.05)).abs() < 1e-5);
    assert_eq!(output.adjusted_scores[2], output.scores[2]);
}

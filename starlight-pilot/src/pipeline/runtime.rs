use crate::config::PilotConfig;
use crate::drive::property::DirectionCategory;
use crate::drive::{Goal, Obstacle};
use crate::follow::{
    normalize_angle, CameraController, CameraPose, FollowerState, Motion, PathFollower, PathTarget,
};
use crate::pipeline::{analyze_frame, decide, CycleOutput, CycleStart, DetectionTracker, SingleFlight};
use anyhow::{anyhow, Result};
use log::{debug, error, info};
use parking_lot::Mutex;
use serde::Serialize;
use starlight_inference::detect::response::DetectorResponse;
use starlight_inference::engine::DetectorSender;
use starlight_media::{Frame, FrameSlot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

const COMMAND_QUEUE: usize = 16;

/// Where the scoring loop gets its frames. `Ok(None)` means nothing new yet.
pub trait FrameSource: Send + 'static {
    fn capture(&mut self) -> Result<Option<Frame>>;
}

impl FrameSource for FrameSlot {
    fn capture(&mut self) -> Result<Option<Frame>> {
        Ok(self.take())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowerCommand {
    Step,
    Stop,
    SetAutonomous(bool),
    /// The camera was moved by someone else.
    SetPose(CameraPose),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FollowerStatus {
    pub state: FollowerState,
    pub target: Option<PathTarget>,
    pub autonomous: bool,
    pub pose: CameraPose,
}

/// Cloneable view onto a running pilot.
#[derive(Debug, Clone)]
pub struct PilotHandle {
    outputs: watch::Receiver<Option<Arc<CycleOutput>>>,
    follower: watch::Receiver<FollowerStatus>,
    obstacles: watch::Receiver<Arc<Vec<Obstacle>>>,
    goal: Arc<watch::Sender<Option<Goal>>>,
    commands: mpsc::Sender<FollowerCommand>,
}

impl PilotHandle {
    pub fn latest_output(&self) -> Option<Arc<CycleOutput>> {
        self.outputs.borrow().clone()
    }

    pub fn outputs(&self) -> watch::Receiver<Option<Arc<CycleOutput>>> {
        self.outputs.clone()
    }

    pub fn follower_status(&self) -> FollowerStatus {
        *self.follower.borrow()
    }

    pub fn follower_updates(&self) -> watch::Receiver<FollowerStatus> {
        self.follower.clone()
    }

    pub fn obstacles(&self) -> Arc<Vec<Obstacle>> {
        self.obstacles.borrow().clone()
    }

    pub fn goal(&self) -> Option<Goal> {
        *self.goal.borrow()
    }

    pub fn set_goal(&self, goal: Option<Goal>) {
        self.goal.send_replace(goal);
    }

    pub async fn command(&self, command: FollowerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("Follower task has stopped"))
    }
}

/// Background tasks of a pilot.
#[derive(Debug)]
pub struct PilotTasks(Vec<JoinHandle<()>>);

impl PilotTasks {
    pub fn abort(&self) {
        self.0.iter().for_each(JoinHandle::abort);
    }
}

impl Drop for PilotTasks {
    fn drop(&mut self) {
        self.abort();
    }
}

pub struct Pilot;

impl Pilot {
    /// Starts the scoring loop, the follower loop and the detection tracker.
    /// Requests go out through `detector`; its answers come back on
    /// `responses`.
    pub fn spawn<S: FrameSource, C: CameraController>(
        config: PilotConfig,
        source: S,
        camera: C,
        detector: DetectorSender,
        responses: mpsc::Receiver<DetectorResponse>,
    ) -> Result<(PilotHandle, PilotTasks)> {
        config.validate()?;
        let config = Arc::new(config);

        let (output_tx, output_rx) = watch::channel(None);
        let (obstacle_tx, obstacle_rx) = watch::channel(Arc::new(Vec::new()));
        let (cycle_tx, cycle_rx) = watch::channel(None);
        let (goal_tx, goal_rx) = watch::channel(None);
        let (pose_tx, pose_rx) = watch::channel(camera.pose());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);

        let mut follower = PathFollower::new(config.follower.clone());
        follower.set_autonomous(config.runtime.autonomous);
        let (status_tx, status_rx) = watch::channel(FollowerStatus {
            state: follower.state(),
            target: follower.target(),
            autonomous: follower.autonomous(),
            pose: camera.pose(),
        });

        let tracker = DetectionTracker::new(&config).spawn(responses, cycle_rx, obstacle_tx);

        let scoring = ScoringLoop {
            source,
            guard: SingleFlight::new(),
            sequence: 0,
            period: config.runtime.cycle_period,
            poses: pose_rx,
            cycles: cycle_tx,
            cycle: CycleContext {
                config: config.clone(),
                detector,
                obstacles: obstacle_rx.clone(),
                goal: goal_rx,
                outputs: Arc::new(output_tx),
                last_pose: Arc::new(Mutex::new(None)),
            },
        }
        .spawn();

        let following = FollowerLoop {
            follower,
            camera,
            tick: config.runtime.follower_tick,
            commands: command_rx,
            outputs: output_rx.clone(),
            poses: pose_tx,
            status: status_tx,
        }
        .spawn();

        let handle = PilotHandle {
            outputs: output_rx,
            follower: status_rx,
            obstacles: obstacle_rx,
            goal: Arc::new(goal_tx),
            commands: command_tx,
        };

        Ok((handle, PilotTasks(vec![scoring, following, tracker])))
    }
}

/// Shared by every cycle the scoring loop starts.
#[derive(Clone)]
struct CycleContext {
    config: Arc<PilotConfig>,
    detector: DetectorSender,
    obstacles: watch::Receiver<Arc<Vec<Obstacle>>>,
    goal: watch::Receiver<Option<Goal>>,
    outputs: Arc<watch::Sender<Option<Arc<CycleOutput>>>>,
    /// Pose of the last cycle that published.
    last_pose: Arc<Mutex<Option<CameraPose>>>,
}

impl CycleContext {
    async fn run(self, sequence: u64, frame: Frame, pose: CameraPose) {
        let config = self.config.clone();
        let (analysis, request) =
            match tokio::task::spawn_blocking(move || analyze_frame(sequence, frame, &config)).await {
                Ok(Ok(analysis)) => analysis,
                Ok(Err(e)) => {
                    error!("Cycle {} failed: {:#}", sequence, e);
                    return;
                }
                Err(e) => {
                    error!("Cycle {} worker did not finish: {}", sequence, e);
                    return;
                }
            };

        self.detector.submit(request);

        let obstacles = self.obstacles.borrow().clone();
        let goal = *self.goal.borrow();
        let output = decide(analysis, &obstacles, goal.as_ref(), pose.x, &self.config);

        match output.target {
            Some(target) => info!(
                "Cycle {}: corridor {} at {}",
                sequence,
                target.corridor_index,
                DirectionCategory::from_angle(normalize_angle(
                    target.target_heading_angle - pose.heading
                )),
            ),
            None => info!("Cycle {}: no corridor window fits", sequence),
        }

        *self.last_pose.lock() = Some(pose);
        self.outputs.send_replace(Some(Arc::new(output)));
    }
}

struct ScoringLoop<S> {
    source: S,
    guard: SingleFlight,
    sequence: u64,
    period: Duration,
    poses: watch::Receiver<CameraPose>,
    cycles: watch::Sender<Option<CycleStart>>,
    cycle: CycleContext,
}

impl<S: FrameSource> ScoringLoop<S> {
    fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.on_tick();
            }
        })
    }

    fn on_tick(&mut self) {
        let Some(permit) = self.guard.try_begin() else {
            debug!("Cycle {} still in flight, tick skipped", self.sequence);
            return;
        };

        let pose = *self.poses.borrow();
        if *self.cycle.last_pose.lock() == Some(pose) {
            debug!("Camera has not moved, tick skipped");
            return;
        }

        let frame = match self.source.capture() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("No frame captured yet");
                return;
            }
            Err(e) => {
                error!("Frame capture failed: {:#}", e);
                return;
            }
        };

        self.sequence += 1;
        let sequence = self.sequence;
        self.cycles.send_replace(Some(CycleStart {
            sequence,
            view: frame.get_size(),
        }));

        let cycle = self.cycle.clone();
        tokio::spawn(async move {
            let _permit = permit;
            cycle.run(sequence, frame, pose).await;
        });
    }
}

struct FollowerLoop<C> {
    follower: PathFollower,
    camera: C,
    tick: Duration,
    commands: mpsc::Receiver<FollowerCommand>,
    outputs: watch::Receiver<Option<Arc<CycleOutput>>>,
    poses: watch::Sender<CameraPose>,
    status: watch::Sender<FollowerStatus>,
}

impl<C: CameraController> FollowerLoop<C> {
    fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut listening = true;
            loop {
                tokio::select! {
                    _ = interval.tick() => self.on_tick(),
                    command = self.commands.recv(), if listening => match command {
                        Some(command) => self.on_command(command),
                        None => {
                            debug!("Follower command channel closed");
                            listening = false;
                        }
                    },
                }
            }
        })
    }

    fn on_tick(&mut self) {
        let output = self.outputs.borrow().clone();
        let scores = output.as_deref().map_or(&[][..], |output| &output.adjusted_scores[..]);
        let pose = self.camera.pose();

        let motion = self.follower.tick(pose.heading, pose.x, scores);
        self.apply(motion);
    }

    fn on_command(&mut self, command: FollowerCommand) {
        match command {
            FollowerCommand::Step => {
                let output = self.outputs.borrow().clone();
                let scores = output.as_deref().map_or(&[][..], |output| &output.adjusted_scores[..]);
                let pose = self.camera.pose();
                self.follower.step_forward(scores, pose.x);
            }
            FollowerCommand::Stop => self.follower.stop(),
            FollowerCommand::SetAutonomous(autonomous) => self.follower.set_autonomous(autonomous),
            FollowerCommand::SetPose(pose) => self.camera.set_pose(pose),
        }
        self.publish();
    }

    fn apply(&mut self, motion: Motion) {
        if motion.rotation != 0.0 {
            self.camera.rotate_by(motion.rotation);
        }
        if motion.forward != 0.0 {
            self.camera.move_forward(motion.forward);
            debug!("Advanced {} along {}", motion.forward, self.camera.pose().heading);
        }
        self.publish();
    }

    fn publish(&self) {
        let pose = self.camera.pose();
        self.poses.send_if_modified(|current| replace_if_changed(current, pose));

        let status = FollowerStatus {
            state: self.follower.state(),
            target: self.follower.target(),
            autonomous: self.follower.autonomous(),
            pose,
        };
        self.status.send_if_modified(|current| replace_if_changed(current, status));
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, next: T) -> bool {
    if *current == next {
        false
    } else {
        *current = next;
        true
    }
}

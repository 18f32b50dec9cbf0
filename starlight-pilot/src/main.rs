#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use log::info;
use starlight_inference::engine::detector_link;
use starlight_inference::external::ExternalServer;
use starlight_media::FrameSlot;
use starlight_pilot::follow::KinematicCamera;
use starlight_pilot::server::{serve, AppState};
use starlight_pilot::{log_init, Pilot, PilotConfig, Profile};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(version, about = "Picks a drivable heading from rendered terrain frames")]
struct Args {
    /// Scoring preset.
    #[arg(long, value_enum, default_value_t = Profile::Gradient)]
    profile: Profile,

    /// Analysis cycle period in milliseconds.
    #[arg(long, default_value_t = 300)]
    period_ms: u64,

    /// Follower control tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Keep stepping forward without waiting for /follower/step.
    #[arg(long)]
    autonomous: bool,

    #[arg(long, requires = "analysis_height")]
    analysis_width: Option<u32>,

    #[arg(long, requires = "analysis_width")]
    analysis_height: Option<u32>,

    /// Drop detections more than this many cycles old.
    #[arg(long)]
    max_detection_age: Option<u64>,

    /// Send RGBA frames to the detector instead of grayscale.
    #[arg(long)]
    color_detector: bool,
}

impl Args {
    fn into_config(self) -> PilotConfig {
        let mut config = PilotConfig::for_profile(self.profile);
        config.scoring.analysis_size = self.analysis_width.zip(self.analysis_height);

        let runtime = &mut config.runtime;
        runtime.cycle_period = Duration::from_millis(self.period_ms);
        runtime.follower_tick = Duration::from_millis(self.tick_ms);
        runtime.autonomous = self.autonomous;
        runtime.max_detection_age = self.max_detection_age;
        runtime.detector_grayscale = !self.color_detector;

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    log_init();

    let args = Args::parse();
    let bind = args.bind.clone();
    let config = args.into_config();
    config.validate()?;
    info!(
        "Profile {:?}: {} corridors x {} bands, cycle every {:?}",
        config.profile,
        config.scoring.num_corridors,
        config.scoring.num_bands,
        config.runtime.cycle_period
    );

    let frames = FrameSlot::new();
    let (sender, endpoint, responses) = detector_link(config.runtime.detector_queue);
    let (detector, _forwarder) = ExternalServer::spawn(endpoint);
    let (pilot, tasks) = Pilot::spawn(
        config,
        frames.clone(),
        KinematicCamera::default(),
        sender,
        responses,
    )?;

    let served = serve(
        &bind,
        AppState {
            frames,
            detector,
            pilot,
        },
    )
    .await;

    tasks.abort();
    served
}

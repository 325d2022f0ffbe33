//! Application wiring: builds the collaborators and hands them to the frame
//! loop.

use std::sync::mpsc;

use anyhow::Context;
use palm_gesture::{FrameLoop, FrameStats, LoopConfig, PoseModel};
use tracing::info;

use crate::player::{MidiPlayback, PlaybackConfig};
use crate::pose::{JsonLinesModel, PoseInput, SimPoseModel};
use crate::video::TestPatternVideo;
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where hand predictions come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoseSource {
    /// Keyboard-driven synthetic hand.
    Simulated,
    /// One JSON array of predictions per line from an external estimator.
    JsonLines(PoseInput),
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub loop_config: LoopConfig,
    pub playback:    PlaybackConfig,
    pub pose_source: PoseSource,
    /// Video size; the window opens at the same size.
    pub width:       usize,
    pub height:      usize,
    /// Mirror the picture for a front-facing camera.
    pub mirror:      bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            loop_config: LoopConfig::default(),
            playback:    PlaybackConfig::default(),
            pose_source: PoseSource::Simulated,
            width:       640,
            height:      500,
            mirror:      true,
        }
    }
}

impl AppConfig {
    pub fn window_title(&self) -> String {
        let source = match &self.pose_source {
            PoseSource::Simulated                      => "keyboard simulation".to_string(),
            PoseSource::JsonLines(PoseInput::Stdin)    => "stdin feed".to_string(),
            PoseSource::JsonLines(PoseInput::File(p))  => format!("feed {}", p.display()),
        };
        format!(
            "Palm Player — open hand plays, fist pauses ({}, quorum {})",
            source, self.loop_config.classifier.closed_quorum
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application until the window closes, a file feed runs out,
/// or the feed fails.
pub fn run(cfg: AppConfig) -> anyhow::Result<FrameStats> {
    let (sim_tx, sim_rx) = mpsc::channel();

    let surface = Visualizer::new(&cfg.window_title(), cfg.width, cfg.height, cfg.mirror, sim_tx)
        .context("cannot open the output window")?;

    let model: Box<dyn PoseModel> = match &cfg.pose_source {
        PoseSource::Simulated => Box::new(SimPoseModel::new(sim_rx)),
        PoseSource::JsonLines(input) => Box::new(
            JsonLinesModel::open(input)
                .with_context(|| format!("cannot open prediction feed {:?}", input))?,
        ),
    };

    let video    = TestPatternVideo::new(cfg.width, cfg.height);
    let playback = MidiPlayback::spawn(cfg.playback.clone());

    info!(source = ?cfg.pose_source, width = cfg.width, height = cfg.height, "starting");
    let mut frame_loop = FrameLoop::new(video, surface, model, playback, cfg.loop_config);
    let stats = frame_loop.run()?;
    Ok(stats)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

//! palm_player — interactive entry point.

use std::io::{self, Write};

use palm_gesture::LoopConfig;
use palm_player::app::{run, AppConfig, PoseSource};
use palm_player::player::PlaybackConfig;
use palm_player::pose::PoseInput;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["palm_gesture=info", "palm_player=info"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    fmt().with_env_filter(filter).init();
}

fn main() {
    init_logging();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Palm Player — open hand plays, closed hand pauses     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut cfg = match configure(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "bad configuration");
            std::process::exit(2);
        }
    };

    if let Some(path) = flag_value(&args, "--poses") {
        cfg.pose_source = PoseSource::JsonLines(PoseInput::from_arg(path));
    }

    match &cfg.pose_source {
        PoseSource::Simulated => {
            println!("  Mode: keyboard simulation  (use --poses <file|-> for an estimator feed)");
            println!("  Keys: 1-5 toggle fingers  O=open  C=fist  H=hide hand  F=fail inference  Q=quit");
        }
        PoseSource::JsonLines(input) => println!("  Mode: prediction feed from {:?}", input),
    }
    println!();

    match run(cfg) {
        Ok(stats) => info!(frames = stats.frames, "bye"),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn configure(args: &[String]) -> Result<AppConfig, palm_gesture::ConfigError> {
    let loop_config = match flag_value(args, "--config") {
        Some(path) => {
            println!("  Loop config: {}\n", path);
            Some(LoopConfig::from_json_file(path)?)
        }
        None => None,
    };

    // Prompts would eat the prediction feed when it arrives on stdin.
    let stdin_feed = flag_value(args, "--poses") == Some("-");
    if stdin_feed || args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: quorum 2 of 4, no smoothing, piano, 120 BPM\n");
        let mut cfg = AppConfig::default();
        if let Some(lc) = loop_config {
            cfg.loop_config = lc;
        }
        return Ok(cfg);
    }

    Ok(configure_interactively(loop_config))
}

fn configure_interactively(loop_config: Option<LoopConfig>) -> AppConfig {
    let loop_config = loop_config.unwrap_or_else(|| {
        let mut lc = LoopConfig::default();
        lc.classifier.closed_quorum = read_line("  Curled fingers that make a fist, 1–4 (default 2): ")
            .trim().parse::<usize>().unwrap_or(2).clamp(1, 4);
        lc.smoothing_frames = read_line("  Frames a change must hold, 1–30 (default 1): ")
            .trim().parse::<usize>().unwrap_or(1).clamp(1, 30);
        lc
    });

    let program = pick_instrument();
    let tempo_bpm: u32 = read_line("  Tempo BPM (default 120): ")
        .trim().parse().unwrap_or(120).clamp(20, 300);
    let root: u8 = read_line("  Root note MIDI# (default 60 = C4): ")
        .trim().parse::<u8>().unwrap_or(60).min(108);
    let velocity: u8 = read_line("  Velocity 0–127 (default 100): ")
        .trim().parse().unwrap_or(100).min(127);

    AppConfig {
        loop_config,
        playback: PlaybackConfig {
            program,
            tempo_bpm,
            velocity,
            root,
            ..PlaybackConfig::default()
        },
        ..AppConfig::default()
    }
}

fn pick_instrument() -> u8 {
    println!("  Instrument (GM program 0–127):");
    println!("    0=Grand Piano  11=Vibraphone  40=Violin  42=Cello");
    println!("    56=Trumpet  73=Flute  80=Lead Square  88=Pad New Age");
    read_line("  Program (default 0): ").trim().parse::<u8>().unwrap_or(0).min(127)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

//! Pose models — a keyboard simulation and a JSON-lines feed from an
//! external estimator.
//!
//! Both implement [`PoseModel`], so the frame loop does not know whether the
//! hand came from a real model or from the keyboard.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use palm_gesture::landmark::LANDMARK_COUNT;
use palm_gesture::{EstimateError, FingerName, HandPrediction, Landmark, PoseModel, VideoFrame};
use tracing::{debug, warn};

// ════════════════════════════════════════════════════════════════════════════
// SimInput — raw key events from the window
// ════════════════════════════════════════════════════════════════════════════

/// Input from the visualizer window, mapped from minifb keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// `1`–`5`: curl or straighten one finger.
    ToggleFinger(FingerName),
    /// `O`: straighten every finger.
    OpenHand,
    /// `C`: curl every finger.
    CloseHand,
    /// `H`: take the hand out of view / bring it back.
    ToggleVisible,
    /// `F`: make the next inference call fail.
    FailNext,
}

// ════════════════════════════════════════════════════════════════════════════
// SimPoseModel
// ════════════════════════════════════════════════════════════════════════════

/// Synthesises a hand from keyboard state.  The hand sways slightly from
/// frame to frame so the overlay is visibly live.
pub struct SimPoseModel {
    rx:        Receiver<SimInput>,
    curled:    [bool; 5],
    visible:   bool,
    fail_next: bool,
    tick:      u64,
}

impl SimPoseModel {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimPoseModel {
            rx,
            curled:    [false; 5],
            visible:   true,
            fail_next: false,
            tick:      0,
        }
    }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::ToggleFinger(f) => self.curled[f as usize] ^= true,
            SimInput::OpenHand        => self.curled = [false; 5],
            SimInput::CloseHand       => self.curled = [true; 5],
            SimInput::ToggleVisible   => self.visible = !self.visible,
            SimInput::FailNext        => self.fail_next = true,
        }
        debug!(?input, curled = ?self.curled, visible = self.visible, "sim hand updated");
    }
}

impl PoseModel for SimPoseModel {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<Vec<HandPrediction>, EstimateError> {
        loop {
            match self.rx.try_recv() {
                Ok(input) => self.apply(input),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.tick += 1;

        if std::mem::take(&mut self.fail_next) {
            return Err(EstimateError::Transient("simulated inference failure".into()));
        }
        if !self.visible {
            return Ok(Vec::new());
        }

        let sway = (self.tick as f32 * 0.05).sin() * frame.width as f32 * 0.02;
        let hand = synthetic_hand(frame.width as f32, frame.height as f32, sway, self.curled);
        HandPrediction::from_landmarks(hand)
            .map(|h| vec![h])
            .map_err(|e| EstimateError::Transient(e.to_string()))
    }
}

/// 21 landmarks of an upright hand in a `w × h` frame.  A curled finger
/// folds back so its tip ends up below its base.
fn synthetic_hand(w: f32, h: f32, sway: f32, curled: [bool; 5]) -> Vec<Landmark> {
    let wrist = Landmark::new(w * 0.5 + sway, h * 0.85, 0.0);
    let mut pts = vec![wrist; LANDMARK_COUNT];

    for finger in FingerName::ALL {
        let n = finger as usize;
        let (base_x, base_y) = if finger == FingerName::Thumb {
            (wrist.x - w * 0.12, h * 0.72)
        } else {
            (wrist.x + (n as f32 - 2.5) * w * 0.06, h * 0.6)
        };
        let seg = h * 0.08;
        // y offsets of the four joints relative to the base, bottom → tip
        let offsets: [f32; 4] = if curled[n] {
            [0.0, -0.6 * seg, 0.1 * seg, 0.5 * seg]
        } else {
            [0.0, -seg, -2.0 * seg, -2.8 * seg]
        };
        for (j, idx) in finger.chain_indices().into_iter().enumerate() {
            pts[idx] = Landmark::new(base_x, base_y + offsets[j], -(j as f32) * 4.0);
        }
    }
    pts
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesModel — predictions from an external process
// ════════════════════════════════════════════════════════════════════════════

/// Where JSON-lines predictions are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoseInput {
    Stdin,
    File(PathBuf),
}

impl PoseInput {
    /// `-` means stdin, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" { PoseInput::Stdin } else { PoseInput::File(PathBuf::from(arg)) }
    }
}

/// Consumes one line per frame: a JSON array of hand predictions as emitted
/// by the external estimator.  Lines are read on their own thread; each
/// `estimate` blocks for the next one.
///
/// The end of a file feed is [`EstimateError::Exhausted`], a normal stop.
/// The end of stdin and any read error are [`EstimateError::Disconnected`]:
/// the estimator went away while the loop still expected it.
pub struct JsonLinesModel {
    rx:     Receiver<FeedLine>,
    finite: bool,
    ended:  bool,
}

enum FeedLine {
    Line(String),
    /// The reader hit a clean end of input.
    End,
}

impl JsonLinesModel {
    pub fn open(input: &PoseInput) -> io::Result<Self> {
        match input {
            PoseInput::Stdin   => Ok(Self::spawn(BufReader::new(io::stdin()), false)),
            PoseInput::File(p) => Ok(Self::spawn(BufReader::new(File::open(p)?), true)),
        }
    }

    /// Start the reader thread over any line source.  `finite` sources end
    /// cleanly at EOF.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R, finite: bool) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || read_lines(reader, tx));
        JsonLinesModel { rx, finite, ended: false }
    }

    fn end_error(&self) -> EstimateError {
        if self.finite { EstimateError::Exhausted } else { EstimateError::Disconnected }
    }
}

fn read_lines<R: BufRead>(reader: R, tx: Sender<FeedLine>) {
    for line in reader.lines() {
        match line {
            Ok(l) => {
                if tx.send(FeedLine::Line(l)).is_err() { return; }
            }
            Err(e) => {
                warn!(error = %e, "prediction feed read failed");
                return;
            }
        }
    }
    debug!("prediction feed ended");
    let _ = tx.send(FeedLine::End);
}

impl PoseModel for JsonLinesModel {
    fn estimate(&mut self, _frame: &VideoFrame) -> Result<Vec<HandPrediction>, EstimateError> {
        if self.ended {
            return Err(self.end_error());
        }
        match self.rx.recv() {
            Ok(FeedLine::Line(line)) => parse_line(&line),
            Ok(FeedLine::End) => {
                self.ended = true;
                Err(self.end_error())
            }
            Err(_) => Err(EstimateError::Disconnected),
        }
    }
}

/// A blank line means no hands; a line that does not parse is a transient
/// failure for that frame.
pub fn parse_line(line: &str) -> Result<Vec<HandPrediction>, EstimateError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(line)
        .map_err(|e| EstimateError::Transient(format!("bad prediction line: {}", e)))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

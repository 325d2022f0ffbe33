//! # palm_player
//!
//! Hand-gesture music controller: a looping MIDI phrase plays while an open
//! hand is in view and pauses on a fist or when the hand leaves the frame.
//! The hand skeleton is drawn over the (mirrored) video in a window.
//!
//! ## Gesture → Action mapping
//!
//! | Hand | Action |
//! |---|---|
//! | Open (fewer than 2 of index/middle/ring/pinky curled) | Play |
//! | Closed (2 or more curled) | Pause |
//! | Not visible | Pause |
//!
//! ## Pose sources
//!
//! * (default) — **Simulation**: the keyboard shapes a synthetic hand.
//! * `--poses <file|->` — **External estimator**: one JSON array of hand
//!   predictions per line, e.g. piped from a MediaPipe/handpose process.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `1`–`5` | Curl / straighten thumb, index, middle, ring, pinky |
//! | `O` | Open hand |
//! | `C` | Fist |
//! | `H` | Hide / show hand |
//! | `F` | Fail the next inference call |
//! | `Q` / `Esc` | Quit |

pub mod pose;
pub mod video;
pub mod player;
pub mod visualizer;
pub mod app;

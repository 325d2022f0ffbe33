//! Real-time MIDI playback thread.
//!
//! While playing, the thread loops a short phrase on a MIDI output port.
//! `play` and `pause` are sent over a channel and are idempotent: the handle
//! only forwards a command that changes state, and the thread ignores a
//! `Play` while already playing.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use palm_gesture::PlaybackDevice;
use tracing::{info, warn};

// ════════════════════════════════════════════════════════════════════════════
// PlaybackConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackConfig {
    /// General MIDI program 0–127.
    pub program:   u8,
    pub tempo_bpm: u32,
    pub velocity:  u8,
    pub channel:   u8,
    /// Root note of the phrase (MIDI number).
    pub root:      u8,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            program:   0,
            tempo_bpm: 120,
            velocity:  100,
            channel:   0,
            root:      60,
        }
    }
}

/// Semitone offsets of the looped phrase — a rising and falling arpeggio.
const PHRASE: [u8; 8] = [0, 4, 7, 12, 16, 12, 7, 4];

impl PlaybackConfig {
    /// Notes of one phrase pass, clamped to the MIDI range.
    pub fn phrase(&self) -> Vec<u8> {
        PHRASE.iter().map(|&o| self.root.saturating_add(o).min(127)).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note, velocity]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note, 0]);
    }
}

/// Used when no MIDI port is available.
struct NullOut;

impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)  {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8) {}
    fn note_off(&mut self, _ch: u8, _n: u8)        {}
}

/// Open the first output port, preferring a software synthesiser.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("palm_player") {
        Ok(m)  => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed, playback is silent");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found, playback is silent \
               (start a synthesiser such as `fluidsynth` or `timidity -iA`)");
        return Box::new(NullOut);
    }

    let port_idx = ports.iter()
        .position(|p| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("synth")
            }).unwrap_or(false)
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "unknown".to_string());
    info!(port = %name, "opening MIDI port");

    match midi_out.connect(port, "palm-play") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!(error = %e, "MIDI connect failed, playback is silent");
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiPlayback — handle to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub struct MidiPlayback {
    cmd_tx:  Sender<PlayerCommand>,
    playing: bool,
}

impl MidiPlayback {
    /// Spawn the playback thread, starting paused.
    pub fn spawn(cfg: PlaybackConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        thread::spawn(move || player_thread(open_midi_output(), cfg, cmd_rx));
        Self::from_sender(cmd_tx)
    }

    fn from_sender(cmd_tx: Sender<PlayerCommand>) -> Self {
        MidiPlayback { cmd_tx, playing: false }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            warn!(?cmd, "playback thread is gone");
        }
    }
}

impl PlaybackDevice for MidiPlayback {
    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.send(PlayerCommand::Play);
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.send(PlayerCommand::Pause);
        }
    }
}

impl Drop for MidiPlayback {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread(mut midi: Box<dyn MidiOut>, cfg: PlaybackConfig, cmd_rx: Receiver<PlayerCommand>) {
    let phrase  = cfg.phrase();
    let note_ms = note_ms(cfg.tempo_bpm);
    let mut playing  = false;
    let mut position = 0usize;
    let mut sounding: Option<u8> = None;

    midi.program_change(cfg.channel, cfg.program);

    loop {
        // While paused, block on the next command; while playing, wait at
        // most one note length.
        let cmd = if playing {
            match cmd_rx.recv_timeout(Duration::from_millis(note_ms)) {
                Ok(c) => Some(c),
                Err(RecvTimeoutError::Timeout)      => None,
                Err(RecvTimeoutError::Disconnected) => Some(PlayerCommand::Quit),
            }
        } else {
            Some(cmd_rx.recv().unwrap_or(PlayerCommand::Quit))
        };

        match cmd {
            Some(PlayerCommand::Play) => {
                if playing { continue; }
                playing = true;
            }
            Some(PlayerCommand::Pause) => {
                if let Some(n) = sounding.take() { midi.note_off(cfg.channel, n); }
                playing = false;
                continue;
            }
            Some(PlayerCommand::Quit) => {
                if let Some(n) = sounding.take() { midi.note_off(cfg.channel, n); }
                return;
            }
            None => {}
        }

        // Next note of the phrase, resuming where the last pause left off.
        if let Some(n) = sounding.take() { midi.note_off(cfg.channel, n); }
        let note = phrase[position % phrase.len()];
        position = position.wrapping_add(1);
        midi.note_on(cfg.channel, note, cfg.velocity);
        sounding = Some(note);
    }
}

/// Length of one eighth note in milliseconds, floored at 50 ms.
fn note_ms(bpm: u32) -> u64 {
    (30_000u64 / bpm.max(1) as u64).max(50)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn eighth_note_at_120bpm() {
        assert_eq!(note_ms(120), 250);
    }

    #[test]
    fn eighth_note_min_floor() {
        assert_eq!(note_ms(1000), 50);
        assert_eq!(note_ms(0), 30_000);
    }

    #[test]
    fn phrase_clamps_to_midi_range() {
        let cfg = PlaybackConfig { root: 120, ..PlaybackConfig::default() };
        assert!(cfg.phrase().iter().all(|&n| n <= 127));
        assert_eq!(PlaybackConfig::default().phrase()[..4], [60, 64, 67, 72]);
    }

    #[test]
    fn handle_forwards_only_state_changes() {
        let (tx, rx) = mpsc::channel();
        let mut p = MidiPlayback::from_sender(tx);
        p.pause();
        p.play();
        p.play();
        p.pause();
        p.pause();
        p.play();
        drop(p);
        let sent: Vec<PlayerCommand> = rx.try_iter().collect();
        use PlayerCommand::*;
        assert_eq!(sent, [Play, Pause, Play, Quit]);
    }

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl MidiOut for Log {
        fn program_change(&mut self, _ch: u8, p: u8) {
            self.0.lock().unwrap().push(format!("prog {}", p));
        }
        fn note_on(&mut self, _ch: u8, n: u8, _v: u8) {
            self.0.lock().unwrap().push(format!("on {}", n));
        }
        fn note_off(&mut self, _ch: u8, n: u8) {
            self.0.lock().unwrap().push(format!("off {}", n));
        }
    }

    #[test]
    fn thread_plays_then_silences_on_pause() {
        let log = Log::default();
        let (tx, rx) = mpsc::channel();
        let out = log.clone();
        let cfg = PlaybackConfig { tempo_bpm: 600, ..PlaybackConfig::default() };
        let t = thread::spawn(move || player_thread(Box::new(out), cfg, rx));

        tx.send(PlayerCommand::Play).unwrap();
        tx.send(PlayerCommand::Play).unwrap();
        thread::sleep(Duration::from_millis(20));
        tx.send(PlayerCommand::Pause).unwrap();
        tx.send(PlayerCommand::Quit).unwrap();
        t.join().unwrap();

        let events = log.0.lock().unwrap().clone();
        assert_eq!(events[0], "prog 0");
        assert_eq!(events[1], "on 60");
        // Every note that started was stopped.
        let ons  = events.iter().filter(|e| e.starts_with("on")).count();
        let offs = events.iter().filter(|e| e.starts_with("off")).count();
        assert_eq!(ons, offs);
    }
}

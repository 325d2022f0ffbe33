//! Optional debounce stage between the classifier and playback.
//!
//! The classifier has no memory, so a single jittery frame flips playback.
//! [`Debouncer`] holds the last accepted classification until a different
//! one has been seen for `required` consecutive frames.

use tracing::trace;

use crate::classifier::Classification;

#[derive(Clone, Debug)]
pub struct Debouncer {
    required:  usize,
    stable:    Classification,
    candidate: Option<Classification>,
    streak:    usize,
}

impl Debouncer {
    /// `required` of 0 or 1 passes every classification straight through.
    pub fn new(required: usize) -> Self {
        Debouncer {
            required:  required.max(1),
            stable:    Classification::ABSENT,
            candidate: None,
            streak:    0,
        }
    }

    /// Feed one frame's classification, get back the one to act on.
    pub fn update(&mut self, next: Classification) -> Classification {
        if next == self.stable {
            self.candidate = None;
            self.streak = 0;
            return self.stable;
        }

        if self.candidate == Some(next) {
            self.streak += 1;
        } else {
            self.candidate = Some(next);
            self.streak = 1;
        }

        if self.streak >= self.required {
            trace!(from = ?self.stable, to = ?next, "debounced transition");
            self.stable = next;
            self.candidate = None;
            self.streak = 0;
        }
        self.stable
    }

    pub fn current(&self) -> Classification {
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GestureState;

    const OPEN:   Classification = Classification { present: true, gesture: GestureState::Open };
    const CLOSED: Classification = Classification { present: true, gesture: GestureState::Closed };

    #[test]
    fn single_frame_window_passes_through() {
        let mut d = Debouncer::new(1);
        assert_eq!(d.update(OPEN), OPEN);
        assert_eq!(d.update(CLOSED), CLOSED);
        assert_eq!(d.update(Classification::ABSENT), Classification::ABSENT);
    }

    #[test]
    fn zero_behaves_like_one() {
        let mut d = Debouncer::new(0);
        assert_eq!(d.update(OPEN), OPEN);
    }

    #[test]
    fn transition_needs_consecutive_frames() {
        let mut d = Debouncer::new(3);
        assert_eq!(d.update(OPEN), Classification::ABSENT);
        assert_eq!(d.update(OPEN), Classification::ABSENT);
        assert_eq!(d.update(OPEN), OPEN);
        assert_eq!(d.current(), OPEN);
    }

    #[test]
    fn jitter_resets_the_streak() {
        let mut d = Debouncer::new(2);
        d.update(OPEN);
        d.update(OPEN);
        assert_eq!(d.update(CLOSED), OPEN);
        assert_eq!(d.update(OPEN), OPEN);
        assert_eq!(d.update(CLOSED), OPEN);
        assert_eq!(d.update(Classification::ABSENT), OPEN);
        assert_eq!(d.update(Classification::ABSENT), Classification::ABSENT);
    }
}

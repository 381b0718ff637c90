//! Single-utterance speech output with cancellation.
//!
//! The synthesis engine is a single global resource: `speak` is destructive
//! to any in-flight utterance (last writer wins, nothing is queued). The
//! controller owns the "currently speaking" flag; end-of-utterance
//! notifications for superseded utterances are ignored.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Platform seam for actually producing audio. When the capability is
/// unavailable, `speak` degrades to a no-op rather than an error.
pub trait SpeechSynthesizer: Send + Sync {
    fn available(&self) -> bool;

    /// Begins speaking. The implementation must report completion or error
    /// back through [`SpeechOutputController::utterance_ended`] with the
    /// same id.
    fn begin(&self, utterance_id: u64, text: &str);

    /// Stops whatever is currently being synthesized.
    fn cancel(&self);
}

#[derive(Default)]
struct SpeakerState {
    active: Option<u64>,
    next_id: u64,
}

/// Host-facing controller for the speech-synthesis resource.
pub struct SpeechOutputController {
    synth: std::sync::Arc<dyn SpeechSynthesizer>,
    state: Mutex<SpeakerState>,
    speaking: AtomicBool,
}

impl SpeechOutputController {
    pub fn new(synth: std::sync::Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synth,
            state: Mutex::new(SpeakerState::default()),
            speaking: AtomicBool::new(false),
        }
    }

    /// Speaks `text`, cancelling any utterance already in progress. No-op
    /// when synthesis is unavailable on this platform.
    pub fn speak(&self, text: &str) {
        if !self.synth.available() {
            return;
        }
        let id = {
            let mut state = self.state.lock().expect("speaker state poisoned");
            if state.active.is_some() {
                self.synth.cancel();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.active = Some(id);
            id
        };
        self.speaking.store(true, Ordering::SeqCst);
        self.synth.begin(id, text);
    }

    /// Stops any in-progress utterance.
    pub fn cancel(&self) {
        let had_active = {
            let mut state = self.state.lock().expect("speaker state poisoned");
            state.active.take().is_some()
        };
        if had_active {
            self.synth.cancel();
        }
        self.speaking.store(false, Ordering::SeqCst);
    }

    /// Called by the synthesizer when an utterance finishes or errors.
    /// Notifications for superseded utterances are ignored.
    pub fn utterance_ended(&self, utterance_id: u64) {
        let mut state = self.state.lock().expect("speaker state poisoned");
        if state.active == Some(utterance_id) {
            state.active = None;
            self.speaking.store(false, Ordering::SeqCst);
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSynth {
        available: bool,
        begun: Mutex<Vec<(u64, String)>>,
        cancels: Mutex<u32>,
    }

    impl RecordingSynth {
        fn available() -> Self {
            Self {
                available: true,
                ..Self::default()
            }
        }
    }

    impl SpeechSynthesizer for RecordingSynth {
        fn available(&self) -> bool {
            self.available
        }

        fn begin(&self, utterance_id: u64, text: &str) {
            self.begun
                .lock()
                .unwrap()
                .push((utterance_id, text.to_string()));
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }
    }

    #[test]
    fn speak_flips_the_speaking_flag() {
        let synth = Arc::new(RecordingSynth::available());
        let ctl = SpeechOutputController::new(synth.clone());
        assert!(!ctl.is_speaking());

        ctl.speak("hello");
        assert!(ctl.is_speaking());

        ctl.utterance_ended(0);
        assert!(!ctl.is_speaking());
    }

    #[test]
    fn second_speak_cancels_the_first_and_wins() {
        let synth = Arc::new(RecordingSynth::available());
        let ctl = SpeechOutputController::new(synth.clone());

        ctl.speak("A");
        ctl.speak("B");

        // "A" was cancelled and never completes; "B" is the active utterance.
        assert_eq!(*synth.cancels.lock().unwrap(), 1);
        let begun = synth.begun.lock().unwrap();
        assert_eq!(begun.len(), 2);
        assert_eq!(begun[1].1, "B");
        drop(begun);

        // The stale end notification for "A" must not clear the flag.
        ctl.utterance_ended(0);
        assert!(ctl.is_speaking());

        ctl.utterance_ended(1);
        assert!(!ctl.is_speaking());
    }

    #[test]
    fn cancel_stops_the_active_utterance() {
        let synth = Arc::new(RecordingSynth::available());
        let ctl = SpeechOutputController::new(synth.clone());

        ctl.speak("hello");
        ctl.cancel();

        assert_eq!(*synth.cancels.lock().unwrap(), 1);
        assert!(!ctl.is_speaking());
    }

    #[test]
    fn cancel_without_an_utterance_does_nothing() {
        let synth = Arc::new(RecordingSynth::available());
        let ctl = SpeechOutputController::new(synth.clone());
        ctl.cancel();
        assert_eq!(*synth.cancels.lock().unwrap(), 0);
    }

    #[test]
    fn speak_is_a_noop_when_synthesis_is_unavailable() {
        let synth = Arc::new(RecordingSynth::default());
        let ctl = SpeechOutputController::new(synth.clone());

        ctl.speak("hello");

        assert!(!ctl.is_speaking());
        assert!(synth.begun.lock().unwrap().is_empty());
    }
}

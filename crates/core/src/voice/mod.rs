//! Voice input: a three-tier capture state machine.
//!
//! Capture runs `idle -> capturing -> processing -> {done, failed} -> idle`.
//! The remote tier records audio from an exclusive capture device and sends
//! it to the transcription provider; if device acquisition or transcription
//! fails, the session falls back (once, hard) to local in-browser style
//! recognition. Only the final, all-tiers-exhausted failure surfaces to the
//! user, as a fixed human-readable message. Capture and transcription
//! failures never escape this module. A new `start` supersedes whatever
//! session exists, including one still resolving; a superseded session's
//! outcome is discarded.

pub mod speech;
pub mod transcribe;

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use transcribe::TranscriptionProvider;

/// The one failure message users ever see from voice input.
pub const CAPTURE_FAILED_MESSAGE: &str =
    "Sorry, I couldn't hear that. Please check your microphone and try again.";

/// Failures internal to the voice subsystem.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("capture device unavailable: {0}")]
    CaptureUnavailable(String),
    #[error("transcription failed: {0}")]
    Transcription(String),
    #[error("local recognition failed: {0}")]
    Recognition(String),
    #[error("no capture in progress")]
    NotCapturing,
}

/// Ranked fallback level in the capture chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceTier {
    Remote,
    LocalFallback,
}

/// Observable state of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Capturing(VoiceTier),
    Processing,
}

/// An in-progress recording on the physical capture device. Dropping the
/// handle releases the device.
#[async_trait]
pub trait AudioCapture: Send {
    /// Stops recording and returns the accumulated audio.
    async fn stop(&mut self) -> Result<Vec<u8>, VoiceError>;

    /// MIME type of the captured audio (e.g. `audio/webm`).
    fn mime_type(&self) -> &str;
}

/// Acquires the exclusive physical capture device.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn AudioCapture>, VoiceError>;
}

/// In-browser style recognition: captures and recognizes in one suspending
/// operation, emitting the transcript directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalRecognizer: Send + Sync {
    async fn recognize(&self) -> Result<String, VoiceError>;
}

/// The result of one finished capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    Transcript(String),
    Failed(&'static str),
}

enum Active {
    Idle,
    Capturing {
        epoch: u64,
        tier: VoiceTier,
        capture: Option<Box<dyn AudioCapture>>,
    },
    Processing {
        epoch: u64,
    },
}

/// Orchestrates capture, remote transcription, and local fallback.
///
/// Owns the "currently capturing" flag for the exclusive device; at most one
/// session may be capturing or processing at a time.
pub struct VoiceInputController {
    device: std::sync::Arc<dyn CaptureDevice>,
    provider: std::sync::Arc<dyn TranscriptionProvider>,
    recognizer: std::sync::Arc<dyn LocalRecognizer>,
    active: Mutex<Active>,
    /// Monotonic session counter; a stale session's outcome is discarded.
    epoch: AtomicU64,
}

impl VoiceInputController {
    pub fn new(
        device: std::sync::Arc<dyn CaptureDevice>,
        provider: std::sync::Arc<dyn TranscriptionProvider>,
        recognizer: std::sync::Arc<dyn LocalRecognizer>,
    ) -> Self {
        Self {
            device,
            provider,
            recognizer,
            active: Mutex::new(Active::Idle),
            epoch: AtomicU64::new(0),
        }
    }

    /// Begins a capture session, stopping any active one first. A session
    /// still resolving in `finish` is superseded; its outcome is discarded.
    ///
    /// Attempts the remote tier by acquiring the capture device; if
    /// acquisition fails for any reason the session drops straight to the
    /// local fallback tier. This is a hard fallback, not a retry.
    pub async fn start(&self) -> VoiceTier {
        let mut active = self.active.lock().await;
        if !matches!(*active, Active::Idle) {
            debug!("stopping active capture session before starting a new one");
        }
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let tier = match self.device.acquire().await {
            Ok(capture) => {
                *active = Active::Capturing {
                    epoch,
                    tier: VoiceTier::Remote,
                    capture: Some(capture),
                };
                VoiceTier::Remote
            }
            Err(e) => {
                warn!(error = %e, "capture device unavailable, falling back to local recognition");
                *active = Active::Capturing {
                    epoch,
                    tier: VoiceTier::LocalFallback,
                    capture: None,
                };
                VoiceTier::LocalFallback
            }
        };
        tier
    }

    /// Current session state.
    pub async fn state(&self) -> VoiceState {
        match &*self.active.lock().await {
            Active::Idle => VoiceState::Idle,
            Active::Capturing { tier, .. } => VoiceState::Capturing(*tier),
            Active::Processing { .. } => VoiceState::Processing,
        }
    }

    /// Stops capturing and resolves the session to a transcript or the
    /// fixed failure message, returning the controller to idle.
    ///
    /// Remote tier: package the audio and submit it to the transcription
    /// provider; on provider failure make exactly one local-recognition
    /// attempt before failing. Local tier: one recognition attempt, no
    /// further fallback. The session is observable as `Processing` while
    /// this resolves; if `start` or `cancel` supersedes it in the meantime
    /// the outcome is discarded and `NotCapturing` is returned.
    pub async fn finish(&self) -> Result<VoiceOutcome, VoiceError> {
        let (epoch, tier, capture) = {
            let mut active = self.active.lock().await;
            let (epoch, tier, capture) = match &mut *active {
                Active::Capturing {
                    epoch,
                    tier,
                    capture,
                } => (*epoch, *tier, capture.take()),
                _ => return Err(VoiceError::NotCapturing),
            };
            *active = Active::Processing { epoch };
            (epoch, tier, capture)
        };
        // Tier transitions are strictly sequential: the remote attempt must
        // resolve before local fallback begins. The lock is released here so
        // the session stays observable while it resolves.
        let outcome = match tier {
            VoiceTier::Remote => match self.transcribe_remote(capture).await {
                Ok(transcript) => VoiceOutcome::Transcript(transcript),
                Err(e) => {
                    warn!(error = %e, "remote tier failed, attempting local fallback");
                    self.recognize_local().await
                }
            },
            VoiceTier::LocalFallback => self.recognize_local().await,
        };
        let mut active = self.active.lock().await;
        match *active {
            Active::Processing { epoch: current } if current == epoch => {
                *active = Active::Idle;
                Ok(outcome)
            }
            _ => {
                debug!("capture session superseded during processing, outcome discarded");
                Err(VoiceError::NotCapturing)
            }
        }
    }

    /// Discards the session and any partial audio without invoking the
    /// provider. A session mid-resolution is superseded the same way.
    pub async fn cancel(&self) {
        let mut active = self.active.lock().await;
        if !matches!(*active, Active::Idle) {
            debug!("capture session cancelled, partial audio discarded");
        }
        *active = Active::Idle;
    }

    async fn transcribe_remote(
        &self,
        capture: Option<Box<dyn AudioCapture>>,
    ) -> Result<String, VoiceError> {
        let mut capture = capture.ok_or(VoiceError::NotCapturing)?;
        let audio = capture.stop().await?;
        let mime = capture.mime_type().to_string();
        self.provider.transcribe(audio, &mime).await
    }

    async fn recognize_local(&self) -> VoiceOutcome {
        match self.recognizer.recognize().await {
            Ok(transcript) => VoiceOutcome::Transcript(transcript),
            Err(e) => {
                warn!(error = %e, "local recognition failed, all tiers exhausted");
                VoiceOutcome::Failed(CAPTURE_FAILED_MESSAGE)
            }
        }
    }
}

//! Remote speech-to-text over a Whisper-style HTTP API.

use super::VoiceError;
use async_trait::async_trait;
use serde::Deserialize;

/// Wraps a remote speech-to-text call. Pure transport; the fallback policy
/// lives in the voice input controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Submits captured audio and returns the transcript.
    async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> Result<String, VoiceError>;
}

#[derive(Deserialize)]
struct TranscriptionReply {
    text: String,
}

/// A provider for any OpenAI-compatible `audio/transcriptions` endpoint
/// (Groq's Whisper deployment in the default configuration).
pub struct WhisperHttpProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl WhisperHttpProvider {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperHttpProvider {
    async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> Result<String, VoiceError> {
        let file = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.webm")
            .mime_str(mime)
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text(
                "prompt",
                "This is speech from a child using an educational app. Please transcribe clearly.",
            )
            .text("response_format", "json")
            .text("language", "en")
            .text("temperature", "0");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VoiceError::Transcription(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let reply: TranscriptionReply = response
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        Ok(reply.text)
    }
}

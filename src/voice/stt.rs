//! Speech-to-text (STT) processing

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

use super::SAMPLE_RATE;
use crate::config::SttProviderKind;
use crate::{Error, Language, Result};

/// Turns recorded speech into text in a given language
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatch`] when speech was heard but no text could be
    /// produced, and another error when the backend itself failed
    async fn transcribe(&self, wav: &[u8], language: Language) -> Result<String>;
}

/// Response from Google Speech-to-Text
#[derive(serde::Deserialize)]
struct GoogleRecognizeResponse {
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(serde::Deserialize)]
struct GoogleResult {
    #[serde(default)]
    alternatives: Vec<GoogleAlternative>,
}

#[derive(serde::Deserialize)]
struct GoogleAlternative {
    #[serde(default)]
    transcript: String,
}

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    provider: SttProviderKind,
}

impl SpeechToText {
    /// Create a new STT instance for `provider`
    ///
    /// `model` falls back to the provider default when `None`.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        provider: SttProviderKind,
        api_key: Option<SecretString>,
        model: Option<String>,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| Error::Config(format!("API key required for {provider:?} STT")))?;

        let model = model.unwrap_or_else(|| {
            match provider {
                SttProviderKind::Google => "default",
                SttProviderKind::Whisper => "whisper-1",
                SttProviderKind::Deepgram => "nova-2",
            }
            .to_string()
        });

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider,
        })
    }

    /// Transcribe using Google Speech-to-Text
    async fn transcribe_google(&self, audio: &[u8], language: Language) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), %language, "starting Google transcription");

        let body = serde_json::json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": SAMPLE_RATE,
                "languageCode": language.tag(),
                "model": self.model,
            },
            "audio": {
                "content": base64::engine::general_purpose::STANDARD.encode(audio),
            },
        });

        let response = self
            .client
            .post("https://speech.googleapis.com/v1/speech:recognize")
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google STT request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google STT API error");
            return Err(Error::Stt(format!("Google STT API error {status}: {body}")));
        }

        let result: GoogleRecognizeResponse = response.json().await?;
        let transcript = result
            .results
            .first()
            .and_then(|r| r.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        Ok(transcript)
    }

    /// Transcribe using OpenAI Whisper
    async fn transcribe_whisper(&self, audio: &[u8], language: Language) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), %language, "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", language.code());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        Ok(result.text)
    }

    /// Transcribe using Deepgram
    async fn transcribe_deepgram(&self, audio: &[u8], language: Language) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), %language, "starting Deepgram transcription");

        let response = self
            .client
            .post("https://api.deepgram.com/v1/listen")
            .query(&[
                ("model", self.model.as_str()),
                ("language", language.code()),
                ("punctuate", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key.expose_secret()))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
            e
        })?;

        let transcript = result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        Ok(transcript)
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, wav: &[u8], language: Language) -> Result<String> {
        let transcript = match self.provider {
            SttProviderKind::Google => self.transcribe_google(wav, language).await?,
            SttProviderKind::Whisper => self.transcribe_whisper(wav, language).await?,
            SttProviderKind::Deepgram => self.transcribe_deepgram(wav, language).await?,
        };

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(Error::NoMatch);
        }

        tracing::debug!(transcript, %language, "transcription complete");
        Ok(transcript.to_string())
    }
}

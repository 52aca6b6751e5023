//! Speech input pipeline
//!
//! Turns one blocking listen into normalized lowercase text. Recognition is
//! tried in the active language first and the other supported language
//! second; success in the second language switches the session to it.
//! Every failure path yields `None` so the dialogue loop keeps running.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::capture::{SAMPLE_RATE, samples_to_wav};
use super::stt::Transcriber;
use crate::config::ListenConfig;
use crate::{Error, Language, Result, Session};

/// Pause after a device failure before the next listen may retry
pub const DEVICE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Text recognized from one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceIn {
    /// Lowercase, whitespace-trimmed transcript
    pub text: String,
    /// Language the transcript was recognized in
    pub language: Language,
}

/// Audio capture device
#[async_trait(?Send)]
pub trait Microphone {
    /// Acquire the device and start buffering audio
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened
    async fn open(&mut self) -> Result<()>;

    /// Measure ambient noise for `duration`, returning its RMS level
    ///
    /// # Errors
    ///
    /// Returns error if the device fails while measuring
    async fn calibrate_noise(&mut self, duration: Duration) -> Result<f32>;

    /// Block until one utterance has been spoken
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListenTimeout`] when no speech starts within
    /// `start_timeout`, or a device error
    async fn capture_utterance(
        &mut self,
        start_timeout: Duration,
        max_duration: Duration,
    ) -> Result<Vec<f32>>;

    /// Release the device
    async fn close(&mut self);
}

/// Source of user utterances for the session loop
#[async_trait(?Send)]
pub trait Listen {
    /// Wait for the next utterance
    ///
    /// Never fails: anything that is not usable text is `None`. May switch
    /// the session language when the utterance was recognized in the other
    /// language.
    async fn listen(&mut self, session: &mut Session) -> Option<UtteranceIn>;

    /// Whether the source can never produce another utterance
    fn is_closed(&self) -> bool {
        false
    }
}

/// Microphone plus recognizer, with language fallback
pub struct SpeechInput {
    microphone: Box<dyn Microphone>,
    transcriber: Box<dyn Transcriber>,
    listen: ListenConfig,
}

impl SpeechInput {
    /// Create a new speech input pipeline
    #[must_use]
    pub fn new(
        microphone: Box<dyn Microphone>,
        transcriber: Box<dyn Transcriber>,
        listen: ListenConfig,
    ) -> Self {
        Self {
            microphone,
            transcriber,
            listen,
        }
    }

    /// Record one utterance and encode it as WAV
    async fn record(&mut self) -> Result<Vec<u8>> {
        self.microphone.open().await?;
        tracing::info!("listening...");

        let captured = async {
            self.microphone
                .calibrate_noise(self.listen.calibration)
                .await?;
            self.microphone
                .capture_utterance(self.listen.start_timeout, self.listen.phrase_limit)
                .await
        }
        .await;

        self.microphone.close().await;
        samples_to_wav(&captured?, SAMPLE_RATE)
    }

    /// Try each language in fallback order until one yields text
    async fn recognize(&self, wav: &[u8], primary: Language) -> Result<UtteranceIn> {
        for language in primary.fallback_order() {
            match self.transcriber.transcribe(wav, language).await {
                Ok(text) => {
                    return Ok(UtteranceIn {
                        text: text.trim().to_lowercase(),
                        language,
                    });
                }
                Err(Error::NoMatch) => {
                    tracing::debug!(%language, "no transcription, trying next language");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::NoMatch)
    }
}

#[async_trait(?Send)]
impl Listen for SpeechInput {
    async fn listen(&mut self, session: &mut Session) -> Option<UtteranceIn> {
        let wav = match self.record().await {
            Ok(wav) => wav,
            Err(Error::ListenTimeout) => {
                tracing::debug!("no speech before timeout");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio device error");
                tokio::time::sleep(DEVICE_RETRY_DELAY).await;
                return None;
            }
        };

        let primary = session.language();
        match self.recognize(&wav, primary).await {
            Ok(utterance) if utterance.text.is_empty() => None,
            Ok(utterance) => {
                if utterance.language == primary {
                    tracing::info!(language = %utterance.language, text = %utterance.text, "user said");
                } else {
                    tracing::info!(language = %utterance.language, text = %utterance.text, "user said (detected other language)");
                    session.switch_to(utterance.language);
                }
                Some(utterance)
            }
            Err(Error::NoMatch) => {
                tracing::debug!("speech not understood in either language");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "recognition error");
                None
            }
        }
    }
}

/// Typed input from stdin, one command per line
///
/// Used for headless runs without a microphone. Lines are tagged with the
/// session's current language.
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
    closed: bool,
}

impl ConsoleInput {
    /// Read commands from the process's stdin
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            closed: false,
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::stdin()
    }
}

#[async_trait(?Send)]
impl Listen for ConsoleInput {
    async fn listen(&mut self, session: &mut Session) -> Option<UtteranceIn> {
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                let text = line.trim().to_lowercase();
                if text.is_empty() {
                    return None;
                }
                Some(UtteranceIn {
                    text,
                    language: session.language(),
                })
            }
            Ok(None) => {
                tracing::debug!("stdin closed");
                self.closed = true;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                None
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

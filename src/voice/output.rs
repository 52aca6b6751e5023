//! Speech output pipeline
//!
//! Every utterance is logged, then handed to an ordered list of speech
//! providers. The first provider that succeeds wins; failures are logged and
//! the next provider is tried. Nothing is propagated to the caller.

use async_trait::async_trait;

use super::playback::{AudioPlayer, check_mp3};
use super::tts::{Synthesizer, VoiceGender};
use crate::{Language, Result};

/// Text to speak and the language to speak it in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceOut {
    pub text: String,
    pub language: Language,
}

impl UtteranceOut {
    #[must_use]
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }
}

/// One way of turning text into audible speech
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Speak `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if the text could not be spoken
    async fn speak(&self, text: &str, language: Language) -> Result<()>;
}

/// Remote synthesis followed by playback
pub struct RemoteSpeech {
    synthesizer: Box<dyn Synthesizer>,
    player: Box<dyn AudioPlayer>,
    gender: VoiceGender,
}

impl RemoteSpeech {
    /// Create a remote provider with a male voice preference
    #[must_use]
    pub fn new(synthesizer: Box<dyn Synthesizer>, player: Box<dyn AudioPlayer>) -> Self {
        Self {
            synthesizer,
            player,
            gender: VoiceGender::Male,
        }
    }
}

#[async_trait]
impl SpeechProvider for RemoteSpeech {
    fn name(&self) -> &str {
        self.synthesizer.name()
    }

    async fn speak(&self, text: &str, language: Language) -> Result<()> {
        let audio = self
            .synthesizer
            .synthesize(text, language, self.gender)
            .await?;
        check_mp3(&audio)?;
        self.player.play_mp3(&audio).await
    }
}

/// Ordered fallback chain of speech providers
#[derive(Default)]
pub struct SpeechOutput {
    providers: Vec<Box<dyn SpeechProvider>>,
}

impl SpeechOutput {
    /// Create an empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider; earlier providers are tried first
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn SpeechProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Names of the configured providers, in order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Speak an utterance through the first provider that succeeds
    pub async fn speak(&self, utterance: &UtteranceOut) {
        tracing::info!(language = %utterance.language, text = %utterance.text, "assistant says");

        for provider in &self.providers {
            match provider.speak(&utterance.text, utterance.language).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "speech provider failed, falling back"
                    );
                }
            }
        }

        tracing::error!(text = %utterance.text, "no speech provider could speak");
    }

    /// Speak `text` in `language`
    pub async fn say(&self, text: impl Into<String>, language: Language) {
        self.speak(&UtteranceOut::new(text, language)).await;
    }
}

//! Error types for the Pasha assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the assistant and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// No speech started before the wait-for-start timeout
    #[error("listening timed out waiting for speech")]
    ListenTimeout,

    /// Speech was heard but could not be mapped to text
    #[error("speech could not be transcribed")]
    NoMatch,

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio playback error
    #[error("playback error: {0}")]
    Playback(String),

    /// Generative language backend error
    #[error("llm error: {0}")]
    Llm(String),

    /// Operating system action error (volume, launcher, browser)
    #[error("system error: {0}")]
    System(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

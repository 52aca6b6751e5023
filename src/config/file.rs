//! TOML configuration file loading
//!
//! Supports `~/.config/pasha/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct PashaConfigFile {
    /// Wake word and the assistant's spoken name (e.g. "pasha")
    pub assistant_name: Option<String>,

    /// How the assistant addresses the user (e.g. "sir")
    pub user_name: Option<String>,

    /// Starting language tag ("en-US" or "hi-IN")
    pub language: Option<String>,

    /// Microphone and segmentation settings
    #[serde(default)]
    pub listen: ListenFileConfig,

    /// Speech output settings
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Speech recognition settings
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Generative language backend settings
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Microphone configuration
#[derive(Debug, Default, Deserialize)]
pub struct ListenFileConfig {
    /// Ambient noise calibration window in milliseconds
    pub calibration_ms: Option<u64>,

    /// Seconds to wait for speech to start
    pub start_timeout_secs: Option<u64>,

    /// Maximum length of one utterance in seconds
    pub phrase_limit_secs: Option<u64>,

    /// Silence that ends an utterance, in milliseconds
    pub pause_ms: Option<u64>,

    /// Minimum RMS energy treated as speech
    pub energy_threshold: Option<f32>,

    /// Raise the threshold above measured ambient noise
    pub dynamic_energy: Option<bool>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Remote TTS provider ("google", "openai" or "none")
    pub tts_provider: Option<String>,

    /// `OpenAI` voice identifier
    pub openai_voice: Option<String>,

    /// Local engine speaking rate in words per minute
    pub local_rate: Option<u32>,

    /// Substrings used to pick a local voice
    pub local_voice_hints: Option<Vec<String>>,

    /// Remote audio player ("system" or "device")
    pub player: Option<String>,

    /// Transient file remote audio is written to
    pub audio_file: Option<PathBuf>,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Provider ("google", "whisper" or "deepgram")
    pub provider: Option<String>,

    /// Provider model override
    pub model: Option<String>,
}

/// Generative language configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Chat model identifier
    pub model: Option<String>,

    /// Maximum tokens per answer
    pub max_tokens: Option<u32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub google: Option<String>,
    pub deepgram: Option<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<PashaConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from `path`, or the standard path when `None`
///
/// Returns `PashaConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> PashaConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return PashaConfigFile::default();
    };

    if !path.exists() {
        return PashaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                PashaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            PashaConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/pasha/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("pasha").join("config.toml"))
}

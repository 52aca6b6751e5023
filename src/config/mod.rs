//! Configuration management for the Pasha assistant
//!
//! Values are resolved once at startup with the precedence
//! environment > TOML file > defaults.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use self::file::PashaConfigFile;
use crate::{Error, Language, Result};

/// Assistant configuration
#[derive(Debug)]
pub struct Config {
    /// Wake word, also the name the assistant announces itself with
    pub assistant_name: String,

    /// How the assistant addresses the user
    pub user_name: String,

    /// Language the session starts in
    pub language: Language,

    /// Microphone configuration
    pub listen: ListenConfig,

    /// Speech output configuration
    pub speech: SpeechConfig,

    /// Speech recognition configuration
    pub stt: SttConfig,

    /// Generative language configuration
    pub llm: LlmConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Microphone and utterance segmentation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ListenConfig {
    /// Ambient noise calibration window
    pub calibration: Duration,

    /// How long to wait for speech to start
    pub start_timeout: Duration,

    /// Maximum length of one utterance
    pub phrase_limit: Duration,

    /// Silence that ends an utterance
    pub pause: Duration,

    /// Minimum RMS energy treated as speech
    pub energy_threshold: f32,

    /// Raise the threshold above measured ambient noise
    pub dynamic_energy: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            calibration: Duration::from_millis(500),
            start_timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(10),
            pause: Duration::from_millis(800),
            energy_threshold: 0.03,
            dynamic_energy: true,
        }
    }
}

/// Remote text-to-speech provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProviderKind {
    /// Google Cloud Text-to-Speech
    Google,
    /// `OpenAI` speech endpoint
    OpenAi,
}

/// How remote audio is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerKind {
    /// Write the transient file and hand it to the platform player
    #[default]
    System,
    /// Decode in-process and play on the default output device
    Device,
}

/// Speech output configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Remote provider, `None` when no remote synthesis is configured
    pub tts_provider: Option<TtsProviderKind>,

    /// `OpenAI` voice identifier
    pub openai_voice: String,

    /// Local engine speaking rate in words per minute
    pub local_rate: u32,

    /// Lowercase substrings used to pick a local voice
    pub local_voice_hints: Vec<String>,

    /// Remote audio player
    pub player: PlayerKind,

    /// Transient file remote audio is written to
    pub audio_file: PathBuf,
}

/// Speech-to-text provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttProviderKind {
    /// Google Speech-to-Text
    Google,
    /// `OpenAI` Whisper
    Whisper,
    /// Deepgram
    Deepgram,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Provider, `None` when no recognizer credentials are available
    pub provider: Option<SttProviderKind>,

    /// Provider model override
    pub model: Option<String>,
}

/// Generative language configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat model identifier
    pub model: String,

    /// Maximum tokens per answer
    pub max_tokens: u32,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (chat, Whisper, speech)
    pub openai: Option<SecretString>,

    /// Google Cloud API key (Speech-to-Text, Text-to-Speech)
    pub google: Option<SecretString>,

    /// Deepgram API key
    pub deepgram: Option<SecretString>,
}

impl Config {
    /// Load configuration from `.env`, the config file and the process environment
    ///
    /// `config_path` overrides the standard config file location.
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }

        let env_path = std::env::var("PASHA_CONFIG").ok().map(PathBuf::from);
        let fc = file::load_config_file(config_path.or(env_path.as_deref()));

        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn resolve<F>(fc: PashaConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_keys = ApiKeys {
            openai: non_empty("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .map(SecretString::from),
            google: non_empty("GOOGLE_API_KEY")
                .or(fc.api_keys.google)
                .map(SecretString::from),
            deepgram: non_empty("DEEPGRAM_API_KEY")
                .or(fc.api_keys.deepgram)
                .map(SecretString::from),
        };

        let language = non_empty("PASHA_LANGUAGE")
            .or(fc.language)
            .map(|s| s.parse::<Language>())
            .transpose()?
            .unwrap_or_default();

        let defaults = ListenConfig::default();
        let listen = ListenConfig {
            calibration: fc
                .listen
                .calibration_ms
                .map_or(defaults.calibration, Duration::from_millis),
            start_timeout: fc
                .listen
                .start_timeout_secs
                .map_or(defaults.start_timeout, Duration::from_secs),
            phrase_limit: fc
                .listen
                .phrase_limit_secs
                .map_or(defaults.phrase_limit, Duration::from_secs),
            pause: fc.listen.pause_ms.map_or(defaults.pause, Duration::from_millis),
            energy_threshold: fc
                .listen
                .energy_threshold
                .unwrap_or(defaults.energy_threshold),
            dynamic_energy: fc.listen.dynamic_energy.unwrap_or(defaults.dynamic_energy),
        };

        let tts_provider = match non_empty("PASHA_TTS_PROVIDER").or(fc.speech.tts_provider) {
            Some(name) => parse_tts_provider(&name)?,
            None if api_keys.google.is_some() => Some(TtsProviderKind::Google),
            None if api_keys.openai.is_some() => Some(TtsProviderKind::OpenAi),
            None => None,
        };

        let player = match fc.speech.player.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("system") => PlayerKind::System,
            Some("device") => PlayerKind::Device,
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown player '{other}' (expected system or device)"
                )));
            }
        };

        let speech = SpeechConfig {
            tts_provider,
            openai_voice: fc.speech.openai_voice.unwrap_or_else(|| "onyx".to_string()),
            local_rate: fc.speech.local_rate.unwrap_or(180),
            local_voice_hints: fc
                .speech
                .local_voice_hints
                .unwrap_or_else(|| vec!["david".to_string(), "male".to_string()])
                .into_iter()
                .map(|h| h.to_lowercase())
                .collect(),
            player,
            audio_file: fc
                .speech
                .audio_file
                .unwrap_or_else(|| std::env::temp_dir().join("pasha-response.mp3")),
        };

        let stt_provider = match non_empty("PASHA_STT_PROVIDER").or(fc.stt.provider) {
            Some(name) => Some(parse_stt_provider(&name)?),
            None if api_keys.google.is_some() => Some(SttProviderKind::Google),
            None if api_keys.openai.is_some() => Some(SttProviderKind::Whisper),
            None if api_keys.deepgram.is_some() => Some(SttProviderKind::Deepgram),
            None => None,
        };

        let llm = LlmConfig {
            model: non_empty("PASHA_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            max_tokens: fc.llm.max_tokens.unwrap_or(100),
        };

        let config = Self {
            assistant_name: non_empty("PASHA_NAME")
                .or(fc.assistant_name)
                .unwrap_or_else(|| "pasha".to_string()),
            user_name: non_empty("PASHA_USER_NAME")
                .or(fc.user_name)
                .unwrap_or_else(|| "sir".to_string()),
            language,
            listen,
            speech,
            stt: SttConfig {
                provider: stt_provider,
                model: fc.stt.model,
            },
            llm,
            api_keys,
        };

        if config.api_keys.openai.is_none() {
            tracing::warn!("OpenAI API key not found, general questions are disabled");
        }
        if config.speech.tts_provider.is_none() {
            tracing::info!("no remote TTS configured, using the local voice");
        }

        Ok(config)
    }
}

fn parse_tts_provider(name: &str) -> Result<Option<TtsProviderKind>> {
    match name.trim().to_lowercase().as_str() {
        "google" => Ok(Some(TtsProviderKind::Google)),
        "openai" => Ok(Some(TtsProviderKind::OpenAi)),
        "none" | "local" => Ok(None),
        other => Err(Error::Config(format!("unknown TTS provider '{other}'"))),
    }
}

fn parse_stt_provider(name: &str) -> Result<SttProviderKind> {
    match name.trim().to_lowercase().as_str() {
        "google" => Ok(SttProviderKind::Google),
        "whisper" | "openai" => Ok(SttProviderKind::Whisper),
        "deepgram" => Ok(SttProviderKind::Deepgram),
        other => Err(Error::Config(format!("unknown STT provider '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn resolve_with(fc: PashaConfigFile, vars: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::resolve(fc, |key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = resolve_with(PashaConfigFile::default(), &[]).unwrap();

        assert_eq!(config.assistant_name, "pasha");
        assert_eq!(config.user_name, "sir");
        assert_eq!(config.language, Language::English);
        assert_eq!(config.listen, ListenConfig::default());
        assert_eq!(config.speech.tts_provider, None);
        assert_eq!(config.speech.local_rate, 180);
        assert_eq!(config.speech.local_voice_hints, vec!["david", "male"]);
        assert_eq!(config.stt.provider, None);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.max_tokens, 100);
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let fc = file::parse_config_file(
            r#"
            assistant_name = "jarvis"
            language = "en-US"
            [api_keys]
            openai = "from-file"
            "#,
        )
        .unwrap();

        let config = resolve_with(
            fc,
            &[("PASHA_LANGUAGE", "hi-IN"), ("OPENAI_API_KEY", "from-env")],
        )
        .unwrap();

        assert_eq!(config.assistant_name, "jarvis");
        assert_eq!(config.language, Language::Hindi);
        assert_eq!(
            config.api_keys.openai.as_ref().unwrap().expose_secret(),
            "from-env"
        );
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let config = resolve_with(PashaConfigFile::default(), &[("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn test_providers_follow_available_keys() {
        let config = resolve_with(PashaConfigFile::default(), &[("OPENAI_API_KEY", "k")]).unwrap();
        assert_eq!(config.speech.tts_provider, Some(TtsProviderKind::OpenAi));
        assert_eq!(config.stt.provider, Some(SttProviderKind::Whisper));

        let config = resolve_with(
            PashaConfigFile::default(),
            &[("OPENAI_API_KEY", "k"), ("GOOGLE_API_KEY", "g")],
        )
        .unwrap();
        assert_eq!(config.speech.tts_provider, Some(TtsProviderKind::Google));
        assert_eq!(config.stt.provider, Some(SttProviderKind::Google));
    }

    #[test]
    fn test_explicit_none_disables_remote_tts() {
        let config = resolve_with(
            PashaConfigFile::default(),
            &[("GOOGLE_API_KEY", "g"), ("PASHA_TTS_PROVIDER", "none")],
        )
        .unwrap();
        assert_eq!(config.speech.tts_provider, None);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(resolve_with(PashaConfigFile::default(), &[("PASHA_LANGUAGE", "de-DE")]).is_err());
        assert!(
            resolve_with(PashaConfigFile::default(), &[("PASHA_STT_PROVIDER", "vosk")]).is_err()
        );
    }
}

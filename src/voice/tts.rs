//! Remote text-to-speech (TTS) synthesis

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

use crate::config::TtsProviderKind;
use crate::{Error, Language, Result};

/// Preferred voice gender for remote synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceGender {
    #[default]
    Male,
    Female,
    Neutral,
}

impl VoiceGender {
    const fn ssml(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

/// Remote synthesizer producing MP3 audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Synthesize `text` spoken in `language`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, language: Language, gender: VoiceGender)
    -> Result<Vec<u8>>;
}

/// Response from Google Cloud Text-to-Speech
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSynthesizeResponse {
    audio_content: String,
}

/// Synthesizes speech from text over HTTP
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    provider: TtsProviderKind,
}

impl TextToSpeech {
    /// Create a new TTS instance using Google Cloud Text-to-Speech
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_google(api_key: Option<SecretString>) -> Result<Self> {
        Self::new(TtsProviderKind::Google, api_key, String::new())
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: Option<SecretString>, voice: String) -> Result<Self> {
        Self::new(TtsProviderKind::OpenAi, api_key, voice)
    }

    fn new(provider: TtsProviderKind, api_key: Option<SecretString>, voice: String) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| Error::Config(format!("API key required for {provider:?} TTS")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            provider,
        })
    }

    /// Synthesize using Google Cloud Text-to-Speech
    async fn synthesize_google(
        &self,
        text: &str,
        language: Language,
        gender: VoiceGender,
    ) -> Result<Vec<u8>> {
        let request = serde_json::json!({
            "input": { "text": text },
            "voice": {
                "languageCode": language.tag(),
                "ssmlGender": gender.ssml(),
            },
            "audioConfig": { "audioEncoding": "MP3" },
        });

        let response = self
            .client
            .post("https://texttospeech.googleapis.com/v1/text:synthesize")
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let result: GoogleSynthesizeResponse = response.json().await?;
        base64::engine::general_purpose::STANDARD
            .decode(result.audio_content)
            .map_err(|e| Error::Tts(format!("invalid audio content: {e}")))
    }

    /// Synthesize using `OpenAI` TTS
    ///
    /// `OpenAI` voices are multilingual, so the language is carried by the text.
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: "tts-1",
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    fn name(&self) -> &str {
        match self.provider {
            TtsProviderKind::Google => "google",
            TtsProviderKind::OpenAi => "openai",
        }
    }

    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        gender: VoiceGender,
    ) -> Result<Vec<u8>> {
        tracing::debug!(provider = self.name(), %language, ?gender, "synthesizing");
        match self.provider {
            TtsProviderKind::Google => self.synthesize_google(text, language, gender).await,
            TtsProviderKind::OpenAi => self.synthesize_openai(text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        assert!(matches!(
            TextToSpeech::new_google(None).err(),
            Some(Error::Config(_))
        ));
    }

    #[test]
    fn test_provider_names() {
        let key = || Some(SecretString::from("k".to_string()));
        assert_eq!(TextToSpeech::new_google(key()).unwrap().name(), "google");
        assert_eq!(
            TextToSpeech::new_openai(key(), "onyx".to_string()).unwrap().name(),
            "openai"
        );
    }

    #[test]
    fn test_google_response_parse() {
        let parsed: GoogleSynthesizeResponse =
            serde_json::from_str(r#"{"audioContent":"SUQz"}"#).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content)
            .unwrap();
        assert_eq!(bytes, b"ID3");
    }
}

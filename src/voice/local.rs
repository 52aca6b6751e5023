//! Local text-to-speech through the platform speech engine
//!
//! Always available fallback: `say` on macOS, `espeak-ng`/`espeak` on Linux,
//! and `System.Speech` through PowerShell on Windows. Playback blocks until
//! the engine exits.

use async_trait::async_trait;
use tokio::process::Command;

use super::output::SpeechProvider;
use crate::{Error, Language, Result};

/// Platform speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
enum Engine {
    /// macOS `say`
    Say,
    /// `espeak-ng` or `espeak` binary
    Espeak(String),
    /// Windows `System.Speech` via PowerShell
    PowerShell,
}

/// Local speech engine configured once at startup
#[derive(Debug, Clone)]
pub struct LocalSpeech {
    engine: Option<Engine>,
    rate: u32,
    voice: Option<String>,
}

impl LocalSpeech {
    /// Detect the platform engine and pick a voice matching `voice_hints`
    pub async fn detect(rate: u32, voice_hints: &[String]) -> Self {
        let engine = detect_engine();
        let voice = match engine {
            Some(Engine::Say) => {
                let voices = list_say_voices().await;
                pick_voice(&voices, voice_hints).map(ToString::to_string)
            }
            _ => None,
        };

        match &engine {
            Some(engine) => {
                tracing::info!(?engine, rate, voice = ?voice, "local speech engine ready");
            }
            None => tracing::warn!("no local speech engine found"),
        }

        Self {
            engine,
            rate,
            voice,
        }
    }

    /// Build the engine invocation for `text`
    fn command(&self, text: &str, language: Language) -> Result<Command> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| Error::Tts("no local speech engine available".to_string()))?;

        let command = match engine {
            Engine::Say => {
                let mut cmd = Command::new("say");
                cmd.arg("-r").arg(self.rate.to_string());
                if let Some(voice) = &self.voice {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg("--").arg(text);
                cmd
            }
            Engine::Espeak(program) => {
                let mut cmd = Command::new(program);
                // "+m3" selects a male variant of the language voice
                cmd.arg("-s")
                    .arg(self.rate.to_string())
                    .arg("-v")
                    .arg(format!("{}+m3", language.code()))
                    .arg("--")
                    .arg(text);
                cmd
            }
            Engine::PowerShell => {
                let script = format!(
                    "Add-Type -AssemblyName System.Speech; \
                     $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                     try {{ $s.SelectVoiceByHints('Male') }} catch {{}}; \
                     $s.Rate = {}; $s.Speak('{}')",
                    sapi_rate(self.rate),
                    text.replace('\'', "''")
                );
                let mut cmd = Command::new("powershell");
                cmd.arg("-NoProfile").arg("-Command").arg(script);
                cmd
            }
        };

        Ok(command)
    }
}

#[async_trait]
impl SpeechProvider for LocalSpeech {
    fn name(&self) -> &str {
        "local"
    }

    async fn speak(&self, text: &str, language: Language) -> Result<()> {
        let status = self.command(text, language)?.status().await?;
        if !status.success() {
            return Err(Error::Tts(format!("local speech engine exited with {status}")));
        }
        Ok(())
    }
}

fn detect_engine() -> Option<Engine> {
    if cfg!(target_os = "macos") {
        return Some(Engine::Say);
    }
    if cfg!(target_os = "windows") {
        return Some(Engine::PowerShell);
    }

    ["espeak-ng", "espeak"]
        .into_iter()
        .find(|program| which::which(program).is_ok())
        .map(|program| Engine::Espeak(program.to_string()))
}

/// List installed `say` voice names
async fn list_say_voices() -> Vec<String> {
    match Command::new("say").args(["-v", "?"]).output().await {
        Ok(output) => parse_say_voices(&String::from_utf8_lossy(&output.stdout)),
        Err(e) => {
            tracing::debug!(error = %e, "failed to list voices");
            Vec::new()
        }
    }
}

/// Parse `say -v ?` output: `Name    locale    # sample text`
fn parse_say_voices(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let before_comment = line.split('#').next()?.trim_end();
            // Voice names may contain single spaces, the locale is the last token
            let (name, _locale) = before_comment.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// First voice whose lowercase name contains any hint
#[must_use]
pub fn pick_voice<'a>(voices: &'a [String], hints: &[String]) -> Option<&'a str> {
    voices
        .iter()
        .find(|voice| {
            let lower = voice.to_lowercase();
            hints.iter().any(|hint| lower.contains(hint.as_str()))
        })
        .map(String::as_str)
}

/// Map words per minute to the SAPI rate scale (-10..=10, 0 is about 180 wpm)
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn sapi_rate(wpm: u32) -> i32 {
    ((wpm as i32 - 180) / 20).clamp(-10, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["david".to_string(), "male".to_string()]
    }

    #[test]
    fn test_pick_voice_by_hint() {
        let voices = vec![
            "Samantha".to_string(),
            "Microsoft David Desktop".to_string(),
            "Alex".to_string(),
        ];
        assert_eq!(pick_voice(&voices, &hints()), Some("Microsoft David Desktop"));
    }

    #[test]
    fn test_pick_voice_none_matching() {
        let voices = vec!["Samantha".to_string()];
        assert_eq!(pick_voice(&voices, &hints()), None);
    }

    #[test]
    fn test_parse_say_voices() {
        let listing = "Alex                en_US    # Most people recognize me by my voice.\n\
                       Bad News            en_US    # The light you see at the end of the tunnel.\n";
        assert_eq!(parse_say_voices(listing), vec!["Alex", "Bad News"]);
    }

    #[test]
    fn test_sapi_rate() {
        assert_eq!(sapi_rate(180), 0);
        assert_eq!(sapi_rate(400), 10);
        assert_eq!(sapi_rate(0), -9);
    }

    #[tokio::test]
    async fn test_missing_engine_is_error() {
        let local = LocalSpeech {
            engine: None,
            rate: 180,
            voice: None,
        };
        assert!(local.speak("hello", Language::English).await.is_err());
    }
}

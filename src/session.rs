//! Conversation session state

use crate::Language;

/// The single long-lived mutable entity of a conversation
///
/// Owns the active language. The wake word and the user's form of address
/// are fixed when the session is created.
#[derive(Debug, Clone)]
pub struct Session {
    language: Language,
    wake_word: String,
    user_name: String,
}

impl Session {
    /// Create a new session
    ///
    /// The wake word is normalized to lowercase so it can be compared against
    /// recognizer output directly.
    #[must_use]
    pub fn new(language: Language, wake_word: &str, user_name: &str) -> Self {
        Self {
            language,
            wake_word: wake_word.trim().to_lowercase(),
            user_name: user_name.trim().to_string(),
        }
    }

    /// Currently active language
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Make `language` the active language
    pub fn switch_to(&mut self, language: Language) {
        if self.language != language {
            tracing::info!(from = %self.language, to = %language, "language switched");
        }
        self.language = language;
    }

    /// Lowercase wake word
    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    /// How the assistant addresses the user
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Extract the command that follows the wake word
    ///
    /// Returns `None` when the transcript does not contain the wake word.
    /// Every occurrence of the wake word is removed and the remainder trimmed,
    /// so `Some("")` means the user only said the wake word.
    #[must_use]
    pub fn extract_command(&self, transcript: &str) -> Option<String> {
        let lower = transcript.to_lowercase();
        if self.wake_word.is_empty() || !lower.contains(&self.wake_word) {
            return None;
        }

        let command = lower
            .replace(&self.wake_word, "")
            .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
            .to_string();
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Language::English, "Pasha", "sir")
    }

    #[test]
    fn test_extract_command() {
        let s = session();
        assert_eq!(
            s.extract_command("pasha what time is it").as_deref(),
            Some("what time is it")
        );
        assert_eq!(
            s.extract_command("Pasha, open github.com").as_deref(),
            Some("open github.com")
        );
        assert_eq!(s.extract_command("pasha").as_deref(), Some(""));
        assert_eq!(s.extract_command("what time is it"), None);
    }

    #[test]
    fn test_extract_command_removes_every_occurrence() {
        let s = session();
        assert_eq!(
            s.extract_command("tell me a joke pasha").as_deref(),
            Some("tell me a joke")
        );
    }

    #[test]
    fn test_switch_to() {
        let mut s = session();
        s.switch_to(Language::Hindi);
        assert_eq!(s.language(), Language::Hindi);
        s.switch_to(Language::Hindi);
        assert_eq!(s.language(), Language::Hindi);
    }
}

//! Command classification
//!
//! A command is first checked for a language switch phrase, then against the
//! active language's rule table in order. The first matching rule wins and
//! anything unmatched becomes an open question.

mod rules;

pub use rules::{
    IntentKind, IntentRule, Matcher, english_rules, hindi_rules, requested_language,
};

use crate::Language;

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Time,
    Date,
    /// Encyclopedia summary of `topic`
    Knowledge { topic: String },
    /// Website or application to open
    Open { target: String },
    /// Requested volume percentage, `None` when no number was given
    SetVolume { level: Option<u32> },
    Joke,
    Thanks,
    Farewell,
    /// Anything else, forwarded verbatim to the language model
    Question { text: String },
}

/// Outcome of classifying one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Change the session language; no other handling
    SwitchLanguage(Language),
    Intent(Intent),
}

/// Per-language ordered rule tables
#[derive(Debug)]
pub struct IntentRouter {
    english: Vec<IntentRule>,
    hindi: Vec<IntentRule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            english: english_rules(),
            hindi: hindi_rules(),
        }
    }

    /// Rule table for `language`, in evaluation order
    #[must_use]
    pub fn rules(&self, language: Language) -> &[IntentRule] {
        match language {
            Language::English => &self.english,
            Language::Hindi => &self.hindi,
        }
    }

    /// Classify a wake-word-stripped, lowercase command
    #[must_use]
    pub fn classify(&self, command: &str, language: Language) -> Route {
        if let Some(target) = requested_language(command) {
            return Route::SwitchLanguage(target);
        }

        let intent = self
            .rules(language)
            .iter()
            .find_map(|rule| rule.apply(command))
            .unwrap_or_else(|| Intent::Question {
                text: command.to_string(),
            });

        tracing::debug!(%language, ?intent, "command classified");
        Route::Intent(intent)
    }
}

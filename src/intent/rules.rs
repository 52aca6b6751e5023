//! Ordered intent rule tables, one per language

use std::sync::LazyLock;

use regex::Regex;

use super::Intent;
use crate::Language;

/// "open <target>"
static OPEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bopen\s+(.+)").expect("valid regex"));

/// First run of digits anywhere in a command
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Phrases asking for a volume change; the level may sit anywhere
const VOLUME_PHRASES: &[&str] = &["volume to", "set volume"];

/// Phrases that switch the conversation language, checked in order
const LANGUAGE_SWITCHES: &[(&str, Language)] = &[
    ("switch to hindi", Language::Hindi),
    ("हिंदी में बोलो", Language::Hindi),
    ("switch to english", Language::English),
    ("अंग्रेजी में बोलो", Language::English),
];

/// Intent a rule produces when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Greeting,
    Time,
    Date,
    Knowledge,
    Open,
    SetVolume,
    Joke,
    Thanks,
    Farewell,
}

/// How a rule tests a command
#[derive(Debug)]
pub enum Matcher {
    /// Any of the phrases occurs as a substring; the argument is the command
    /// with the phrases removed
    Contains(&'static [&'static str]),
    /// Any of the words occurs as a whole word
    AnyWord(&'static [&'static str]),
    /// The pattern matches; the argument is the first capture group
    Pattern(&'static LazyLock<Regex>),
}

impl Matcher {
    /// Test `text`, returning the extracted argument on a match
    ///
    /// The outer `Option` is the match, the inner one the argument.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<Option<String>> {
        match self {
            Self::Contains(phrases) => {
                if !phrases.iter().any(|p| text.contains(p)) {
                    return None;
                }
                let rest = phrases
                    .iter()
                    .fold(text.to_string(), |acc, p| acc.replace(p, " "));
                Some(non_empty(&rest))
            }
            Self::AnyWord(words) => text
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| words.contains(&token))
                .then_some(None),
            Self::Pattern(pattern) => pattern
                .captures(text)
                .map(|caps| caps.get(1).and_then(|m| non_empty(m.as_str()))),
        }
    }
}

/// Collapse whitespace, `None` when nothing is left
fn non_empty(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// First integer in `text`, saturating at `u32::MAX`
fn first_number(text: &str) -> Option<u32> {
    NUMBER_PATTERN
        .find(text)
        .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
}

/// One entry of a rule table
#[derive(Debug)]
pub struct IntentRule {
    pub kind: IntentKind,
    pub matcher: Matcher,
}

impl IntentRule {
    const fn new(kind: IntentKind, matcher: Matcher) -> Self {
        Self { kind, matcher }
    }

    /// Build the intent for `text` if this rule matches it
    #[must_use]
    pub fn apply(&self, text: &str) -> Option<Intent> {
        let argument = self.matcher.find(text)?;

        let intent = match self.kind {
            IntentKind::Greeting => Intent::Greeting,
            IntentKind::Time => Intent::Time,
            IntentKind::Date => Intent::Date,
            IntentKind::Knowledge => Intent::Knowledge {
                topic: argument.unwrap_or_default(),
            },
            IntentKind::Open => Intent::Open {
                target: argument.unwrap_or_default(),
            },
            IntentKind::SetVolume => Intent::SetVolume {
                level: first_number(text),
            },
            IntentKind::Joke => Intent::Joke,
            IntentKind::Thanks => Intent::Thanks,
            IntentKind::Farewell => Intent::Farewell,
        };

        Some(intent)
    }
}

/// English rules in evaluation order
#[must_use]
pub fn english_rules() -> Vec<IntentRule> {
    use IntentKind::{Date, Farewell, Greeting, Joke, Knowledge, Open, SetVolume, Time};

    vec![
        IntentRule::new(Greeting, Matcher::AnyWord(&["hello", "hi"])),
        IntentRule::new(Time, Matcher::Contains(&["time"])),
        IntentRule::new(Date, Matcher::Contains(&["date"])),
        IntentRule::new(Knowledge, Matcher::Contains(&["wikipedia"])),
        IntentRule::new(Open, Matcher::Pattern(&OPEN_PATTERN)),
        IntentRule::new(SetVolume, Matcher::Contains(VOLUME_PHRASES)),
        IntentRule::new(Joke, Matcher::Contains(&["joke"])),
        IntentRule::new(Farewell, Matcher::Contains(&["goodbye", "shut down", "exit"])),
    ]
}

/// Hindi rules in evaluation order
///
/// Opening applications and telling jokes are not available in Hindi; the
/// handlers answer those intents with an apology.
#[must_use]
pub fn hindi_rules() -> Vec<IntentRule> {
    use IntentKind::{Date, Farewell, Greeting, Joke, Knowledge, Open, Thanks, Time};

    vec![
        IntentRule::new(Greeting, Matcher::Contains(&["नमस्ते", "हेलो"])),
        IntentRule::new(Time, Matcher::Contains(&["समय"])),
        IntentRule::new(Date, Matcher::Contains(&["तारीख"])),
        IntentRule::new(Knowledge, Matcher::Contains(&["विकिपीडिया"])),
        IntentRule::new(Open, Matcher::Contains(&["खोलो", "खोल दो"])),
        IntentRule::new(Joke, Matcher::Contains(&["मजाक", "चुटकुला"])),
        IntentRule::new(Thanks, Matcher::Contains(&["धन्यवाद"])),
        IntentRule::new(Farewell, Matcher::Contains(&["अलविदा", "बंद करो"])),
    ]
}

/// Language requested by a switch phrase in `text`, if any
#[must_use]
pub fn requested_language(text: &str) -> Option<Language> {
    LANGUAGE_SWITCHES
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, language)| *language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_extracts_remainder() {
        let m = Matcher::Contains(&["wikipedia"]);
        assert_eq!(
            m.find("search wikipedia for  rust"),
            Some(Some("search for rust".to_string()))
        );
        assert_eq!(m.find("wikipedia"), Some(None));
        assert_eq!(m.find("encyclopedia"), None);
    }

    #[test]
    fn test_any_word_needs_whole_word() {
        let m = Matcher::AnyWord(&["hello", "hi"]);
        assert_eq!(m.find("hi there"), Some(None));
        assert_eq!(m.find("well, hello!"), Some(None));
        assert_eq!(m.find("what is this"), None);
    }

    #[test]
    fn test_open_pattern() {
        let m = Matcher::Pattern(&OPEN_PATTERN);
        assert_eq!(m.find("open github.com"), Some(Some("github.com".to_string())));
        assert_eq!(
            m.find("please open vs code"),
            Some(Some("vs code".to_string()))
        );
        assert_eq!(m.find("reopen the door"), None);
        assert_eq!(m.find("open"), None);
    }

    #[test]
    fn test_volume_pattern_level_is_optional() {
        let rule = IntentRule::new(IntentKind::SetVolume, Matcher::Contains(VOLUME_PHRASES));
        assert_eq!(
            rule.apply("set volume to 30"),
            Some(Intent::SetVolume { level: Some(30) })
        );
        assert_eq!(
            rule.apply("turn the volume to 75 please"),
            Some(Intent::SetVolume { level: Some(75) })
        );
        assert_eq!(
            rule.apply("set volume"),
            Some(Intent::SetVolume { level: None })
        );
        assert_eq!(
            rule.apply("50 percent, set volume"),
            Some(Intent::SetVolume { level: Some(50) })
        );
        assert_eq!(
            rule.apply("set volume to 99999999999"),
            Some(Intent::SetVolume {
                level: Some(u32::MAX)
            })
        );
        assert_eq!(rule.apply("volume up"), None);
    }

    #[test]
    fn test_hindi_open_target() {
        let rule = IntentRule::new(IntentKind::Open, Matcher::Contains(&["खोलो", "खोल दो"]));
        assert_eq!(
            rule.apply("youtube.com खोल दो"),
            Some(Intent::Open {
                target: "youtube.com".to_string()
            })
        );
    }

    #[test]
    fn test_requested_language() {
        assert_eq!(requested_language("switch to hindi"), Some(Language::Hindi));
        assert_eq!(requested_language("हिंदी में बोलो"), Some(Language::Hindi));
        assert_eq!(
            requested_language("अब अंग्रेजी में बोलो"),
            Some(Language::English)
        );
        assert_eq!(requested_language("what time is it"), None);
    }
}

//! Supported conversation languages
//!
//! The assistant speaks exactly two languages. Everything that needs a
//! language takes a [`Language`], so a third value cannot be represented.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// One of the two supported conversation languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// English (United States)
    #[default]
    English,
    /// Hindi (India)
    Hindi,
}

impl Language {
    /// Both supported languages, in preference order
    pub const ALL: [Self; 2] = [Self::English, Self::Hindi];

    /// BCP-47 tag used by recognizers and synthesizers
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Hindi => "hi-IN",
        }
    }

    /// ISO-639-1 code for backends that take a bare language
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
        }
    }

    /// The other supported language
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::English => Self::Hindi,
            Self::Hindi => Self::English,
        }
    }

    /// Recognition attempt order: this language first, then the other one
    #[must_use]
    pub const fn fallback_order(self) -> [Self; 2] {
        [self, self.other()]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" | "english" => Ok(Self::English),
            "hi-in" | "hi" | "hindi" => Ok(Self::Hindi),
            other => Err(Error::Config(format!(
                "unsupported language '{other}' (expected en-US or hi-IN)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(Language::English.tag(), "en-US");
        assert_eq!(Language::Hindi.tag(), "hi-IN");
        assert_eq!(Language::Hindi.code(), "hi");
    }

    #[test]
    fn test_other_is_involution() {
        for lang in Language::ALL {
            assert_ne!(lang.other(), lang);
            assert_eq!(lang.other().other(), lang);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("en-US".parse::<Language>().unwrap(), Language::English);
        assert_eq!("hi_IN".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!(" Hindi ".parse::<Language>().unwrap(), Language::Hindi);
        assert!("fr-FR".parse::<Language>().is_err());
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(
            Language::Hindi.fallback_order(),
            [Language::Hindi, Language::English]
        );
    }
}

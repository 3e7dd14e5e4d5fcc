use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const TONE: &str = "Be informal & concise.";

/// The language the assistant must answer in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Chinese.
    Zh,
    /// English.
    #[default]
    En,
}

impl Language {
    /// Returns the system prompt for this language.
    pub fn system_prompt(&self) -> String {
        let mandate = match self {
            Language::Zh => "必须使用中文回复.",
            Language::En => "You must speak English to respond.",
        };
        format!("{mandate} {TONE}")
    }

    /// Returns the language code.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unsupported [`Language`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseLanguageError(String);

impl Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language: {:?}, expected zh or en", self.0)
    }
}

impl StdError for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zh" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            _ => Err(ParseLanguageError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt() {
        assert_eq!(
            Language::Zh.system_prompt(),
            "必须使用中文回复. Be informal & concise."
        );
        assert_eq!(
            Language::En.system_prompt(),
            "You must speak English to respond. Be informal & concise."
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }
}

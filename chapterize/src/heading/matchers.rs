//! Number/title separation for heading text
//!
//! Each pattern family is an independent matcher. They are tried in a fixed
//! priority order and the first success wins, so a letter scheme such as
//! `A.1` is never taken apart by the generic numeric matcher.

use regex::Regex;
use serde::Serialize;

/// Separator characters allowed between a number and its title
const SEPARATORS: &str = r"[\s.:)\-–—]+";

/// Which pattern family recognized the number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberScheme {
    /// `Приложение Б`, `Appendix C`
    Appendix,
    /// `Б.1`, `A.1.2`
    LetterDotted,
    /// `1.2.3`, `(2.1)`
    Numeric,
    /// No number in the text
    None,
}

impl NumberScheme {
    /// Whether the number is spelled with a letter, as appendices are
    pub fn is_lettered(self) -> bool {
        matches!(self, NumberScheme::Appendix | NumberScheme::LetterDotted)
    }
}

/// Heading text split into its number token and clean title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberSplit {
    /// Number as written, without brackets or trailing punctuation
    pub token: String,
    /// Text after the number, whitespace collapsed
    pub title: String,
    pub scheme: NumberScheme,
}

impl NumberSplit {
    fn unnumbered(text: &str) -> Self {
        Self {
            token: String::new(),
            title: text.to_string(),
            scheme: NumberScheme::None,
        }
    }
}

/// One pattern family
pub trait NumberMatcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Split `text` (whitespace already collapsed) if this family matches
    fn split(&self, text: &str) -> Option<NumberSplit>;
}

/// Shared capture handling: `token` and optional `title` groups
fn capture(regex: &Regex, text: &str, scheme: NumberScheme) -> Option<NumberSplit> {
    let caps = regex.captures(text)?;
    let token = caps.name("token")?.as_str().trim().to_string();
    let title = caps
        .name("title")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Some(NumberSplit {
        token,
        title,
        scheme,
    })
}

/// Appendix word followed by a single letter: `Приложение Б. Протоколы`
pub struct AppendixMatcher {
    /// `None` when no appendix words are configured
    regex: Option<Regex>,
}

impl AppendixMatcher {
    /// Build the matcher for the given appendix words (matched case-insensitively)
    pub fn new(words: &[String]) -> Result<Self, regex::Error> {
        let words: Vec<String> = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        if words.is_empty() {
            return Ok(Self { regex: None });
        }

        let pattern = format!(
            r"(?i)^\s*(?P<token>(?:{})\s+\p{{L}})(?:{}(?P<title>.*))?$",
            words.join("|"),
            SEPARATORS
        );
        Ok(Self {
            regex: Some(Regex::new(&pattern)?),
        })
    }
}

impl NumberMatcher for AppendixMatcher {
    fn name(&self) -> &'static str {
        "appendix"
    }

    fn split(&self, text: &str) -> Option<NumberSplit> {
        let regex = self.regex.as_ref()?;
        let mut split = capture(regex, text, NumberScheme::Appendix)?;
        // "Приложение   Б" keeps a single space between word and letter
        split.token = collapse_whitespace(&split.token);
        Some(split)
    }
}

/// Single letter, dot, dotted digits: `Б.1 Протоколы`, `A.1.2 Setup`
pub struct LetterDotMatcher {
    regex: Regex,
}

impl LetterDotMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        let pattern = format!(
            r"(?i)^\s*(?P<token>\p{{L}}\.\d+(?:\.\d+)*)(?:{}(?P<title>.*))?$",
            SEPARATORS
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl NumberMatcher for LetterDotMatcher {
    fn name(&self) -> &'static str {
        "letter-dotted"
    }

    fn split(&self, text: &str) -> Option<NumberSplit> {
        capture(&self.regex, text, NumberScheme::LetterDotted)
    }
}

/// Dotted or dashed integers, optionally bracketed: `1.2.3`, `(2.1) -`
pub struct NumericMatcher {
    regex: Regex,
}

impl NumericMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        let pattern = format!(
            r"^\s*[(\[]?(?P<token>\d+(?:[.\-]\d+)*)[)\]]?(?:{}(?P<title>.*))?$",
            SEPARATORS
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }
}

impl NumberMatcher for NumericMatcher {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn split(&self, text: &str) -> Option<NumberSplit> {
        capture(&self.regex, text, NumberScheme::Numeric)
    }
}

/// The matchers in priority order: appendix, letter-dotted, numeric
pub fn default_matchers(
    appendix_words: &[String],
) -> Result<Vec<Box<dyn NumberMatcher>>, regex::Error> {
    Ok(vec![
        Box::new(AppendixMatcher::new(appendix_words)?),
        Box::new(LetterDotMatcher::new()?),
        Box::new(NumericMatcher::new()?),
    ])
}

/// Collapse every run of whitespace into a single space and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split heading text with the first matching family
///
/// Text without a recognizable number yields an empty token and the
/// whole (whitespace-collapsed) text as title.
pub fn split_number(matchers: &[Box<dyn NumberMatcher>], text: &str) -> NumberSplit {
    let text = collapse_whitespace(text);
    for matcher in matchers {
        if let Some(split) = matcher.split(&text) {
            log::debug!(
                "'{}' matched {} as '{}' + '{}'",
                text,
                matcher.name(),
                split.token,
                split.title
            );
            return split;
        }
    }
    NumberSplit::unnumbered(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matchers() -> Vec<Box<dyn NumberMatcher>> {
        default_matchers(&["Приложение".to_string(), "Appendix".to_string()]).unwrap()
    }

    fn split(text: &str) -> (String, String, NumberScheme) {
        let s = split_number(&matchers(), text);
        (s.token, s.title, s.scheme)
    }

    #[test]
    fn test_appendix_family() {
        assert_eq!(
            split("Приложение Б. Протоколы"),
            ("Приложение Б".into(), "Протоколы".into(), NumberScheme::Appendix)
        );
        assert_eq!(
            split("Appendix C Implementation"),
            ("Appendix C".into(), "Implementation".into(), NumberScheme::Appendix)
        );
        assert_eq!(
            split("ПРИЛОЖЕНИЕ  А —  Конфигурация"),
            ("ПРИЛОЖЕНИЕ А".into(), "Конфигурация".into(), NumberScheme::Appendix)
        );
        assert_eq!(
            split("Приложение В"),
            ("Приложение В".into(), String::new(), NumberScheme::Appendix)
        );
    }

    #[test]
    fn test_appendix_word_needs_single_letter() {
        let (token, title, scheme) = split("Appendix Configuration");
        assert_eq!(token, "");
        assert_eq!(title, "Appendix Configuration");
        assert_eq!(scheme, NumberScheme::None);
    }

    #[test]
    fn test_letter_dotted_family() {
        assert_eq!(
            split("Б.1 Протоколы"),
            ("Б.1".into(), "Протоколы".into(), NumberScheme::LetterDotted)
        );
        assert_eq!(
            split("A.1.2. Configuration"),
            ("A.1.2".into(), "Configuration".into(), NumberScheme::LetterDotted)
        );
    }

    #[test]
    fn test_letter_scheme_wins_over_numeric() {
        let (token, _, scheme) = split("A.1 Сервер");
        assert_eq!(token, "A.1");
        assert_eq!(scheme, NumberScheme::LetterDotted);
    }

    #[test]
    fn test_numeric_family() {
        assert_eq!(
            split("1.2.3 Introduction"),
            ("1.2.3".into(), "Introduction".into(), NumberScheme::Numeric)
        );
        assert_eq!(split("3.4.3 — Функции").1, "Функции");
        assert_eq!(split("1) Введение").0, "1");
        assert_eq!(split("1) Введение").1, "Введение");
        assert_eq!(
            split("(2.1) - Описание"),
            ("2.1".into(), "Описание".into(), NumberScheme::Numeric)
        );
        assert_eq!(split("[4] Итоги").0, "4");
        assert_eq!(split("3.7:Настройка").1, "Настройка");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(
            split("  2.1\t\t Общие \n положения "),
            ("2.1".into(), "Общие положения".into(), NumberScheme::Numeric)
        );
    }

    #[test]
    fn test_numberless_heading() {
        assert_eq!(
            split("Общие положения"),
            (String::new(), "Общие положения".into(), NumberScheme::None)
        );
        assert_eq!(split("Рис.1 Схема").2, NumberScheme::None);
    }

    #[test]
    fn test_matchers_in_isolation() {
        assert!(NumericMatcher::new().unwrap().split("Б.1 Протоколы").is_none());
        assert!(LetterDotMatcher::new().unwrap().split("1.2 Title").is_none());
        assert!(AppendixMatcher::new(&[]).unwrap().split("Appendix A").is_none());
    }
}

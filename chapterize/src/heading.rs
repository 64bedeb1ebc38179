//! Heading recognition: depth, number token and clean title
//!
//! A paragraph is a heading when it carries an outline level or its style
//! resolves to a heading style. Its text is then split into the number as
//! written and the title that remains.

mod matchers;
mod style;

pub use matchers::{
    collapse_whitespace, default_matchers, split_number, AppendixMatcher, LetterDotMatcher,
    NumberMatcher, NumberScheme, NumberSplit, NumericMatcher,
};
pub use style::{StyleInfo, StylePatterns, StyleSheet};

use crate::config::{ConfigError, HeadingConfig, MAX_HEADING_DEPTH};
use crate::numbering::NumberingRef;
use std::collections::HashSet;

/// Word's outline level for body text
const BODY_TEXT_OUTLINE_LEVEL: u8 = 9;

/// One recognized heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    /// Canonical depth, 1..=6
    pub depth: usize,
    /// Number as found in the text, empty when there is none
    pub raw_number_token: String,
    /// Text with the number removed
    pub title: String,
    /// Pattern family that produced `raw_number_token`
    pub scheme: NumberScheme,
    /// Numbering instance bound to the paragraph, if any
    pub numbering: Option<NumberingRef>,
    pub style_id: String,
    /// The title repeated the number token, which was removed a second time
    pub double_numbered: bool,
}

impl HeadingRecord {
    /// Attach the paragraph's numbering binding
    pub fn with_numbering(mut self, numbering: Option<NumberingRef>) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn has_explicit_number(&self) -> bool {
        !self.raw_number_token.is_empty()
    }
}

/// Maps paragraphs to heading records
pub struct HeadingClassifier {
    styles: StyleSheet,
    patterns: StylePatterns,
    matchers: Vec<Box<dyn NumberMatcher>>,
    service_titles: HashSet<String>,
}

impl HeadingClassifier {
    /// Build a classifier from heading configuration and the document's styles
    ///
    /// # Parameters
    /// * `config` - Heading recognition settings
    /// * `styles` - Paragraph styles of the document being converted
    ///
    /// # Returns
    /// * `Ok(HeadingClassifier)` - All patterns compiled
    /// * `Err(ConfigError)` - A configured pattern is not a valid regex
    pub fn new(config: &HeadingConfig, styles: StyleSheet) -> Result<Self, ConfigError> {
        let patterns = StylePatterns::new(&config.style_patterns, &config.fixed_styles)?;
        let matchers = default_matchers(&config.appendix_words).map_err(|source| {
            ConfigError::PatternError {
                pattern: config.appendix_words.join("|"),
                source,
            }
        })?;
        let service_titles = config
            .service_titles
            .iter()
            .map(|t| normalize_service_title(t))
            .collect();

        Ok(Self {
            styles,
            patterns,
            matchers,
            service_titles,
        })
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Depth implied by a style's display name, or by its id
    pub fn style_depth(&self, style_id: &str) -> Option<usize> {
        self.styles
            .name_of(style_id)
            .and_then(|name| self.patterns.depth_of(name))
            .or_else(|| self.patterns.depth_of(style_id))
    }

    /// Classify one paragraph
    ///
    /// Depth comes from the outline hint when one is present, otherwise from
    /// the style. Returns `None` for body paragraphs, empty headings and
    /// service headings such as a table of contents.
    pub fn classify(
        &self,
        style_id: &str,
        outline_hint: Option<u8>,
        raw_text: &str,
    ) -> Option<HeadingRecord> {
        let depth = outline_hint
            .and_then(depth_from_outline)
            .or_else(|| self.style_depth(style_id))?;

        if raw_text.trim().is_empty() {
            log::debug!("Empty heading paragraph with style '{}' skipped", style_id);
            return None;
        }

        let split = split_number(&self.matchers, raw_text);
        if split.token.is_empty() && self.is_service_title(&split.title) {
            log::debug!("Service heading '{}' treated as content", split.title);
            return None;
        }

        let (title, double_numbered) = self.strip_repeated_token(&split);

        Some(HeadingRecord {
            depth,
            raw_number_token: split.token,
            title,
            scheme: split.scheme,
            numbering: None,
            style_id: style_id.to_string(),
            double_numbered,
        })
    }

    fn is_service_title(&self, title: &str) -> bool {
        self.service_titles.contains(&normalize_service_title(title))
    }

    /// "1.1 1.1 Title" keeps only "Title"
    fn strip_repeated_token(&self, split: &NumberSplit) -> (String, bool) {
        if split.token.is_empty() {
            return (split.title.clone(), false);
        }
        let again = split_number(&self.matchers, &split.title);
        if again.token == split.token {
            (again.title, true)
        } else {
            (split.title.clone(), false)
        }
    }
}

/// 0-based outline level to 1-based depth; body text is not a heading
fn depth_from_outline(level: u8) -> Option<usize> {
    if level >= BODY_TEXT_OUTLINE_LEVEL {
        return None;
    }
    Some((level as usize + 1).min(MAX_HEADING_DEPTH))
}

fn normalize_service_title(title: &str) -> String {
    collapse_whitespace(title)
        .trim_end_matches([':', '.'])
        .to_lowercase()
}

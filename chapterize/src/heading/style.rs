//! Paragraph styles and heading-style recognition

use crate::config::{ConfigError, FixedStyle, MAX_HEADING_DEPTH};
use crate::numbering::NumberingRef;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// `basedOn` chains longer than this are treated as cyclic
const MAX_STYLE_CHAIN: usize = 16;

/// What the document says about one paragraph style
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleInfo {
    /// Display name (`w:name`)
    pub name: Option<String>,
    /// Outline level declared on the style (0-based)
    pub outline_level: Option<u8>,
    /// Numbering the style attaches to its paragraphs
    pub numbering: Option<NumberingRef>,
    /// Parent style id (`w:basedOn`)
    pub based_on: Option<String>,
}

/// Paragraph styles keyed by style id
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, StyleInfo>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a style
    pub fn insert(&mut self, style_id: impl Into<String>, info: StyleInfo) {
        self.styles.insert(style_id.into(), info);
    }

    pub fn get(&self, style_id: &str) -> Option<&StyleInfo> {
        self.styles.get(style_id)
    }

    /// Display name of a style, if declared
    pub fn name_of(&self, style_id: &str) -> Option<&str> {
        self.get(style_id).and_then(|s| s.name.as_deref())
    }

    /// Walk a style and its `basedOn` ancestors, nearest first
    fn chain<'a>(&'a self, style_id: &'a str) -> impl Iterator<Item = &'a StyleInfo> + 'a {
        let mut next = Some(style_id);
        std::iter::from_fn(move || {
            let info = self.get(next?)?;
            next = info.based_on.as_deref();
            Some(info)
        })
        .take(MAX_STYLE_CHAIN)
    }

    /// Outline level declared on the style or inherited through `basedOn`
    pub fn outline_level(&self, style_id: &str) -> Option<u8> {
        self.chain(style_id).find_map(|s| s.outline_level)
    }

    /// Numbering declared on the style or inherited through `basedOn`
    pub fn numbering<'a>(&'a self, style_id: &'a str) -> Option<&'a NumberingRef> {
        self.chain(style_id).find_map(|s| s.numbering.as_ref())
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Recognizes heading styles by name or id
#[derive(Debug, Clone)]
pub struct StylePatterns {
    patterns: Vec<Regex>,
    fixed: HashMap<String, usize>,
}

impl StylePatterns {
    /// Compile the configured patterns (case-insensitive)
    pub fn new(patterns: &[String], fixed_styles: &[FixedStyle]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::PatternError {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fixed = fixed_styles
            .iter()
            .map(|f| (f.name.to_lowercase(), f.depth))
            .collect();

        Ok(Self { patterns, fixed })
    }

    /// Heading depth encoded in a style name or id, clamped to 1..=6
    pub fn depth_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        if let Some(&depth) = self.fixed.get(&name.to_lowercase()) {
            return Some(depth);
        }

        self.patterns.iter().find_map(|re| {
            let level = re.captures(name)?.get(1)?.as_str().parse::<usize>().ok()?;
            (level >= 1).then(|| level.min(MAX_HEADING_DEPTH))
        })
    }
}

//! Counter state machine reproducing the visible heading numbers

use super::catalog::{
    default_template, NumberingCatalog, NumberingDefinition, RestartPolicy, MAX_LEVELS,
};
use super::format::NumberFormat;
use std::collections::HashMap;

/// Which counter a heading advances
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumberingKey {
    /// A numbering instance bound to the paragraph
    Instance(String),
    /// Document-wide counter for headings with no numbering definition
    Fallback,
}

impl NumberingKey {
    /// Key for a numbering instance id
    pub fn instance(id: impl Into<String>) -> Self {
        NumberingKey::Instance(id.into())
    }
}

/// A paragraph's binding to a numbering instance (`w:numPr`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberingRef {
    /// Instance id (`w:numId`)
    pub numbering_id: String,
    /// 0-based level within the template (`w:ilvl`)
    pub depth: usize,
}

impl NumberingRef {
    pub fn new(numbering_id: impl Into<String>, depth: usize) -> Self {
        Self {
            numbering_id: numbering_id.into(),
            depth,
        }
    }

    /// Counter key this binding advances
    pub fn key(&self) -> NumberingKey {
        NumberingKey::Instance(self.numbering_id.clone())
    }
}

/// Current counts of one numbering key; `None` means "restarted, not used yet"
type Counts = [Option<u32>; MAX_LEVELS];

/// Mutable counters of one document conversion
///
/// A fresh state is required per document; it is never shared.
#[derive(Debug, Clone, Default)]
pub struct CounterState {
    counters: HashMap<NumberingKey, Counts>,
}

impl CounterState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key has been advanced at least once
    pub fn has_seen(&self, key: &NumberingKey) -> bool {
        self.counters.contains_key(key)
    }
}

/// Produces the next number for a (numbering, depth) pair
#[derive(Debug)]
pub struct CounterEngine<'c> {
    catalog: &'c NumberingCatalog,
    state: CounterState,
}

impl<'c> CounterEngine<'c> {
    /// Create an engine with fresh counters over `catalog`
    pub fn new(catalog: &'c NumberingCatalog) -> Self {
        Self {
            catalog,
            state: CounterState::new(),
        }
    }

    /// The counters accumulated so far
    pub fn state(&self) -> &CounterState {
        &self.state
    }

    fn definition(&self, key: &NumberingKey) -> Option<&'c NumberingDefinition> {
        match key {
            NumberingKey::Instance(id) => self.catalog.lookup(id),
            NumberingKey::Fallback => None,
        }
    }

    /// Advance the counter at `depth` and return its new value
    ///
    /// Deeper counters restart according to their restart policy (by default
    /// every deeper level restarts, whether or not it was used). A level
    /// that restarted issues its configured start value next.
    pub fn next(&mut self, key: &NumberingKey, depth: usize) -> u32 {
        let depth = clamp_depth(depth);
        let definition = self.definition(key);
        let counts = self.state.counters.entry(key.clone()).or_default();

        for deeper in depth + 1..MAX_LEVELS {
            if restart_policy(definition, deeper).restarts_on(deeper, depth) {
                counts[deeper] = None;
            }
        }

        let value = match counts[depth] {
            Some(current) => current.saturating_add(1),
            None => start_value(definition, depth),
        };
        counts[depth] = Some(value);
        value
    }

    /// Current values of depths `0..=depth`; unused levels show their start value
    pub fn values(&self, key: &NumberingKey, depth: usize) -> Vec<u32> {
        let depth = clamp_depth(depth);
        let definition = self.definition(key);
        let counts = self.state.counters.get(key);

        (0..=depth)
            .map(|d| {
                counts
                    .and_then(|c| c[d])
                    .unwrap_or_else(|| start_value(definition, d))
            })
            .collect()
    }

    /// Render the visible number at `depth`
    ///
    /// Each depth's value is formatted with its level format and substituted
    /// into the deepest level's template (`%1` is depth 0). A single trailing
    /// `.` and surrounding whitespace are stripped.
    pub fn render(&self, key: &NumberingKey, depth: usize) -> String {
        let depth = clamp_depth(depth);
        let definition = self.definition(key);
        let values = self.values(key, depth);

        let template = definition
            .and_then(|d| d.level(depth))
            .map(|l| l.template.clone())
            .unwrap_or_else(|| default_template(depth));

        let mut out = template;
        // Highest placeholder first so "%1" never eats part of a longer one
        for placeholder in (1..=MAX_LEVELS).rev() {
            let pattern = format!("%{}", placeholder);
            if !out.contains(&pattern) {
                continue;
            }
            let replacement = match values.get(placeholder - 1) {
                Some(&value) => format_of(definition, placeholder - 1).render(value),
                None => String::new(),
            };
            out = out.replace(&pattern, &replacement);
        }

        let trimmed = out.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        trimmed.trim().to_string()
    }

    /// Overwrite counts of depths `0..values.len()` and restart deeper ones
    ///
    /// Used to keep the fallback counter in step with numbers written
    /// explicitly in heading text.
    pub fn align(&mut self, key: &NumberingKey, values: &[u32]) {
        if values.is_empty() {
            return;
        }
        let counts = self.state.counters.entry(key.clone()).or_default();
        for (depth, slot) in counts.iter_mut().enumerate() {
            *slot = values.get(depth).copied();
        }
    }
}

fn clamp_depth(depth: usize) -> usize {
    if depth >= MAX_LEVELS {
        log::debug!("Numbering depth {} clamped to {}", depth, MAX_LEVELS - 1);
        MAX_LEVELS - 1
    } else {
        depth
    }
}

fn start_value(definition: Option<&NumberingDefinition>, depth: usize) -> u32 {
    definition.map_or(1, |d| d.start(depth))
}

fn format_of(definition: Option<&NumberingDefinition>, depth: usize) -> NumberFormat {
    definition.map_or(NumberFormat::Decimal, |d| d.format(depth))
}

fn restart_policy(definition: Option<&NumberingDefinition>, depth: usize) -> RestartPolicy {
    definition.map_or(RestartPolicy::AnyShallower, |d| d.restart(depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::catalog::tests::{heading_numbering, level};
    use crate::numbering::catalog::{RawNumbering, RawTemplate};

    fn catalog_with(levels: Vec<crate::numbering::catalog::RawLevel>) -> NumberingCatalog {
        NumberingCatalog::load_templates(&RawNumbering {
            templates: vec![RawTemplate {
                id: "t".to_string(),
                levels,
            }],
            instances: Vec::new(),
        })
    }

    #[test]
    fn test_decimal_two_levels() {
        let catalog = NumberingCatalog::load_templates(&heading_numbering());
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("3");

        assert_eq!(engine.next(&key, 0), 1);
        assert_eq!(engine.next(&key, 1), 1);
        assert_eq!(engine.next(&key, 1), 2);
        assert_eq!(engine.render(&key, 1), "1.2");
        assert_eq!(engine.next(&key, 0), 2);
        assert_eq!(engine.render(&key, 0), "2");
        assert_eq!(engine.next(&key, 1), 1);
        assert_eq!(engine.render(&key, 1), "2.1");
    }

    #[test]
    fn test_deeper_levels_restart_even_when_unused() {
        let catalog = NumberingCatalog::load_templates(&heading_numbering());
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("3");

        engine.next(&key, 0);
        engine.next(&key, 1);
        engine.next(&key, 2);
        engine.next(&key, 2);
        engine.next(&key, 1);
        assert_eq!(engine.render(&key, 2), "1.2.1");
        assert_eq!(engine.next(&key, 2), 1);
        assert_eq!(engine.render(&key, 2), "1.2.1");
    }

    #[test]
    fn test_restart_shows_configured_start() {
        let mut second = level(1, "decimal", "%1.%2");
        second.start = Some("5".to_string());
        second.restart = Some("1".to_string());
        let catalog = catalog_with(vec![level(0, "decimal", "%1."), second]);
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("t");

        for expected in 1..=3 {
            engine.next(&key, 0);
            assert_eq!(engine.render(&key, 1), format!("{}.5", expected));
        }
        assert_eq!(engine.next(&key, 1), 5);
        assert_eq!(engine.next(&key, 1), 6);
    }

    #[test]
    fn test_largest_start_value_saturates() {
        let mut first = level(0, "decimal", "%1.");
        first.start = Some(u32::MAX.to_string());
        let catalog = catalog_with(vec![first]);
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("t");

        assert_eq!(engine.next(&key, 0), u32::MAX);
        assert_eq!(engine.next(&key, 0), u32::MAX);
        assert_eq!(engine.render(&key, 0), u32::MAX.to_string());
    }

    #[test]
    fn test_never_restart_keeps_counting() {
        let mut second = level(1, "decimal", "%2)");
        second.restart = Some("0".to_string());
        let catalog = catalog_with(vec![level(0, "decimal", "%1."), second]);
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("t");

        engine.next(&key, 0);
        engine.next(&key, 1);
        engine.next(&key, 0);
        assert_eq!(engine.next(&key, 1), 2);
        assert_eq!(engine.render(&key, 1), "2)");
    }

    #[test]
    fn test_mixed_formats() {
        let catalog = catalog_with(vec![
            level(0, "upperRoman", "Раздел %1."),
            level(1, "russianUpper", "%2."),
            level(2, "lowerLetter", "%1.%2.%3)"),
        ]);
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("t");

        engine.next(&key, 0);
        engine.next(&key, 0);
        engine.next(&key, 0);
        engine.next(&key, 0);
        assert_eq!(engine.render(&key, 0), "Раздел IV");
        engine.next(&key, 1);
        engine.next(&key, 1);
        assert_eq!(engine.render(&key, 1), "Б");
        engine.next(&key, 2);
        engine.next(&key, 2);
        engine.next(&key, 2);
        assert_eq!(engine.render(&key, 2), "IV.Б.c)");
    }

    #[test]
    fn test_fallback_counter() {
        let catalog = NumberingCatalog::default();
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::Fallback;

        engine.next(&key, 0);
        engine.next(&key, 1);
        engine.next(&key, 1);
        assert_eq!(engine.render(&key, 1), "1.2");
        engine.next(&key, 0);
        engine.next(&key, 2);
        assert_eq!(engine.render(&key, 2), "2.1.1");
        assert_eq!(engine.values(&key, 2), vec![2, 1, 1]);
    }

    #[test]
    fn test_unknown_instance_behaves_like_fallback() {
        let catalog = NumberingCatalog::default();
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::instance("42");
        assert_eq!(engine.next(&key, 0), 1);
        assert_eq!(engine.render(&key, 0), "1");
        assert!(engine.state().has_seen(&key));
        assert!(!engine.state().has_seen(&NumberingKey::Fallback));
    }

    #[test]
    fn test_align_continues_sequence() {
        let catalog = NumberingCatalog::default();
        let mut engine = CounterEngine::new(&catalog);
        let key = NumberingKey::Fallback;

        engine.align(&key, &[2, 3]);
        assert_eq!(engine.next(&key, 1), 4);
        assert_eq!(engine.next(&key, 0), 3);
        assert_eq!(engine.render(&key, 0), "3");
    }

    #[test]
    fn test_independent_engines() {
        let catalog = NumberingCatalog::load_templates(&heading_numbering());
        let key = NumberingKey::instance("3");
        let mut first = CounterEngine::new(&catalog);
        let mut second = CounterEngine::new(&catalog);
        first.next(&key, 0);
        first.next(&key, 0);
        assert_eq!(second.next(&key, 0), 1);
    }
}

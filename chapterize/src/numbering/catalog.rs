//! Numbering templates parsed from the document's numbering definitions

use super::format::{FormatParseError, NumberFormat};
use crate::diagnostics::Diagnostic;
use std::collections::{BTreeMap, HashMap};

/// Number of levels a numbering template may define (depths 0..=8)
pub const MAX_LEVELS: usize = 9;

/// One level of a raw numbering template, values exactly as found in the source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLevel {
    /// 0-based level index (`w:ilvl`)
    pub depth: Option<String>,
    /// Start value (`w:start`)
    pub start: Option<String>,
    /// Format keyword (`w:numFmt`)
    pub format: Option<String>,
    /// Rendering template with `%1`..`%9` placeholders (`w:lvlText`)
    pub text: Option<String>,
    /// Restart rule (`w:lvlRestart`)
    pub restart: Option<String>,
}

/// A raw numbering template (`w:abstractNum`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTemplate {
    pub id: String,
    pub levels: Vec<RawLevel>,
}

/// A raw numbering instance binding paragraphs to a template (`w:num`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInstance {
    pub id: String,
    pub template_id: String,
}

/// Raw numbering data handed over by the document reader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNumbering {
    pub templates: Vec<RawTemplate>,
    pub instances: Vec<RawInstance>,
}

/// When a level goes back to its start value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Restart whenever any shallower level increments
    #[default]
    AnyShallower,
    /// Restart only when a level at this depth or shallower increments
    AfterDepth(usize),
    /// Keep counting across shallower increments
    Never,
}

impl RestartPolicy {
    /// Parse a `w:lvlRestart` value (1-based level, `0` = never)
    fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<usize>().ok()? {
            0 => Some(RestartPolicy::Never),
            n => Some(RestartPolicy::AfterDepth(n - 1)),
        }
    }

    /// Whether a level at `own_depth` restarts when `incremented` increments
    pub fn restarts_on(self, own_depth: usize, incremented: usize) -> bool {
        if incremented >= own_depth {
            return false;
        }
        match self {
            RestartPolicy::AnyShallower => true,
            RestartPolicy::AfterDepth(depth) => incremented <= depth,
            RestartPolicy::Never => false,
        }
    }
}

/// One level of one numbering template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDefinition {
    /// 0-based depth
    pub depth: usize,
    /// First value issued after a restart
    pub start: u32,
    pub format: NumberFormat,
    /// Rendering template, e.g. `"%1.%2."`
    pub template: String,
    pub restart: RestartPolicy,
}

impl LevelDefinition {
    /// Level used for depths a template does not define: decimal, start 1,
    /// dotted template over every ancestor
    pub fn fallback(depth: usize) -> Self {
        Self {
            depth,
            start: 1,
            format: NumberFormat::Decimal,
            template: default_template(depth),
            restart: RestartPolicy::AnyShallower,
        }
    }
}

/// `"%1.%2.%3"` for depth 2
pub fn default_template(depth: usize) -> String {
    (1..=depth + 1)
        .map(|i| format!("%{}", i))
        .collect::<Vec<_>>()
        .join(".")
}

/// A numbering template: level definitions keyed by depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingDefinition {
    pub id: String,
    pub levels: BTreeMap<usize, LevelDefinition>,
}

impl NumberingDefinition {
    /// Definition of one level, if the template defines it
    pub fn level(&self, depth: usize) -> Option<&LevelDefinition> {
        self.levels.get(&depth)
    }

    /// Start value of a level (1 when undefined)
    pub fn start(&self, depth: usize) -> u32 {
        self.level(depth).map_or(1, |l| l.start)
    }

    /// Format of a level (decimal when undefined)
    pub fn format(&self, depth: usize) -> NumberFormat {
        self.level(depth).map_or(NumberFormat::Decimal, |l| l.format)
    }

    /// Restart policy of a level
    pub fn restart(&self, depth: usize) -> RestartPolicy {
        self.level(depth).map_or(RestartPolicy::AnyShallower, |l| l.restart)
    }

    /// Parse a raw template
    ///
    /// # Returns
    /// * `Ok(NumberingDefinition)` - All numbered levels parsed
    /// * `Err(String)` - Reason the template is malformed
    fn parse(raw: &RawTemplate) -> Result<Self, String> {
        let mut levels = BTreeMap::new();

        for raw_level in &raw.levels {
            let depth_str = raw_level
                .depth
                .as_deref()
                .ok_or_else(|| "level without an index".to_string())?;
            let depth = depth_str
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid level index '{}'", depth_str))?;
            if depth >= MAX_LEVELS {
                return Err(format!("level index {} out of range", depth));
            }

            let format_str = raw_level
                .format
                .as_deref()
                .ok_or_else(|| format!("level {} lacks a number format", depth))?;
            let format = match NumberFormat::parse(format_str) {
                Ok(format) => format,
                Err(FormatParseError::NotNumbered(keyword)) => {
                    log::debug!(
                        "Template '{}' level {} uses '{}', not a heading number",
                        raw.id,
                        depth,
                        keyword
                    );
                    continue;
                }
                Err(e) => return Err(format!("level {}: {}", depth, e)),
            };

            let start = match raw_level.start.as_deref() {
                Some(s) => s
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("level {} has invalid start '{}'", depth, s))?,
                None => 1,
            };

            let restart = match raw_level.restart.as_deref() {
                Some(s) => RestartPolicy::parse(s)
                    .ok_or_else(|| format!("level {} has invalid restart '{}'", depth, s))?,
                None => RestartPolicy::AnyShallower,
            };

            let template = raw_level
                .text
                .clone()
                .unwrap_or_else(|| default_template(depth));

            levels.insert(
                depth,
                LevelDefinition {
                    depth,
                    start,
                    format,
                    template,
                    restart,
                },
            );
        }

        Ok(Self {
            id: raw.id.clone(),
            levels,
        })
    }
}

/// Read-only catalog of numbering templates and the instances that use them
#[derive(Debug, Clone, Default)]
pub struct NumberingCatalog {
    templates: HashMap<String, NumberingDefinition>,
    instances: HashMap<String, String>,
    diagnostics: Vec<Diagnostic>,
}

impl NumberingCatalog {
    /// Build the catalog from raw numbering data
    ///
    /// A malformed template is dropped and a `MalformedNumberingSource`
    /// diagnostic is kept; the remaining templates are still usable.
    pub fn load_templates(source: &RawNumbering) -> Self {
        let mut catalog = Self::default();

        for raw in &source.templates {
            match NumberingDefinition::parse(raw) {
                Ok(definition) => {
                    catalog.templates.insert(raw.id.clone(), definition);
                }
                Err(reason) => {
                    let diagnostic = Diagnostic::MalformedNumberingSource {
                        template_id: raw.id.clone(),
                        reason,
                    };
                    log::warn!("{}", diagnostic);
                    catalog.diagnostics.push(diagnostic);
                }
            }
        }

        for instance in &source.instances {
            catalog
                .instances
                .insert(instance.id.clone(), instance.template_id.clone());
        }

        log::debug!(
            "Loaded {} numbering templates and {} instances",
            catalog.templates.len(),
            catalog.instances.len()
        );

        catalog
    }

    /// Empty catalog for a numbering source that could not be read at all
    pub fn unreadable(part: &str, reason: impl Into<String>) -> Self {
        let diagnostic = Diagnostic::MalformedNumberingSource {
            template_id: part.to_string(),
            reason: reason.into(),
        };
        log::warn!("{}", diagnostic);
        Self {
            diagnostics: vec![diagnostic],
            ..Self::default()
        }
    }

    /// Resolve a numbering id to its template
    ///
    /// Instance ids are resolved through their template; an id with no
    /// instance is looked up as a template id directly.
    pub fn lookup(&self, numbering_id: &str) -> Option<&NumberingDefinition> {
        match self.instances.get(numbering_id) {
            Some(template_id) => self.templates.get(template_id),
            None => self.templates.get(numbering_id),
        }
    }

    /// Template id an instance points at, when the instance is known
    pub fn template_of(&self, numbering_id: &str) -> Option<&str> {
        self.instances.get(numbering_id).map(String::as_str)
    }

    /// Number of usable templates
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Diagnostics recorded while loading
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::numbering::Alphabet;

    pub(crate) fn level(depth: usize, format: &str, text: &str) -> RawLevel {
        RawLevel {
            depth: Some(depth.to_string()),
            start: Some("1".to_string()),
            format: Some(format.to_string()),
            text: Some(text.to_string()),
            restart: None,
        }
    }

    pub(crate) fn heading_numbering() -> RawNumbering {
        RawNumbering {
            templates: vec![RawTemplate {
                id: "10".to_string(),
                levels: vec![
                    level(0, "decimal", "%1."),
                    level(1, "decimal", "%1.%2."),
                    level(2, "decimal", "%1.%2.%3."),
                ],
            }],
            instances: vec![RawInstance {
                id: "3".to_string(),
                template_id: "10".to_string(),
            }],
        }
    }

    #[test]
    fn test_load_and_lookup() {
        let catalog = NumberingCatalog::load_templates(&heading_numbering());
        assert!(catalog.diagnostics().is_empty());
        assert_eq!(catalog.template_count(), 1);

        let def = catalog.lookup("3").unwrap();
        assert_eq!(def.id, "10");
        assert_eq!(def.level(1).unwrap().template, "%1.%2.");
        assert!(catalog.lookup("10").is_some());
        assert!(catalog.lookup("99").is_none());
    }

    #[test]
    fn test_malformed_template_is_dropped() {
        let mut source = heading_numbering();
        source.templates.push(RawTemplate {
            id: "11".to_string(),
            levels: vec![RawLevel {
                depth: Some("0".to_string()),
                start: Some("1".to_string()),
                format: None,
                text: Some("%1.".to_string()),
                restart: None,
            }],
        });

        let catalog = NumberingCatalog::load_templates(&source);
        assert_eq!(catalog.template_count(), 1);
        assert!(catalog.lookup("11").is_none());
        assert!(matches!(
            &catalog.diagnostics()[0],
            Diagnostic::MalformedNumberingSource { template_id, .. } if template_id == "11"
        ));
    }

    #[test]
    fn test_bullet_levels_are_skipped() {
        let source = RawNumbering {
            templates: vec![RawTemplate {
                id: "1".to_string(),
                levels: vec![level(0, "decimal", "%1."), level(1, "bullet", "•")],
            }],
            instances: Vec::new(),
        };
        let catalog = NumberingCatalog::load_templates(&source);
        let def = catalog.lookup("1").unwrap();
        assert!(def.level(0).is_some());
        assert!(def.level(1).is_none());
        assert_eq!(def.format(1), NumberFormat::Decimal);
    }

    #[test]
    fn test_level_defaults() {
        let source = RawNumbering {
            templates: vec![RawTemplate {
                id: "1".to_string(),
                levels: vec![RawLevel {
                    depth: Some("2".to_string()),
                    format: Some("russianUpper".to_string()),
                    restart: Some("0".to_string()),
                    ..RawLevel::default()
                }],
            }],
            instances: Vec::new(),
        };
        let catalog = NumberingCatalog::load_templates(&source);
        let lvl = catalog.lookup("1").unwrap().level(2).unwrap();
        assert_eq!(lvl.start, 1);
        assert_eq!(lvl.template, "%1.%2.%3");
        assert_eq!(lvl.format, NumberFormat::UpperLetter(Alphabet::Cyrillic));
        assert_eq!(lvl.restart, RestartPolicy::Never);
    }

    #[test]
    fn test_restart_policy() {
        assert!(RestartPolicy::AnyShallower.restarts_on(2, 0));
        assert!(RestartPolicy::AnyShallower.restarts_on(2, 1));
        assert!(!RestartPolicy::AnyShallower.restarts_on(2, 2));
        assert!(RestartPolicy::AfterDepth(0).restarts_on(2, 0));
        assert!(!RestartPolicy::AfterDepth(0).restarts_on(2, 1));
        assert!(!RestartPolicy::Never.restarts_on(2, 0));
        assert_eq!(RestartPolicy::parse("1"), Some(RestartPolicy::AfterDepth(0)));
        assert_eq!(RestartPolicy::parse("x"), None);
    }

    #[test]
    fn test_unreadable_source() {
        let catalog = NumberingCatalog::unreadable("word/numbering.xml", "unexpected end of stream");
        assert_eq!(catalog.template_count(), 0);
        assert_eq!(catalog.diagnostics().len(), 1);
    }
}

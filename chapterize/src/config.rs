//! Conversion configuration from chapterize.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chapterize.toml";

/// Deepest heading depth the engine recognizes
pub const MAX_HEADING_DEPTH: usize = 6;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterizeConfig {
    /// Heading recognition
    pub headings: HeadingConfig,

    /// Section naming and output layout
    pub output: OutputConfig,
}

/// How headings are recognized in paragraph styles and text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// Case-insensitive patterns matched against style names and ids;
    /// the first capture group is the heading level
    pub style_patterns: Vec<String>,

    /// Styles that are headings at a fixed depth regardless of their name
    pub fixed_styles: Vec<FixedStyle>,

    /// Words introducing an appendix letter ("Приложение Б")
    pub appendix_words: Vec<String>,

    /// Titles of service headings (table of contents) that are not sections
    pub service_titles: Vec<String>,
}

/// A style name mapped to a fixed heading depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedStyle {
    /// Style name or id, compared case-insensitively
    pub name: String,
    /// Heading depth (1-based)
    pub depth: usize,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            style_patterns: [
                r"^Heading\s*(\d)$",
                r".*Заголовок\s*(\d)$",
                r"^Titre\s*(\d)$",
                r"^Überschrift\s*(\d)$",
                r"^Encabezado\s*(\d)$",
                r".*\bheading\s*(\d)$",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            fixed_styles: vec![
                FixedStyle {
                    name: "ROSA_ПРИЛОЖЕНИЕ".to_string(),
                    depth: 1,
                },
                FixedStyle {
                    name: "ROSAfb".to_string(),
                    depth: 1,
                },
            ],
            appendix_words: vec!["Приложение".to_string(), "Appendix".to_string()],
            service_titles: ["содержание", "оглавление", "contents", "table of contents"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Naming and layout of the written hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of order-key components encoded in order codes
    pub order_code_depth: usize,

    /// Deepest heading depth that opens its own section
    pub split_depth: usize,

    /// Shift heading depths so the shallowest heading in a document is depth 1
    pub normalize_depths: bool,

    /// Maximum slug length in characters
    pub slug_max_len: usize,

    /// File name of the document written inside each top-level folder
    pub index_file: String,

    /// Extension of written section files
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            order_code_depth: 3,
            split_depth: 3,
            normalize_depths: true,
            slug_max_len: 60,
            index_file: "index.md".to_string(),
            extension: "md".to_string(),
        }
    }
}

impl ChapterizeConfig {
    /// Load configuration from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ChapterizeConfig)` - Successfully loaded and validated configuration
    /// * `Err(ConfigError)` - Error reading, parsing or validating the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: ChapterizeConfig =
            toml::from_str(&content).map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    /// Load an explicitly named file, or the default file if it exists
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicitly named file is an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let output = &self.output;
        if output.split_depth == 0 || output.split_depth > MAX_HEADING_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "split_depth must be between 1 and {}, got {}",
                MAX_HEADING_DEPTH, output.split_depth
            )));
        }
        if output.order_code_depth == 0 {
            return Err(ConfigError::Invalid(
                "order_code_depth must be at least 1".to_string(),
            ));
        }
        if output.slug_max_len == 0 {
            return Err(ConfigError::Invalid(
                "slug_max_len must be at least 1".to_string(),
            ));
        }
        if let Some(fixed) = self
            .headings
            .fixed_styles
            .iter()
            .find(|f| f.depth == 0 || f.depth > MAX_HEADING_DEPTH)
        {
            return Err(ConfigError::Invalid(format!(
                "fixed style '{}' has depth {}, expected 1..={}",
                fixed.name, fixed.depth, MAX_HEADING_DEPTH
            )));
        }
        Ok(())
    }
}

/// Errors that can occur when loading, saving or applying configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// A heading style pattern is not a valid regular expression
    PatternError {
        pattern: String,
        source: regex::Error,
    },

    /// A value is out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            ConfigError::PatternError { pattern, source } => {
                write!(f, "Invalid heading pattern '{}': {}", pattern, source)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::ParseError(e) => Some(e),
            ConfigError::SerializeError(e) => Some(e),
            ConfigError::PatternError { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

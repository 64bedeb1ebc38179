//! Three-stage conversion pipeline
//!
//! This module orchestrates the stages of one conversion:
//! 1. **Reading**: Load paragraphs, styles and numbering from the DOCX container
//! 2. **Numbering**: Classify headings and recover their visible numbers
//! 3. **Decomposition**: Fold headings and content into the section tree

use crate::config::{ChapterizeConfig, ConfigError, OutputConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::docx::{self, ParagraphKind, ParagraphRecord};
use crate::heading::{HeadingClassifier, HeadingRecord};
use crate::hierarchy::{HierarchyBuilder, SectionHeading, SectionNode};
use crate::numbering::{CounterEngine, NumberingCatalog, NumberingKey};
use crate::order_key::{OrderKey, OrderKeyError};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A content block owned by a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Body paragraph text
    Paragraph { text: String },
    /// Table text, one row per line
    Table { text: String },
    /// A heading too deep to open its own section
    Heading {
        depth: usize,
        number: String,
        title: String,
    },
}

impl From<SectionHeading> for Block {
    fn from(heading: SectionHeading) -> Self {
        Block::Heading {
            depth: heading.depth,
            number: heading.number,
            title: heading.title,
        }
    }
}

/// Section tree of one document plus everything worth reporting about it
#[derive(Debug, Clone)]
pub struct Conversion {
    pub root: SectionNode<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Every section below the root, depth first
    pub fn sections(&self) -> impl Iterator<Item = &SectionNode<Block>> {
        self.root.walk().filter(|node| !node.is_root())
    }
}

/// Collect the DOCX files named on the command line
///
/// Directories are searched recursively. Word lock files (`~$name.docx`)
/// are skipped. The result is sorted and free of duplicates.
pub fn discover_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    inputs
        .iter()
        .flat_map(|input| {
            WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .filter(|e| is_docx(e.path()))
                .map(|e| e.path().to_path_buf())
                .collect::<Vec<_>>()
        })
        .sorted()
        .dedup()
        .collect()
}

fn is_docx(path: &Path) -> bool {
    let is_lock_file = path
        .file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with("~$"));
    let has_extension = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
    has_extension && !is_lock_file
}

/// Convert one DOCX file
///
/// # Parameters
/// * `path` - The DOCX file
/// * `config` - Heading recognition and layout settings
///
/// # Returns
/// * `Ok(Conversion)` - The section tree and its diagnostics
/// * `Err(ConvertError)` - The file could not be read, or the configuration is invalid
pub fn convert_docx(path: &Path, config: &ChapterizeConfig) -> Result<Conversion, ConvertError> {
    let source = docx::read_docx(path)?;
    let classifier = HeadingClassifier::new(&config.headings, source.styles)?;
    Ok(convert(
        &source.paragraphs,
        &source.catalog,
        &classifier,
        &config.output,
    ))
}

/// Convert several DOCX files, in parallel when the feature is enabled
///
/// Every file gets its own counters and builder; results keep input order.
pub fn convert_all(
    paths: &[PathBuf],
    config: &ChapterizeConfig,
) -> Vec<(PathBuf, Result<Conversion, ConvertError>)> {
    #[cfg(feature = "parallel")]
    let results = paths
        .par_iter()
        .map(|path| (path.clone(), convert_docx(path, config)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results = paths
        .iter()
        .map(|path| (path.clone(), convert_docx(path, config)))
        .collect();

    results
}

/// Run numbering and decomposition over an already read document
///
/// This pass performs no I/O. Recoverable problems are returned as
/// diagnostics next to the tree.
pub fn convert(
    paragraphs: &[ParagraphRecord],
    catalog: &NumberingCatalog,
    classifier: &HeadingClassifier,
    output: &OutputConfig,
) -> Conversion {
    let mut numberer = HeadingNumberer::new(catalog);
    let mut builder = HierarchyBuilder::new(output.split_depth, output.order_code_depth);
    let mut heading_count = 0usize;

    let classified: Vec<Option<HeadingRecord>> = paragraphs
        .iter()
        .map(|record| match record.kind {
            ParagraphKind::Content => None,
            ParagraphKind::HeadingCandidate => {
                classifier.classify(&record.style_id, record.outline_hint, &record.text)
            }
        })
        .collect();
    let shift = if output.normalize_depths {
        depth_shift(&classified)
    } else {
        0
    };

    for (record, classified) in paragraphs.iter().zip(classified) {
        if record.kind == ParagraphKind::Content {
            builder.push_content(Block::Table {
                text: record.text.clone(),
            });
            continue;
        }

        match classified {
            Some(mut heading) => {
                heading_count += 1;
                heading.depth -= shift;
                let heading = heading.with_numbering(record.numbering.clone());
                builder.push_heading(numberer.number(&heading));
            }
            None => {
                let text = record.text.trim();
                if !text.is_empty() {
                    builder.push_content(Block::Paragraph {
                        text: text.to_string(),
                    });
                }
            }
        }
    }

    let hierarchy = builder.finish();

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend_from(catalog.diagnostics());
    diagnostics.extend_from(numberer.diagnostics.as_slice());
    diagnostics.extend_from(&hierarchy.diagnostics);

    log::info!(
        "Converted {} paragraphs: {} headings, {} top-level sections, {} diagnostics",
        paragraphs.len(),
        heading_count,
        hierarchy.root.children.len(),
        diagnostics.len()
    );

    Conversion {
        root: hierarchy.root,
        diagnostics: diagnostics.into_vec(),
    }
}

/// Levels to subtract so the shallowest heading becomes a chapter
///
/// A document whose headings start at "Heading 2" is split as if they
/// started at "Heading 1".
fn depth_shift(headings: &[Option<HeadingRecord>]) -> usize {
    let shift = headings
        .iter()
        .flatten()
        .map(|heading| heading.depth)
        .min()
        .map_or(0, |min_depth| min_depth.saturating_sub(1));
    if shift > 0 {
        log::info!("Shallowest heading is at depth {}, shifting all headings up", shift + 1);
    }
    shift
}

/// Turns heading records into numbered section headings
///
/// Owns the counter state of exactly one document.
struct HeadingNumberer<'c> {
    catalog: &'c NumberingCatalog,
    engine: CounterEngine<'c>,
    reported_instances: HashSet<String>,
    diagnostics: Diagnostics,
}

impl<'c> HeadingNumberer<'c> {
    fn new(catalog: &'c NumberingCatalog) -> Self {
        Self {
            catalog,
            engine: CounterEngine::new(catalog),
            reported_instances: HashSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Number written in the text wins; otherwise the bound numbering
    /// definition, otherwise the document-wide fallback counter
    fn number(&mut self, record: &HeadingRecord) -> SectionHeading {
        let mut heading_diagnostics = Vec::new();
        if record.double_numbered {
            heading_diagnostics.push(Diagnostic::DoubleNumberedTitle {
                token: record.raw_number_token.clone(),
                title: record.title.clone(),
            });
        }

        let (order_key, number) = if record.has_explicit_number() {
            if let Some(binding) = &record.numbering {
                // Word still spends a value of the bound list on this paragraph
                if self.catalog.lookup(&binding.numbering_id).is_some() {
                    self.engine.next(&binding.key(), binding.depth);
                }
                log::debug!(
                    "'{}' has both a written number and numbering {}, using the written one",
                    record.title,
                    binding.numbering_id
                );
            }
            let key = self.explicit_key(record, &mut heading_diagnostics);
            (key, record.raw_number_token.clone())
        } else {
            self.counted_key(record)
        };

        log::debug!(
            "Heading depth {} '{}' numbered '{}' ({})",
            record.depth,
            record.title,
            number,
            order_key
        );

        SectionHeading {
            depth: record.depth,
            order_key,
            number,
            title: record.title.clone(),
            lettered: record.scheme.is_lettered(),
            diagnostics: heading_diagnostics,
        }
    }

    fn explicit_key(
        &mut self,
        record: &HeadingRecord,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> OrderKey {
        match OrderKey::from_token(&record.raw_number_token) {
            Ok(key) => {
                self.engine.align(&NumberingKey::Fallback, &key.parts);
                key
            }
            Err(OrderKeyError::AmbiguousLetterMapping { letter }) => {
                diagnostics.push(Diagnostic::AmbiguousLetterMapping {
                    token: record.raw_number_token.clone(),
                    letter,
                });
                OrderKey::default()
            }
            Err(e) => {
                log::debug!(
                    "Number '{}' of '{}' not usable for ordering: {}",
                    record.raw_number_token,
                    record.title,
                    e
                );
                OrderKey::default()
            }
        }
    }

    fn counted_key(&mut self, record: &HeadingRecord) -> (OrderKey, String) {
        let (key, depth) = match &record.numbering {
            Some(binding) if self.catalog.lookup(&binding.numbering_id).is_some() => {
                (binding.key(), binding.depth)
            }
            Some(binding) => {
                self.report_unknown(&binding.numbering_id);
                (NumberingKey::Fallback, record.depth - 1)
            }
            None => (NumberingKey::Fallback, record.depth - 1),
        };

        self.engine.next(&key, depth);
        let values = self.engine.values(&key, depth);
        let number = self.engine.render(&key, depth);
        if key != NumberingKey::Fallback {
            self.engine.align(&NumberingKey::Fallback, &values);
        }
        (OrderKey::new(values), number)
    }

    fn report_unknown(&mut self, numbering_id: &str) {
        if !self.reported_instances.insert(numbering_id.to_string()) {
            return;
        }
        let template_id = self
            .catalog
            .template_of(numbering_id)
            .unwrap_or(numbering_id)
            .to_string();
        self.diagnostics.push(Diagnostic::UnknownNumberingInstance {
            numbering_id: numbering_id.to_string(),
            template_id,
        });
    }
}

/// Errors that abort a conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("{path} is not a readable DOCX archive: {source}", path = .0.display(), source = .1)]
    NotAnArchive(PathBuf, #[source] zip::result::ZipError),

    #[error("{path} contains no word/document.xml", path = .0.display())]
    MissingDocument(PathBuf),

    #[error("Error parsing {part} in {file}: {source}", file = .path.display())]
    XmlError {
        path: PathBuf,
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Error writing {path}: {source}", path = .0.display(), source = .1)]
    WriteError(PathBuf, #[source] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
}

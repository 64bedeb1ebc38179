//! Writes a section tree to disk as folders and text files
//!
//! Layout under the output directory:
//! - `<doc>/index.md` for content before the first heading
//! - `<doc>/<code>.<slug>/index.md` for each top-level section
//! - `<doc>/<code>.<slug>/<code>.<slug>.md` for each nested section

use crate::config::OutputConfig;
use crate::hierarchy::SectionNode;
use crate::pipeline::{Block, ConvertError};
use crate::slug::{disambiguate, slug_or_untitled};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Hands out unique names within one directory
#[derive(Debug, Default)]
struct NameAllocator {
    seen: HashMap<String, usize>,
}

impl NameAllocator {
    fn allocate(&mut self, base: String) -> String {
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        disambiguate(&base, *count)
    }
}

/// Write a converted document below `output_dir`
///
/// # Parameters
/// * `root` - Root of the section tree
/// * `document_name` - Name of the document folder before slugging (usually the file stem)
/// * `output_dir` - Directory receiving the document folder
/// * `config` - Naming settings
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Every file written, in document order
/// * `Err(ConvertError)` - A directory or file could not be written
pub fn write_hierarchy(
    root: &SectionNode<Block>,
    document_name: &str,
    output_dir: &Path,
    config: &OutputConfig,
) -> Result<Vec<PathBuf>, ConvertError> {
    let doc_dir = output_dir.join(slug_or_untitled([document_name], config.slug_max_len));
    create_dir(&doc_dir)?;

    let mut written = Vec::new();

    if root.has_content() {
        let path = doc_dir.join(&config.index_file);
        write_file(&path, &render_blocks(&root.content_blocks))?;
        written.push(path);
    }

    let mut folders = NameAllocator::default();
    for chapter in &root.children {
        let chapter_dir = doc_dir.join(folders.allocate(chapter.name(config.slug_max_len)));
        create_dir(&chapter_dir)?;

        let index = chapter_dir.join(&config.index_file);
        write_file(&index, &render_section(chapter))?;
        written.push(index);

        let mut files = NameAllocator::default();
        for section in &chapter.children {
            write_nested(section, &chapter_dir, config, &mut files, &mut written)?;
        }
    }

    log::info!("Wrote {} files to {}", written.len(), doc_dir.display());
    Ok(written)
}

/// Sections below a chapter are files in the chapter folder
///
/// A section whose only role is to group children (no content of its own)
/// gets no file.
fn write_nested(
    section: &SectionNode<Block>,
    dir: &Path,
    config: &OutputConfig,
    files: &mut NameAllocator,
    written: &mut Vec<PathBuf>,
) -> Result<(), ConvertError> {
    if section.has_content() || section.children.is_empty() {
        let name = files.allocate(section.name(config.slug_max_len));
        let path = dir.join(format!("{}.{}", name, config.extension));
        write_file(&path, &render_section(section))?;
        written.push(path);
    } else {
        log::debug!("Section '{}' has no content of its own", section.title);
    }

    for child in &section.children {
        write_nested(child, dir, config, files, written)?;
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), ConvertError> {
    fs::create_dir_all(path).map_err(|e| ConvertError::WriteError(path.to_path_buf(), e))
}

fn write_file(path: &Path, content: &str) -> Result<(), ConvertError> {
    fs::write(path, content).map_err(|e| ConvertError::WriteError(path.to_path_buf(), e))
}

fn heading_line(depth: usize, number: &str, title: &str) -> String {
    let prefix = "#".repeat(depth.clamp(1, 6));
    [prefix.as_str(), number, title]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Heading line followed by the section's own content
pub fn render_section(section: &SectionNode<Block>) -> String {
    let mut output = heading_line(section.depth, &section.number, &section.title);
    output.push('\n');
    if section.has_content() {
        output.push('\n');
        output.push_str(&render_blocks(&section.content_blocks));
    }
    output
}

/// Blocks separated by blank lines
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut output = blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph { text } | Block::Table { text } => text.clone(),
            Block::Heading {
                depth,
                number,
                title,
            } => heading_line(*depth, number, title),
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    output.push('\n');
    output
}

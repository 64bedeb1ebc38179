//! DOCX container reader
//!
//! Extracts the three parts the numbering engine needs: numbering
//! definitions, paragraph styles and the ordered body paragraphs.

use crate::heading::{StyleInfo, StyleSheet};
use crate::numbering::{NumberingCatalog, NumberingRef, RawInstance, RawLevel, RawNumbering, RawTemplate};
use crate::pipeline::ConvertError;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";

/// Whether a record may be a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    /// Body paragraph, classified further by style and outline level
    HeadingCandidate,
    /// Always content (tables)
    Content,
}

/// One block of the document body, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphRecord {
    pub style_id: String,
    /// Outline level of the paragraph, or of its style (0-based)
    pub outline_hint: Option<u8>,
    pub text: String,
    pub kind: ParagraphKind,
    /// Numbering bound to the paragraph directly or through its style
    pub numbering: Option<NumberingRef>,
}

impl ParagraphRecord {
    /// A plain body paragraph without style information
    pub fn paragraph(style_id: &str, text: &str) -> Self {
        Self {
            style_id: style_id.to_string(),
            outline_hint: None,
            text: text.to_string(),
            kind: ParagraphKind::HeadingCandidate,
            numbering: None,
        }
    }

    /// A record that is never a heading
    pub fn content(text: &str) -> Self {
        Self {
            style_id: String::new(),
            outline_hint: None,
            text: text.to_string(),
            kind: ParagraphKind::Content,
            numbering: None,
        }
    }

    pub fn with_outline(mut self, level: u8) -> Self {
        self.outline_hint = Some(level);
        self
    }

    pub fn with_numbering(mut self, numbering: NumberingRef) -> Self {
        self.numbering = Some(numbering);
        self
    }
}

/// Everything read from one DOCX file
#[derive(Debug, Clone)]
pub struct DocxSource {
    pub paragraphs: Vec<ParagraphRecord>,
    pub styles: StyleSheet,
    pub catalog: NumberingCatalog,
}

/// Read a DOCX file from disk
pub fn read_docx(path: &Path) -> Result<DocxSource, ConvertError> {
    let file = File::open(path).map_err(|e| ConvertError::IoError(path.to_path_buf(), e))?;
    read_docx_from(BufReader::new(file), path)
}

/// Read a DOCX archive from any seekable reader
///
/// # Parameters
/// * `reader` - The archive bytes
/// * `path` - Name used in error messages
///
/// # Returns
/// * `Ok(DocxSource)` - Body paragraphs, styles and numbering catalog
/// * `Err(ConvertError)` - Not an archive, or the document part is missing or unparsable
pub fn read_docx_from<R: Read + Seek>(reader: R, path: &Path) -> Result<DocxSource, ConvertError> {
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| ConvertError::NotAnArchive(path.to_path_buf(), e))?;

    let document = read_part(&mut archive, DOCUMENT_PART, path)?
        .ok_or_else(|| ConvertError::MissingDocument(path.to_path_buf()))?;

    let styles = match read_part(&mut archive, STYLES_PART, path)? {
        Some(xml) => parse_styles(&xml).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {} in {}: {}", STYLES_PART, path.display(), e);
            StyleSheet::new()
        }),
        None => StyleSheet::new(),
    };

    let catalog = match read_part(&mut archive, NUMBERING_PART, path)? {
        Some(xml) => match parse_numbering(&xml) {
            Ok(raw) => NumberingCatalog::load_templates(&raw),
            Err(e) => NumberingCatalog::unreadable(NUMBERING_PART, e.to_string()),
        },
        None => NumberingCatalog::default(),
    };

    let paragraphs = parse_document(&document, &styles).map_err(|e| ConvertError::XmlError {
        path: path.to_path_buf(),
        part: DOCUMENT_PART.to_string(),
        source: e,
    })?;

    log::info!(
        "Read {}: {} blocks, {} styles, {} numbering templates",
        path.display(),
        paragraphs.len(),
        styles.len(),
        catalog.template_count()
    );

    Ok(DocxSource {
        paragraphs,
        styles,
        catalog,
    })
}

/// Text of an archive member, `None` when the member does not exist
fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
    path: &Path,
) -> Result<Option<String>, ConvertError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ConvertError::NotAnArchive(path.to_path_buf(), e)),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| ConvertError::IoError(path.to_path_buf(), e))?;
    Ok(Some(content))
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// `w:numPr` of a paragraph or style; `numId = 0` removes numbering
fn parse_num_pr(ppr: roxmltree::Node) -> Option<Option<NumberingRef>> {
    let num_pr = wml(ppr, "numPr")?;
    let numbering_id = wml_attr(num_pr, "numId")?;
    if numbering_id == "0" {
        return Some(None);
    }
    let depth = wml_attr(num_pr, "ilvl")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    Some(Some(NumberingRef::new(numbering_id, depth)))
}

fn parse_outline_level(ppr: roxmltree::Node) -> Option<u8> {
    wml_attr(ppr, "outlineLvl").and_then(|v| v.parse::<u8>().ok())
}

/// Parse `word/numbering.xml` into raw templates and instances
pub fn parse_numbering(xml: &str) -> Result<RawNumbering, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut raw = RawNumbering::default();

    for node in doc.root_element().children() {
        if is_wml(node, "abstractNum") {
            let Some(id) = node.attribute((WML_NS, "abstractNumId")) else {
                continue;
            };
            let levels = node
                .children()
                .filter(|n| is_wml(*n, "lvl"))
                .map(|lvl| RawLevel {
                    depth: lvl.attribute((WML_NS, "ilvl")).map(str::to_string),
                    start: wml_attr(lvl, "start").map(str::to_string),
                    format: wml_attr(lvl, "numFmt").map(str::to_string),
                    text: wml_attr(lvl, "lvlText").map(str::to_string),
                    restart: wml_attr(lvl, "lvlRestart").map(str::to_string),
                })
                .collect();
            raw.templates.push(RawTemplate {
                id: id.to_string(),
                levels,
            });
        } else if is_wml(node, "num") {
            let Some(id) = node.attribute((WML_NS, "numId")) else {
                continue;
            };
            let Some(template_id) = wml_attr(node, "abstractNumId") else {
                continue;
            };
            raw.instances.push(RawInstance {
                id: id.to_string(),
                template_id: template_id.to_string(),
            });
        }
    }

    Ok(raw)
}

/// Parse the paragraph styles of `word/styles.xml`
pub fn parse_styles(xml: &str) -> Result<StyleSheet, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut sheet = StyleSheet::new();

    for style in doc.root_element().children().filter(|n| is_wml(*n, "style")) {
        if style.attribute((WML_NS, "type")) != Some("paragraph") {
            continue;
        }
        let Some(style_id) = style.attribute((WML_NS, "styleId")) else {
            continue;
        };
        let ppr = wml(style, "pPr");
        sheet.insert(
            style_id,
            StyleInfo {
                name: wml_attr(style, "name").map(str::to_string),
                outline_level: ppr.and_then(parse_outline_level),
                numbering: ppr.and_then(parse_num_pr).flatten(),
                based_on: wml_attr(style, "basedOn").map(str::to_string),
            },
        );
    }

    Ok(sheet)
}

/// Parse the body of `word/document.xml` into records
pub fn parse_document(xml: &str, styles: &StyleSheet) -> Result<Vec<ParagraphRecord>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut records = Vec::new();

    if let Some(body) = wml(doc.root_element(), "body") {
        collect_blocks(body, styles, &mut records);
    }

    Ok(records)
}

fn collect_blocks(container: roxmltree::Node, styles: &StyleSheet, out: &mut Vec<ParagraphRecord>) {
    for node in container.children().filter(|n| n.is_element()) {
        if is_wml(node, "p") {
            out.push(paragraph_record(node, styles));
        } else if is_wml(node, "tbl") {
            let text = table_text(node);
            if !text.is_empty() {
                out.push(ParagraphRecord::content(&text));
            }
        } else if is_wml(node, "sdt") {
            if let Some(content) = wml(node, "sdtContent") {
                collect_blocks(content, styles, out);
            }
        }
    }
}

fn paragraph_record(p: roxmltree::Node, styles: &StyleSheet) -> ParagraphRecord {
    let ppr = wml(p, "pPr");
    let style_id = ppr
        .and_then(|ppr| wml_attr(ppr, "pStyle"))
        .unwrap_or_default()
        .to_string();

    let outline_hint = ppr
        .and_then(parse_outline_level)
        .or_else(|| styles.outline_level(&style_id));

    let numbering = match ppr.and_then(parse_num_pr) {
        Some(direct) => direct,
        None => styles.numbering(&style_id).cloned(),
    };

    ParagraphRecord {
        style_id,
        outline_hint,
        text: paragraph_text(p),
        kind: ParagraphKind::HeadingCandidate,
        numbering,
    }
}

/// Visible text of a paragraph; tabs and breaks become spaces
fn paragraph_text(p: roxmltree::Node) -> String {
    let mut text = String::new();
    for node in p.descendants().filter(|n| n.is_element()) {
        let in_run = node.parent().is_some_and(|parent| is_wml(parent, "r"));
        match node.tag_name().name() {
            "t" if is_wml(node, "t") => text.push_str(node.text().unwrap_or_default()),
            "tab" | "br" | "cr" if in_run && node.tag_name().namespace() == Some(WML_NS) => {
                text.push(' ')
            }
            _ => {}
        }
    }
    text
}

/// Cells joined with ` | `, rows with newlines
fn table_text(tbl: roxmltree::Node) -> String {
    tbl.children()
        .filter(|n| is_wml(*n, "tr"))
        .map(|tr| {
            tr.children()
                .filter(|n| is_wml(*n, "tc"))
                .map(|tc| {
                    tc.descendants()
                        .filter(|n| is_wml(*n, "p"))
                        .map(paragraph_text)
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|row| !row.trim_matches([' ', '|']).is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

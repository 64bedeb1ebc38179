//! chapterize - split numbered office documents into chapter folders
//!
//! Recovers the visible heading numbers of a DOCX document (Word numbering
//! definitions, numbers typed into the text, or a document-order fallback)
//! and decomposes the body into a tree of sections with stable, sortable
//! order codes for folder and file names.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod diagnostics;
pub mod docx;
pub mod heading;
pub mod hierarchy;
pub mod numbering;
pub mod order_key;
pub mod pipeline;
pub mod slug;
pub mod writer;

pub use config::ChapterizeConfig;
pub use diagnostics::Diagnostic;
pub use hierarchy::{HierarchyBuilder, SectionHeading, SectionNode};
pub use order_key::OrderKey;
pub use pipeline::{convert, convert_all, convert_docx, Block, Conversion, ConvertError};

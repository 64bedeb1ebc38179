//! Recoverable problems collected during a conversion
//!
//! None of these abort a conversion. They are logged when recorded and
//! returned next to the section tree so callers can report them.

use crate::order_key::OrderKey;
use serde::Serialize;
use thiserror::Error;

/// A recoverable problem found while numbering or decomposing a document
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A numbering template could not be parsed and was dropped
    #[error("Malformed numbering template '{template_id}' dropped: {reason}")]
    MalformedNumberingSource {
        /// Template id, or the part name when the whole source is unreadable
        template_id: String,
        /// What was wrong with it
        reason: String,
    },

    /// A numbering instance points at a template that does not exist
    #[error("Numbering instance '{numbering_id}' references unknown template '{template_id}'")]
    UnknownNumberingInstance {
        /// Instance id used by paragraphs
        numbering_id: String,
        /// Missing template id
        template_id: String,
    },

    /// A letter-based number uses a letter outside the supported alphabets
    #[error("Letter '{letter}' in '{token}' is outside the supported alphabets, using document order")]
    AmbiguousLetterMapping {
        /// The raw number token
        token: String,
        /// The letter that could not be mapped
        letter: char,
    },

    /// A heading number disagrees with the number of its open parent
    #[error("Heading '{title}' numbered {order_key} does not continue its parent {parent_key}")]
    OrderingViolation {
        /// Clean title of the affected heading
        title: String,
        /// Order key of the affected heading
        order_key: OrderKey,
        /// Order key of the parent it was filed under (or the previous sibling)
        parent_key: OrderKey,
    },

    /// A heading appeared without an open container one level above it
    #[error("Heading '{title}' at depth {depth} has no open parent heading")]
    MissingParent {
        /// Clean title of the affected heading
        title: String,
        /// Depth of the affected heading
        depth: usize,
    },

    /// A number too large for the two-digit order code, clamped to 99
    #[error("Heading '{title}' numbered {order_key} does not fit the order code, clamped")]
    OrderCodeOverflow {
        /// Clean title of the affected heading
        title: String,
        /// Order key of the affected heading
        order_key: OrderKey,
    },

    /// A title still starts with its own number after stripping
    #[error("Double numbering '{token}' in heading '{title}'")]
    DoubleNumberedTitle {
        /// The duplicated number token
        token: String,
        /// Title after removing the duplicate
        title: String,
    },
}

impl Diagnostic {
    /// Whether the diagnostic concerns the section structure rather than parsing
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::OrderingViolation { .. }
                | Self::MissingParent { .. }
                | Self::DoubleNumberedTitle { .. }
                | Self::OrderCodeOverflow { .. }
        )
    }
}

/// Ordered list of diagnostics that logs each entry as it is recorded
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    /// Append diagnostics recorded elsewhere without logging them again
    pub fn extend_from(&mut self, other: &[Diagnostic]) {
        self.entries.extend_from_slice(other);
    }

    /// All recorded diagnostics in order
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the list
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

//! Heading numbering: templates, formats and counters
//!
//! The catalog holds the document's numbering templates, the counter engine
//! reproduces the number Word shows for each heading, falling back to a
//! document-wide decimal counter when no template is bound.

mod catalog;
mod counter;
mod format;

pub use catalog::{
    default_template, LevelDefinition, NumberingCatalog, NumberingDefinition, RawInstance,
    RawLevel, RawNumbering, RawTemplate, RestartPolicy, MAX_LEVELS,
};
pub use counter::{CounterEngine, CounterState, NumberingKey, NumberingRef};
pub use format::{to_roman, Alphabet, FormatParseError, NumberFormat};

#[cfg(test)]
pub(crate) use catalog::tests::heading_numbering;

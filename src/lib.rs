use thiserror::Error;

/// Hierarchical visual vocabulary loaded from the DBoW2 text format.
pub mod vocab;
pub use vocab::{Node, Vocabulary};

/// Sparse bag-of-words histogram for a single frame.
pub mod bow;
pub use bow::BowVector;

/// Similarity scoring between bag-of-words histograms.
pub mod score;
pub use score::{L1Scorer, Scorer};

/// Identifier of a word (leaf) in the vocabulary.
///
/// Word ids are assigned sequentially in file order while the vocabulary
/// is loaded, so they are stable for the lifetime of a `Vocabulary`.
pub type WordId = u64;

/// Weight attached to a word.
///
/// On a vocabulary leaf this is the word's IDF weight, fixed at load
/// time. In a [`BowVector`] it is the accumulated TF-style weight of the
/// word in one frame.
pub type WordWeight = f64;

pub type Result<T> = std::result::Result<T, BowErr>;

#[derive(Error, Debug)]
pub enum BowErr {
    #[error("Io Error")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "bincode")]
    #[error("Vocabulary Serialization Error")]
    Bincode(#[from] bincode::Error),
    #[error("Empty vocabulary file")]
    EmptyVocabulary,
    #[error("Invalid vocabulary header: expected 4 metadata fields, found {0}")]
    HeaderFieldCount(usize),
    #[error("Unable to parse metadata field {name}: '{value}' - expected integer")]
    HeaderFieldParse { name: &'static str, value: String },
    #[error("Unsupported metadata field {name}: value {value} outside {min}..={max}")]
    UnsupportedMetadata {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Line {line}: node entry has {found} fields, expected at least 3")]
    NodeFieldCount { line: usize, found: usize },
    #[error("Line {line}: parent id {parent} does not reference an existing node")]
    UnknownParent { line: usize, parent: usize },
    #[error("Line {line}: unable to parse {name}: '{value}'")]
    NodeFieldParse {
        line: usize,
        name: &'static str,
        value: String,
    },
}

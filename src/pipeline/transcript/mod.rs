pub mod types;
pub mod sanitize;
pub mod patterns;
pub mod extractor;
pub mod values;
pub mod confidence;
pub mod orchestrator;
pub mod samples;

pub use types::*;
pub use sanitize::normalize_transcript;
pub use patterns::{PatternLibrary, RuleKind, RuleScope, RuleSpec};
pub use extractor::{extract, extract_vital, extract_vital_with, extract_with, split_list_items};
pub use values::{FieldValue, VitalReading, VitalUnit};
pub use confidence::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Pattern {index} for field {field} failed to compile: {source}")]
    PatternCompilation {
        field: FieldId,
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("Pattern {index} for field {field} has no capture group {capture}")]
    CaptureIndex {
        field: FieldId,
        index: usize,
        capture: usize,
    },

    #[error("Descriptive fallback ordered before a labelled rule for field {field}")]
    RuleOrder { field: FieldId },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid parser option: {0}")]
    InvalidOption(String),
}

//! Structured error types for the report paginator.
//!
//! Pagination itself cannot fail once a profile is validated. Errors come
//! from the edges: parsing records and profiles, looking up records in an
//! entity store, and uploading files.

use thiserror::Error;

/// The unified error type returned by all public laudo API functions.
#[derive(Debug, Error)]
pub enum LaudoError {
    /// JSON input failed to parse as a report, record or profile.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A pagination profile holds values the packer cannot work with.
    #[error("Invalid pagination profile: {0}")]
    InvalidProfile(String),
    /// A record id does not exist in the entity store.
    #[error("{entity} record not found: {id}")]
    NotFound { entity: String, id: String },
    /// The entity store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),
    /// A file upload failed.
    #[error("Upload error: {0}")]
    Upload(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LaudoError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LaudoError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the report schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LaudoError::Parse { source: e, hint }
    }
}

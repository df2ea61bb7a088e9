pub mod types;
pub mod source;
pub mod extractor;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Knowledge base parsing: {0}")]
    Parse(#[from] serde_json::Error),
}

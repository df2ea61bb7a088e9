pub mod fingerprint;
pub mod cache;
pub mod vector;
pub mod builder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

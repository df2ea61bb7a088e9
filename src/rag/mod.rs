pub mod types;
pub mod query;
pub mod prompt;
pub mod retrieval;
pub mod parser;
pub mod orchestrator;

use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

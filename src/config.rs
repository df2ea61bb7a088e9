use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "Clinsight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// OpenAI models used when none are configured explicitly.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o";

/// Vector dimension of `text-embedding-3-small`.
pub const EMBEDDING_DIM: usize = 1536;

/// Number of retrieved patterns fed into grounded generation.
pub const DEFAULT_TOP_K: usize = 10;

/// Default filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Clinsight/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Clinsight")
}

/// Default cache directory for derived artifacts (embedding matrices).
pub fn default_cache_dir() -> PathBuf {
    app_data_dir().join("cache")
}

/// Engine configuration: where the knowledge base lives, where derived
/// artifacts are cached, and how many patterns to retrieve per query.
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub knowledge_base_path: PathBuf,
    pub cache_dir: PathBuf,
    pub top_k: usize,
}

impl RagConfig {
    pub fn new(knowledge_base_path: impl AsRef<Path>) -> Self {
        Self {
            knowledge_base_path: knowledge_base_path.as_ref().to_path_buf(),
            cache_dir: default_cache_dir(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl AsRef<Path>) -> Self {
        self.cache_dir = cache_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }
}

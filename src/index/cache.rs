use std::path::{Path, PathBuf};

use super::vector::EmbeddingMatrix;
use super::IndexError;

/// On-disk cache of embedding matrices keyed by knowledge-source fingerprint.
///
/// The flat similarity index is reconstructed from the matrix on load, so the
/// matrix file is the serialized form of both artifacts. A corrupted or
/// missing entry is a cache miss, never an error; entries for superseded
/// fingerprints are left in place (allowed cache growth).
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("embeddings_{fingerprint}.json"))
    }

    /// Load the cached matrix for a fingerprint, or `None` on miss.
    pub fn load(&self, fingerprint: &str) -> Option<EmbeddingMatrix> {
        let path = self.entry_path(fingerprint);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_slice::<EmbeddingMatrix>(&bytes) {
            Ok(matrix) if matrix.is_consistent() => Some(matrix),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Inconsistent cache entry — treating as miss");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt cache entry — treating as miss");
                None
            }
        }
    }

    /// Persist a matrix for a fingerprint.
    ///
    /// Writes to a temp file and renames so a partially written entry is
    /// never observed by `load`.
    pub fn save(&self, fingerprint: &str, matrix: &EmbeddingMatrix) -> Result<(), IndexError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.entry_path(fingerprint);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec(matrix)?;
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;

        tracing::info!(
            fingerprint = %fingerprint,
            rows = matrix.rows(),
            "Saved embedding matrix to cache"
        );
        Ok(())
    }
}

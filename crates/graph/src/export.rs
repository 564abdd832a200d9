use extract::Triplet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const EXPORT_FILE_NAME: &str = "knowledge_graph_triplets.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no triplets to export")]
    NothingToExport,
    #[error("failed to serialize triplets: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pretty JSON (2-space indent) of the triplet list.
pub fn triplets_json(triplets: &[Triplet]) -> Result<String, ExportError> {
    if triplets.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    Ok(serde_json::to_string_pretty(triplets)?)
}

/// Writes `knowledge_graph_triplets.json` into `dir` and returns its path.
pub fn export_triplets(triplets: &[Triplet], dir: &Path) -> Result<PathBuf, ExportError> {
    let json = triplets_json(triplets)?;
    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, json).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

//! Local JSON schema file loader.

use async_trait::async_trait;
use perspective_core::Document;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{FetchError, SchemaLoader};

/// Reads a perspective schema from a JSON file.
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SchemaLoader for FileLoader {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<Document, FetchError> {
        debug!(path = %self.path.display(), "Reading schema file");

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| FetchError::InvalidJson(e.to_string()))?;

        Ok(Document::from_value(&value)?)
    }
}

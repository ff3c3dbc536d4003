//! Schema loaders for perspective.
//!
//! A loader produces a decoded [`Document`] or fails before the core ever
//! runs. Two implementations:
//! - [`FileLoader`] — a JSON schema file on disk
//! - [`CloudHealthClient`] — the CloudHealth perspective schema API

use async_trait::async_trait;
use perspective_core::Document;
use std::path::PathBuf;

pub mod cloudhealth;
pub mod file;

pub use cloudhealth::CloudHealthClient;
pub use file::FileLoader;

/// Anything that can yield a perspective schema document.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    /// Short name used in logs ("file", "cloudhealth").
    fn name(&self) -> &str;

    /// Load and decode the document.
    async fn load(&self) -> Result<Document, FetchError>;
}

/// Loader failures. The core is never invoked when one of these occurs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid API key. Please check your CloudHealth API key.")]
    Unauthorized,

    #[error("Permission denied. You may not have access to this Perspective.")]
    Forbidden,

    #[error("Perspective ID '{perspective_id}' not found.")]
    NotFound { perspective_id: String },

    #[error("Error fetching from API: {0}")]
    Network(String),

    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),

    #[error("Failed to read '{path}': {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Invalid JSON in file: {0}")]
    InvalidJson(String),

    #[error("Invalid perspective document: {0}")]
    InvalidDocument(#[from] perspective_core::Error),

    #[error("Loader not configured: {0}")]
    NotConfigured(String),
}

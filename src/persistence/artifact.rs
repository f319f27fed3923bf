use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::AggregateArtifact;
use crate::error::{GroupScanError, Result};

/// Destination of the finished artifact
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn persist(&self, artifact: &AggregateArtifact) -> Result<()>;
}

/// Writes the artifact as 4-space indented JSON, replacing the file
/// atomically via a `.tmp` sibling.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    path: PathBuf,
}

impl JsonFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render the artifact exactly as it is written to disk.
pub fn render_artifact(artifact: &AggregateArtifact) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    artifact.serialize(&mut ser)?;
    String::from_utf8(buf)
        .map_err(|e| GroupScanError::Internal(format!("artifact is not UTF-8: {}", e)))
}

#[async_trait]
impl ArtifactWriter for JsonFileWriter {
    async fn persist(&self, artifact: &AggregateArtifact) -> Result<()> {
        let body = render_artifact(artifact)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(
            "Wrote {} wiki entries to {}",
            artifact.extra.len(),
            self.path.display()
        );
        Ok(())
    }
}

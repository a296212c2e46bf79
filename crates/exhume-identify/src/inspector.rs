//! Read-only file-type inspection of on-disk artifacts.

use std::path::Path;

use async_trait::async_trait;
use exhume_common::{Error, Result};
use tokio::process::Command;

/// External file-type inspector whose output lines carry version metadata.
#[async_trait]
pub trait FileInspector: Send + Sync {
    /// Inspect one artifact file and return the inspector's free-text output.
    async fn inspect(&self, path: &Path) -> Result<String>;
}

/// Production inspector: shells out to `file(1)`.
pub struct FileTypeCommand;

#[async_trait]
impl FileInspector for FileTypeCommand {
    async fn inspect(&self, path: &Path) -> Result<String> {
        let output = Command::new("file")
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::Detection(format!("file inspector failed on {}: {e}", path.display())))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

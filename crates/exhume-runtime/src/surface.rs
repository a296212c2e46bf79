//! One-shot command execution inside a running environment.

use async_trait::async_trait;
use exhume_common::Result;

/// Captured result of a one-shot in-container command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

/// Exec surface of a running environment.
///
/// Both the readiness ping and the dump commands go through this seam, so
/// everything above the container API is testable with a scripted fake.
#[async_trait]
pub trait ExecSurface: Send + Sync {
    /// Run a command and capture its exit status plus combined output.
    async fn exec_read(&self, name: &str, argv: &[&str]) -> Result<ExecOutput>;

    /// Run a command for its exit status only.
    async fn exec_run(&self, name: &str, argv: &[&str]) -> Result<i64> {
        Ok(self.exec_read(name, argv).await?.exit_code)
    }
}

//! Error types for exhume.
//!
//! Whether a failure aborts the run is a property of the error kind, not of
//! the call site: identification misses fall back to manual entry, stale
//! container cleanup and post-stop removal degrade to warnings, a single
//! failed export is recorded in the batch outcome, and everything touching
//! the environment before it is usable is fatal.

use thiserror::Error;

/// Result type alias for exhume operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for exhume operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No version signature could be recovered from the data directory.
    #[error("version detection failed: {0}")]
    Detection(String),

    /// Image existence check or pull failed.
    #[error("image acquisition failed for {image}: {cause}")]
    ImageAcquisition { image: String, cause: String },

    /// A leftover container with the deterministic name could not be removed.
    #[error("stale container cleanup failed for {name}: {cause}")]
    Reconciliation { name: String, cause: String },

    /// The container runtime rejected creation.
    #[error("container creation rejected for {name}: {cause}")]
    Creation { name: String, cause: String },

    /// The container never reported a running state within its deadline.
    #[error("container {name} did not reach running state within {timeout_secs}s")]
    StartTimeout { name: String, timeout_secs: u64 },

    /// The database engine never answered the readiness ping.
    #[error("engine in {name} not ready after {attempts} attempts: {last_error}")]
    ReadinessTimeout {
        name: String,
        attempts: u32,
        last_error: String,
    },

    /// A one-shot command inside the container failed to execute.
    #[error("exec of `{command}` in {name} failed: {cause}")]
    Exec {
        name: String,
        command: String,
        cause: String,
    },

    /// One database's export failed; recorded per item, never aborts the batch.
    #[error("dump of database {database} failed: {cause}")]
    Dump { database: String, cause: String },

    /// Graceful stop failed.
    #[error("graceful stop of {name} failed: {cause}")]
    Stop { name: String, cause: String },

    /// Post-stop removal failed; the container is left behind and logged.
    #[error("container removal failed for {name}: {cause}")]
    Teardown { name: String, cause: String },

    /// Irrecoverable configuration error (unsupported platform, bad input).
    #[error("configuration error: {0}")]
    Config(String),

    /// Container engine API error outside the stages above.
    #[error("container API error: {0}")]
    Api(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error kind aborts the run.
    ///
    /// Non-fatal kinds: detection misses (manual-entry fallback), stale
    /// container removal failures, post-stop removal failures, and per-item
    /// dump failures.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Detection(_)
                | Error::Reconciliation { .. }
                | Error::Teardown { .. }
                | Error::Dump { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_fatal_kinds() {
        let errors = [
            Error::Detection("no artifacts".into()),
            Error::Reconciliation {
                name: "exhume_mysql5.6".into(),
                cause: "in use".into(),
            },
            Error::Teardown {
                name: "exhume_mysql5.6".into(),
                cause: "in use".into(),
            },
            Error::Dump {
                database: "shop".into(),
                cause: "exit 2".into(),
            },
        ];
        for err in &errors {
            assert!(!err.is_fatal(), "{err} should not be fatal");
        }
    }

    #[test]
    fn test_fatal_kinds() {
        let errors = [
            Error::ImageAcquisition {
                image: "mysql:5.6".into(),
                cause: "pull denied".into(),
            },
            Error::Creation {
                name: "exhume_mysql5.6".into(),
                cause: "invalid mount".into(),
            },
            Error::StartTimeout {
                name: "exhume_mysql5.6".into(),
                timeout_secs: 60,
            },
            Error::ReadinessTimeout {
                name: "exhume_mysql5.6".into(),
                attempts: 30,
                last_error: "ping exited with status 1".into(),
            },
            Error::Stop {
                name: "exhume_mysql5.6".into(),
                cause: "timeout".into(),
            },
            Error::Config("unsupported platform: windows".into()),
        ];
        for err in &errors {
            assert!(err.is_fatal(), "{err} should be fatal");
        }
    }

    #[test]
    fn test_error_context_in_message() {
        let err = Error::ReadinessTimeout {
            name: "exhume_mariadb10.6".into(),
            attempts: 30,
            last_error: "ping exited with status 1".into(),
        };
        let text = err.to_string();
        assert!(text.contains("exhume_mariadb10.6"));
        assert!(text.contains("30"));
        assert!(text.contains("ping exited with status 1"));
    }
}

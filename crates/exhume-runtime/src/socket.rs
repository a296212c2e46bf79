//! Container-engine socket resolution.
//!
//! The API socket location depends on the host platform: rootless Podman on
//! Linux exposes it under the XDG runtime directory, while macOS routes it
//! through the `podman machine` VM. Anything else is an irrecoverable
//! configuration error. `EXHUME_RUNTIME_SOCKET` overrides detection
//! entirely (a plain path also works for Docker's `/var/run/docker.sock`).

use exhume_common::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Resolve the engine API socket path for this host.
pub async fn resolve_socket() -> Result<String> {
    if let Ok(socket) = std::env::var("EXHUME_RUNTIME_SOCKET") {
        debug!("using socket from EXHUME_RUNTIME_SOCKET: {socket}");
        return Ok(socket);
    }

    match std::env::consts::OS {
        "linux" => {
            let runtime_dir = std::env::var("XDG_RUNTIME_DIR").map_err(|_| {
                Error::Config(
                    "XDG_RUNTIME_DIR is not set; cannot locate the podman socket \
                     (set EXHUME_RUNTIME_SOCKET to override)"
                        .to_string(),
                )
            })?;
            Ok(format!("{runtime_dir}/podman/podman.sock"))
        }
        "macos" => machine_socket().await,
        other => Err(Error::Config(format!(
            "unsupported platform: {other}; try linux or macos instead"
        ))),
    }
}

/// Ask `podman machine inspect` where the VM exposes its API socket.
async fn machine_socket() -> Result<String> {
    let output = Command::new("podman")
        .args(["machine", "inspect"])
        .output()
        .await
        .map_err(|e| Error::Config(format!("podman machine inspect failed: {e}")))?;

    if !output.status.success() {
        return Err(Error::Config(format!(
            "podman machine inspect exited with {}",
            output.status
        )));
    }

    let machines: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::Config(format!("unreadable podman machine inspect output: {e}")))?;

    machines
        .pointer("/0/ConnectionInfo/PodmanSocket/Path")
        .and_then(|path| path.as_str())
        .map(|path| path.to_string())
        .ok_or_else(|| {
            Error::Config("podman machine inspect reported no socket path".to_string())
        })
}

//! Container lifecycle management over the engine API.

use std::path::PathBuf;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::{Docker, API_DEFAULT_VERSION};
use exhume_common::{Error, ImageTag, Result};
use futures::StreamExt;
use tokio::time::{sleep, timeout, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::RuntimeTimeouts;
use crate::surface::{ExecOutput, ExecSurface};

/// Fixed path the data directory is bound to inside the container.
pub const MOUNT_TARGET: &str = "/var/lib/mysql";

/// Environment variable enabling the empty-credential bootstrap.
const BOOTSTRAP_ENV: &str = "MYSQL_ALLOW_EMPTY_PASSWORD=True";

/// Startup flag disabling privilege-table enforcement. The data directory
/// predates any credential known to this tool.
const BOOTSTRAP_ARG: &str = "--skip-grant-tables";

/// Architecture the engine images are pulled for.
const PULL_PLATFORM: &str = "linux/amd64";

/// Poll interval while waiting for the container to report running.
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Immutable description of the one container a run owns.
#[derive(Debug, Clone)]
pub struct EnvironmentSpec {
    pub image: ImageTag,
    /// Derived deterministically from the image tag so repeated runs against
    /// the same tag can find and reconcile a leftover container.
    pub container_name: String,
    pub data_dir: PathBuf,
    pub owner_uid: u32,
}

impl EnvironmentSpec {
    pub fn new(image: ImageTag, data_dir: PathBuf, owner_uid: u32) -> Self {
        let container_name = image.container_name();
        Self {
            image,
            container_name,
            data_dir,
            owner_uid,
        }
    }

    /// Spec bound to the invoking user's identity.
    pub fn for_current_user(image: ImageTag, data_dir: PathBuf) -> Self {
        Self::new(image, data_dir, nix::unistd::getuid().as_raw())
    }

    /// Bind-mount string: read-write with SELinux relabeling.
    fn bind(&self) -> String {
        format!("{}:{}:rw,z", self.data_dir.display(), MOUNT_TARGET)
    }
}

/// Lifecycle manager for the disposable engine container.
pub struct ExecutionEnvironment {
    docker: Docker,
    timeouts: RuntimeTimeouts,
}

impl ExecutionEnvironment {
    /// Connect to the engine API socket. Accepts a plain path or a
    /// `unix://`-prefixed address.
    pub fn connect(socket: &str, timeouts: RuntimeTimeouts) -> Result<Self> {
        let path = socket
            .trim_start_matches("unix://")
            .trim_start_matches("unix:");
        let docker = Docker::connect_with_socket(path, 120, API_DEFAULT_VERSION)
            .map_err(|e| Error::Api(format!("cannot connect to engine socket {path}: {e}")))?;
        Ok(Self { docker, timeouts })
    }

    /// Ensure the image is locally present, pulling it if absent. Pull
    /// failures and non-not-found check failures are both fatal; transient
    /// registry errors surface directly rather than being retried.
    pub async fn ensure_image(&self, image: &ImageTag) -> Result<()> {
        let reference = image.registry_qualified();
        let acquisition = |cause: String| Error::ImageAcquisition {
            image: image.to_string(),
            cause,
        };

        match timeout(
            self.timeouts.image_check(),
            self.docker.inspect_image(&reference),
        )
        .await
        {
            Ok(Ok(_)) => {
                debug!("image {reference} already present");
                return Ok(());
            }
            Ok(Err(e)) if is_not_found(&e) => {}
            Ok(Err(e)) => return Err(acquisition(e.to_string())),
            Err(_) => {
                return Err(acquisition(format!(
                    "existence check timed out after {:?}",
                    self.timeouts.image_check()
                )))
            }
        }

        info!("pulling {reference} for {PULL_PLATFORM}");
        let options = CreateImageOptions {
            from_image: reference.clone(),
            platform: PULL_PLATFORM.to_string(),
            ..Default::default()
        };
        let pull = async {
            let mut progress = self.docker.create_image(Some(options), None, None);
            while let Some(step) = progress.next().await {
                let step = step.map_err(|e| acquisition(e.to_string()))?;
                if let Some(status) = step.status {
                    debug!("pull: {status}");
                }
            }
            Ok::<(), Error>(())
        };
        match timeout(self.timeouts.image_pull(), pull).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(acquisition(format!(
                    "pull timed out after {:?}",
                    self.timeouts.image_pull()
                )))
            }
        }
        info!("image {reference} pulled");
        Ok(())
    }

    /// Remove a leftover container under the deterministic name, if any.
    /// Removal is best-effort: a failure is logged and the run continues,
    /// since a name collision at create time surfaces a clearer error.
    /// Calling this when no such container exists is a no-op.
    pub async fn reconcile(&self, name: &str) -> Result<()> {
        match timeout(
            self.timeouts.image_check(),
            self.docker.inspect_container(name, None),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if is_not_found(&e) => {
                debug!("no leftover container named {name}");
                return Ok(());
            }
            Ok(Err(e)) => {
                return Err(Error::Api(format!("existence check for {name} failed: {e}")))
            }
            Err(_) => return Err(Error::Api(format!("existence check for {name} timed out"))),
        }

        info!("removing leftover container {name}");
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match timeout(
            self.timeouts.remove(),
            self.docker.remove_container(name, Some(options)),
        )
        .await
        {
            Ok(Ok(())) => info!("leftover container {name} removed"),
            Ok(Err(e)) => warn!(
                "{}",
                Error::Reconciliation {
                    name: name.to_string(),
                    cause: e.to_string(),
                }
            ),
            Err(_) => warn!(
                "{}",
                Error::Reconciliation {
                    name: name.to_string(),
                    cause: "removal timed out".to_string(),
                }
            ),
        }
        Ok(())
    }

    /// Create the container: data directory bind-mounted read-write, engine
    /// bootstrapped with privilege tables disabled and an empty credential,
    /// interactive terminal allocated, running as the invoking user so dump
    /// artifacts land on the host with that ownership.
    pub async fn create(&self, spec: &EnvironmentSpec) -> Result<()> {
        let options = CreateContainerOptions {
            name: spec.container_name.clone(),
            platform: None,
        };
        let config = Config {
            image: Some(spec.image.registry_qualified()),
            cmd: Some(vec![BOOTSTRAP_ARG.to_string()]),
            env: Some(vec![BOOTSTRAP_ENV.to_string()]),
            tty: Some(true),
            user: Some(spec.owner_uid.to_string()),
            host_config: Some(HostConfig {
                binds: Some(vec![spec.bind()]),
                ..Default::default()
            }),
            ..Default::default()
        };

        match timeout(
            self.timeouts.create(),
            self.docker.create_container(Some(options), config),
        )
        .await
        {
            Ok(Ok(_)) => {
                info!("container {} created", spec.container_name);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Creation {
                name: spec.container_name.clone(),
                cause: e.to_string(),
            }),
            Err(_) => Err(Error::Creation {
                name: spec.container_name.clone(),
                cause: "creation timed out".to_string(),
            }),
        }
    }

    /// Start the container and block until the runtime reports it running.
    /// Running is not readiness; hand off to a readiness probe afterwards.
    pub async fn start(&self, name: &str) -> Result<()> {
        timeout(
            self.timeouts.start(),
            self.docker
                .start_container(name, None::<StartContainerOptions<String>>),
        )
        .await
        .map_err(|_| Error::StartTimeout {
            name: name.to_string(),
            timeout_secs: self.timeouts.start_secs,
        })?
        .map_err(|e| Error::Api(format!("starting {name} failed: {e}")))?;
        info!("container {name} started");
        self.wait_running(name).await
    }

    async fn wait_running(&self, name: &str) -> Result<()> {
        let deadline = Instant::now() + self.timeouts.start();
        loop {
            let state = timeout(
                self.timeouts.image_check(),
                self.docker.inspect_container(name, None),
            )
            .await
            .map_err(|_| Error::Api(format!("state check for {name} timed out")))?
            .map_err(|e| Error::Api(format!("state check for {name} failed: {e}")))?;

            if state.state.and_then(|s| s.running).unwrap_or(false) {
                debug!("container {name} is running");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::StartTimeout {
                    name: name.to_string(),
                    timeout_secs: self.timeouts.start_secs,
                });
            }
            sleep(STATE_POLL_INTERVAL).await;
        }
    }

    /// Request a graceful stop. Failure here is surfaced to the caller,
    /// unlike removal which is best-effort.
    pub async fn stop(&self, name: &str) -> Result<()> {
        info!("stopping container {name}");
        let grace_secs = self.timeouts.stop_secs;
        let options = StopContainerOptions {
            t: grace_secs as i64,
        };
        // The API call returns only after the engine's own grace period.
        let call_budget = self.timeouts.stop() + Duration::from_secs(5);
        match timeout(call_budget, self.docker.stop_container(name, Some(options))).await {
            Ok(Ok(())) => {
                info!("container {name} stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Stop {
                name: name.to_string(),
                cause: e.to_string(),
            }),
            Err(_) => Err(Error::Stop {
                name: name.to_string(),
                cause: format!("no response within {call_budget:?}"),
            }),
        }
    }

    /// Remove the container. The returned error kind is non-fatal; callers
    /// log it and continue.
    pub async fn teardown(&self, name: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match timeout(
            self.timeouts.remove(),
            self.docker.remove_container(name, Some(options)),
        )
        .await
        {
            Ok(Ok(())) => {
                info!("container {name} removed");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Teardown {
                name: name.to_string(),
                cause: e.to_string(),
            }),
            Err(_) => Err(Error::Teardown {
                name: name.to_string(),
                cause: "removal timed out".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ExecSurface for ExecutionEnvironment {
    async fn exec_read(&self, name: &str, argv: &[&str]) -> Result<ExecOutput> {
        let command = argv.join(" ");
        let exec_err = |cause: String| Error::Exec {
            name: name.to_string(),
            command: command.clone(),
            cause,
        };

        let exec = self
            .docker
            .create_exec(
                name,
                CreateExecOptions {
                    cmd: Some(argv.iter().map(|s| s.to_string()).collect()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| exec_err(e.to_string()))?;

        let mut collected = String::new();
        match self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| exec_err(e.to_string()))?
        {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(chunk) = output.next().await {
                    let chunk = chunk.map_err(|e| exec_err(e.to_string()))?;
                    collected.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
                }
            }
            StartExecResults::Detached => {}
        }

        // The output stream closing does not guarantee the process was reaped.
        let mut state = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| exec_err(e.to_string()))?;
        while state.running == Some(true) {
            sleep(Duration::from_millis(100)).await;
            state = self
                .docker
                .inspect_exec(&exec.id)
                .await
                .map_err(|e| exec_err(e.to_string()))?;
        }

        let exit_code = state.exit_code.unwrap_or(-1);
        debug!("exec `{command}` in {name} exited with {exit_code}");
        Ok(ExecOutput {
            exit_code,
            output: collected,
        })
    }
}

fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

//! Run sequencing: identify, provision, dump, tear down.
//!
//! Stages run strictly in order. Once the container has been created, every
//! exit path either stops and removes it or logs exactly what was left
//! behind; a leaked running container is a defect, not an accepted outcome.

use std::path::Path;
use std::sync::Arc;

use exhume_common::{Chooser, Engine, Error, ImageTag, Result};
use exhume_dump::{DumpExecutor, DumpOutcome};
use exhume_identify::{FileTypeCommand, VersionIdentifier};
use exhume_runtime::{
    resolve_socket, EnvironmentSpec, ExecutionEnvironment, ReadinessProbe, RuntimeTimeouts,
};
use tracing::{error, info, warn};

use crate::paths;

const DETECT_AUTOMATICALLY: &str = "Try to determine automatically";
const ENTER_MANUALLY: &str = "Enter manually";
const REMOVE_CONTAINER: &str = "Remove the container";
const KEEP_CONTAINER: &str = "Keep it for inspection";

pub struct RunOptions {
    pub data_dir: Option<String>,
    pub socket: Option<String>,
    pub keep_permissions: bool,
}

pub async fn run(options: RunOptions, chooser: Arc<dyn Chooser>) -> Result<()> {
    let raw_dir = match options.data_dir {
        Some(path) => path,
        None => chooser.text_input(
            "Path to the database data directory root (eg /var/lib/mysql)",
            "",
        )?,
    };
    let data_dir = paths::resolve_data_dir(&raw_dir)?;
    info!("data directory: {}", data_dir.display());

    if !options.keep_permissions {
        paths::relax_permissions(&data_dir);
    }

    let image = select_image(&data_dir, chooser.clone()).await?;
    info!("using image {image}");

    let timeouts = RuntimeTimeouts::from_env();
    let socket = match options.socket {
        Some(socket) => socket,
        None => resolve_socket().await?,
    };
    let env = ExecutionEnvironment::connect(&socket, timeouts.clone())?;
    let spec = EnvironmentSpec::for_current_user(image, data_dir);

    env.ensure_image(&spec.image).await?;
    env.reconcile(&spec.container_name).await?;
    env.create(&spec).await?;

    // The container exists from here on; never leak it on an error path.
    match dump_in_container(&env, &spec, chooser.clone(), &timeouts).await {
        Ok(()) => finish(&env, &spec, chooser).await,
        Err(e) => {
            cleanup_after_failure(&env, &spec.container_name).await;
            Err(e)
        }
    }
}

async fn dump_in_container(
    env: &ExecutionEnvironment,
    spec: &EnvironmentSpec,
    chooser: Arc<dyn Chooser>,
    timeouts: &RuntimeTimeouts,
) -> Result<()> {
    env.start(&spec.container_name).await?;
    ReadinessProbe::from_timeouts(timeouts)
        .wait_until_ready(env, &spec.container_name)
        .await?;

    let outcomes = DumpExecutor::new(chooser)
        .run(env, &spec.container_name)
        .await?;
    report(&outcomes);
    Ok(())
}

fn report(outcomes: &[DumpOutcome]) {
    let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => info!("{}.sql written", outcome.database),
            Err(e) => error!("{e}"),
        }
    }
    info!("{succeeded} of {} selected databases dumped", outcomes.len());
}

async fn finish(
    env: &ExecutionEnvironment,
    spec: &EnvironmentSpec,
    chooser: Arc<dyn Chooser>,
) -> Result<()> {
    env.stop(&spec.container_name).await?;

    let decision = chooser.choose(
        &format!("Remove the dump container {}?", spec.container_name),
        &[REMOVE_CONTAINER.to_string(), KEEP_CONTAINER.to_string()],
    )?;
    if decision == KEEP_CONTAINER {
        info!("keeping container {}", spec.container_name);
        return Ok(());
    }
    if let Err(e) = env.teardown(&spec.container_name).await {
        if e.is_fatal() {
            return Err(e);
        }
        warn!("{e}");
    }
    Ok(())
}

/// Stop and remove best-effort after a failure; the original error wins.
async fn cleanup_after_failure(env: &ExecutionEnvironment, name: &str) {
    warn!("cleaning up container {name} after failure");
    if let Err(e) = env.stop(name).await {
        warn!("{e}");
    }
    match env.teardown(name).await {
        Ok(()) => info!("container {name} removed"),
        Err(e) => warn!("container {name} left behind: {e}"),
    }
}

async fn select_image(data_dir: &Path, chooser: Arc<dyn Chooser>) -> Result<ImageTag> {
    let method = chooser.choose(
        "Database version",
        &[DETECT_AUTOMATICALLY.to_string(), ENTER_MANUALLY.to_string()],
    )?;

    if method == DETECT_AUTOMATICALLY {
        let identifier =
            VersionIdentifier::new(data_dir, Arc::new(FileTypeCommand), chooser.clone());
        match identifier.identify().await? {
            Some(tag) => return Ok(tag),
            None => warn!(
                "{}",
                Error::Detection(format!(
                    "no version signature found under {}",
                    data_dir.display()
                ))
            ),
        }
    }
    manual_image(chooser.as_ref())
}

fn manual_image(chooser: &dyn Chooser) -> Result<ImageTag> {
    let engine: Engine = chooser
        .choose(
            "Database type",
            &["mariadb".to_string(), "mysql".to_string()],
        )?
        .parse()?;
    let version = chooser.text_input("Database version major.minor, eg. 5.5, 8.3, 10.11", "")?;
    ImageTag::from_parts(engine, &version)
}

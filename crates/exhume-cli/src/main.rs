//! exhume: logical dumps out of an unidentified database data directory.
//!
//! Identifies which MySQL/MariaDB release wrote a data directory, then runs
//! exactly that release in a disposable container against the directory to
//! export consistent `.sql` dumps.

use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod orchestrator;
mod paths;
mod prompt;

use orchestrator::RunOptions;
use prompt::TerminalChooser;

#[derive(Parser, Debug)]
#[command(
    name = "exhume",
    about = "Containerized logical dumps from an unidentified MySQL/MariaDB data directory",
    version
)]
struct Cli {
    /// Path to the database data directory root (eg /var/lib/mysql)
    data_dir: Option<String>,

    /// Container-engine API socket (overrides platform detection)
    #[arg(long, env = "EXHUME_RUNTIME_SOCKET")]
    socket: Option<String>,

    /// Leave the data directory's permissions untouched
    #[arg(long)]
    keep_permissions: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = RunOptions {
        data_dir: cli.data_dir,
        socket: cli.socket,
        keep_permissions: cli.keep_permissions,
    };

    if let Err(e) = orchestrator::run(options, Arc::new(TerminalChooser::new())).await {
        error!("run failed: {e}");
        std::process::exit(1);
    }
}

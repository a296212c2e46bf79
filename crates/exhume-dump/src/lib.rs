//! Logical dump execution against a ready environment.
//!
//! Enumerates the logical databases the engine reports, lets the chooser
//! pick the subset to export, and runs one export per selection. Exports
//! are independent: one failure is recorded in its outcome and the batch
//! carries on, so the result is always a per-database outcome list rather
//! than a single aggregate success.

use std::sync::Arc;

use exhume_common::{Chooser, Error, Result};
use exhume_runtime::{ExecSurface, MOUNT_TARGET};
use tracing::{info, warn};

/// Result of one database's export attempt.
#[derive(Debug)]
pub struct DumpOutcome {
    pub database: String,
    pub result: Result<()>,
}

impl DumpOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs the per-database export batch inside a ready environment.
pub struct DumpExecutor {
    chooser: Arc<dyn Chooser>,
}

impl DumpExecutor {
    pub fn new(chooser: Arc<dyn Chooser>) -> Self {
        Self { chooser }
    }

    /// List, select, and export. Each selected database lands as
    /// `<name>.sql` under the bind-mounted path, so the artifacts stay on
    /// the host after teardown.
    pub async fn run(&self, surface: &dyn ExecSurface, name: &str) -> Result<Vec<DumpOutcome>> {
        let databases = self.list_databases(surface, name).await?;
        if databases.is_empty() {
            warn!("engine in {name} reports no databases");
            return Ok(Vec::new());
        }

        let selected = self
            .chooser
            .multi_choose("Select databases to dump", &databases)?;
        if selected.is_empty() {
            info!("no databases selected, nothing to dump");
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::with_capacity(selected.len());
        for database in selected {
            info!("dumping {database}");
            let result = self.dump_one(surface, name, &database).await;
            if let Err(e) = &result {
                warn!("{e}");
            }
            outcomes.push(DumpOutcome { database, result });
        }
        Ok(outcomes)
    }

    async fn list_databases(&self, surface: &dyn ExecSurface, name: &str) -> Result<Vec<String>> {
        let listing = surface
            .exec_read(
                name,
                &["mysql", "-u", "root", "-B", "-N", "-e", "SHOW DATABASES;"],
            )
            .await?;
        if listing.exit_code != 0 {
            return Err(Error::Exec {
                name: name.to_string(),
                command: "SHOW DATABASES".to_string(),
                cause: format!("listing exited with status {}", listing.exit_code),
            });
        }
        Ok(listing
            .output
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }

    /// One export, snapshot-consistent and without locking readers.
    async fn dump_one(&self, surface: &dyn ExecSurface, name: &str, database: &str) -> Result<()> {
        let script = format!(
            "mysqldump --single-transaction --quick --lock-tables=false {database} \
             > {MOUNT_TARGET}/{database}.sql"
        );
        match surface.exec_run(name, &["sh", "-c", &script]).await {
            Ok(0) => Ok(()),
            Ok(code) => Err(Error::Dump {
                database: database.to_string(),
                cause: format!("export exited with status {code}"),
            }),
            Err(e) => Err(Error::Dump {
                database: database.to_string(),
                cause: e.to_string(),
            }),
        }
    }
}

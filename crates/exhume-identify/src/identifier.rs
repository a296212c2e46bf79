//! Directory scanning and signature reconciliation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use exhume_common::{Chooser, ImageTag, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::inspector::FileInspector;
use crate::signature::{parse_line, VersionSignature};

/// Synthetic option presented alongside the tallied signatures.
pub const TRY_ANOTHER_METHOD: &str = "None of these, try another method";

/// Artifact-file families scanned for version metadata, in strategy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactPattern {
    /// Table definition files (`*.frm`), the primary structural metadata.
    TableDefinitions,
    /// Sequential binary log files (`binlog.000003`, `mysql-bin.000001`, ...).
    BinaryLogs,
}

impl ArtifactPattern {
    /// Strategy order: structural metadata first, logs only as fallback.
    pub const STRATEGY_ORDER: [ArtifactPattern; 2] =
        [ArtifactPattern::TableDefinitions, ArtifactPattern::BinaryLogs];

    pub fn describe(&self) -> &'static str {
        match self {
            ArtifactPattern::TableDefinitions => "table definition files (*.frm)",
            ArtifactPattern::BinaryLogs => "binary log files",
        }
    }

    /// Whether a file name belongs to this artifact family.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            ArtifactPattern::TableDefinitions => file_name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("frm")),
            ArtifactPattern::BinaryLogs => {
                file_name.rsplit_once('.').is_some_and(|(stem, seq)| {
                    matches!(stem, "binlog" | "mysql-bin" | "mariadb-bin")
                        && !seq.is_empty()
                        && seq.bytes().all(|b| b.is_ascii_digit())
                })
            }
        }
    }
}

/// Walks a data directory for version-bearing artifacts and reconciles the
/// observed signatures into one image tag via the injected chooser.
pub struct VersionIdentifier {
    root: PathBuf,
    inspector: Arc<dyn FileInspector>,
    chooser: Arc<dyn Chooser>,
}

impl VersionIdentifier {
    pub fn new(
        root: impl Into<PathBuf>,
        inspector: Arc<dyn FileInspector>,
        chooser: Arc<dyn Chooser>,
    ) -> Self {
        Self {
            root: root.into(),
            inspector,
            chooser,
        }
    }

    /// Try each artifact strategy in order; the first one that produces a
    /// user-accepted signature wins. `None` means every strategy was
    /// exhausted or deferred and the caller should fall through to manual
    /// entry.
    pub async fn identify(&self) -> Result<Option<ImageTag>> {
        for pattern in ArtifactPattern::STRATEGY_ORDER {
            let tally = self.scan(pattern).await;
            if tally.is_empty() {
                debug!(
                    "no version signatures from {} under {}",
                    pattern.describe(),
                    self.root.display()
                );
                continue;
            }
            match self.resolve(pattern, &tally)? {
                Some(signature) => {
                    info!("identified {} from {}", signature.image_tag(), pattern.describe());
                    return Ok(Some(signature.image_tag()));
                }
                None => continue,
            }
        }
        Ok(None)
    }

    /// Inspect every artifact of one family and tally parsed signatures,
    /// ordered by observation count descending. Inspection failures skip the
    /// file; they never abort the strategy.
    async fn scan(&self, pattern: ArtifactPattern) -> Vec<(VersionSignature, usize)> {
        let paths = self.matching_paths(pattern);
        debug!(
            "{} candidate {} under {}",
            paths.len(),
            pattern.describe(),
            self.root.display()
        );

        let mut counts: HashMap<VersionSignature, usize> = HashMap::new();
        for path in paths {
            let report = match self.inspector.inspect(&path).await {
                Ok(report) => report,
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            for line in report.lines() {
                if let Some(signature) = parse_line(line) {
                    debug!("{}: {}", path.display(), line.trim());
                    *counts.entry(signature).or_default() += 1;
                }
            }
        }

        let mut tally: Vec<_> = counts.into_iter().collect();
        // Highest count first; signature order breaks ties deterministically.
        tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        tally
    }

    fn matching_paths(&self, pattern: ArtifactPattern) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("walk error under {}: {e}", self.root.display());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| pattern.matches(&entry.file_name().to_string_lossy()))
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();
        paths
    }

    /// Present the tally plus the synthetic fall-through option. Even a
    /// single candidate is presented, so accepting a detection is always an
    /// explicit step.
    fn resolve(
        &self,
        pattern: ArtifactPattern,
        tally: &[(VersionSignature, usize)],
    ) -> Result<Option<VersionSignature>> {
        let mut options: Vec<String> = tally
            .iter()
            .map(|(signature, count)| {
                let unit = if *count == 1 { "artifact" } else { "artifacts" };
                format!("{} ({count} {unit})", signature.image_tag())
            })
            .collect();
        options.push(TRY_ANOTHER_METHOD.to_string());

        let prompt = format!("Version detected from {}", pattern.describe());
        let selected = self.chooser.choose(&prompt, &options)?;

        Ok(options
            .iter()
            .position(|option| *option == selected)
            .filter(|&index| index < tally.len())
            .map(|index| tally[index].0))
    }
}

impl std::fmt::Debug for VersionIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionIdentifier")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

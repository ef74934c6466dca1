use std::path::{Path, PathBuf};

use crate::classify::Classifier;
use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::reclaim::{Reclaim, Reclaimer};
use crate::registry::{StorageTopology, TopologyRegistry};
use crate::report::{CleanupReport, Disposition, ReportBuilder};
use crate::strategy::{ExistenceStrategy, ExistenceVerdict};
use crate::walker::{TreeWalker, WalkItem};

/// Walks a sidecar tree, asks the strategy about each sidecar and reclaims
/// the orphans.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    classifier: Classifier,
    reclaimer: Reclaimer,
    follow_links: bool,
    excluded: Vec<PathBuf>,
}

impl ReconciliationEngine {
    pub fn new(classifier: Classifier, reclaimer: Reclaimer) -> Self {
        Self {
            classifier,
            reclaimer,
            follow_links: false,
            excluded: Vec::new(),
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        let reclaimer = if config.dry_run {
            Reclaimer::dry_run()
        } else {
            Reclaimer::new()
        };
        Self::new(Classifier::new(config.suffix.clone()), reclaimer)
            .follow_links(config.follow_links)
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Directories under the walk root to leave alone.
    pub fn exclude<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.excluded.extend(paths);
        self
    }

    /// Resolve `topology_id` through `registry` and run it with `config`.
    ///
    /// Stores of the other configured topologies that sit inside this root
    /// are pruned from the walk; their sidecars follow different rules.
    pub fn run_configured(
        registry: &TopologyRegistry,
        topology_id: &str,
        config: &SweepConfig,
    ) -> Result<CleanupReport> {
        let entry = registry.resolve(topology_id)?;
        config.validate()?;
        let root = entry.resolve_root(config)?;
        tracing::debug!(topology = entry.display_name, root = %root.display(), "Resolved topology");
        let strategy = entry.build_strategy(config)?;

        let other_roots = registry
            .entries()
            .filter(|other| other.id != entry.id)
            .filter_map(|other| (other.root)(config));
        let nested = nested_stores(&root, other_roots);
        for path in &nested {
            tracing::info!(path = %path.display(), "Excluding nested sidecar store");
        }

        Self::from_config(config)
            .exclude(nested)
            .run(entry.topology, &root, strategy.as_ref())
    }

    /// One full pass over `root`. Only an unusable root is an error; every
    /// other problem is counted in the report.
    pub fn run(
        &self,
        topology: StorageTopology,
        root: &Path,
        strategy: &dyn ExistenceStrategy,
    ) -> Result<CleanupReport> {
        self.run_with(topology, root, strategy, &self.reclaimer)
    }

    /// [`run`](Self::run) with a caller-supplied reclaimer.
    pub fn run_with(
        &self,
        topology: StorageTopology,
        root: &Path,
        strategy: &dyn ExistenceStrategy,
        reclaimer: &dyn Reclaim,
    ) -> Result<CleanupReport> {
        check_root(root)?;

        tracing::info!(
            topology = %topology,
            root = %root.display(),
            strategy = strategy.name(),
            dry_run = reclaimer.is_dry_run(),
            "Starting sidecar sweep"
        );

        let mut report = ReportBuilder::new(topology, root.to_path_buf(), reclaimer.is_dry_run());
        let walker = TreeWalker::new(self.classifier.clone(), topology)
            .follow_links(self.follow_links)
            .exclude(self.excluded.iter().cloned());

        for item in walker.walk(root) {
            match item {
                WalkItem::Directory(_) => report.directory(),
                WalkItem::Unreadable { path, reason } => {
                    tracing::warn!(path = %path.display(), %reason, "Skipping unreadable directory");
                    report.unreadable();
                }
                WalkItem::Sidecar(sidecar) => {
                    let disposition = match strategy.exists(&sidecar, root) {
                        ExistenceVerdict::Exists => {
                            tracing::debug!(path = %sidecar.path.display(), "Content present");
                            Disposition::Kept
                        }
                        ExistenceVerdict::Indeterminate(reason) => {
                            tracing::warn!(path = %sidecar.path.display(), %reason, "Keeping sidecar, evidence inconclusive");
                            Disposition::Skipped { reason }
                        }
                        ExistenceVerdict::Orphaned => match reclaimer.reclaim_detailed(&sidecar.path) {
                            Ok(bytes) => {
                                if reclaimer.is_dry_run() {
                                    tracing::info!(path = %sidecar.path.display(), "[dry-run] Would remove orphan");
                                } else {
                                    tracing::info!(path = %sidecar.path.display(), bytes, "Removed orphan");
                                }
                                Disposition::Removed { bytes }
                            }
                            Err(e) => {
                                tracing::warn!(path = %sidecar.path.display(), error = %e, "Failed to remove orphan");
                                Disposition::Failed
                            }
                        },
                    };
                    report.sidecar(sidecar.path, disposition);
                }
            }
        }

        let report = report.finish();
        tracing::info!("{}", report.summary());
        Ok(report)
    }
}

/// Members of `others` that lie strictly inside `root`, spelled under `root`
/// so the walker can match them against its own entry paths.
fn nested_stores(root: &Path, others: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let Ok(canonical_root) = root.canonicalize() else {
        return Vec::new();
    };
    others
        .into_iter()
        .filter_map(|other| {
            let canonical = other.canonicalize().ok()?;
            let relative = canonical.strip_prefix(&canonical_root).ok()?;
            if relative.as_os_str().is_empty() {
                return None;
            }
            Some(root.join(relative))
        })
        .collect()
}

fn check_root(root: &Path) -> Result<()> {
    let meta = std::fs::metadata(root).map_err(|e| Error::unusable_root(root, e))?;
    if !meta.is_dir() {
        return Err(Error::unusable_root(root, "not a directory"));
    }
    std::fs::read_dir(root).map_err(|e| Error::unusable_root(root, e))?;
    Ok(())
}

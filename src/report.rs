use std::path::PathBuf;

use crate::registry::StorageTopology;

/// What happened to one sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Content exists; left alone.
    Kept,
    /// Evidence was inconclusive; left alone.
    Skipped { reason: String },
    /// Orphan removed (or, in a dry run, would have been).
    Removed { bytes: u64 },
    /// Orphan that could not be removed.
    Failed,
}

/// One sidecar found during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarOutcome {
    pub path: PathBuf,
    pub disposition: Disposition,
}

/// Result of a single reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub topology: StorageTopology,
    pub root: PathBuf,
    pub dry_run: bool,
    pub directories_scanned: usize,
    pub unreadable_dirs: usize,
    pub sidecars_found: usize,
    pub sidecars_kept: usize,
    pub sidecars_removed: usize,
    pub sidecars_skipped: usize,
    pub sidecars_failed: usize,
    pub bytes_freed: u64,
    pub entries: Vec<SidecarOutcome>,
}

impl CleanupReport {
    pub fn display_name(&self) -> &'static str {
        self.topology.display_name()
    }

    /// One-line summary suitable for a notification.
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "would remove" } else { "removed" };
        format!(
            "{}: scanned {} directories, found {} sidecars, {verb} {}, skipped {}, failed {}",
            self.display_name(),
            self.directories_scanned,
            self.sidecars_found,
            self.sidecars_removed,
            self.sidecars_skipped,
            self.sidecars_failed,
        )
    }
}

/// Accumulates counters while a run is in progress.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    report: CleanupReport,
}

impl ReportBuilder {
    pub fn new(topology: StorageTopology, root: PathBuf, dry_run: bool) -> Self {
        Self {
            report: CleanupReport {
                topology,
                root,
                dry_run,
                directories_scanned: 0,
                unreadable_dirs: 0,
                sidecars_found: 0,
                sidecars_kept: 0,
                sidecars_removed: 0,
                sidecars_skipped: 0,
                sidecars_failed: 0,
                bytes_freed: 0,
                entries: Vec::new(),
            },
        }
    }

    pub fn directory(&mut self) {
        self.report.directories_scanned += 1;
    }

    pub fn unreadable(&mut self) {
        self.report.unreadable_dirs += 1;
    }

    pub fn sidecar(&mut self, path: PathBuf, disposition: Disposition) {
        let r = &mut self.report;
        r.sidecars_found += 1;
        match &disposition {
            Disposition::Kept => r.sidecars_kept += 1,
            Disposition::Skipped { .. } => r.sidecars_skipped += 1,
            Disposition::Removed { bytes } => {
                r.sidecars_removed += 1;
                r.bytes_freed += bytes;
            }
            Disposition::Failed => r.sidecars_failed += 1,
        }
        r.entries.push(SidecarOutcome { path, disposition });
    }

    pub fn finish(self) -> CleanupReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_dispositions() {
        let mut b = ReportBuilder::new(StorageTopology::CoLocated, "/books".into(), false);
        b.directory();
        b.directory();
        b.unreadable();
        b.sidecar("/books/a.sdr".into(), Disposition::Kept);
        b.sidecar("/books/b.sdr".into(), Disposition::Removed { bytes: 10 });
        b.sidecar("/books/c.sdr".into(), Disposition::Removed { bytes: 5 });
        b.sidecar(
            "/books/d.sdr".into(),
            Disposition::Skipped {
                reason: "x".into(),
            },
        );
        b.sidecar("/books/e.sdr".into(), Disposition::Failed);
        let r = b.finish();

        assert_eq!(r.directories_scanned, 2);
        assert_eq!(r.unreadable_dirs, 1);
        assert_eq!(r.sidecars_found, 5);
        assert_eq!(r.sidecars_kept, 1);
        assert_eq!(r.sidecars_removed, 2);
        assert_eq!(r.sidecars_skipped, 1);
        assert_eq!(r.sidecars_failed, 1);
        assert_eq!(r.bytes_freed, 15);
        assert_eq!(r.entries.len(), 5);
    }

    #[test]
    fn summary_mentions_dry_run() {
        let r = ReportBuilder::new(StorageTopology::Mirrored, "/m".into(), true).finish();
        assert!(r.summary().contains("would remove 0"));
        assert!(r.summary().starts_with("Mirrored"));
    }
}

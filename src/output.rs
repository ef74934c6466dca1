use colored::Colorize;

use sdrclean::report::{CleanupReport, Disposition};
use sdrclean::utils::{display_path, format_size};

pub fn print_banner() {
    println!(
        "{}",
        concat!("sdrclean - orphaned sidecar cleanup v", env!("CARGO_PKG_VERSION"))
            .bold()
            .cyan()
    );
    println!();
}

pub fn print_topologies(ids: &[&str]) {
    println!("{}", "=== Topologies ===".bold().white());
    for id in ids {
        println!("  {id}");
    }
}

/// Per-sidecar listing. Kept sidecars only show up with `verbose`.
pub fn print_entries(report: &CleanupReport, verbose: bool) {
    println!(
        "{}",
        format!("=== {} ({}) ===", report.display_name(), display_path(&report.root))
            .bold()
            .white()
    );
    for entry in &report.entries {
        let path = display_path(&entry.path);
        match &entry.disposition {
            Disposition::Removed { bytes } => {
                let label = if report.dry_run { "Orphan" } else { "Deleted" };
                println!("  {} {}  {}", label.red(), path.dimmed(), format_size(*bytes).yellow());
            }
            Disposition::Failed => {
                println!("  {} {}", "Failed".red().bold(), path.dimmed());
            }
            Disposition::Skipped { reason } => {
                println!("  {} {} - {}", "Skipped".yellow(), path.dimmed(), reason);
            }
            Disposition::Kept if verbose => {
                println!("  {} {}", "Kept".green(), path.dimmed());
            }
            Disposition::Kept => {}
        }
    }
    println!();
}

pub fn print_summary(report: &CleanupReport) {
    println!("{}", "=== Summary ===".bold().white());
    row("Directories scanned", report.directories_scanned.to_string());
    row("Sidecars found", report.sidecars_found.to_string());
    row("Sidecars kept", report.sidecars_kept.to_string());
    let removed = if report.dry_run { "Orphans (not removed)" } else { "Sidecars removed" };
    row(removed, report.sidecars_removed.to_string());
    row("Skipped (inconclusive)", report.sidecars_skipped.to_string());
    if report.sidecars_failed > 0 {
        println!("  {:<30} {}", "Failed to remove", report.sidecars_failed.to_string().red());
    }
    if report.unreadable_dirs > 0 {
        println!("  {:<30} {}", "Unreadable directories", report.unreadable_dirs.to_string().red());
    }
    println!("  {}", "─".repeat(45).dimmed());
    row("Space reclaimable", format_size(report.bytes_freed));
    println!();

    if report.dry_run {
        println!(
            "{}",
            "This was a dry run. Run without --dry-run to delete."
                .yellow()
                .bold()
        );
    } else {
        println!("{} {}", "Cleaned!".green().bold(), report.summary());
    }
}

fn row(label: &str, value: String) {
    println!("  {:<30} {}", label, value.green());
}

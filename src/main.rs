mod cli;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use sdrclean::config::SweepConfig;
use sdrclean::engine::ReconciliationEngine;
use sdrclean::error::Result;
use sdrclean::registry::{StorageTopology, TopologyRegistry};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sdrclean=debug" } else { "sdrclean=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let registry = TopologyRegistry::with_defaults();

    if cli.list {
        output::print_topologies(&registry.ids());
        return Ok(());
    }

    let mut config = load_config(&cli)?;
    if let Some(topology) = &cli.topology {
        config.topology = topology.clone();
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(root) = &cli.root {
        match registry.resolve(&config.topology)?.topology {
            StorageTopology::CoLocated => config.library_root = Some(root.clone()),
            StorageTopology::Mirrored => config.mirror_root = Some(root.clone()),
            StorageTopology::HashBucketed => config.hash_root = Some(root.clone()),
        }
    }

    output::print_banner();
    let report = ReconciliationEngine::run_configured(&registry, &config.topology, &config)?;
    output::print_entries(&report, cli.verbose);
    output::print_summary(&report);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SweepConfig> {
    if let Some(path) = &cli.config {
        return SweepConfig::load(path);
    }
    match SweepConfig::default_path() {
        Some(path) if path.is_file() => SweepConfig::load(&path),
        _ => Ok(SweepConfig::default()),
    }
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sdrclean",
    about = "Find and remove sidecar directories whose book is gone",
    version
)]
pub struct Cli {
    /// Config file (TOML). Defaults to <config dir>/sdrclean/config.toml
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Topology to sweep: co-located, mirrored or hash-bucketed
    #[arg(long, short)]
    pub topology: Option<String>,

    /// Override the root directory for the selected topology
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Report orphans without deleting them
    #[arg(long)]
    pub dry_run: bool,

    /// Show kept sidecars and debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// List known topologies and exit
    #[arg(long)]
    pub list: bool,
}

pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sealcid")]
#[command(about = "Seal records with a persisted key and verify them by digest or CID")]
pub struct Args {
    /// Path to the sealcid state directory (defaults to ~/.sealcid)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    #[command(subcommand)]
    pub command: crate::Command,
}

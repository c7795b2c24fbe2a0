// CLI modules
mod cli;
mod process;
mod state;
mod version;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Decrypt, Encrypt, Init, Verify, Version};

command_enum! {
    (Decrypt, Decrypt),
    (Encrypt, Encrypt),
    (Init, Init),
    (Verify, Verify),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Explicit flag > config file > info
    let log_level = args
        .log_level
        .or_else(|| state::configured_log_level(args.config_path.clone()))
        .unwrap_or(tracing::Level::INFO);
    let guards = process::init_logging(log_level, args.log_dir.as_deref());

    let ctx = cli::op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // Flush buffered log lines before exiting
    drop(guards);
    std::process::exit(code);
}

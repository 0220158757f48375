use anyhow::Result;
use clap::Parser;
use log::info;

use tenant_cli::cli::{self, Cli, Commands};
use tenant_cli::ui;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a per-run file so diagnostics never interleave with progress
    // output on stdout.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("tenant-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting tenant-cli");

    if let Err(error) = run(cli).await {
        ui::error("error", &format!("{:#}", error));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Product(args) => cli::commands::handle_product_command(args).await,
        Commands::ProductTree(args) => cli::commands::handle_product_tree_command(args).await,
        Commands::ProductNodeType(args) => cli::commands::handle_node_type_command(args).await,
        Commands::Config(args) => cli::commands::handle_config_command(args).await,
    }
}

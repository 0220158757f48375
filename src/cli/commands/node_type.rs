//! Node type registry copy, import and export commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::api::models::NodeType;
use crate::api::{AuthManager, GraphApi, ProductApi};
use crate::config::Config;
use crate::product::{copy_node_types, replicate_node_types};
use crate::tree::ConsoleProgress;
use crate::ui;

#[derive(Args)]
pub struct NodeTypeCommands {
    #[command(subcommand)]
    pub command: NodeTypeSubcommands,
}

#[derive(Subcommand)]
pub enum NodeTypeSubcommands {
    /// Copy all node types from one tenant to another
    Copy {
        /// Source tenant alias
        #[arg(short, long)]
        source: String,
        /// Destination tenant alias
        #[arg(short, long)]
        destination: String,
    },
    /// Import previously exported node types into a tenant
    Import {
        /// Destination tenant alias
        #[arg(short, long)]
        tenant: String,
        /// Path to a JSON file with exported node types
        file: PathBuf,
    },
    /// Export all node types as JSON on stdout
    Export {
        /// Source tenant alias
        #[arg(short, long)]
        tenant: String,
    },
}

pub async fn handle_node_type_command(cmd: NodeTypeCommands) -> Result<()> {
    let config = Config::load()?;
    let mut auth = AuthManager::new();

    match cmd.command {
        NodeTypeSubcommands::Copy {
            source,
            destination,
        } => {
            ui::info(
                "product-node-type:copy",
                &format!("Copying node types from `{}` to `{}`.", source, destination),
            );

            let source_api = GraphApi::connect(&config, &mut auth, &source).await?;
            let dest_api = GraphApi::connect(&config, &mut auth, &destination).await?;

            let copied = copy_node_types(
                &source_api,
                &dest_api,
                &config.settings.replay_config(),
                &mut ConsoleProgress::default(),
            )
            .await?;

            ui::success(
                "product-node-type:copy",
                &format!("{} type(s) copied!", copied),
            );
        }
        NodeTypeSubcommands::Import { tenant, file } => {
            ui::info(
                "product-node-type:import",
                &format!("Importing node types to `{}`.", tenant),
            );

            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let types: Vec<NodeType> = serde_json::from_str(&content)
                .with_context(|| format!("{:?} is not a valid node type export", file))?;

            let api = GraphApi::connect(&config, &mut auth, &tenant).await?;
            replicate_node_types(
                &api,
                &types,
                &config.settings.replay_config(),
                &mut ConsoleProgress::default(),
            )
            .await?;

            ui::success(
                "product-node-type:import",
                &format!("{} type(s) imported!", types.len()),
            );
        }
        NodeTypeSubcommands::Export { tenant } => {
            let api = GraphApi::connect(&config, &mut auth, &tenant).await?;
            let types = api.fetch_node_types().await?;
            println!("{}", serde_json::to_string(&types)?);
        }
    }

    Ok(())
}

//! Product tree copy, import and export commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::api::models::Node;
use crate::api::{AuthManager, GraphApi, ProductApi, ProductId};
use crate::config::Config;
use crate::product::{replay_tree, ProductCopier};
use crate::tree::{ConsoleProgress, HexIds, TreeShape};
use crate::ui;

#[derive(Args)]
pub struct ProductTreeCommands {
    #[command(subcommand)]
    pub command: ProductTreeSubcommands,
}

#[derive(Subcommand)]
pub enum ProductTreeSubcommands {
    /// Copy a product's tree to another tenant
    Copy {
        /// Source tenant alias
        #[arg(short, long)]
        source: String,
        /// Destination tenant alias
        #[arg(short, long)]
        destination: String,
        /// The product whose tree to copy (plan/type/version)
        product_id: String,
        /// Override the configured tree creation shape
        #[arg(long, value_enum)]
        shape: Option<TreeShape>,
    },
    /// Import previously exported nodes into a tenant
    Import {
        /// Destination tenant alias
        #[arg(short, long)]
        tenant: String,
        /// Path to a JSON file with exported nodes
        file: PathBuf,
        /// Override the configured tree creation shape
        #[arg(long, value_enum)]
        shape: Option<TreeShape>,
    },
    /// Export a product's tree nodes as JSON on stdout
    Export {
        /// Source tenant alias
        #[arg(short, long)]
        tenant: String,
        /// The product whose tree to export (plan/type/version)
        product_id: String,
    },
}

pub async fn handle_product_tree_command(cmd: ProductTreeCommands) -> Result<()> {
    let config = Config::load()?;
    let mut auth = AuthManager::new();

    match cmd.command {
        ProductTreeSubcommands::Copy {
            source,
            destination,
            product_id,
            shape,
        } => {
            let product_id: ProductId = product_id.parse()?;

            ui::info(
                "product-tree:copy",
                &format!(
                    "Copy product tree `{}` from `{}` to `{}`.",
                    product_id, source, destination
                ),
            );

            let source_api = GraphApi::connect(&config, &mut auth, &source).await?;
            let dest_api = GraphApi::connect(&config, &mut auth, &destination).await?;

            let mut copier = ProductCopier::new(
                &source_api,
                &dest_api,
                config.settings.replay_config(),
                shape.unwrap_or(config.settings.tree_shape),
            );
            let root_node_id = copier
                .copy_tree_only(&product_id, &mut ConsoleProgress::default())
                .await?;

            ui::success(
                "product-tree:copy",
                &format!("New root node `{}`.", root_node_id),
            );
            ui::done();
        }
        ProductTreeSubcommands::Import {
            tenant,
            file,
            shape,
        } => {
            ui::info(
                "product-tree:import",
                &format!("Importing nodes to `{}`.", tenant),
            );

            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let nodes: Vec<Node> = serde_json::from_str(&content)
                .with_context(|| format!("{:?} is not a valid node export", file))?;

            let api = GraphApi::connect(&config, &mut auth, &tenant).await?;
            let root_node_id = replay_tree(
                &api,
                &nodes,
                &mut HexIds,
                &config.settings.replay_config(),
                shape.unwrap_or(config.settings.tree_shape),
                &mut ConsoleProgress::default(),
            )
            .await?
            .context("The export contains no nodes")?;

            ui::success(
                "product-tree:import",
                &format!("New imported root node `{}`.", root_node_id),
            );
            ui::done();
        }
        ProductTreeSubcommands::Export { tenant, product_id } => {
            let product_id: ProductId = product_id.parse()?;

            let api = GraphApi::connect(&config, &mut auth, &tenant).await?;
            let product = api
                .fetch_product(&product_id)
                .await?
                .with_context(|| format!("Product {} not found", product_id))?;
            let tree_id = product
                .product_tree_id
                .with_context(|| format!("Product {} has no product tree", product_id))?;
            let nodes = api.fetch_product_tree_nodes(&tree_id).await?;

            println!("{}", serde_json::to_string(&nodes)?);
        }
    }

    Ok(())
}

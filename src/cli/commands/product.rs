//! Product copy, sync and assign-tree commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::{AuthManager, GraphApi, ProductId};
use crate::config::Config;
use crate::product::{assign_tree, ProductCopier};
use crate::tree::{ConsoleProgress, TreeShape};
use crate::ui;

#[derive(Args)]
pub struct ProductCommands {
    #[command(subcommand)]
    pub command: ProductSubcommands,
}

#[derive(Subcommand)]
pub enum ProductSubcommands {
    /// Copy a product including tree and data schemas
    Copy {
        /// Source tenant alias
        #[arg(short, long)]
        source: String,
        /// Destination tenant alias
        #[arg(short, long)]
        destination: String,
        /// Give the copy a different product id than the source
        #[arg(short, long)]
        id: Option<String>,
        /// The product id to copy (plan/type/version)
        product_id: String,
        /// Override the configured tree creation shape
        #[arg(long, value_enum)]
        shape: Option<TreeShape>,
    },
    /// Sync a product into an existing product on another tenant
    Sync {
        /// Source tenant alias
        #[arg(short, long)]
        source: String,
        /// Destination tenant alias
        #[arg(short, long)]
        destination: String,
        /// The product to sync from (plan/type/version)
        from: String,
        /// The product to sync to (plan/type/version)
        to: String,
        /// Override the configured tree creation shape
        #[arg(long, value_enum)]
        shape: Option<TreeShape>,
    },
    /// Assign a product tree to a product
    AssignTree {
        /// Tenant alias the product lives on
        #[arg(short, long)]
        tenant: String,
        /// The product id to re-point (plan/type/version)
        product_id: String,
        /// The product tree id to assign
        product_tree_id: String,
    },
}

pub async fn handle_product_command(cmd: ProductCommands) -> Result<()> {
    let config = Config::load()?;
    let mut auth = AuthManager::new();

    match cmd.command {
        ProductSubcommands::Copy {
            source,
            destination,
            id,
            product_id,
            shape,
        } => {
            let source_id: ProductId = product_id.parse()?;
            let target_id = match id {
                Some(id) => id.parse()?,
                None => source_id.clone(),
            };

            ui::info(
                "product:copy",
                &format!(
                    "Copy product `{}` from `{}` to `{}`.",
                    source_id, source, destination
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
            copier
                .copy(&source_id, &target_id, &mut ConsoleProgress::default())
                .await?;

            ui::done();
        }
        ProductSubcommands::Sync {
            source,
            destination,
            from,
            to,
            shape,
        } => {
            let from: ProductId = from.parse()?;
            let to: ProductId = to.parse()?;

            let source_api = GraphApi::connect(&config, &mut auth, &source).await?;
            let dest_api = GraphApi::connect(&config, &mut auth, &destination).await?;

            let mut copier = ProductCopier::new(
                &source_api,
                &dest_api,
                config.settings.replay_config(),
                shape.unwrap_or(config.settings.tree_shape),
            );
            copier
                .sync(&from, &to, &mut ConsoleProgress::default())
                .await?;

            ui::done();
        }
        ProductSubcommands::AssignTree {
            tenant,
            product_id,
            product_tree_id,
        } => {
            let product_id: ProductId = product_id.parse()?;

            let api = GraphApi::connect(&config, &mut auth, &tenant).await?;
            assign_tree(&api, &product_id, &product_tree_id).await?;

            ui::done();
        }
    }

    Ok(())
}

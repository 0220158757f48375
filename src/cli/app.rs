use super::commands::config::ConfigCommands;
use super::commands::node_type::NodeTypeCommands;
use super::commands::product::ProductCommands;
use super::commands::product_tree::ProductTreeCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tenant-cli")]
#[command(about = "A CLI tool for migrating product configuration between tenants")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy, sync and re-point products between tenants
    Product(ProductCommands),
    /// Copy, import and export product trees
    ProductTree(ProductTreeCommands),
    /// Copy, import and export node type registries
    ProductNodeType(NodeTypeCommands),
    /// Environment and tenant configuration
    Config(ConfigCommands),
}

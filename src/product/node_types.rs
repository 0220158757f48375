//! Node type registry replication.
//!
//! Node types must exist on the destination before trees referencing them can
//! be created, so operators run this ahead of product copies. The replay is
//! sequential with the same pacing and per-call retry budget as the tree
//! replay; the registry endpoint tolerates concurrent writes no better.

use anyhow::Result;
use log::info;

use crate::api::models::NodeType;
use crate::api::port::ProductApi;
use crate::api::resilience::{Pacer, ReplayConfig, RetryPolicy};
use crate::tree::Progress;

/// Replay a list of node types against a destination tenant.
pub async fn replicate_node_types(
    dest: &dyn ProductApi,
    types: &[NodeType],
    config: &ReplayConfig,
    progress: &mut dyn Progress,
) -> Result<()> {
    if types.is_empty() {
        return Ok(());
    }

    info!("Replicating {} node type(s)", types.len());
    let retry = RetryPolicy::new(config);
    let mut pacer = Pacer::new(config);

    progress.begin(types.len());
    for node_type in types {
        pacer.pace().await;
        let label = format!("mutation:createNodeType `{}`", node_type.r#type);
        retry
            .execute(&label, || dest.create_node_type(node_type))
            .await?;
        progress.advance();
    }
    progress.finish();

    Ok(())
}

/// Fetch every node type from the source registry and replay it against the
/// destination. Returns how many types were copied.
pub async fn copy_node_types(
    source: &dyn ProductApi,
    dest: &dyn ProductApi,
    config: &ReplayConfig,
    progress: &mut dyn Progress,
) -> Result<usize> {
    let types = source.fetch_node_types().await?;
    replicate_node_types(dest, &types, config, progress).await?;
    Ok(types.len())
}

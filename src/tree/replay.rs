//! Replays a rebuilt tree against a destination tenant.
//!
//! All calls are issued strictly sequentially with pacing between them; the
//! destination API misbehaves under concurrent writes to an evolving tree.
//! On any failure the replay aborts where it stands; already-created nodes
//! stay on the destination and no compensating rollback runs.

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::api::port::{NodeCreate, NodePlacement, ProductApi};
use crate::api::resilience::{Pacer, ReplayConfig, RetryPolicy};
use super::rebuild::RebuiltTree;

/// Which creation shape the destination tenant supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TreeShape {
    /// One `createNode` call carrying the whole tree as nested children.
    #[default]
    Nested,
    /// One `createNode` per node plus one resolver attachment per field.
    PerNode,
}

/// Observer for replay progress: one event after every successful remote
/// call, counting up to the announced total.
pub trait Progress: Send {
    fn begin(&mut self, total: usize);
    fn advance(&mut self);
    fn finish(&mut self);
}

/// Renders progress as percentage lines on stdout.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    done: usize,
    total: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.done = 0;
        self.total = total;
        if total > 1 {
            println!("Executing {} operations...", total);
        }
    }

    fn advance(&mut self) {
        self.done += 1;
        if self.total > 1 {
            let percent = (self.done as f64 / self.total as f64) * 100.0;
            println!("{}", format!("{:.2}%", percent).dimmed());
        }
    }

    fn finish(&mut self) {
        if self.total > 1 {
            println!("{}", "Done!".green());
        }
    }
}

/// Walks a rebuilt tree and issues ordered, sequential creation calls.
pub struct ReplayEngine<'a> {
    api: &'a dyn ProductApi,
    config: ReplayConfig,
    shape: TreeShape,
}

impl<'a> ReplayEngine<'a> {
    pub fn new(api: &'a dyn ProductApi, config: ReplayConfig, shape: TreeShape) -> Self {
        Self { api, config, shape }
    }

    /// Create the tree on the destination tenant and return the new root id.
    pub async fn create_tree(
        &self,
        tree: &RebuiltTree,
        progress: &mut dyn Progress,
    ) -> Result<String> {
        match self.shape {
            TreeShape::Nested => self.create_nested(tree, progress).await,
            TreeShape::PerNode => self.create_per_node(tree, progress).await,
        }
    }

    /// Single transactional call: the root node carries every descendant as
    /// nested children.
    async fn create_nested(
        &self,
        tree: &RebuiltTree,
        progress: &mut dyn Progress,
    ) -> Result<String> {
        let nested = tree.to_nested();
        info!(
            "Creating tree of {} node(s) as a single nested call",
            nested.count()
        );

        progress.begin(1);
        let create = NodeCreate {
            id: nested.id.clone(),
            r#ref: nested.r#ref.clone(),
            r#type: nested.r#type.clone(),
            alias: nested.alias.clone(),
            fields: nested.fields.clone(),
            placement: NodePlacement::Children(nested.children.clone()),
        };
        let created = self
            .api
            .create_node(&create)
            .await
            .context("mutation:createProductTree")?;
        progress.advance();
        progress.finish();

        created.with_context(|| {
            format!(
                "mutation:createProductTree returned no root for `{}`",
                tree.source_root_id
            )
        })
    }

    /// Legacy shape: one creation call per node in parent order, then one
    /// resolver attachment per field, throttled and individually retried.
    async fn create_per_node(
        &self,
        tree: &RebuiltTree,
        progress: &mut dyn Progress,
    ) -> Result<String> {
        let retry = RetryPolicy::new(&self.config);
        let mut pacer = Pacer::new(&self.config);

        let total = tree.total_operations();
        info!("Replaying {} operation(s) node by node", total);
        progress.begin(total);

        for node in &tree.nodes {
            let placement = match &node.parent_id {
                None => NodePlacement::Root,
                Some(parent_id) => NodePlacement::Under {
                    parent_id: parent_id.clone(),
                },
            };
            // Nodes are created with only the placeholder field; the real
            // fields follow as resolver attachments.
            let create = NodeCreate {
                id: node.id.clone(),
                r#ref: node.r#ref.clone(),
                r#type: node.r#type.clone(),
                alias: node.alias.clone(),
                fields: vec![crate::api::models::NodeField::placeholder()],
                placement,
            };

            pacer.pace().await;
            let label = format!("mutation:createNode `{}`", node.r#ref);
            retry.execute(&label, || self.api.create_node(&create)).await?;
            progress.advance();
            debug!("created node {} ({})", node.id, node.r#ref);

            for field in &node.fields {
                let resolver = field
                    .resolver
                    .clone()
                    .unwrap_or_else(crate::api::models::FieldResolver::empty);

                pacer.pace().await;
                let label = format!(
                    "mutation:attachFieldResolver `{}.{}`",
                    node.r#ref, field.r#ref
                );
                retry
                    .execute(&label, || {
                        self.api.attach_field_resolver(&node.id, &field.r#ref, &resolver)
                    })
                    .await?;
                progress.advance();
            }
        }

        progress.finish();
        Ok(tree.root_id.clone())
    }
}

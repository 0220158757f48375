//! Product replication between tenants: the staged pipeline that copies a
//! product's definition, tree, schemas and scripts from a source tenant to a
//! destination tenant.
//!
//! Stages run strictly in order; any remote failure aborts the whole
//! operation and surfaces the server's message. Nothing that was already
//! created on the destination is rolled back.

use anyhow::{Context, Result};
use log::debug;

use crate::api::models::{Node, Product, ProductId};
use crate::api::port::ProductApi;
use crate::api::resilience::ReplayConfig;
use crate::tree::{rebuild, IdGenerator, Progress, ReplayEngine, TreeShape};
use crate::ui;

/// Rebuild a flat source node list and replay it against `api`. Returns the
/// fresh root id, or `None` when the list was empty (no tree to copy).
pub async fn replay_tree(
    api: &dyn ProductApi,
    nodes: &[Node],
    ids: &mut dyn IdGenerator,
    config: &ReplayConfig,
    shape: TreeShape,
    progress: &mut dyn Progress,
) -> Result<Option<String>> {
    match rebuild(nodes, ids) {
        None => Ok(None),
        Some(tree) => {
            let engine = ReplayEngine::new(api, config.clone(), shape);
            engine.create_tree(&tree, progress).await.map(Some)
        }
    }
}

/// Replicate the data schema (and the matching UI schema variants) of the
/// tree rooted at `source_tree_id` onto the tree rooted at `root_node_id`.
///
/// A schema that cannot be fetched is "no schema to copy", not a failure;
/// this is the one deliberately swallowed error in the pipeline.
pub async fn copy_schema(
    command: &str,
    source: &dyn ProductApi,
    dest: &dyn ProductApi,
    source_tree_id: &str,
    root_node_id: &str,
) -> Result<()> {
    let schema = match source.fetch_product_schema(source_tree_id).await {
        Ok(Some(schema)) => schema,
        Ok(None) => {
            ui::warn(command, "No data schema found.");
            return Ok(());
        }
        Err(error) => {
            ui::warn(command, "No data schema found.");
            debug!("{}: schema fetch failed: {:#}", command, error);
            return Ok(());
        }
    };

    let schema_id = dest
        .create_product_schema(root_node_id, &schema.data_schema)
        .await?;

    // Only the UI schema variants authored against the source tree's own
    // root are replicated; the rest are skipped. The name-equality selector
    // is a known fragility of the platform and is preserved as-is.
    for ui_schema in &schema.ui_schemas {
        if ui_schema.name == source_tree_id {
            dest.create_ui_product_schema(&schema_id, root_node_id, &ui_schema.schema)
                .await?;
        }
    }

    Ok(())
}

/// Re-point a product at `product_tree_id` and carry the schemas of its
/// previous tree over to the new one.
pub async fn assign_tree(
    api: &dyn ProductApi,
    product_id: &ProductId,
    product_tree_id: &str,
) -> Result<()> {
    let command = "product:assign-tree";

    ui::info(command, &format!("Fetch product `{}`.", product_id));
    let product = api
        .fetch_product(product_id)
        .await?
        .with_context(|| format!("Product {} not found", product_id))?;
    let existing = product.product_tree_id.clone();

    ui::info(
        command,
        &format!("Update product tree ID on `{}`.", product_id),
    );
    api.update_product_tree_id(product_id, product_tree_id)
        .await?;

    let Some(existing) = existing else {
        ui::warn(
            command,
            &format!("No existing product tree found for `{}`.", product_id),
        );
        return Ok(());
    };

    ui::info(command, &format!("Fetch data schemas for `{}`.", existing));
    copy_schema(command, api, api, &existing, product_tree_id).await?;

    ui::success(
        command,
        &format!("Product `{}` assigned to tree `{}`.", product_id, product_tree_id),
    );
    Ok(())
}

/// The tenant-to-tenant product pipeline.
pub struct ProductCopier<'a> {
    source: &'a dyn ProductApi,
    dest: &'a dyn ProductApi,
    replay: ReplayConfig,
    shape: TreeShape,
    ids: Box<dyn IdGenerator + Send>,
}

impl<'a> ProductCopier<'a> {
    pub fn new(
        source: &'a dyn ProductApi,
        dest: &'a dyn ProductApi,
        replay: ReplayConfig,
        shape: TreeShape,
    ) -> Self {
        Self {
            source,
            dest,
            replay,
            shape,
            ids: Box::new(crate::tree::HexIds),
        }
    }

    /// Replace the id source; tests supply deterministic sequences.
    pub fn with_ids(mut self, ids: Box<dyn IdGenerator + Send>) -> Self {
        self.ids = ids;
        self
    }

    /// Copy `source_id` into a (possibly renamed) `target_id` on the
    /// destination tenant: product, scripts, tree, then schemas.
    pub async fn copy(
        &mut self,
        source_id: &ProductId,
        target_id: &ProductId,
        progress: &mut dyn Progress,
    ) -> Result<()> {
        ui::stage(1, 8, &format!("Fetch `{}` from the source tenant.", source_id));
        let product = self
            .source
            .fetch_product(source_id)
            .await?
            .with_context(|| format!("Product {} not found", source_id))?;

        ui::stage(2, 8, &format!("Create product `{}` on the destination tenant.", target_id));
        let mut new_product = product.clone();
        new_product.product_id = target_id.clone();
        self.dest.create_product(&new_product).await?;

        if product.scripts.is_some() {
            ui::stage(3, 8, "Copy scripts.");
            self.copy_scripts("product:copy", &product, target_id).await?;
        }

        let Some(source_tree_id) = product.product_tree_id.clone() else {
            // No tree, nothing for the remaining stages to work on.
            return Ok(());
        };

        ui::stage(4, 8, &format!("Fetch product tree `{}` from the source tenant.", source_tree_id));
        let nodes = self.source.fetch_product_tree_nodes(&source_tree_id).await?;

        ui::stage(5, 8, &format!("Copy node(s) from `{}` to `{}`.", source_id, target_id));
        let root_node_id = replay_tree(
            self.dest,
            &nodes,
            self.ids.as_mut(),
            &self.replay,
            self.shape,
            progress,
        )
        .await?
        .context("Failed to create product tree on destination tenant")?;

        ui::stage(6, 8, &format!("Update `{}` with productTreeId `{}`.", target_id, root_node_id));
        self.dest
            .update_product_tree_id(target_id, &root_node_id)
            .await?;

        ui::stage(7, 8, &format!("Fetch data schemas for `{}`.", source_tree_id));
        ui::stage(8, 8, &format!("Create product schemas for tree `{}`.", root_node_id));
        copy_schema("product:copy", self.source, self.dest, &source_tree_id, &root_node_id).await?;

        Ok(())
    }

    /// Sync `from` into the existing destination product `to`:
    /// representation, scripts, then tree and schemas.
    pub async fn sync(
        &mut self,
        from: &ProductId,
        to: &ProductId,
        progress: &mut dyn Progress,
    ) -> Result<()> {
        let command = "product:sync";

        ui::info(command, &format!("Fetch product `{}` from the source tenant.", from));
        let product = self
            .source
            .fetch_product(from)
            .await?
            .with_context(|| format!("Product {} not found", from))?;

        ui::info(command, &format!("Fetch product `{}` from the destination tenant.", to));
        let destination = self
            .dest
            .fetch_product(to)
            .await?
            .with_context(|| format!("Product {} not found", to))?;

        if let Some(representation) = &product.representation {
            ui::info(command, "Update product representation.");
            self.dest
                .update_product_representation(&destination.product_id, representation)
                .await?;
        }

        if product.scripts.is_some() {
            ui::info(command, "Copy scripts.");
            self.copy_scripts(command, &product, &destination.product_id)
                .await?;
        }

        if let Some(source_tree_id) = product.product_tree_id.clone() {
            ui::info(command, "Fetch source product tree.");
            let nodes = self.source.fetch_product_tree_nodes(&source_tree_id).await?;

            ui::info(command, "Create tree on destination tenant.");
            let root_node_id = replay_tree(
                self.dest,
                &nodes,
                self.ids.as_mut(),
                &self.replay,
                self.shape,
                progress,
            )
            .await?
            .context("Failed to create product tree on destination tenant")?;
            ui::success(command, &format!("Created tree root `{}`.", root_node_id));

            ui::info(command, "Update product tree ID on destination tenant.");
            self.dest
                .update_product_tree_id(&destination.product_id, &root_node_id)
                .await?;

            ui::info(command, "Copy data schemas.");
            copy_schema(command, self.source, self.dest, &source_tree_id, &root_node_id).await?;
        }

        ui::success(command, &format!("Product `{}` synced to `{}`.", from, to));
        Ok(())
    }

    /// Copy only the tree of `product_id`, without touching products or
    /// schemas. Returns the fresh root id on the destination.
    pub async fn copy_tree_only(
        &mut self,
        product_id: &ProductId,
        progress: &mut dyn Progress,
    ) -> Result<String> {
        let product = self
            .source
            .fetch_product(product_id)
            .await?
            .with_context(|| format!("Product {} not found", product_id))?;
        let source_tree_id = product
            .product_tree_id
            .with_context(|| format!("Product {} has no product tree", product_id))?;

        let nodes = self.source.fetch_product_tree_nodes(&source_tree_id).await?;
        replay_tree(
            self.dest,
            &nodes,
            self.ids.as_mut(),
            &self.replay,
            self.shape,
            progress,
        )
        .await?
        .context("Failed to create product tree on destination tenant")
    }

    /// Create each source script on the destination and attach it to the
    /// destination product. External table and source files referenced by a
    /// script are not duplicated; their URLs carry over as-is.
    async fn copy_scripts(
        &self,
        command: &str,
        product: &Product,
        dest_product_id: &ProductId,
    ) -> Result<()> {
        let scripts = product.scripts.as_deref().unwrap_or_default();
        for script in scripts {
            ui::info(command, &format!("Copy script `{}`.", script.name));
            if let Some(script_id) = self.dest.create_script(script).await? {
                self.dest
                    .add_script_to_product(dest_product_id, &script_id)
                    .await?;
            }
        }
        Ok(())
    }
}

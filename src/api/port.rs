//! The remote access port: every platform operation the copy engine needs,
//! as an injectable capability so the engine never touches the transport.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{
    FieldResolver, Node, NodeField, NodeType, Product, ProductId, ProductSchema, Script, TreeNode,
};

/// Payload for a node-creation call. The platform historically exposes two
/// creation shapes; `placement` selects which one goes on the wire.
#[derive(Debug, Clone)]
pub struct NodeCreate {
    pub id: String,
    pub r#ref: String,
    pub r#type: String,
    pub alias: String,
    pub fields: Vec<NodeField>,
    pub placement: NodePlacement,
}

/// Where a created node lands.
#[derive(Debug, Clone)]
pub enum NodePlacement {
    /// Root of a new tree, no position.
    Root,
    /// Child of an already-created node, `position.parentId` on the wire.
    Under { parent_id: String },
    /// Entire subtree in one call, `children` on the wire.
    Children(Vec<TreeNode>),
}

/// Authenticated read/write operations against one tenant's backend. Each
/// method corresponds 1:1 to a server-side GraphQL operation.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>>;
    async fn create_product(&self, product: &Product) -> Result<Product>;
    async fn update_product_tree_id(&self, id: &ProductId, product_tree_id: &str) -> Result<()>;
    async fn update_product_representation(&self, id: &ProductId, representation: &str) -> Result<()>;

    /// Flat parent-pointer form rooted at `root_node_id`.
    async fn fetch_product_tree_nodes(&self, root_node_id: &str) -> Result<Vec<Node>>;
    /// Returns the created node's id when the server echoes one.
    async fn create_node(&self, node: &NodeCreate) -> Result<Option<String>>;
    async fn attach_field_resolver(
        &self,
        node_id: &str,
        field_ref: &str,
        resolver: &FieldResolver,
    ) -> Result<()>;

    /// `Ok(None)` when the tree has no schema.
    async fn fetch_product_schema(&self, node_id: &str) -> Result<Option<ProductSchema>>;
    /// Returns the created schema's id.
    async fn create_product_schema(&self, node_id: &str, data_schema: &str) -> Result<String>;
    async fn create_ui_product_schema(
        &self,
        product_schema_id: &str,
        name: &str,
        schema: &str,
    ) -> Result<()>;

    async fn fetch_node_types(&self) -> Result<Vec<NodeType>>;
    async fn create_node_type(&self, node_type: &NodeType) -> Result<()>;

    /// Returns the created script's id when the server reports one.
    async fn create_script(&self, script: &Script) -> Result<Option<String>>;
    async fn add_script_to_product(&self, id: &ProductId, script_id: &str) -> Result<()>;
}

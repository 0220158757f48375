#![allow(dead_code)]

//! Shared test doubles: a recording in-memory remote access port and a
//! counting progress sink.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use tenant_cli::api::models::{
    FieldResolver, Node, NodeField, NodeParent, NodeType, Product, ProductId, ProductSchema,
    ResolverLanguage, Script, TreeNode,
};
use tenant_cli::api::port::{NodeCreate, NodePlacement, ProductApi};
use tenant_cli::tree::Progress;

/// Everything the mock tenant was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchProduct(String),
    CreateProduct(String),
    UpdateProductTreeId { product: String, tree_id: String },
    UpdateRepresentation(String),
    FetchTreeNodes(String),
    CreateNode { id: String, r#ref: String, parent: Option<String>, children: usize },
    AttachResolver { node_id: String, field_ref: String },
    FetchSchema(String),
    CreateSchema { node_id: String },
    CreateUiSchema { schema_id: String, name: String },
    FetchNodeTypes,
    CreateNodeType(String),
    CreateScript(String),
    AddScript { script_id: String },
}

/// A created node as the mock tenant remembers it.
#[derive(Debug, Clone)]
pub struct CreatedNode {
    pub id: String,
    pub r#ref: String,
    pub alias: String,
    pub r#type: String,
    pub parent_id: Option<String>,
    pub fields: Vec<NodeField>,
    pub resolvers: Vec<(String, FieldResolver)>,
}

#[derive(Default)]
pub struct MockApi {
    pub calls: Mutex<Vec<Call>>,
    pub products: Mutex<HashMap<String, Product>>,
    pub trees: Mutex<HashMap<String, Vec<Node>>>,
    pub schemas: Mutex<HashMap<String, ProductSchema>>,
    pub node_types: Mutex<Vec<NodeType>>,
    pub created: Mutex<Vec<CreatedNode>>,
    pub nested_roots: Mutex<Vec<TreeNode>>,
    /// Every `createNode` call with 1-based index >= this fails permanently.
    pub fail_create_node_from: Mutex<Option<usize>>,
    /// The next N `createNode` calls fail, then calls succeed again.
    pub transient_create_node_failures: Mutex<usize>,
    /// Simulate a server error on schema fetches.
    pub schema_fetch_fails: Mutex<bool>,
    create_node_count: Mutex<usize>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, product: Product) -> Self {
        self.products
            .lock()
            .unwrap()
            .insert(product.product_id.to_string(), product);
        self
    }

    pub fn with_tree(self, root_id: &str, nodes: Vec<Node>) -> Self {
        self.trees.lock().unwrap().insert(root_id.to_string(), nodes);
        self
    }

    pub fn with_schema(self, node_id: &str, schema: ProductSchema) -> Self {
        self.schemas
            .lock()
            .unwrap()
            .insert(node_id.to_string(), schema);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<CreatedNode> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Collapse the nested wire form back into created-node records so both
    /// replay shapes can be asserted the same way.
    fn record_subtree(&self, node: &TreeNode, parent_id: Option<&str>) {
        self.created.lock().unwrap().push(CreatedNode {
            id: node.id.clone(),
            r#ref: node.r#ref.clone(),
            alias: node.alias.clone(),
            r#type: node.r#type.clone(),
            parent_id: parent_id.map(str::to_string),
            fields: node.fields.clone(),
            resolvers: Vec::new(),
        });
        for child in &node.children {
            self.record_subtree(child, Some(&node.id));
        }
    }
}

#[async_trait]
impl ProductApi for MockApi {
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>> {
        self.record(Call::FetchProduct(id.to_string()));
        Ok(self.products.lock().unwrap().get(&id.to_string()).cloned())
    }

    async fn create_product(&self, product: &Product) -> Result<Product> {
        self.record(Call::CreateProduct(product.product_id.to_string()));
        Ok(product.clone())
    }

    async fn update_product_tree_id(&self, id: &ProductId, product_tree_id: &str) -> Result<()> {
        self.record(Call::UpdateProductTreeId {
            product: id.to_string(),
            tree_id: product_tree_id.to_string(),
        });
        Ok(())
    }

    async fn update_product_representation(
        &self,
        id: &ProductId,
        _representation: &str,
    ) -> Result<()> {
        self.record(Call::UpdateRepresentation(id.to_string()));
        Ok(())
    }

    async fn fetch_product_tree_nodes(&self, root_node_id: &str) -> Result<Vec<Node>> {
        self.record(Call::FetchTreeNodes(root_node_id.to_string()));
        Ok(self
            .trees
            .lock()
            .unwrap()
            .get(root_node_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_node(&self, node: &NodeCreate) -> Result<Option<String>> {
        let count = {
            let mut count = self.create_node_count.lock().unwrap();
            *count += 1;
            *count
        };

        let (parent, children) = match &node.placement {
            NodePlacement::Root => (None, 0),
            NodePlacement::Under { parent_id } => (Some(parent_id.clone()), 0),
            NodePlacement::Children(children) => (None, children.len()),
        };
        self.record(Call::CreateNode {
            id: node.id.clone(),
            r#ref: node.r#ref.clone(),
            parent: parent.clone(),
            children,
        });

        if let Some(from) = *self.fail_create_node_from.lock().unwrap() {
            if count >= from {
                anyhow::bail!("induced failure creating `{}`", node.r#ref);
            }
        }
        {
            let mut transient = self.transient_create_node_failures.lock().unwrap();
            if *transient > 0 {
                *transient -= 1;
                anyhow::bail!("transient failure creating `{}`", node.r#ref);
            }
        }

        match &node.placement {
            NodePlacement::Children(children) => {
                let root = TreeNode {
                    id: node.id.clone(),
                    r#ref: node.r#ref.clone(),
                    alias: node.alias.clone(),
                    r#type: node.r#type.clone(),
                    fields: node.fields.clone(),
                    children: children.clone(),
                };
                self.record_subtree(&root, None);
                self.nested_roots.lock().unwrap().push(root);
            }
            _ => {
                self.created.lock().unwrap().push(CreatedNode {
                    id: node.id.clone(),
                    r#ref: node.r#ref.clone(),
                    alias: node.alias.clone(),
                    r#type: node.r#type.clone(),
                    parent_id: parent,
                    fields: node.fields.clone(),
                    resolvers: Vec::new(),
                });
            }
        }

        Ok(Some(node.id.clone()))
    }

    async fn attach_field_resolver(
        &self,
        node_id: &str,
        field_ref: &str,
        resolver: &FieldResolver,
    ) -> Result<()> {
        self.record(Call::AttachResolver {
            node_id: node_id.to_string(),
            field_ref: field_ref.to_string(),
        });
        let mut created = self.created.lock().unwrap();
        let node = created
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| anyhow::anyhow!("no such node `{}`", node_id))?;
        node.resolvers
            .push((field_ref.to_string(), resolver.clone()));
        Ok(())
    }

    async fn fetch_product_schema(&self, node_id: &str) -> Result<Option<ProductSchema>> {
        self.record(Call::FetchSchema(node_id.to_string()));
        if *self.schema_fetch_fails.lock().unwrap() {
            anyhow::bail!("query:fetchProductSchema: schema backend unavailable");
        }
        Ok(self.schemas.lock().unwrap().get(node_id).cloned())
    }

    async fn create_product_schema(&self, node_id: &str, _data_schema: &str) -> Result<String> {
        self.record(Call::CreateSchema {
            node_id: node_id.to_string(),
        });
        Ok("schema-1".to_string())
    }

    async fn create_ui_product_schema(
        &self,
        product_schema_id: &str,
        name: &str,
        _schema: &str,
    ) -> Result<()> {
        self.record(Call::CreateUiSchema {
            schema_id: product_schema_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn fetch_node_types(&self) -> Result<Vec<NodeType>> {
        self.record(Call::FetchNodeTypes);
        Ok(self.node_types.lock().unwrap().clone())
    }

    async fn create_node_type(&self, node_type: &NodeType) -> Result<()> {
        self.record(Call::CreateNodeType(node_type.r#type.clone()));
        Ok(())
    }

    async fn create_script(&self, script: &Script) -> Result<Option<String>> {
        self.record(Call::CreateScript(script.name.clone()));
        Ok(Some(format!("script-{}", script.name)))
    }

    async fn add_script_to_product(&self, _id: &ProductId, script_id: &str) -> Result<()> {
        self.record(Call::AddScript {
            script_id: script_id.to_string(),
        });
        Ok(())
    }
}

/// Progress sink that checks the monotone-counter contract.
#[derive(Debug, Default)]
pub struct CountingProgress {
    pub total: usize,
    pub advanced: usize,
    pub finished: bool,
}

impl Progress for CountingProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.advanced = 0;
        self.finished = false;
    }

    fn advance(&mut self) {
        self.advanced += 1;
        assert!(
            self.advanced <= self.total,
            "progress advanced past its announced total"
        );
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

// Builders for test fixtures.

pub fn product_id(s: &str) -> ProductId {
    s.parse().unwrap()
}

pub fn product(id: &str, tree_id: Option<&str>) -> Product {
    Product {
        product_id: product_id(id),
        name: Some("Test product".to_string()),
        lifecycle_stage: Some("draft".to_string()),
        product_tree_id: tree_id.map(str::to_string),
        representation: None,
        scripts: None,
    }
}

pub fn node(id: &str, r#ref: &str, parent: Option<&str>) -> Node {
    Node {
        id: id.to_string(),
        r#ref: r#ref.to_string(),
        alias: format!("{} alias", r#ref),
        r#type: "t".to_string(),
        parent: parent.map(|p| NodeParent {
            id: p.to_string(),
            r#ref: None,
        }),
        fields: Vec::new(),
    }
}

pub fn field(r#ref: &str, text: &str) -> NodeField {
    NodeField {
        r#ref: r#ref.to_string(),
        alias: r#ref.to_uppercase(),
        r#type: "String".to_string(),
        resolver: Some(FieldResolver {
            text: text.to_string(),
            language: ResolverLanguage::Constant,
        }),
    }
}

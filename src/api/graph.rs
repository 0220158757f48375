//! `ProductApi` implementation backed by the platform's GraphQL schema.
//!
//! One instance per tenant connection. Documents are kept next to the calls
//! that send them; every operation label matches the GraphQL operation name
//! so server-side errors can be traced back.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Config;
use super::auth::AuthManager;
use super::client::GraphClient;
use super::models::{
    data_at, FieldResolver, Node, NodeType, Product, ProductId, ProductSchema, Script,
};
use super::port::{NodeCreate, NodePlacement, ProductApi};

const FETCH_PRODUCT: &str = r#"
fragment result on products {
    list {
        productId {
            plan
            type
            version
        }
        name
        lifecycleStage
        productTreeId
        representation
        scripts {
            type
            name
            inputSchema
            outputSchema
            sourceCode
            referenceSourceCodeUrl
            externalTableDataUrl
        }
    }
}

query products($skip: Int, $limit: Int, $sort: sortInput, $where: productWhereInput, $values: [keyValueInput]) {
    products: products_2(skip: $skip, limit: $limit, sort: $sort, where: $where, values: $values) {
        ...result
    }
}"#;

const CREATE_PRODUCT: &str = r#"
mutation cloneProduct(
    $productId: productIdInput!,
    $lifecycleStage: String = null,
    $productTreeId: String = null,
    $name: String = null,
    $productIdKey: String!,
) {
    createProduct(product: {
        productId: $productId,
        lifecycleStage: $lifecycleStage,
        productTreeId: $productTreeId
    }) {
        productId {
            plan
            type
            version
        }
        name
        lifecycleStage
        productTreeId
    }
    upsertL10n(l10n: {
        locale: "en-US",
        key: $productIdKey,
        value: $name
    }) {
        status
        errors
    }
}"#;

const UPDATE_PRODUCT_TREE_ID: &str = r#"
mutation updateProductTree($productId: productIdInput!, $productTreeId: String!) {
    updateProduct(productId: $productId, input: { productTreeId: $productTreeId }) {
        productTreeId
    }
}"#;

const UPDATE_PRODUCT_REPRESENTATION: &str = r#"
mutation updateRepresentation($productId: productIdInput!, $representation: String!) {
    updateProduct(productId: $productId, input: { representation: $representation }) {
        productTreeId
    }
}"#;

const FETCH_PRODUCT_TREE_NODES: &str = r#"
query listNodes($parentNodeId: ID!) {
    listNodes(parentNodeId: $parentNodeId) {
        ref
        id
        alias
        type
        parent {
            ref
            id
        }
        fields {
            ref
            alias
            type
            resolver {
                text
                language
            }
        }
    }
}"#;

const CREATE_NODE: &str = r#"
mutation importNode(
    $id: ID!,
    $ref: String!,
    $type: String!,
    $alias: String!,
    $position: NodePositionInput,
    $fields: [NodeFieldInput!]
) {
    createNode(node: {
        id: $id
        ref: $ref
        type: $type
        alias: $alias
        position: $position
        fields: $fields
    })
}"#;

const CREATE_NODE_TREE: &str = r#"
mutation importTree(
    $id: ID!,
    $ref: String!,
    $type: String!,
    $alias: String!,
    $children: [NodeInput!],
    $fields: [NodeFieldInput!]
) {
    createNode(node: {
        id: $id
        ref: $ref
        type: $type
        alias: $alias
        children: $children
        fields: $fields
    })
}"#;

const ATTACH_FIELD_RESOLVER: &str = r#"
mutation attachResolver($nodeId: ID!, $fieldName: String!, $text: String!, $language: Language!) {
    attachOrReplaceNodeFieldResolver(nodeId: $nodeId, input: {
        fieldName: $fieldName,
        resolver: {
            text: $text,
            language: $language
        }
    })
}"#;

const FETCH_PRODUCT_SCHEMA: &str = r#"
query productSchema($nodeId: ID!) {
    productSchema(nodeId: $nodeId) {
        id
        nodeId
        dataSchema
        uiSchemas {
            name
            schema
        }
    }
}"#;

const CREATE_PRODUCT_SCHEMA: &str = r#"
mutation updateSchema($nodeId: ID!, $dataSchema: String!) {
    createProductSchema(input: {
        nodeId: $nodeId,
        dataSchema: $dataSchema
    }) {
        value
        status
    }
}"#;

const CREATE_UI_PRODUCT_SCHEMA: &str = r#"
mutation updateUiSchema($productSchemaId: ID!, $name: String!, $schema: String!) {
    addUiSchemaToProductSchema(
        productSchemaId: $productSchemaId
        input: {
            name: $name,
            schema: $schema
        }
    ) {
        status
        errors
    }
}"#;

const FETCH_NODE_TYPES: &str = r#"
query nodeTypes {
    nodeTypes {
        id
        ref
        alias
        type
        fields {
            ref
            alias
            type
            resolver {
                text
                language
            }
        }
    }
}"#;

const DEFINE_NODE_TYPE: &str = r#"
mutation importNodeType($typeName: String!, $fields: [NodeFieldInput!]) {
    defineNodeType(typeName: $typeName, fields: $fields)
}"#;

const CREATE_SCRIPT: &str = r#"
mutation importScript($script: scriptInput!) {
    createScript(script: $script) {
        createdStatus {
            id
        }
    }
}"#;

const ADD_SCRIPT_TO_PRODUCT: &str = r#"
mutation attachScript($productId: productIdInput!, $scriptId: String!) {
    addScriptToProduct(productId: $productId, scriptId: $scriptId) {
        status
    }
}"#;

/// GraphQL-backed remote access to one tenant.
pub struct GraphApi {
    client: GraphClient,
}

impl GraphApi {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Resolve `alias` through the configuration, authenticate, and return a
    /// connected API.
    pub async fn connect(config: &Config, auth: &mut AuthManager, alias: &str) -> Result<Self> {
        let (tenant, environment) = config.tenant_with_environment(alias)?;
        let token = auth.token_for(alias, &environment, &tenant).await?;
        let client = GraphClient::new(&environment.endpoint, token)?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ProductApi for GraphApi {
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let variables = json!({
            "where": {
                "productId": {
                    "plan": id.plan,
                    "type": id.r#type,
                    "version": id.version,
                }
            }
        });
        let data = self
            .client
            .execute("query:fetchProduct", FETCH_PRODUCT, variables)
            .await?;
        let mut list: Vec<Product> = data_at(&data, "products.list")?;
        Ok(if list.is_empty() {
            None
        } else {
            Some(list.remove(0))
        })
    }

    async fn create_product(&self, product: &Product) -> Result<Product> {
        let id = &product.product_id;
        let variables = json!({
            "productId": id,
            "name": product.name,
            "lifecycleStage": product.lifecycle_stage,
            "productTreeId": product.product_tree_id,
            "productIdKey": format!("products-{}|{}|{}-name", id.plan, id.version, id.r#type),
        });
        let data = self
            .client
            .execute("mutation:createProduct", CREATE_PRODUCT, variables)
            .await?;
        data_at(&data, "createProduct")
    }

    async fn update_product_tree_id(&self, id: &ProductId, product_tree_id: &str) -> Result<()> {
        let variables = json!({
            "productId": id,
            "productTreeId": product_tree_id,
        });
        self.client
            .execute(
                "mutation:updateProductTreeIdOnProduct",
                UPDATE_PRODUCT_TREE_ID,
                variables,
            )
            .await?;
        Ok(())
    }

    async fn update_product_representation(
        &self,
        id: &ProductId,
        representation: &str,
    ) -> Result<()> {
        let variables = json!({
            "productId": id,
            "representation": representation,
        });
        self.client
            .execute(
                "mutation:updateProductRepresentation",
                UPDATE_PRODUCT_REPRESENTATION,
                variables,
            )
            .await?;
        Ok(())
    }

    async fn fetch_product_tree_nodes(&self, root_node_id: &str) -> Result<Vec<Node>> {
        let variables = json!({ "parentNodeId": root_node_id });
        let data = self
            .client
            .execute("query:fetchProductTree", FETCH_PRODUCT_TREE_NODES, variables)
            .await?;
        data_at(&data, "listNodes")
    }

    async fn create_node(&self, node: &NodeCreate) -> Result<Option<String>> {
        let mut variables = json!({
            "id": node.id,
            "ref": node.r#ref,
            "type": node.r#type,
            "alias": node.alias,
            "fields": node.fields,
        });
        let document = match &node.placement {
            NodePlacement::Root => CREATE_NODE,
            NodePlacement::Under { parent_id } => {
                variables["position"] = json!({ "parentId": parent_id });
                CREATE_NODE
            }
            NodePlacement::Children(children) => {
                variables["children"] = serde_json::to_value(children)?;
                CREATE_NODE_TREE
            }
        };
        let data = self
            .client
            .execute("mutation:createNode", document, variables)
            .await?;
        Ok(data
            .get("createNode")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn attach_field_resolver(
        &self,
        node_id: &str,
        field_ref: &str,
        resolver: &FieldResolver,
    ) -> Result<()> {
        let variables = json!({
            "nodeId": node_id,
            "fieldName": field_ref,
            "text": resolver.text,
            "language": resolver.language,
        });
        self.client
            .execute(
                "mutation:attachFieldResolver",
                ATTACH_FIELD_RESOLVER,
                variables,
            )
            .await?;
        Ok(())
    }

    async fn fetch_product_schema(&self, node_id: &str) -> Result<Option<ProductSchema>> {
        let variables = json!({ "nodeId": node_id });
        let data = self
            .client
            .execute("query:fetchProductSchema", FETCH_PRODUCT_SCHEMA, variables)
            .await?;
        match data.get("productSchema") {
            None | Some(Value::Null) => Ok(None),
            Some(schema) => Ok(Some(serde_json::from_value(schema.clone())?)),
        }
    }

    async fn create_product_schema(&self, node_id: &str, data_schema: &str) -> Result<String> {
        let variables = json!({
            "nodeId": node_id,
            "dataSchema": data_schema,
        });
        let data = self
            .client
            .execute(
                "mutation:createProductDataSchema",
                CREATE_PRODUCT_SCHEMA,
                variables,
            )
            .await?;
        data_at(&data, "createProductSchema.value")
    }

    async fn create_ui_product_schema(
        &self,
        product_schema_id: &str,
        name: &str,
        schema: &str,
    ) -> Result<()> {
        let variables = json!({
            "productSchemaId": product_schema_id,
            "name": name,
            "schema": schema,
        });
        self.client
            .execute(
                "mutation:createProductUiDataSchema",
                CREATE_UI_PRODUCT_SCHEMA,
                variables,
            )
            .await?;
        Ok(())
    }

    async fn fetch_node_types(&self) -> Result<Vec<NodeType>> {
        let data = self
            .client
            .execute("query:fetchAllNodeTypes", FETCH_NODE_TYPES, json!({}))
            .await?;
        data_at(&data, "nodeTypes")
    }

    async fn create_node_type(&self, node_type: &NodeType) -> Result<()> {
        // The registry accepts fields without resolvers only reluctantly;
        // normalize to the empty-constant convention before sending.
        let fields: Vec<Value> = node_type
            .fields
            .iter()
            .map(|field| {
                let resolver = field
                    .resolver
                    .clone()
                    .unwrap_or_else(FieldResolver::empty);
                json!({
                    "ref": field.r#ref,
                    "type": field.r#type,
                    "alias": field.alias,
                    "resolver": resolver,
                })
            })
            .collect();
        let variables = json!({
            "typeName": node_type.r#type,
            "fields": fields,
        });
        self.client
            .execute("mutation:createNodeType", DEFINE_NODE_TYPE, variables)
            .await?;
        Ok(())
    }

    async fn create_script(&self, script: &Script) -> Result<Option<String>> {
        let variables = json!({ "script": script });
        let data = self
            .client
            .execute("mutation:createScript", CREATE_SCRIPT, variables)
            .await?;
        Ok(data
            .pointer("/createScript/createdStatus/id")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn add_script_to_product(&self, id: &ProductId, script_id: &str) -> Result<()> {
        let variables = json!({
            "productId": id,
            "scriptId": script_id,
        });
        self.client
            .execute(
                "mutation:addScriptToProduct",
                ADD_SCRIPT_TO_PRODUCT,
                variables,
            )
            .await?;
        Ok(())
    }
}

//! Wire types shared between the GraphQL transport and the copy engine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composite product key, serialized on the wire as an object and on the
/// command line as a `plan/type/version` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductId {
    pub plan: String,
    pub r#type: String,
    pub version: String,
}

impl FromStr for ProductId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        let (plan, r#type, version) = (parts.next(), parts.next(), parts.next());
        match (plan, r#type, version, parts.next()) {
            (Some(plan), Some(r#type), Some(version), None)
                if !plan.is_empty() && !r#type.is_empty() && !version.is_empty() =>
            {
                Ok(Self {
                    plan: plan.to_string(),
                    r#type: r#type.to_string(),
                    version: version.to_string(),
                })
            }
            _ => anyhow::bail!("Invalid product id '{}', expected `plan/type/version`", s),
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.plan, self.r#type, self.version)
    }
}

/// A product definition as returned by the `products_2` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lifecycle_stage: Option<String>,
    /// Root node id of this product's tree on its home tenant. Tenant-local,
    /// must be reassigned after a tree copy.
    #[serde(default)]
    pub product_tree_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Vec<Script>>,
}

/// One element of a product configuration tree, in the flat parent-pointer
/// form the source tenant returns from `listNodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub r#ref: String,
    pub alias: String,
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeParent>,
    #[serde(default)]
    pub fields: Vec<NodeField>,
}

/// Back-reference to a node's parent within the same flat list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeParent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
}

/// A named, typed field attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeField {
    pub r#ref: String,
    pub alias: String,
    pub r#type: String,
    #[serde(default)]
    pub resolver: Option<FieldResolver>,
}

impl NodeField {
    /// The synthetic field injected when a node carries no fields of its own;
    /// node creation rejects an empty field list.
    pub fn placeholder() -> Self {
        Self {
            r#ref: "meta".to_string(),
            alias: "Meta".to_string(),
            r#type: "String".to_string(),
            resolver: Some(FieldResolver::empty()),
        }
    }
}

/// A field's computation or constant, `{text, language}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResolver {
    pub text: String,
    pub language: ResolverLanguage,
}

impl FieldResolver {
    /// Empty constant resolver, the platform's "no value yet" convention.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            language: ResolverLanguage::Constant,
        }
    }
}

/// Resolver language accepted by the platform's `Language` GraphQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolverLanguage {
    Constant,
    Expression,
    Javascript,
}

/// Data schema plus its named UI schema variants, keyed to a tree root node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSchema {
    pub id: String,
    pub node_id: String,
    /// JSON Schema document, carried opaquely as a string.
    pub data_schema: String,
    #[serde(default)]
    pub ui_schemas: Vec<UiSchema>,
}

/// A named UI schema variant. `name` holds the root node id of the tree the
/// variant was authored against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSchema {
    pub name: String,
    pub schema: String,
}

/// A node in the nested child-list form accepted by the destination's
/// tree-creation call. The flat parent-pointer form is what sources return;
/// this is what a single transactional `createNode` consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub r#ref: String,
    pub alias: String,
    pub r#type: String,
    pub fields: Vec<NodeField>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// An entry of a tenant's node type registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub r#type: String,
    #[serde(default)]
    pub fields: Vec<NodeField>,
}

/// Executable logic attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub r#type: String,
    pub name: String,
    #[serde(default)]
    pub input_schema: Option<String>,
    #[serde(default)]
    pub output_schema: Option<String>,
    #[serde(default)]
    pub source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_source_code_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_table_data_url: Option<String>,
}

/// Extract a typed value from a GraphQL `data` payload by dotted path.
pub fn data_at<T: serde::de::DeserializeOwned>(data: &serde_json::Value, path: &str) -> Result<T> {
    let mut cursor = data;
    for segment in path.split('.') {
        cursor = cursor
            .get(segment)
            .with_context(|| format!("Missing `{}` in response payload", path))?;
    }
    serde_json::from_value(cursor.clone())
        .with_context(|| format!("Unexpected shape at `{}` in response payload", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_round_trips_through_string_form() {
        let id: ProductId = "base/health/1".parse().unwrap();
        assert_eq!(id.plan, "base");
        assert_eq!(id.r#type, "health");
        assert_eq!(id.version, "1");
        assert_eq!(id.to_string(), "base/health/1");
    }

    #[test]
    fn product_id_rejects_wrong_segment_counts() {
        assert!("base/health".parse::<ProductId>().is_err());
        assert!("base/health/1/extra".parse::<ProductId>().is_err());
        assert!("//1".parse::<ProductId>().is_err());
        assert!("".parse::<ProductId>().is_err());
    }

    #[test]
    fn node_deserializes_with_missing_fields_and_parent() {
        let node: Node = serde_json::from_str(
            r#"{"id":"root1","ref":"r","alias":"Root","type":"section"}"#,
        )
        .unwrap();
        assert!(node.parent.is_none());
        assert!(node.fields.is_empty());
    }

    #[test]
    fn resolver_language_uses_wire_casing() {
        let json = serde_json::to_string(&ResolverLanguage::Constant).unwrap();
        assert_eq!(json, "\"CONSTANT\"");
        let lang: ResolverLanguage = serde_json::from_str("\"JAVASCRIPT\"").unwrap();
        assert_eq!(lang, ResolverLanguage::Javascript);
    }

    #[test]
    fn placeholder_field_matches_platform_convention() {
        let field = NodeField::placeholder();
        assert_eq!(field.r#ref, "meta");
        assert_eq!(field.r#type, "String");
        let resolver = field.resolver.unwrap();
        assert_eq!(resolver.text, "");
        assert_eq!(resolver.language, ResolverLanguage::Constant);
    }
}

//! Remote access to a tenant's GraphQL backend.
//!
//! `port::ProductApi` is the capability the copy engine is programmed
//! against; `graph::GraphApi` is its production implementation on top of the
//! pooled `client::GraphClient` transport and `auth` token acquisition.

pub mod auth;
pub mod client;
pub mod graph;
pub mod models;
pub mod port;
pub mod resilience;

pub use auth::{AuthManager, TokenInfo};
pub use client::GraphClient;
pub use graph::GraphApi;
pub use models::{
    FieldResolver, Node, NodeField, NodeParent, NodeType, Product, ProductId, ProductSchema,
    ResolverLanguage, Script, TreeNode, UiSchema,
};
pub use port::{NodeCreate, NodePlacement, ProductApi};
pub use resilience::{Pacer, ReplayConfig, RetryPolicy};

//! Tenant-to-tenant replication pipelines built on the tree engine and the
//! remote access port.

pub mod copier;
pub mod node_types;

pub use copier::{assign_tree, copy_schema, replay_tree, ProductCopier};
pub use node_types::{copy_node_types, replicate_node_types};

//! The product-tree copy engine: id generation, tree rebuild under fresh
//! ids, and ordered replay against a destination tenant.

pub mod id;
pub mod rebuild;
pub mod replay;

pub use id::{HexIds, IdGenerator, SequenceIds};
pub use rebuild::{rebuild, RebuiltNode, RebuiltTree};
pub use replay::{ConsoleProgress, Progress, ReplayEngine, TreeShape};

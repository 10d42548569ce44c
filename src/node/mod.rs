//! Assembly of a running HDS node from configuration.

mod builder;
mod node;

pub use builder::*;
pub use node::*;

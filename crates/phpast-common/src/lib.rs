pub mod message;
pub mod source;
pub mod tree;

pub use source::{Location, Position};
pub use tree::{Node, NodeKind};

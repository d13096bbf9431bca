//! Proofdiff document tree
//!
//! In-memory representation of a structured document: elements, text,
//! attributes, plus the navigation and mutation primitives the
//! transformation engine needs.

mod node;
mod tree;
mod error;
mod query;

pub use node::{Node, NodeId, NodeType, ElementData};
pub use tree::DomTree;
pub use error::{DomError, DomResult};
pub use query::Queryable;

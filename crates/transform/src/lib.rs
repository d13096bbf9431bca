//! Proofdiff transformation engine
//!
//! Selector matching against the document tree, the rule-driven tree
//! mutation engine, and flat-text serialization of the result.

pub mod matching;
pub mod engine;
pub mod serialize;

pub use matching::matches_selector;
pub use engine::{apply_stylesheet, CaseTransform, GraftStep, TransformError};
pub use serialize::serialize_text;

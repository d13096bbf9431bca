//! Tree query helpers (by id, tag name, class name)

use crate::node::NodeId;
use crate::tree::DomTree;

/// Trait for querying the document tree
pub trait Queryable {
    /// Find an element by its ID attribute
    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Find elements by tag name
    fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId>;

    /// Find elements by class name
    fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId>;
}

impl Queryable for DomTree {
    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.document_id()).into_iter().find(|&node_id| {
            self.get(node_id)
                .and_then(|n| n.as_element())
                .map(|e| e.id() == Some(id))
                .unwrap_or(false)
        })
    }

    fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        let tag_lower = tag_name.to_ascii_lowercase();
        self.descendants(self.document_id())
            .into_iter()
            .filter(|&node_id| {
                self.get(node_id)
                    .and_then(|n| n.as_element())
                    .map(|e| e.tag_name == tag_lower)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId> {
        self.descendants(self.document_id())
            .into_iter()
            .filter(|&node_id| {
                self.get(node_id)
                    .and_then(|n| n.as_element())
                    .map(|e| e.has_class(class_name))
                    .unwrap_or(false)
            })
            .collect()
    }
}

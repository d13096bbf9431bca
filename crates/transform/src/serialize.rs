//! Flat-text serialization
//!
//! Lowers a transformed document tree to plain text: depth-first,
//! suppressed subtrees and comments skipped, text emitted verbatim, one
//! newline per block-level element.

use proofdiff_dom::{DomTree, NodeId, NodeType};

/// Serialize the subtree rooted at `root` to flat text
pub fn serialize_text(tree: &DomTree, root: NodeId) -> String {
    let mut out = String::new();
    visit(tree, root, &mut out);
    out
}

fn visit(tree: &DomTree, id: NodeId, out: &mut String) {
    let node = match tree.get(id) {
        Some(node) => node,
        None => return,
    };

    match &node.node_type {
        NodeType::Text(text) => out.push_str(text),
        NodeType::Comment(_) => {}
        NodeType::Document => {
            for &child in &node.children {
                visit(tree, child, out);
            }
        }
        NodeType::Element(elem) => {
            if elem.suppressed {
                return;
            }
            for &child in &node.children {
                visit(tree, child, out);
            }
            if is_block_element(&elem.tag_name) {
                out.push('\n');
            }
        }
    }
}

/// Block-level elements get a line break of their own
fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "br" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofdiff_html::HtmlParser;

    fn lower(html: &str) -> String {
        let tree = HtmlParser::new().parse(html).unwrap();
        serialize_text(&tree, tree.document_id())
    }

    #[test]
    fn test_inline_text_verbatim() {
        assert_eq!(lower("<span>one</span> two"), "one two");
    }

    #[test]
    fn test_block_elements_break_lines() {
        assert_eq!(lower("<p>one</p><p>two</p>"), "one\ntwo\n");
    }

    #[test]
    fn test_br_breaks_line() {
        assert_eq!(lower("<p>one<br>two</p>"), "one\ntwo\n");
    }

    #[test]
    fn test_headings_and_list_items() {
        assert_eq!(lower("<h1>Title</h1><ul><li>a</li><li>b</li></ul>"), "Title\na\nb\n");
    }

    #[test]
    fn test_suppressed_subtree_skipped() {
        let mut tree = HtmlParser::new()
            .parse("<p><span>hide me</span>keep</p>")
            .unwrap();
        let span = proofdiff_dom::Queryable::get_elements_by_tag_name(&tree, "span")[0];
        tree.get_mut(span).unwrap().as_element_mut().unwrap().suppressed = true;
        assert_eq!(serialize_text(&tree, tree.document_id()), "keep\n");
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(lower("<p>a<!-- hidden -->b</p>"), "ab\n");
    }
}

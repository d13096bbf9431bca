//! HTML tree builder
//!
//! Constructs a document tree from HTML tokens.

use proofdiff_dom::{DomTree, NodeId, NodeType};

use crate::error::HtmlResult;
use crate::tokenizer::{Token, Tokenizer};

/// HTML parser that builds a document tree
pub struct HtmlParser {
    tree: DomTree,
    open_elements: Vec<NodeId>,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            tree: DomTree::new(),
            open_elements: Vec::new(),
        }
    }

    /// Parse HTML string into a document tree
    pub fn parse(mut self, html: &str) -> HtmlResult<DomTree> {
        let mut tokenizer = Tokenizer::new(html);

        loop {
            let token = tokenizer.next_token()?;
            if token == Token::Eof {
                break;
            }
            self.process_token(token)?;
        }

        Ok(self.tree)
    }

    fn process_token(&mut self, token: Token) -> HtmlResult<()> {
        match token {
            Token::Doctype => {}

            Token::StartTag { name, attributes, self_closing } => {
                self.handle_start_tag(&name, attributes, self_closing)?;
            }

            Token::EndTag { name } => {
                self.handle_end_tag(&name);
            }

            Token::Text(text) => {
                if !text.is_empty() {
                    self.handle_text(text)?;
                }
            }

            Token::Comment(text) => {
                let comment = self.tree.create_comment(text);
                let parent = self.current_node();
                self.tree.append_child(parent, comment).ok();
            }

            Token::Eof => {}
        }
        Ok(())
    }

    fn handle_start_tag(
        &mut self,
        name: &str,
        attributes: smallvec::SmallVec<[(String, String); 4]>,
        self_closing: bool,
    ) -> HtmlResult<()> {
        let element_id = self.tree.create_element(name);

        if let Some(elem) = self.tree.get_mut(element_id).and_then(|n| n.as_element_mut()) {
            for (key, value) in attributes {
                elem.set_attribute(key, value);
            }
        }

        self.ensure_implicit_elements(name);

        let parent = self.current_node();
        self.tree.append_child(parent, element_id).ok();

        // Push to open elements (unless self-closing or void element)
        if !self_closing && !is_void_element(name) {
            self.open_elements.push(element_id);
        }

        Ok(())
    }

    fn handle_end_tag(&mut self, name: &str) {
        // Find the matching open element; unmatched end tags are ignored
        for i in (0..self.open_elements.len()).rev() {
            let element_id = self.open_elements[i];
            if self.tree.get(element_id).and_then(|n| n.tag_name()) == Some(name) {
                self.open_elements.truncate(i);
                return;
            }
        }
    }

    fn handle_text(&mut self, text: String) -> HtmlResult<()> {
        if self.open_elements.is_empty() && text.trim().is_empty() {
            // Inter-element whitespace before any element
            return Ok(());
        }
        if self.open_elements.is_empty() {
            self.ensure_implicit_elements("#text");
        }

        let parent = self.current_node();

        // Merge with a trailing text node if there is one
        if let Some(&last_child_id) = self.tree.get(parent).and_then(|n| n.children.last()) {
            if let Some(last_child) = self.tree.get_mut(last_child_id) {
                if let NodeType::Text(ref mut existing) = last_child.node_type {
                    existing.push_str(&text);
                    return Ok(());
                }
            }
        }

        let text_id = self.tree.create_text(text);
        self.tree.append_child(parent, text_id).ok();
        Ok(())
    }

    fn current_node(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or(self.tree.document_id())
    }

    /// Ensure implicit html/body elements exist
    fn ensure_implicit_elements(&mut self, incoming_tag: &str) {
        if self.open_elements.is_empty() && incoming_tag != "html" {
            let html = self.tree.create_element("html");
            self.tree.append_child(self.tree.document_id(), html).ok();
            self.open_elements.push(html);
        }

        if self.open_elements.len() == 1 {
            let top_tag = self.tree.get(self.open_elements[0]).and_then(|n| n.tag_name());

            if top_tag == Some("html")
                && incoming_tag != "html"
                && incoming_tag != "head"
                && incoming_tag != "body"
                && is_body_content(incoming_tag)
            {
                let body = self.tree.create_element("body");
                let html = self.open_elements[0];
                self.tree.append_child(html, body).ok();
                self.open_elements.push(body);
            }
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if an element is a void element (never has content)
fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input"
        | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

/// Check if a tag belongs in body (not head)
fn is_body_content(name: &str) -> bool {
    !matches!(
        name,
        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes"
        | "script" | "style" | "template" | "title"
    )
}

//! Tree transformation engine
//!
//! Walks stylesheet rules in order and applies the declared mutations to
//! the document tree. Declarations are compiled to a closed set of
//! tagged operations first; unknown properties and malformed value lists
//! are reported and skipped. For each rule the set of matching elements
//! is snapshotted before anything mutates, so a rule observes a
//! consistent view of the tree even when it re-parents elements.

use log::warn;
use thiserror::Error;

use proofdiff_css::{Declaration, PseudoElement, SourceLocation, Stylesheet, Value};
use proofdiff_dom::{DomError, DomTree, NodeId};

use crate::matching::matches_selector;

/// Per-declaration or per-element transform failures. These never abort
/// the run; they are collected and the remaining work continues.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unsupported property '{property}' at {location}")]
    UnknownProperty {
        property: String,
        location: SourceLocation,
    },

    #[error("{property} takes {expected} at {location}")]
    BadArity {
        property: String,
        expected: &'static str,
        location: SourceLocation,
    },

    #[error("{property}: invalid value '{value}' at {location}")]
    InvalidValue {
        property: String,
        value: String,
        location: SourceLocation,
    },

    #[error("_graft: no {step} to follow for element {element}")]
    GraftStep { step: &'static str, element: NodeId },

    #[error("_graft: target lies inside the grafted element {element}")]
    GraftCycle { element: NodeId },

    #[error("tree operation failed: {0}")]
    Tree(#[from] DomError),
}

/// Case transform for `text-transform`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    Uppercase,
    Lowercase,
    Capitalize,
}

/// One step of a `_graft` path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraftStep {
    Parent,
    PrevSib,
    NextSib,
}

/// One piece of a `content` value list
#[derive(Debug, Clone)]
enum ContentPart {
    /// Quoted literal
    Literal(String),
    /// `attr(NAME)`: the element's attribute, empty string when absent
    Attr(String),
    /// Bare `content`: the element's current leading text run
    SelfText,
}

/// A compiled declaration
#[derive(Debug)]
enum Op {
    Content(Vec<ContentPart>),
    TextTransform(CaseTransform),
    TextReplace { needle: String, replacement: String },
    DisplayNone,
    ReplaceWithAttr(String),
    Graft(Vec<GraftStep>),
}

/// Run every rule of the stylesheet over the tree, in order. Returns
/// the transform errors encountered; the tree is left in whatever state
/// the successfully applied declarations produced.
pub fn apply_stylesheet(tree: &mut DomTree, sheet: &Stylesheet) -> Vec<TransformError> {
    let mut errors = Vec::new();

    for rule in &sheet.rules {
        let mut ops = Vec::new();
        for decl in &rule.declarations {
            match compile_declaration(decl) {
                Ok(Some(op)) => ops.push(op),
                Ok(None) => {}
                Err(err) => {
                    warn!("transform: {}", err);
                    errors.push(err);
                }
            }
        }
        if ops.is_empty() {
            continue;
        }

        // Snapshot the match set of every selector before applying
        // anything, so the whole rule sees the same tree.
        let document_id = tree.document_id();
        let snapshot: Vec<(Option<PseudoElement>, Vec<NodeId>)> = rule
            .selectors
            .iter()
            .map(|selector| {
                let matched = tree
                    .descendants(document_id)
                    .into_iter()
                    .filter(|&id| tree.get(id).map(|n| n.is_element()).unwrap_or(false))
                    .filter(|&id| matches_selector(tree, id, selector))
                    .collect();
                (selector.pseudo_element(), matched)
            })
            .collect();

        for (pseudo, elements) in snapshot {
            for element in elements {
                for op in &ops {
                    if let Err(err) = apply_op(tree, element, op, pseudo) {
                        warn!("transform: {}", err);
                        errors.push(err);
                    }
                }
            }
        }
    }

    errors
}

/// Compile one declaration into an operation. `Ok(None)` means the
/// declaration is recognized but has no effect (e.g. `display` values
/// other than `none`).
fn compile_declaration(decl: &Declaration) -> Result<Option<Op>, TransformError> {
    match decl.property.as_str() {
        "content" => {
            let mut parts = Vec::new();
            for value in &decl.values {
                match value {
                    Value::Str(s) => parts.push(ContentPart::Literal(s.clone())),
                    Value::Attr(name) => parts.push(ContentPart::Attr(name.clone())),
                    Value::Ident(ident) if ident == "content" => parts.push(ContentPart::SelfText),
                    Value::Ident(other) => {
                        return Err(TransformError::InvalidValue {
                            property: decl.property.clone(),
                            value: other.clone(),
                            location: decl.location,
                        })
                    }
                }
            }
            Ok(Some(Op::Content(parts)))
        }

        "text-transform" => {
            if decl.values.len() != 1 {
                return Err(TransformError::BadArity {
                    property: decl.property.clone(),
                    expected: "1 argument",
                    location: decl.location,
                });
            }
            let transform = match &decl.values[0] {
                Value::Ident(v) if v == "uppercase" => CaseTransform::Uppercase,
                Value::Ident(v) if v == "lowercase" => CaseTransform::Lowercase,
                Value::Ident(v) if v == "capitalize" => CaseTransform::Capitalize,
                other => {
                    return Err(TransformError::InvalidValue {
                        property: decl.property.clone(),
                        value: format!("{:?}", other),
                        location: decl.location,
                    })
                }
            };
            Ok(Some(Op::TextTransform(transform)))
        }

        "text-replace" => {
            let mut literals = decl.values.iter().filter_map(|v| match v {
                Value::Str(s) => Some(s.clone()),
                Value::Ident(s) => Some(s.clone()),
                Value::Attr(_) => None,
            });
            match (literals.next(), literals.next(), decl.values.len()) {
                (Some(needle), Some(replacement), 2) => {
                    Ok(Some(Op::TextReplace { needle, replacement }))
                }
                _ => Err(TransformError::BadArity {
                    property: decl.property.clone(),
                    expected: "2 string arguments",
                    location: decl.location,
                }),
            }
        }

        "display" => {
            // Only `none` is honored
            if decl.values == [Value::Ident("none".to_string())] {
                Ok(Some(Op::DisplayNone))
            } else {
                Ok(None)
            }
        }

        "_replace_with_attr" => match decl.values.as_slice() {
            [Value::Ident(name)] | [Value::Str(name)] => {
                Ok(Some(Op::ReplaceWithAttr(name.clone())))
            }
            _ => Err(TransformError::BadArity {
                property: decl.property.clone(),
                expected: "1 attribute name",
                location: decl.location,
            }),
        },

        "_graft" => {
            if decl.values.is_empty() {
                return Err(TransformError::BadArity {
                    property: decl.property.clone(),
                    expected: "at least one argument",
                    location: decl.location,
                });
            }
            let mut steps = Vec::new();
            for value in &decl.values {
                let step = match value {
                    Value::Ident(v) if v == "parent" => GraftStep::Parent,
                    Value::Ident(v) if v == "prev-sib" => GraftStep::PrevSib,
                    Value::Ident(v) if v == "next-sib" => GraftStep::NextSib,
                    other => {
                        return Err(TransformError::InvalidValue {
                            property: decl.property.clone(),
                            value: format!("{:?}", other),
                            location: decl.location,
                        })
                    }
                };
                steps.push(step);
            }
            Ok(Some(Op::Graft(steps)))
        }

        _ => Err(TransformError::UnknownProperty {
            property: decl.property.clone(),
            location: decl.location,
        }),
    }
}

fn apply_op(
    tree: &mut DomTree,
    element: NodeId,
    op: &Op,
    pseudo: Option<PseudoElement>,
) -> Result<(), TransformError> {
    match op {
        Op::Content(parts) => {
            let content = resolve_content(tree, element, parts);
            match pseudo {
                None => tree.set_leading_text(element, content)?,
                Some(PseudoElement::Before) => {
                    let text_id = tree.create_text(content);
                    match tree.children(element).first().copied() {
                        Some(first) => tree.insert_before(element, first, text_id)?,
                        None => tree.append_child(element, text_id)?,
                    }
                }
                Some(PseudoElement::After) => {
                    let text_id = tree.create_text(content);
                    tree.append_child(element, text_id)?;
                }
            }
            Ok(())
        }

        Op::TextTransform(transform) => {
            rewrite_descendant_text(tree, element, |text| apply_case(text, *transform));
            Ok(())
        }

        Op::TextReplace { needle, replacement } => {
            rewrite_descendant_text(tree, element, |text| text.replace(needle, replacement));
            Ok(())
        }

        Op::DisplayNone => {
            if let Some(elem) = tree.get_mut(element).and_then(|n| n.as_element_mut()) {
                elem.suppressed = true;
            }
            Ok(())
        }

        Op::ReplaceWithAttr(name) => {
            let value = tree
                .get(element)
                .and_then(|n| n.as_element())
                .and_then(|e| e.get_attribute(name))
                .unwrap_or("")
                .to_string();
            tree.set_leading_text(element, value)?;
            Ok(())
        }

        Op::Graft(steps) => apply_graft(tree, element, steps),
    }
}

/// Resolve a `content` value list against an element
fn resolve_content(tree: &DomTree, element: NodeId, parts: &[ContentPart]) -> String {
    let mut result = String::new();
    for part in parts {
        match part {
            ContentPart::Literal(s) => result.push_str(s),
            ContentPart::Attr(name) => {
                if let Some(value) = tree
                    .get(element)
                    .and_then(|n| n.as_element())
                    .and_then(|e| e.get_attribute(name))
                {
                    result.push_str(value);
                }
            }
            ContentPart::SelfText => {
                if let Some(text) = tree
                    .leading_text(element)
                    .and_then(|id| tree.get(id))
                    .and_then(|n| n.as_text())
                {
                    result.push_str(text);
                }
            }
        }
    }
    result
}

/// Rewrite every text node in the subtree with `func`
fn rewrite_descendant_text<F: Fn(&str) -> String>(tree: &mut DomTree, element: NodeId, func: F) {
    for text_id in tree.descendant_text_nodes(element) {
        if let Some(text) = tree.get_mut(text_id).and_then(|n| n.as_text_mut()) {
            *text = func(text);
        }
    }
}

/// Apply a case transform
fn apply_case(text: &str, transform: CaseTransform) -> String {
    match transform {
        CaseTransform::Uppercase => text.to_uppercase(),
        CaseTransform::Lowercase => text.to_lowercase(),
        CaseTransform::Capitalize => capitalize_words(text),
    }
}

/// Uppercase the first alphabetic code point of each whitespace-delimited
/// word, lowercase the remaining alphabetic code points.
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
                at_word_start = false;
            } else {
                out.extend(c.to_lowercase());
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Detach the element and re-attach it as last child of the node reached
/// by following the step path from the element. On any failure the
/// element stays where it is.
fn apply_graft(
    tree: &mut DomTree,
    element: NodeId,
    steps: &[GraftStep],
) -> Result<(), TransformError> {
    let mut target = element;
    for step in steps {
        target = match step {
            GraftStep::Parent => tree.get(target).and_then(|n| n.parent),
            GraftStep::PrevSib => tree.prev_element_sibling(target),
            GraftStep::NextSib => tree.next_element_sibling(target),
        }
        .ok_or(TransformError::GraftStep {
            step: match step {
                GraftStep::Parent => "parent",
                GraftStep::PrevSib => "prev-sib",
                GraftStep::NextSib => "next-sib",
            },
            element,
        })?;
    }

    if target == element || tree.is_descendant_of(target, element) {
        return Err(TransformError::GraftCycle { element });
    }

    tree.detach(element)?;
    tree.append_child(target, element)?;
    Ok(())
}

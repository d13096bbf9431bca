//! Selector matching
//!
//! Matches compound selectors against elements of the document tree,
//! right-to-left. Pseudo-elements never affect matching; they only pick
//! the insertion slot for `content`. There is no specificity.

use proofdiff_css::{AttributeOp, Combinator, Selector, SelectorPart};
use proofdiff_dom::{DomTree, ElementData, NodeId};

/// Check if a selector matches a specific element in the tree
pub fn matches_selector(tree: &DomTree, element_id: NodeId, selector: &Selector) -> bool {
    let parts = &selector.parts;

    if parts.is_empty() {
        return false;
    }

    // Start from the rightmost compound and walk back through combinators
    let mut current_element = element_id;
    let mut part_index = parts.len() - 1;

    loop {
        // Skip trailing combinators (shouldn't happen, but be safe)
        while part_index > 0 && matches!(parts[part_index], SelectorPart::Combinator(_)) {
            part_index -= 1;
        }

        // Find the bounds of the compound selector (consecutive
        // non-combinator parts)
        let compound_end = part_index;
        let mut compound_start = part_index;
        while compound_start > 0 && !matches!(parts[compound_start - 1], SelectorPart::Combinator(_)) {
            compound_start -= 1;
        }

        if !matches_compound(tree, current_element, &parts[compound_start..=compound_end]) {
            return false;
        }

        if compound_start == 0 {
            return true;
        }

        let combinator = match &parts[compound_start - 1] {
            SelectorPart::Combinator(c) => *c,
            _ => return false, // Shouldn't happen
        };

        part_index = if compound_start > 1 {
            compound_start - 2
        } else {
            return true;
        };

        current_element =
            match find_matching_element(tree, current_element, combinator, &parts[..=part_index]) {
                Some(id) => id,
                None => return false,
            };
    }
}

/// Match a compound selector (consecutive simple selectors) against an element
fn matches_compound(tree: &DomTree, element_id: NodeId, parts: &[SelectorPart]) -> bool {
    let element = match tree.get(element_id).and_then(|n| n.as_element()) {
        Some(e) => e,
        None => return false,
    };

    parts.iter().all(|part| matches_simple_selector(element, part))
}

/// Match a single simple selector against an element
fn matches_simple_selector(element: &ElementData, part: &SelectorPart) -> bool {
    match part {
        SelectorPart::Universal => true,

        SelectorPart::Type(tag) => element.tag_name.eq_ignore_ascii_case(tag),

        SelectorPart::Class(class) => element.has_class(class),

        SelectorPart::Id(id) => element.id() == Some(id.as_str()),

        SelectorPart::Attribute { name, op, value } => {
            matches_attribute(element, name, op.as_ref(), value.as_deref())
        }

        // Pseudo-elements select the content slot, not the element
        SelectorPart::PseudoElement(_) => true,

        // Combinators are handled separately
        SelectorPart::Combinator(_) => true,
    }
}

/// Match an attribute selector
fn matches_attribute(
    element: &ElementData,
    name: &str,
    op: Option<&AttributeOp>,
    expected: Option<&str>,
) -> bool {
    let attr_value = match element.get_attribute(name) {
        Some(v) => v,
        None => return false,
    };

    let op = match op {
        Some(o) => o,
        None => return true, // [attr] just checks existence
    };

    let expected = match expected {
        Some(v) => v,
        None => return false,
    };

    match op {
        AttributeOp::Equals => attr_value == expected,
        AttributeOp::PrefixMatch => attr_value.starts_with(expected),
        AttributeOp::SuffixMatch => attr_value.ends_with(expected),
        AttributeOp::SubstringMatch => attr_value.contains(expected),
    }
}

/// Find an element matching the remaining selector parts based on combinator
fn find_matching_element(
    tree: &DomTree,
    start_element: NodeId,
    combinator: Combinator,
    remaining_parts: &[SelectorPart],
) -> Option<NodeId> {
    // Find compound selector bounds in remaining_parts
    let compound_end = remaining_parts.len() - 1;
    let mut compound_start = compound_end;
    while compound_start > 0
        && !matches!(remaining_parts[compound_start - 1], SelectorPart::Combinator(_))
    {
        compound_start -= 1;
    }

    let compound = &remaining_parts[compound_start..=compound_end];

    match combinator {
        Combinator::Descendant => {
            // Check all ancestors
            let mut current = tree.get(start_element)?.parent;
            while let Some(parent_id) = current {
                if matches_compound(tree, parent_id, compound) {
                    return Some(parent_id);
                }
                current = tree.get(parent_id)?.parent;
            }
            None
        }
        Combinator::Child => {
            // Check immediate parent only
            let parent_id = tree.get(start_element)?.parent?;
            if matches_compound(tree, parent_id, compound) {
                Some(parent_id)
            } else {
                None
            }
        }
        Combinator::NextSibling => {
            // Check the immediately preceding element sibling only
            let prev_id = tree.prev_element_sibling(start_element)?;
            if matches_compound(tree, prev_id, compound) {
                Some(prev_id)
            } else {
                None
            }
        }
        Combinator::SubsequentSibling => {
            // Check all preceding element siblings
            let mut current = tree.prev_element_sibling(start_element);
            while let Some(id) = current {
                if matches_compound(tree, id, compound) {
                    return Some(id);
                }
                current = tree.prev_element_sibling(id);
            }
            None
        }
    }
}

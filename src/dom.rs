//! Helpers over the live `kuchiki` document.

use kuchiki::traits::*;
use kuchiki::{parse_html, NodeRef};

use crate::error::PatchError;

/// Parse a full HTML document.
pub fn parse_document(html: &str) -> NodeRef {
    parse_html().one(html)
}

/// Parse `html` in a body context and return its top-level nodes, detached
/// from the scratch document they were parsed into.
pub fn parse_fragment(html: &str) -> Vec<NodeRef> {
    let scratch =
        parse_html().one(format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>"));
    let Ok(body) = scratch.select_first("body") else {
        return Vec::new();
    };
    let nodes: Vec<NodeRef> = body.as_node().children().collect();
    for node in &nodes {
        node.detach();
    }
    nodes
}

/// Resolve `selector` against `root` into an owned, document-ordered list so
/// the caller can mutate the tree while walking it.
pub fn select_all(root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, PatchError> {
    let matches = root
        .select(selector)
        .map_err(|_| PatchError::InvalidSelector(selector.to_string()))?;
    Ok(matches.map(|element| element.as_node().clone()).collect())
}

/// Child node at `index`, counting text and comment nodes as well as elements.
pub fn child_at(parent: &NodeRef, index: usize) -> Option<NodeRef> {
    parent.children().nth(index)
}

pub fn child_count(parent: &NodeRef) -> usize {
    parent.children().count()
}

pub fn get_attribute(node: &NodeRef, name: &str) -> Option<String> {
    let element = node.as_element()?;
    let attributes = element.attributes.borrow();
    attributes.get(name).map(str::to_string)
}

/// Returns false when `node` is not an element.
pub fn set_attribute(node: &NodeRef, name: &str, value: &str) -> bool {
    let Some(element) = node.as_element() else {
        return false;
    };
    element
        .attributes
        .borrow_mut()
        .insert(name, value.to_string());
    true
}

pub fn remove_attribute(node: &NodeRef, name: &str) -> bool {
    let Some(element) = node.as_element() else {
        return false;
    };
    element.attributes.borrow_mut().remove(name).is_some()
}

/// Detach every child of `node`, returning them in their former order.
pub fn take_children(node: &NodeRef) -> Vec<NodeRef> {
    let children: Vec<NodeRef> = node.children().collect();
    for child in &children {
        child.detach();
    }
    children
}

/// Serialize the children of `node`.
pub fn inner_html(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

/// Whether `node` is still reachable from `root` by parent links.
pub fn is_connected(node: &NodeRef, root: &NodeRef) -> bool {
    node.inclusive_ancestors().any(|ancestor| &ancestor == root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_keeps_text_and_element_nodes() {
        let nodes = parse_fragment("lead <b>bold</b> tail");
        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].as_text().is_some());
        assert!(nodes[1].as_element().is_some());
        assert!(nodes.iter().all(|node| node.parent().is_none()));
    }

    #[test]
    fn fragment_keeps_list_items_and_styles_in_body() {
        let nodes = parse_fragment("<style>p{}</style><li data-id=\"a\">x</li>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(get_attribute(&nodes[1], "data-id").as_deref(), Some("a"));
    }

    #[test]
    fn select_all_reports_bad_selector() {
        let document = parse_document("<div id=\"app\"></div>");
        assert!(matches!(
            select_all(&document, "#app["),
            Err(PatchError::InvalidSelector(_))
        ));
        assert_eq!(select_all(&document, "#app").unwrap().len(), 1);
        assert!(select_all(&document, "#missing").unwrap().is_empty());
    }

    #[test]
    fn child_indexing_counts_text_nodes() {
        let document = parse_document("<ul id=\"list\">a<li>b</li>c</ul>");
        let list = select_all(&document, "#list").unwrap().remove(0);
        assert_eq!(child_count(&list), 3);
        assert!(child_at(&list, 1).unwrap().as_element().is_some());
        assert!(child_at(&list, 3).is_none());
    }

    #[test]
    fn attribute_round_trip_on_text_node_is_refused() {
        let nodes = parse_fragment("text");
        assert!(!set_attribute(&nodes[0], "title", "x"));
        assert_eq!(get_attribute(&nodes[0], "title"), None);
    }
}

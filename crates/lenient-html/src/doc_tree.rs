//! A minimal in-memory document tree built by driving a [`TagBalancer`] to
//! completion. Most callers want the streaming [`Event`] API directly;
//! this is a convenience for callers that want a tree to walk.

use crate::element_table;
use crate::error::BalancerNotice;
use crate::events::{Attribute, DoctypeInfo, Event, QName};
use crate::location::Augmentations;
use crate::tag_balancer::TagBalancer;
use crate::tag_name::TagName;

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Element {
        name: QName,
        attributes: Vec<Attribute>,
    },
    Text(Box<str>),
    Comment(Box<str>),
    CData(Box<str>),
    ProcessingInstruction { target: Box<str>, data: Box<str> },
    Doctype(DoctypeInfo),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub augmentations: Augmentations,
    pub children: Vec<Node>,
}

impl Node {
    fn new(data: NodeData, augmentations: Augmentations) -> Self {
        Self {
            data,
            augmentations,
            children: Vec::new(),
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        }
    }
}

/// A parsed document: an ordered forest of top-level nodes (normally a
/// single `<html>` element plus any prolog comments/PIs/doctype).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub roots: Vec<Node>,
}

impl Document {
    /// Runs `balancer` to completion, building a tree from its event
    /// stream. Whitespace-only text that the balancer leaves nested
    /// directly under a table-section element (`table`/`thead`/`tbody`/
    /// `tfoot`/`tr`) is relocated to just before the enclosing `<table>`,
    /// matching the foster-parenting behavior described for table text.
    pub fn build_collecting(balancer: &mut TagBalancer) -> Self {
        let mut roots: Vec<Node> = Vec::new();
        // Stack of (node, is_table_section) index paths is awkward to
        // express with owned children vectors directly, so track open
        // element indices as a path from `roots` down.
        let mut open_path: Vec<usize> = Vec::new();

        loop {
            let event = balancer.next_event();
            match event {
                Event::Eof { .. } => break,
                Event::StartElement {
                    name,
                    attributes,
                    augmentations,
                    ..
                } => {
                    let node = Node::new(NodeData::Element { name, attributes }, augmentations);
                    let idx = push_child(&mut roots, &open_path, node);
                    open_path.push(idx);
                }
                Event::EndElement { .. } => {
                    open_path.pop();
                }
                Event::Text { text, augmentations } => {
                    if is_whitespace(&text) && in_table_section(&roots, &open_path) {
                        balancer.push_notice(BalancerNotice::FosterParented);
                        foster_parent_text(&mut roots, &mut open_path, text, augmentations);
                    } else {
                        let node = Node::new(NodeData::Text(text), augmentations);
                        push_child(&mut roots, &open_path, node);
                    }
                }
                Event::Comment { text, augmentations } => {
                    let node = Node::new(NodeData::Comment(text), augmentations);
                    push_child(&mut roots, &open_path, node);
                }
                Event::CData { text, augmentations } => {
                    let node = Node::new(NodeData::CData(text), augmentations);
                    push_child(&mut roots, &open_path, node);
                }
                Event::ProcessingInstruction {
                    target,
                    data,
                    augmentations,
                } => {
                    let node = Node::new(
                        NodeData::ProcessingInstruction { target, data },
                        augmentations,
                    );
                    push_child(&mut roots, &open_path, node);
                }
                Event::Doctype { info, augmentations } => {
                    let node = Node::new(NodeData::Doctype(info), augmentations);
                    push_child(&mut roots, &open_path, node);
                }
            }
        }

        Self { roots }
    }
}

fn is_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

fn child_vec<'a>(roots: &'a mut Vec<Node>, open_path: &[usize]) -> &'a mut Vec<Node> {
    let mut children = roots;
    for &idx in open_path {
        children = &mut children[idx].children;
    }
    children
}

fn push_child(roots: &mut Vec<Node>, open_path: &[usize], node: Node) -> usize {
    let children = child_vec(roots, open_path);
    children.push(node);
    children.len() - 1
}

fn node_at<'a>(roots: &'a Vec<Node>, open_path: &[usize]) -> Option<&'a Node> {
    let mut children = roots;
    let mut current: Option<&Node> = None;
    for &idx in open_path {
        let n = children.get(idx)?;
        current = Some(n);
        children = &n.children;
    }
    current
}

fn in_table_section(roots: &Vec<Node>, open_path: &[usize]) -> bool {
    match node_at(roots, open_path) {
        Some(node) => matches!(
            node.tag_name(),
            Some("table") | Some("tbody") | Some("thead") | Some("tfoot") | Some("tr")
        ),
        None => false,
    }
}

/// Inserts `text` as a sibling immediately before the nearest ancestor
/// `<table>` on `open_path`, rather than as a child of the table section
/// element currently open. The insertion shifts every index at and after
/// the table's position in its parent's children, so `open_path` itself
/// is updated in place to keep pointing at the still-open elements.
fn foster_parent_text(
    roots: &mut Vec<Node>,
    open_path: &mut Vec<usize>,
    text: Box<str>,
    augmentations: Augmentations,
) {
    let node = Node::new(NodeData::Text(text), augmentations);

    let mut table_depth = None;
    {
        let mut children: &Vec<Node> = roots;
        for (depth, &idx) in open_path.iter().enumerate() {
            let Some(n) = children.get(idx) else { break };
            if n.tag_name() == Some("table") {
                table_depth = Some(depth);
            }
            children = &n.children;
        }
    }

    let Some(depth) = table_depth else {
        // No enclosing table found (shouldn't happen given the caller's
        // guard); fall back to inserting as an ordinary child.
        push_child(roots, open_path, node);
        return;
    };

    let parent_path = &open_path[..depth];
    let table_idx = open_path[depth];
    let siblings = child_vec(roots, parent_path);
    siblings.insert(table_idx, node);

    // Every open index at this depth shifted up by one to make room for
    // the inserted text; deeper indices are relative to the table's own
    // children and are unaffected.
    open_path[depth] += 1;
}

/// Returns the element table's descriptor for a node's tag, if it has one.
pub fn descriptor_for_node(node: &Node) -> Option<element_table::ElementDescriptor> {
    match node.tag_name() {
        Some(name) => Some(element_table::descriptor_for(&TagName::from(name.as_bytes()))),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str) -> (Document, Vec<BalancerNotice>) {
        let mut balancer = TagBalancer::new(source);
        let document = Document::build_collecting(&mut balancer);
        (document, balancer.take_notices())
    }

    fn find<'a>(node: &'a Node, tag: &str) -> Option<&'a Node> {
        if node.tag_name() == Some(tag) {
            return Some(node);
        }
        node.children.iter().find_map(|c| find(c, tag))
    }

    #[test]
    fn builds_nested_element_tree() {
        let (document, _) = build("<div><p>hi</p></div>");
        let html = &document.roots[0];
        let div = find(html, "div").expect("div present");
        let p = find(div, "p").expect("p present");
        assert_eq!(p.children.len(), 1);
        assert!(matches!(&p.children[0].data, NodeData::Text(t) if &**t == "hi"));
    }

    #[test]
    fn whitespace_directly_inside_table_is_foster_parented_before_it() {
        let (document, notices) = build("<table> <tr><td>x</td></tr></table>");
        let html = &document.roots[0];
        let body = find(html, "body").expect("body present");
        // The whitespace text that appeared between `<table>` and `<tr>`
        // ends up as body's child immediately before the table, not as a
        // child of the table itself.
        let table_pos = body
            .children
            .iter()
            .position(|n| n.tag_name() == Some("table"))
            .unwrap();
        assert!(table_pos > 0, "a foster-parented text sibling must precede <table>");
        assert!(matches!(&body.children[table_pos - 1].data, NodeData::Text(t) if t.trim().is_empty()));
        let table = &body.children[table_pos];
        assert!(!table.children.iter().any(|n| matches!(n.data, NodeData::Text(_))));
        assert!(notices.contains(&BalancerNotice::FosterParented));
        // The elements that followed the foster-parented whitespace must
        // still land inside the table, not inside the relocated text node.
        let tr = find(table, "tr").expect("tr present under table");
        assert!(find(tr, "td").is_some(), "td present under tr");
    }

    #[test]
    fn non_whitespace_text_inside_table_section_stays_put() {
        // Only whitespace is foster-parented; this crate does not attempt
        // to relocate non-whitespace content (see DESIGN.md).
        let (document, _) = build("<table>x<tr><td>y</td></tr></table>");
        let html = &document.roots[0];
        let table = find(html, "table").expect("table present");
        assert!(table.children.iter().any(|n| matches!(&n.data, NodeData::Text(t) if &**t == "x")));
    }
}

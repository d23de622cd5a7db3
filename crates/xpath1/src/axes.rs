//! Pure functions that list the nodes along each XPath axis.
//!
//! Forward axes are returned in document order, reverse axes nearest-first,
//! so that a node's index in the returned list is its proximity position.

use crate::ast::Axis;
use crate::datasource::DataSourceNode;

pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N) -> Vec<N> {
    match axis {
        Axis::Child => node.children().collect(),
        Axis::Attribute => node.attributes().collect(),
        Axis::SelfAxis => vec![node],
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Descendant => descendants(node),
        Axis::DescendantOrSelf => {
            let mut nodes = vec![node];
            nodes.extend(descendants(node));
            nodes
        }
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut nodes = vec![node];
            nodes.extend(ancestors(node));
            nodes
        }
        Axis::FollowingSibling => following_siblings(node),
        Axis::PrecedingSibling => preceding_siblings(node),
        Axis::Following => following(node),
        Axis::Preceding => preceding(node),
    }
}

/// Pre-order walk below `node`, attributes excluded.
fn descendants<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    let mut results = Vec::new();
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let mut children: Vec<N> = current.children().collect();
        children.reverse();
        stack.extend(children);
    }
    results
}

fn ancestors<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    let mut results = Vec::new();
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
    results
}

/// Siblings are only defined for nodes that are children of their parent,
/// which rules out attributes.
fn siblings<'a, N: DataSourceNode<'a>>(node: N) -> Option<(Vec<N>, usize)> {
    let parent = node.parent()?;
    let children: Vec<N> = parent.children().collect();
    let index = children.iter().position(|c| *c == node)?;
    Some((children, index))
}

fn following_siblings<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    match siblings(node) {
        Some((children, index)) => children[index + 1..].to_vec(),
        None => vec![],
    }
}

fn preceding_siblings<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    match siblings(node) {
        Some((children, index)) => children[..index].iter().rev().copied().collect(),
        None => vec![],
    }
}

fn following<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    let mut results = Vec::new();
    let mut current = Some(node);
    // For an attribute, the following axis starts after its owner's subtree
    // is entered, i.e. with the owner's children.
    if let Some(owner) = node.parent().filter(|_| siblings(node).is_none()) {
        results.extend(descendants(owner));
        current = Some(owner);
    }
    while let Some(c) = current {
        for sibling in following_siblings(c) {
            results.push(sibling);
            results.extend(descendants(sibling));
        }
        current = c.parent();
    }
    results
}

fn preceding<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    let mut start = node;
    if let Some(owner) = node.parent().filter(|_| siblings(node).is_none()) {
        start = owner;
    }
    let mut document_order = Vec::new();
    let mut current = Some(start);
    while let Some(c) = current {
        let mut level = Vec::new();
        for sibling in preceding_siblings(c).into_iter().rev() {
            level.push(sibling);
            level.extend(descendants(sibling));
        }
        level.extend(document_order);
        document_order = level;
        current = c.parent();
    }
    document_order.reverse();
    document_order
}

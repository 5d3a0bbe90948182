//! Plain-text rendering of the tree for terminal hosts.

use super::engine::ExportTreeEngine;
use super::proxy::EventProxy;
use crate::core::Node;

fn marker(node: &Node) -> &'static str {
    if node.is_checked() {
        "[x]"
    } else if node.is_partial() {
        "[~]"
    } else {
        "[ ]"
    }
}

fn format_line(node: &Node, depth: usize) -> String {
    format!(
        "{}{} {}{}",
        "  ".repeat(depth),
        marker(node),
        node.label,
        if node.is_directory { "/" } else { "" }
    )
}

/// Renders every visible node, depth first, in display order.
pub async fn render_tree<P: EventProxy>(engine: &mut ExportTreeEngine<P>) -> String {
    let mut lines = Vec::new();
    let mut pending: Vec<(Node, usize)> = engine
        .get_children(None)
        .await
        .into_iter()
        .rev()
        .map(|node| (node, 0))
        .collect();

    while let Some((node, depth)) = pending.pop() {
        lines.push(format_line(&node, depth));
        if node.is_directory {
            let children = engine.get_children(Some(&node.path)).await;
            pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
    }
    lines.join("\n")
}

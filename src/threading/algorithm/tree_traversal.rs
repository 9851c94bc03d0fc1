//! Tree traversal utilities for email threading
//!
//! Functions for walking finished `ThreadNode` trees. All of them are
//! iterative so deeply nested threads cannot overflow the stack.

use super::super::container::ThreadNode;

/// Find the first real (non-placeholder) message in a thread
///
/// When a thread root is a placeholder, callers still need a real message to
/// label the thread with. Depth-first, left to right.
///
/// ## Returns
///
/// `Some(message_id)` if a real message is found, `None` if the whole tree is
/// placeholders.
pub fn find_first_real_message(root: &ThreadNode) -> Option<&str> {
    let mut search_stack = vec![root];

    while let Some(node) = search_stack.pop() {
        if let Some(message_id) = node.id.as_deref() {
            return Some(message_id);
        }

        // Add children in reverse order to maintain DFS left-to-right order
        search_stack.extend(node.children.iter().rev());
    }

    None
}

/// Collect all messages in a thread with their depth values
///
/// Depth-first, left to right. Placeholders are skipped but still count
/// towards the depth of their descendants, except a placeholder root, whose
/// children sit at depth 0.
///
/// ## Example
///
/// ```text
/// (placeholder)          a   depth 0
///   ├── a          →     c   depth 1
///   │   └── c            b   depth 0
///   └── b
/// ```
pub fn collect_thread_members(root: &ThreadNode) -> Vec<(String, usize)> {
    let mut collected_members = Vec::new();

    // (node, depth); a placeholder root starts one level up
    let mut traversal_stack: Vec<(&ThreadNode, isize)> =
        vec![(root, if root.is_placeholder() { -1 } else { 0 })];

    while let Some((node, depth)) = traversal_stack.pop() {
        if let Some(message_id) = &node.id {
            // Real messages never sit above depth 0
            collected_members.push((message_id.clone(), depth.max(0) as usize));
        }

        for child in node.children.iter().rev() {
            traversal_stack.push((child, depth + 1));
        }
    }

    collected_members
}

//! Cycle detection for email threading
//!
//! Ensures that parent-child relationships don't create cycles in the thread tree.
//! A cycle would occur if we tried to make a parent a descendant of its own child.

use super::super::container::{ContainerId, ContainerTable};

/// Check if linking a child to a parent would create a cycle
///
/// Walks up the ancestry chain from the proposed parent. If the child shows
/// up anywhere in that chain, linking would close a loop.
///
/// The table is a forest between link operations, so the walk is bounded by
/// the depth of `parent`. The step limit only guards against a corrupted table.
///
/// ## Example
///
/// ```text
/// Current tree:  A → B → C
///
/// Trying to link: A below C (would create cycle A → B → C → A)
/// Result: true (cycle detected)
///
/// Trying to link: D below C (D is not in chain)
/// Result: false (safe to link)
/// ```
pub fn would_create_cycle(
    table: &ContainerTable<'_>,
    child: ContainerId,
    parent: ContainerId,
) -> bool {
    let mut current = Some(parent);
    let mut remaining_steps = table.len();

    while let Some(ancestor) = current {
        if ancestor == child {
            return true;
        }

        if remaining_steps == 0 {
            log::warn!("ancestor walk exceeded table size, treating link as cyclic");
            return true;
        }
        remaining_steps -= 1;

        current = table.parent(ancestor);
    }

    false
}

//! Placeholder pruning
//!
//! After reference linking, the forest can contain placeholders that carry no
//! information: leaves that belong to nobody, and single-child links in a chain
//! of missing messages. This pass removes them below the root level.
//!
//! Roots are never touched. A placeholder root is the only thing that holds
//! siblings with a missing common ancestor together, and subject grouping
//! relies on it.

use super::super::container::{ContainerId, ContainerTable};

/// Counters reported after pruning
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    /// Childless placeholders removed from their parent
    pub removed: usize,
    /// Single-child placeholders replaced by their child
    pub spliced: usize,
}

/// Prune every tree below the given roots.
///
/// Works bottom-up: a container is visited only after all of its descendants,
/// so by the time a placeholder is examined its child list is final and a
/// spliced-in child never needs another look.
pub fn prune_placeholders(table: &mut ContainerTable<'_>, roots: &[ContainerId]) -> PruneStats {
    let mut stats = PruneStats::default();

    for &root in roots {
        for container in collect_descendants_post_order(table, root) {
            if table.message(container).is_some() {
                continue;
            }

            let children = table.children(container);
            match children.len() {
                0 => {
                    table.detach(container);
                    stats.removed += 1;
                }
                1 => {
                    let only_child = children[0];
                    table.splice(container, only_child);
                    stats.spliced += 1;
                }
                _ => {}
            }
        }
    }

    stats
}

/// Descendants of `root` (root excluded) with every child before its parent.
///
/// Uses an explicit stack; reference chains can be arbitrarily deep.
fn collect_descendants_post_order(table: &ContainerTable<'_>, root: ContainerId) -> Vec<ContainerId> {
    let mut pre_order = Vec::new();
    let mut stack: Vec<ContainerId> = table.children(root).to_vec();

    while let Some(container) = stack.pop() {
        pre_order.push(container);
        stack.extend(table.children(container).iter().copied());
    }

    // Reversed pre-order (with children pushed left to right) visits every
    // child before its parent.
    pre_order.reverse();
    pre_order
}

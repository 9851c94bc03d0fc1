//! Core JWZ (Jamie Zawinski) threading algorithm implementation
//!
//! Loosely follows the algorithm described at
//! https://www.jwz.org/doc/threading.html
//!
//! ## Algorithm Overview
//!
//! 1. **Index Containers**: One container per message id, real or referenced
//! 2. **Link References**: Build parent-child relationships from References chains
//! 3. **Prune**: Drop or splice uninformative placeholders below the roots
//! 4. **Group Subjects**: Merge roots whose replies lost their headers
//! 5. **Assemble**: Convert the container forest into `ThreadNode` trees
//!
//! Everything runs single-threaded over a table local to one call. The same
//! input in the same order always produces the same forest.

use std::collections::HashSet;

use crate::config::ThreadingConfig;

use super::super::container::{ContainerId, ContainerTable, LinkOutcome, Message, ThreadNode};
use super::super::subject_matching::group_by_subject;
use super::pruning::prune_placeholders;

/// Thread a list of messages with the default settings
///
/// Shorthand for `ThreadBuilder::new().build(messages)`.
pub fn build_threads(messages: &[Message]) -> Vec<ThreadNode> {
    ThreadBuilder::new().build(messages)
}

/// Builds thread forests from flat message lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadBuilder {
    group_by_subject: bool,
}

impl Default for ThreadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadBuilder {
    /// Builder with subject grouping enabled
    pub fn new() -> Self {
        ThreadBuilder {
            group_by_subject: true,
        }
    }

    pub fn from_config(config: &ThreadingConfig) -> Self {
        ThreadBuilder {
            group_by_subject: config.group_by_subject,
        }
    }

    /// Enable or disable the subject grouping pass
    pub fn with_subject_grouping(mut self, enabled: bool) -> Self {
        self.group_by_subject = enabled;
        self
    }

    /// Build the thread forest for `messages`
    ///
    /// Never fails: cycles, dangling references, duplicate ids and
    /// self-references are all resolved deterministically.
    ///
    /// ## Returns
    ///
    /// Root nodes in container creation order (the order ids were first seen),
    /// minus roots absorbed by subject grouping.
    pub fn build(&self, messages: &[Message]) -> Vec<ThreadNode> {
        // Step 1 + 2: Index containers and link reference chains
        let mut table = ContainerTable::with_capacity(messages.len());
        link_references(&mut table, messages);

        // Step 3: Prune below the root set
        let roots = identify_thread_roots(&table);
        let prune_stats = prune_placeholders(&mut table, &roots);

        // Step 4: Merge header-less replies by subject
        let (roots, subject_merges) = if self.group_by_subject {
            group_by_subject(&mut table, roots)
        } else {
            (roots, 0)
        };

        log::debug!(
            "threaded {} messages: {} containers, {} roots, {} pruned, {} spliced, {} subject merges",
            messages.len(),
            table.len(),
            roots.len(),
            prune_stats.removed,
            prune_stats.spliced,
            subject_merges
        );

        // Step 5: Assemble output trees
        roots
            .into_iter()
            .filter_map(|root| assemble_thread(&table, root))
            .collect()
    }
}

/// Build parent-child relationships from References chains
///
/// Messages are processed in input order; later links win over earlier ones
/// unless they would close a cycle.
///
/// ## Example
///
/// ```text
/// Email has References: <msg1> <msg2> <msg3>
///
/// Creates links:
///   msg1 (parent) → msg2 (child)
///   msg2 (parent) → msg3 (child)
///   msg3 (parent) → this_email (child)
/// ```
fn link_references<'a>(table: &mut ContainerTable<'a>, messages: &'a [Message]) {
    for message in messages {
        let own_container = table.get_or_create(&message.id);
        table.attach_message(own_container, message);

        let mut seen_references: HashSet<&str> = HashSet::with_capacity(message.references.len());
        let mut previous_reference: Option<ContainerId> = None;

        for referenced_message_id in &message.references {
            // Repeated ids are dropped, keeping the first occurrence
            if !seen_references.insert(referenced_message_id.as_str()) {
                continue;
            }

            let reference_container = table.get_or_create(referenced_message_id);
            if let Some(previous) = previous_reference {
                link_child_to_parent(table, reference_container, previous, message);
            }

            previous_reference = Some(reference_container);
        }

        // Link the last reference to this message
        if let Some(last_reference) = previous_reference {
            link_child_to_parent(table, own_container, last_reference, message);
        }
    }
}

fn link_child_to_parent(
    table: &mut ContainerTable<'_>,
    child: ContainerId,
    parent: ContainerId,
    source: &Message,
) {
    match table.link(child, parent) {
        LinkOutcome::SelfReference => {
            log::trace!("message {} references itself, link skipped", source.id);
        }
        LinkOutcome::CycleSkipped => {
            log::trace!("references of {} would close a cycle, link skipped", source.id);
        }
        LinkOutcome::Linked | LinkOutcome::AlreadyLinked => {}
    }
}

/// Find all thread roots (containers with no parent)
fn identify_thread_roots(table: &ContainerTable<'_>) -> Vec<ContainerId> {
    table.roots()
}

/// Convert the subtree under `root` into a `ThreadNode`
///
/// Iterative: nodes are finished bottom-up on an explicit stack, so reference
/// chains of any depth are safe.
fn assemble_thread(table: &ContainerTable<'_>, root: ContainerId) -> Option<ThreadNode> {
    // (container, children already expanded)
    let mut traversal_stack = vec![(root, false)];
    let mut finished: Vec<ThreadNode> = Vec::new();

    while let Some((container, expanded)) = traversal_stack.pop() {
        let children = table.children(container);

        if expanded {
            let children = finished.split_off(finished.len() - children.len());
            let id = table.message(container).map(|message| message.id.clone());
            finished.push(ThreadNode::new(id, children));
        } else {
            traversal_stack.push((container, true));
            // Reverse so the first child is finished first
            for &child in children.iter().rev() {
                traversal_stack.push((child, false));
            }
        }
    }

    finished.pop()
}

//! Container data structures for the threading algorithm
//!
//! Containers live in a single arena (`ContainerTable`) and refer to each other
//! through `ContainerId` handles. A container either carries a real message or
//! is a placeholder for a message that was referenced but never supplied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::algorithm::would_create_cycle;

/// A message handed to the threader.
///
/// `references` is the ancestry chain, oldest first. It may contain duplicates,
/// unknown ids, the message's own id, or ids that form a cycle with other
/// messages; the threader treats all of these as ordinary input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message-ID (opaque token, unique within one build)
    pub id: String,

    /// Raw subject line
    #[serde(default)]
    pub subject: String,

    /// Referenced message ids, oldest to newest
    #[serde(default)]
    pub references: Vec<String>,
}

impl Message {
    pub fn new(
        subject: impl Into<String>,
        id: impl Into<String>,
        references: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Message {
            id: id.into(),
            subject: subject.into(),
            references: references.into_iter().map(Into::into).collect(),
        }
    }
}

/// Stable handle to a container inside a `ContainerTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(usize);

/// A node in the thread forest.
///
/// ## Placeholders
///
/// Placeholder containers (no message) are created for ids that show up in a
/// References chain but were never supplied. They keep siblings together when
/// the common ancestor is missing from the dataset.
#[derive(Debug, Clone, Default)]
pub struct Container<'a> {
    /// The message stored here, `None` for placeholders
    pub message: Option<&'a Message>,

    /// Current parent (None for roots)
    pub parent: Option<ContainerId>,

    /// Children in insertion order
    pub children: Vec<ContainerId>,
}

impl Container<'_> {
    pub fn is_placeholder(&self) -> bool {
        self.message.is_none()
    }
}

/// Result of a `ContainerTable::link` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Child now hangs below the parent
    Linked,
    /// Child was already a direct child of the parent
    AlreadyLinked,
    /// Child and parent are the same container
    SelfReference,
    /// Parent is a descendant of child; linking would close a cycle
    CycleSkipped,
}

impl LinkOutcome {
    /// True if `child.parent == parent` holds after the call
    pub fn is_attached(self) -> bool {
        matches!(self, LinkOutcome::Linked | LinkOutcome::AlreadyLinked)
    }
}

/// Arena of containers indexed by message id.
///
/// Containers are never freed during a build; pruning only unlinks them from
/// the forest. Creation order is preserved and defines root order.
#[derive(Debug, Default)]
pub struct ContainerTable<'a> {
    containers: Vec<Container<'a>>,
    index: HashMap<&'a str, ContainerId>,
}

impl<'a> ContainerTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ContainerTable {
            containers: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Number of containers, placeholders included
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Return the container for `message_id`, creating a placeholder if needed.
    ///
    /// Repeated calls with the same id return the same handle.
    pub fn get_or_create(&mut self, message_id: &'a str) -> ContainerId {
        if let Some(&existing) = self.index.get(message_id) {
            return existing;
        }

        let container_id = ContainerId(self.containers.len());
        self.containers.push(Container::default());
        self.index.insert(message_id, container_id);
        container_id
    }

    /// Store `message` in a container. A second message for the same id
    /// replaces the first without touching the tree position.
    pub fn attach_message(&mut self, container_id: ContainerId, message: &'a Message) {
        let container = &mut self.containers[container_id.0];
        if container.message.is_some() {
            log::trace!("duplicate message id {}, later message wins", message.id);
        }
        container.message = Some(message);
    }

    pub fn get(&self, container_id: ContainerId) -> &Container<'a> {
        &self.containers[container_id.0]
    }

    pub fn message(&self, container_id: ContainerId) -> Option<&'a Message> {
        self.containers[container_id.0].message
    }

    pub fn parent(&self, container_id: ContainerId) -> Option<ContainerId> {
        self.containers[container_id.0].parent
    }

    pub fn children(&self, container_id: ContainerId) -> &[ContainerId] {
        &self.containers[container_id.0].children
    }

    /// All handles in creation order
    pub fn ids(&self) -> impl Iterator<Item = ContainerId> + '_ {
        (0..self.containers.len()).map(ContainerId)
    }

    /// Containers without a parent, in creation order
    pub fn roots(&self) -> Vec<ContainerId> {
        self.ids().filter(|&id| self.parent(id).is_none()).collect()
    }

    /// Make `child` a child of `parent`, re-parenting it if needed.
    ///
    /// Skipped when the two are the same container or when `parent` already
    /// descends from `child`, so the table stays a forest.
    pub fn link(&mut self, child: ContainerId, parent: ContainerId) -> LinkOutcome {
        if child == parent {
            return LinkOutcome::SelfReference;
        }

        if self.parent(child) == Some(parent) {
            return LinkOutcome::AlreadyLinked;
        }

        if would_create_cycle(self, child, parent) {
            return LinkOutcome::CycleSkipped;
        }

        self.detach(child);
        self.containers[parent.0].children.push(child);
        self.containers[child.0].parent = Some(parent);
        LinkOutcome::Linked
    }

    /// Remove `child` from its parent's child list, turning it into a root.
    pub fn detach(&mut self, child: ContainerId) {
        if let Some(old_parent) = self.containers[child.0].parent.take() {
            self.containers[old_parent.0]
                .children
                .retain(|&sibling| sibling != child);
        }
    }

    /// Replace `container` in its parent's child list with `replacement`,
    /// keeping the position. `replacement` must be a child of `container`.
    pub(crate) fn splice(&mut self, container: ContainerId, replacement: ContainerId) {
        let Some(parent) = self.containers[container.0].parent else {
            return;
        };

        self.containers[container.0]
            .children
            .retain(|&child| child != replacement);

        if let Some(slot) = self.containers[parent.0]
            .children
            .iter_mut()
            .find(|slot| **slot == container)
        {
            *slot = replacement;
        }

        self.containers[replacement.0].parent = Some(parent);
        self.containers[container.0].parent = None;
    }
}

/// A node of the finished thread forest.
///
/// `id` is the Message-ID of the message at this position, or `None` for a
/// placeholder grouping siblings whose common ancestor was never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    pub id: Option<String>,
    pub children: Vec<ThreadNode>,
}

impl ThreadNode {
    pub fn new(id: Option<String>, children: Vec<ThreadNode>) -> Self {
        ThreadNode { id, children }
    }

    pub fn leaf(id: impl Into<String>) -> Self {
        ThreadNode {
            id: Some(id.into()),
            children: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }

    /// Number of real messages in this subtree
    pub fn message_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id.is_some() {
                count += 1;
            }
            stack.extend(node.children.iter());
        }
        count
    }

    /// Number of nodes on the longest root-to-leaf path (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

// Deep chains come from attacker-controlled headers; tear them down without
// recursing.
impl Drop for ThreadNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

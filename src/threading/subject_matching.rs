//! Subject normalization and matching for email threading
//!
//! Some mail clients drop the References header when replying. Such replies end
//! up as separate roots after reference linking. This module merges those roots
//! back together when their subjects agree once reply and forward markers are
//! stripped.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::container::{ContainerId, ContainerTable, Message};

/// Lazy-initialized regex for one leading reply/forward marker
static REPLY_MARKER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches a single leading `Re:` or `Fwd:` (any case) and the whitespace after it
fn get_reply_marker_regex() -> &'static Regex {
    REPLY_MARKER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:re|fwd):\s*").expect("Invalid reply marker regex")
    })
}

/// Whether the subject starts with a reply or forward marker
pub fn has_reply_marker(subject: &str) -> bool {
    get_reply_marker_regex().is_match(subject)
}

/// Normalize an email subject for threading comparison
///
/// Strips leading `Re:` / `Fwd:` markers (case insensitive) until none are
/// left, then trims surrounding whitespace. Case and inner spacing of the
/// remaining text are kept as-is.
///
/// ## Examples
///
/// ```rust
/// use mail_threading::threading::normalize_subject;
///
/// assert_eq!(normalize_subject("Re: Fix memory leak"), "Fix memory leak");
/// assert_eq!(normalize_subject("RE: fwd:Re:  Status "), "Status");
/// assert_eq!(normalize_subject("Re:"), "");
/// ```
pub fn normalize_subject(subject: &str) -> String {
    let regex = get_reply_marker_regex();
    let mut remaining = subject;

    while let Some(marker) = regex.find(remaining) {
        remaining = &remaining[marker.end()..];
    }

    remaining.trim().to_string()
}

/// The message that speaks for a root during subject grouping
///
/// A root qualifies if it carries a message itself, or if it is a placeholder
/// whose only child carries one.
fn representative_message<'a>(table: &ContainerTable<'a>, root: ContainerId) -> Option<&'a Message> {
    if let Some(message) = table.message(root) {
        return Some(message);
    }

    match table.children(root) {
        [only_child] => table.message(*only_child),
        _ => None,
    }
}

/// What gets attached when `root` is demoted below another root.
///
/// A single-child placeholder root has nothing to contribute once it is no
/// longer a root, so its child goes in its place.
fn demotion_target(table: &mut ContainerTable<'_>, root: ContainerId) -> ContainerId {
    if table.message(root).is_some() {
        return root;
    }

    let children = table.children(root);
    if children.len() != 1 {
        return root;
    }

    let only_child = children[0];
    table.detach(only_child);
    only_child
}

/// Put a child taken by `demotion_target` back where it came from.
fn restore_demotion(table: &mut ContainerTable<'_>, root: ContainerId, demoted: ContainerId) {
    if demoted != root {
        table.link(demoted, root);
    }
}

/// Seen subject: the root that owns it and whether its subject had a marker
#[derive(Debug, Clone, Copy)]
struct SubjectOwner {
    root: ContainerId,
    is_reply: bool,
}

/// Merge roots that share a normalized subject
///
/// Walks the roots in order. The first root with a given subject owns it.
/// A later root with the same subject is attached below the owner, except
/// when only the owner's subject carries a `Re:`/`Fwd:` marker: then the
/// later root is the better candidate for the original, adopts the owner
/// and takes over the subject.
///
/// Roots without a usable subject (no representative message, or an empty
/// normalized subject) are left alone.
///
/// ## Returns
///
/// The surviving roots in their original relative order, and the number of
/// merges performed.
pub fn group_by_subject(table: &mut ContainerTable<'_>, roots: Vec<ContainerId>) -> (Vec<ContainerId>, usize) {
    let mut subject_owners: HashMap<String, SubjectOwner> = HashMap::new();
    let mut surviving_roots: Vec<ContainerId> = Vec::with_capacity(roots.len());
    let mut merges = 0;

    for root in roots {
        let Some(message) = representative_message(table, root) else {
            surviving_roots.push(root);
            continue;
        };

        let normalized = normalize_subject(&message.subject);
        if normalized.is_empty() {
            surviving_roots.push(root);
            continue;
        }

        let is_reply = has_reply_marker(&message.subject);

        let Some(owner) = subject_owners.get(&normalized).copied() else {
            subject_owners.insert(normalized, SubjectOwner { root, is_reply });
            surviving_roots.push(root);
            continue;
        };

        if owner.is_reply && !is_reply {
            // This root looks like the original the owner replied to
            let demoted = demotion_target(table, owner.root);
            if table.link(demoted, root).is_attached() {
                surviving_roots.retain(|&surviving| surviving != owner.root);
                subject_owners.insert(normalized, SubjectOwner { root, is_reply });
                merges += 1;
            } else {
                log::trace!("subject merge of {} skipped by cycle guard", message.id);
                restore_demotion(table, owner.root, demoted);
            }
            surviving_roots.push(root);
        } else {
            let demoted = demotion_target(table, root);
            if table.link(demoted, owner.root).is_attached() {
                merges += 1;
            } else {
                log::trace!("subject merge of {} skipped by cycle guard", message.id);
                restore_demotion(table, root, demoted);
                surviving_roots.push(root);
            }
        }
    }

    (surviving_roots, merges)
}

use std::collections::HashMap;

use mail_threading::threading::{collect_thread_members, find_first_real_message};
use mail_threading::{Message, ThreadBuilder, ThreadNode, build_threads};
use serde_json::json;

fn msg(subject: &str, id: &str, references: &[&str]) -> Message {
    Message::new(subject, id, references.iter().copied())
}

fn node(id: &str, children: Vec<ThreadNode>) -> ThreadNode {
    ThreadNode::new(Some(id.to_string()), children)
}

fn placeholder(children: Vec<ThreadNode>) -> ThreadNode {
    ThreadNode::new(None, children)
}

fn leaf(id: &str) -> ThreadNode {
    ThreadNode::leaf(id)
}

fn reversed(messages: &[Message]) -> Vec<Message> {
    messages.iter().rev().cloned().collect()
}

/// Sort siblings by id so trees can be compared without sibling order
fn canonical(mut nodes: Vec<ThreadNode>) -> Vec<ThreadNode> {
    nodes = nodes
        .iter()
        .map(|n| ThreadNode::new(n.id.clone(), canonical(n.children.clone())))
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    nodes
}

fn binary_tree() -> Vec<ThreadNode> {
    //        1
    //      /   \
    //     2     3
    //    / \   / \
    //   4   5 6   7
    vec![node(
        "id1",
        vec![
            node("id2", vec![leaf("id4"), leaf("id5")]),
            node("id3", vec![leaf("id6"), leaf("id7")]),
        ],
    )]
}

#[test]
fn build_empty() {
    assert_eq!(build_threads(&[]), Vec::<ThreadNode>::new());
}

#[test]
fn build_flat() {
    let messages = vec![msg("s1", "id1", &[]), msg("s2", "id2", &[]), msg("s3", "id3", &[])];

    assert_eq!(
        build_threads(&messages),
        vec![leaf("id1"), leaf("id2"), leaf("id3")]
    );
    assert_eq!(
        build_threads(&reversed(&messages)),
        vec![leaf("id3"), leaf("id2"), leaf("id1")]
    );
}

#[test]
fn build_one_deep() {
    let messages = vec![msg("s1", "id1", &[]), msg("Re:s1", "id2", &["id1"])];
    let expected = vec![node("id1", vec![leaf("id2")])];

    assert_eq!(build_threads(&messages), expected);
    assert_eq!(build_threads(&reversed(&messages)), expected);
}

#[test]
fn build_one_deep_mismatching_subjects() {
    let messages = vec![msg("s1", "id1", &[]), msg("s2", "id2", &["id1"])];
    let expected = vec![node("id1", vec![leaf("id2")])];

    assert_eq!(build_threads(&messages), expected);
    assert_eq!(build_threads(&reversed(&messages)), expected);
}

#[test]
fn build_one_deep_no_references() {
    let messages = vec![msg("s1", "id1", &[]), msg("Re:s1", "id2", &[])];
    let expected = vec![node("id1", vec![leaf("id2")])];

    assert_eq!(build_threads(&messages), expected);
    // The marker decides who is the parent, not the order
    assert_eq!(build_threads(&reversed(&messages)), expected);
}

#[test]
fn build_two_deep() {
    let messages = vec![
        msg("s1", "id1", &[]),
        msg("s2", "id2", &["id1"]),
        msg("s3", "id3", &["id2"]),
    ];
    let expected = vec![node("id1", vec![node("id2", vec![leaf("id3")])])];

    assert_eq!(build_threads(&messages), expected);
    assert_eq!(build_threads(&reversed(&messages)), expected);
}

#[test]
fn build_four_deep() {
    let messages = vec![
        msg("s1", "id1", &[]),
        msg("Re:s1", "id2", &["id1"]),
        msg("Re:s1", "id3", &["id2"]),
        msg("Re:s1", "id4", &["id3"]),
    ];
    let expected = vec![node(
        "id1",
        vec![node("id2", vec![node("id3", vec![leaf("id4")])])],
    )];

    assert_eq!(build_threads(&messages), expected);
    assert_eq!(build_threads(&reversed(&messages)), expected);
}

#[test]
fn build_tree_full_references() {
    let messages = vec![
        msg("s1", "id1", &[]),
        msg("Re:s1", "id2", &["id1"]),
        msg("Re:s1", "id3", &["id1"]),
        msg("Re:s1", "id4", &["id1", "id2"]),
        msg("Re:s1", "id5", &["id1", "id2"]),
        msg("Re:s1", "id6", &["id1", "id3"]),
        msg("Re:s1", "id7", &["id1", "id3"]),
    ];

    assert_eq!(build_threads(&messages), binary_tree());

    // Same shape, siblings in the order their links were made
    let from_reversed = build_threads(&reversed(&messages));
    assert_eq!(
        from_reversed,
        vec![node(
            "id1",
            vec![
                node("id3", vec![leaf("id7"), leaf("id6")]),
                node("id2", vec![leaf("id5"), leaf("id4")]),
            ],
        )]
    );
    assert_eq!(canonical(from_reversed), binary_tree());
}

#[test]
fn build_tree_partial_references() {
    let messages = vec![
        msg("s1", "id1", &[]),
        msg("Re:s1", "id2", &["id1"]),
        msg("Re:s1", "id3", &["id1"]),
        msg("Re:s1", "id4", &["id2"]),
        msg("Re:s1", "id5", &["id2"]),
        msg("Re:s1", "id6", &["id3"]),
        msg("Re:s1", "id7", &["id3"]),
    ];

    assert_eq!(build_threads(&messages), binary_tree());
    assert_eq!(canonical(build_threads(&reversed(&messages))), binary_tree());
}

#[test]
fn build_cyclic() {
    let messages = vec![msg("s1", "id1", &["id2"]), msg("s2", "id2", &["id1"])];

    assert_eq!(build_threads(&messages), vec![node("id2", vec![leaf("id1")])]);
    // Whoever links first wins; the closing link is skipped
    assert_eq!(
        build_threads(&reversed(&messages)),
        vec![node("id1", vec![leaf("id2")])]
    );
}

#[test]
fn build_three_way_cycle() {
    let messages = vec![
        msg("a", "a", &["c"]),
        msg("b", "b", &["a"]),
        msg("c", "c", &["b"]),
    ];

    assert_eq!(
        build_threads(&messages),
        vec![node("c", vec![node("a", vec![leaf("b")])])]
    );
}

#[test]
fn build_siblings_with_root() {
    let messages = vec![
        msg("s1", "id1", &[]),
        msg("s2", "id2", &["id1"]),
        msg("s3", "id3", &["id1"]),
    ];

    assert_eq!(
        build_threads(&messages),
        vec![node("id1", vec![leaf("id2"), leaf("id3")])]
    );
    assert_eq!(
        build_threads(&reversed(&messages)),
        vec![node("id1", vec![leaf("id3"), leaf("id2")])]
    );
}

#[test]
fn build_siblings_without_root() {
    let messages = vec![msg("Re:s1", "id2", &["id1"]), msg("Re:s2", "id3", &["id1"])];

    assert_eq!(
        build_threads(&messages),
        vec![placeholder(vec![leaf("id2"), leaf("id3")])]
    );
    assert_eq!(
        build_threads(&reversed(&messages)),
        vec![placeholder(vec![leaf("id3"), leaf("id2")])]
    );
}

#[test]
fn self_reference_is_ignored() {
    let messages = vec![msg("s1", "id1", &["id1"])];
    assert_eq!(build_threads(&messages), vec![leaf("id1")]);

    let messages = vec![msg("s1", "id1", &[]), msg("Re: s1", "id2", &["id1", "id2"])];
    assert_eq!(build_threads(&messages), vec![node("id1", vec![leaf("id2")])]);
}

#[test]
fn duplicate_ids_last_message_wins() {
    let messages = vec![
        msg("parent", "p", &[]),
        msg("first copy", "x", &[]),
        msg("second copy", "x", &["p"]),
    ];

    // One container per id; the second copy's references move it below p
    assert_eq!(build_threads(&messages), vec![node("p", vec![leaf("x")])]);
}

#[test]
fn placeholder_chain_is_spliced() {
    let messages = vec![msg("r", "r", &[]), msg("c", "c", &["r", "m1", "m2"])];

    assert_eq!(build_threads(&messages), vec![node("r", vec![leaf("c")])]);
}

#[test]
fn placeholder_with_two_children_is_kept() {
    let messages = vec![
        msg("a", "a", &[]),
        msg("b", "b", &["a", "m"]),
        msg("c", "c", &["a", "m"]),
    ];

    assert_eq!(
        build_threads(&messages),
        vec![node("a", vec![placeholder(vec![leaf("b"), leaf("c")])])]
    );
}

#[test]
fn subject_tie_breaks_are_order_dependent() {
    // Both carry a marker: later root goes below the earlier one
    let both = vec![msg("Re: x", "id1", &[]), msg("Re: x", "id2", &[])];
    assert_eq!(build_threads(&both), vec![node("id1", vec![leaf("id2")])]);
    assert_eq!(
        build_threads(&reversed(&both)),
        vec![node("id2", vec![leaf("id1")])]
    );

    // Neither carries a marker: same rule
    let neither = vec![msg("x", "id1", &[]), msg("x", "id2", &[])];
    assert_eq!(build_threads(&neither), vec![node("id1", vec![leaf("id2")])]);
}

#[test]
fn original_adopts_earlier_reply_and_keeps_subject() {
    let messages = vec![
        msg("Re: x", "id1", &[]),
        msg("x", "id2", &[]),
        msg("Fwd: x", "id3", &[]),
    ];

    assert_eq!(
        build_threads(&messages),
        vec![node("id2", vec![leaf("id1"), leaf("id3")])]
    );
}

#[test]
fn subject_grouping_keeps_root_order() {
    let messages = vec![
        msg("a", "a1", &[]),
        msg("Re: b", "b1", &[]),
        msg("c", "c1", &[]),
        msg("b", "b2", &[]),
        msg("Re: a", "a2", &[]),
    ];

    assert_eq!(
        build_threads(&messages),
        vec![
            node("a1", vec![leaf("a2")]),
            leaf("c1"),
            node("b2", vec![leaf("b1")]),
        ]
    );
}

#[test]
fn empty_subjects_never_match() {
    let messages = vec![msg("", "id1", &[]), msg("Re:", "id2", &[]), msg("  ", "id3", &[])];

    assert_eq!(
        build_threads(&messages),
        vec![leaf("id1"), leaf("id2"), leaf("id3")]
    );
}

#[test]
fn single_child_placeholder_root_groups_by_child_subject() {
    let messages = vec![msg("Re: topic", "id2", &["id1"]), msg("topic", "id3", &[])];

    assert_eq!(build_threads(&messages), vec![node("id3", vec![leaf("id2")])]);
}

#[test]
fn multi_child_placeholder_root_is_not_grouped() {
    let messages = vec![
        msg("Re: s", "id2", &["id1"]),
        msg("Re: s", "id3", &["id1"]),
        msg("s", "id4", &[]),
    ];

    assert_eq!(
        build_threads(&messages),
        vec![placeholder(vec![leaf("id2"), leaf("id3")]), leaf("id4")]
    );
}

#[test]
fn subject_grouping_disabled() {
    let messages = vec![msg("s1", "id1", &[]), msg("Re:s1", "id2", &[])];

    let threads = ThreadBuilder::new()
        .with_subject_grouping(false)
        .build(&messages);

    assert_eq!(threads, vec![leaf("id1"), leaf("id2")]);
}

#[test]
fn deep_chain_does_not_overflow() {
    let depth = 5_000;
    let ids: Vec<String> = (0..depth).map(|i| format!("m{i}")).collect();
    let messages: Vec<Message> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let references: Vec<String> = if i == 0 { Vec::new() } else { vec![ids[i - 1].clone()] };
            Message::new(format!("subject {i}"), id.clone(), references)
        })
        .collect();

    let threads = build_threads(&messages);

    assert_eq!(threads.len(), 1);
    let members = collect_thread_members(&threads[0]);
    assert_eq!(members.len(), depth);
    assert_eq!(members[depth - 1], (format!("m{}", depth - 1), depth - 1));
}

#[test]
fn deep_placeholder_chain_collapses_under_root() {
    let missing: Vec<String> = (0..5_000).map(|i| format!("gone{i}")).collect();
    let messages = vec![Message::new("Re: lost", "last", missing)];

    let threads = build_threads(&messages);

    assert_eq!(threads, vec![placeholder(vec![leaf("last")])]);
    assert_eq!(find_first_real_message(&threads[0]), Some("last"));
}

#[test]
fn output_is_deterministic() {
    let messages = vec![
        msg("Re: a", "id3", &["id9", "id1"]),
        msg("a", "id1", &["id3"]),
        msg("b", "id2", &["id7", "id7", "id2"]),
        msg("Re: b", "id4", &[]),
    ];

    assert_eq!(build_threads(&messages), build_threads(&messages));
}

#[test]
fn every_message_appears_exactly_once_on_adversarial_input() {
    // Small LCG so the graph is random-looking but reproducible
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move |bound: u64| {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) % bound
    };

    let messages: Vec<Message> = (0..300)
        .map(|_| {
            let id = format!("id{}", next(200));
            let reference_count = next(6);
            let references: Vec<String> = (0..reference_count)
                .map(|_| format!("id{}", next(250)))
                .collect();
            let subject = match next(3) {
                0 => format!("topic {}", next(10)),
                1 => format!("Re: topic {}", next(10)),
                _ => String::new(),
            };
            Message::new(subject, id, references)
        })
        .collect();

    let threads = build_threads(&messages);

    let mut seen: HashMap<String, usize> = HashMap::new();
    for thread in &threads {
        for (id, _depth) in collect_thread_members(thread) {
            *seen.entry(id).or_default() += 1;
        }
    }

    let mut expected: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    expected.sort_unstable();
    expected.dedup();

    assert_eq!(seen.len(), expected.len());
    assert!(seen.values().all(|&count| count == 1));
    assert!(expected.iter().all(|id| seen.contains_key(*id)));
}

#[test]
fn thread_nodes_serialize_with_null_placeholders() {
    let messages = vec![msg("Re:s1", "id2", &["id1"]), msg("Re:s2", "id3", &["id1"])];

    let value = serde_json::to_value(build_threads(&messages)).unwrap();

    assert_eq!(
        value,
        json!([{
            "id": null,
            "children": [
                {"id": "id2", "children": []},
                {"id": "id3", "children": []}
            ]
        }])
    );
}

//! Flattening of the recursive test hierarchy into leaf test cases.

use crate::model::{TestCase, TestNode};

/// Collects every leaf case in pre-order. Groups contribute only their
/// children; child order is preserved.
pub fn flatten(nodes: &[TestNode]) -> Vec<TestCase> {
    let mut leaves = Vec::new();
    collect(nodes, &mut leaves);
    leaves
}

fn collect(nodes: &[TestNode], leaves: &mut Vec<TestCase>) {
    for node in nodes {
        match node {
            TestNode::Group(group) => collect(&group.subtests, leaves),
            TestNode::Case(case) => leaves.push(case.clone()),
        }
    }
}

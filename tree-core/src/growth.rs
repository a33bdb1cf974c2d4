//! Per-tick growth phases.
//!
//! A tick runs two phases against the node arena:
//! 1. [`growth_phase`]: the youngest node (see [`youngest`]) is invited to
//!    grow via [`Tree::grow_node`].
//! 2. [`bend_phase`]: a random node with two children (see
//!    [`random_child`]) bends its sparser child away from the denser one.
//!
//! Every random draw comes from the single `rng` passed in, in a fixed
//! order, so a seeded generator replays a tree exactly.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::tree::{ROOT, Tree};
use crate::types::{GrowOutcome, NodeId};

/// What one tick did to the tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub grown: NodeId,
    pub outcome: GrowOutcome,
    /// The node whose angle changed, if a bend was applied.
    pub bent: Option<NodeId>,
}

/// The youngest node of the whole tree.
///
/// Nodes are visited in pre-order (self, then left, then right) and only a
/// strictly smaller age replaces the current best, so ties go to the first
/// node found.
pub fn youngest(tree: &Tree) -> NodeId {
    let mut best = (tree.node(ROOT).age, ROOT);
    let mut stack = vec![ROOT];
    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        if node.age < best.0 {
            best = (node.age, id);
        }
        stack.extend(node.right());
        stack.extend(node.left());
    }
    best.1
}

/// Picks a node that has both children, favoring deeper ones.
///
/// Returns `None` if `id` is absent or lacks either child. Otherwise the
/// candidates are `id` itself plus two draws from the left subtree and two
/// from the right subtree; a subtree draw is void when that child is not a
/// fork itself. One non-void candidate is chosen uniformly, and a subtree
/// draw continues the same way from that child.
///
/// Only the chosen subtree is descended into, so a pick costs O(depth).
pub fn random_child(tree: &Tree, id: Option<NodeId>, rng: &mut impl Rng) -> Option<NodeId> {
    let mut cur = id?;
    if !tree.node(cur).has_both_children() {
        return None;
    }
    let mut candidates = Vec::with_capacity(5);
    loop {
        let node = tree.node(cur);
        let (left, right) = (node.left()?, node.right()?);

        candidates.clear();
        candidates.push(cur);
        for child in [left, left, right, right] {
            if tree.node(child).has_both_children() {
                candidates.push(child);
            }
        }

        let pick = *candidates.choose(rng)?;
        if pick == cur {
            return Some(cur);
        }
        cur = pick;
    }
}

/// Invites the youngest node to grow.
pub fn growth_phase(tree: &mut Tree, tick: i32, rng: &mut impl Rng) -> (NodeId, GrowOutcome) {
    let id = youngest(tree);
    (id, tree.grow_node(id, tick, rng))
}

/// Balances the canopy a little.
///
/// For the node picked by [`random_child`], the child with the smaller
/// subtree is bent outward: the left child by +1° if it is strictly smaller,
/// the right child by −1° otherwise. Returns the bent node if the bend was
/// applied.
pub fn bend_phase(tree: &mut Tree, rng: &mut impl Rng) -> Option<NodeId> {
    let parent = random_child(tree, Some(ROOT), rng)?;
    let node = tree.node(parent);
    let (left, right) = (node.left()?, node.right()?);

    let (target, increment) = if tree.count(Some(left)) < tree.count(Some(right)) {
        (left, 1.0)
    } else {
        (right, -1.0)
    };
    tree.bend(target, increment).then_some(target)
}

/// Runs both phases for one tick.
pub fn step(tree: &mut Tree, tick: i32, rng: &mut impl Rng) -> StepReport {
    let (grown, outcome) = growth_phase(tree, tick, rng);
    let bent = bend_phase(tree, rng);
    StepReport {
        grown,
        outcome,
        bent,
    }
}

/// Index of a branch segment inside a [`crate::tree::Tree`] arena.
///
/// Ids are handed out in creation order and stay valid for as long as the
/// arena lives; nodes are never removed, so an id is never reused.
pub type NodeId = usize;

/// Which child slot of a node a branch occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// What a single call to [`crate::tree::Tree::grow_node`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowOutcome {
    /// A new child was attached on the given side.
    Sprouted(Side, NodeId),
    /// The node got longer and older instead of branching.
    Thickened,
}

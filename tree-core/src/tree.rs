use std::sync::Arc;

use rand::Rng;

use crate::config::GrowthConfig;
use crate::error::PaletteError;
use crate::leaves::LeafCluster;
use crate::palette::Palette;
use crate::types::{GrowOutcome, NodeId, Side};

/// Id of the first branch segment of every [`Tree`].
pub const ROOT: NodeId = 0;

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub age: i32,
    pub length: i32,
    /// Degrees from horizontal, counter-clockwise.
    pub angle: f32,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    /// Cached subtree size, including this node.
    size: u32,
    leaf_seed: u64,
    leaves: Option<LeafCluster>,
}

impl TreeNode {
    fn new(age: i32, length: i32, angle: f32, parent: Option<NodeId>, leaf_seed: u64) -> Self {
        Self {
            age,
            length,
            angle,
            parent,
            left: None,
            right: None,
            size: 1,
            leaf_seed,
            leaves: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn has_both_children(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// The foliage sprite, once [`Tree::refresh_leaves`] has built it.
    pub fn leaves(&self) -> Option<&LeafCluster> {
        self.leaves.as_ref()
    }
}

/// Arena of branch segments forming a strict binary tree.
///
/// Nodes are only ever appended, each child is reachable from exactly one
/// parent, and every node caches the size of its subtree. The palette is
/// held here once and shared by all leaf clusters.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    palette: Arc<Palette>,
    growth: GrowthConfig,
    leaf_size: u32,
}

impl Tree {
    /// A single root segment of age 0 with the configured start length and
    /// angle. One draw is taken from `rng` for the root's leaf layout.
    pub fn new(
        palette: Arc<Palette>,
        growth: GrowthConfig,
        leaf_size: u32,
        rng: &mut impl Rng,
    ) -> Self {
        let root = TreeNode::new(
            0,
            growth.start_branch_len,
            growth.start_branch_angle,
            None,
            rng.random(),
        );
        Self {
            nodes: vec![root],
            palette,
            growth,
            leaf_size,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Mutable access to growth state (age, length, angle). Links and
    /// cached sizes are private, so structure only changes through
    /// [`Tree::add_child`].
    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id]
    }

    pub fn ids(&self) -> std::ops::Range<NodeId> {
        0..self.nodes.len()
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn growth_config(&self) -> &GrowthConfig {
        &self.growth
    }

    /// Subtree size including `id`; 0 for an absent subtree. O(1).
    pub fn count(&self, id: Option<NodeId>) -> u32 {
        id.map_or(0, |id| self.nodes[id].size)
    }

    /// Subtree size recomputed by walking the subtree, ignoring the cache.
    pub fn recount(&self, id: Option<NodeId>) -> u32 {
        let mut stack: Vec<NodeId> = id.into_iter().collect();
        let mut n = 0;
        while let Some(cur) = stack.pop() {
            n += 1;
            let node = &self.nodes[cur];
            stack.extend(node.left);
            stack.extend(node.right);
        }
        n
    }

    /// `true` if every cached size equals `1 + count(left) + count(right)`
    /// and matches a full recount.
    pub fn counts_are_consistent(&self) -> bool {
        self.ids().all(|id| {
            let node = &self.nodes[id];
            node.size == 1 + self.count(node.left) + self.count(node.right)
                && node.size == self.recount(Some(id))
        })
    }

    /// Attaches a new segment in the empty `side` slot of `parent` and bumps
    /// the cached sizes of every ancestor.
    ///
    /// ### Panics
    /// Panics if the slot is already occupied.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        side: Side,
        age: i32,
        length: i32,
        angle: f32,
        leaf_seed: u64,
    ) -> NodeId {
        assert!(
            self.nodes[parent].child(side).is_none(),
            "{side:?} child of node {parent} already exists"
        );
        let id = self.nodes.len();
        self.nodes
            .push(TreeNode::new(age, length, angle, Some(parent), leaf_seed));
        match side {
            Side::Left => self.nodes[parent].left = Some(id),
            Side::Right => self.nodes[parent].right = Some(id),
        }

        let mut cur = Some(parent);
        while let Some(p) = cur {
            self.nodes[p].size += 1;
            cur = self.nodes[p].parent;
        }
        id
    }

    /// Grows a new random segment on `side` of `parent`.
    ///
    /// The child's age is twice the current tick, so late branches start
    /// old and grow slowly. Draws, in order: length, angle, leaf seed.
    ///
    /// ### Panics
    /// Panics if the configured length or angle range is empty; see
    /// [`crate::config::Config::validate`].
    pub fn sprout(&mut self, parent: NodeId, side: Side, tick: i32, rng: &mut impl Rng) -> NodeId {
        let g = self.growth;
        let length = (rng.random_range(g.min_length..=g.max_length) - tick).max(g.min_length);
        let angle = match side {
            Side::Left => rng.random_range(g.min_angle_left..=g.max_angle_left),
            Side::Right => rng.random_range(g.min_angle_right..=g.max_angle_right),
        };
        let seed = rng.random();
        self.add_child(parent, side, tick * 2, length, angle as f32, seed)
    }

    /// One growth step of a single node.
    ///
    /// Rolls 1..=3: 1 sprouts a left child, 2 a right child, anything else,
    /// or a roll landing on an occupied slot, lengthens and ages the node.
    pub fn grow_node(&mut self, id: NodeId, tick: i32, rng: &mut impl Rng) -> GrowOutcome {
        let roll = rng.random_range(1..=3);
        let node = &self.nodes[id];
        let side = match roll {
            1 if node.left.is_none() => Some(Side::Left),
            2 if node.right.is_none() => Some(Side::Right),
            _ => None,
        };

        match side {
            Some(side) => GrowOutcome::Sprouted(side, self.sprout(id, side, tick, rng)),
            None => {
                let node = &mut self.nodes[id];
                node.length += self.growth.grow_length_change;
                node.age += self.growth.grow_age_change;
                GrowOutcome::Thickened
            }
        }
    }

    /// Rotates `id` by `angle_increment` degrees and rejuvenates it and its
    /// direct children.
    ///
    /// Does nothing once the angle is past `max_angle_left` or below
    /// `min_angle_right`. Returns whether the bend was applied.
    pub fn bend(&mut self, id: NodeId, angle_increment: f32) -> bool {
        let g = self.growth;
        let node = &mut self.nodes[id];
        if node.angle > g.max_angle_left as f32 || node.angle < g.min_angle_right as f32 {
            return false;
        }
        node.angle += angle_increment;
        node.age += g.bend_age_change;
        let children = [node.left, node.right];
        for child in children.into_iter().flatten() {
            self.nodes[child].age += g.bend_age_change;
        }
        true
    }

    /// Swaps the palette and rebuilds every leaf cluster with it.
    ///
    /// Nothing changes if the new palette cannot draw leaves.
    pub fn change_color(&mut self, palette: Arc<Palette>) -> Result<(), PaletteError> {
        let clusters = self
            .nodes
            .iter()
            .map(|n| LeafCluster::generate(n.leaf_seed, n.age, &palette, self.leaf_size))
            .collect::<Result<Vec<_>, _>>()?;
        for (node, cluster) in self.nodes.iter_mut().zip(clusters) {
            node.leaves = Some(cluster);
        }
        self.palette = palette;
        Ok(())
    }

    /// Regenerates the leaf cluster of every node whose age changed since
    /// its cluster was built (or that has none yet).
    pub fn refresh_leaves(&mut self) -> Result<(), PaletteError> {
        for node in &mut self.nodes {
            if node.leaves.as_ref().is_some_and(|c| c.age() == node.age) {
                continue;
            }
            node.leaves = Some(LeafCluster::generate(
                node.leaf_seed,
                node.age,
                &self.palette,
                self.leaf_size,
            )?);
        }
        Ok(())
    }
}

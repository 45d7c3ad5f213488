//! Transform hierarchy
//!
//! Nodes live in a generational arena and refer to their parent by key, so a
//! parent link never owns anything and a removed node can never be reached
//! through a stale key.
//!
//! World poses are computed lazily. Every node carries a version that is bumped
//! when its local pose or its parent changes, and caches the world pose it last
//! computed together with the version and the parent stamp it was computed
//! from. A query walks the ancestor chain root-first and recomputes only the
//! nodes whose recorded inputs no longer match, so a change to a parent costs
//! nothing until something below it is actually read.

use super::pose::{Pose, Pose2, Pose3};
use crate::foundation::math::{Vec2, Vec3};
use slotmap::{new_key_type, SlotMap};
use std::cell::Cell;
use thiserror::Error;

new_key_type! {
    /// Key of a node in a [`TransformTree`]
    pub struct TransformId;
}

/// Default bound on hierarchy depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Structural failures of the transform hierarchy
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// The requested parent is the node itself or one of its descendants
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Node being re-parented
        child: TransformId,
        /// Rejected parent
        parent: TransformId,
    },

    /// The resulting chain would be deeper than the tree allows
    #[error("hierarchy depth limit of {limit} exceeded")]
    DepthExceeded {
        /// Configured maximum depth
        limit: usize,
    },

    /// The key does not name a live node
    #[error("unknown transform {0:?}")]
    UnknownNode(TransformId),
}

#[derive(Debug, Clone, Copy)]
struct CachedPose<P> {
    world: P,
    local_version: u64,
    parent_stamp: u64,
    stamp: u64,
}

#[derive(Debug)]
struct TransformNode<P: Pose> {
    local: P,
    parent: Option<TransformId>,
    children: Vec<TransformId>,
    version: u64,
    cache: Cell<Option<CachedPose<P>>>,
}

impl<P: Pose> TransformNode<P> {
    fn new(local: P) -> Self {
        Self { local, parent: None, children: Vec::new(), version: 0, cache: Cell::new(None) }
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// Forest of transform nodes with lazily cached world poses
#[derive(Debug)]
pub struct TransformTree<P: Pose> {
    nodes: SlotMap<TransformId, TransformNode<P>>,
    max_depth: usize,
    next_stamp: Cell<u64>,
    recomputations: Cell<u64>,
}

impl<P: Pose> TransformTree<P> {
    /// Create an empty tree with the default depth limit
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create an empty tree whose chains may be at most `max_depth` nodes deep
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            max_depth: max_depth.max(1),
            next_stamp: Cell::new(1),
            recomputations: Cell::new(0),
        }
    }

    /// Maximum chain length
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` names a live node
    pub fn contains(&self, id: TransformId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of world poses computed so far (cache misses)
    pub fn recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    /// Add a root node with the given local pose
    pub fn create(&mut self, local: P) -> TransformId {
        self.nodes.insert(TransformNode::new(local))
    }

    /// Add a root node at the identity pose
    pub fn create_identity(&mut self) -> TransformId {
        self.create(P::identity())
    }

    /// Remove a node, returning its local pose
    ///
    /// Its children become roots and keep their local pose.
    pub fn remove(&mut self, id: TransformId) -> Option<P> {
        let node = self.nodes.remove(id)?;
        if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|&child| child != id);
        }
        for child in node.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
                child.touch();
            }
        }
        Some(node.local)
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Local pose of a node
    pub fn local(&self, id: TransformId) -> Option<&P> {
        self.nodes.get(id).map(|node| &node.local)
    }

    /// Parent of a node, `None` for roots and unknown keys
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Direct children of a node in attachment order
    pub fn children(&self, id: TransformId) -> &[TransformId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Iterate from a node's parent up to its root
    pub fn ancestors(&self, id: TransformId) -> impl Iterator<Item = TransformId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Number of ancestors of a node (0 for a root)
    pub fn depth(&self, id: TransformId) -> Option<usize> {
        self.nodes.contains_key(id).then(|| self.ancestors(id).count())
    }

    /// Live nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = TransformId> + '_ {
        self.nodes.iter().filter(|(_, node)| node.parent.is_none()).map(|(id, _)| id)
    }

    /// Version of a node's local state
    pub fn version(&self, id: TransformId) -> Option<u64> {
        self.nodes.get(id).map(|node| node.version)
    }

    fn node_mut(&mut self, id: TransformId) -> Result<&mut TransformNode<P>, TransformError> {
        self.nodes.get_mut(id).ok_or(TransformError::UnknownNode(id))
    }

    fn modify(&mut self, id: TransformId, change: impl FnOnce(&mut P)) -> Result<(), TransformError> {
        let node = self.node_mut(id)?;
        change(&mut node.local);
        node.touch();
        Ok(())
    }

    /// Replace a node's local pose
    pub fn set_local(&mut self, id: TransformId, local: P) -> Result<(), TransformError> {
        self.modify(id, |pose| *pose = local)
    }

    /// Move a node in its parent's space
    pub fn translate(&mut self, id: TransformId, delta: P::Vector) -> Result<(), TransformError> {
        self.modify(id, |pose| pose.translate(delta))
    }

    /// Rotate a node relative to its current rotation
    pub fn rotate(&mut self, id: TransformId, delta: P::Rotation) -> Result<(), TransformError> {
        self.modify(id, |pose| pose.rotate(delta))
    }

    /// Scale a node component-wise
    pub fn scale(&mut self, id: TransformId, factor: P::Vector) -> Result<(), TransformError> {
        self.modify(id, |pose| pose.scale_by(factor))
    }

    /// Set a node's local position
    pub fn set_position(&mut self, id: TransformId, position: P::Vector) -> Result<(), TransformError> {
        self.modify(id, |pose| pose.set_position(position))
    }

    /// Set a node's local rotation
    pub fn set_rotation(&mut self, id: TransformId, rotation: P::Rotation) -> Result<(), TransformError> {
        self.modify(id, |pose| pose.set_rotation(rotation))
    }

    /// Set a node's local scale
    pub fn set_scale(&mut self, id: TransformId, scale: P::Vector) -> Result<(), TransformError> {
        self.modify(id, |pose| pose.set_scale(scale))
    }

    /// Re-parent a node, or make it a root with `None`
    ///
    /// The node keeps its local pose. Fails without changing anything when the
    /// new parent is the node itself or one of its descendants, or when the
    /// resulting chain would exceed the depth limit.
    pub fn set_parent(&mut self, child: TransformId, parent: Option<TransformId>) -> Result<(), TransformError> {
        let current = self.nodes.get(child).ok_or(TransformError::UnknownNode(child))?.parent;
        if current == parent {
            return Ok(());
        }

        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(TransformError::UnknownNode(parent));
            }
            self.check_attach(child, parent)?;
        }

        if let Some(old) = current.and_then(|old| self.nodes.get_mut(old)) {
            old.children.retain(|&id| id != child);
        }
        if let Some(new_parent) = parent.and_then(|new_parent| self.nodes.get_mut(new_parent)) {
            new_parent.children.push(child);
        }
        let node = self.node_mut(child)?;
        node.parent = parent;
        node.touch();
        Ok(())
    }

    fn check_attach(&self, child: TransformId, parent: TransformId) -> Result<(), TransformError> {
        let limit = self.max_depth;
        // Walk at most `limit` links up from the new parent looking for the child
        let mut parent_depth = 0;
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(TransformError::Cycle { child, parent });
            }
            if parent_depth >= limit {
                return Err(TransformError::DepthExceeded { limit });
            }
            cursor = self.parent(node);
            parent_depth += 1;
        }

        // parent_depth now counts the parent chain including the parent itself
        if parent_depth + self.subtree_height(child) > limit {
            return Err(TransformError::DepthExceeded { limit });
        }
        Ok(())
    }

    /// Nodes on the longest downward path starting at `id`, including `id`
    fn subtree_height(&self, id: TransformId) -> usize {
        let mut height = 0;
        let mut level = vec![id];
        while !level.is_empty() {
            height += 1;
            level = level.iter().flat_map(|&node| self.children(node).iter().copied()).collect();
        }
        height
    }

    /// Detach a node and reset it to identity, turning its children into roots
    pub fn reset(&mut self, id: TransformId) -> Result<(), TransformError> {
        self.set_parent(id, None)?;
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
                child.touch();
            }
        }
        self.set_local(id, P::identity())
    }

    fn next_stamp(&self) -> u64 {
        let stamp = self.next_stamp.get();
        self.next_stamp.set(stamp.wrapping_add(1));
        stamp
    }

    /// World pose of a node, recomputing stale links of its ancestor chain
    pub fn world(&self, id: TransformId) -> Option<P> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.nodes.get(current)?;
            chain.push(current);
            cursor = node.parent;
        }

        let mut parent: Option<CachedPose<P>> = None;
        for &current in chain.iter().rev() {
            let node = self.nodes.get(current)?;
            let parent_stamp = parent.map_or(0, |cached| cached.stamp);
            let entry = match node.cache.get() {
                Some(cached) if cached.local_version == node.version && cached.parent_stamp == parent_stamp => cached,
                _ => {
                    let world = parent.map_or(node.local, |cached| cached.world.compose(&node.local));
                    let fresh = CachedPose {
                        world,
                        local_version: node.version,
                        parent_stamp,
                        stamp: self.next_stamp(),
                    };
                    node.cache.set(Some(fresh));
                    self.recomputations.set(self.recomputations.get() + 1);
                    fresh
                }
            };
            parent = Some(entry);
        }
        parent.map(|cached| cached.world)
    }

    /// World position of a node
    pub fn world_position(&self, id: TransformId) -> Option<P::Vector> {
        self.world(id).map(|pose| pose.position())
    }

    /// World rotation of a node
    pub fn world_rotation(&self, id: TransformId) -> Option<P::Rotation> {
        self.world(id).map(|pose| pose.rotation())
    }

    /// World scale of a node
    pub fn world_scale(&self, id: TransformId) -> Option<P::Vector> {
        self.world(id).map(|pose| pose.scale())
    }

    /// Map a point from a node's local space into world space
    pub fn transform_point(&self, id: TransformId, point: P::Vector) -> Option<P::Vector> {
        self.world(id).map(|pose| pose.transform_point(point))
    }

    /// Map a world-space point into a node's local space
    pub fn inverse_transform_point(&self, id: TransformId, point: P::Vector) -> Option<P::Vector> {
        self.world(id).map(|pose| pose.inverse_transform_point(point))
    }
}

impl<P: Pose> Default for TransformTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformTree<Pose2> {
    /// World-space facing direction of a 2D node
    pub fn forward(&self, id: TransformId) -> Option<Vec2> {
        self.world(id).map(|pose| pose.forward())
    }

    /// World-space direction a quarter turn counter-clockwise from [`forward`](Self::forward)
    pub fn right(&self, id: TransformId) -> Option<Vec2> {
        self.world(id).map(|pose| pose.right())
    }

    /// Rotate a node so its world forward direction points at `target`
    ///
    /// A target at the node's own position leaves the rotation unchanged.
    pub fn look_at(&mut self, id: TransformId, target: Vec2) -> Result<(), TransformError> {
        let world = self.world(id).ok_or(TransformError::UnknownNode(id))?;
        let offset = target - world.position;
        if offset.norm_squared() <= f32::EPSILON {
            return Ok(());
        }
        let parent_rotation = self
            .parent(id)
            .and_then(|parent| self.world_rotation(parent))
            .unwrap_or(0.0);
        self.set_rotation(id, offset.y.atan2(offset.x) - parent_rotation)
    }
}

impl TransformTree<Pose3> {
    /// World-space forward (-Z) direction of a 3D node
    pub fn forward(&self, id: TransformId) -> Option<Vec3> {
        self.world(id).map(|pose| pose.forward())
    }

    /// World-space right (+X) direction of a 3D node
    pub fn right(&self, id: TransformId) -> Option<Vec3> {
        self.world(id).map(|pose| pose.right())
    }
}

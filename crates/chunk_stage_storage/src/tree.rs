//! A hashed `2^D`-tree (quadtree, octree, hexadecatree) that stores a value at every node.
//!
//! Every node is either a leaf or a branch with exactly `2^D` children. A leaf's value applies to every index in its region;
//! a branch's value is a coarse representative of its subtree, which makes the tree usable as multi-resolution storage.
//! Nodes at `max_depth` cover a single index and are always leaves.
//!
//! Nodes are not linked by pointers. Each node is identified by a `LocationCode`: the root is `1`, and the child with index
//! `c` of node `n` is `(n << D) | c`. Bit `k` of the child index selects the upper half of the parent along axis `k`.
//!
//! # Traversal
//!
//! Both traversals borrow the tree, so it can't be restructured while they are running.
//!
//! ```
//! use chunk_stage_core::prelude::*;
//! use chunk_stage_storage::prelude::*;
//!
//! let mut tree = IndexableTree::<2, u8>::new(IndexN::ZERO, 2, 0).unwrap();
//! tree.set(IndexN([3, 0]), 1).unwrap();
//!
//! let depths: Vec<_> = tree.breadth_first().map(|(_, node)| node.depth).collect();
//! assert_eq!(depths, vec![0, 1, 1, 1, 1, 2, 2, 2, 2]);
//! ```

use crate::{Indexable, IndexableMut, SmallKeyHashMap, StageError, StageResult};

use chunk_stage_core::prelude::*;

use std::collections::VecDeque;
use std::fmt;

/// A node as seen by a reader of the tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeNode<V> {
    /// Zero at the root.
    pub depth: u8,
    pub value: V,
    pub is_leaf: bool,
}

#[derive(Clone, Copy, Eq, Hash, PartialEq)]
struct LocationCode(u64);

impl fmt::Debug for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "LocationCode({:#b})", self.0)
    }
}

impl LocationCode {
    const ROOT: Self = Self(1);

    #[inline]
    fn child<const D: usize>(self, child_index: usize) -> Self {
        Self((self.0 << D) | child_index as u64)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct NodeEntry<V> {
    value: V,
    is_leaf: bool,
}

/// The geometry of a node, computed during traversal instead of stored.
#[derive(Clone, Copy, Debug)]
struct NodeSite<const D: usize> {
    code: LocationCode,
    lower: IndexN<D>,
    depth: u8,
}

impl<const D: usize> NodeSite<D> {
    #[inline]
    fn edge_length(&self, max_depth: u8) -> i32 {
        1 << (max_depth - self.depth)
    }

    #[inline]
    fn child(&self, child_index: usize, max_depth: u8) -> Self {
        let half = self.edge_length(max_depth) >> 1;

        Self {
            code: self.code.child::<D>(child_index),
            lower: self.lower + IndexN::corner_offset(child_index) * half,
            depth: self.depth + 1,
        }
    }

    /// The index of the child containing `index`, which must be inside this node.
    #[inline]
    fn child_index_containing(&self, index: IndexN<D>, max_depth: u8) -> usize {
        let half = self.edge_length(max_depth) >> 1;
        let local = index - self.lower;

        local
            .0
            .iter()
            .enumerate()
            .fold(0, |acc, (dim, &c)| acc | (((c >= half) as usize) << dim))
    }
}

/// A bounded, depth-limited tree indexable over the cube `lower_bounds + [0, 2^max_depth)`.
#[derive(Clone, Debug)]
pub struct IndexableTree<const D: usize, V> {
    lower_bounds: IndexN<D>,
    max_depth: u8,
    nodes: SmallKeyHashMap<LocationCode, NodeEntry<V>>,
}

/// A quadtree.
pub type IndexableTree2<V> = IndexableTree<2, V>;
/// An octree.
pub type IndexableTree3<V> = IndexableTree<3, V>;

impl<const D: usize, V> IndexableTree<D, V> {
    /// The deepest tree whose location codes fit in 64 bits and whose edge fits in an `i32`.
    pub const DEPTH_LIMIT: u8 = {
        let by_code = 63 / D;
        if by_code < 30 {
            by_code as u8
        } else {
            30
        }
    };

    /// A single leaf covering the whole cube with `value`.
    pub fn new(lower_bounds: IndexN<D>, max_depth: u8, value: V) -> StageResult<Self> {
        if max_depth > Self::DEPTH_LIMIT {
            return Err(StageError::invalid_argument(format!(
                "tree depth {} exceeds the limit of {} for rank {}",
                max_depth,
                Self::DEPTH_LIMIT,
                D
            )));
        }

        Ok(Self::new_clamped(lower_bounds, max_depth, value))
    }

    /// Like `new`, but a depth beyond `DEPTH_LIMIT` is clamped to it.
    pub(crate) fn new_clamped(lower_bounds: IndexN<D>, max_depth: u8, value: V) -> Self {
        let mut nodes = SmallKeyHashMap::default();
        nodes.insert(
            LocationCode::ROOT,
            NodeEntry {
                value,
                is_leaf: true,
            },
        );

        Self {
            lower_bounds,
            max_depth: max_depth.min(Self::DEPTH_LIMIT),
            nodes,
        }
    }

    #[inline]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    #[inline]
    pub fn edge_length(&self) -> i32 {
        1 << self.max_depth
    }

    #[inline]
    pub fn lower_bounds(&self) -> IndexN<D> {
        self.lower_bounds
    }

    /// Moves the tree so its least index is `lower_bounds`.
    #[inline]
    pub fn set_lower_bounds(&mut self, lower_bounds: IndexN<D>) {
        self.lower_bounds = lower_bounds;
    }

    /// Total number of nodes, branches included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.values().filter(|n| n.is_leaf).count()
    }

    #[inline]
    fn root_site(&self) -> NodeSite<D> {
        NodeSite {
            code: LocationCode::ROOT,
            lower: self.lower_bounds,
            depth: 0,
        }
    }

    #[inline]
    fn entry(&self, code: LocationCode) -> &NodeEntry<V> {
        // Every reachable code has an entry; a miss means the hash map was corrupted.
        &self.nodes[&code]
    }

    #[inline]
    fn check_index(&self, index: IndexN<D>) -> StageResult<()> {
        if self.cube().contains(index) {
            Ok(())
        } else {
            Err(StageError::out_of_bounds(&index.0))
        }
    }

    /// Walks from the root to the leaf containing `index`, which must be in bounds.
    fn locate(&self, index: IndexN<D>) -> NodeSite<D> {
        let mut site = self.root_site();
        while !self.entry(site.code).is_leaf {
            let child = site.child_index_containing(index, self.max_depth);
            site = site.child(child, self.max_depth);
        }
        site
    }

    /// The cube of indices covered by the root.
    #[inline]
    pub fn cube(&self) -> BoundsN<D> {
        BoundsN::new(self.lower_bounds, IndexN::fill(self.edge_length()))
    }

    /// The deepest existing node containing `index`, which is always a leaf.
    pub fn get_node(&self, index: IndexN<D>) -> StageResult<TreeNode<&V>> {
        self.check_index(index)?;
        let site = self.locate(index);
        let entry = self.entry(site.code);

        Ok(TreeNode {
            depth: site.depth,
            value: &entry.value,
            is_leaf: true,
        })
    }

    /// The least index and the node at exactly `depth` containing `index`, if the tree is that deep there.
    pub fn get_node_at_depth(
        &self,
        index: IndexN<D>,
        depth: u8,
    ) -> StageResult<Option<(IndexN<D>, TreeNode<&V>)>> {
        self.check_index(index)?;

        let mut site = self.root_site();
        loop {
            let entry = self.entry(site.code);
            if site.depth == depth {
                return Ok(Some((
                    site.lower,
                    TreeNode {
                        depth,
                        value: &entry.value,
                        is_leaf: entry.is_leaf,
                    },
                )));
            }
            if entry.is_leaf {
                return Ok(None);
            }
            let child = site.child_index_containing(index, self.max_depth);
            site = site.child(child, self.max_depth);
        }
    }

    /// Visits all nodes at depth `d` before any node at depth `d + 1`. Siblings are visited in ascending child index order.
    pub fn breadth_first(&self) -> BreadthFirst<'_, D, V> {
        let mut queue = VecDeque::new();
        queue.push_back(self.root_site());

        BreadthFirst { tree: self, queue }
    }

    /// Visits a node, then each of its subtrees in ascending child index order, before any of its siblings.
    pub fn depth_first(&self) -> DepthFirst<'_, D, V> {
        DepthFirst {
            tree: self,
            stack: vec![self.root_site()],
        }
    }

    /// Iterates over the leaves in depth-first order, with the region each one covers.
    pub fn leaves(&self) -> impl Iterator<Item = (BoundsN<D>, &V)> + '_ {
        let max_depth = self.max_depth;
        self.depth_first().filter_map(move |(lower, node)| {
            node.is_leaf.then(|| {
                let edge = 1 << (max_depth - node.depth);
                (BoundsN::new(lower, IndexN::fill(edge)), node.value)
            })
        })
    }
}

impl<const D: usize, V: Clone> IndexableTree<D, V> {
    /// Make sure the node containing `index` exists down to `depth`. New children copy their parent's value. Returns the site
    /// of the node at `depth`.
    fn subdivide_to(&mut self, index: IndexN<D>, depth: u8) -> NodeSite<D> {
        let max_depth = self.max_depth;
        let mut site = self.root_site();
        while site.depth < depth {
            let value = {
                let entry = self.entry(site.code);
                if entry.is_leaf {
                    Some(entry.value.clone())
                } else {
                    None
                }
            };
            if let Some(value) = value {
                for child in 0..(1 << D) {
                    self.nodes.insert(
                        site.code.child::<D>(child),
                        NodeEntry {
                            value: value.clone(),
                            is_leaf: true,
                        },
                    );
                }
                if let Some(entry) = self.nodes.get_mut(&site.code) {
                    entry.is_leaf = false;
                }
            }

            let child = site.child_index_containing(index, max_depth);
            site = site.child(child, max_depth);
        }
        site
    }

    /// Split leaves along the path to `index` until the node containing it is at `depth`.
    pub fn subdivide(&mut self, index: IndexN<D>, depth: u8) -> StageResult<()> {
        self.check_index(index)?;
        if depth > self.max_depth {
            return Err(StageError::invalid_argument(format!(
                "depth {} is deeper than the tree's maximum {}",
                depth, self.max_depth
            )));
        }
        self.subdivide_to(index, depth);

        Ok(())
    }

    /// Overwrite the value of the deepest node containing `index`. If that node is a coarse leaf, the whole region it covers
    /// takes the value.
    pub fn set_node_value(&mut self, index: IndexN<D>, value: V) -> StageResult<()> {
        self.check_index(index)?;
        let site = self.locate(index);
        if let Some(entry) = self.nodes.get_mut(&site.code) {
            entry.value = value;
        }

        Ok(())
    }

    /// Collapse the tree into a single leaf.
    pub fn fill(&mut self, value: V) {
        self.nodes.clear();
        self.nodes.insert(
            LocationCode::ROOT,
            NodeEntry {
                value,
                is_leaf: true,
            },
        );
    }

    fn remove_children(&mut self, site: NodeSite<D>) {
        for child in 0..(1 << D) {
            let child_site = site.child(child, self.max_depth);
            if let Some(entry) = self.nodes.remove(&child_site.code) {
                if !entry.is_leaf {
                    self.remove_children(child_site);
                }
            }
        }
    }
}

impl<const D: usize, V: Clone + PartialEq> IndexableTree<D, V> {
    /// Replace every branch whose children are leaves with equal values by a single leaf. Returns the number of branches
    /// collapsed.
    pub fn merge_uniform(&mut self) -> usize {
        let mut merged = 0;
        self.merge_site(self.root_site(), &mut merged);
        merged
    }

    // Returns the site's value if it is a leaf after merging.
    fn merge_site(&mut self, site: NodeSite<D>, merged: &mut usize) -> Option<V> {
        if self.entry(site.code).is_leaf {
            return Some(self.entry(site.code).value.clone());
        }

        let child_values: Vec<_> = (0..(1 << D))
            .map(|child| self.merge_site(site.child(child, self.max_depth), merged))
            .collect();

        match uniform_value(child_values) {
            Some(value) => {
                self.remove_children(site);
                self.nodes.insert(
                    site.code,
                    NodeEntry {
                        value: value.clone(),
                        is_leaf: true,
                    },
                );
                *merged += 1;
                Some(value)
            }
            _ => None,
        }
    }

    /// Replace the contents of the tree with the values of `src` at the same indices, using as few nodes as possible.
    /// Indices that `src` doesn't cover keep `background`.
    pub fn assign_from<Src>(&mut self, src: &Src, background: V)
    where
        Src: Indexable<D, Value = V>,
    {
        self.nodes.clear();
        self.build_site(self.root_site(), src, &background);
    }

    fn build_site<Src>(&mut self, site: NodeSite<D>, src: &Src, background: &V) -> Option<V>
    where
        Src: Indexable<D, Value = V>,
    {
        if site.depth == self.max_depth {
            let value = src.try_get(site.lower).unwrap_or_else(|| background.clone());
            self.nodes.insert(
                site.code,
                NodeEntry {
                    value: value.clone(),
                    is_leaf: true,
                },
            );
            return Some(value);
        }

        let child_values: Vec<_> = (0..(1 << D))
            .map(|child| self.build_site(site.child(child, self.max_depth), src, background))
            .collect();

        match uniform_value(child_values) {
            Some(value) => {
                self.remove_children(site);
                self.nodes.insert(
                    site.code,
                    NodeEntry {
                        value: value.clone(),
                        is_leaf: true,
                    },
                );
                Some(value)
            }
            _ => {
                // Branches represent their subtree by the value at their least index.
                let representative = src
                    .try_get(site.lower)
                    .unwrap_or_else(|| background.clone());
                self.nodes.insert(
                    site.code,
                    NodeEntry {
                        value: representative,
                        is_leaf: false,
                    },
                );
                None
            }
        }
    }
}

/// The shared value if every child is a leaf and all of them are equal.
fn uniform_value<V: PartialEq>(mut child_values: Vec<Option<V>>) -> Option<V> {
    let first = child_values.pop()??;
    if child_values.iter().all(|v| v.as_ref() == Some(&first)) {
        Some(first)
    } else {
        None
    }
}

impl<const D: usize, V: Clone> Indexable<D> for IndexableTree<D, V> {
    type Value = V;

    #[inline]
    fn bounds(&self) -> BoundsN<D> {
        self.cube()
    }

    #[inline]
    fn get_unchecked(&self, index: IndexN<D>) -> V {
        debug_assert!(self.cube().contains(index));
        self.entry(self.locate(index).code).value.clone()
    }
}

impl<const D: usize, V: Clone> IndexableMut<D> for IndexableTree<D, V> {
    /// Subdivides down to `max_depth` so only `index` changes.
    #[inline]
    fn set_unchecked(&mut self, index: IndexN<D>, value: V) {
        debug_assert!(self.cube().contains(index));
        let site = self.subdivide_to(index, self.max_depth);
        if let Some(entry) = self.nodes.get_mut(&site.code) {
            entry.value = value;
        }
    }
}

pub struct BreadthFirst<'a, const D: usize, V> {
    tree: &'a IndexableTree<D, V>,
    queue: VecDeque<NodeSite<D>>,
}

impl<'a, const D: usize, V> Iterator for BreadthFirst<'a, D, V> {
    type Item = (IndexN<D>, TreeNode<&'a V>);

    fn next(&mut self) -> Option<Self::Item> {
        let site = self.queue.pop_front()?;
        let entry = self.tree.entry(site.code);
        if !entry.is_leaf {
            for child in 0..(1 << D) {
                self.queue.push_back(site.child(child, self.tree.max_depth));
            }
        }

        Some((
            site.lower,
            TreeNode {
                depth: site.depth,
                value: &entry.value,
                is_leaf: entry.is_leaf,
            },
        ))
    }
}

pub struct DepthFirst<'a, const D: usize, V> {
    tree: &'a IndexableTree<D, V>,
    stack: Vec<NodeSite<D>>,
}

impl<'a, const D: usize, V> Iterator for DepthFirst<'a, D, V> {
    type Item = (IndexN<D>, TreeNode<&'a V>);

    fn next(&mut self) -> Option<Self::Item> {
        let site = self.stack.pop()?;
        let entry = self.tree.entry(site.code);
        if !entry.is_leaf {
            for child in (0..(1 << D)).rev() {
                self.stack.push(site.child(child, self.tree.max_depth));
            }
        }

        Some((
            site.lower,
            TreeNode {
                depth: site.depth,
                value: &entry.value,
                is_leaf: entry.is_leaf,
            },
        ))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

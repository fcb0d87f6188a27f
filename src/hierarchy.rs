//! Activity category hierarchy resolver.
//!
//! Activities form a tree through an optional parent reference. Filtering by
//! a category with `include_children` must match organizations tagged with
//! the category itself or any transitive descendant, so the resolver expands
//! an id into its full closure.
//!
//! The tree is materialized as an arena of (id, parent) pairs with a
//! child-index built up front. Expansion walks an explicit worklist rather
//! than recursing, so depth is bounded by heap, not stack. A visited set
//! guards the walk: parents are a tree by construction, but nothing validates
//! that at insert time, and a hand-introduced cycle must not hang the query.

use std::collections::{BTreeSet, HashMap};

/// Arena of activity nodes keyed by id.
#[derive(Debug, Default)]
pub struct ActivityTree {
    /// parent id -> child ids
    children: HashMap<i64, Vec<i64>>,
    /// all known ids
    ids: BTreeSet<i64>,
}

impl ActivityTree {
    /// Build the tree from (id, parent_id) pairs.
    pub fn new<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (i64, Option<i64>)>,
    {
        let mut tree = Self::default();
        for (id, parent_id) in nodes {
            tree.ids.insert(id);
            if let Some(parent) = parent_id {
                tree.children.entry(parent).or_default().push(id);
            }
        }
        tree
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Expand `root` into {root} plus all transitive descendants.
    ///
    /// Returns a sorted id list. An id that is not in the arena expands to
    /// the empty set, mirroring a recursive query whose seed row matches
    /// nothing.
    pub fn expand(&self, root: i64) -> Vec<i64> {
        if !self.ids.contains(&root) {
            return Vec::new();
        }

        let mut seen = BTreeSet::new();
        let mut worklist = vec![root];

        while let Some(id) = worklist.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(kids) = self.children.get(&id) {
                worklist.extend(kids.iter().copied());
            }
        }

        seen.into_iter().collect()
    }
}

//! Structural validation of an on-disk B+Tree.
//!
//! Walks every node from the root and checks:
//! - every leaf sits at depth `height` (balance)
//! - keys within each node are sorted
//! - every key lies inside the range its parents route to it
//! - the leaf chain visits exactly the leaves of the tree, left to right
//!
//! Assumes distinct keys.

use crate::common::{Error, PageId, Result};

use super::{BTreeIndex, Key};

/// Node and entry counts gathered by [`BTreeIndex::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub height: u32,
    pub internal_nodes: usize,
    pub leaf_nodes: usize,
    pub entries: usize,
}

/// Half-open key range `[lower, upper)` a subtree is allowed to hold.
#[derive(Clone, Copy)]
struct Bounds {
    lower: Option<Key>,
    upper: Option<Key>,
}

impl Bounds {
    const ALL: Bounds = Bounds {
        lower: None,
        upper: None,
    };

    fn contains(&self, key: Key) -> bool {
        self.lower.map_or(true, |lo| key >= lo) && self.upper.map_or(true, |hi| key < hi)
    }
}

fn violation(page: PageId, reason: String) -> Error {
    Error::CorruptPage { page, reason }
}

impl BTreeIndex {
    /// Check the tree's structural invariants.
    ///
    /// # Errors
    /// `Error::CorruptPage` naming the first offending page, or any error
    /// from reading nodes.
    pub fn validate(&mut self) -> Result<TreeStats> {
        let mut stats = TreeStats {
            height: self.height(),
            ..TreeStats::default()
        };
        if self.height() == 0 {
            return Ok(stats);
        }

        let mut leaves = Vec::new();
        self.validate_node(self.root(), 1, Bounds::ALL, &mut stats, &mut leaves)?;

        let mut chained = Vec::with_capacity(leaves.len());
        let mut next = leaves.first().copied();
        while let Some(pid) = next {
            if chained.len() > leaves.len() {
                return Err(violation(pid, "leaf chain is longer than the tree".into()));
            }
            chained.push(pid);
            next = self.read_leaf(pid)?.next_node_ptr();
        }
        if chained != leaves {
            return Err(violation(
                self.root(),
                format!("leaf chain {:?} does not match tree order {:?}", chained, leaves),
            ));
        }

        Ok(stats)
    }

    fn validate_node(
        &mut self,
        pid: PageId,
        depth: u32,
        bounds: Bounds,
        stats: &mut TreeStats,
        leaves: &mut Vec<PageId>,
    ) -> Result<()> {
        if depth == self.height() {
            let leaf = self.read_leaf(pid)?;
            if leaf.key_count() == 0 {
                return Err(violation(pid, "empty leaf".into()));
            }
            let keys: Vec<Key> = leaf.keys().collect();
            check_sorted(pid, &keys)?;
            if let Some(&key) = keys.iter().find(|&&k| !bounds.contains(k)) {
                return Err(violation(pid, format!("key {} routed to wrong leaf", key)));
            }

            stats.leaf_nodes += 1;
            stats.entries += keys.len();
            leaves.push(pid);
            return Ok(());
        }

        // Reading a leaf page here fails the page type check, which is
        // how an unbalanced tree shows up.
        let node = self.read_internal(pid)?;
        check_sorted(pid, node.keys())?;
        if let Some(&key) = node.keys().iter().find(|&&k| !bounds.contains(k)) {
            return Err(violation(pid, format!("separator {} outside parent range", key)));
        }
        stats.internal_nodes += 1;

        let keys = node.keys();
        for (i, &child) in node.children().iter().enumerate() {
            let child_bounds = Bounds {
                lower: if i == 0 { bounds.lower } else { Some(keys[i - 1]) },
                upper: if i == keys.len() { bounds.upper } else { Some(keys[i]) },
            };
            self.validate_node(child, depth + 1, child_bounds, stats, leaves)?;
        }
        Ok(())
    }
}

fn check_sorted(pid: PageId, keys: &[Key]) -> Result<()> {
    match keys.windows(2).find(|w| w[0] >= w[1]) {
        Some(w) => Err(violation(
            pid,
            format!("keys out of order: {} before {}", w[0], w[1]),
        )),
        None => Ok(()),
    }
}

//! AVL rebalancing: rotations and the walks that restore the height-balance invariant after a
//! structural change.
//!
//! Every function here operates on explicit node indices. A node's cached height is only trusted
//! once everything below it has been brought up to date, so heights are always recomputed child
//! before parent.

use tracing::trace;
use super::node::{Dir, Idx, Left, Link, Nodes, Right};

/// What a rebalancing walk did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rebalance {
    /// The number of nodes at which balance had to be restored.
    pub fixups: usize,
    /// The number of rotations, counting a double rotation as two.
    pub rotations: usize,
    /// The number of nodes the walk recomputed before it stopped.
    pub visited: usize,
}

/// Rotates the subtree rooted at `x` toward `D`, lifting `x`'s child on the opposite side into its
/// place. Key order is preserved; cached heights are not updated.
///
/// Returns the new root of the subtree.
pub fn rotate<D: Dir, K, V>(nodes: &mut Nodes<K, V>, x: Idx) -> Idx {
    let y = match D::Opposite::forward(&nodes[x]) {
        Some(y) => y,
        None => panic!("rotation of node {} without a child to lift", x),
    };

    let inner = D::forward(&nodes[y]);
    *D::Opposite::forward_mut(&mut nodes[x]) = inner;
    if let Some(inner) = inner { nodes[inner].parent = Some(x); }

    let parent = nodes[x].parent;
    nodes.replace_child(parent, x, Some(y));
    nodes[y].parent = parent;

    *D::forward_mut(&mut nodes[y]) = Some(x);
    nodes[x].parent = Some(y);
    y
}

/// Rotates like [`rotate`], then fixes the cached heights of the two rotated nodes.
pub fn avl_rotate<D: Dir, K, V>(nodes: &mut Nodes<K, V>, x: Idx) -> Idx {
    let y = rotate::<D, K, V>(nodes, x);
    // `x` is now `y`'s child
    nodes.update_height(x);
    nodes.update_height(y);
    y
}

// Restores balance at `x`, whose `H` subtree is two levels taller than the other one. A child
// leaning the other way is first rotated toward `H`, turning the double-rotation case into the
// single one.
fn fixup<H: Dir, K, V>(nodes: &mut Nodes<K, V>, x: Idx) -> (Idx, usize) {
    let child = match H::forward(&nodes[x]) {
        Some(child) => child,
        None => panic!("node {} is heavy on an empty side", x),
    };

    let mut rotations = 1;

    if nodes.balance_factor(child) == -H::SIGN {
        avl_rotate::<H, K, V>(nodes, child);
        rotations += 1;
    }

    (avl_rotate::<H::Opposite, K, V>(nodes, x), rotations)
}

// `x`'s height must be current.
fn restore<K, V>(nodes: &mut Nodes<K, V>, x: Idx) -> Option<(Idx, usize)> {
    match nodes.balance_factor(x) {
        2 => Some(fixup::<Left, K, V>(nodes, x)),
        -2 => Some(fixup::<Right, K, V>(nodes, x)),
        _ => None,
    }
}

/// Rebalances after a leaf was attached below `start`.
///
/// At most one fix-up happens: a rotation at the lowest unbalanced node brings that subtree back to
/// its height from before the insertion, so nothing above it changes.
pub fn insert_rebalance<K, V>(nodes: &mut Nodes<K, V>, start: Link) -> Rebalance {
    let mut rebalance = Rebalance::default();
    let mut link = start;

    while let Some(x) = link {
        rebalance.visited += 1;
        let before = nodes[x].height;
        nodes.update_height(x);

        // both subtrees now have equal height, which the taller one already had
        if nodes.balance_factor(x) == 0 { break; }

        let top = match restore(nodes, x) {
            None => x,
            Some((top, rotations)) => {
                rebalance.fixups += 1;
                rebalance.rotations += rotations;
                trace!(node = x, rotations, height = nodes[top].height, "rebalanced after insert");
                top
            }
        };

        if nodes[top].height == before { break; }
        link = nodes[top].parent;
    }

    rebalance
}

/// Rebalances after a subtree below `start` lost a level.
///
/// Unlike insertion, a fix-up can leave its subtree one level shorter, so the walk may rotate at
/// every node up to the root. It stops as soon as the subtree at the current position is as tall
/// as it was before the removal.
pub fn remove_rebalance<K, V>(nodes: &mut Nodes<K, V>, start: Link) -> Rebalance {
    let mut rebalance = Rebalance::default();
    let mut link = start;

    while let Some(x) = link {
        rebalance.visited += 1;
        let before = nodes[x].height;
        nodes.update_height(x);

        let top = match restore(nodes, x) {
            None => x,
            Some((top, rotations)) => {
                rebalance.fixups += 1;
                rebalance.rotations += rotations;
                trace!(node = x, rotations, height = nodes[top].height, "rebalanced after remove");
                top
            }
        };

        if nodes[top].height == before { break; }
        link = nodes[top].parent;
    }

    rebalance
}

#[cfg(test)]
mod test {
    use super::{avl_rotate, rotate};
    use super::super::node::{Idx, Left, Nodes, Right};

    // 1 -> 2 -> 3, linked through right children without rebalancing
    fn right_chain() -> (Nodes<u32, ()>, [Idx; 3]) {
        let mut nodes = Nodes::with_capacity(3);
        let a = nodes.alloc(1, (), None);
        let b = nodes.alloc(2, (), Some(a));
        let c = nodes.alloc(3, (), Some(b));
        nodes.root = Some(a);
        nodes[a].right = Some(b);
        nodes[b].right = Some(c);
        nodes[b].height = 2;
        nodes[a].height = 3;
        (nodes, [a, b, c])
    }

    #[test]
    fn rotate_left_lifts_right_child() {
        let (mut nodes, [a, b, c]) = right_chain();
        let top = rotate::<Left, _, _>(&mut nodes, a);

        assert_eq!(top, b);
        assert_eq!(nodes.root, Some(b));
        assert_eq!(nodes[b].parent, None);
        assert_eq!(nodes[b].left, Some(a));
        assert_eq!(nodes[b].right, Some(c));
        assert_eq!(nodes[a].parent, Some(b));
        assert_eq!(nodes[a].right, None);
        assert_eq!(nodes[c].parent, Some(b));

        // heights are left alone
        assert_eq!(nodes[a].height, 3);
        assert_eq!(nodes[b].height, 2);
    }

    #[test]
    fn avl_rotate_updates_heights_child_first() {
        let (mut nodes, [a, b, c]) = right_chain();
        avl_rotate::<Left, _, _>(&mut nodes, a);

        assert_eq!(nodes[a].height, 1);
        assert_eq!(nodes[c].height, 1);
        assert_eq!(nodes[b].height, 2);
        assert_eq!(nodes.balance_factor(b), 0);
    }

    #[test]
    fn rotations_are_mirror_images() {
        let (mut nodes, [a, b, _]) = right_chain();
        avl_rotate::<Left, _, _>(&mut nodes, a);
        let top = avl_rotate::<Right, _, _>(&mut nodes, b);

        assert_eq!(top, a);
        assert_eq!(nodes.root, Some(a));
        assert_eq!(nodes[a].left, None);
        assert_eq!(nodes[a].right, Some(b));
        assert_eq!(nodes[b].left, None);
        assert_eq!(nodes[a].height, 3);
    }

    #[test]
    fn rotate_moves_inner_grandchild() {
        // 2 with left 1 and right 4, where 4 has left 3
        let mut nodes = Nodes::with_capacity(4);
        let two = nodes.alloc(2, (), None);
        let one = nodes.alloc(1, (), Some(two));
        let four = nodes.alloc(4, (), Some(two));
        let three = nodes.alloc(3, (), Some(four));
        nodes.root = Some(two);
        nodes[two].left = Some(one);
        nodes[two].right = Some(four);
        nodes[four].left = Some(three);
        nodes.update_height(four);
        nodes.update_height(two);

        avl_rotate::<Left, _, _>(&mut nodes, two);

        assert_eq!(nodes.root, Some(four));
        assert_eq!(nodes[four].left, Some(two));
        assert_eq!(nodes[two].right, Some(three));
        assert_eq!(nodes[three].parent, Some(two));
        assert_eq!(nodes[two].height, 2);
        assert_eq!(nodes[four].height, 3);
    }
}


use compare::Compare;
use std::cmp::max;
use std::cmp::Ordering::{self, *};
use std::mem;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{self, AtomicU64};
use super::balance::{self, Rebalance};
use super::error::Error;

pub type Idx = u32;
pub type Link = Option<Idx>;

#[derive(Clone, Debug)]
pub struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub height: u32,
    pub parent: Link,
    pub left: Link,
    pub right: Link,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, parent: Link) -> Self {
        Node { key: key, value: value, height: 1, parent: parent, left: None, right: None }
    }
}

#[derive(Clone, Debug)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next: Link },
}

#[derive(Clone, Debug)]
struct Cell<K, V> {
    generation: u32,
    slot: Slot<K, V>,
}

/// A reference to an entry in a [`Map`](crate::Map).
///
/// Handles are cheap to copy and stay valid until the entry they refer to is removed. Using a
/// handle after that, or with a map other than the one that issued it, is reported as an
/// [`Error`](crate::Error) rather than silently reaching another entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    tree: u64,
    index: Idx,
    generation: u32,
}

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

fn next_tree_id() -> u64 { NEXT_TREE_ID.fetch_add(1, atomic::Ordering::Relaxed) }

/// The node arena of a single tree.
///
/// The arena is the sole owner of every node. `left`, `right` and `parent` are indices into it, so
/// the parent back-reference never takes part in ownership.
#[derive(Debug)]
pub struct Nodes<K, V> {
    id: u64,
    cells: Vec<Cell<K, V>>,
    free: Link,
    pub root: Link,
}

impl<K, V> Clone for Nodes<K, V> where K: Clone, V: Clone {
    fn clone(&self) -> Self {
        Nodes { id: next_tree_id(), cells: self.cells.clone(), free: self.free, root: self.root }
    }
}

impl<K, V> Index<Idx> for Nodes<K, V> {
    type Output = Node<K, V>;

    fn index(&self, index: Idx) -> &Node<K, V> {
        match self.cells[index as usize].slot {
            Slot::Occupied(ref node) => node,
            Slot::Vacant { .. } => panic!("vacant node slot {}", index),
        }
    }
}

impl<K, V> IndexMut<Idx> for Nodes<K, V> {
    fn index_mut(&mut self, index: Idx) -> &mut Node<K, V> {
        match self.cells[index as usize].slot {
            Slot::Occupied(ref mut node) => node,
            Slot::Vacant { .. } => panic!("vacant node slot {}", index),
        }
    }
}

impl<K, V> Nodes<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Nodes { id: next_tree_id(), cells: Vec::with_capacity(capacity), free: None, root: None }
    }

    pub fn alloc(&mut self, key: K, value: V, parent: Link) -> Idx {
        let node = Node::new(key, value, parent);

        match self.free {
            Some(index) => {
                let cell = &mut self.cells[index as usize];
                self.free = match cell.slot {
                    Slot::Vacant { next } => next,
                    Slot::Occupied(_) => panic!("occupied node slot {} on the free list", index),
                };
                cell.slot = Slot::Occupied(node);
                index
            }
            None => {
                assert!(self.cells.len() < Idx::MAX as usize, "node arena exhausted");
                self.cells.push(Cell { generation: 0, slot: Slot::Occupied(node) });
                (self.cells.len() - 1) as Idx
            }
        }
    }

    /// Vacates the node's slot, invalidating every handle to it. The node must already be unlinked.
    ///
    /// A slot whose generation is exhausted is retired: it stays vacant and never returns to the
    /// free list, so a handle from its last generation can not resolve again.
    pub fn free(&mut self, index: Idx) -> Node<K, V> {
        let cell = &mut self.cells[index as usize];
        let retired = cell.generation == u32::MAX;
        let next = if retired { None } else { self.free };

        match mem::replace(&mut cell.slot, Slot::Vacant { next: next }) {
            Slot::Occupied(node) => {
                if !retired {
                    cell.generation += 1;
                    self.free = Some(index);
                }
                node
            }
            Slot::Vacant { .. } => panic!("double free of node slot {}", index),
        }
    }

    /// Drops every node and releases the arena. The tree takes a fresh id, so handles issued
    /// before the call are reported as foreign.
    pub fn clear(&mut self) {
        self.id = next_tree_id();
        self.cells = Vec::new();
        self.free = None;
        self.root = None;
    }

    pub fn handle(&self, index: Idx) -> Handle {
        Handle { tree: self.id, index: index, generation: self.cells[index as usize].generation }
    }

    pub fn resolve(&self, handle: Handle) -> Result<Idx, Error> {
        if handle.tree != self.id { return Err(Error::ForeignHandle); }

        match self.cells.get(handle.index as usize) {
            Some(&Cell { generation, slot: Slot::Occupied(_) }) if generation == handle.generation =>
                Ok(handle.index),
            _ => Err(Error::StaleHandle),
        }
    }

    /// Returns the cached height of the subtree, `0` for an empty one.
    pub fn height(&self, link: Link) -> u32 { link.map_or(0, |index| self[index].height) }

    pub fn update_height(&mut self, index: Idx) {
        let node = &self[index];
        let height = 1 + max(self.height(node.left), self.height(node.right));
        self[index].height = height;
    }

    /// `height(left) - height(right)`.
    pub fn balance_factor(&self, index: Idx) -> i32 {
        let node = &self[index];
        self.height(node.left) as i32 - self.height(node.right) as i32
    }

    /// Points `parent`'s link to `old` (or the root, if `parent` is `None`) at `new` instead.
    pub fn replace_child(&mut self, parent: Link, old: Idx, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let parent = &mut self[parent];
                if parent.left == Some(old) { parent.left = new; } else { parent.right = new; }
            }
        }
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v` in `u`'s parent.
    pub fn transplant(&mut self, u: Idx, v: Link) {
        let parent = self[u].parent;
        self.replace_child(parent, u, v);
        if let Some(v) = v { self[v].parent = parent; }
    }

    pub fn search<C, Q: ?Sized>(&self, cmp: &C, key: &Q) -> Search where C: Compare<Q, K> {
        let mut parent = None;
        let mut link = self.root;
        let mut order = Equal;

        while let Some(index) = link {
            let node = &self[index];
            order = cmp.compare(key, &node.key);

            link = match order {
                Equal => return Search::Found(index),
                Less => node.left,
                Greater => node.right,
            };

            parent = Some(index);
        }

        Search::Vacant(parent, order)
    }
}

/// The outcome of a descent from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Search {
    Found(Idx),
    /// The key is absent. It belongs under the given parent, on the side given by the last
    /// comparison.
    Vacant(Link, Ordering),
}

pub trait Dir: Sized {
    type Opposite: Dir<Opposite=Self>;

    /// The sign of the balance factor of a node leaning toward this side.
    const SIGN: i32;

    fn forward<K, V>(node: &Node<K, V>) -> Link;
    fn forward_mut<K, V>(node: &mut Node<K, V>) -> &mut Link;

    fn extremum<K, V>(nodes: &Nodes<K, V>, mut index: Idx) -> Idx {
        while let Some(child) = Self::forward(&nodes[index]) { index = child; }
        index
    }

    /// The next node in this direction in key order, found through parent links alone.
    fn neighbor<K, V>(nodes: &Nodes<K, V>, mut index: Idx) -> Link {
        if let Some(child) = Self::forward(&nodes[index]) {
            return Some(Self::Opposite::extremum(nodes, child));
        }

        let mut parent = nodes[index].parent;

        while let Some(p) = parent {
            if Self::forward(&nodes[p]) != Some(index) { break; }
            index = p;
            parent = nodes[p].parent;
        }

        parent
    }
}

pub enum Left {}

impl Dir for Left {
    type Opposite = Right;

    const SIGN: i32 = 1;

    fn forward<K, V>(node: &Node<K, V>) -> Link { node.left }
    fn forward_mut<K, V>(node: &mut Node<K, V>) -> &mut Link { &mut node.left }
}

pub enum Right {}

impl Dir for Right {
    type Opposite = Left;

    const SIGN: i32 = -1;

    fn forward<K, V>(node: &Node<K, V>) -> Link { node.right }
    fn forward_mut<K, V>(node: &mut Node<K, V>) -> &mut Link { &mut node.right }
}

pub enum Insertion<V> {
    Replaced(V),
    Added(Idx, Rebalance),
}

pub fn insert<K, V, C>(nodes: &mut Nodes<K, V>, cmp: &C, key: K, value: V) -> Insertion<V>
    where C: Compare<K> {

    match nodes.search(cmp, &key) {
        Search::Found(index) => Insertion::Replaced(mem::replace(&mut nodes[index].value, value)),
        Search::Vacant(parent, order) => {
            let index = nodes.alloc(key, value, parent);

            match parent {
                None => nodes.root = Some(index),
                Some(parent) =>
                    if order == Less {
                        nodes[parent].left = Some(index);
                    } else {
                        nodes[parent].right = Some(index);
                    },
            }

            // a fresh leaf is balanced; the walk starts at its parent
            Insertion::Added(index, balance::insert_rebalance(nodes, parent))
        }
    }
}

/// Unlinks and frees the node, rebalancing on the way back up to the root.
pub fn remove<K, V>(nodes: &mut Nodes<K, V>, index: Idx) -> (K, V, Rebalance) {
    let (left, right, parent) = {
        let node = &nodes[index];
        (node.left, node.right, node.parent)
    };

    let start = match (left, right) {
        (None, _) => { nodes.transplant(index, right); parent }
        (_, None) => { nodes.transplant(index, left); parent }
        (Some(left), Some(right)) => {
            let succ = Left::extremum(nodes, right);

            let start = if nodes[succ].parent == Some(index) {
                Some(succ)
            } else {
                let succ_parent = nodes[succ].parent;
                let succ_right = nodes[succ].right;
                nodes.transplant(succ, succ_right);
                nodes[succ].right = Some(right);
                nodes[right].parent = Some(succ);
                succ_parent
            };

            nodes.transplant(index, Some(succ));
            nodes[succ].left = Some(left);
            nodes[left].parent = Some(succ);

            // the successor takes over the removed node's position, including the height cached
            // for it before the removal, so the walk can tell when the shrinkage stops propagating
            nodes[succ].height = nodes[index].height;
            start
        }
    };

    let rebalance = balance::remove_rebalance(nodes, start);
    let node = nodes.free(index);
    (node.key, node.value, rebalance)
}

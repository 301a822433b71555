//! An ordered map based on an AVL tree.

use compare::{Compare, Natural};
use std::default::Default;
use std::fmt::{self, Debug};
use tracing::trace;
use super::error::Error;
use super::node::{self, Dir, Handle, Idx, Insertion, Left, Nodes, Right, Search};

/// An ordered map based on an AVL tree.
///
/// Search, insertion, removal and stepping to a neighboring entry all take `O(log n)` time: after
/// every insertion or removal the tree is rebalanced so that the heights of any node's two
/// subtrees differ by at most one.
///
/// Entries are reached through [`Handle`](crate::Handle)s, which stay valid until their entry is
/// removed.
///
/// The behavior of this map is undefined if a key's ordering relative to any other key changes
/// while the key is in the map. This is normally only possible through `Cell`, `RefCell`, or
/// unsafe code.
#[derive(Clone)]
pub struct Map<K, V, C = Natural<K>> where C: Compare<K> {
    nodes: Nodes<K, V>,
    len: usize,
    cmp: C,
}

impl<K, V> Map<K, V> where K: Ord {
    /// Creates an empty map ordered according to the natural order of its keys.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    ///
    /// map.insert(2, "b");
    /// map.insert(1, "a");
    /// map.insert(3, "c");
    ///
    /// let first = map.first().unwrap();
    /// assert_eq!(map.get_key_value(first), Ok((&1, &"a")));
    /// ```
    pub fn new() -> Self { Map::with_cmp(compare::natural()) }

    /// Creates an empty map with room for `capacity` entries before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Map { nodes: Nodes::with_capacity(capacity), len: 0, cmp: compare::natural() }
    }
}

impl<K, V, C> Map<K, V, C> where C: Compare<K> {
    /// Creates an empty map ordered according to the given comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use compare::{Compare, natural};
    ///
    /// let mut map = avl_tree::Map::with_cmp(natural().rev());
    ///
    /// map.insert(2, "b");
    /// map.insert(1, "a");
    /// map.insert(3, "c");
    ///
    /// let first = map.first().unwrap();
    /// assert_eq!(map.key(first), Ok(&3));
    /// ```
    pub fn with_cmp(cmp: C) -> Self {
        Map { nodes: Nodes::with_capacity(0), len: 0, cmp: cmp }
    }

    /// Checks if the map is empty.
    pub fn is_empty(&self) -> bool { self.nodes.root.is_none() }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    /// assert_eq!(map.len(), 0);
    ///
    /// map.insert(2, "b");
    /// map.insert(2, "c");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize { self.len }

    /// Returns a reference to the map's comparator.
    pub fn cmp(&self) -> &C { &self.cmp }

    /// Returns the height of the tree: the number of nodes on its longest root-to-leaf path.
    ///
    /// This never exceeds `1.4405 * log2(len + 2)`.
    pub fn height(&self) -> usize { self.nodes.height(self.nodes.root) as usize }

    /// Removes all entries from the map and releases its storage.
    ///
    /// Handles issued before the call are afterwards rejected with
    /// [`Error::ForeignHandle`](crate::Error::ForeignHandle), as if they came from another map.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.len = 0;
    }

    /// Inserts an entry into the map, returning the previous value, if any, associated
    /// with the key.
    ///
    /// If the key is already present, only its value is replaced. The stored key is kept and the
    /// tree is not restructured.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    /// assert_eq!(map.insert(1, "a"), None);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.insert(1, "b"), Some("a"));
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match node::insert(&mut self.nodes, &self.cmp, key, value) {
            Insertion::Replaced(old_value) => Some(old_value),
            Insertion::Added(index, rebalance) => {
                self.len += 1;
                trace!(node = index, len = self.len, fixups = rebalance.fixups,
                       rotations = rebalance.rotations, visited = rebalance.visited, "inserted");
                None
            }
        }
    }

    /// Removes and returns the entry whose key is equal to the given key, returning
    /// `None` if the map does not contain the key.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    ///
    /// map.insert(2, "b");
    /// map.insert(1, "a");
    ///
    /// assert_eq!(map.remove(&1), Some((1, "a")));
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.remove(&1), None);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<(K, V)> where C: Compare<Q, K> {
        match self.nodes.search(&self.cmp, key) {
            Search::Found(index) => Some(self.remove_index(index)),
            Search::Vacant(..) => None,
        }
    }

    /// Removes and returns the entry the handle refers to.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    /// map.insert(1, "a");
    ///
    /// let handle = map.search(&1).unwrap();
    /// assert_eq!(map.remove_handle(handle), Ok((1, "a")));
    /// assert_eq!(map.remove_handle(handle), Err(avl_tree::Error::StaleHandle));
    /// ```
    pub fn remove_handle(&mut self, handle: Handle) -> Result<(K, V), Error> {
        let index = self.nodes.resolve(handle)?;
        Ok(self.remove_index(index))
    }

    fn remove_index(&mut self, index: Idx) -> (K, V) {
        let (key, value, rebalance) = node::remove(&mut self.nodes, index);
        self.len -= 1;
        trace!(node = index, len = self.len, fixups = rebalance.fixups,
               rotations = rebalance.rotations, visited = rebalance.visited, "removed");
        (key, value)
    }

    /// Returns a handle to the entry whose key is equal to the given key, or `None` if the map
    /// does not contain the key.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    /// map.insert(1, "a");
    ///
    /// let handle = map.search(&1).unwrap();
    /// assert_eq!(map.value(handle), Ok(&"a"));
    /// assert!(map.search(&2).is_none());
    /// ```
    pub fn search<Q: ?Sized>(&self, key: &Q) -> Option<Handle> where C: Compare<Q, K> {
        match self.nodes.search(&self.cmp, key) {
            Search::Found(index) => Some(self.nodes.handle(index)),
            Search::Vacant(..) => None,
        }
    }

    /// Checks if the map contains the given key.
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool where C: Compare<Q, K> {
        self.search(key).is_some()
    }

    /// Returns a reference to the value associated with the given key, or `None` if the
    /// map does not contain the key.
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V> where C: Compare<Q, K> {
        match self.nodes.search(&self.cmp, key) {
            Search::Found(index) => Some(&self.nodes[index].value),
            Search::Vacant(..) => None,
        }
    }

    /// Returns a mutable reference to the value associated with the given key, or `None`
    /// if the map does not contain the key.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    /// map.insert(1, "a");
    ///
    /// if let Some(value) = map.get_mut(&1) { *value = "b"; }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V> where C: Compare<Q, K> {
        match self.nodes.search(&self.cmp, key) {
            Search::Found(index) => Some(&mut self.nodes[index].value),
            Search::Vacant(..) => None,
        }
    }

    /// Returns a handle to the entry with the minimum key, or `None` if the map is empty.
    pub fn first(&self) -> Option<Handle> {
        self.nodes.root.map(|root| self.nodes.handle(Left::extremum(&self.nodes, root)))
    }

    /// Returns a handle to the entry with the maximum key, or `None` if the map is empty.
    pub fn last(&self) -> Option<Handle> {
        self.nodes.root.map(|root| self.nodes.handle(Right::extremum(&self.nodes, root)))
    }

    /// Returns a handle to the entry following the given one in key order, or `None` if the
    /// handle refers to the entry with the maximum key.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut map = avl_tree::Map::new();
    /// map.insert(1, "a");
    /// map.insert(3, "c");
    ///
    /// let first = map.first().unwrap();
    /// let next = map.successor(first).unwrap().unwrap();
    /// assert_eq!(map.key(next), Ok(&3));
    /// assert_eq!(map.successor(next), Ok(None));
    /// ```
    pub fn successor(&self, handle: Handle) -> Result<Option<Handle>, Error> {
        let index = self.nodes.resolve(handle)?;
        Ok(Right::neighbor(&self.nodes, index).map(|index| self.nodes.handle(index)))
    }

    /// Returns a handle to the entry preceding the given one in key order, or `None` if the
    /// handle refers to the entry with the minimum key.
    pub fn predecessor(&self, handle: Handle) -> Result<Option<Handle>, Error> {
        let index = self.nodes.resolve(handle)?;
        Ok(Left::neighbor(&self.nodes, index).map(|index| self.nodes.handle(index)))
    }

    /// Returns the key of the entry the handle refers to.
    pub fn key(&self, handle: Handle) -> Result<&K, Error> {
        let index = self.nodes.resolve(handle)?;
        Ok(&self.nodes[index].key)
    }

    /// Returns a reference to the value of the entry the handle refers to.
    pub fn value(&self, handle: Handle) -> Result<&V, Error> {
        let index = self.nodes.resolve(handle)?;
        Ok(&self.nodes[index].value)
    }

    /// Returns a mutable reference to the value of the entry the handle refers to.
    pub fn value_mut(&mut self, handle: Handle) -> Result<&mut V, Error> {
        let index = self.nodes.resolve(handle)?;
        Ok(&mut self.nodes[index].value)
    }

    /// Returns the key and value of the entry the handle refers to.
    pub fn get_key_value(&self, handle: Handle) -> Result<(&K, &V), Error> {
        let index = self.nodes.resolve(handle)?;
        let node = &self.nodes[index];
        Ok((&node.key, &node.value))
    }

    pub(crate) fn for_each<F>(&self, mut f: F) where F: FnMut(&K, &V) {
        let mut link = self.nodes.root.map(|root| Left::extremum(&self.nodes, root));

        while let Some(index) = link {
            let node = &self.nodes[index];
            f(&node.key, &node.value);
            link = Right::neighbor(&self.nodes, index);
        }
    }
}

impl<K, V, C> Debug for Map<K, V, C> where K: Debug, V: Debug, C: Compare<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        self.for_each(|key, value| { map.entry(key, value); });
        map.finish()
    }
}

impl<K, V, C> Default for Map<K, V, C> where C: Compare<K> + Default {
    fn default() -> Self { Map::with_cmp(Default::default()) }
}

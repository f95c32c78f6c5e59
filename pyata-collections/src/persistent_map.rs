//! A HAMT-style persistent map: O(log₃₂ n) get/insert with structural
//! sharing between versions, plus a transient "mutation" builder that
//! batches several updates before producing a new persistent root.
//!
//! This is `spec.md` §4.1's "Persistent Map" component: the substrate every
//! [`crate::cons`] chain and every `Context` facet (in `pyata-ir`) is built
//! from. The teacher workspace (`chalk-ir`/`chalk-solve`) does not carry an
//! equivalent data structure of its own — it leans on `salsa` for
//! memoization instead — so this module is grounded directly on the
//! original Python implementation's `immutables.Map` (`HAMT`, from the
//! `immutables` PyPI package wrapped by `pyata/immutables/__init__.py`) as
//! described in `spec.md` §4.1, rather than adapted from teacher source.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

const BITS: u32 = 5;
const ARITY: u32 = 1 << BITS;
const MASK: u64 = (ARITY - 1) as u64;
const MAX_SHIFT: u32 = 64;

fn hash_of<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

enum Node<K, V> {
    Empty,
    Leaf {
        hash: u64,
        entries: Rc<Vec<(K, V)>>,
    },
    Branch {
        bitmap: u32,
        children: Rc<Vec<Node<K, V>>>,
    },
}

impl<K, V> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        match self {
            Node::Empty => Node::Empty,
            Node::Leaf { hash, entries } => Node::Leaf {
                hash: *hash,
                entries: Rc::clone(entries),
            },
            Node::Branch { bitmap, children } => Node::Branch {
                bitmap: *bitmap,
                children: Rc::clone(children),
            },
        }
    }
}

fn chunk(hash: u64, shift: u32) -> u32 {
    if shift >= MAX_SHIFT {
        0
    } else {
        ((hash >> shift) & MASK) as u32
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Node<K, V> {
    fn get(&self, key: &K, hash: u64, shift: u32) -> Option<&V> {
        match self {
            Node::Empty => None,
            Node::Leaf {
                hash: lhash,
                entries,
            } => {
                if *lhash != hash {
                    return None;
                }
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            Node::Branch { bitmap, children } => {
                let idx = chunk(hash, shift);
                let bit = 1u32 << idx;
                if bitmap & bit == 0 {
                    return None;
                }
                let compact = (bitmap & (bit - 1)).count_ones() as usize;
                children[compact].get(key, hash, shift + BITS)
            }
        }
    }

    /// Inserts `key -> val`, returning the new node and whether the key was
    /// previously absent (used to maintain `PersistentMap::len`).
    fn insert(&self, key: K, val: V, hash: u64, shift: u32) -> (Node<K, V>, bool) {
        match self {
            Node::Empty => (
                Node::Leaf {
                    hash,
                    entries: Rc::new(vec![(key, val)]),
                },
                true,
            ),
            Node::Leaf {
                hash: lhash,
                entries,
            } => {
                if *lhash == hash || shift >= MAX_SHIFT {
                    if let Some(pos) = entries.iter().position(|(k, _)| k == &key) {
                        let mut new_entries = (**entries).clone();
                        new_entries[pos] = (key, val);
                        (
                            Node::Leaf {
                                hash: *lhash,
                                entries: Rc::new(new_entries),
                            },
                            false,
                        )
                    } else {
                        let mut new_entries = (**entries).clone();
                        new_entries.push((key, val));
                        (
                            Node::Leaf {
                                hash: *lhash,
                                entries: Rc::new(new_entries),
                            },
                            true,
                        )
                    }
                } else {
                    let singleton = Self::singleton_branch(*lhash, shift, Rc::clone(entries));
                    singleton.insert(key, val, hash, shift)
                }
            }
            Node::Branch { bitmap, children } => {
                let idx = chunk(hash, shift);
                let bit = 1u32 << idx;
                if bitmap & bit != 0 {
                    let compact = (bitmap & (bit - 1)).count_ones() as usize;
                    let (new_child, is_new) =
                        children[compact].insert(key, val, hash, shift + BITS);
                    let mut new_children = (**children).clone();
                    new_children[compact] = new_child;
                    (
                        Node::Branch {
                            bitmap: *bitmap,
                            children: Rc::new(new_children),
                        },
                        is_new,
                    )
                } else {
                    let compact = (bitmap & (bit - 1)).count_ones() as usize;
                    let mut new_children = (**children).clone();
                    new_children.insert(
                        compact,
                        Node::Leaf {
                            hash,
                            entries: Rc::new(vec![(key, val)]),
                        },
                    );
                    (
                        Node::Branch {
                            bitmap: bitmap | bit,
                            children: Rc::new(new_children),
                        },
                        true,
                    )
                }
            }
        }
    }

    fn singleton_branch(hash: u64, shift: u32, entries: Rc<Vec<(K, V)>>) -> Node<K, V> {
        let idx = chunk(hash, shift);
        let bit = 1u32 << idx;
        Node::Branch {
            bitmap: bit,
            children: Rc::new(vec![Node::Leaf { hash, entries }]),
        }
    }

    fn remove(&self, key: &K, hash: u64, shift: u32) -> (Node<K, V>, bool) {
        match self {
            Node::Empty => (Node::Empty, false),
            Node::Leaf {
                hash: lhash,
                entries,
            } => {
                if *lhash != hash {
                    return (self.clone(), false);
                }
                match entries.iter().position(|(k, _)| k == key) {
                    None => (self.clone(), false),
                    Some(pos) => {
                        if entries.len() == 1 {
                            (Node::Empty, true)
                        } else {
                            let mut new_entries = (**entries).clone();
                            new_entries.remove(pos);
                            (
                                Node::Leaf {
                                    hash: *lhash,
                                    entries: Rc::new(new_entries),
                                },
                                true,
                            )
                        }
                    }
                }
            }
            Node::Branch { bitmap, children } => {
                let idx = chunk(hash, shift);
                let bit = 1u32 << idx;
                if bitmap & bit == 0 {
                    return (self.clone(), false);
                }
                let compact = (bitmap & (bit - 1)).count_ones() as usize;
                let (new_child, removed) = children[compact].remove(key, hash, shift + BITS);
                if !removed {
                    return (self.clone(), false);
                }
                let mut new_children = (**children).clone();
                match new_child {
                    Node::Empty => {
                        new_children.remove(compact);
                        let new_bitmap = bitmap & !bit;
                        if new_children.is_empty() {
                            (Node::Empty, true)
                        } else {
                            (
                                Node::Branch {
                                    bitmap: new_bitmap,
                                    children: Rc::new(new_children),
                                },
                                true,
                            )
                        }
                    }
                    other => {
                        new_children[compact] = other;
                        (
                            Node::Branch {
                                bitmap: *bitmap,
                                children: Rc::new(new_children),
                            },
                            true,
                        )
                    }
                }
            }
        }
    }

    fn for_each<'a>(&'a self, f: &mut dyn FnMut(&'a K, &'a V)) {
        match self {
            Node::Empty => {}
            Node::Leaf { entries, .. } => {
                for (k, v) in entries.iter() {
                    f(k, v);
                }
            }
            Node::Branch { children, .. } => {
                for child in children.iter() {
                    child.for_each(f);
                }
            }
        }
    }
}

/// An immutable, structurally-shared map. Cloning a [`PersistentMap`] is
/// `O(1)`; every mutating operation returns a new map that shares all
/// unaffected structure with the original.
pub struct PersistentMap<K, V> {
    root: Node<K, V>,
    len: usize,
}

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        PersistentMap {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        PersistentMap {
            root: Node::Empty,
            len: 0,
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> PersistentMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.get(key, hash_of(key), 0)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns a clone of the value for `key`, or `default` if absent.
    pub fn get_or(&self, key: &K, default: V) -> V {
        self.get(key).cloned().unwrap_or(default)
    }

    #[must_use]
    pub fn insert(&self, key: K, val: V) -> PersistentMap<K, V> {
        let hash = hash_of(&key);
        let (root, is_new) = self.root.insert(key, val, hash, 0);
        PersistentMap {
            root,
            len: self.len + if is_new { 1 } else { 0 },
        }
    }

    /// Alias for [`insert`](Self::insert) matching the `Facet::set` naming
    /// used throughout `pyata-ir`.
    #[must_use]
    pub fn set(&self, key: K, val: V) -> PersistentMap<K, V> {
        self.insert(key, val)
    }

    #[must_use]
    pub fn remove(&self, key: &K) -> PersistentMap<K, V> {
        let hash = hash_of(key);
        let (root, removed) = self.root.remove(key, hash, 0);
        PersistentMap {
            root,
            len: self.len - if removed { 1 } else { 0 },
        }
    }

    #[must_use]
    pub fn update<I: IntoIterator<Item = (K, V)>>(&self, pairs: I) -> PersistentMap<K, V> {
        let mut mutation = self.mutate();
        for (k, v) in pairs {
            mutation.insert(k, v);
        }
        mutation.finish()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut out = Vec::with_capacity(self.len);
        self.root.for_each(&mut |k, v| out.push((k, v)));
        out.into_iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Opens a transient builder seeded with this map's contents. Several
    /// `insert`/`remove` calls against the builder are batched and replayed
    /// against a working copy; [`MapMutation::finish`] hands back a single
    /// new persistent map, mirroring `Facets.py`'s
    /// `with cls.get_whole(ctx).mutate() as mutable: ...; mutable.finish()`.
    pub fn mutate(&self) -> MapMutation<K, V> {
        MapMutation {
            current: self.clone(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> FromIterator<(K, V)> for PersistentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PersistentMap::new().update(iter)
    }
}

impl<K: fmt::Debug + Eq + Hash + Clone, V: fmt::Debug + Clone> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// A batched-mutation builder over a [`PersistentMap`]. See
/// [`PersistentMap::mutate`].
pub struct MapMutation<K, V> {
    current: PersistentMap<K, V>,
}

impl<K: Eq + Hash + Clone, V: Clone> MapMutation<K, V> {
    pub fn insert(&mut self, key: K, val: V) -> &mut Self {
        self.current = self.current.insert(key, val);
        self
    }

    pub fn remove(&mut self, key: &K) -> &mut Self {
        self.current = self.current.remove(key);
        self
    }

    pub fn update<I: IntoIterator<Item = (K, V)>>(&mut self, pairs: I) -> &mut Self {
        for (k, v) in pairs {
            self.insert(k, v);
        }
        self
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.current.get(key)
    }

    #[must_use]
    pub fn finish(self) -> PersistentMap<K, V> {
        self.current
    }
}

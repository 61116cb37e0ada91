//! Disjoint-set over arbitrary ids that can list every member of a component.
//!
//! The structure is the usual union by rank with path halving, plus one
//! extra edge set per entry: the entries whose parent currently points at it.
//! Those reverse edges are kept in step with every parent change, so the
//! members of a component can be collected by walking down from its root
//! instead of scanning all entries.
//!
//! Entries are created by [`UnionFind::union`] only. Queries about ids that
//! were never unioned treat them as singletons and leave the structure alone.
//!
//! ```
//! use dysni_unionfind::UnionFind;
//!
//! let mut uf = UnionFind::new();
//! uf.union(1, 2);
//! uf.union(3, 4);
//! uf.union(2, 4);
//! assert_eq!(uf.count(), 1);
//!
//! let mut others: Vec<_> = uf.get_component(&1).into_iter().collect();
//! others.sort();
//! assert_eq!(others, vec![2, 3, 4]);
//! ```

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Entry<T> {
    elem: T,
    parent: usize,
    rank: u8,
    children: HashSet<usize>,
}

/// Disjoint-set with reverse child edges.
#[derive(Debug, Clone)]
pub struct UnionFind<T> {
    index: HashMap<T, usize>,
    entries: Vec<Entry<T>>,
    components: usize,
}

impl<T> Default for UnionFind<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
            components: 0,
        }
    }
}

impl<T: Eq + Hash + Clone> UnionFind<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct components among the ids seen by `union`.
    pub fn count(&self) -> usize {
        self.components
    }

    /// Number of ids that have taken part in a union.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `p` has been registered by a union.
    pub fn contains(&self, p: &T) -> bool {
        self.index.contains_key(p)
    }

    /// One representative per component.
    pub fn roots(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, e)| e.parent == *i)
            .map(|(_, e)| &e.elem)
    }

    /// Representative of the component holding `p`.
    ///
    /// An unseen id is its own representative; it is not registered.
    pub fn find(&mut self, p: &T) -> T {
        match self.index.get(p) {
            Some(&i) => {
                let root = self.find_index(i);
                self.entries[root].elem.clone()
            }
            None => p.clone(),
        }
    }

    /// Whether `p` and `q` are in the same component. Always true for `p == q`.
    pub fn connected(&mut self, p: &T, q: &T) -> bool {
        if p == q {
            return true;
        }
        match (self.index.get(p).copied(), self.index.get(q).copied()) {
            (Some(i), Some(j)) => self.find_index(i) == self.find_index(j),
            _ => false,
        }
    }

    /// Merges the components of `p` and `q`, registering either id if unseen.
    ///
    /// Returns `false` when both were already connected. On equal ranks the
    /// root of `q` goes under the root of `p`.
    pub fn union(&mut self, p: T, q: T) -> bool {
        let i = self.register(p);
        let j = self.register(q);
        let ri = self.find_index(i);
        let rj = self.find_index(j);
        if ri == rj {
            return false;
        }

        let (top, below) = if self.entries[ri].rank < self.entries[rj].rank {
            (rj, ri)
        } else {
            (ri, rj)
        };
        if self.entries[top].rank == self.entries[below].rank {
            self.entries[top].rank += 1;
        }
        self.reparent(below, top);
        self.components -= 1;
        true
    }

    /// Every other member of the component holding `p`, excluding `p`.
    ///
    /// Empty for an id that was never unioned.
    pub fn get_component(&mut self, p: &T) -> HashSet<T> {
        let Some(&start) = self.index.get(p) else {
            return HashSet::new();
        };
        let root = self.find_index(start);

        let mut members = HashSet::new();
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let entry = &self.entries[i];
            if i != start {
                members.insert(entry.elem.clone());
            }
            stack.extend(entry.children.iter().copied());
        }
        members
    }

    fn register(&mut self, p: T) -> usize {
        if let Some(&i) = self.index.get(&p) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push(Entry {
            elem: p.clone(),
            parent: i,
            rank: 0,
            children: HashSet::new(),
        });
        self.index.insert(p, i);
        self.components += 1;
        i
    }

    fn find_index(&mut self, mut i: usize) -> usize {
        loop {
            let parent = self.entries[i].parent;
            if parent == i {
                return i;
            }
            let grandparent = self.entries[parent].parent;
            if grandparent != parent {
                self.reparent(i, grandparent);
            }
            i = grandparent;
        }
    }

    /// Points `child` at `parent` and moves its reverse edge along.
    fn reparent(&mut self, child: usize, parent: usize) {
        let old = self.entries[child].parent;
        if old != child {
            self.entries[old].children.remove(&child);
        }
        self.entries[child].parent = parent;
        self.entries[parent].children.insert(child);
    }
}

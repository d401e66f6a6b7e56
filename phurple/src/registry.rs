//! Identity-mapping registry for externally owned handles.
//!
//! Engine handles (buddies, groups, accounts) carry no identity a caller can
//! hold on to: the engine may hand out a fresh wrapper for the same
//! underlying object on every lookup. [`HandleRegistry`] assigns each handle
//! a stable [`Index`] the first time it is seen and resolves indices back to
//! handles on demand.
//!
//! Indices come from a monotonic counter starting at `0` and are never
//! reissued, even after [`remove`](HandleRegistry::remove). The registry
//! never frees or otherwise touches the handles it stores.

use std::collections::BTreeMap;
use std::fmt;

/// Caller-visible identifier standing in for an engine handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Index(u64);

impl Index {
    /// Wrap a raw index value, e.g. one received back from a caller.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Index {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Index> for u64 {
    fn from(index: Index) -> Self {
        index.0
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Maps stable [`Index`] values to opaque handles.
///
/// `H: PartialEq` is the identity relation used by
/// [`find_index`](Self::find_index); engine handles should compare by
/// pointer identity, not by content.
///
/// Not synchronized. Keep a registry on the thread that drives the engine,
/// or put it behind a single `Mutex`.
#[derive(Clone)]
pub struct HandleRegistry<H> {
    entries: BTreeMap<u64, H>,
    next: u64,
}

impl<H> Default for HandleRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for HandleRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("len", &self.entries.len())
            .field("next", &self.next)
            .finish()
    }
}

impl<H> HandleRegistry<H> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 0,
        }
    }

    /// Store `handle` under the next unused index.
    ///
    /// Does not check for an existing entry; use
    /// [`find_or_register`](Self::find_or_register) unless the handle is
    /// known to be new.
    ///
    /// # Panics
    ///
    /// Panics if the `u64` index space is exhausted.
    pub fn register(&mut self, handle: H) -> Index {
        let index = self.next;
        self.next = index
            .checked_add(1)
            .expect("handle registry index space exhausted");
        self.entries.insert(index, handle);
        tracing::trace!(index, "registered handle");
        Index(index)
    }

    /// Look up the handle stored under `index`.
    #[must_use]
    pub fn resolve(&self, index: Index) -> Option<&H> {
        self.entries.get(&index.0)
    }

    /// Delete the entry for `index` and return its handle.
    ///
    /// The index is retired: later registrations never reuse it.
    pub fn remove(&mut self, index: Index) -> Option<H> {
        let removed = self.entries.remove(&index.0);
        if removed.is_some() {
            tracing::trace!(index = index.0, "removed handle");
        }
        removed
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over live entries in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, &H)> {
        self.entries.iter().map(|(&i, h)| (Index(i), h))
    }

    /// Drop every entry. The counter is kept, so old indices stay retired.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<H: PartialEq> HandleRegistry<H> {
    /// Find the index under which `handle` is stored.
    ///
    /// Scans entries in increasing index order and returns the first match.
    #[must_use]
    pub fn find_index(&self, handle: &H) -> Option<Index> {
        self.entries
            .iter()
            .find(|(_, stored)| *stored == handle)
            .map(|(&i, _)| Index(i))
    }

    /// Return the existing index for `handle`, registering it on a miss.
    ///
    /// # Panics
    ///
    /// Panics if the `u64` index space is exhausted.
    pub fn find_or_register(&mut self, handle: H) -> Index {
        match self.find_index(&handle) {
            Some(index) => index,
            None => self.register(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    /// Stand-in for an engine handle that compares by pointer identity.
    #[derive(Debug, Clone)]
    struct Ptr(Rc<&'static str>);

    impl PartialEq for Ptr {
        fn eq(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.0, &other.0)
        }
    }

    fn ptr(name: &'static str) -> Ptr {
        Ptr(Rc::new(name))
    }

    #[test]
    fn unseen_handle_is_not_found() {
        let reg: HandleRegistry<Ptr> = HandleRegistry::new();
        assert_eq!(reg.find_index(&ptr("alice")), None);
        assert!(reg.resolve(Index::new(0)).is_none());
    }

    #[test]
    fn register_then_find_and_resolve() {
        let mut reg = HandleRegistry::new();
        let alice = ptr("alice");
        let i = reg.register(alice.clone());
        assert_eq!(reg.find_index(&alice), Some(i));
        assert_eq!(reg.resolve(i), Some(&alice));
    }

    #[test]
    fn identity_not_content_decides_equality() {
        let mut reg = HandleRegistry::new();
        let a = ptr("bob");
        let b = ptr("bob");
        let i = reg.register(a);
        assert_eq!(reg.find_index(&b), None);
        assert_ne!(reg.find_or_register(b), i);
    }

    #[test]
    fn find_or_register_never_duplicates() {
        let mut reg = HandleRegistry::new();
        let carol = ptr("carol");
        let first = reg.find_or_register(carol.clone());
        for _ in 0..5 {
            assert_eq!(reg.find_or_register(carol.clone()), first);
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn removed_index_is_never_reissued() {
        let mut reg = HandleRegistry::new();
        let a = reg.register(ptr("a"));
        let b = reg.register(ptr("b"));
        assert!(reg.remove(b).is_some());
        assert!(reg.resolve(b).is_none());
        assert!(reg.remove(b).is_none());

        let c = reg.register(ptr("c"));
        assert!(c > b);
        assert!(c > a);
    }

    #[test]
    fn clear_keeps_counter() {
        let mut reg = HandleRegistry::new();
        let a = reg.register(ptr("a"));
        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.register(ptr("b")) > a);
    }

    #[test]
    fn iter_is_ordered_by_index() {
        let mut reg = HandleRegistry::new();
        for name in ["x", "y", "z"] {
            reg.register(ptr(name));
        }
        reg.remove(Index::new(1));
        let seen: Vec<u64> = reg.iter().map(|(i, _)| i.get()).collect();
        assert_eq!(seen, [0, 2]);
    }

    #[test]
    fn first_index_is_zero() {
        let mut reg = HandleRegistry::new();
        assert_eq!(reg.register(ptr("first")), Index::new(0));
    }

    mod prop {
        use proptest::prelude::*;

        use super::super::*;

        #[derive(Debug, Clone)]
        enum Op {
            Register,
            Remove(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Register), (0usize..32).prop_map(Op::Remove)]
        }

        proptest! {
            #[test]
            fn indices_strictly_increase(ops in proptest::collection::vec(op(), 0..64)) {
                let mut reg = HandleRegistry::new();
                let mut issued: Vec<Index> = Vec::new();
                for (n, op) in ops.into_iter().enumerate() {
                    match op {
                        Op::Register => {
                            let i = reg.register(n);
                            if let Some(last) = issued.last() {
                                prop_assert!(i > *last);
                            }
                            issued.push(i);
                        }
                        Op::Remove(k) => {
                            if let Some(&i) = issued.get(k) {
                                reg.remove(i);
                                prop_assert!(reg.resolve(i).is_none());
                            }
                        }
                    }
                }
            }
        }
    }
}

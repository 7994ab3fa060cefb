use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;
use rand::Rng;

/// A keyed container with O(1) insert, remove and uniform random pick.
///
/// Live keys are kept in a dense vector so a random index selects a random
/// entry. Removal swaps the victim with the last slot and truncates, so the
/// order of the dense vector changes on every removal: callers must not rely
/// on any iteration order.
///
/// All operations take `&self`; state sits behind a `parking_lot::RwLock`
/// (shared for reads, exclusive for mutation and pops) so a set can be
/// shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct RandomEvictionSet<K, V> {
    inner: RwLock<Inner<K, V>>,
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    keys: Vec<K>,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    /// Position of the key inside `Inner::keys`.
    slot: usize,
}

impl<K, V> Default for RandomEvictionSet<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RandomEvictionSet<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::with_capacity(capacity),
                keys: Vec::with_capacity(capacity),
            }),
        }
    }

    /// Inserts `value` under `key`.
    ///
    /// An existing key keeps its slot and has its value overwritten; the
    /// previous value is returned, as with `HashMap::insert`.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.entries.get_mut(&key) {
            return Some(std::mem::replace(&mut entry.value, value));
        }
        let slot = inner.keys.len();
        inner.keys.push(key.clone());
        inner.entries.insert(key, Entry { value, slot });
        None
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().entries.get(key).map(|e| e.value.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Returns a uniformly chosen entry without removing it.
    pub fn random_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(K, V)> {
        let inner = self.inner.read();
        if inner.keys.is_empty() {
            return None;
        }
        let key = &inner.keys[rng.gen_range(0..inner.keys.len())];
        inner
            .entries
            .get(key)
            .map(|entry| (key.clone(), entry.value.clone()))
    }

    /// Picks a uniformly random entry and removes it under one exclusive lock.
    pub fn pop_random_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(K, V)> {
        let mut inner = self.inner.write();
        if inner.keys.is_empty() {
            return None;
        }
        let key = inner.keys[rng.gen_range(0..inner.keys.len())].clone();
        inner.remove(&key).map(|value| (key, value))
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the dense-vector/reverse-index invariants. Used by tests.
    pub fn is_consistent(&self) -> bool {
        let inner = self.inner.read();
        inner.keys.len() == inner.entries.len()
            && inner
                .keys
                .iter()
                .enumerate()
                .all(|(i, k)| inner.entries.get(k).map(|e| e.slot) == Some(i))
    }
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn remove(&mut self, key: &K) -> Option<V> {
        let Entry { value, slot } = self.entries.remove(key)?;
        self.keys.swap_remove(slot);
        // The former last key now lives in `slot` (unless the victim was last).
        if let Some(moved) = self.keys.get(slot) {
            if let Some(entry) = self.entries.get_mut(moved) {
                entry.slot = slot;
            }
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn empty_set_yields_nothing() {
        let set: RandomEvictionSet<u32, u32> = RandomEvictionSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(set.random_uniform(&mut rng).is_none());
        assert!(set.pop_random_uniform(&mut rng).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn insert_overwrites_without_duplicating() {
        let set = RandomEvictionSet::new();
        assert_eq!(set.insert(7, "a"), None);
        assert_eq!(set.insert(7, "b"), Some("a"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&7), Some("b"));
        assert!(set.is_consistent());
    }

    #[test]
    fn remove_last_and_middle_keep_index() {
        let set = RandomEvictionSet::new();
        for k in 0..5 {
            set.insert(k, k * 10);
        }
        assert_eq!(set.remove(&4), Some(40));
        assert_eq!(set.remove(&1), Some(10));
        assert_eq!(set.remove(&1), None);
        assert_eq!(set.len(), 3);
        assert!(set.is_consistent());
        assert_eq!(set.get(&1), None);
    }

    #[test]
    fn pop_drains_every_key_once() {
        let set = RandomEvictionSet::new();
        for k in 0..100u32 {
            set.insert(k, ());
        }
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut seen = HashSet::new();
        while let Some((k, _)) = set.pop_random_uniform(&mut rng) {
            assert!(seen.insert(k));
            assert!(set.is_consistent());
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn random_pick_reaches_every_entry() {
        let set = RandomEvictionSet::new();
        for k in 0..4u8 {
            set.insert(k, ());
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hits = [0usize; 4];
        for _ in 0..4000 {
            let (k, _) = set.random_uniform(&mut rng).unwrap();
            hits[k as usize] += 1;
        }
        // Expected 1000 each; a generous band catches a biased index.
        assert!(hits.iter().all(|&h| (850..1150).contains(&h)), "{hits:?}");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8),
        Remove(u8),
        Pick,
        Pop,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Insert),
            any::<u8>().prop_map(Op::Remove),
            Just(Op::Pick),
            Just(Op::Pop),
        ]
    }

    proptest! {
        #[test]
        fn matches_reference_set(ops in prop::collection::vec(arb_op(), 0..200), seed in any::<u64>()) {
            let set = RandomEvictionSet::new();
            let mut model = HashSet::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            for op in ops {
                match op {
                    Op::Insert(k) => { set.insert(k, u32::from(k)); model.insert(k); }
                    Op::Remove(k) => {
                        set.remove(&k);
                        model.remove(&k);
                        prop_assert!(set.get(&k).is_none());
                    }
                    Op::Pick => match set.random_uniform(&mut rng) {
                        Some((k, v)) => {
                            prop_assert!(model.contains(&k));
                            prop_assert_eq!(v, u32::from(k));
                        }
                        None => prop_assert!(model.is_empty()),
                    },
                    Op::Pop => match set.pop_random_uniform(&mut rng) {
                        Some((k, _)) => prop_assert!(model.remove(&k)),
                        None => prop_assert!(model.is_empty()),
                    },
                }
                prop_assert_eq!(set.len(), model.len());
                prop_assert!(set.is_consistent());
            }
        }
    }
}

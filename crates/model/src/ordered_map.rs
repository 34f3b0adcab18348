//! Insertion-ordered keyed collection.
//!
//! Backs both the question set of a questionnaire (iteration order is
//! question order) and the answer set of a session (iteration order is
//! answer order). Entries live in a `Vec` with a key -> position side
//! table, both behind a single mutex so point reads and writes are safe
//! from multiple threads.
//!
//! Overwriting an existing key keeps the entry at its original position.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

struct Inner<V> {
    entries: Vec<(String, V)>,
    positions: HashMap<String, usize>,
}

impl<V> Inner<V> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, (key, _)) in self.entries.iter().enumerate().skip(start) {
            self.positions.insert(key.clone(), i);
        }
    }
}

pub struct OrderedMap<V> {
    inner: Mutex<Inner<V>>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // Recover data even if mutex was poisoned by a panic in another thread
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert `value` under `key`. An existing key is overwritten in place.
    pub fn add(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.lock();
        match inner.positions.get(&key).copied() {
            Some(pos) => inner.entries[pos].1 = value,
            None => {
                let pos = inner.entries.len();
                inner.positions.insert(key.clone(), pos);
                inner.entries.push((key, value));
            }
        }
    }

    /// Remove `key`, returning its value. Later entries shift down by one.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let pos = inner.positions.remove(key)?;
        let (_, value) = inner.entries.remove(pos);
        inner.reindex_from(pos);
        Some(value)
    }

    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().positions.contains_key(key)
    }

    /// Ordinal position of `key`, if present.
    pub fn index(&self, key: &str) -> Option<usize> {
        self.lock().positions.get(key).copied()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<V: Clone> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        let inner = self.lock();
        let pos = *inner.positions.get(key)?;
        Some(inner.entries[pos].1.clone())
    }

    pub fn get_by_index(&self, index: usize) -> Option<V> {
        self.lock().entries.get(index).map(|(_, v)| v.clone())
    }

    pub fn first(&self) -> Option<(String, V)> {
        self.lock().entries.first().cloned()
    }

    pub fn last(&self) -> Option<(String, V)> {
        self.lock().entries.last().cloned()
    }

    pub fn values(&self) -> Vec<V> {
        self.lock().entries.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Copy of every entry, in insertion order.
    pub fn entries(&self) -> Vec<(String, V)> {
        self.lock().entries.clone()
    }

    /// Apply `f` to the value under `key` in place. Returns false when the
    /// key is absent.
    pub fn update(&self, key: &str, f: impl FnOnce(&mut V)) -> bool {
        let mut inner = self.lock();
        match inner.positions.get(key).copied() {
            Some(pos) => {
                f(&mut inner.entries[pos].1);
                true
            }
            None => false,
        }
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for OrderedMap<V> {
    fn clone(&self) -> Self {
        let inner = self.lock();
        Self {
            inner: Mutex::new(Inner {
                entries: inner.entries.clone(),
                positions: inner.positions.clone(),
            }),
        }
    }
}

impl<V: PartialEq + Clone> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        // Never hold both locks: `a == b` racing `b == a` would deadlock.
        let mine = self.lock().entries.clone();
        mine == other.lock().entries
    }
}

impl<V: fmt::Debug> fmt::Debug for OrderedMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_map()
            .entries(inner.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = OrderedMap::new();
        for (k, v) in iter {
            map.add(k, v);
        }
        map
    }
}

// ──────────────────────────────────────────────
// Serde: a JSON object in insertion order
// ──────────────────────────────────────────────

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let inner = self.lock();
        let mut map = serializer.serialize_map(Some(inner.entries.len()))?;
        for (k, v) in &inner.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with string keys")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.add(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

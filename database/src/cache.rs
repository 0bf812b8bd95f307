use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

/// Bounded read cache shared by a store and the staging shards it creates.
/// When full, an arbitrary entry is evicted.
pub struct Cache<K, V> {
    capacity: usize,
    map: RwLock<HashMap<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> Cache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, map: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut map = self.map.write();
        Self::insert_locked(&mut map, self.capacity, key, value);
    }

    pub fn insert_many(&self, entries: impl IntoIterator<Item = (K, V)>) {
        if self.capacity == 0 {
            return;
        }
        let mut map = self.map.write();
        for (key, value) in entries {
            Self::insert_locked(&mut map, self.capacity, key, value);
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.map.write().remove(key)
    }

    pub fn remove_many<'a>(&self, keys: impl IntoIterator<Item = &'a K>)
    where
        K: 'a,
    {
        let mut map = self.map.write();
        for key in keys {
            map.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_locked(map: &mut HashMap<K, V>, capacity: usize, key: K, value: V) {
        if map.len() >= capacity && !map.contains_key(&key) {
            if let Some(evicted) = map.keys().next().cloned() {
                map.remove(&evicted);
            }
        }
        map.insert(key, value);
    }
}

//! A small map from folder name to child node.
//!
//! Folders rarely hold more than a handful of children, so this keeps a
//! single entry unboxed and only promotes to a real hash map once a second
//! entry shows up. Keys are stored explicitly alongside their values, since a
//! [`crate::node::Node`] does not carry its own name (see the "no
//! back-reference" invariant in the data model).

use fxhash::FxHashMap;
use std::hash::Hash;
use std::mem;

pub(crate) struct Map<K, V> {
    inner: MapInner<K, V>,
}

enum MapInner<K, V> {
    Empty,
    One(K, V),
    Map(Box<FxHashMap<K, V>>),
}

impl<K, V> Default for Map<K, V> {
    fn default() -> Self {
        Map { inner: MapInner::Empty }
    }
}

impl<K, V> Map<K, V>
where
    K: Eq + Hash,
{
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        match &self.inner {
            MapInner::One(k, v) if k == key => Some(v),
            MapInner::Map(map) => map.get(key),
            MapInner::Empty | MapInner::One(..) => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.inner {
            MapInner::Empty => 0,
            MapInner::One(..) => 1,
            MapInner::Map(map) => map.len(),
        }
    }

    /// Inserts `value` under `key`. Returns `false` without modifying the
    /// map if `key` is already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> bool {
        match &self.inner {
            MapInner::One(k, _) if *k == key => return false,
            MapInner::Map(map) if map.contains_key(&key) => return false,
            _ => {}
        }
        match mem::replace(&mut self.inner, MapInner::Empty) {
            MapInner::Empty => {
                self.inner = MapInner::One(key, value);
            }
            MapInner::One(k, v) => {
                let mut map: FxHashMap<K, V> = FxHashMap::default();
                map.insert(k, v);
                map.insert(key, value);
                self.inner = MapInner::Map(Box::new(map));
            }
            MapInner::Map(mut map) => {
                map.insert(key, value);
                self.inner = MapInner::Map(map);
            }
        }
        true
    }

    /// Removes and returns the value under `key`, if any.
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        match mem::replace(&mut self.inner, MapInner::Empty) {
            MapInner::One(k, v) => {
                if k == *key {
                    Some(v)
                } else {
                    self.inner = MapInner::One(k, v);
                    None
                }
            }
            MapInner::Map(mut map) => {
                let removed = map.remove(key);
                self.inner = if map.is_empty() { MapInner::Empty } else { MapInner::Map(map) };
                removed
            }
            MapInner::Empty => None,
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        match &self.inner {
            MapInner::Empty => Iter::Empty,
            MapInner::One(k, v) => Iter::One(Some((k, v))),
            MapInner::Map(map) => Iter::Map(map.iter()),
        }
    }

    /// Empties the map, returning its former contents as owned pairs. Used
    /// only by the iterative teardown in [`crate::node::Node`]'s destructor.
    pub(crate) fn drain(&mut self) -> Vec<(K, V)> {
        match mem::replace(&mut self.inner, MapInner::Empty) {
            MapInner::Empty => Vec::new(),
            MapInner::One(k, v) => vec![(k, v)],
            MapInner::Map(map) => map.into_iter().collect(),
        }
    }
}

pub(crate) enum Iter<'a, K, V> {
    Empty,
    One(Option<(&'a K, &'a V)>),
    Map(std::collections::hash_map::Iter<'a, K, V>),
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Empty => None,
            Iter::One(slot) => slot.take(),
            Iter::Map(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_has_no_entries() {
        let map: Map<String, i32> = Map::default();
        assert_eq!(map.len(), 0);
        assert_eq!(map.get(&"a".to_string()), None);
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn insert_get_remove_single_entry() {
        let mut map = Map::default();
        assert!(map.insert("a".to_string(), 1));
        assert_eq!(map.get(&"a".to_string()), Some(&1));
        assert_eq!(map.len(), 1);
        assert!(!map.insert("a".to_string(), 2));
        assert_eq!(map.get(&"a".to_string()), Some(&1));
        assert_eq!(map.remove(&"a".to_string()), Some(1));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn promotes_to_hash_map_on_second_entry() {
        let mut map = Map::default();
        assert!(map.insert("a".to_string(), 1));
        assert!(map.insert("b".to_string(), 2));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"a".to_string()), Some(&1));
        assert_eq!(map.get(&"b".to_string()), Some(&2));

        let mut seen: Vec<_> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
        seen.sort();
        assert_eq!(seen, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn remove_demotes_back_to_empty() {
        let mut map = Map::default();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);
        assert_eq!(map.remove(&"a".to_string()), Some(1));
        assert_eq!(map.remove(&"b".to_string()), Some(2));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove(&"b".to_string()), None);
    }

    #[test]
    fn drain_empties_the_map() {
        let mut map = Map::default();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);
        let mut drained = map.drain();
        drained.sort();
        assert_eq!(drained, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(map.len(), 0);
    }
}

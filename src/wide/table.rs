//! A single in-process wide-column table.
//!
//! Items live under a `(partition key, sort key)` pair. Every operation
//! takes the table lock once, so a conditional put, an update expression or
//! a transaction is atomic with respect to every other operation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub pk: String,
    pub sk: String,
}

impl Key {
    pub fn new<P: Into<String>, S: Into<String>>(pk: P, sk: S) -> Key {
        Key { pk: pk.into(), sk: sk.into() }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    NotExists,
    Exists,
}

impl Condition {
    fn holds(self, present: bool) -> bool {
        match self {
            Condition::Always => true,
            Condition::NotExists => !present,
            Condition::Exists => present,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Index into the transaction of the write whose condition failed; 0 for
    /// single-item operations.
    ConditionFailed(usize),
    Missing(Key),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableError::ConditionFailed(at) => write!(f, "condition failed on write {}", at),
            TableError::Missing(key) => write!(f, "no item at {}", key),
        }
    }
}

pub type Update<I> = Box<dyn FnOnce(&mut I) + Send>;

pub enum Write<I> {
    Put { key: Key, item: I, condition: Condition },
    Delete { key: Key, condition: Condition },
    Update { key: Key, apply: Update<I> },
}

pub struct Table<I> {
    items: RwLock<BTreeMap<Key, I>>,
}

impl<I> Default for Table<I> {
    fn default() -> Self {
        Table { items: RwLock::new(BTreeMap::new()) }
    }
}

impl<I: Clone> Table<I> {
    pub fn new() -> Self {
        Table::default()
    }

    fn read(&self) -> RwLockReadGuard<BTreeMap<Key, I>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<BTreeMap<Key, I>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &Key) -> Option<I> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.read().contains_key(key)
    }

    pub fn put(&self, key: Key, item: I, condition: Condition) -> Result<(), TableError> {
        let mut items = self.write();
        if !condition.holds(items.contains_key(&key)) {
            return Err(TableError::ConditionFailed(0));
        }
        items.insert(key, item);
        Ok(())
    }

    /// Removes and returns the item, if any.
    pub fn delete(&self, key: &Key) -> Option<I> {
        self.write().remove(key)
    }

    /// Applies `apply` to the stored item in place and returns the result.
    pub fn update<F>(&self, key: &Key, apply: F) -> Result<I, TableError>
    where
        F: FnOnce(&mut I),
    {
        let mut items = self.write();
        match items.get_mut(key) {
            Some(item) => {
                apply(item);
                Ok(item.clone())
            }
            None => Err(TableError::Missing(key.clone())),
        }
    }

    /// All conditions are checked before anything is written; either every
    /// write lands or none does.
    pub fn transact(&self, writes: Vec<Write<I>>) -> Result<(), TableError> {
        let mut items = self.write();
        for (at, write) in writes.iter().enumerate() {
            let ok = match write {
                Write::Put { key, condition, .. } | Write::Delete { key, condition } => {
                    condition.holds(items.contains_key(key))
                }
                Write::Update { key, .. } => items.contains_key(key),
            };
            if !ok {
                return Err(TableError::ConditionFailed(at));
            }
        }
        for write in writes {
            match write {
                Write::Put { key, item, .. } => {
                    items.insert(key, item);
                }
                Write::Delete { key, .. } => {
                    items.remove(&key);
                }
                Write::Update { key, apply } => {
                    if let Some(item) = items.get_mut(&key) {
                        apply(item);
                    }
                }
            }
        }
        Ok(())
    }

    /// Every item in one partition, ordered by sort key.
    pub fn query(&self, pk: &str) -> Vec<(Key, I)> {
        self.read()
            .iter()
            .filter(|(key, _)| key.pk == pk)
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    }

    /// Items whose partition key starts with `prefix`.
    pub fn query_prefix(&self, prefix: &str) -> Vec<(Key, I)> {
        self.scan(|key, _| key.pk.starts_with(prefix))
    }

    pub fn scan<F>(&self, filter: F) -> Vec<(Key, I)>
    where
        F: Fn(&Key, &I) -> bool,
    {
        self.read()
            .iter()
            .filter(|(key, item)| filter(key, item))
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    }

    /// Drops a whole partition and returns how many items went with it.
    pub fn delete_partition(&self, pk: &str) -> usize {
        let mut items = self.write();
        let before = items.len();
        items.retain(|key, _| key.pk != pk);
        before - items.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(pk: &str) -> Key {
        Key::new(pk, "META")
    }

    #[test]
    fn conditional_put_guards_existing_items() {
        let table = Table::new();
        assert!(table.put(key("a"), 1, Condition::NotExists).is_ok());
        assert_eq!(table.put(key("a"), 2, Condition::NotExists), Err(TableError::ConditionFailed(0)));
        assert_eq!(table.get(&key("a")), Some(1));
        assert_eq!(table.put(key("b"), 3, Condition::Exists), Err(TableError::ConditionFailed(0)));
        assert!(table.put(key("a"), 4, Condition::Exists).is_ok());
        assert_eq!(table.get(&key("a")), Some(4));
    }

    #[test]
    fn failed_transaction_writes_nothing() {
        let table = Table::new();
        table.put(key("taken"), 0, Condition::Always).unwrap();
        let result = table.transact(vec![
            Write::Put { key: key("fresh"), item: 1, condition: Condition::NotExists },
            Write::Put { key: key("taken"), item: 2, condition: Condition::NotExists },
        ]);
        assert_eq!(result, Err(TableError::ConditionFailed(1)));
        assert!(!table.contains(&key("fresh")));
        assert_eq!(table.get(&key("taken")), Some(0));
    }

    #[test]
    fn transaction_applies_every_write() {
        let table = Table::new();
        table.put(key("old"), 5, Condition::Always).unwrap();
        table.put(key("counter"), 10, Condition::Always).unwrap();
        table
            .transact(vec![
                Write::Put { key: key("new"), item: 5, condition: Condition::NotExists },
                Write::Delete { key: key("old"), condition: Condition::Exists },
                Write::Update { key: key("counter"), apply: Box::new(|n: &mut i64| *n += 1) },
            ])
            .unwrap();
        assert_eq!(table.get(&key("new")), Some(5));
        assert!(!table.contains(&key("old")));
        assert_eq!(table.get(&key("counter")), Some(11));
    }

    #[test]
    fn update_on_missing_item_fails() {
        let table: Table<i64> = Table::new();
        assert_eq!(table.update(&key("x"), |n| *n += 1), Err(TableError::Missing(key("x"))));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let table = Arc::new(Table::new());
        table.put(key("counter"), 0i64, Condition::Always).unwrap();
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for _ in 0..100 {
                        table.update(&key("counter"), |n| *n += 1).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(table.get(&key("counter")), Some(800));
    }

    #[test]
    fn queries_by_partition_in_sort_order() {
        let table = Table::new();
        table.put(Key::new("P#1", "C#002"), "b", Condition::Always).unwrap();
        table.put(Key::new("P#1", "C#001"), "a", Condition::Always).unwrap();
        table.put(Key::new("P#2", "C#001"), "z", Condition::Always).unwrap();
        let items: Vec<_> = table.query("P#1").into_iter().map(|(_, v)| v).collect();
        assert_eq!(items, vec!["a", "b"]);
        assert_eq!(table.delete_partition("P#1"), 2);
        assert_eq!(table.len(), 1);
    }
}

use crate::errors::LedgerError;
use crate::store::{AssetStore, Entries, Entry, Selector};

use serde_json::Value;

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{PoisonError, RwLock};

/// Ordered in-memory store. Every operation takes the lock once, so single
/// operations are atomic and [`AssetStore::compare_and_swap`] is linearizable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> LedgerError {
    LedgerError::Store("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Every entry decoded as JSON, for persisting the store to a file.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Value>, LedgerError> {
        let entries = self.entries.read().map_err(poisoned)?;

        entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), serde_json::from_slice(value)?)))
            .collect()
    }

    /// Replaces the whole content with `snapshot`.
    pub fn restore(&self, snapshot: BTreeMap<String, Value>) -> Result<(), LedgerError> {
        let restored = snapshot
            .into_iter()
            .map(|(key, value)| Ok((key, serde_json::to_vec(&value)?)))
            .collect::<Result<BTreeMap<_, _>, LedgerError>>()?;

        log::debug!("restored {} entries", restored.len());
        *self.entries.write().map_err(poisoned)? = restored;

        Ok(())
    }
}

impl AssetStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), LedgerError> {
        self.entries.write().map_err(poisoned)?.remove(key);

        Ok(())
    }

    fn query<'a>(&'a self, selector: &Selector) -> Result<Entries<'a>, LedgerError> {
        Ok(Box::new(Cursor {
            store: self,
            selector: selector.clone(),
            last: None,
            done: false,
        }))
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool, LedgerError> {
        let mut entries = self.entries.write().map_err(poisoned)?;

        if entries.get(key).map(Vec::as_slice) != expected {
            log::debug!("compare-and-swap on {} lost", key);
            return Ok(false);
        }
        entries.insert(key.to_string(), new);

        Ok(true)
    }
}

/// Resumes after the last returned key on every step, so the lock is never held
/// between two calls to `next`.
struct Cursor<'a> {
    store: &'a MemoryStore,
    selector: Selector,
    last: Option<String>,
    done: bool,
}

impl Iterator for Cursor<'_> {
    type Item = Result<Entry, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let store = self.store;
        let entries = match store.entries.read() {
            Ok(entries) => entries,
            Err(e) => {
                self.done = true;
                return Some(Err(poisoned(e)));
            }
        };

        let lower = match &self.last {
            Some(last) => Bound::Excluded(last.as_str()),
            None => Bound::Included(self.selector.key_prefix()),
        };
        let found = entries
            .range::<str, _>((lower, Bound::Unbounded))
            .take_while(|(key, _)| self.selector.matches_key(key))
            .find(|(key, value)| self.selector.matches(key, value))
            .map(|(key, value)| (key.clone(), value.clone()));

        match found {
            Some((key, value)) => {
                self.last = Some(key.clone());
                Some(Ok((key, value)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

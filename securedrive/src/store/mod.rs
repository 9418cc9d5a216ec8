//! # Keyed asset store
//!
//! The ledger only needs point reads and writes, deletes, filtered scans and one
//! conditional write. [`AssetStore`] is that contract; [`MemoryStore`] is the
//! in-process implementation used by the command line front end and the tests.

pub mod memory;
pub mod selector;

pub use memory::MemoryStore;
pub use selector::Selector;

use crate::errors::LedgerError;

pub type Entry = (String, Vec<u8>);

/// Lazy, finite scan result. Each item is read when the iterator advances.
pub type Entries<'a> = Box<dyn Iterator<Item = Result<Entry, LedgerError>> + 'a>;

pub trait AssetStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), LedgerError>;

    /// Entries matching `selector`, in key order.
    fn query<'a>(&'a self, selector: &Selector) -> Result<Entries<'a>, LedgerError>;

    /// Writes `new` only if the current value equals `expected` (`None` for an
    /// absent key). Returns whether the write happened.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool, LedgerError>;
}

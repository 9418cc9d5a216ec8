//! # SecureDrive
//!
//! Usage-based insurance over encrypted telemetry. Vehicles and trips are
//! stored as ciphertexts under their owner's key; the premium of a trip is
//! aggregated homomorphically and only the total is ever decrypted, through
//! the two-party protocol of [`protocol`].
//!
//! ```text
//! dispatch ─▶ ledger ─▶ aggregator ─▶ protocol
//!               │                        │
//!               └────────▶ store ◀───────┘
//! ```

pub mod aggregator;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod keys;
pub mod ledger;
pub mod protocol;
pub mod records;
pub mod store;

pub use config::{RandomnessMode, Settings};
pub use dispatch::dispatch;
pub use errors::LedgerError;
pub use ledger::Ledger;
pub use store::{AssetStore, MemoryStore};

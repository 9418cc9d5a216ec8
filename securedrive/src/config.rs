//! Runtime settings, read from an optional JSON file.
//!
//! ```json
//! { "randomness": "deterministic", "safety_margin": 4096, "state_file": "ledger.json" }
//! ```
//!
//! Every field is optional.

use crate::errors::LedgerError;

use num_bigint::BigUint;
use num_traits::CheckedDiv;
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SAFETY_MARGIN: u64 = 1024;

/// Source of the encryption randomness for plaintexts ingested by the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomnessMode {
    #[default]
    Fresh,
    /// Hash-derived `r`. Equal inputs give equal, linkable ciphertexts.
    Deterministic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub randomness: RandomnessMode,
    /// `k`: every plaintext encrypted by the ledger must stay below `N / k`.
    pub safety_margin: u64,
    /// JSON snapshot of the store, used by the command line front end.
    pub state_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            randomness: RandomnessMode::Fresh,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            state_file: None,
        }
    }
}

impl Settings {
    pub fn try_with(
        randomness: RandomnessMode,
        safety_margin: u64,
        state_file: Option<PathBuf>,
    ) -> Result<Self, LedgerError> {
        let settings = Self {
            randomness,
            safety_margin,
            state_file,
        };
        settings.validate()?;

        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        log::debug!("loaded settings from {}: {:?}", path.display(), settings);

        Ok(settings)
    }

    /// Exclusive upper bound `N / k` for plaintexts under modulus `n`.
    pub fn plaintext_bound(&self, n: &BigUint) -> Result<BigUint, LedgerError> {
        n.checked_div(&BigUint::from(self.safety_margin))
            .ok_or_else(zero_margin)
    }

    /// Checks `safety_margin ≥ 1`.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.safety_margin == 0 {
            return Err(zero_margin());
        }

        Ok(())
    }
}

fn zero_margin() -> LedgerError {
    LedgerError::InvalidArguments("safety_margin must be at least 1".to_string())
}

//! # Ledger service
//!
//! Typed operations over an [`AssetStore`]: key material, vehicles, trips,
//! pricing policy, contracts and premiums. Records are created once; creating an
//! existing identifier fails with `AlreadyExists` and every missing reference
//! with `NotFound`.

mod contracts;
mod premiums;
mod trips;
mod vehicles;

pub use contracts::{ContractDetails, OwnerDetails, VehicleDetails};

use crate::config::{RandomnessMode, Settings};
use crate::errors::LedgerError;
use crate::keys;
use crate::store::{AssetStore, Selector};

use num_bigint::BigUint;
use securedrive_crypto::{Ciphertext, Decryptor, RandomnessContext, Verifier};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct Ledger<S: AssetStore> {
    store: S,
    settings: Settings,
}

impl<S: AssetStore> Ledger<S> {
    /// # Errors
    /// `InvalidArguments` if `settings` fail validation.
    pub fn new(store: S, settings: Settings) -> Result<Self, LedgerError> {
        settings.validate()?;

        Ok(Self { store, settings })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Registers the public half of `owner_id`'s keypair.
    pub fn add_verifier(
        &self,
        owner_id: &str,
        n: BigUint,
        n_square: BigUint,
    ) -> Result<Verifier, LedgerError> {
        let verifier = Verifier::try_with(owner_id, n)?;
        if verifier.n_squared() != &n_square {
            return Err(LedgerError::InvalidArguments(
                "NSquare does not equal N²".to_string(),
            ));
        }
        if let Some(decryptor) = self.find::<Decryptor>(&keys::decryptor(owner_id))? {
            if decryptor.n() != verifier.n() {
                return Err(LedgerError::InvalidArguments(format!(
                    "N differs from the decryptor already registered for {}",
                    owner_id
                )));
            }
        }

        self.insert_new(&keys::verifier(owner_id), &verifier)?;
        log::info!("verifier for {} added ({} bit modulus)", owner_id, verifier.n().bits());

        Ok(verifier)
    }

    /// Registers the private half of `owner_id`'s keypair.
    pub fn add_decryptor(
        &self,
        owner_id: &str,
        p: BigUint,
        q: BigUint,
        n: BigUint,
        lambda: BigUint,
    ) -> Result<(), LedgerError> {
        let decryptor = Decryptor::from_parts(owner_id, p, q, n, lambda)?;
        if let Some(verifier) = self.find::<Verifier>(&keys::verifier(owner_id))? {
            if verifier.n() != decryptor.n() {
                return Err(LedgerError::InvalidArguments(format!(
                    "N differs from the verifier already registered for {}",
                    owner_id
                )));
            }
        }

        self.insert_new(&keys::decryptor(owner_id), &decryptor)?;
        log::info!("decryptor for {} added", owner_id);

        Ok(())
    }

    pub fn verifier(&self, owner_id: &str) -> Result<Verifier, LedgerError> {
        self.load(&keys::verifier(owner_id))
    }

    pub fn decryptor(&self, owner_id: &str) -> Result<Decryptor, LedgerError> {
        self.load(&keys::decryptor(owner_id))
    }

    pub fn delete_verifier(&self, owner_id: &str) -> Result<(), LedgerError> {
        let key = keys::verifier(owner_id);
        self.require(&key)?;
        self.store.delete(&key)?;
        log::info!("verifier for {} deleted", owner_id);

        Ok(())
    }

    /// Encrypts a single value under `owner_id`'s key, with the same bounds and
    /// randomness mode as record ingestion.
    pub fn encrypt_value(&self, owner_id: &str, value: &BigUint) -> Result<Ciphertext, LedgerError> {
        let verifier = self.verifier(owner_id)?;
        let context = RandomnessContext::new().with("value").with(owner_id);

        self.encrypt_field(&verifier, value, &context)
    }

    /// Encrypts one plaintext field, checking `0 ≤ value < N / k` first.
    fn encrypt_field(
        &self,
        verifier: &Verifier,
        value: &BigUint,
        context: &RandomnessContext,
    ) -> Result<Ciphertext, LedgerError> {
        let bound = self.settings.plaintext_bound(verifier.n())?;
        if value >= &bound {
            return Err(LedgerError::PlaintextOutOfBounds(format!(
                "{} is not below N / {}",
                value, self.settings.safety_margin
            )));
        }

        let ciphertext = match self.settings.randomness {
            RandomnessMode::Fresh => verifier.encrypt(value)?,
            RandomnessMode::Deterministic => {
                verifier.encrypt_deterministic(value, &context.clone().with(value.to_string()))?
            }
        };

        Ok(ciphertext)
    }

    fn find<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LedgerError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T, LedgerError> {
        self.find(key)?
            .ok_or_else(|| LedgerError::NotFound(key.to_string()))
    }

    fn require(&self, key: &str) -> Result<(), LedgerError> {
        match self.store.get(key)? {
            Some(_) => Ok(()),
            None => Err(LedgerError::NotFound(key.to_string())),
        }
    }

    /// Writes `value` only if `key` is free.
    fn insert_new<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LedgerError> {
        if !self
            .store
            .compare_and_swap(key, None, serde_json::to_vec(value)?)?
        {
            return Err(LedgerError::AlreadyExists(key.to_string()));
        }

        Ok(())
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LedgerError> {
        self.store.put(key, serde_json::to_vec(value)?)
    }

    fn collect<T: DeserializeOwned>(&self, selector: &Selector) -> Result<Vec<T>, LedgerError> {
        self.store
            .query(selector)?
            .map(|entry| {
                let (_, bytes) = entry?;
                Ok(serde_json::from_slice(&bytes)?)
            })
            .collect()
    }
}

/// `CorruptCiphertext` unless every ciphertext lies in `(0, N²)` of `verifier`.
fn check_ciphertexts(verifier: &Verifier, ciphertexts: &[&Ciphertext]) -> Result<(), LedgerError> {
    for ciphertext in ciphertexts {
        verifier.compute_r(ciphertext)?;
    }

    Ok(())
}

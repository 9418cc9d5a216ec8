//! # Two-party decryption of a calculation result
//!
//! ```text
//! Pending ──decryptor_step──▶ R' ──verifier_step──▶ m ──settle──▶ Resolved
//! ```
//!
//! The two steps never write. [`settle`] is the only transition to `Resolved`
//! and is guarded with compare-and-swap so a result is accounted at most once.

use crate::errors::LedgerError;
use crate::keys;
use crate::records::{
    CalculationResult, EncryptedTripRecord, MonthlyPremiumRecord, PremiumRecord, ResultStatus,
};
use crate::store::AssetStore;

use num_bigint::BigUint;
use securedrive_crypto::{CryptoError, DecryptionShare, Decryptor, Verifier};

/// `R' = R^(N⁻¹ mod λ) mod N`, computed by the holder of `λ`.
pub fn decryptor_step(
    decryptor: &Decryptor,
    result: &CalculationResult,
) -> Result<DecryptionShare, CryptoError> {
    decryptor.compute_r_prime(&result.r)
}

/// Verifies `share` against the result's ciphertext, then decrypts.
pub fn verifier_step(
    verifier: &Verifier,
    result: &CalculationResult,
    share: &DecryptionShare,
) -> Result<BigUint, CryptoError> {
    verifier.verify_and_decrypt(&result.total_premium, share)
}

/// Marks `result` as `Resolved`, writes the trip's premium record and adds
/// `premium` to the vehicle's month, in that order.
///
/// `result` is the record the premium was decrypted from; the stored copy must
/// still be equal to it. A failure after the claim undoes the premium record
/// and hands the result back as `Pending`.
///
/// # Errors
/// * `AlreadyResolved` if the result was resolved before
/// * `Conflict` if the result or the monthly record changed concurrently
/// * the store's error if a write fails
pub fn settle<S: AssetStore + ?Sized>(
    store: &S,
    result: &CalculationResult,
    trip: &EncryptedTripRecord,
    premium: i64,
) -> Result<PremiumRecord, LedgerError> {
    let result_id = result.result_id.as_str();
    let pending_bytes = store
        .get(result_id)?
        .ok_or_else(|| LedgerError::NotFound(format!("calculation result {}", result_id)))?;
    let stored: CalculationResult = serde_json::from_slice(&pending_bytes)?;
    if stored.is_resolved() {
        return Err(LedgerError::AlreadyResolved(result_id.to_string()));
    }
    if stored != *result {
        return Err(LedgerError::Conflict(format!(
            "calculation result {} was recalculated during decryption",
            result_id
        )));
    }

    let resolved = CalculationResult {
        status: ResultStatus::Resolved,
        ..stored
    };
    let resolved_bytes = serde_json::to_vec(&resolved)?;
    let claimed =
        store.compare_and_swap(result_id, Some(pending_bytes.as_slice()), resolved_bytes.clone())?;
    if !claimed {
        return Err(LedgerError::Conflict(format!(
            "calculation result {} changed during decryption",
            result_id
        )));
    }

    let record = premium_record(trip, premium);
    let premium_key = keys::premium(&trip.trip_id);
    let previous = match store.get(&premium_key) {
        Ok(previous) => previous,
        Err(e) => return Err(release(store, result_id, resolved_bytes, pending_bytes, e)),
    };
    let written = serde_json::to_vec(&record)
        .map_err(LedgerError::from)
        .and_then(|bytes| store.put(&premium_key, bytes));
    if let Err(e) = written {
        let e = restore(store, &premium_key, previous, e);
        return Err(release(store, result_id, resolved_bytes, pending_bytes, e));
    }

    if let Err(e) = add_to_month(store, trip, premium) {
        let e = restore(store, &premium_key, previous, e);
        return Err(release(store, result_id, resolved_bytes, pending_bytes, e));
    }
    log::info!(
        "trip {} of vehicle {} settled with premium {}",
        trip.trip_id,
        trip.vehicle_id,
        premium
    );

    Ok(record)
}

/// Plain read-modify-write of the premium and monthly records, with no status
/// check. Every call adds `premium` to the month again.
pub fn accumulate_unguarded<S: AssetStore + ?Sized>(
    store: &S,
    trip: &EncryptedTripRecord,
    premium: i64,
) -> Result<MonthlyPremiumRecord, LedgerError> {
    let record = premium_record(trip, premium);
    store.put(&keys::premium(&trip.trip_id), serde_json::to_vec(&record)?)?;

    let (year, month) = trip.year_month();
    let key = keys::month_premium(&trip.vehicle_id, year, month);
    let monthly = match store.get(&key)? {
        Some(bytes) => {
            let mut monthly: MonthlyPremiumRecord = serde_json::from_slice(&bytes)?;
            monthly.accumulate(premium)?;
            monthly
        }
        None => MonthlyPremiumRecord::try_with(trip.vehicle_id.clone(), year, month, premium)?,
    };
    store.put(&key, serde_json::to_vec(&monthly)?)?;

    Ok(monthly)
}

fn add_to_month<S: AssetStore + ?Sized>(
    store: &S,
    trip: &EncryptedTripRecord,
    premium: i64,
) -> Result<MonthlyPremiumRecord, LedgerError> {
    let (year, month) = trip.year_month();
    let key = keys::month_premium(&trip.vehicle_id, year, month);

    let current = store.get(&key)?;
    let monthly = match &current {
        Some(bytes) => {
            let mut monthly: MonthlyPremiumRecord = serde_json::from_slice(bytes)?;
            monthly.accumulate(premium)?;
            monthly
        }
        None => MonthlyPremiumRecord::try_with(trip.vehicle_id.clone(), year, month, premium)?,
    };

    if !store.compare_and_swap(&key, current.as_deref(), serde_json::to_vec(&monthly)?)? {
        return Err(LedgerError::Conflict(format!(
            "monthly premium {} changed concurrently",
            key
        )));
    }

    Ok(monthly)
}

/// Hands the claim on a result back so it can be decrypted again. Returns the
/// error to report: `cause`, or `Conflict` if the claim could not be released.
fn release<S: AssetStore + ?Sized>(
    store: &S,
    result_id: &str,
    resolved: Vec<u8>,
    pending: Vec<u8>,
    cause: LedgerError,
) -> LedgerError {
    match store.compare_and_swap(result_id, Some(resolved.as_slice()), pending) {
        Ok(true) => cause,
        Ok(false) => {
            log::error!("claim on {} changed hands; result left resolved", result_id);
            LedgerError::Conflict(format!(
                "{}; calculation result {} is stuck resolved",
                cause, result_id
            ))
        }
        Err(e) => {
            log::error!("could not release the claim on {}: {}", result_id, e);
            LedgerError::Store(format!(
                "{}; calculation result {} is stuck resolved: {}",
                cause, result_id, e
            ))
        }
    }
}

/// Puts back the premium record that was there before a failed settlement.
fn restore<S: AssetStore + ?Sized>(
    store: &S,
    key: &str,
    previous: Option<Vec<u8>>,
    cause: LedgerError,
) -> LedgerError {
    let restored = match previous {
        Some(bytes) => store.put(key, bytes),
        None => store.delete(key),
    };
    match restored {
        Ok(()) => cause,
        Err(e) => {
            log::error!("could not restore {}: {}", key, e);
            LedgerError::Store(format!("{}; {} left partially written: {}", cause, key, e))
        }
    }
}

fn premium_record(trip: &EncryptedTripRecord, premium: i64) -> PremiumRecord {
    PremiumRecord {
        trip_id: trip.trip_id.clone(),
        vehicle_id: trip.vehicle_id.clone(),
        date: trip.date,
        premium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::records::trip::parse_date;
    use crate::store::{Entries, MemoryStore, Selector};

    use securedrive_crypto::Ciphertext;

    fn trip() -> Result<EncryptedTripRecord, LedgerError> {
        let c = Ciphertext::from_decimal("5")?;
        Ok(EncryptedTripRecord {
            vehicle_id: "v1".to_string(),
            trip_id: "t1".to_string(),
            date: parse_date("2024-11-05")?,
            speeding: c.clone(),
            hard_accelerations: c.clone(),
            emergency_brakes: c.clone(),
            unsafe_distance: c.clone(),
            high_risk_zones: c.clone(),
            traffic_signal_compliance: c.clone(),
            night_driving: c.clone(),
            mileage: c,
        })
    }

    fn result(total: &str) -> Result<CalculationResult, LedgerError> {
        Ok(CalculationResult {
            result_id: "result_t1".to_string(),
            total_premium: Ciphertext::from_decimal(total)?,
            r: securedrive_crypto::DecryptionHint::from_decimal("45")?,
            trip_id: "t1".to_string(),
            vehicle_id: "v1".to_string(),
            status: ResultStatus::Pending,
        })
    }

    fn pending(store: &MemoryStore) -> Result<CalculationResult, LedgerError> {
        let result = result("12345")?;
        store.put("result_t1", serde_json::to_vec(&result)?)?;
        Ok(result)
    }

    fn monthly(store: &MemoryStore) -> Result<i64, LedgerError> {
        let bytes = store
            .get("monthprime_v1_2024_11")?
            .ok_or_else(|| LedgerError::NotFound("monthly".to_string()))?;
        Ok(serde_json::from_slice::<MonthlyPremiumRecord>(&bytes)?.premium)
    }

    #[test]
    fn test_settle_is_guarded() -> Result<(), LedgerError> {
        let store = MemoryStore::new();
        let result = pending(&store)?;
        let trip = trip()?;

        let record = settle(&store, &result, &trip, 700)?;
        assert_eq!(record.premium, 700);
        assert_eq!(monthly(&store)?, 700);

        assert!(matches!(
            settle(&store, &result, &trip, 700),
            Err(LedgerError::AlreadyResolved(_))
        ));
        assert_eq!(monthly(&store)?, 700);
        Ok(())
    }

    #[test]
    fn test_unguarded_accumulation_double_counts() -> Result<(), LedgerError> {
        let store = MemoryStore::new();
        let trip = trip()?;

        accumulate_unguarded(&store, &trip, 700)?;
        let second = accumulate_unguarded(&store, &trip, 700)?;

        assert_eq!(second.premium, 1_400);
        assert_eq!(monthly(&store)?, 1_400);
        Ok(())
    }

    #[test]
    fn test_missing_result() -> Result<(), LedgerError> {
        let store = MemoryStore::new();
        assert!(matches!(
            settle(&store, &result("12345")?, &trip()?, 1),
            Err(LedgerError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_recalculated_result_is_a_conflict() -> Result<(), LedgerError> {
        let store = MemoryStore::new();
        pending(&store)?;

        assert!(matches!(
            settle(&store, &result("54321")?, &trip()?, 1),
            Err(LedgerError::Conflict(_))
        ));
        assert_eq!(store.get("prime_t1")?, None);
        Ok(())
    }

    /// Lets one monthly write slip in between the two compare-and-swaps.
    struct Interleaved {
        inner: MemoryStore,
    }

    impl AssetStore for Interleaved {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
            let value = self.inner.get(key)?;
            if key.starts_with(keys::MONTH_PREMIUM) {
                let other = MonthlyPremiumRecord::try_with("v1", 2024, 11, 1)?;
                self.inner.put(key, serde_json::to_vec(&other)?)?;
            }
            Ok(value)
        }

        fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
            self.inner.put(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), LedgerError> {
            self.inner.delete(key)
        }

        fn query<'a>(&'a self, selector: &Selector) -> Result<Entries<'a>, LedgerError> {
            self.inner.query(selector)
        }

        fn compare_and_swap(
            &self,
            key: &str,
            expected: Option<&[u8]>,
            new: Vec<u8>,
        ) -> Result<bool, LedgerError> {
            self.inner.compare_and_swap(key, expected, new)
        }
    }

    /// Refuses every write of a premium record.
    struct ReadOnlyPremiums {
        inner: MemoryStore,
    }

    impl AssetStore for ReadOnlyPremiums {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
            if key.starts_with(keys::PREMIUM) {
                return Err(LedgerError::Store(format!("{} is read-only", key)));
            }
            self.inner.put(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), LedgerError> {
            self.inner.delete(key)
        }

        fn query<'a>(&'a self, selector: &Selector) -> Result<Entries<'a>, LedgerError> {
            self.inner.query(selector)
        }

        fn compare_and_swap(
            &self,
            key: &str,
            expected: Option<&[u8]>,
            new: Vec<u8>,
        ) -> Result<bool, LedgerError> {
            self.inner.compare_and_swap(key, expected, new)
        }
    }

    #[test]
    fn test_failed_premium_write_leaves_no_partial_state() -> Result<(), LedgerError> {
        let store = ReadOnlyPremiums {
            inner: MemoryStore::new(),
        };
        let pending = pending(&store.inner)?;
        let before = store.inner.snapshot()?;

        assert!(matches!(
            settle(&store, &pending, &trip()?, 700),
            Err(LedgerError::Store(_))
        ));
        assert_eq!(store.inner.snapshot()?, before);

        // the result can still be settled once the store accepts writes
        let record = settle(&store.inner, &pending, &trip()?, 700)?;
        assert_eq!(record.premium, 700);
        assert_eq!(monthly(&store.inner)?, 700);
        Ok(())
    }

    #[test]
    fn test_lost_monthly_race_releases_the_result() -> Result<(), LedgerError> {
        let store = Interleaved {
            inner: MemoryStore::new(),
        };
        let pending = pending(&store.inner)?;

        assert!(matches!(
            settle(&store, &pending, &trip()?, 700),
            Err(LedgerError::Conflict(_))
        ));

        let bytes = store.inner.get("result_t1")?.unwrap_or_default();
        let result: CalculationResult = serde_json::from_slice(&bytes)?;
        assert_eq!(result.status, ResultStatus::Pending);
        assert_eq!(store.inner.get("prime_t1")?, None);
        assert_eq!(monthly(&store.inner)?, 1);
        Ok(())
    }
}

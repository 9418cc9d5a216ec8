use super::Ledger;

use crate::aggregator;
use crate::errors::LedgerError;
use crate::keys;
use crate::protocol;
use crate::records::premium::check_month;
use crate::records::{CalculationResult, EncryptedTripRecord, MonthlyPremiumRecord, PremiumRecord};
use crate::store::{AssetStore, Selector};

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use securedrive_crypto::{CryptoError, DecryptionShare, Verifier};

impl<S: AssetStore> Ledger<S> {
    /// Aggregates the trip's encrypted premium and stores it as a pending result.
    ///
    /// A pending result of the same trip is replaced; a resolved one is final.
    pub fn calculate_premium(
        &self,
        vehicle_id: &str,
        trip_id: &str,
        weights_id: &str,
    ) -> Result<CalculationResult, LedgerError> {
        let trip = self.trip(trip_id)?;
        if trip.vehicle_id != vehicle_id {
            return Err(LedgerError::InvalidArguments(format!(
                "trip {} belongs to vehicle {}, not {}",
                trip_id, trip.vehicle_id, vehicle_id
            )));
        }
        let vehicle = self.vehicle(vehicle_id)?;
        let weights = self.criteria_weights(weights_id)?;
        let verifier = self.verifier(&vehicle.owner_id)?;

        let bound = self.settings.plaintext_bound(verifier.n())?;
        if aggregator::worst_case_total(&weights, &bound) >= verifier.n() >> 1u32 {
            return Err(LedgerError::PlaintextOutOfBounds(format!(
                "weights {} can carry a premium past N / 2 with safety margin {}",
                weights_id, self.settings.safety_margin
            )));
        }

        let result = aggregator::calculate(&verifier, &vehicle, &trip, &weights)?;

        let key = result.result_id.as_str();
        let existing = self.store.get(key)?;
        if let Some(bytes) = &existing {
            let previous: CalculationResult = serde_json::from_slice(bytes)?;
            if previous.is_resolved() {
                return Err(LedgerError::AlreadyResolved(key.to_string()));
            }
        }
        if !self
            .store
            .compare_and_swap(key, existing.as_deref(), serde_json::to_vec(&result)?)?
        {
            return Err(LedgerError::Conflict(format!(
                "calculation result {} changed during calculation",
                key
            )));
        }
        log::info!(
            "premium of trip {} calculated with weights {} ({} byte ciphertext)",
            trip_id,
            weights_id,
            result.total_premium.size_bytes()
        );

        Ok(result)
    }

    /// Decrypts the trip's pending result with a share `R'` computed by the
    /// key holder and accounts the premium.
    pub fn decrypt_premium(
        &self,
        trip_id: &str,
        share: &DecryptionShare,
    ) -> Result<PremiumRecord, LedgerError> {
        let result = self.calculation_result(&keys::result(trip_id))?;
        if result.is_resolved() {
            return Err(LedgerError::AlreadyResolved(result.result_id));
        }
        let (trip, verifier) = self.result_context(&result)?;

        self.resolve(&result, &trip, &verifier, share)
    }

    /// Runs both protocol roles with the owner's stored decryptor.
    pub fn decrypt_premium_with_stored_decryptor(
        &self,
        result_id: &str,
    ) -> Result<PremiumRecord, LedgerError> {
        let result = self.calculation_result(result_id)?;
        if result.is_resolved() {
            return Err(LedgerError::AlreadyResolved(result.result_id));
        }
        let (trip, verifier) = self.result_context(&result)?;
        let decryptor = self.decryptor(verifier.owner_id())?;

        let share = protocol::decryptor_step(&decryptor, &result)?;
        log::trace!("R' of {} is {}", result_id, share.value());

        self.resolve(&result, &trip, &verifier, &share)
    }

    /// Decrypts a result again without touching the store.
    pub fn reveal_premium(&self, result_id: &str) -> Result<i64, LedgerError> {
        let result = self.calculation_result(result_id)?;
        let (_, verifier) = self.result_context(&result)?;
        let decryptor = self.decryptor(verifier.owner_id())?;

        let share = protocol::decryptor_step(&decryptor, &result)?;
        let plain = protocol::verifier_step(&verifier, &result, &share)?;

        signed_premium(&verifier, &plain)
    }

    /// Seeds the monthly total of a vehicle, e.g. when migrating past months.
    pub fn add_month_premium(
        &self,
        vehicle_id: &str,
        month: u32,
        year: i32,
        premium: i64,
    ) -> Result<MonthlyPremiumRecord, LedgerError> {
        let record = MonthlyPremiumRecord::try_with(vehicle_id, year, month, premium)?;
        self.require(&keys::vehicle(vehicle_id))?;

        self.insert_new(&keys::month_premium(vehicle_id, year, month), &record)?;
        log::info!("monthly premium of {} for {}-{} set to {}", vehicle_id, year, month, premium);

        Ok(record)
    }

    pub fn premium(&self, trip_id: &str) -> Result<PremiumRecord, LedgerError> {
        self.load(&keys::premium(trip_id))
    }

    pub fn month_premium(
        &self,
        vehicle_id: &str,
        month: u32,
        year: i32,
    ) -> Result<MonthlyPremiumRecord, LedgerError> {
        check_month(month)?;
        self.load(&keys::month_premium(vehicle_id, year, month))
    }

    pub fn premiums_by_vehicle(&self, vehicle_id: &str) -> Result<Vec<PremiumRecord>, LedgerError> {
        self.collect(&Selector::prefix(keys::PREMIUM).field_eq("vehicleID", vehicle_id))
    }

    pub fn results_by_vehicle(&self, vehicle_id: &str) -> Result<Vec<CalculationResult>, LedgerError> {
        self.collect(&Selector::prefix(keys::RESULT).field_eq("vehicleID", vehicle_id))
    }

    /// Loads a result by its full id, `result_<tripID>`.
    pub fn calculation_result(&self, result_id: &str) -> Result<CalculationResult, LedgerError> {
        if !result_id.starts_with(keys::RESULT) {
            return Err(LedgerError::InvalidArguments(format!(
                "{} is not a calculation result id",
                result_id
            )));
        }

        self.load(result_id)
    }

    fn result_context(
        &self,
        result: &CalculationResult,
    ) -> Result<(EncryptedTripRecord, Verifier), LedgerError> {
        let trip = self.trip(&result.trip_id)?;
        let vehicle = self.vehicle(&trip.vehicle_id)?;
        let verifier = self.verifier(&vehicle.owner_id)?;

        Ok((trip, verifier))
    }

    fn resolve(
        &self,
        result: &CalculationResult,
        trip: &EncryptedTripRecord,
        verifier: &Verifier,
        share: &DecryptionShare,
    ) -> Result<PremiumRecord, LedgerError> {
        let plain = match protocol::verifier_step(verifier, result, share) {
            Ok(plain) => plain,
            Err(CryptoError::VerificationFailed) => {
                log::warn!("decryption share for {} rejected", result.result_id);
                return Err(CryptoError::VerificationFailed.into());
            }
            Err(e) => return Err(e.into()),
        };
        let premium = signed_premium(verifier, &plain)?;

        protocol::settle(&self.store, result, trip, premium)
    }
}

/// Reads a decrypted plaintext as a signed premium.
fn signed_premium(verifier: &Verifier, plain: &BigUint) -> Result<i64, LedgerError> {
    let signed = verifier.decode_signed(plain);

    signed.to_i64().ok_or_else(|| {
        LedgerError::PlaintextOutOfBounds(format!("premium {} does not fit in 64 bits", signed))
    })
}

#[cfg(test)]
mod tests {
    use crate::errors::LedgerError;
    use crate::keys;
    use crate::ledger::Ledger;
    use crate::config::{RandomnessMode, Settings};
    use crate::ledger::fixtures::*;
    use crate::records::{CriteriaWeights, ResultStatus, TripMetrics, VehicleData};
    use crate::store::{AssetStore, MemoryStore};

    use securedrive_crypto::{CryptoError, DecryptionShare};

    const CAR: VehicleData = VehicleData {
        vehicle_type: 1,
        purchase_mileage: 50_000,
        year: 2020,
    };

    const METRICS: TripMetrics = TripMetrics {
        speeding: 3,
        hard_accelerations: 1,
        emergency_brakes: 0,
        unsafe_distance: 2,
        high_risk_zones: 0,
        traffic_signal_compliance: 4,
        night_driving: 1,
        mileage: 100,
    };

    fn weights(id: &str, weight_traffic: u64) -> CriteriaWeights {
        CriteriaWeights {
            weights_id: id.to_string(),
            weight_traffic,
            weight_speed: 2,
            weight_acceleration: 1,
            weight_braking: 1,
            weight_distance: 1,
            weight_zone: 1,
            weight_time: 1,
            alpha: 5,
            beta: 2,
        }
    }

    fn scenario() -> Result<Ledger<MemoryStore>, LedgerError> {
        scenario_with(Settings::default())
    }

    fn scenario_with(settings: Settings) -> Result<Ledger<MemoryStore>, LedgerError> {
        let ledger = ledger_with(settings)?;
        ledger.add_vehicle("veh1", &CAR, OWNER)?;
        ledger.add_trip("veh1", "trip1", "2024-11-05", &METRICS, OWNER)?;
        ledger.add_trip("veh1", "trip2", "2024-11-20", &METRICS, OWNER)?;
        ledger.add_criteria_weights(weights("w1", 3))?;
        Ok(ledger)
    }

    #[test]
    fn test_premium_is_accounted_once() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        let result = ledger.calculate_premium("veh1", "trip1", "w1")?;
        assert_eq!(result.status, ResultStatus::Pending);

        let record = ledger.decrypt_premium_with_stored_decryptor(&result.result_id)?;
        assert_eq!(record.premium, 52_517);
        assert_eq!(ledger.premium("trip1")?, record);
        assert_eq!(ledger.month_premium("veh1", 11, 2024)?.premium, 52_517);
        assert!(ledger.calculation_result("result_trip1")?.is_resolved());

        assert!(matches!(
            ledger.decrypt_premium_with_stored_decryptor(&result.result_id),
            Err(LedgerError::AlreadyResolved(_))
        ));
        assert!(matches!(
            ledger.calculate_premium("veh1", "trip1", "w1"),
            Err(LedgerError::AlreadyResolved(_))
        ));
        assert_eq!(ledger.reveal_premium(&result.result_id)?, 52_517);
        assert_eq!(ledger.month_premium("veh1", 11, 2024)?.premium, 52_517);
        Ok(())
    }

    #[test]
    fn test_month_sums_trips() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        ledger.calculate_premium("veh1", "trip1", "w1")?;
        ledger.calculate_premium("veh1", "trip2", "w1")?;

        let decryptor = ledger.decryptor(OWNER)?;
        let pending = ledger.calculation_result("result_trip2")?;
        let share = crate::protocol::decryptor_step(&decryptor, &pending)?;

        ledger.decrypt_premium_with_stored_decryptor("result_trip1")?;
        ledger.decrypt_premium("trip2", &share)?;

        assert_eq!(ledger.month_premium("veh1", 11, 2024)?.premium, 2 * 52_517);
        assert_eq!(ledger.premiums_by_vehicle("veh1")?.len(), 2);
        assert_eq!(ledger.results_by_vehicle("veh1")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_pending_result_is_recalculated() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        ledger.add_criteria_weights(weights("w2", 0))?;

        ledger.calculate_premium("veh1", "trip1", "w1")?;
        let result = ledger.calculate_premium("veh1", "trip1", "w2")?;

        assert_eq!(ledger.results_by_vehicle("veh1")?, vec![result]);
        // β·w_traffic·compliance = 2·3·4 no longer subtracted
        assert_eq!(ledger.reveal_premium("result_trip1")?, 52_541);
        Ok(())
    }

    #[test]
    fn test_negative_premium() -> Result<(), LedgerError> {
        let ledger = scenario_with(Settings::try_with(RandomnessMode::Fresh, 1 << 20, None)?)?;
        ledger.add_criteria_weights(weights("credit", 10_000))?;

        ledger.calculate_premium("veh1", "trip1", "credit")?;
        let record = ledger.decrypt_premium_with_stored_decryptor("result_trip1")?;

        assert_eq!(record.premium, 52_517 + 2 * 3 * 4 - 2 * 10_000 * 4);
        assert!(record.premium < 0);
        assert_eq!(ledger.month_premium("veh1", 11, 2024)?.premium, record.premium);
        Ok(())
    }

    #[test]
    fn test_weights_that_can_wrap_are_refused() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        ledger.add_criteria_weights(weights("credit", 10_000))?;

        assert!(matches!(
            ledger.calculate_premium("veh1", "trip1", "credit"),
            Err(LedgerError::PlaintextOutOfBounds(_))
        ));
        assert!(ledger.results_by_vehicle("veh1")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejected_share_has_no_side_effects() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        ledger.calculate_premium("veh1", "trip1", "w1")?;
        ledger.calculate_premium("veh1", "trip2", "w1")?;

        let decryptor = ledger.decryptor(OWNER)?;
        let other = ledger.calculation_result("result_trip2")?;
        let foreign = crate::protocol::decryptor_step(&decryptor, &other)?;

        assert!(matches!(
            ledger.decrypt_premium("trip1", &foreign),
            Err(LedgerError::Crypto(CryptoError::VerificationFailed))
        ));
        assert!(matches!(
            ledger.decrypt_premium("trip1", &DecryptionShare::from_decimal("1")?),
            Err(LedgerError::Crypto(CryptoError::VerificationFailed))
        ));
        assert!(!ledger.calculation_result("result_trip1")?.is_resolved());
        assert!(matches!(ledger.premium("trip1"), Err(LedgerError::NotFound(_))));
        assert!(matches!(
            ledger.month_premium("veh1", 11, 2024),
            Err(LedgerError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_calculation_references() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        ledger.add_vehicle("veh2", &CAR, OWNER)?;

        assert!(matches!(
            ledger.calculate_premium("veh2", "trip1", "w1"),
            Err(LedgerError::InvalidArguments(_))
        ));
        assert!(matches!(
            ledger.calculate_premium("veh1", "trip9", "w1"),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.calculate_premium("veh1", "trip1", "w9"),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.calculation_result("trip_trip1"),
            Err(LedgerError::InvalidArguments(_))
        ));
        assert!(matches!(
            ledger.reveal_premium("result_trip1"),
            Err(LedgerError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_month_premium_records() -> Result<(), LedgerError> {
        let ledger = scenario()?;
        ledger.add_month_premium("veh1", 10, 2024, 300)?;

        assert_eq!(ledger.month_premium("veh1", 10, 2024)?.premium, 300);
        assert!(matches!(
            ledger.add_month_premium("veh1", 10, 2024, 1),
            Err(LedgerError::AlreadyExists(_))
        ));
        assert!(matches!(
            ledger.add_month_premium("veh9", 10, 2024, 1),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.month_premium("veh1", 13, 2024),
            Err(LedgerError::InvalidArguments(_))
        ));
        assert!(ledger.store().get(&keys::month_premium("veh1", 2024, 10))?.is_some());
        Ok(())
    }
}

use super::{Ledger, check_ciphertexts};

use crate::errors::LedgerError;
use crate::keys;
use crate::records::trip::parse_date;
use crate::records::{CriteriaWeights, EncryptedTripRecord, TripMetrics};
use crate::store::{AssetStore, Selector};

use num_bigint::BigUint;
use securedrive_crypto::RandomnessContext;

impl<S: AssetStore> Ledger<S> {
    /// Stores a trip encrypted by the vehicle's owner.
    pub fn add_encrypted_trip(&self, trip: EncryptedTripRecord) -> Result<(), LedgerError> {
        let vehicle = self.vehicle(&trip.vehicle_id)?;
        let verifier = self.verifier(&vehicle.owner_id)?;
        check_ciphertexts(&verifier, &trip.ciphertexts())?;

        self.insert_new(&keys::trip(&trip.trip_id), &trip)?;
        log::info!("trip {} added to vehicle {}", trip.trip_id, trip.vehicle_id);

        Ok(())
    }

    /// Encrypts plaintext telemetry under `owner_id`'s key, who must own the vehicle.
    pub fn add_trip(
        &self,
        vehicle_id: &str,
        trip_id: &str,
        date: &str,
        metrics: &TripMetrics,
        owner_id: &str,
    ) -> Result<EncryptedTripRecord, LedgerError> {
        let date = parse_date(date)?;
        let vehicle = self.vehicle(vehicle_id)?;
        if vehicle.owner_id != owner_id {
            return Err(LedgerError::InvalidArguments(format!(
                "{} does not own vehicle {}",
                owner_id, vehicle_id
            )));
        }

        let verifier = self.verifier(owner_id)?;
        let context = RandomnessContext::new().with(keys::trip(trip_id));
        let field = |label: &str, value: u64| {
            self.encrypt_field(&verifier, &BigUint::from(value), &context.for_field(label))
        };

        let trip = EncryptedTripRecord {
            vehicle_id: vehicle_id.to_string(),
            trip_id: trip_id.to_string(),
            date,
            speeding: field("speeding", metrics.speeding)?,
            hard_accelerations: field("hard_accelerations", metrics.hard_accelerations)?,
            emergency_brakes: field("emergency_brakes", metrics.emergency_brakes)?,
            unsafe_distance: field("unsafe_distance", metrics.unsafe_distance)?,
            high_risk_zones: field("high_risk_zones", metrics.high_risk_zones)?,
            traffic_signal_compliance: field(
                "traffic_signal_compliance",
                metrics.traffic_signal_compliance,
            )?,
            night_driving: field("night_driving", metrics.night_driving)?,
            mileage: field("mileage", metrics.mileage)?,
        };

        self.insert_new(&keys::trip(trip_id), &trip)?;
        log::info!("trip {} encrypted and added to vehicle {}", trip_id, vehicle_id);

        Ok(trip)
    }

    pub fn trip(&self, trip_id: &str) -> Result<EncryptedTripRecord, LedgerError> {
        self.load(&keys::trip(trip_id))
    }

    pub fn trips_by_vehicle(&self, vehicle_id: &str) -> Result<Vec<EncryptedTripRecord>, LedgerError> {
        self.collect(&Selector::prefix(keys::TRIP).field_eq("vehicleID", vehicle_id))
    }

    /// Deletes the trip only; its result and premium records stay.
    pub fn delete_trip(&self, trip_id: &str) -> Result<(), LedgerError> {
        let key = keys::trip(trip_id);
        self.require(&key)?;
        self.store.delete(&key)?;
        log::info!("trip {} deleted", trip_id);

        Ok(())
    }

    pub fn add_criteria_weights(&self, weights: CriteriaWeights) -> Result<(), LedgerError> {
        self.insert_new(&keys::criteria_weights(&weights.weights_id), &weights)?;
        log::info!("criteria weights {} added", weights.weights_id);

        Ok(())
    }

    pub fn criteria_weights(&self, weights_id: &str) -> Result<CriteriaWeights, LedgerError> {
        self.load(&keys::criteria_weights(weights_id))
    }

    pub fn all_criteria_weights(&self) -> Result<Vec<CriteriaWeights>, LedgerError> {
        self.collect(&Selector::prefix(keys::CRITERIA_WEIGHTS))
    }
}

use super::{Ledger, check_ciphertexts};

use crate::errors::LedgerError;
use crate::keys;
use crate::records::{EncryptedVehicleRecord, VehicleData};
use crate::store::{AssetStore, Selector};

use num_bigint::BigUint;
use securedrive_crypto::{RandomnessContext, Verifier};
use serde_json::{Map, Value};

/// Fields every vehicle record needs; migrations may not remove them.
const VEHICLE_FIELDS: [&str; 5] = ["vehicleID", "vehicle_type", "purchase_mileage", "year", "ownerID"];

impl<S: AssetStore> Ledger<S> {
    /// Stores a vehicle whose fields were encrypted by the owner.
    pub fn add_encrypted_vehicle(&self, vehicle: EncryptedVehicleRecord) -> Result<(), LedgerError> {
        let verifier = self.verifier(&vehicle.owner_id)?;
        check_ciphertexts(&verifier, &vehicle.ciphertexts())?;

        self.insert_new(&keys::vehicle(&vehicle.vehicle_id), &vehicle)?;
        log::info!("vehicle {} added for {}", vehicle.vehicle_id, vehicle.owner_id);

        Ok(())
    }

    /// Encrypts plaintext vehicle fields under `owner_id`'s key and stores them.
    pub fn add_vehicle(
        &self,
        vehicle_id: &str,
        data: &VehicleData,
        owner_id: &str,
    ) -> Result<EncryptedVehicleRecord, LedgerError> {
        let verifier = self.verifier(owner_id)?;
        let context = RandomnessContext::new().with(keys::vehicle(vehicle_id));
        let field = |label: &str, value: u64| {
            self.encrypt_field(&verifier, &BigUint::from(value), &context.for_field(label))
        };

        let vehicle = EncryptedVehicleRecord {
            vehicle_id: vehicle_id.to_string(),
            vehicle_type: field("vehicle_type", data.vehicle_type)?,
            purchase_mileage: field("purchase_mileage", data.purchase_mileage)?,
            year: field("year", data.year)?,
            owner_id: owner_id.to_string(),
        };

        self.insert_new(&keys::vehicle(vehicle_id), &vehicle)?;
        log::info!("vehicle {} encrypted and added for {}", vehicle_id, owner_id);

        Ok(vehicle)
    }

    pub fn vehicle(&self, vehicle_id: &str) -> Result<EncryptedVehicleRecord, LedgerError> {
        self.load(&keys::vehicle(vehicle_id))
    }

    /// Moves a vehicle to `owner_id`. The ciphertexts stay as they are, so the new
    /// owner's verifier must share the modulus they were encrypted under.
    pub fn reassign_owner(
        &self,
        vehicle_id: &str,
        owner_id: &str,
    ) -> Result<EncryptedVehicleRecord, LedgerError> {
        let mut vehicle = self.vehicle(vehicle_id)?;
        let target = self.verifier(owner_id)?;

        if let Some(current) = self.find::<Verifier>(&keys::verifier(&vehicle.owner_id))? {
            if current.n() != target.n() {
                return Err(LedgerError::InvalidArguments(format!(
                    "vehicle {} is encrypted under the key of {}, which {} does not share",
                    vehicle_id, vehicle.owner_id, owner_id
                )));
            }
        }
        check_ciphertexts(&target, &vehicle.ciphertexts())?;

        log::info!("vehicle {}: owner {} -> {}", vehicle_id, vehicle.owner_id, owner_id);
        vehicle.owner_id = owner_id.to_string();
        self.save(&keys::vehicle(vehicle_id), &vehicle)?;

        Ok(vehicle)
    }

    pub fn vehicles_by_owner(&self, owner_id: &str) -> Result<Vec<EncryptedVehicleRecord>, LedgerError> {
        self.collect(&Selector::prefix(keys::VEHICLE).field_eq("ownerID", owner_id))
    }

    /// Removes a legacy `field` from every stored vehicle, returning how many
    /// records changed.
    pub fn strip_vehicle_field(&self, field: &str) -> Result<usize, LedgerError> {
        if VEHICLE_FIELDS.contains(&field) {
            return Err(LedgerError::InvalidArguments(format!(
                "{} is a required vehicle field",
                field
            )));
        }

        let mut changed = Vec::new();
        for entry in self.store.query(&Selector::prefix(keys::VEHICLE))? {
            let (key, bytes) = entry?;
            let mut fields: Map<String, Value> = serde_json::from_slice(&bytes)?;
            if fields.remove(field).is_some() {
                changed.push((key, fields));
            }
        }

        for (key, fields) in &changed {
            self.save(key, fields)?;
            log::info!("removed {} from {}", field, key);
        }

        Ok(changed.len())
    }
}

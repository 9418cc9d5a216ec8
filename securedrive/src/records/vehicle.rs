use securedrive_crypto::Ciphertext;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVehicleRecord {
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    pub vehicle_type: Ciphertext,
    pub purchase_mileage: Ciphertext,
    pub year: Ciphertext,
    #[serde(rename = "ownerID")]
    pub owner_id: String,
}

impl EncryptedVehicleRecord {
    pub fn ciphertexts(&self) -> [&Ciphertext; 3] {
        [&self.vehicle_type, &self.purchase_mileage, &self.year]
    }
}

/// Vehicle fields before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleData {
    pub vehicle_type: u64,
    pub purchase_mileage: u64,
    pub year: u64,
}

use securedrive_crypto::{Ciphertext, DecryptionHint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Stored with its ciphertext and hint, not decrypted yet.
    #[default]
    Pending,
    /// Decrypted and added to the monthly accumulator.
    Resolved,
}

/// Encrypted total premium of one trip, waiting for the two-party decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    #[serde(rename = "resultID")]
    pub result_id: String,
    #[serde(rename = "prime_totale")]
    pub total_premium: Ciphertext,
    /// `R = C mod N`, public.
    pub r: DecryptionHint,
    #[serde(rename = "tripID")]
    pub trip_id: String,
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    #[serde(default)]
    pub status: ResultStatus,
}

impl CalculationResult {
    pub fn is_resolved(&self) -> bool {
        self.status == ResultStatus::Resolved
    }
}

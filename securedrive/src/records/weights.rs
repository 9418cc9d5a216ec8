use serde::{Deserialize, Serialize};

/// Public pricing policy. Weights are scalar exponents on ciphertexts, so they
/// are non-negative; compliance is a credit because it is subtracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaWeights {
    #[serde(rename = "criteriaweightID")]
    pub weights_id: String,
    pub weight_traffic: u64,
    pub weight_speed: u64,
    pub weight_acceleration: u64,
    pub weight_braking: u64,
    pub weight_distance: u64,
    pub weight_zone: u64,
    pub weight_time: u64,
    /// PAYD scalar, applied to mileage.
    pub alpha: u64,
    /// PHYD scalar, applied to the behavioral index.
    pub beta: u64,
}

//! Typed ledger entities. Field names in JSON follow the stored asset layout
//! (`vehicleID`, `tripID`, `prime_totale`, ...); ciphertexts are decimal strings.

pub mod contract;
pub mod premium;
pub mod result;
pub mod trip;
pub mod vehicle;
pub mod weights;

pub use contract::InsuranceContract;
pub use premium::{MonthlyPremiumRecord, PremiumRecord};
pub use result::{CalculationResult, ResultStatus};
pub use trip::{EncryptedTripRecord, TripMetrics};
pub use vehicle::{EncryptedVehicleRecord, VehicleData};
pub use weights::CriteriaWeights;

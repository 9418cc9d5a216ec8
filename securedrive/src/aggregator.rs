//! # Premium aggregation over ciphertexts
//!
//! ```text
//! index = w_speed·speeding + w_accel·hard_accelerations + w_brake·emergency_brakes
//!       + w_distance·unsafe_distance + w_zone·high_risk_zones + w_time·night_driving
//!       - w_traffic·traffic_signal_compliance
//! total = vehicle_type + purchase_mileage + year + α·mileage + β·index
//! ```
//!
//! Every term is evaluated with the verifier's homomorphic operators; no metric
//! is decrypted. A negative index wraps around `N` and is read back with
//! [`securedrive_crypto::Verifier::decode_signed`].

use crate::keys;
use crate::records::{
    CalculationResult, CriteriaWeights, EncryptedTripRecord, EncryptedVehicleRecord,
    ResultStatus, TripMetrics, VehicleData,
};

use num_bigint::{BigInt, BigUint};
use securedrive_crypto::{Ciphertext, CryptoError, Verifier};

/// Steps 1 and 2: weighted penalties minus the weighted compliance credit.
pub fn behavioral_index(
    verifier: &Verifier,
    trip: &EncryptedTripRecord,
    weights: &CriteriaWeights,
) -> Result<Ciphertext, CryptoError> {
    let penalties = [
        (&trip.speeding, weights.weight_speed),
        (&trip.hard_accelerations, weights.weight_acceleration),
        (&trip.emergency_brakes, weights.weight_braking),
        (&trip.unsafe_distance, weights.weight_distance),
        (&trip.high_risk_zones, weights.weight_zone),
        (&trip.night_driving, weights.weight_time),
    ]
    .into_iter()
    .map(|(metric, weight)| verifier.homomorphic_multiplication(metric, &BigUint::from(weight)))
    .collect::<Result<Vec<_>, _>>()?;

    let penalty = verifier.homomorphic_sum(&penalties)?;
    let credit = verifier.homomorphic_multiplication(
        &trip.traffic_signal_compliance,
        &BigUint::from(weights.weight_traffic),
    )?;

    verifier.homomorphic_subtraction(&penalty, &credit)
}

/// Steps 3 to 5: vehicle fields plus the PAYD and PHYD terms.
pub fn total_premium(
    verifier: &Verifier,
    vehicle: &EncryptedVehicleRecord,
    trip: &EncryptedTripRecord,
    weights: &CriteriaWeights,
) -> Result<Ciphertext, CryptoError> {
    let index = behavioral_index(verifier, trip, weights)?;

    let payd = verifier.homomorphic_multiplication(&trip.mileage, &BigUint::from(weights.alpha))?;
    let phyd = verifier.homomorphic_multiplication(&index, &BigUint::from(weights.beta))?;

    verifier.homomorphic_sum(&[
        vehicle.vehicle_type.clone(),
        vehicle.purchase_mileage.clone(),
        vehicle.year.clone(),
        payd,
        phyd,
    ])
}

/// The encrypted total with its public hint `R`, ready to be stored as a
/// pending result under `result_<tripID>`.
pub fn calculate(
    verifier: &Verifier,
    vehicle: &EncryptedVehicleRecord,
    trip: &EncryptedTripRecord,
    weights: &CriteriaWeights,
) -> Result<CalculationResult, CryptoError> {
    let total = total_premium(verifier, vehicle, trip, weights)?;
    let r = verifier.compute_r(&total)?;

    log::debug!(
        "premium for trip {} of vehicle {} aggregated with weights {}",
        trip.trip_id,
        vehicle.vehicle_id,
        weights.weights_id
    );

    Ok(CalculationResult {
        result_id: keys::result(&trip.trip_id),
        total_premium: total,
        r,
        trip_id: trip.trip_id.clone(),
        vehicle_id: trip.vehicle_id.clone(),
        status: ResultStatus::Pending,
    })
}

/// Largest magnitude the total can reach when every encrypted field lies in
/// `[0, bound)`: the larger of the all-penalty and the all-credit extreme.
///
/// Totals at or beyond `N / 2` wrap around and decode to a wrong premium.
pub fn worst_case_total(weights: &CriteriaWeights, bound: &BigUint) -> BigUint {
    let penalty_weights: BigUint = [
        weights.weight_speed,
        weights.weight_acceleration,
        weights.weight_braking,
        weights.weight_distance,
        weights.weight_zone,
        weights.weight_time,
    ]
    .into_iter()
    .map(BigUint::from)
    .sum();
    let beta = BigUint::from(weights.beta);

    let highest = (BigUint::from(3u32) + BigUint::from(weights.alpha) + &beta * penalty_weights) * bound;
    let lowest = beta * BigUint::from(weights.weight_traffic) * bound;

    highest.max(lowest)
}

/// Behavioral index over plaintext metrics, for cross-checking decryptions.
pub fn plaintext_index(metrics: &TripMetrics, weights: &CriteriaWeights) -> i128 {
    let term = |weight: u64, metric: u64| i128::from(weight) * i128::from(metric);

    term(weights.weight_speed, metrics.speeding)
        + term(weights.weight_acceleration, metrics.hard_accelerations)
        + term(weights.weight_braking, metrics.emergency_brakes)
        + term(weights.weight_distance, metrics.unsafe_distance)
        + term(weights.weight_zone, metrics.high_risk_zones)
        + term(weights.weight_time, metrics.night_driving)
        - term(weights.weight_traffic, metrics.traffic_signal_compliance)
}

/// Total premium over plaintext inputs, the same formula as [`total_premium`].
/// Negative totals are `i128`; [`expected_plaintext`] maps them into `[0, N)`.
pub fn plaintext_formula(
    vehicle: &VehicleData,
    metrics: &TripMetrics,
    weights: &CriteriaWeights,
) -> i128 {
    i128::from(vehicle.vehicle_type)
        + i128::from(vehicle.purchase_mileage)
        + i128::from(vehicle.year)
        + i128::from(weights.alpha) * i128::from(metrics.mileage)
        + i128::from(weights.beta) * plaintext_index(metrics, weights)
}

/// The plaintext a correct decryption of [`total_premium`] yields.
pub fn expected_plaintext(
    verifier: &Verifier,
    vehicle: &VehicleData,
    metrics: &TripMetrics,
    weights: &CriteriaWeights,
) -> BigUint {
    verifier.encode_signed(&BigInt::from(plaintext_formula(vehicle, metrics, weights)))
}

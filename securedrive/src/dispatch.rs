//! # Invocation layer
//!
//! Maps a named operation with positional string arguments onto the [`Ledger`].
//! Mutations answer with an empty payload, queries with JSON.
//!
//! ```text
//! calculateInsurancePremium veh1 trip1 w1
//! decryptInsurancePremiumAndUpdateWithoutParams result_trip1
//! ```

use crate::errors::LedgerError;
use crate::ledger::Ledger;
use crate::records::trip::parse_date;
use crate::records::{
    CriteriaWeights, EncryptedTripRecord, EncryptedVehicleRecord, InsuranceContract, TripMetrics,
    VehicleData,
};
use crate::store::AssetStore;

use securedrive_crypto::codec::parse_decimal;
use securedrive_crypto::{Ciphertext, DecryptionShare};
use serde::Serialize;
use serde_json::json;

use std::str::FromStr;

/// Runs `function` against `ledger`.
///
/// # Errors
/// * `UnknownFunction` for a name outside the table below
/// * `InvalidArguments` for a wrong argument count or a malformed number
/// * whatever the ledger operation returns
pub fn dispatch<S: AssetStore>(
    ledger: &Ledger<S>,
    function: &str,
    args: &[String],
) -> Result<Vec<u8>, LedgerError> {
    log::debug!("{}({} args)", function, args.len());

    match function {
        "addVerifier" => {
            let [owner, n, n_square] = expect_args(function, args, ["OwnerID", "N", "NSquare"])?;
            ledger.add_verifier(owner, parse_decimal(n)?, parse_decimal(n_square)?)?;
            Ok(Vec::new())
        }
        "addDecryptor" => {
            let [owner, p, q, n, lambda] =
                expect_args(function, args, ["OwnerID", "P", "Q", "N", "Lambda"])?;
            ledger.add_decryptor(
                owner,
                parse_decimal(p)?,
                parse_decimal(q)?,
                parse_decimal(n)?,
                parse_decimal(lambda)?,
            )?;
            Ok(Vec::new())
        }
        "queryVerifier" => {
            let [owner] = expect_args(function, args, ["OwnerID"])?;
            to_json(&ledger.verifier(owner)?)
        }
        "queryDecryptor" => {
            let [owner] = expect_args(function, args, ["OwnerID"])?;
            to_json(&ledger.decryptor(owner)?)
        }
        "deleteVerifier" => {
            let [owner] = expect_args(function, args, ["OwnerID"])?;
            ledger.delete_verifier(owner)?;
            Ok(Vec::new())
        }
        "encrypt" => {
            let [owner, value] = expect_args(function, args, ["OwnerID", "Value"])?;
            to_json(&ledger.encrypt_value(owner, &parse_decimal(value)?)?)
        }

        "addEncryptedVehicleData" => {
            let [vehicle_id, vehicle_type, purchase_mileage, year, owner] = expect_args(
                function,
                args,
                ["VehicleID", "VehicleType", "PurchaseMileage", "Year", "OwnerID"],
            )?;
            ledger.add_encrypted_vehicle(EncryptedVehicleRecord {
                vehicle_id: vehicle_id.to_string(),
                vehicle_type: Ciphertext::from_decimal(vehicle_type)?,
                purchase_mileage: Ciphertext::from_decimal(purchase_mileage)?,
                year: Ciphertext::from_decimal(year)?,
                owner_id: owner.to_string(),
            })?;
            Ok(Vec::new())
        }
        "addVehicleData" => {
            let [vehicle_id, vehicle_type, purchase_mileage, year, owner] = expect_args(
                function,
                args,
                ["VehicleID", "VehicleType", "PurchaseMileage", "Year", "OwnerID"],
            )?;
            let data = VehicleData {
                vehicle_type: number("VehicleType", vehicle_type)?,
                purchase_mileage: number("PurchaseMileage", purchase_mileage)?,
                year: number("Year", year)?,
            };
            ledger.add_vehicle(vehicle_id, &data, owner)?;
            Ok(Vec::new())
        }
        "queryVehicleData" => {
            let [vehicle_id] = expect_args(function, args, ["VehicleID"])?;
            to_json(&ledger.vehicle(vehicle_id)?)
        }
        "addOwnerToVehicleData" => {
            let [vehicle_id, owner] = expect_args(function, args, ["VehicleID", "OwnerID"])?;
            ledger.reassign_owner(vehicle_id, owner)?;
            Ok(Vec::new())
        }
        "queryVehiclesByOwner" => {
            let [owner] = expect_args(function, args, ["OwnerID"])?;
            to_json(&ledger.vehicles_by_owner(owner)?)
        }
        "removeAgeFromEncryptedVehicleData" => {
            let [] = expect_args(function, args, [])?;
            let changed = ledger.strip_vehicle_field("age")?;
            log::info!("age removed from {} vehicles", changed);
            Ok(Vec::new())
        }

        "addEncryptedTripData" => {
            let [vehicle_id, trip_id, date, rest @ ..] = expect_args(function, args, TRIP_ARGS)?;
            let [speeding, accelerations, brakes, distance, zones, compliance, night, mileage] =
                rest.map(Ciphertext::from_decimal);
            ledger.add_encrypted_trip(EncryptedTripRecord {
                vehicle_id: vehicle_id.to_string(),
                trip_id: trip_id.to_string(),
                date: parse_date(date)?,
                speeding: speeding?,
                hard_accelerations: accelerations?,
                emergency_brakes: brakes?,
                unsafe_distance: distance?,
                high_risk_zones: zones?,
                traffic_signal_compliance: compliance?,
                night_driving: night?,
                mileage: mileage?,
            })?;
            Ok(Vec::new())
        }
        "addTripData" => {
            let [vehicle_id, trip_id, date, rest @ .., owner] =
                expect_args(function, args, PLAIN_TRIP_ARGS)?;
            let [speeding, accelerations, brakes, distance, zones, compliance, night, mileage] =
                rest;
            let metrics = TripMetrics {
                speeding: number("Speeding", speeding)?,
                hard_accelerations: number("HardAccelerations", accelerations)?,
                emergency_brakes: number("EmergencyBrakes", brakes)?,
                unsafe_distance: number("UnsafeDistance", distance)?,
                high_risk_zones: number("HighRiskZones", zones)?,
                traffic_signal_compliance: number("TrafficSignalCompliance", compliance)?,
                night_driving: number("NightDriving", night)?,
                mileage: number("Mileage", mileage)?,
            };
            ledger.add_trip(vehicle_id, trip_id, date, &metrics, owner)?;
            Ok(Vec::new())
        }
        "queryTripData" => {
            let [trip_id] = expect_args(function, args, ["TripID"])?;
            to_json(&ledger.trip(trip_id)?)
        }
        "queryTripsByVehicleID" => {
            let [vehicle_id] = expect_args(function, args, ["VehicleID"])?;
            to_json(&ledger.trips_by_vehicle(vehicle_id)?)
        }
        "deleteEncryptedTripData" => {
            let [trip_id] = expect_args(function, args, ["TripID"])?;
            ledger.delete_trip(trip_id)?;
            Ok(Vec::new())
        }

        "addCriteriaWeights" => {
            let [weights_id, traffic, speed, acceleration, braking, distance, zone, time, alpha, beta] =
                expect_args(
                    function,
                    args,
                    [
                        "CriteriaWeightsID",
                        "WeightTraffic",
                        "WeightSpeed",
                        "WeightAcceleration",
                        "WeightBraking",
                        "WeightDistance",
                        "WeightZone",
                        "WeightTime",
                        "Alpha",
                        "Beta",
                    ],
                )?;
            ledger.add_criteria_weights(CriteriaWeights {
                weights_id: weights_id.to_string(),
                weight_traffic: number("WeightTraffic", traffic)?,
                weight_speed: number("WeightSpeed", speed)?,
                weight_acceleration: number("WeightAcceleration", acceleration)?,
                weight_braking: number("WeightBraking", braking)?,
                weight_distance: number("WeightDistance", distance)?,
                weight_zone: number("WeightZone", zone)?,
                weight_time: number("WeightTime", time)?,
                alpha: number("Alpha", alpha)?,
                beta: number("Beta", beta)?,
            })?;
            Ok(Vec::new())
        }
        "queryCriteriaWeights" => {
            let [weights_id] = expect_args(function, args, ["CriteriaWeightsID"])?;
            to_json(&ledger.criteria_weights(weights_id)?)
        }
        "queryAllCriteriaWeights" => {
            let [] = expect_args(function, args, [])?;
            to_json(&ledger.all_criteria_weights()?)
        }

        "addInsuranceContract" => {
            let [contract_id, owner, vehicle_id, weights_id, start_month, start_year, end_month, end_year] =
                expect_args(
                    function,
                    args,
                    [
                        "ContractID",
                        "OwnerID",
                        "VehicleID",
                        "CriteriaWeightsID",
                        "StartMonth",
                        "StartYear",
                        "EndMonth",
                        "EndYear",
                    ],
                )?;
            ledger.add_contract(InsuranceContract {
                contract_id: contract_id.to_string(),
                owner_id: owner.to_string(),
                vehicle_id: vehicle_id.to_string(),
                criteria_weights_id: weights_id.to_string(),
                start_month: number("StartMonth", start_month)?,
                start_year: number("StartYear", start_year)?,
                end_month: number("EndMonth", end_month)?,
                end_year: number("EndYear", end_year)?,
            })?;
            Ok(Vec::new())
        }
        "queryInsuranceContract" => {
            let [contract_id] = expect_args(function, args, ["ContractID"])?;
            to_json(&ledger.contract(contract_id)?)
        }
        "queryInsuranceContractsByOwner" => {
            let [owner] = expect_args(function, args, ["OwnerID"])?;
            to_json(&ledger.contracts_by_owner(owner)?)
        }
        "queryAllInsuranceContracts" => {
            let [] = expect_args(function, args, [])?;
            to_json(&ledger.all_contracts()?)
        }
        "queryOwnerDetails" => {
            let [owner] = expect_args(function, args, ["OwnerID"])?;
            to_json(&ledger.owner_details(owner)?)
        }
        "queryMultipleOwnerDetails" => {
            if args.is_empty() {
                return Err(LedgerError::InvalidArguments(format!(
                    "{} expects at least one OwnerID",
                    function
                )));
            }
            let details = args
                .iter()
                .filter(|owner| !owner.is_empty())
                .map(|owner| ledger.owner_details(owner))
                .collect::<Result<Vec<_>, _>>()?;
            to_json(&details)
        }

        "calculateInsurancePremium" => {
            let [vehicle_id, trip_id, weights_id] =
                expect_args(function, args, ["VehicleID", "TripID", "CriteriaWeightsID"])?;
            to_json(&ledger.calculate_premium(vehicle_id, trip_id, weights_id)?)
        }
        "decryptInsurancePremiumAndUpdate" => {
            let [trip_id, r_prime] = expect_args(function, args, ["TripID", "RPrime"])?;
            let record = ledger.decrypt_premium(trip_id, &DecryptionShare::from_decimal(r_prime)?)?;
            to_json(&json!({ "decryptedPrime": record.premium }))
        }
        "decryptInsurancePremiumAndUpdateWithoutParams" => {
            let [result_id] = expect_args(function, args, ["ResultID"])?;
            let record = ledger.decrypt_premium_with_stored_decryptor(result_id)?;
            to_json(&json!({ "decryptedPrime": record.premium }))
        }
        "revealInsurancePremium" => {
            let [result_id] = expect_args(function, args, ["ResultID"])?;
            to_json(&json!({ "decryptedPrime": ledger.reveal_premium(result_id)? }))
        }
        "addMonthPrime" => {
            let [vehicle_id, month, year, premium] =
                expect_args(function, args, ["VehicleID", "Month", "Year", "Prime"])?;
            ledger.add_month_premium(
                vehicle_id,
                number("Month", month)?,
                number("Year", year)?,
                number("Prime", premium)?,
            )?;
            Ok(Vec::new())
        }
        "queryPrime" => {
            let [trip_id] = expect_args(function, args, ["TripID"])?;
            to_json(&ledger.premium(trip_id)?)
        }
        "queryMonthPrime" => {
            let [vehicle_id, month, year] =
                expect_args(function, args, ["VehicleID", "Month", "Year"])?;
            to_json(&ledger.month_premium(vehicle_id, number("Month", month)?, number("Year", year)?)?)
        }
        "queryPrimesByVehicleID" => {
            let [vehicle_id] = expect_args(function, args, ["VehicleID"])?;
            to_json(&ledger.premiums_by_vehicle(vehicle_id)?)
        }
        "queryEncryptedCalculationResultsByVehicleID" => {
            let [vehicle_id] = expect_args(function, args, ["VehicleID"])?;
            to_json(&ledger.results_by_vehicle(vehicle_id)?)
        }
        "queryEncryptedCalculationResult" => {
            let [result_id] = expect_args(function, args, ["ResultID"])?;
            to_json(&ledger.calculation_result(result_id)?)
        }

        _ => Err(LedgerError::UnknownFunction(function.to_string())),
    }
}

const TRIP_ARGS: [&str; 11] = [
    "VehicleID",
    "TripID",
    "Date",
    "Speeding",
    "HardAccelerations",
    "EmergencyBrakes",
    "UnsafeDistance",
    "HighRiskZones",
    "TrafficSignalCompliance",
    "NightDriving",
    "Mileage",
];

const PLAIN_TRIP_ARGS: [&str; 12] = [
    "VehicleID",
    "TripID",
    "Date",
    "Speeding",
    "HardAccelerations",
    "EmergencyBrakes",
    "UnsafeDistance",
    "HighRiskZones",
    "TrafficSignalCompliance",
    "NightDriving",
    "Mileage",
    "OwnerID",
];

/// Exactly `N` arguments, named by `names` in the error.
fn expect_args<'a, const N: usize>(
    function: &str,
    args: &'a [String],
    names: [&str; N],
) -> Result<[&'a str; N], LedgerError> {
    if args.len() != N {
        return Err(LedgerError::InvalidArguments(format!(
            "{} expects {} arguments ({}), got {}",
            function,
            N,
            names.join(", "),
            args.len()
        )));
    }

    Ok(std::array::from_fn(|i| args[i].as_str()))
}

/// Decimal integer with an optional leading `-` and nothing else.
fn number<T: FromStr>(name: &str, value: &str) -> Result<T, LedgerError> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let invalid = || LedgerError::InvalidArguments(format!("{} is not a valid number: {:?}", name, value));

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    value.parse().map_err(|_| invalid())
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    Ok(serde_json::to_vec(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_is_strict() -> Result<(), LedgerError> {
        assert_eq!(number::<u64>("x", "42")?, 42);
        assert_eq!(number::<i64>("x", "-7")?, -7);
        assert_eq!(number::<i32>("x", "2024")?, 2024);

        for bad in ["", "-", "+5", " 5", "5 ", "1e3", "0x10", "1_000"] {
            assert!(number::<i64>("x", bad).is_err(), "{:?} accepted", bad);
        }
        assert!(number::<u64>("x", "-1").is_err());
        assert!(number::<u32>("x", "4294967296").is_err());
        Ok(())
    }

    #[test]
    fn test_argument_count() {
        let args = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(expect_args("f", &args, ["A", "B"]), Ok(["a", "b"])));

        let err = expect_args("f", &args, ["A"]);
        assert!(matches!(&err, Err(LedgerError::InvalidArguments(msg)) if msg.contains("A")));
        assert!(expect_args("f", &args, []).is_err());
    }
}

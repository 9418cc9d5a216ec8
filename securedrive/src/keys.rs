//! Store key namespaces, one prefix per entity kind.

pub const VEHICLE: &str = "vehicle_";
pub const TRIP: &str = "trip_";
pub const CRITERIA_WEIGHTS: &str = "criteriaweights_";
pub const VERIFIER: &str = "verifier_";
pub const DECRYPTOR: &str = "decryptor_";
pub const RESULT: &str = "result_";
pub const PREMIUM: &str = "prime_";
pub const MONTH_PREMIUM: &str = "monthprime_";
pub const CONTRACT: &str = "contract_";

pub fn vehicle(vehicle_id: &str) -> String {
    format!("{VEHICLE}{vehicle_id}")
}

pub fn trip(trip_id: &str) -> String {
    format!("{TRIP}{trip_id}")
}

pub fn criteria_weights(weights_id: &str) -> String {
    format!("{CRITERIA_WEIGHTS}{weights_id}")
}

pub fn verifier(owner_id: &str) -> String {
    format!("{VERIFIER}{owner_id}")
}

pub fn decryptor(owner_id: &str) -> String {
    format!("{DECRYPTOR}{owner_id}")
}

/// Also the result's identifier.
pub fn result(trip_id: &str) -> String {
    format!("{RESULT}{trip_id}")
}

pub fn premium(trip_id: &str) -> String {
    format!("{PREMIUM}{trip_id}")
}

pub fn month_premium(vehicle_id: &str, year: i32, month: u32) -> String {
    format!("{MONTH_PREMIUM}{vehicle_id}_{year}_{month}")
}

pub fn contract(contract_id: &str) -> String {
    format!("{CONTRACT}{contract_id}")
}

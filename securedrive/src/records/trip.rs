use crate::errors::LedgerError;

use chrono::{Datelike, NaiveDate};
use securedrive_crypto::Ciphertext;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| LedgerError::InvalidDate(format!("{:?} is not YYYY-MM-DD: {}", date, e)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedTripRecord {
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    #[serde(rename = "tripID")]
    pub trip_id: String,
    pub date: NaiveDate,
    pub speeding: Ciphertext,
    pub hard_accelerations: Ciphertext,
    pub emergency_brakes: Ciphertext,
    pub unsafe_distance: Ciphertext,
    pub high_risk_zones: Ciphertext,
    pub traffic_signal_compliance: Ciphertext,
    pub night_driving: Ciphertext,
    pub mileage: Ciphertext,
}

impl EncryptedTripRecord {
    /// `(year, month)` of the trip, the monthly accumulator's key.
    pub fn year_month(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }

    pub fn ciphertexts(&self) -> [&Ciphertext; 8] {
        [
            &self.speeding,
            &self.hard_accelerations,
            &self.emergency_brakes,
            &self.unsafe_distance,
            &self.high_risk_zones,
            &self.traffic_signal_compliance,
            &self.night_driving,
            &self.mileage,
        ]
    }
}

/// Trip telemetry before encryption. Counts and distances are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripMetrics {
    pub speeding: u64,
    pub hard_accelerations: u64,
    pub emergency_brakes: u64,
    pub unsafe_distance: u64,
    pub high_risk_zones: u64,
    pub traffic_signal_compliance: u64,
    pub night_driving: u64,
    pub mileage: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() -> Result<(), LedgerError> {
        let date = parse_date("2024-11-03")?;
        assert_eq!((date.year(), date.month(), date.day()), (2024, 11, 3));

        assert!(matches!(parse_date("2024-13-01"), Err(LedgerError::InvalidDate(_))));
        assert!(matches!(parse_date("03/11/2024"), Err(LedgerError::InvalidDate(_))));
        assert!(matches!(parse_date(""), Err(LedgerError::InvalidDate(_))));
        Ok(())
    }

    #[test]
    fn test_date_is_stored_as_iso_string() -> Result<(), LedgerError> {
        let c = Ciphertext::from_decimal("7")?;
        let trip = EncryptedTripRecord {
            vehicle_id: "v1".to_string(),
            trip_id: "t1".to_string(),
            date: parse_date("2024-02-29")?,
            speeding: c.clone(),
            hard_accelerations: c.clone(),
            emergency_brakes: c.clone(),
            unsafe_distance: c.clone(),
            high_risk_zones: c.clone(),
            traffic_signal_compliance: c.clone(),
            night_driving: c.clone(),
            mileage: c,
        };

        let json = serde_json::to_value(&trip)?;
        assert_eq!(json["date"], "2024-02-29");
        assert_eq!(json["vehicleID"], "v1");
        assert_eq!(json["speeding"], "7");
        assert_eq!(trip.year_month(), (2024, 2));
        Ok(())
    }
}

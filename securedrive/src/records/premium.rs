use crate::errors::LedgerError;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decrypted premium of one trip. Negative values are credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRecord {
    #[serde(rename = "tripID")]
    pub trip_id: String,
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    pub date: NaiveDate,
    #[serde(rename = "prime")]
    pub premium: i64,
}

/// Sum of the premiums of one vehicle over one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPremiumRecord {
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    pub month: u32,
    pub year: i32,
    #[serde(rename = "month_prime")]
    pub premium: i64,
}

impl MonthlyPremiumRecord {
    pub fn try_with(
        vehicle_id: impl Into<String>,
        year: i32,
        month: u32,
        premium: i64,
    ) -> Result<Self, LedgerError> {
        check_month(month)?;

        Ok(Self {
            vehicle_id: vehicle_id.into(),
            month,
            year,
            premium,
        })
    }

    pub fn accumulate(&mut self, premium: i64) -> Result<(), LedgerError> {
        self.premium = self.premium.checked_add(premium).ok_or_else(|| {
            LedgerError::PlaintextOutOfBounds(format!(
                "monthly premium of {} for {}-{} overflows",
                self.vehicle_id, self.year, self.month
            ))
        })?;

        Ok(())
    }
}

pub fn check_month(month: u32) -> Result<(), LedgerError> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::InvalidArguments(format!(
            "month must be between 1 and 12, got {}",
            month
        )));
    }

    Ok(())
}

use crate::errors::LedgerError;
use crate::records::premium::check_month;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceContract {
    #[serde(rename = "contractID")]
    pub contract_id: String,
    #[serde(rename = "ownerID")]
    pub owner_id: String,
    #[serde(rename = "vehicleID")]
    pub vehicle_id: String,
    #[serde(rename = "criteriaWeightsID")]
    pub criteria_weights_id: String,
    pub start_month: u32,
    pub start_year: i32,
    pub end_month: u32,
    pub end_year: i32,
}

impl InsuranceContract {
    /// Months are `1..=12` and the period does not end before it starts.
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_month(self.start_month)?;
        check_month(self.end_month)?;

        if (self.end_year, self.end_month) < (self.start_year, self.start_month) {
            return Err(LedgerError::InvalidArguments(format!(
                "contract {} ends {:02}-{:04}, before it starts {:02}-{:04}",
                self.contract_id, self.end_month, self.end_year, self.start_month, self.start_year
            )));
        }

        Ok(())
    }

    /// `MM-YYYY`
    pub fn start_date(&self) -> String {
        format!("{:02}-{:04}", self.start_month, self.start_year)
    }

    pub fn end_date(&self) -> String {
        format!("{:02}-{:04}", self.end_month, self.end_year)
    }
}

use super::Ledger;

use crate::errors::LedgerError;
use crate::keys;
use crate::records::{CriteriaWeights, EncryptedVehicleRecord, InsuranceContract, PremiumRecord};
use crate::store::{AssetStore, Selector};

use serde::{Deserialize, Serialize};

/// Everything the ledger holds for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDetails {
    #[serde(rename = "Vehicles")]
    pub vehicles: Vec<VehicleDetails>,
    #[serde(rename = "Primes")]
    pub premiums: Vec<PremiumRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetails {
    #[serde(rename = "VehicleID")]
    pub vehicle_id: String,
    #[serde(rename = "VehicleDetails")]
    pub vehicle: EncryptedVehicleRecord,
    #[serde(rename = "Contracts")]
    pub contracts: Vec<ContractDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDetails {
    #[serde(rename = "ContractID")]
    pub contract_id: String,
    /// `MM-YYYY`
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "EndDate")]
    pub end_date: String,
    #[serde(rename = "CriteriaWeightsID")]
    pub criteria_weights_id: String,
    /// `None` when the referenced weights are no longer stored.
    #[serde(rename = "CriteriaWeights")]
    pub criteria_weights: Option<CriteriaWeights>,
}

impl<S: AssetStore> Ledger<S> {
    /// Stores a contract binding an owner's vehicle to a pricing policy.
    pub fn add_contract(&self, contract: InsuranceContract) -> Result<(), LedgerError> {
        contract.validate()?;

        let vehicle = self.vehicle(&contract.vehicle_id)?;
        if vehicle.owner_id != contract.owner_id {
            return Err(LedgerError::InvalidArguments(format!(
                "{} does not own vehicle {}",
                contract.owner_id, contract.vehicle_id
            )));
        }
        self.require(&keys::criteria_weights(&contract.criteria_weights_id))?;

        self.insert_new(&keys::contract(&contract.contract_id), &contract)?;
        log::info!(
            "contract {} for vehicle {} runs {} to {}",
            contract.contract_id,
            contract.vehicle_id,
            contract.start_date(),
            contract.end_date()
        );

        Ok(())
    }

    pub fn contract(&self, contract_id: &str) -> Result<InsuranceContract, LedgerError> {
        self.load(&keys::contract(contract_id))
    }

    pub fn contracts_by_owner(&self, owner_id: &str) -> Result<Vec<InsuranceContract>, LedgerError> {
        self.collect(&Selector::prefix(keys::CONTRACT).field_eq("ownerID", owner_id))
    }

    pub fn all_contracts(&self) -> Result<Vec<InsuranceContract>, LedgerError> {
        self.collect(&Selector::prefix(keys::CONTRACT))
    }

    /// Vehicles of `owner_id` with their contracts and weights, plus the
    /// premiums settled for those vehicles.
    pub fn owner_details(&self, owner_id: &str) -> Result<OwnerDetails, LedgerError> {
        let mut vehicles = Vec::new();
        let mut premiums = Vec::new();

        for vehicle in self.vehicles_by_owner(owner_id)? {
            let selector = Selector::prefix(keys::CONTRACT)
                .field_eq("ownerID", owner_id)
                .field_eq("vehicleID", vehicle.vehicle_id.as_str());
            let contracts = self
                .collect::<InsuranceContract>(&selector)?
                .into_iter()
                .map(|contract| self.contract_details(contract))
                .collect::<Result<Vec<_>, _>>()?;

            premiums.extend(self.premiums_by_vehicle(&vehicle.vehicle_id)?);
            vehicles.push(VehicleDetails {
                vehicle_id: vehicle.vehicle_id.clone(),
                vehicle,
                contracts,
            });
        }

        Ok(OwnerDetails { vehicles, premiums })
    }

    fn contract_details(&self, contract: InsuranceContract) -> Result<ContractDetails, LedgerError> {
        let criteria_weights = self.find(&keys::criteria_weights(&contract.criteria_weights_id))?;

        Ok(ContractDetails {
            start_date: contract.start_date(),
            end_date: contract.end_date(),
            contract_id: contract.contract_id,
            criteria_weights_id: contract.criteria_weights_id,
            criteria_weights,
        })
    }
}

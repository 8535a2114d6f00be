//! The ordered list of contracts a run deploys

use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    constants::{
        AAVE_ADDRESSES_PROVIDER, FLASH_LOAN_KEY, FLASH_LOAN_NAME, FLASH_LOAN_SOURCE,
        FUND_CONTROLLER_KEY, FUND_CONTROLLER_NAME, FUND_CONTROLLER_SOURCE, FUND_CONTROLLER_TIERS,
        OWNER_ADDRESS, QUICKSWAP_ROUTER, SUSHISWAP_ROUTER, UNISWAP_V3_ROUTER,
    },
    errors::ScriptError,
    types::{ConstructorArg, ContractId, DeploymentSpec},
};

/// An ordered list of deployments in which every back-reference points at an
/// earlier entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// The deployments, in the order they are made
    contracts: Vec<DeploymentSpec>,
}

impl DeploymentPlan {
    /// Build a plan, checking that keys are unique and that references only
    /// point backwards
    pub fn new(contracts: Vec<DeploymentSpec>) -> Result<Self, ScriptError> {
        let plan = Self { contracts };
        plan.validate()?;
        Ok(plan)
    }

    /// Read a plan from a JSON file of the form `{"contracts": [...]}`
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;
        let plan: Self = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;

        plan.validate()?;
        Ok(plan)
    }

    /// The fund controller, then the flash loan authority wired to it
    pub fn boomerang() -> Self {
        let fund_controller = DeploymentSpec {
            key: FUND_CONTROLLER_KEY.to_string(),
            contract: ContractId {
                source: FUND_CONTROLLER_SOURCE.to_string(),
                name: FUND_CONTROLLER_NAME.to_string(),
            },
            args: vec![
                ConstructorArg::literal(OWNER_ADDRESS),
                ConstructorArg::literal(json!(FUND_CONTROLLER_TIERS)),
            ],
        };

        let flash_loan = DeploymentSpec {
            key: FLASH_LOAN_KEY.to_string(),
            contract: ContractId {
                source: FLASH_LOAN_SOURCE.to_string(),
                name: FLASH_LOAN_NAME.to_string(),
            },
            args: vec![
                ConstructorArg::literal(AAVE_ADDRESSES_PROVIDER),
                ConstructorArg::literal(UNISWAP_V3_ROUTER),
                ConstructorArg::literal(QUICKSWAP_ROUTER),
                ConstructorArg::literal(SUSHISWAP_ROUTER),
                ConstructorArg::reference(FUND_CONTROLLER_KEY),
                ConstructorArg::literal(OWNER_ADDRESS),
            ],
        };

        Self {
            contracts: vec![fund_controller, flash_loan],
        }
    }

    /// The deployments, in order
    pub fn contracts(&self) -> &[DeploymentSpec] {
        &self.contracts
    }

    /// The identifiers of every contract the plan deploys
    pub fn contract_ids(&self) -> impl Iterator<Item = &ContractId> {
        self.contracts.iter().map(|spec| &spec.contract)
    }

    /// Check that the plan is non-empty, keys are unique, and references
    /// only point at earlier keys
    fn validate(&self) -> Result<(), ScriptError> {
        if self.contracts.is_empty() {
            return Err(ScriptError::Config("deployment plan is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for spec in &self.contracts {
            if let Some(reference) = spec.references().find(|r| !seen.contains(r)) {
                return Err(ScriptError::UnresolvedReference {
                    spec: spec.key.clone(),
                    reference: reference.to_string(),
                });
            }

            if !seen.insert(spec.key.as_str()) {
                return Err(ScriptError::Config(format!(
                    "duplicate deployment key `{}`",
                    spec.key
                )));
            }
        }

        Ok(())
    }
}

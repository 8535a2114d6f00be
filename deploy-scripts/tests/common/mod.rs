//! Fixtures shared by the integration tests

use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use alloy::primitives::{hex, Address, Bytes, TxHash};
use async_trait::async_trait;
use deploy_scripts::{
    client::{ContractDeployer, DeployReceipt},
    errors::DeployFailure,
    plan::DeploymentPlan,
};
use eyre::Result;
use serde_json::{json, Value};
use tempfile::TempDir;

/// The creation bytecode of every fixture contract
pub const FIXTURE_BYTECODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];

/// The confirmation timeout a timed-out mock deployment reports
pub const CONFIRMATION_TIMEOUT_SECS: u64 = 300;

/// How a mock deployment fails
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// The creation transaction is mined but reverts
    Revert,
    /// The creation transaction is never confirmed
    Timeout,
}

/// A deployer that hands out sequential addresses and records every
/// creation code it is sent
#[derive(Default)]
pub struct MockDeployer {
    /// The creation codes sent, in order
    pub sent: Mutex<Vec<Bytes>>,
    /// The number of calls after which deployments fail, and how
    pub fail_after: Option<(usize, Failure)>,
    /// The number of deployments attempted
    calls: AtomicUsize,
}

impl MockDeployer {
    /// A deployer whose deployments succeed until `n` have been made, then
    /// revert
    pub fn reverting_after(n: usize) -> Self {
        Self {
            fail_after: Some((n, Failure::Revert)),
            ..Default::default()
        }
    }

    /// A deployer whose deployments succeed until `n` have been made, then
    /// are never confirmed
    pub fn timing_out_after(n: usize) -> Self {
        Self {
            fail_after: Some((n, Failure::Timeout)),
            ..Default::default()
        }
    }

    /// The address the `i`th (zero-based) deployment is made at
    pub fn address_of(i: usize) -> Address {
        Address::with_last_byte(0x10 + i as u8)
    }

    /// The number of deployments attempted
    pub fn num_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractDeployer for MockDeployer {
    fn address(&self) -> Address {
        Address::with_last_byte(0xff)
    }

    async fn deploy_contract(&self, creation_code: Bytes) -> Result<DeployReceipt, DeployFailure> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(creation_code);

        let tx_hash = TxHash::with_last_byte(i as u8);
        match self.fail_after {
            Some((n, Failure::Revert)) if i >= n => Err(DeployFailure::Reverted(tx_hash)),
            Some((n, Failure::Timeout)) if i >= n => {
                Err(DeployFailure::Timeout(Duration::from_secs(CONFIRMATION_TIMEOUT_SECS)))
            }
            _ => Ok(DeployReceipt {
                address: Self::address_of(i),
                tx_hash,
            }),
        }
    }
}

/// A build-output directory holding artifacts for the Boomerang contracts
pub fn boomerang_artifacts() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let plan = DeploymentPlan::boomerang();
    let [fund_controller, flash_loan] = plan.contracts() else {
        eyre::bail!("expected two contracts in the Boomerang plan");
    };

    write_artifact(
        dir.path(),
        &fund_controller.contract.source,
        &fund_controller.contract.name,
        json!([
            { "name": "owner", "type": "address", "internalType": "address" },
            { "name": "tiers", "type": "uint256[]", "internalType": "uint256[]" },
        ]),
    )?;

    let flash_loan_inputs: Vec<Value> = [
        "addressesProvider",
        "uniswapRouter",
        "quickswapRouter",
        "sushiswapRouter",
        "fundController",
        "owner",
    ]
    .iter()
    .map(|name| json!({ "name": name, "type": "address", "internalType": "address" }))
    .collect();
    write_artifact(
        dir.path(),
        &flash_loan.contract.source,
        &flash_loan.contract.name,
        Value::Array(flash_loan_inputs),
    )?;

    Ok(dir)
}

/// The build-info file every fixture artifact points at
const BUILD_INFO_FILE: &str = "fixture.json";

/// Write a Hardhat artifact, debug file and build-info for a contract
/// with a constructor taking `inputs`
pub fn write_artifact(root: &Path, source: &str, name: &str, inputs: Value) -> Result<()> {
    let contract_dir = root.join("contracts").join(source);
    fs::create_dir_all(&contract_dir)?;

    let bytecode = format!("0x{}", hex::encode(FIXTURE_BYTECODE));
    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": name,
        "sourceName": format!("contracts/{source}"),
        "abi": [{ "type": "constructor", "stateMutability": "nonpayable", "inputs": inputs }],
        "bytecode": bytecode,
        "deployedBytecode": bytecode,
        "linkReferences": {},
        "deployedLinkReferences": {},
    });
    fs::write(contract_dir.join(format!("{name}.json")), artifact.to_string())?;

    let dbg = json!({
        "_format": "hh-sol-dbg-1",
        "buildInfo": format!("../../build-info/{BUILD_INFO_FILE}"),
    });
    fs::write(contract_dir.join(format!("{name}.dbg.json")), dbg.to_string())?;

    write_build_info(root, source)
}

/// Add `source` to the build-info every fixture artifact points at, creating
/// it on first use
fn write_build_info(root: &Path, source: &str) -> Result<()> {
    let build_info_dir = root.join("build-info");
    fs::create_dir_all(&build_info_dir)?;
    let path = build_info_dir.join(BUILD_INFO_FILE);

    let mut build_info: Value = if path.exists() {
        serde_json::from_str(&fs::read_to_string(&path)?)?
    } else {
        json!({
            "_format": "hh-sol-build-info-1",
            "solcVersion": "0.8.19",
            "solcLongVersion": "0.8.19+commit.7dd6d404",
            "input": {
                "language": "Solidity",
                "sources": {},
                "settings": { "optimizer": { "enabled": true, "runs": 200 } },
            },
        })
    };
    build_info["input"]["sources"][format!("contracts/{source}")] =
        json!({ "content": "// SPDX-License-Identifier: MIT" });
    fs::write(path, build_info.to_string())?;

    Ok(())
}

//! Fixtures shared by the unit tests

use std::{fs, path::Path};

use serde_json::{json, Value};

use crate::{
    constants::{ARTIFACTS_CONTRACTS_DIR, ARTIFACT_EXTENSION, DBG_EXTENSION},
    types::ContractId,
};

/// The build-info file every fixture artifact points at
const BUILD_INFO_FILE: &str = "fixture.json";

/// Write a Hardhat artifact, debug file and build-info for `id` under `root`,
/// with a constructor taking `inputs`
pub fn write_artifact(root: &Path, id: &ContractId, inputs: Value, bytecode: &str) {
    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": id.name,
        "sourceName": format!("contracts/{}", id.source),
        "abi": [{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": inputs,
        }],
        "bytecode": bytecode,
        "deployedBytecode": bytecode,
        "linkReferences": {},
        "deployedLinkReferences": {},
    });
    write_raw_artifact(root, id, &artifact.to_string());

    let dir = root.join(ARTIFACTS_CONTRACTS_DIR).join(&id.source);
    let dbg = json!({
        "_format": "hh-sol-dbg-1",
        "buildInfo": format!("../../build-info/{}", BUILD_INFO_FILE),
    });
    fs::write(dir.join(format!("{}.{}", id.name, DBG_EXTENSION)), dbg.to_string()).unwrap();

    write_build_info(root, &id.source);
}

/// Add `source` to the build-info every fixture artifact points at, creating
/// it on first use
fn write_build_info(root: &Path, source: &str) {
    let build_info_dir = root.join("build-info");
    fs::create_dir_all(&build_info_dir).unwrap();
    let path = build_info_dir.join(BUILD_INFO_FILE);

    let mut build_info: Value = match fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap(),
        Err(_) => json!({
            "_format": "hh-sol-build-info-1",
            "solcVersion": "0.8.19",
            "solcLongVersion": "0.8.19+commit.7dd6d404",
            "input": {
                "language": "Solidity",
                "sources": {},
                "settings": { "optimizer": { "enabled": true, "runs": 200 } },
            },
        }),
    };
    build_info["input"]["sources"][format!("contracts/{source}")] =
        json!({ "content": "// SPDX-License-Identifier: MIT" });
    fs::write(path, build_info.to_string()).unwrap();
}

/// Write raw contents to the artifact path of `id` under `root`
pub fn write_raw_artifact(root: &Path, id: &ContractId, contents: &str) {
    let dir = root.join(ARTIFACTS_CONTRACTS_DIR).join(&id.source);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.{}", id.name, ARTIFACT_EXTENSION)), contents).unwrap();
}

/// The constructor inputs of a contract taking `n` addresses
pub fn address_inputs(n: usize) -> Value {
    (0..n)
        .map(|i| {
            json!({ "name": format!("addr{i}"), "type": "address", "internalType": "address" })
        })
        .collect()
}

//! Reading & writing the `deployments.json` record of deployed addresses
//!
//! The file has the form `{"deployments": {"<key>": "0x..", ...}}`. Writes
//! merge into an existing file, so records from earlier runs and other keys
//! are kept.

use std::{fs, path::Path, str::FromStr};

use alloy::primitives::Address;
use serde_json::{Map, Value};

use crate::{
    constants::DEPLOYMENTS_KEY,
    errors::ScriptError,
    types::{AddressBook, DeployedContract},
};

/// Read every address recorded in the deployments file
pub fn read_deployments(path: &Path) -> Result<AddressBook, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))?;
    let parsed: Value = serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))?;

    let Some(entries) = parsed.get(DEPLOYMENTS_KEY) else {
        return Ok(AddressBook::new());
    };
    let entries = entries.as_object().ok_or_else(|| {
        ScriptError::ReadDeployments(format!("`{}` is not an object", DEPLOYMENTS_KEY))
    })?;

    entries
        .iter()
        .map(|(key, value)| {
            let address = value
                .as_str()
                .and_then(|s| Address::from_str(s).ok())
                .ok_or_else(|| {
                    ScriptError::ReadDeployments(format!("invalid address for `{}`", key))
                })?;

            Ok((key.clone(), address))
        })
        .collect()
}

/// Record the addresses of the given contracts in the deployments file,
/// creating it if it does not exist
pub fn write_deployments(path: &Path, deployed: &[DeployedContract]) -> Result<(), ScriptError> {
    let mut parsed = if path.exists() {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))?
    } else {
        Value::Object(Map::new())
    };

    let root = parsed.as_object_mut().ok_or_else(|| {
        ScriptError::WriteDeployments(format!("{} is not a JSON object", path.display()))
    })?;
    let entries = root
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ScriptError::WriteDeployments(format!("`{}` is not an object", DEPLOYMENTS_KEY))
        })?;

    for contract in deployed {
        entries.insert(contract.key.clone(), Value::String(contract.address.to_string()));
    }

    let contents = serde_json::to_string_pretty(&parsed)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(path, contents)
        .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))
}

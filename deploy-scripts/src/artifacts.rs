//! Loading of Hardhat compilation artifacts
//!
//! Artifacts live at `<root>/contracts/<Source.sol>/<Contract>.json`, next to a
//! `<Contract>.dbg.json` file pointing at the build-info of the compilation
//! that produced them.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    constants::{ARTIFACTS_CONTRACTS_DIR, ARTIFACT_EXTENSION, DBG_EXTENSION},
    errors::ScriptError,
    types::ContractId,
};

/// A compiled contract: its interface and creation bytecode
#[derive(Debug, Clone, PartialEq)]
pub struct ContractArtifact {
    /// The identifier the artifact was loaded by
    pub id: ContractId,
    /// The fully qualified name, `<sourceName>:<contractName>`
    pub fully_qualified_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

/// The compiler version and input of the compilation that produced an artifact
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// The full compiler version, e.g. `0.8.19+commit.7dd6d404`
    pub solc_long_version: String,
    /// The standard-JSON compiler input
    pub input: Value,
}

/// The subset of a Hardhat artifact we read
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    /// The contract name
    contract_name: String,
    /// The source file, relative to the project root
    source_name: String,
    /// The contract ABI
    abi: JsonAbi,
    /// The hex-encoded creation bytecode
    bytecode: String,
}

/// The subset of a Hardhat debug file we read
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatDebugFile {
    /// The build-info path, relative to the debug file
    build_info: PathBuf,
}

/// Reads artifacts out of a Hardhat build-output directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    /// The build-output directory, usually `./artifacts`
    root: PathBuf,
}

impl ArtifactLoader {
    /// A loader reading from the given build-output directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The path of the artifact file for the given contract
    pub fn artifact_path(&self, id: &ContractId) -> PathBuf {
        self.contract_dir(id).join(format!("{}.{}", id.name, ARTIFACT_EXTENSION))
    }

    /// The path of the debug file for the given contract
    fn dbg_path(&self, id: &ContractId) -> PathBuf {
        self.contract_dir(id).join(format!("{}.{}", id.name, DBG_EXTENSION))
    }

    /// The directory holding the artifacts of the given contract's source file
    fn contract_dir(&self, id: &ContractId) -> PathBuf {
        self.root.join(ARTIFACTS_CONTRACTS_DIR).join(&id.source)
    }

    /// Load the artifact for the given contract
    pub fn load(&self, id: &ContractId) -> Result<ContractArtifact, ScriptError> {
        let path = self.artifact_path(id);
        debug!("Loading artifact for {} from {}", id, path.display());
        let artifact: HardhatArtifact = read_json(&path)?;

        let bytecode = Bytes::from_str(&artifact.bytecode).map_err(|e| {
            ScriptError::ArtifactNotFound(format!("{}: invalid bytecode: {}", path.display(), e))
        })?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactNotFound(format!(
                "{}: no bytecode, {} is abstract or an interface",
                path.display(),
                id
            )));
        }

        Ok(ContractArtifact {
            id: id.clone(),
            fully_qualified_name: format!("{}:{}", artifact.source_name, artifact.contract_name),
            abi: artifact.abi,
            bytecode,
        })
    }

    /// Load the artifacts for all of the given contracts
    pub fn load_all<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ContractId>,
    ) -> Result<Artifacts, ScriptError> {
        let mut artifacts = Artifacts::default();
        for id in ids {
            if !artifacts.0.contains_key(id) {
                artifacts.insert(self.load(id)?);
            }
        }

        Ok(artifacts)
    }

    /// Load the build-info of the compilation that produced the given contract
    pub fn load_build_info(&self, id: &ContractId) -> Result<BuildInfo, ScriptError> {
        let dbg_path = self.dbg_path(id);
        let dbg: HardhatDebugFile = read_json(&dbg_path)?;

        // The build-info path is relative to the debug file
        let build_info_path = self.contract_dir(id).join(dbg.build_info);
        debug!("Loading build-info for {} from {}", id, build_info_path.display());
        read_json(&build_info_path)
    }
}

/// Artifacts loaded up front, by contract identifier
#[derive(Debug, Clone, Default)]
pub struct Artifacts(HashMap<ContractId, ContractArtifact>);

impl Artifacts {
    /// Add an artifact
    pub fn insert(&mut self, artifact: ContractArtifact) {
        self.0.insert(artifact.id.clone(), artifact);
    }

    /// The artifact for the given contract
    pub fn get(&self, id: &ContractId) -> Result<&ContractArtifact, ScriptError> {
        self.0
            .get(id)
            .ok_or_else(|| ScriptError::ArtifactNotFound(format!("{} was not loaded", id)))
    }
}

/// Read and parse a JSON file, mapping every failure to `ArtifactNotFound`
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {}", path.display(), e)))
}

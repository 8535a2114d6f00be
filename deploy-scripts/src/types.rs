//! Type definitions used throughout the scripts

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ScriptError;

/// Identifies a compiled contract as `<SourceFile.sol>:<ContractName>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractId {
    /// The source file the contract is defined in, e.g. `Token.sol`
    pub source: String,
    /// The name of the contract within the source file
    pub name: String,
}

impl FromStr for ContractId {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, name) = s.rsplit_once(':').ok_or_else(|| {
            ScriptError::Config(format!("contract `{s}` is not of the form `File.sol:Name`"))
        })?;

        if source.is_empty() || name.is_empty() {
            return Err(ScriptError::Config(format!(
                "contract `{s}` is not of the form `File.sol:Name`"
            )));
        }

        Ok(Self {
            source: source.to_string(),
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for ContractId {
    type Error = ScriptError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContractId> for String {
    fn from(id: ContractId) -> Self {
        id.to_string()
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.name)
    }
}

/// A constructor argument as written in a deployment plan
///
/// In a plan file, `{"ref": "<key>"}` is a back-reference to the address of
/// the contract deployed under `<key>`; any other JSON value is a literal,
/// coerced against the constructor's ABI parameter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorArg {
    /// The address of a contract deployed earlier in the same run
    Reference {
        /// The plan key of the referenced contract
        #[serde(rename = "ref")]
        key: String,
    },
    /// A literal value
    Literal(Value),
}

impl ConstructorArg {
    /// A literal argument
    pub fn literal(value: impl Into<Value>) -> Self {
        ConstructorArg::Literal(value.into())
    }

    /// A back-reference to the contract deployed under `key`
    pub fn reference(key: impl Into<String>) -> Self {
        ConstructorArg::Reference { key: key.into() }
    }
}

/// A constructor argument with its back-reference, if any, resolved
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedArg {
    /// The address of an already-deployed contract
    Address(Address),
    /// A literal value, still to be coerced against the ABI
    Literal(Value),
}

/// A single contract to deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// The key under which the deployment is recorded; unique within a plan
    pub key: String,
    /// The compiled contract to deploy
    pub contract: ContractId,
    /// The ordered constructor arguments
    #[serde(default)]
    pub args: Vec<ConstructorArg>,
}

impl DeploymentSpec {
    /// The keys this spec references, in argument order
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|arg| match arg {
            ConstructorArg::Reference { key } => Some(key.as_str()),
            ConstructorArg::Literal(_) => None,
        })
    }
}

/// A contract that has been deployed and mined
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedContract {
    /// The key of the spec that produced this deployment
    pub key: String,
    /// The deployed contract
    pub contract: ContractId,
    /// The on-chain address of the contract
    pub address: Address,
    /// The hash of the contract creation transaction
    pub tx_hash: TxHash,
    /// The constructor arguments the contract was created with
    pub constructor_args: Vec<DynSolValue>,
}

/// The addresses of deployed contracts, by plan key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook(BTreeMap<String, Address>);

impl AddressBook {
    /// An empty address book
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the address of the contract deployed under `key`
    pub fn insert(&mut self, key: impl Into<String>, address: Address) {
        self.0.insert(key.into(), address);
    }

    /// The address of the contract deployed under `key`, if known
    pub fn get(&self, key: &str) -> Option<Address> {
        self.0.get(key).copied()
    }

    /// Iterate over the known `(key, address)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.0.iter().map(|(k, a)| (k.as_str(), *a))
    }

    /// Resolve the back-references in a spec's arguments
    pub fn resolve_args(&self, spec: &DeploymentSpec) -> Result<Vec<ResolvedArg>, ScriptError> {
        spec.args
            .iter()
            .map(|arg| match arg {
                ConstructorArg::Literal(value) => Ok(ResolvedArg::Literal(value.clone())),
                ConstructorArg::Reference { key } => self
                    .get(key)
                    .map(ResolvedArg::Address)
                    .ok_or_else(|| ScriptError::UnresolvedReference {
                        spec: spec.key.clone(),
                        reference: key.clone(),
                    }),
            })
            .collect()
    }
}

impl FromIterator<(String, Address)> for AddressBook {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, Address)> for AddressBook {
    fn extend<I: IntoIterator<Item = (String, Address)>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

/// A deployed contract ready to be submitted for verification
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRequest {
    /// The plan key of the contract
    pub key: String,
    /// The deployed address
    pub address: Address,
    /// The constructor arguments the contract was created with
    pub constructor_args: Vec<DynSolValue>,
    /// The ABI encoding of `constructor_args`
    pub encoded_args: Bytes,
    /// The fully qualified name, `<sourceName>:<contractName>`
    pub contract_name: String,
    /// The full compiler version, e.g. `v0.8.19+commit.7dd6d404`
    pub compiler_version: String,
    /// The standard-JSON compiler input the contract was built from
    pub standard_json_input: String,
}

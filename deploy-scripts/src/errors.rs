//! Definitions of errors that can occur during the execution of the deploy & verify scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use alloy::primitives::{Address, TxHash};

/// Errors that can occur during the execution of the deploy & verify scripts
#[derive(Debug)]
pub enum ScriptError {
    /// A compilation artifact is missing or does not parse
    ArtifactNotFound(String),
    /// The RPC endpoint is malformed, unreachable, or on the wrong chain
    ConnectionError(String),
    /// The deployer private key is malformed
    InvalidCredential(String),
    /// A constructor argument references a deployment that has not completed
    UnresolvedReference {
        /// The key of the spec holding the reference
        spec: String,
        /// The key being referenced
        reference: String,
    },
    /// The constructor arguments do not match the contract's constructor
    InvalidConstructorArgs {
        /// The key of the offending spec
        spec: String,
        /// Why the arguments were rejected
        cause: String,
    },
    /// A contract creation transaction did not produce a contract
    DeploymentFailed {
        /// The key of the spec that failed to deploy
        spec: String,
        /// What went wrong
        cause: DeployFailure,
    },
    /// The block explorer did not verify a contract
    VerificationFailed {
        /// The address of the contract
        address: Address,
        /// What went wrong
        cause: VerifyFailure,
    },
    /// No deployed address is known for a contract being verified
    MissingDeployment(String),
    /// Invalid script configuration
    Config(String),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ArtifactNotFound(s) => write!(f, "artifact not found: {}", s),
            ScriptError::ConnectionError(s) => write!(f, "error connecting to node: {}", s),
            ScriptError::InvalidCredential(s) => write!(f, "invalid private key: {}", s),
            ScriptError::UnresolvedReference { spec, reference } => write!(
                f,
                "`{}` references `{}`, which has not been deployed",
                spec, reference
            ),
            ScriptError::InvalidConstructorArgs { spec, cause } => {
                write!(f, "invalid constructor arguments for `{}`: {}", spec, cause)
            }
            ScriptError::DeploymentFailed { spec, cause } => {
                write!(f, "error deploying `{}`: {}", spec, cause)
            }
            ScriptError::VerificationFailed { address, cause } => {
                write!(f, "error verifying {}: {}", address, cause)
            }
            ScriptError::MissingDeployment(key) => {
                write!(f, "no deployed address given for `{}`", key)
            }
            ScriptError::Config(s) => write!(f, "invalid configuration: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
        }
    }
}

impl Error for ScriptError {}

/// The reasons a contract creation transaction can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployFailure {
    /// The node rejected the transaction or could not be reached
    Transport(String),
    /// The transaction was mined but reverted
    Reverted(TxHash),
    /// The receipt carries no contract address
    MissingAddress(TxHash),
    /// The transaction was not confirmed in time
    Timeout(Duration),
}

impl Display for DeployFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployFailure::Transport(s) => write!(f, "transport error: {}", s),
            DeployFailure::Reverted(tx) => write!(f, "transaction {} reverted", tx),
            DeployFailure::MissingAddress(tx) => {
                write!(f, "receipt for {} has no contract address", tx)
            }
            DeployFailure::Timeout(after) => {
                write!(f, "timeout: not confirmed after {}s", after.as_secs())
            }
        }
    }
}

/// The reasons a verification submission can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    /// The explorer could not be reached or answered with an HTTP error
    Transport(String),
    /// The explorer is rate limiting us
    RateLimited(String),
    /// The explorer refused to verify the contract
    Rejected(String),
    /// The explorer did not finish checking the submission in time
    PollLimit(String),
}

impl VerifyFailure {
    /// Whether resubmitting the request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, VerifyFailure::Transport(_) | VerifyFailure::RateLimited(_))
    }
}

impl Display for VerifyFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VerifyFailure::Transport(s) => write!(f, "transport error: {}", s),
            VerifyFailure::RateLimited(s) => write!(f, "rate limited: {}", s),
            VerifyFailure::Rejected(s) => write!(f, "rejected: {}", s),
            VerifyFailure::PollLimit(guid) => {
                write!(f, "verification {} still pending after polling", guid)
            }
        }
    }
}

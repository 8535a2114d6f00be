//! Validated configuration for the deploy & verify commands
//!
//! The CLI arguments are checked once, here, and the resulting configs are
//! passed by reference to each component.

use std::{
    fmt::{self, Debug},
    path::PathBuf,
    time::Duration,
};

use reqwest::Url;

use crate::{
    cli::{DeployArgs, Network, PlanArgs, VerifyArgs},
    errors::ScriptError,
    plan::DeploymentPlan,
    types::AddressBook,
    verify::RetryPolicy,
};

impl Network {
    /// The chain ID of the network
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Sepolia => 11155111,
            Network::Polygon => 137,
            Network::Amoy => 80002,
            Network::Localhost => 31337,
        }
    }

    /// Whether the node's chain ID must match [`Network::chain_id`].
    ///
    /// Local nodes are left unchecked, as Hardhat and Anvil can be run with
    /// any chain ID.
    pub fn enforces_chain_id(&self) -> bool {
        !matches!(self, Network::Localhost)
    }

    /// Whether contracts on the network can be verified on a public explorer
    pub fn has_explorer(&self) -> bool {
        !matches!(self, Network::Localhost)
    }
}

/// A secret value whose `Debug` output is redacted
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value. Never pass the result to a log macro.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted>)")
    }
}

/// Connection parameters for the node the contracts are deployed through
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// The node's JSON-RPC endpoint
    pub rpc_url: Url,
    /// The deployer's private key
    pub private_key: Secret,
    /// The network the node is expected to be on
    pub network: Network,
    /// The number of confirmations to wait for on each deployment
    pub confirmations: u64,
    /// How long to wait for each deployment to be confirmed
    pub confirmation_timeout: Duration,
}

/// Configuration for the `deploy` command
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// The node to deploy through
    pub chain: ChainConfig,
    /// The Hardhat build-output directory
    pub artifacts_dir: PathBuf,
    /// The contracts to deploy
    pub plan: DeploymentPlan,
    /// Where to record the deployed addresses, if anywhere
    pub deployments_path: Option<PathBuf>,
}

/// Connection parameters for the block explorer
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// The Etherscan-compatible API endpoint
    pub api_url: Url,
    /// The explorer API key
    pub api_key: Secret,
    /// The chain the contracts are deployed on
    pub chain_id: u64,
    /// The delay between verification status checks
    pub poll_interval: Duration,
    /// The number of status checks before a submission is given up on
    pub max_polls: u32,
}

/// Configuration for the `verify` command
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// The explorer to submit to
    pub explorer: ExplorerConfig,
    /// The Hardhat build-output directory
    pub artifacts_dir: PathBuf,
    /// The contracts to verify
    pub plan: DeploymentPlan,
    /// The `deployments.json` file to read addresses from, if any
    pub deployments_path: Option<PathBuf>,
    /// Explicitly given addresses, taking precedence over the deployments file
    pub addresses: AddressBook,
    /// The number of verification requests in flight at once
    pub concurrency: usize,
    /// When to retry a failed verification
    pub retry: RetryPolicy,
}

impl TryFrom<DeployArgs> for DeployConfig {
    type Error = ScriptError;

    fn try_from(args: DeployArgs) -> Result<Self, Self::Error> {
        let rpc_url =
            Url::parse(&args.rpc_url).map_err(|e| ScriptError::ConnectionError(e.to_string()))?;
        let confirmation_timeout = Duration::from_secs(non_zero(
            args.confirmation_timeout_secs,
            "--confirmation-timeout-secs",
        )?);

        let chain = ChainConfig {
            rpc_url,
            private_key: Secret::new(args.private_key),
            network: args.plan.network,
            confirmations: non_zero(args.confirmations, "--confirmations")?,
            confirmation_timeout,
        };

        Ok(Self {
            chain,
            artifacts_dir: args.plan.artifacts_dir.clone(),
            plan: load_plan(&args.plan)?,
            deployments_path: args.plan.deployments_path,
        })
    }
}

impl TryFrom<VerifyArgs> for VerifyConfig {
    type Error = ScriptError;

    fn try_from(args: VerifyArgs) -> Result<Self, Self::Error> {
        let network = args.plan.network;
        if !network.has_explorer() {
            return Err(ScriptError::Config(format!(
                "{:?} has no block explorer to verify on",
                network
            )));
        }

        let api_url = Url::parse(&args.explorer_api_url)
            .map_err(|e| ScriptError::Config(format!("invalid explorer API URL: {}", e)))?;
        if args.explorer_api_key.is_empty() {
            return Err(ScriptError::Config("explorer API key is empty".to_string()));
        }

        let explorer = ExplorerConfig {
            api_url,
            api_key: Secret::new(args.explorer_api_key),
            chain_id: network.chain_id(),
            poll_interval: Duration::from_secs(non_zero(
                args.poll_interval_secs,
                "--poll-interval-secs",
            )?),
            max_polls: non_zero(args.max_polls, "--max-polls")?,
        };

        let retry = RetryPolicy {
            max_attempts: non_zero(args.max_attempts, "--max-attempts")?,
            delay: Duration::from_secs(non_zero(args.retry_delay_secs, "--retry-delay-secs")?),
        };

        Ok(Self {
            explorer,
            artifacts_dir: args.plan.artifacts_dir.clone(),
            plan: load_plan(&args.plan)?,
            deployments_path: args.plan.deployments_path,
            addresses: args.addresses.into_iter().collect(),
            concurrency: non_zero(args.concurrency, "--concurrency")?,
            retry,
        })
    }
}

/// The plan file if one is given, the Boomerang plan otherwise
fn load_plan(args: &PlanArgs) -> Result<DeploymentPlan, ScriptError> {
    match &args.plan {
        Some(path) => DeploymentPlan::from_file(path),
        None => Ok(DeploymentPlan::boomerang()),
    }
}

/// Reject a zero value for the named option
fn non_zero<T: Default + PartialEq>(value: T, option: &str) -> Result<T, ScriptError> {
    if value == T::default() {
        return Err(ScriptError::Config(format!("{} must be greater than zero", option)));
    }

    Ok(value)
}

impl VerifyConfig {
    /// Merge the explicitly given addresses over those in the deployments file
    pub fn deployed_addresses(&self) -> Result<AddressBook, ScriptError> {
        let mut book = match &self.deployments_path {
            Some(path) if path.exists() => crate::deployments::read_deployments(path)?,
            Some(path) => {
                return Err(ScriptError::ReadDeployments(format!(
                    "{} does not exist",
                    path.display()
                )))
            }
            None => AddressBook::new(),
        };

        for (key, address) in self.addresses.iter() {
            book.insert(key, address);
        }

        Ok(book)
    }
}

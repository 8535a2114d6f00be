//! Definitions of CLI arguments and commands for the deploy & verify scripts
//!
//! Every argument can also be given through the environment, so both
//! commands run without arguments in a configured shell.

use std::{path::PathBuf, process::ExitCode};

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    commands::{deploy, verify},
    config::{DeployConfig, VerifyConfig},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_EXPLORER_API_URL,
        DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_RETRY_DELAY_SECS, DEFAULT_RPC_URL,
        DEFAULT_VERIFY_ATTEMPTS, DEFAULT_VERIFY_CONCURRENCY, NUM_DEPLOY_CONFIRMATIONS,
    },
    errors::ScriptError,
};

/// Deploy the Boomerang contracts and verify them on a block explorer
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The commands the scripts support
#[derive(Subcommand)]
pub enum Command {
    /// Deploy every contract in the plan, in order
    Deploy(DeployArgs),
    /// Submit every contract in the plan for verification
    Verify(VerifyArgs),
}

impl Command {
    /// Run the command, returning the exit code the process should end with
    pub async fn run(self) -> Result<ExitCode, ScriptError> {
        match self {
            Command::Deploy(args) => {
                let config = DeployConfig::try_from(args)?;
                deploy(&config).await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Verify(args) => {
                let config = VerifyConfig::try_from(args)?;
                let report = verify(&config).await?;
                Ok(report.exit_code())
            }
        }
    }
}

/// The networks the scripts know the chain ID of
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// The Sepolia testnet
    Sepolia,
    /// Polygon PoS mainnet
    Polygon,
    /// The Polygon Amoy testnet
    Amoy,
    /// A local Hardhat or Anvil node
    Localhost,
}

/// Arguments shared by both commands
#[derive(Args)]
pub struct PlanArgs {
    /// The network the contracts are deployed to
    #[arg(short, long, env = "NETWORK", value_enum, default_value = "polygon")]
    pub network: Network,

    /// The Hardhat build-output directory
    #[arg(long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// A JSON deployment plan to use instead of the Boomerang contracts
    #[arg(long, env = "DEPLOY_PLAN")]
    pub plan: Option<PathBuf>,

    /// The `deployments.json` file recording deployed addresses
    #[arg(long, env = "DEPLOYMENTS_PATH")]
    pub deployments_path: Option<PathBuf>,
}

/// Deploy the contracts in the plan.
///
/// Later contracts may take the addresses of earlier ones as constructor
/// arguments, so deployments are made one at a time, each waiting for the
/// previous one to be mined.
#[derive(Args)]
pub struct DeployArgs {
    /// The plan and network
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Network RPC URL
    #[arg(short, long, env = "API_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Private key of the deployer
    #[arg(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// The number of confirmations to wait for on each deployment
    #[arg(long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,

    /// How long to wait for each deployment to be confirmed
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_SECS)]
    pub confirmation_timeout_secs: u64,
}

/// Verify the deployed contracts in the plan on an Etherscan-compatible explorer
#[derive(Args)]
pub struct VerifyArgs {
    /// The plan and network
    #[command(flatten)]
    pub plan: PlanArgs,

    /// The explorer's verification API
    #[arg(long, env = "EXPLORER_API_URL", default_value = DEFAULT_EXPLORER_API_URL)]
    pub explorer_api_url: String,

    /// The explorer API key
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub explorer_api_key: String,

    /// Deployed addresses as `key=0x..`, taking precedence over the deployments file
    #[arg(
        long = "address",
        env = "VERIFY_ADDRESSES",
        value_delimiter = ',',
        value_parser = parse_deployed_address
    )]
    pub addresses: Vec<(String, Address)>,

    /// The number of verification requests in flight at once
    #[arg(long, default_value_t = DEFAULT_VERIFY_CONCURRENCY)]
    pub concurrency: usize,

    /// The number of attempts made for each contract on transient failures
    #[arg(long, default_value_t = DEFAULT_VERIFY_ATTEMPTS)]
    pub max_attempts: u32,

    /// The delay between attempts
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay_secs: u64,

    /// The delay between verification status checks
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// The number of status checks before a submission is given up on
    #[arg(long, default_value_t = DEFAULT_MAX_POLLS)]
    pub max_polls: u32,
}

/// Parse a `key=0x..` deployed address
fn parse_deployed_address(s: &str) -> Result<(String, Address), String> {
    let (key, address) = s
        .split_once('=')
        .ok_or_else(|| format!("`{s}` is not of the form `key=0x..`"))?;
    let address = address
        .trim()
        .parse::<Address>()
        .map_err(|e| format!("invalid address for `{key}`: {e}"))?;

    Ok((key.trim().to_string(), address))
}

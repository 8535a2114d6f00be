//! The signing client contracts are deployed through

use std::{str::FromStr, time::Duration};

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    config::ChainConfig,
    errors::{DeployFailure, ScriptError},
};

/// The result of a mined contract creation transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployReceipt {
    /// The address of the created contract
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: TxHash,
}

/// Something that can submit contract creation transactions and wait for
/// them to be mined
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// The account deployments are sent from
    fn address(&self) -> Address;

    /// Send a contract creation transaction with the given creation code and
    /// wait for it to be confirmed
    async fn deploy_contract(&self, creation_code: Bytes) -> Result<DeployReceipt, DeployFailure>;
}

/// A provider signing with the deployer's key, connected to the configured
/// network
#[derive(Clone)]
pub struct ChainClient {
    /// The signing provider
    provider: DynProvider,
    /// The address of the deployer's key
    deployer: Address,
    /// The number of confirmations to wait for on each deployment
    confirmations: u64,
    /// How long to wait for each deployment to be confirmed
    confirmation_timeout: Duration,
}

/// Parse the deployer's private key
pub fn parse_signer(private_key: &str) -> Result<PrivateKeySigner, ScriptError> {
    // The key itself must not end up in the error
    PrivateKeySigner::from_str(private_key.trim())
        .map_err(|_| ScriptError::InvalidCredential("not a 32-byte hex private key".to_string()))
}

/// Sets up the client with which to deploy contracts, checking that the node
/// is reachable and on the expected chain
pub async fn setup_client(config: &ChainConfig) -> Result<ChainClient, ScriptError> {
    let signer = parse_signer(config.private_key.expose())?;
    let deployer = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(signer)
        .connect_http(config.rpc_url.clone())
        .erased();

    // RPC URLs often embed an API key, so only the host is reported
    let host = config.rpc_url.host_str().unwrap_or_default();
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ConnectionError(format!("{}: {}", host, e)))?;
    debug!("Connected to {} (chain ID {})", host, chain_id);

    let expected = config.network.chain_id();
    if config.network.enforces_chain_id() && chain_id != expected {
        return Err(ScriptError::ConnectionError(format!(
            "node is on chain {}, but {:?} is chain {}",
            chain_id, config.network, expected
        )));
    }

    Ok(ChainClient {
        provider,
        deployer,
        confirmations: config.confirmations,
        confirmation_timeout: config.confirmation_timeout,
    })
}

#[async_trait]
impl ContractDeployer for ChainClient {
    fn address(&self) -> Address {
        self.deployer
    }

    async fn deploy_contract(&self, creation_code: Bytes) -> Result<DeployReceipt, DeployFailure> {
        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_deploy_code(creation_code);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployFailure::Transport(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        info!("Sent creation transaction {}, waiting for confirmation", tx_hash);

        let receipt = tokio::time::timeout(
            self.confirmation_timeout,
            pending
                .with_required_confirmations(self.confirmations)
                .get_receipt(),
        )
        .await
        .map_err(|_| DeployFailure::Timeout(self.confirmation_timeout))?
        .map_err(|e| DeployFailure::Transport(e.to_string()))?;

        if !receipt.status() {
            return Err(DeployFailure::Reverted(tx_hash));
        }

        let address = receipt
            .contract_address()
            .ok_or(DeployFailure::MissingAddress(tx_hash))?;

        Ok(DeployReceipt { address, tx_hash })
    }
}

//! Implementations of the deploy & verify commands

use tracing::info;

use crate::{
    artifacts::ArtifactLoader,
    client::{setup_client, ContractDeployer},
    config::{DeployConfig, VerifyConfig},
    deploy::deploy_all,
    deployments::write_deployments,
    errors::ScriptError,
    types::DeployedContract,
    verify::{
        build_verification_requests, etherscan::EtherscanClient, verify_all, VerificationReport,
    },
};

/// Deploy every contract in the plan, then record the deployed addresses.
///
/// All artifacts are loaded before connecting, so a missing artifact fails
/// the run before any transaction is sent.
pub async fn deploy(config: &DeployConfig) -> Result<Vec<DeployedContract>, ScriptError> {
    let loader = ArtifactLoader::new(&config.artifacts_dir);
    let artifacts = loader.load_all(config.plan.contract_ids())?;

    let client = setup_client(&config.chain).await?;
    info!("Deploying contracts with the account: {:#x}", client.address());

    let deployed = deploy_all(&client, &artifacts, config.plan.contracts()).await?;

    if let Some(path) = &config.deployments_path {
        write_deployments(path, &deployed)?;
        info!("Recorded {} deployments in {}", deployed.len(), path.display());
    }

    Ok(deployed)
}

/// Submit every contract in the plan for verification.
///
/// Only configuration, address & artifact problems fail the command; failed
/// verifications are collected in the report.
pub async fn verify(config: &VerifyConfig) -> Result<VerificationReport, ScriptError> {
    let loader = ArtifactLoader::new(&config.artifacts_dir);
    let addresses = config.deployed_addresses()?;
    let requests = build_verification_requests(&loader, &config.plan, &addresses)?;

    let explorer = EtherscanClient::new(config.explorer.clone())?;
    let report = verify_all(&explorer, requests, config.concurrency, config.retry).await;
    report.log_summary();

    Ok(report)
}

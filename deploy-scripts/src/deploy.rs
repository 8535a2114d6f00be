//! Sequential deployment of the contracts in a plan

use tracing::info;

use crate::{
    artifacts::Artifacts,
    calldata::{creation_code, encode_constructor_args},
    client::ContractDeployer,
    errors::ScriptError,
    types::{AddressBook, DeployedContract, DeploymentSpec},
};

/// Deploy the given specs in order, resolving each spec's back-references
/// against the contracts deployed before it.
///
/// Stops at the first failure; nothing after the failing spec is sent.
pub async fn deploy_all<D: ContractDeployer + ?Sized>(
    deployer: &D,
    artifacts: &Artifacts,
    specs: &[DeploymentSpec],
) -> Result<Vec<DeployedContract>, ScriptError> {
    let mut book = AddressBook::new();
    let mut deployed = Vec::with_capacity(specs.len());

    for spec in specs {
        let contract = deploy_one(deployer, artifacts, &book, spec).await?;
        book.insert(&contract.key, contract.address);
        deployed.push(contract);
    }

    Ok(deployed)
}

/// Deploy a single spec
async fn deploy_one<D: ContractDeployer + ?Sized>(
    deployer: &D,
    artifacts: &Artifacts,
    book: &AddressBook,
    spec: &DeploymentSpec,
) -> Result<DeployedContract, ScriptError> {
    let args = book.resolve_args(spec)?;
    let artifact = artifacts.get(&spec.contract)?;
    let (constructor_args, encoded_args) =
        encode_constructor_args(&spec.key, &artifact.abi, &args)?;

    info!("Deploying {} as `{}`", spec.contract, spec.key);
    let receipt = deployer
        .deploy_contract(creation_code(&artifact.bytecode, &encoded_args))
        .await
        .map_err(|cause| ScriptError::DeploymentFailed {
            spec: spec.key.clone(),
            cause,
        })?;

    info!("{} deployed to: {:#x}", spec.contract.name, receipt.address);

    Ok(DeployedContract {
        key: spec.key.clone(),
        contract: spec.contract.clone(),
        address: receipt.address,
        tx_hash: receipt.tx_hash,
        constructor_args,
    })
}

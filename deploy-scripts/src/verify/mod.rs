//! Submission of deployed contracts to a block explorer for verification
//!
//! Every request is submitted independently: a failure is recorded in the
//! report and never stops the other requests.

pub mod etherscan;

use std::{process::ExitCode, time::Duration};

use alloy::primitives::Address;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
    artifacts::ArtifactLoader,
    calldata::encode_constructor_args,
    constants::{DEFAULT_RETRY_DELAY_SECS, DEFAULT_VERIFY_ATTEMPTS, EXIT_PARTIAL_FAILURE},
    errors::{ScriptError, VerifyFailure},
    plan::DeploymentPlan,
    types::{AddressBook, VerificationRequest},
};

/// A successful verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The explorer verified the contract
    Verified,
    /// The contract had been verified before
    AlreadyVerified,
}

/// A service that verifies deployed contracts
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Submit a single request and wait for the explorer's verdict
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerifyFailure>;
}

/// How often, and how far apart, a transiently failing request is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The total number of attempts, including the first
    pub max_attempts: u32,
    /// The delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_VERIFY_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

/// The outcome of verifying one contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// The plan key of the contract
    pub key: String,
    /// The address of the contract
    pub address: Address,
    /// The explorer's verdict
    pub result: Result<VerificationStatus, VerifyFailure>,
}

/// How a verification run went as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Every contract is verified
    Complete,
    /// Some, but not all, contracts failed to verify
    Partial,
    /// No contract was verified
    Failed,
}

/// The outcomes of a verification run, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// One outcome per request
    outcomes: Vec<VerificationOutcome>,
}

impl VerificationReport {
    /// The outcomes, in the order the requests were given
    pub fn outcomes(&self) -> &[VerificationOutcome] {
        &self.outcomes
    }

    /// The number of contracts verified, including those already verified
    pub fn num_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// The failed verifications
    pub fn failures(&self) -> Vec<ScriptError> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Err(cause) => Some(ScriptError::VerificationFailed {
                    address: o.address,
                    cause: cause.clone(),
                }),
                Ok(_) => None,
            })
            .collect()
    }

    /// How the run went as a whole
    pub fn status(&self) -> ReportStatus {
        let succeeded = self.num_succeeded();
        if succeeded == self.outcomes.len() {
            ReportStatus::Complete
        } else if succeeded == 0 {
            ReportStatus::Failed
        } else {
            ReportStatus::Partial
        }
    }

    /// The exit code the process should end with
    pub fn exit_code(&self) -> ExitCode {
        match self.status() {
            ReportStatus::Complete => ExitCode::SUCCESS,
            ReportStatus::Partial => ExitCode::from(EXIT_PARTIAL_FAILURE),
            ReportStatus::Failed => ExitCode::FAILURE,
        }
    }

    /// Log the counts, then every failure
    pub fn log_summary(&self) {
        let failures = self.failures();
        info!(
            "Verified {} of {} contracts",
            self.num_succeeded(),
            self.outcomes.len()
        );

        for failure in failures {
            error!("{}", failure);
        }
    }
}

/// Verify every request through the given service, with at most
/// `concurrency` requests in flight at once.
///
/// The report holds one outcome per request, in request order.
pub async fn verify_all<S: VerificationService + ?Sized>(
    service: &S,
    requests: Vec<VerificationRequest>,
    concurrency: usize,
    retry: RetryPolicy,
) -> VerificationReport {
    let outcomes: Vec<_> = stream::iter(requests)
        .map(|request| async move {
            let result = verify_with_retry(service, &request, retry).await;
            match &result {
                Ok(status) => {
                    info!("{} at {:#x}: {:?}", request.key, request.address, status)
                }
                Err(cause) => {
                    debug!("{} at {:#x} failed: {}", request.key, request.address, cause)
                }
            }

            VerificationOutcome {
                key: request.key,
                address: request.address,
                result,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    VerificationReport { outcomes }
}

/// Verify a single request, retrying transient failures
async fn verify_with_retry<S: VerificationService + ?Sized>(
    service: &S,
    request: &VerificationRequest,
    retry: RetryPolicy,
) -> Result<VerificationStatus, VerifyFailure> {
    let mut attempt = 1;
    loop {
        match service.verify(request).await {
            Err(cause) if cause.is_transient() && attempt < retry.max_attempts => {
                warn!(
                    "Attempt {}/{} to verify {} failed: {}, retrying in {}s",
                    attempt,
                    retry.max_attempts,
                    request.key,
                    cause,
                    retry.delay.as_secs()
                );
                tokio::time::sleep(retry.delay).await;
                attempt += 1;
            }
            res => return res,
        }
    }
}

/// Build a verification request for every contract in the plan.
///
/// Back-references are resolved against the same address book the deployed
/// addresses are taken from, so a contract is verified with the arguments it
/// was created with.
pub fn build_verification_requests(
    loader: &ArtifactLoader,
    plan: &DeploymentPlan,
    addresses: &AddressBook,
) -> Result<Vec<VerificationRequest>, ScriptError> {
    plan.contracts()
        .iter()
        .map(|spec| {
            let address = addresses
                .get(&spec.key)
                .ok_or_else(|| ScriptError::MissingDeployment(spec.key.clone()))?;

            let artifact = loader.load(&spec.contract)?;
            let args = addresses.resolve_args(spec)?;
            let (constructor_args, encoded_args) =
                encode_constructor_args(&spec.key, &artifact.abi, &args)?;

            let build_info = loader.load_build_info(&spec.contract)?;
            let standard_json_input = serde_json::to_string(&build_info.input)
                .map_err(|e| ScriptError::ArtifactNotFound(e.to_string()))?;
            debug!(
                "Verifying {} at {:#x} with {} constructor argument bytes",
                artifact.fully_qualified_name,
                address,
                encoded_args.len()
            );

            Ok(VerificationRequest {
                key: spec.key.clone(),
                address,
                constructor_args,
                encoded_args,
                contract_name: artifact.fully_qualified_name,
                compiler_version: format!("v{}", build_info.solc_long_version),
                standard_json_input,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use alloy::primitives::Bytes;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        test_helpers::{address_inputs, write_artifact},
        types::{ConstructorArg, DeploymentSpec},
    };

    /// A service answering from a script of results per address, and
    /// `Verified` once the script runs out
    #[derive(Default)]
    struct ScriptedService {
        answers: Mutex<HashMap<Address, Vec<Result<VerificationStatus, VerifyFailure>>>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedService {
        fn answer(
            self,
            address: Address,
            answers: Vec<Result<VerificationStatus, VerifyFailure>>,
        ) -> Self {
            self.answers.lock().unwrap().insert(address, answers);
            self
        }
    }

    #[async_trait]
    impl VerificationService for ScriptedService {
        async fn verify(
            &self,
            request: &VerificationRequest,
        ) -> Result<VerificationStatus, VerifyFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let mut answers = self.answers.lock().unwrap();
            match answers.get_mut(&request.address) {
                Some(script) if !script.is_empty() => script.remove(0),
                _ => Ok(VerificationStatus::Verified),
            }
        }
    }

    fn request(key: &str, last_byte: u8) -> VerificationRequest {
        VerificationRequest {
            key: key.to_string(),
            address: Address::with_last_byte(last_byte),
            constructor_args: vec![],
            encoded_args: Bytes::new(),
            contract_name: format!("contracts/{key}.sol:{key}"),
            compiler_version: "v0.8.19+commit.7dd6d404".to_string(),
            standard_json_input: "{}".to_string(),
        }
    }

    fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_skip_siblings() {
        let service = ScriptedService::default().answer(
            Address::with_last_byte(1),
            vec![Err(VerifyFailure::Rejected("bad".into()))],
        );

        let requests = vec![request("a", 1), request("b", 2)];
        let report = verify_all(&service, requests, 1, no_delay(1)).await;

        let keys: Vec<_> = report.outcomes().iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(report.outcomes()[0].result.is_err());
        assert_eq!(report.outcomes()[1].result, Ok(VerificationStatus::Verified));

        assert_eq!(report.status(), ReportStatus::Partial);
        assert_eq!(report.exit_code(), ExitCode::from(EXIT_PARTIAL_FAILURE));
        let failures = report.failures();
        assert!(matches!(
            failures.as_slice(),
            [ScriptError::VerificationFailed { address, .. }]
                if *address == Address::with_last_byte(1)
        ));
    }

    #[tokio::test]
    async fn test_summary_lists_every_failure_in_order() {
        let service = ScriptedService::default()
            .answer(
                Address::with_last_byte(3),
                vec![Err(VerifyFailure::Rejected("third".into()))],
            )
            .answer(
                Address::with_last_byte(1),
                vec![Err(VerifyFailure::Rejected("first".into()))],
            );

        let requests = vec![request("a", 1), request("b", 2), request("c", 3)];
        let report = verify_all(&service, requests, 3, no_delay(1)).await;

        let failed: Vec<_> = report
            .failures()
            .into_iter()
            .map(|f| match f {
                ScriptError::VerificationFailed { address, .. } => address,
                other => panic!("unexpected failure {other}"),
            })
            .collect();
        assert_eq!(failed, vec![Address::with_last_byte(1), Address::with_last_byte(3)]);
        assert_eq!(report.status(), ReportStatus::Partial);
    }

    #[tokio::test]
    async fn test_already_verified_is_success() {
        let service = ScriptedService::default().answer(
            Address::with_last_byte(1),
            vec![Ok(VerificationStatus::AlreadyVerified)],
        );

        let report = verify_all(&service, vec![request("a", 1)], 2, no_delay(1)).await;
        assert_eq!(report.status(), ReportStatus::Complete);
        assert_eq!(report.exit_code(), ExitCode::SUCCESS);
        assert!(report.failures().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let service = ScriptedService::default().answer(
            Address::with_last_byte(1),
            vec![
                Err(VerifyFailure::RateLimited("slow down".into())),
                Err(VerifyFailure::Transport("reset".into())),
            ],
        );

        let report = verify_all(&service, vec![request("a", 1)], 1, no_delay(3)).await;
        assert_eq!(report.status(), ReportStatus::Complete);
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let service = ScriptedService::default().answer(
            Address::with_last_byte(1),
            vec![Err(VerifyFailure::Transport("reset".into())); 5],
        );

        let report = verify_all(&service, vec![request("a", 1)], 1, no_delay(2)).await;
        assert_eq!(report.status(), ReportStatus::Failed);
        assert_eq!(report.exit_code(), ExitCode::FAILURE);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let service = ScriptedService::default().answer(
            Address::with_last_byte(1),
            vec![Err(VerifyFailure::Rejected("bytecode mismatch".into()))],
        );

        let report = verify_all(&service, vec![request("a", 1)], 1, no_delay(3)).await;
        assert_eq!(report.status(), ReportStatus::Failed);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let service = ScriptedService::default();
        let requests = (1..=6).map(|i| request(&format!("c{i}"), i)).collect();

        let report = verify_all(&service, requests, 2, no_delay(1)).await;
        assert_eq!(report.outcomes().len(), 6);
        assert!(service.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_build_verification_requests() {
        let dir = TempDir::new().unwrap();
        let token = "Token.sol:Token".parse().unwrap();
        let vault = "Vault.sol:Vault".parse().unwrap();
        write_artifact(dir.path(), &token, json!([]), "0x6080");
        write_artifact(dir.path(), &vault, address_inputs(1), "0x6080");

        let plan = DeploymentPlan::new(vec![
            DeploymentSpec {
                key: "token".to_string(),
                contract: token,
                args: vec![],
            },
            DeploymentSpec {
                key: "vault".to_string(),
                contract: vault,
                args: vec![ConstructorArg::reference("token")],
            },
        ])
        .unwrap();
        let loader = ArtifactLoader::new(dir.path());

        let mut addresses = AddressBook::new();
        addresses.insert("token", Address::with_last_byte(1));
        assert!(matches!(
            build_verification_requests(&loader, &plan, &addresses),
            Err(ScriptError::MissingDeployment(key)) if key == "vault"
        ));

        addresses.insert("vault", Address::with_last_byte(2));
        let requests = build_verification_requests(&loader, &plan, &addresses).unwrap();
        assert_eq!(requests.len(), 2);

        let vault = &requests[1];
        assert_eq!(vault.address, Address::with_last_byte(2));
        assert_eq!(
            vault.constructor_args,
            vec![alloy::dyn_abi::DynSolValue::Address(Address::with_last_byte(1))]
        );
        assert_eq!(vault.encoded_args.len(), 32);
        assert_eq!(vault.contract_name, "contracts/Vault.sol:Vault");
        assert_eq!(vault.compiler_version, "v0.8.19+commit.7dd6d404");
        assert!(vault.standard_json_input.contains("Solidity"));
    }
}

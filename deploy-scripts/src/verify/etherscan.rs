//! A client for the Etherscan contract verification API
//!
//! Verification is asynchronous on the explorer's side: a submission returns
//! a GUID, which is polled until the explorer has compiled and compared the
//! source.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{VerificationService, VerificationStatus};
use crate::{
    config::ExplorerConfig,
    errors::{ScriptError, VerifyFailure},
    types::VerificationRequest,
};

/// The code format of a standard-JSON compiler input submission
const CODE_FORMAT: &str = "solidity-standard-json-input";
/// The status check answer while the explorer is still working
const PENDING_ANSWER: &str = "Pending in queue";

/// The envelope every Etherscan API answer comes in
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    /// `"1"` on success, `"0"` otherwise
    status: String,
    /// The answer proper: a GUID, a verdict, or an error message
    #[serde(default)]
    result: String,
}

impl EtherscanResponse {
    /// Whether the request succeeded
    fn is_ok(&self) -> bool {
        self.status == "1"
    }
}

/// The answer to a verification submission
#[derive(Debug, Clone, PartialEq, Eq)]
enum Submission {
    /// The submission was queued under the given GUID
    Queued(String),
    /// The contract is already verified, nothing was queued
    AlreadyVerified,
}

/// Verifies contracts through an Etherscan-compatible API
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    /// The HTTP client requests are sent with
    http: Client,
    /// The explorer's endpoint and credentials
    config: ExplorerConfig,
}

impl EtherscanClient {
    /// A client for the configured explorer
    pub fn new(config: ExplorerConfig) -> Result<Self, ScriptError> {
        let http = Client::builder()
            .build()
            .map_err(|e| ScriptError::Config(format!("error building HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Submit the source of a deployed contract
    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, VerifyFailure> {
        let chain_id = self.config.chain_id.to_string();
        let address = format!("{:#x}", request.address);
        let constructor_args = alloy::primitives::hex::encode(&request.encoded_args);

        let form = [
            ("apikey", self.config.api_key.expose()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("codeformat", CODE_FORMAT),
            ("sourceCode", request.standard_json_input.as_str()),
            ("contractaddress", address.as_str()),
            ("contractname", request.contract_name.as_str()),
            ("compilerversion", request.compiler_version.as_str()),
            // Sic, the API misspells the field
            ("constructorArguements", constructor_args.as_str()),
        ];

        debug!(
            "Submitting {} at {} for verification with {}",
            request.contract_name, address, request.compiler_version
        );
        let response = self
            .http
            .post(self.config.api_url.clone())
            .query(&[("chainid", chain_id.as_str())])
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;
        let response = parse_response(response).await?;

        if response.is_ok() {
            return Ok(Submission::Queued(response.result));
        }

        match classify(&response.result) {
            Some(VerificationStatus::AlreadyVerified) => Ok(Submission::AlreadyVerified),
            _ => Err(rejection(response.result)),
        }
    }

    /// Check on a queued submission, returning `None` while it is pending
    async fn check_status(
        &self,
        guid: &str,
    ) -> Result<Option<VerificationStatus>, VerifyFailure> {
        let chain_id = self.config.chain_id.to_string();
        let query = [
            ("chainid", chain_id.as_str()),
            ("apikey", self.config.api_key.expose()),
            ("module", "contract"),
            ("action", "checkverifystatus"),
            ("guid", guid),
        ];

        let response = self
            .http
            .get(self.config.api_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;
        let response = parse_response(response).await?;

        if response.result == PENDING_ANSWER {
            return Ok(None);
        }

        if response.is_ok() {
            return Ok(Some(VerificationStatus::Verified));
        }

        match classify(&response.result) {
            Some(status) => Ok(Some(status)),
            None => Err(rejection(response.result)),
        }
    }
}

#[async_trait]
impl VerificationService for EtherscanClient {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerifyFailure> {
        let guid = match self.submit(request).await? {
            Submission::Queued(guid) => guid,
            Submission::AlreadyVerified => return Ok(VerificationStatus::AlreadyVerified),
        };

        for poll in 1..=self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;
            if let Some(status) = self.check_status(&guid).await? {
                return Ok(status);
            }

            debug!("{} still pending after {} checks", guid, poll);
        }

        Err(VerifyFailure::PollLimit(guid))
    }
}

/// Map a request failure to a transport failure.
///
/// The URL is stripped, as status checks carry the API key in the query.
fn transport_error(e: reqwest::Error) -> VerifyFailure {
    VerifyFailure::Transport(e.without_url().to_string())
}

/// Check the HTTP status and parse the answer envelope
async fn parse_response(response: reqwest::Response) -> Result<EtherscanResponse, VerifyFailure> {
    let response = response.error_for_status().map_err(transport_error)?;
    response.json().await.map_err(transport_error)
}

/// Recognise the non-`"1"` answers that are in fact successes
fn classify(answer: &str) -> Option<VerificationStatus> {
    let answer = answer.to_lowercase();
    if answer.contains("already verified") {
        Some(VerificationStatus::AlreadyVerified)
    } else if answer.starts_with("pass") {
        Some(VerificationStatus::Verified)
    } else {
        None
    }
}

/// A failure answer, which is transient only when rate limited
fn rejection(answer: String) -> VerifyFailure {
    if answer.to_lowercase().contains("rate limit") {
        VerifyFailure::RateLimited(answer)
    } else {
        VerifyFailure::Rejected(answer)
    }
}

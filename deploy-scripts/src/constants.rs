//! Constants used in the deploy & verify scripts

/// The default node RPC URL
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default directory holding the Hardhat build output
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The subdirectory of the build output holding contract artifacts
pub const ARTIFACTS_CONTRACTS_DIR: &str = "contracts";

/// The extension of a Hardhat artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The extension of a Hardhat debug file, which points at the build-info
pub const DBG_EXTENSION: &str = "dbg.json";

/// The number of confirmations to wait for the contract deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The number of seconds to wait for a deployment to be confirmed
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;

/// The default Etherscan-compatible verification API (Etherscan V2, multichain)
pub const DEFAULT_EXPLORER_API_URL: &str = "https://api.etherscan.io/v2/api";

/// The number of verification requests in flight at once
pub const DEFAULT_VERIFY_CONCURRENCY: usize = 2;

/// The number of times a verification request is attempted
pub const DEFAULT_VERIFY_ATTEMPTS: u32 = 3;

/// The number of seconds between verification attempts
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;

/// The number of seconds between verification status checks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// The number of verification status checks before giving up
pub const DEFAULT_MAX_POLLS: u32 = 30;

/// The log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// The exit code used when some, but not all, verifications failed
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

// ------------------
// | Boomerang plan |
// ------------------

/// The fund controller contract key in the plan and the `deployments.json` file
pub const FUND_CONTROLLER_KEY: &str = "fund_controller";

/// The flash loan authority contract key in the plan and the `deployments.json` file
pub const FLASH_LOAN_KEY: &str = "flash_loan";

/// The source file of the fund controller contract
pub const FUND_CONTROLLER_SOURCE: &str = "BoomerangFundController.sol";

/// The name of the fund controller contract
pub const FUND_CONTROLLER_NAME: &str = "FarziFundControllerV2";

/// The source file of the flash loan authority contract
pub const FLASH_LOAN_SOURCE: &str = "BoomerangFlashLoanAuthority.sol";

/// The name of the flash loan authority contract
pub const FLASH_LOAN_NAME: &str = "FarziFlashLoanAuthorityV2";

/// The owner of both contracts
pub const OWNER_ADDRESS: &str = "0xcce491Ca41049631d8276276E31474911652CF70";

/// The tier thresholds the fund controller is initialized with
pub const FUND_CONTROLLER_TIERS: [u64; 6] = [30000, 60000, 150000, 300000, 1500000, 3000000];

/// The Aave V3 pool addresses provider on Polygon
pub const AAVE_ADDRESSES_PROVIDER: &str = "0xa97684ead0e402dC232d5A977953DF7ECBaB3CDb";

/// The Uniswap V3 swap router
pub const UNISWAP_V3_ROUTER: &str = "0xE592427A0AEce92De3Edee1F18E0157C05861564";

/// The QuickSwap router on Polygon
pub const QUICKSWAP_ROUTER: &str = "0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff";

/// The SushiSwap router on Polygon
pub const SUSHISWAP_ROUTER: &str = "0x1b02dA8Cb0d097eB8D57A175b88c7D8b47997506";

//! Protocol Constants
//!
//! All magic numbers and configuration values for the FundMe ledger.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (more block confirmations before a deploy is final)
//! - Default (no feature) - Testnet/development values
//!
//! ```toml
//! # For mainnet deployment:
//! fund-me-common = { path = "...", features = ["mainnet"] }
//! ```

/// Native currency (ETH-like, 18 decimals)
pub mod native {
    /// Decimal places of the native currency
    pub const DECIMALS: u8 = 18;
    /// One whole unit in base units (1 ETH = 1e18 wei)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Funding rules
pub mod fund_me {
    use super::native::ONE;

    /// Minimum contribution, in USD with 18 decimals ($50)
    pub const MINIMUM_USD: u128 = 50 * ONE;
}

/// Price feed configuration
pub mod price_feed {
    /// Decimals reported by ETH/USD aggregators
    pub const DECIMALS: u8 = 8;

    /// Answer published by the development mock ($2,000 with 8 decimals)
    pub const INITIAL_ANSWER: i64 = 2_000_00000000;

    /// Version reported by the development mock
    pub const MOCK_VERSION: u64 = 0;

    /// Description reported by the development mock
    pub const MOCK_DESCRIPTION: &str = "v0.6/tests/MockV3Aggregator.sol";

    /// Largest feed precision accepted
    ///
    /// Keeps `remainder * answer` below 10^18 * i64::MAX, inside u128.
    pub const MAX_DECIMALS: u8 = 18;
}

/// Deployment configuration
pub mod deploy {
    /// Block confirmations to wait for after a deployment
    /// - Mainnet: 6 (matches the live-network helper config)
    /// - Testnet: 1
    #[cfg(feature = "mainnet")]
    pub const BLOCK_CONFIRMATIONS: u64 = 6;
    #[cfg(not(feature = "mainnet"))]
    pub const BLOCK_CONFIRMATIONS: u64 = 1;

    /// Balance credited to each named account on a development chain (10,000 ETH)
    pub const DEV_ACCOUNT_BALANCE: u128 = 10_000 * super::native::ONE;

    /// Number of named accounts on a development chain
    pub const DEV_ACCOUNT_COUNT: usize = 20;
}

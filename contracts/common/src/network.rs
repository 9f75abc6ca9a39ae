//! Network Configuration
//!
//! Which chains are development chains (mock feed deployed) and which live
//! networks have a known ETH/USD aggregator.

use crate::constants::deploy::BLOCK_CONFIRMATIONS;
use crate::errors::{FundMeError, FundMeResult};
use crate::types::Address;

/// Networks that get a mock price feed
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["hardhat", "localhost"];

/// Chain id of the local development chain
pub const DEVELOPMENT_CHAIN_ID: u64 = 31337;

/// Rinkeby ETH/USD aggregator (0x8A753747A1Fa494EC906cE90E9f37563A8AF630e, left-padded)
pub const RINKEBY_ETH_USD_FEED: Address = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0x8A, 0x75, 0x37, 0x47, 0xA1, 0xFa, 0x49, 0x4E, 0xC9, 0x06,
    0xcE, 0x90, 0xE9, 0xf3, 0x75, 0x63, 0xA8, 0xAF, 0x63, 0x0e,
];

/// Per-network deployment settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name as used by the deploy tooling
    pub name: &'static str,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Live ETH/USD feed, if the network has one
    pub eth_usd_price_feed: Option<Address>,
    /// Confirmations to wait for after deploying
    pub block_confirmations: u64,
}

impl NetworkConfig {
    /// The in-process development chain
    pub const fn hardhat() -> Self {
        Self {
            name: "hardhat",
            chain_id: DEVELOPMENT_CHAIN_ID,
            eth_usd_price_feed: None,
            block_confirmations: 1,
        }
    }

    /// A local node
    pub const fn localhost() -> Self {
        Self {
            name: "localhost",
            chain_id: DEVELOPMENT_CHAIN_ID,
            eth_usd_price_feed: None,
            block_confirmations: 1,
        }
    }

    /// Rinkeby testnet
    pub const fn rinkeby() -> Self {
        Self {
            name: "rinkeby",
            chain_id: 4,
            eth_usd_price_feed: Some(RINKEBY_ETH_USD_FEED),
            block_confirmations: BLOCK_CONFIRMATIONS,
        }
    }

    /// Look a network up by name
    pub fn by_name(name: &str) -> Option<Self> {
        [Self::hardhat(), Self::localhost(), Self::rinkeby()]
            .into_iter()
            .find(|n| n.name == name)
    }

    /// Whether this network deploys a mock feed
    pub fn is_development(&self) -> bool {
        is_development_chain(self.name)
    }

    /// Pick the feed the ledger should be bound to
    ///
    /// Development chains use the freshly deployed mock; live networks use
    /// their configured aggregator.
    pub fn resolve_price_feed(&self, mock_feed: Option<Address>) -> FundMeResult<Address> {
        if self.is_development() {
            return mock_feed.ok_or(FundMeError::InvalidInput {
                param: "mock_feed",
                reason: "development chain requires a deployed mock",
            });
        }
        self.eth_usd_price_feed.ok_or(FundMeError::InvalidInput {
            param: "network",
            reason: "no ETH/USD feed configured",
        })
    }
}

/// Whether `name` is a development chain
pub fn is_development_chain(name: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&name)
}

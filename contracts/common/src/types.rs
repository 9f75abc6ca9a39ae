//! Core Types for the FundMe Ledger
//!
//! Addresses, call context, oracle round data, and the action enums
//! shared by the ledger and the price feed.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for app identifiers
pub type AppId = [u8; 32];

/// The zero address, never a valid owner or feed
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Returns true for the zero address
pub fn is_zero_address(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}

/// Derive a deterministic contract address from deployer and deploy nonce
pub fn derive_contract_address(deployer: &Address, nonce: u64) -> Address {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"fund-me/contract");
    hasher.update(deployer);
    hasher.update(nonce.to_le_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

// ============ Call Context ============

/// Who is calling, with how much value, at which block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CallContext {
    /// Message sender
    pub caller: Address,
    /// Native currency attached to the call (18 decimals)
    pub value: u128,
    /// Current block height
    pub block_height: u64,
}

impl CallContext {
    /// A call carrying no value
    pub fn new(caller: Address, block_height: u64) -> Self {
        Self { caller, value: 0, block_height }
    }

    /// A call carrying `value`
    pub fn with_value(caller: Address, value: u128, block_height: u64) -> Self {
        Self { caller, value, block_height }
    }
}

// ============ Oracle Types ============

/// Round data as reported by an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoundData {
    /// Round identifier
    pub round_id: u64,
    /// Answer with the feed's decimals
    pub answer: i64,
    /// Block the round started at
    pub started_at: u64,
    /// Block the answer was last updated at
    pub updated_at: u64,
    /// Round in which the answer was computed
    pub answered_in_round: u64,
}

// ============ Action Types ============

/// Actions for the FundMe ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum FundMeAction {
    /// Construct the ledger bound to a price feed
    Initialize { price_feed: Address },
    /// Contribute the attached value
    Fund,
    /// Plain value transfer with no calldata (routes to Fund)
    Receive,
    /// Value transfer with unrecognized calldata (routes to Fund)
    Fallback { data: Vec<u8> },
    /// Owner drains the balance
    Withdraw,
    /// Owner drains the balance, iterating a local copy of the funder list
    CheaperWithdraw,
}

/// Actions for the mock price feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PriceFeedAction {
    /// Deploy the feed with its precision and first answer
    Initialize { decimals: u8, initial_answer: i64 },
    /// Publish a new answer in a new round
    UpdateAnswer { answer: i64 },
    /// Overwrite the latest round with explicit values
    UpdateRoundData {
        round_id: u64,
        answer: i64,
        timestamp: u64,
        started_at: u64,
    },
}

//! Error Types for the FundMe Ledger
//!
//! Typed errors with structured context. Every failure aborts the whole
//! call; nothing here is retried by the ledger itself.

use crate::types::Address;

/// Result type alias for FundMe operations
pub type FundMeResult<T> = Result<T, FundMeError>;

/// Main error enum for all FundMe errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundMeError {
    // ============ Funding Errors ============
    /// USD value of the attached amount is below the minimum
    InsufficientValue { usd_value: u128, minimum: u128 },

    /// Value was attached to a function that does not accept it
    NotPayable { function: &'static str },

    // ============ Authorization Errors ============
    /// Only the ledger owner can withdraw
    NotOwner { owner: Address, caller: Address },

    /// Caller is not the feed operator
    Unauthorized { expected: Address, actual: Address },

    // ============ Transfer Errors ============
    /// Native-currency transfer was rejected
    TransferFailed { to: Address, amount: u128 },

    /// Account cannot cover the requested amount
    InsufficientBalance { available: u128, requested: u128 },

    // ============ Query Errors ============
    /// Funder index past the end of the funder list
    FunderIndexOutOfRange { index: usize, len: usize },

    // ============ Oracle Errors ============
    /// Feed answer is zero or negative
    InvalidPrice { answer: i64 },

    /// Feed precision is not supported
    InvalidDecimals { decimals: u8 },

    /// Requested round has no data
    NoDataPresent { round_id: u64 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    /// Invalid address (e.g., zero address)
    InvalidAddress {
        /// Description of why the address is invalid
        reason: &'static str,
    },

    // ============ State Errors ============
    /// Output state does not match the re-executed action
    InvalidStateTransition,
}

impl FundMeError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientValue { .. } => "E001_INSUFFICIENT_VALUE",
            Self::NotPayable { .. } => "E002_NOT_PAYABLE",
            Self::NotOwner { .. } => "E010_NOT_OWNER",
            Self::Unauthorized { .. } => "E011_UNAUTHORIZED",
            Self::TransferFailed { .. } => "E020_TRANSFER_FAILED",
            Self::InsufficientBalance { .. } => "E021_INSUFFICIENT_BALANCE",
            Self::FunderIndexOutOfRange { .. } => "E030_FUNDER_INDEX",
            Self::InvalidPrice { .. } => "E040_INVALID_PRICE",
            Self::InvalidDecimals { .. } => "E041_INVALID_DECIMALS",
            Self::NoDataPresent { .. } => "E042_NO_DATA_PRESENT",
            Self::Overflow => "E050_OVERFLOW",
            Self::InvalidInput { .. } => "E060_INVALID_INPUT",
            Self::InvalidAddress { .. } => "E061_INVALID_ADDRESS",
            Self::InvalidStateTransition => "E070_INVALID_STATE",
        }
    }

    /// Returns true if this error is recoverable (caller can fix it and resend)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientValue { .. } => true,   // Send more
            Self::NotPayable { .. } => true,          // Send without value
            Self::InsufficientBalance { .. } => true, // Get more funds
            Self::TransferFailed { .. } => true,      // Owner fixes its receiver
            _ => false,
        }
    }
}

//! Price Feed Capability
//!
//! The ledger never calls an oracle directly. It is handed something that
//! implements [`AggregatorV3`], which is a live aggregator on public networks
//! and a fixed-answer mock on development chains.

use crate::errors::{FundMeError, FundMeResult};
use crate::types::{Address, RoundData};

/// Chainlink-style aggregator interface
pub trait AggregatorV3 {
    /// Decimals of every answer this feed reports
    fn decimals(&self) -> u8;

    /// Human-readable feed description
    fn description(&self) -> &str;

    /// Aggregator implementation version
    fn version(&self) -> u64;

    /// Data for a specific round
    fn get_round_data(&self, round_id: u64) -> FundMeResult<RoundData>;

    /// Data for the most recent round
    fn latest_round_data(&self) -> FundMeResult<RoundData>;
}

/// Native-currency payout capability
///
/// Implemented by whatever actually moves value: the development chain's
/// account book, or the coin outputs of a Charms transaction.
pub trait NativeTransfer {
    /// Move `amount` to `to`. Must either move all of it or fail.
    fn transfer(&mut self, to: &Address, amount: u128) -> FundMeResult<()>;
}

/// Read the latest answer, rejecting non-positive prices
pub fn latest_answer<F: AggregatorV3 + ?Sized>(feed: &F) -> FundMeResult<(i64, u8)> {
    let round = feed.latest_round_data()?;
    if round.answer <= 0 {
        return Err(FundMeError::InvalidPrice { answer: round.answer });
    }
    Ok((round.answer, feed.decimals()))
}

/// Fixed-answer feed for unit tests
#[cfg(test)]
pub(crate) struct FixedFeed {
    pub answer: i64,
    pub decimals: u8,
}

#[cfg(test)]
impl AggregatorV3 for FixedFeed {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> &str {
        "fixed"
    }

    fn version(&self) -> u64 {
        4
    }

    fn get_round_data(&self, round_id: u64) -> FundMeResult<RoundData> {
        if round_id != 1 {
            return Err(FundMeError::NoDataPresent { round_id });
        }
        self.latest_round_data()
    }

    fn latest_round_data(&self) -> FundMeResult<RoundData> {
        Ok(RoundData {
            round_id: 1,
            answer: self.answer,
            started_at: 1,
            updated_at: 1,
            answered_in_round: 1,
        })
    }
}

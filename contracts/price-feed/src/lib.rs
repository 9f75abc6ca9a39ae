//! Mock Price Feed Contract
//!
//! Chainlink-compatible ETH/USD aggregator for development chains.
//! Answers are published by a single operator; there is no aggregation,
//! no staleness policy and no deviation limit. Consumers read it through
//! the `AggregatorV3` trait exactly as they would read a live feed.
//!
//! ## Round Model
//!
//! Every `UpdateAnswer` opens a new round stamped with the current block.
//! `UpdateRoundData` overwrites the latest round with explicit values so
//! tests can simulate arbitrary feed histories.

use borsh::{BorshDeserialize, BorshSerialize};

// Charms SDK integration (conditional compilation)
#[cfg(feature = "charms")]
pub mod charms;
use serde::{Deserialize, Serialize};

use fund_me_common::{
    access_control::only_operator,
    constants::price_feed::{DECIMALS, INITIAL_ANSWER, MAX_DECIMALS, MOCK_DESCRIPTION, MOCK_VERSION},
    errors::{FundMeError, FundMeResult},
    events::{EventLog, FundMeEvent},
    price_feed::AggregatorV3,
    types::{Address, PriceFeedAction, RoundData},
    BTreeMap,
};

// ============ Feed State ============

/// One recorded round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoundRecord {
    /// Answer with `decimals` precision
    pub answer: i64,
    /// Block the round started at
    pub started_at: u64,
    /// Block the answer was written at
    pub updated_at: u64,
}

/// Mock aggregator state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct MockAggregatorState {
    /// Precision of every answer
    pub decimals: u8,
    /// Most recent answer
    pub latest_answer: i64,
    /// Block of the most recent answer
    pub latest_timestamp: u64,
    /// Most recent round id (0 = no round yet)
    pub latest_round: u64,
    /// Round history
    pub rounds: BTreeMap<u64, RoundRecord>,
    /// Implementation version
    pub version: u64,
    /// Authorized operator (can publish answers)
    pub operator: Address,
}

impl MockAggregatorState {
    /// Deploy a feed and publish `initial_answer` as round 1
    pub fn new(
        operator: Address,
        decimals: u8,
        initial_answer: i64,
        block_height: u64,
    ) -> FundMeResult<Self> {
        if decimals > MAX_DECIMALS {
            return Err(FundMeError::InvalidDecimals { decimals });
        }

        let mut state = Self {
            decimals,
            latest_answer: 0,
            latest_timestamp: 0,
            latest_round: 0,
            rounds: BTreeMap::new(),
            version: MOCK_VERSION,
            operator,
        };
        state.update_answer(initial_answer, block_height)?;
        Ok(state)
    }

    /// The development default: 8 decimals at $2,000
    pub fn development(operator: Address, block_height: u64) -> FundMeResult<Self> {
        Self::new(operator, DECIMALS, INITIAL_ANSWER, block_height)
    }

    /// Open the next round with `answer`
    fn update_answer(&mut self, answer: i64, block_height: u64) -> FundMeResult<u64> {
        let round_id = self.latest_round
            .checked_add(1)
            .ok_or(FundMeError::Overflow)?;

        self.latest_answer = answer;
        self.latest_timestamp = block_height;
        self.latest_round = round_id;
        self.rounds.insert(round_id, RoundRecord {
            answer,
            started_at: block_height,
            updated_at: block_height,
        });
        Ok(round_id)
    }

    /// Make `round_id` the latest round with explicit values
    fn update_round_data(&mut self, round_id: u64, answer: i64, timestamp: u64, started_at: u64) {
        self.latest_round = round_id;
        self.latest_answer = answer;
        self.latest_timestamp = timestamp;
        self.rounds.insert(round_id, RoundRecord {
            answer,
            started_at,
            updated_at: timestamp,
        });
    }

    fn round(&self, round_id: u64) -> FundMeResult<RoundData> {
        let record = self.rounds
            .get(&round_id)
            .ok_or(FundMeError::NoDataPresent { round_id })?;
        Ok(RoundData {
            round_id,
            answer: record.answer,
            started_at: record.started_at,
            updated_at: record.updated_at,
            answered_in_round: round_id,
        })
    }
}

impl AggregatorV3 for MockAggregatorState {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> &str {
        MOCK_DESCRIPTION
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn get_round_data(&self, round_id: u64) -> FundMeResult<RoundData> {
        self.round(round_id)
    }

    fn latest_round_data(&self) -> FundMeResult<RoundData> {
        self.round(self.latest_round)
    }
}

// ============ Execution Context ============

/// Context for executing feed operations
pub struct PriceFeedContext {
    /// Feed state, updated in place on success
    pub state: MockAggregatorState,
    /// Signer address
    pub signer: Address,
    /// Current block height
    pub block_height: u64,
    /// Event log
    pub events: EventLog,
}

impl PriceFeedContext {
    /// Context for `signer` acting on `state` at `block_height`
    pub fn new(state: MockAggregatorState, signer: Address, block_height: u64) -> Self {
        Self {
            state,
            signer,
            block_height,
            events: EventLog::new(),
        }
    }
}

// ============ Deployment ============

/// Deploy a feed, returning its state and deployment events
pub fn deploy(
    operator: Address,
    decimals: u8,
    initial_answer: i64,
    block_height: u64,
) -> FundMeResult<(MockAggregatorState, EventLog)> {
    let state = MockAggregatorState::new(operator, decimals, initial_answer, block_height)?;

    let mut events = EventLog::new();
    events.emit(FundMeEvent::FeedDeployed {
        operator,
        decimals,
        block_height,
    });
    emit_round(&mut events, &state, operator, block_height);

    Ok((state, events))
}

// ============ Execution Functions ============

/// Main execution entry point
pub fn execute(ctx: &mut PriceFeedContext, action: &PriceFeedAction) -> FundMeResult<()> {
    match action {
        PriceFeedAction::Initialize { .. } => Err(FundMeError::InvalidInput {
            param: "action",
            reason: "feed already initialized",
        }),
        PriceFeedAction::UpdateAnswer { answer } => execute_update_answer(ctx, *answer),
        PriceFeedAction::UpdateRoundData { round_id, answer, timestamp, started_at } => {
            execute_update_round_data(ctx, *round_id, *answer, *timestamp, *started_at)
        }
    }
}

/// Publish a new answer in a new round
fn execute_update_answer(ctx: &mut PriceFeedContext, answer: i64) -> FundMeResult<()> {
    // 1. Only operator can publish
    only_operator(&ctx.state.operator, &ctx.signer)?;

    // 2. Open the round
    ctx.state.update_answer(answer, ctx.block_height)?;

    // 3. Emit events
    emit_round(&mut ctx.events, &ctx.state, ctx.signer, ctx.block_height);

    Ok(())
}

/// Overwrite the latest round
fn execute_update_round_data(
    ctx: &mut PriceFeedContext,
    round_id: u64,
    answer: i64,
    timestamp: u64,
    started_at: u64,
) -> FundMeResult<()> {
    // 1. Only operator can publish
    only_operator(&ctx.state.operator, &ctx.signer)?;

    // 2. Round 0 means "no data"
    if round_id == 0 {
        return Err(FundMeError::InvalidInput {
            param: "round_id",
            reason: "round 0 is reserved",
        });
    }

    // 3. A round cannot finish before it starts
    if timestamp < started_at {
        return Err(FundMeError::InvalidInput {
            param: "timestamp",
            reason: "updated before started",
        });
    }

    // 4. Write the round
    ctx.state.update_round_data(round_id, answer, timestamp, started_at);

    // 5. Emit events
    emit_round(&mut ctx.events, &ctx.state, ctx.signer, ctx.block_height);

    Ok(())
}

fn emit_round(events: &mut EventLog, state: &MockAggregatorState, by: Address, block_height: u64) {
    let started_at = state.rounds
        .get(&state.latest_round)
        .map(|r| r.started_at)
        .unwrap_or(state.latest_timestamp);

    events.emit(FundMeEvent::AnswerUpdated {
        current: state.latest_answer,
        round_id: state.latest_round,
        updated_at: state.latest_timestamp,
        block_height,
    });
    events.emit(FundMeEvent::NewRound {
        round_id: state.latest_round,
        started_by: by,
        started_at,
        block_height,
    });
}

// ============ Tests ============

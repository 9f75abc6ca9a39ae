//! Charms SDK Integration for the Mock Price Feed
//!
//! Bridges Charms SDK types with the feed execution logic.
//!
//! ```text
//! UpdateAnswer (by operator):
//!   IN:  [Feed state charm]
//!   OUT: [Feed state charm (new round)]
//!
//! Ledger reading the price during Fund:
//!   REFS: [Feed state charm]  <- Not consumed, just referenced
//!   IN:   [Ledger state charm]
//!   OUT:  [Ledger state charm (updated)]
//! ```
//!
//! Validation re-executes the witnessed action on the input state and
//! accepts the transaction only if the result equals the output state.

use charms_data::{App, Data, Transaction};
use crate::{execute, MockAggregatorState, PriceFeedContext};
use fund_me_common::types::{Address, PriceFeedAction};

// ============ Operation Codes ============

/// Operation codes for feed actions (encoded in witness)
pub mod op {
    /// Initialize feed (first-time creation)
    pub const INITIALIZE: u8 = 0x00;
    /// Publish a new answer (operator only)
    pub const UPDATE_ANSWER: u8 = 0x30;
    /// Overwrite the latest round (operator only)
    pub const UPDATE_ROUND_DATA: u8 = 0x31;
}

// ============ Witness Structures ============

/// Witness data for feed operations
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PriceFeedWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Address that signed the transaction
    pub signer: Address,
    /// Block height the transaction executes at
    pub block_height: u64,
    /// Feed precision (for Initialize)
    pub decimals: Option<u8>,
    /// Answer with feed precision
    pub answer: Option<i64>,
    /// Round to overwrite (for UpdateRoundData)
    pub round_id: Option<u64>,
    /// Round update block (for UpdateRoundData)
    pub timestamp: Option<u64>,
    /// Round start block (for UpdateRoundData)
    pub started_at: Option<u64>,
}

impl PriceFeedWitness {
    /// Create witness for feed initialization
    pub fn initialize(operator: Address, decimals: u8, initial_answer: i64, block_height: u64) -> Self {
        Self {
            op: op::INITIALIZE,
            signer: operator,
            block_height,
            decimals: Some(decimals),
            answer: Some(initial_answer),
            round_id: None,
            timestamp: None,
            started_at: None,
        }
    }

    /// Create witness for a new answer
    pub fn update_answer(signer: Address, answer: i64, block_height: u64) -> Self {
        Self {
            op: op::UPDATE_ANSWER,
            signer,
            block_height,
            decimals: None,
            answer: Some(answer),
            round_id: None,
            timestamp: None,
            started_at: None,
        }
    }

    /// Create witness for overwriting the latest round
    pub fn update_round_data(
        signer: Address,
        round_id: u64,
        answer: i64,
        timestamp: u64,
        started_at: u64,
        block_height: u64,
    ) -> Self {
        Self {
            op: op::UPDATE_ROUND_DATA,
            signer,
            block_height,
            decimals: None,
            answer: Some(answer),
            round_id: Some(round_id),
            timestamp: Some(timestamp),
            started_at: Some(started_at),
        }
    }
}

// ============ Main Validation Function ============

/// Validates a feed operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The price feed app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (unused)
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn validate_price_feed_operation(
    app: &App,
    tx: &Transaction,
    _x: &Data,
    w: &Data,
) -> bool {
    // 1. Parse witness to get operation
    let witness = match parse_witness(w) {
        Some(w) => w,
        None => return false,
    };

    // 2. Convert to internal action type
    let action = match witness_to_action(&witness) {
        Some(a) => a,
        None => return false,
    };

    // 3. Handle Initialize specially (no input state required)
    if let PriceFeedAction::Initialize { decimals, initial_answer } = action {
        let output_state = match extract_output_state(app, tx) {
            Some(s) => s,
            None => return false,
        };
        return MockAggregatorState::new(witness.signer, decimals, initial_answer, witness.block_height)
            .map(|expected| expected == output_state)
            .unwrap_or(false);
    }

    // 4. For other operations, extract both input and output states
    let (state, new_state) = match extract_feed_states(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 5. Re-execute and compare
    let mut ctx = PriceFeedContext::new(state, witness.signer, witness.block_height);
    if execute(&mut ctx, &action).is_err() {
        return false;
    }
    ctx.state == new_state
}

// ============ Parsing Functions ============

/// Parse witness data into PriceFeedWitness
fn parse_witness(w: &Data) -> Option<PriceFeedWitness> {
    w.value::<PriceFeedWitness>().ok()
}

/// Convert witness to internal action type
fn witness_to_action(w: &PriceFeedWitness) -> Option<PriceFeedAction> {
    match w.op {
        op::INITIALIZE => Some(PriceFeedAction::Initialize {
            decimals: w.decimals?,
            initial_answer: w.answer?,
        }),
        op::UPDATE_ANSWER => Some(PriceFeedAction::UpdateAnswer {
            answer: w.answer?,
        }),
        op::UPDATE_ROUND_DATA => Some(PriceFeedAction::UpdateRoundData {
            round_id: w.round_id?,
            answer: w.answer?,
            timestamp: w.timestamp?,
            started_at: w.started_at?,
        }),
        _ => None,
    }
}

// ============ State Extraction ============

/// Extract only the output feed state (for Initialize)
fn extract_output_state(app: &App, tx: &Transaction) -> Option<MockAggregatorState> {
    tx.outs.iter()
        .find_map(|charms| {
            charms.get(app).and_then(|data| {
                data.value::<MockAggregatorState>().ok()
            })
        })
}

/// Extract feed states from transaction inputs and outputs
fn extract_feed_states(
    app: &App,
    tx: &Transaction,
) -> Option<(MockAggregatorState, MockAggregatorState)> {
    let input_state = tx.ins.iter()
        .find_map(|(_, charms)| {
            charms.get(app).and_then(|data| {
                data.value::<MockAggregatorState>().ok()
            })
        })?;

    let output_state = extract_output_state(app, tx)?;

    Some((input_state, output_state))
}

// ============ Feed Reading (for other apps) ============

/// Read feed state from reference inputs by feed identity
///
/// Used by the ledger to price a contribution without consuming the feed.
pub fn read_feed_from_refs(tx: &Transaction, feed_id: &Address) -> Option<MockAggregatorState> {
    for (_, charms) in tx.refs.iter() {
        for (app, data) in charms.iter() {
            if app.identity.0 != *feed_id {
                continue;
            }
            if let Ok(state) = data.value::<MockAggregatorState>() {
                return Some(state);
            }
        }
    }
    None
}

// ============ Tests ============

//! Charms SDK Integration for the FundMe Ledger
//!
//! ```text
//! Fund (by anyone):
//!   REFS: [Feed state charm]   <- priced, not consumed
//!   IN:   [Ledger state charm]
//!   OUT:  [Ledger state charm (record added)]
//!
//! Withdraw (by owner):
//!   REFS: [Feed state charm]
//!   IN:   [Ledger state charm]
//!   OUT:  [Ledger state charm (cleared)] + coin outputs paying the owner
//! ```
//!
//! The witnessed call is re-executed against the input state; the resulting
//! state must equal the output charm. Contributions must arrive as coin
//! locked to the ledger's app identity, and withdrawal payouts must be
//! covered by coin outputs paying the owner.

use charms_data::{App, Data, NativeOutput, Transaction};
use crate::{execute, initialize, verify_accounting, FundMeContext, FundMeState};
use fund_me_common::{
    errors::{FundMeError, FundMeResult},
    price_feed::NativeTransfer,
    types::{Address, AppId, CallContext, FundMeAction},
    BTreeMap, Vec,
};
use fund_me_price_feed::charms::read_feed_from_refs;

// ============ Operation Codes ============

/// Operation codes for ledger actions (encoded in witness)
pub mod op {
    /// Initialize ledger (first-time creation)
    pub const INITIALIZE: u8 = 0x00;
    /// Contribute native currency
    pub const FUND: u8 = 0x10;
    /// Plain transfer with empty calldata
    pub const RECEIVE: u8 = 0x11;
    /// Transfer with unrecognized calldata
    pub const FALLBACK: u8 = 0x12;
    /// Owner drains the ledger
    pub const WITHDRAW: u8 = 0x20;
    /// Owner drains the ledger, single read of the funder list
    pub const CHEAPER_WITHDRAW: u8 = 0x21;
}

// ============ Witness Structures ============

/// Witness data for ledger operations
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FundMeWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Message sender
    pub caller: Address,
    /// Attached native value (absent = 0)
    pub value: Option<u128>,
    /// Block height the call executes at
    pub block_height: u64,
    /// Feed to bind (for Initialize)
    pub price_feed: Option<Address>,
    /// Calldata (for Fallback)
    pub data: Option<Vec<u8>>,
}

impl FundMeWitness {
    fn call(op: u8, caller: Address, value: u128, block_height: u64) -> Self {
        Self {
            op,
            caller,
            value: Some(value),
            block_height,
            price_feed: None,
            data: None,
        }
    }

    /// Create witness for ledger deployment
    pub fn initialize(owner: Address, price_feed: Address, block_height: u64) -> Self {
        Self {
            price_feed: Some(price_feed),
            ..Self::call(op::INITIALIZE, owner, 0, block_height)
        }
    }

    /// Create witness for a contribution
    pub fn fund(funder: Address, value: u128, block_height: u64) -> Self {
        Self::call(op::FUND, funder, value, block_height)
    }

    /// Create witness for a bare transfer
    pub fn send(funder: Address, value: u128, data: Vec<u8>, block_height: u64) -> Self {
        if data.is_empty() {
            return Self::call(op::RECEIVE, funder, value, block_height);
        }
        Self {
            data: Some(data),
            ..Self::call(op::FALLBACK, funder, value, block_height)
        }
    }

    /// Create witness for a withdrawal
    pub fn withdraw(owner: Address, cheaper: bool, block_height: u64) -> Self {
        let op = if cheaper { op::CHEAPER_WITHDRAW } else { op::WITHDRAW };
        Self::call(op, owner, 0, block_height)
    }

    fn call_context(&self) -> CallContext {
        CallContext::with_value(self.caller, self.value.unwrap_or(0), self.block_height)
    }
}

// ============ Coin Payout ============

/// Pays withdrawals out of the transaction's coin outputs
///
/// A transfer to `to` is covered only by outputs whose destination is `to`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinPayout {
    /// Unclaimed output value per destination
    available: BTreeMap<Vec<u8>, u128>,
}

impl CoinPayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output of `amount` paying `dest`
    pub fn with_output(mut self, dest: &[u8], amount: u128) -> Self {
        let entry = self.available.entry(dest.to_vec()).or_insert(0);
        *entry = entry.saturating_add(amount);
        self
    }

    /// Coin outputs of `tx`
    pub fn from_tx(tx: &Transaction) -> Self {
        tx.coin_outs
            .iter()
            .flatten()
            .fold(Self::new(), |payout, o| payout.with_output(&o.dest, o.amount as u128))
    }

    /// Unclaimed output value paying `dest`
    pub fn available_to(&self, dest: &[u8]) -> u128 {
        self.available.get(dest).copied().unwrap_or(0)
    }
}

impl NativeTransfer for CoinPayout {
    fn transfer(&mut self, to: &Address, amount: u128) -> FundMeResult<()> {
        let remaining = self.available_to(to)
            .checked_sub(amount)
            .ok_or(FundMeError::TransferFailed { to: *to, amount })?;
        self.available.insert(to.to_vec(), remaining);
        Ok(())
    }
}

// ============ Main Validation Function ============

/// Validates a ledger operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The ledger app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (unused)
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn validate_fund_me_operation(
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
    if let FundMeAction::Initialize { price_feed } = action {
        let output_state = match extract_output_state(app, tx) {
            Some(s) => s,
            None => return false,
        };
        return initialize(&witness.call_context(), price_feed)
            .map(|(expected, _)| expected == output_state)
            .unwrap_or(false);
    }

    // 4. For other operations, extract both input and output states
    let (state, new_state) = match extract_ledger_states(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 5. Contributions must be locked to the ledger in this transaction
    if is_contribution(&action) {
        let (ledger_in, ledger_out) = calculate_ledger_flows(tx, &ledger_id(app));
        if ledger_out.saturating_sub(ledger_in) < witness.value.unwrap_or(0) {
            return false;
        }
    }

    // 6. Price feed the ledger is bound to
    let feed = match read_feed_from_refs(tx, &state.price_feed) {
        Some(f) => f,
        None => return false,
    };

    // 7. Re-execute and compare
    let mut payout = CoinPayout::from_tx(tx);
    let mut ctx = FundMeContext::new(state, witness.call_context(), &feed, &mut payout);
    if execute(&mut ctx, &action).is_err() {
        return false;
    }
    ctx.state == new_state && verify_accounting(&new_state).is_ok()
}

fn is_contribution(action: &FundMeAction) -> bool {
    matches!(
        action,
        FundMeAction::Fund | FundMeAction::Receive | FundMeAction::Fallback { .. }
    )
}

/// Coin destination holding the ledger's funds
fn ledger_id(app: &App) -> AppId {
    app.identity.0
}

/// Coin value spent from and paid to `ledger`
fn calculate_ledger_flows(tx: &Transaction, ledger: &AppId) -> (u128, u128) {
    let locked_to = |outs: &Option<Vec<NativeOutput>>| -> u128 {
        outs.iter()
            .flatten()
            .filter(|o| o.dest.as_slice() == ledger.as_slice())
            .map(|o| o.amount as u128)
            .sum()
    };

    (locked_to(&tx.coin_ins), locked_to(&tx.coin_outs))
}

// ============ Parsing Functions ============

/// Parse witness data into FundMeWitness
fn parse_witness(w: &Data) -> Option<FundMeWitness> {
    w.value::<FundMeWitness>().ok()
}

/// Convert witness to internal action type
fn witness_to_action(w: &FundMeWitness) -> Option<FundMeAction> {
    match w.op {
        op::INITIALIZE => Some(FundMeAction::Initialize {
            price_feed: w.price_feed?,
        }),
        op::FUND => Some(FundMeAction::Fund),
        op::RECEIVE => Some(FundMeAction::Receive),
        op::FALLBACK => Some(FundMeAction::Fallback {
            data: w.data.clone()?,
        }),
        op::WITHDRAW => Some(FundMeAction::Withdraw),
        op::CHEAPER_WITHDRAW => Some(FundMeAction::CheaperWithdraw),
        _ => None,
    }
}

// ============ State Extraction ============

/// Extract only the output ledger state (for Initialize)
fn extract_output_state(app: &App, tx: &Transaction) -> Option<FundMeState> {
    tx.outs.iter()
        .find_map(|charms| {
            charms.get(app).and_then(|data| {
                data.value::<FundMeState>().ok()
            })
        })
}

/// Extract ledger states from transaction inputs and outputs
fn extract_ledger_states(app: &App, tx: &Transaction) -> Option<(FundMeState, FundMeState)> {
    let input_state = tx.ins.iter()
        .find_map(|(_, charms)| {
            charms.get(app).and_then(|data| {
                data.value::<FundMeState>().ok()
            })
        })?;

    let output_state = extract_output_state(app, tx)?;

    Some((input_state, output_state))
}

// ============ Tests ============

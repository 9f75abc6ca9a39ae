//! FundMe Ledger Contract
//!
//! Crowdfunding ledger with a USD floor on contributions.
//! Anyone can fund with at least $50 worth of native currency (priced by an
//! injected `AggregatorV3` feed); only the owner can withdraw, and
//! withdrawing resets every contribution record.
//!
//! ## Atomicity
//!
//! Every operation either commits fully or leaves the state untouched:
//! - `Fund` checks the threshold and all arithmetic before its first write
//! - `Withdraw`/`CheaperWithdraw` clear a staged copy, pay the owner through
//!   `NativeTransfer`, and only then commit the staged copy
//!
//! A rejected payout therefore cannot leave the ledger "cleared but unpaid".

use borsh::{BorshDeserialize, BorshSerialize};

// Charms SDK integration (conditional compilation)
#[cfg(feature = "charms")]
pub mod charms;
pub mod devnet;
use serde::{Deserialize, Serialize};

use fund_me_common::{
    access_control::{non_payable, only_owner},
    constants::fund_me::MINIMUM_USD,
    errors::{FundMeError, FundMeResult},
    events::{EventLog, FundMeEvent},
    math::get_conversion_rate,
    price_feed::{AggregatorV3, NativeTransfer},
    types::{is_zero_address, Address, CallContext, FundMeAction},
    BTreeMap, Vec,
};


// ============ Ledger State ============

/// Ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FundMeState {
    /// Deployer; the only address allowed to withdraw
    pub owner: Address,
    /// ETH/USD aggregator used to price contributions
    pub price_feed: Address,
    /// Contributors since the last withdrawal, in first-funding order
    pub funders: Vec<Address>,
    /// Cumulative contribution per address (absent = 0)
    pub address_to_amount_funded: BTreeMap<Address, u128>,
    /// Native currency held by the ledger
    pub balance: u128,
}

impl FundMeState {
    /// Fresh ledger owned by `owner` and priced by `price_feed`
    pub fn new(owner: Address, price_feed: Address) -> FundMeResult<Self> {
        if is_zero_address(&price_feed) {
            return Err(FundMeError::InvalidAddress {
                reason: "price feed cannot be the zero address",
            });
        }

        Ok(Self {
            owner,
            price_feed,
            funders: Vec::new(),
            address_to_amount_funded: BTreeMap::new(),
            balance: 0,
        })
    }

    /// Whether the ledger holds no contributions
    pub fn is_drained(&self) -> bool {
        self.funders.is_empty() && self.address_to_amount_funded.is_empty() && self.balance == 0
    }
}

// ============ Execution Context ============

/// Context for executing ledger operations
pub struct FundMeContext<'a> {
    /// Ledger state, replaced only when an operation succeeds
    pub state: FundMeState,
    /// Caller, attached value, block height
    pub call: CallContext,
    /// Price feed bound to this ledger
    pub price_feed: &'a dyn AggregatorV3,
    /// Where withdrawals are paid out
    pub treasury: &'a mut dyn NativeTransfer,
    /// Event log
    pub events: EventLog,
}

impl<'a> FundMeContext<'a> {
    /// Context for one call against `state`
    pub fn new(
        state: FundMeState,
        call: CallContext,
        price_feed: &'a dyn AggregatorV3,
        treasury: &'a mut dyn NativeTransfer,
    ) -> Self {
        Self {
            state,
            call,
            price_feed,
            treasury,
            events: EventLog::new(),
        }
    }
}

// ============ Construction ============

/// Construct the ledger; the caller becomes the owner
pub fn initialize(call: &CallContext, price_feed: Address) -> FundMeResult<(FundMeState, EventLog)> {
    non_payable(call, "constructor")?;
    let state = FundMeState::new(call.caller, price_feed)?;

    let mut events = EventLog::new();
    events.emit(FundMeEvent::LedgerDeployed {
        owner: state.owner,
        price_feed,
        block_height: call.block_height,
    });

    Ok((state, events))
}

// ============ Execution Functions ============

/// Main execution entry point
pub fn execute(ctx: &mut FundMeContext<'_>, action: &FundMeAction) -> FundMeResult<()> {
    match action {
        FundMeAction::Initialize { .. } => Err(FundMeError::InvalidInput {
            param: "action",
            reason: "ledger already initialized",
        }),
        FundMeAction::Fund => execute_fund(ctx),
        // Bare transfers and unknown calldata are contributions too
        FundMeAction::Receive => execute_fund(ctx),
        FundMeAction::Fallback { .. } => execute_fund(ctx),
        FundMeAction::Withdraw => execute_withdraw(ctx),
        FundMeAction::CheaperWithdraw => execute_cheaper_withdraw(ctx),
    }
}

/// Accept a contribution worth at least `MINIMUM_USD`
fn execute_fund(ctx: &mut FundMeContext<'_>) -> FundMeResult<()> {
    let funder = ctx.call.caller;
    let amount = ctx.call.value;

    // 1. Price the contribution
    let usd_value = get_conversion_rate(amount, ctx.price_feed)?;
    if usd_value < MINIMUM_USD {
        return Err(FundMeError::InsufficientValue {
            usd_value,
            minimum: MINIMUM_USD,
        });
    }

    // 2. Compute new totals before touching state
    let previous = get_address_to_amount_funded(&ctx.state, &funder);
    let total_funded = previous
        .checked_add(amount)
        .ok_or(FundMeError::Overflow)?;
    let new_balance = ctx.state.balance
        .checked_add(amount)
        .ok_or(FundMeError::Overflow)?;

    // 3. Commit: list and record move together
    let new_funder = previous == 0;
    if new_funder {
        ctx.state.funders.push(funder);
    }
    ctx.state.address_to_amount_funded.insert(funder, total_funded);
    ctx.state.balance = new_balance;

    // 4. Emit event
    ctx.events.emit(FundMeEvent::Funded {
        funder,
        amount,
        usd_value,
        total_funded,
        new_funder,
        block_height: ctx.call.block_height,
    });

    Ok(())
}

/// Owner drains the ledger, reading the funder list from state each step
fn execute_withdraw(ctx: &mut FundMeContext<'_>) -> FundMeResult<()> {
    only_owner(&ctx.state.owner, &ctx.call.caller)?;
    non_payable(&ctx.call, "withdraw")?;

    let mut staged = ctx.state.clone();
    for funder_index in 0..staged.funders.len() {
        let funder = staged.funders[funder_index];
        staged.address_to_amount_funded.remove(&funder);
    }
    staged.funders = Vec::new();

    settle_withdrawal(ctx, staged)
}

/// Owner drains the ledger, reading the funder list once into a local copy
fn execute_cheaper_withdraw(ctx: &mut FundMeContext<'_>) -> FundMeResult<()> {
    only_owner(&ctx.state.owner, &ctx.call.caller)?;
    non_payable(&ctx.call, "cheaperWithdraw")?;

    let mut staged = ctx.state.clone();
    let funders = core::mem::take(&mut staged.funders);
    for funder in &funders {
        staged.address_to_amount_funded.remove(funder);
    }

    settle_withdrawal(ctx, staged)
}

/// Pay the owner the full balance, then commit the cleared state
fn settle_withdrawal(ctx: &mut FundMeContext<'_>, mut staged: FundMeState) -> FundMeResult<()> {
    let owner = ctx.state.owner;
    let amount = staged.balance;
    let funders_cleared = u32::try_from(ctx.state.funders.len())
        .map_err(|_| FundMeError::Overflow)?;
    staged.balance = 0;

    // Last failure-checked step; on error `staged` is dropped
    ctx.treasury.transfer(&owner, amount)?;
    ctx.state = staged;

    ctx.events.emit(FundMeEvent::Withdrawn {
        owner,
        amount,
        funders_cleared,
        block_height: ctx.call.block_height,
    });

    Ok(())
}

// ============ Query Functions ============

/// Ledger owner
pub fn get_owner(state: &FundMeState) -> Address {
    state.owner
}

/// Price feed the ledger is bound to
pub fn get_price_feed(state: &FundMeState) -> Address {
    state.price_feed
}

/// Amount recorded for `funder` (0 if none)
pub fn get_address_to_amount_funded(state: &FundMeState, funder: &Address) -> u128 {
    state.address_to_amount_funded.get(funder).copied().unwrap_or(0)
}

/// Funder at `index`
///
/// # Errors
/// - `FunderIndexOutOfRange` past the end of the list
pub fn get_funder(state: &FundMeState, index: usize) -> FundMeResult<Address> {
    state.funders
        .get(index)
        .copied()
        .ok_or(FundMeError::FunderIndexOutOfRange {
            index,
            len: state.funders.len(),
        })
}

/// Number of entries in the funder list
pub fn get_funders_count(state: &FundMeState) -> usize {
    state.funders.len()
}

/// Native currency held by the ledger
pub fn get_balance(state: &FundMeState) -> u128 {
    state.balance
}

/// Version of the bound price feed
pub fn get_version<F: AggregatorV3 + ?Sized>(price_feed: &F) -> u64 {
    price_feed.version()
}

/// Minimum contribution in USD (18 decimals)
pub fn get_minimum_usd() -> u128 {
    MINIMUM_USD
}

// ============ Helper Functions ============

/// Check the accounting invariants of a state
///
/// - records sum to the balance
/// - every funder has a non-zero record and appears once
/// - every non-zero record belongs to a listed funder
pub fn verify_accounting(state: &FundMeState) -> FundMeResult<()> {
    let mut total: u128 = 0;
    for amount in state.address_to_amount_funded.values() {
        if *amount == 0 {
            return Err(FundMeError::InvalidStateTransition);
        }
        total = total.checked_add(*amount).ok_or(FundMeError::Overflow)?;
    }
    if total != state.balance {
        return Err(FundMeError::InvalidStateTransition);
    }

    if state.funders.len() != state.address_to_amount_funded.len() {
        return Err(FundMeError::InvalidStateTransition);
    }
    for funder in &state.funders {
        if !state.address_to_amount_funded.contains_key(funder) {
            return Err(FundMeError::InvalidStateTransition);
        }
    }

    Ok(())
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use fund_me_common::constants::native::ONE;
    use fund_me_common::events::EventType;
    use fund_me_price_feed::MockAggregatorState;

    const ONE_ETH: u128 = ONE;

    fn owner() -> Address {
        [1u8; 32]
    }

    fn funder() -> Address {
        [2u8; 32]
    }

    fn feed_address() -> Address {
        [9u8; 32]
    }

    /// Records payouts, or rejects them all
    #[derive(Default)]
    struct RecordingTreasury {
        paid: Vec<(Address, u128)>,
        reject: bool,
    }

    impl NativeTransfer for RecordingTreasury {
        fn transfer(&mut self, to: &Address, amount: u128) -> FundMeResult<()> {
            if self.reject {
                return Err(FundMeError::TransferFailed { to: *to, amount });
            }
            self.paid.push((*to, amount));
            Ok(())
        }
    }

    fn create_test_feed() -> MockAggregatorState {
        MockAggregatorState::development([7u8; 32], 1).unwrap()
    }

    fn create_test_context<'a>(
        feed: &'a MockAggregatorState,
        treasury: &'a mut RecordingTreasury,
    ) -> FundMeContext<'a> {
        let state = FundMeState::new(owner(), feed_address()).unwrap();
        FundMeContext::new(state, CallContext::new(owner(), 100), feed, treasury)
    }

    fn fund_as(ctx: &mut FundMeContext<'_>, caller: Address, value: u128) -> FundMeResult<()> {
        ctx.call = CallContext::with_value(caller, value, ctx.call.block_height + 1);
        execute(ctx, &FundMeAction::Fund)
    }

    fn withdraw_as(ctx: &mut FundMeContext<'_>, caller: Address, action: FundMeAction) -> FundMeResult<()> {
        ctx.call = CallContext::new(caller, ctx.call.block_height + 1);
        execute(ctx, &action)
    }

    #[test]
    fn test_initialize_sets_owner_and_feed() {
        let (state, events) = initialize(&CallContext::new(owner(), 1), feed_address()).unwrap();

        assert_eq!(get_owner(&state), owner());
        assert_eq!(get_price_feed(&state), feed_address());
        assert!(state.is_drained());
        assert_eq!(events.filter_by_type(EventType::LedgerDeployed).len(), 1);
    }

    #[test]
    fn test_initialize_rejects_zero_feed() {
        let result = initialize(&CallContext::new(owner(), 1), [0u8; 32]);
        assert!(matches!(result, Err(FundMeError::InvalidAddress { .. })));
    }

    #[test]
    fn test_initialize_not_payable() {
        let result = initialize(&CallContext::with_value(owner(), 1, 1), feed_address());
        assert_eq!(result.map(|_| ()), Err(FundMeError::NotPayable { function: "constructor" }));
    }

    #[test]
    fn test_fund_success() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        let result = fund_as(&mut ctx, funder(), ONE_ETH);

        assert!(result.is_ok(), "Should succeed: {:?}", result);
        assert_eq!(get_address_to_amount_funded(&ctx.state, &funder()), ONE_ETH);
        assert_eq!(get_funder(&ctx.state, 0), Ok(funder()));
        assert_eq!(get_balance(&ctx.state), ONE_ETH);
        assert_eq!(ctx.events.len(), 1);
        assert!(verify_accounting(&ctx.state).is_ok());
    }

    #[test]
    fn test_fund_below_minimum_leaves_state_unchanged() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);
        let before = ctx.state.clone();

        // 0.01 ETH at $2,000 = $20
        let result = fund_as(&mut ctx, funder(), ONE_ETH / 100);

        assert_eq!(
            result,
            Err(FundMeError::InsufficientValue {
                usd_value: 20 * ONE,
                minimum: MINIMUM_USD,
            })
        );
        assert_eq!(ctx.state, before);
        assert!(!ctx.events.has_events());
    }

    #[test]
    fn test_fund_exactly_minimum() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        // $50 at $2,000 = 0.025 ETH
        assert!(fund_as(&mut ctx, funder(), ONE_ETH / 40).is_ok());
        assert!(fund_as(&mut ctx, funder(), ONE_ETH / 40 - 1).is_err());
    }

    #[test]
    fn test_fund_zero_value_fails() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        assert!(matches!(
            fund_as(&mut ctx, funder(), 0),
            Err(FundMeError::InsufficientValue { usd_value: 0, .. })
        ));
    }

    #[test]
    fn test_repeat_funding_accumulates_without_duplicate() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        fund_as(&mut ctx, funder(), ONE_ETH).unwrap();
        fund_as(&mut ctx, funder(), 2 * ONE_ETH).unwrap();

        assert_eq!(get_address_to_amount_funded(&ctx.state, &funder()), 3 * ONE_ETH);
        assert_eq!(get_funders_count(&ctx.state), 1);
        assert!(verify_accounting(&ctx.state).is_ok());

        match &ctx.events.events()[1] {
            FundMeEvent::Funded { new_funder, total_funded, .. } => {
                assert!(!new_funder);
                assert_eq!(*total_funded, 3 * ONE_ETH);
            }
            other => panic!("Expected Funded event, got {:?}", other),
        }
    }

    #[test]
    fn test_fund_overflow_protection() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        // Prior record close to the limit
        ctx.state.funders.push(funder());
        ctx.state.address_to_amount_funded.insert(funder(), u128::MAX - ONE_ETH);
        ctx.state.balance = u128::MAX - ONE_ETH;
        let before = ctx.state.clone();

        let result = fund_as(&mut ctx, funder(), 2 * ONE_ETH);

        assert_eq!(result, Err(FundMeError::Overflow));
        assert_eq!(ctx.state, before);
    }

    #[test]
    fn test_receive_and_fallback_route_to_fund() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        ctx.call = CallContext::with_value(funder(), ONE_ETH, 101);
        execute(&mut ctx, &FundMeAction::Receive).unwrap();

        ctx.call = CallContext::with_value([3u8; 32], ONE_ETH, 102);
        execute(&mut ctx, &FundMeAction::Fallback { data: vec![0xde, 0xad] }).unwrap();

        assert_eq!(get_funders_count(&ctx.state), 2);
        assert_eq!(get_balance(&ctx.state), 2 * ONE_ETH);

        ctx.call = CallContext::with_value(funder(), 1, 103);
        assert!(matches!(
            execute(&mut ctx, &FundMeAction::Receive),
            Err(FundMeError::InsufficientValue { .. })
        ));
    }

    #[test]
    fn test_withdraw_pays_owner_and_clears() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);
        fund_as(&mut ctx, funder(), ONE_ETH).unwrap();
        fund_as(&mut ctx, [3u8; 32], 2 * ONE_ETH).unwrap();

        let result = withdraw_as(&mut ctx, owner(), FundMeAction::Withdraw);

        assert!(result.is_ok(), "Should succeed: {:?}", result);
        assert!(ctx.state.is_drained());
        assert_eq!(get_funder(&ctx.state, 0), Err(FundMeError::FunderIndexOutOfRange { index: 0, len: 0 }));
        assert_eq!(get_address_to_amount_funded(&ctx.state, &funder()), 0);

        match ctx.events.events().last() {
            Some(FundMeEvent::Withdrawn { amount, funders_cleared, .. }) => {
                assert_eq!(*amount, 3 * ONE_ETH);
                assert_eq!(*funders_cleared, 2);
            }
            other => panic!("Expected Withdrawn event, got {:?}", other),
        }
        drop(ctx);
        assert_eq!(treasury.paid, vec![(owner(), 3 * ONE_ETH)]);
    }

    #[test]
    fn test_cheaper_withdraw_pays_owner_and_clears() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);
        fund_as(&mut ctx, funder(), ONE_ETH).unwrap();

        withdraw_as(&mut ctx, owner(), FundMeAction::CheaperWithdraw).unwrap();

        assert!(ctx.state.is_drained());
        drop(ctx);
        assert_eq!(treasury.paid, vec![(owner(), ONE_ETH)]);
    }

    #[test]
    fn test_withdraw_not_owner_fails() {
        for action in [FundMeAction::Withdraw, FundMeAction::CheaperWithdraw] {
            let feed = create_test_feed();
            let mut treasury = RecordingTreasury::default();
            let mut ctx = create_test_context(&feed, &mut treasury);
            fund_as(&mut ctx, funder(), ONE_ETH).unwrap();
            let before = ctx.state.clone();

            let result = withdraw_as(&mut ctx, funder(), action);

            assert_eq!(result, Err(FundMeError::NotOwner { owner: owner(), caller: funder() }));
            assert_eq!(ctx.state, before);
            drop(ctx);
            assert!(treasury.paid.is_empty());
        }
    }

    #[test]
    fn test_withdraw_with_value_fails() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);
        fund_as(&mut ctx, funder(), ONE_ETH).unwrap();

        ctx.call = CallContext::with_value(owner(), 1, 200);
        let result = execute(&mut ctx, &FundMeAction::Withdraw);

        assert_eq!(result, Err(FundMeError::NotPayable { function: "withdraw" }));
        assert_eq!(get_balance(&ctx.state), ONE_ETH);
    }

    #[test]
    fn test_rejected_payout_rolls_back() {
        for action in [FundMeAction::Withdraw, FundMeAction::CheaperWithdraw] {
            let feed = create_test_feed();
            let mut treasury = RecordingTreasury { reject: true, ..Default::default() };
            let mut ctx = create_test_context(&feed, &mut treasury);
            fund_as(&mut ctx, funder(), ONE_ETH).unwrap();
            let before = ctx.state.clone();
            let events_before = ctx.events.len();

            let result = withdraw_as(&mut ctx, owner(), action);

            assert_eq!(result, Err(FundMeError::TransferFailed { to: owner(), amount: ONE_ETH }));
            assert_eq!(ctx.state, before);
            assert_eq!(ctx.events.len(), events_before);
        }
    }

    #[test]
    fn test_withdraw_variants_reach_same_state() {
        let feed = create_test_feed();
        let mut treasury_a = RecordingTreasury::default();
        let mut treasury_b = RecordingTreasury::default();
        let mut a = create_test_context(&feed, &mut treasury_a);
        let mut b = create_test_context(&feed, &mut treasury_b);

        for i in 2..8u8 {
            fund_as(&mut a, [i; 32], ONE_ETH * i as u128).unwrap();
            fund_as(&mut b, [i; 32], ONE_ETH * i as u128).unwrap();
        }

        withdraw_as(&mut a, owner(), FundMeAction::Withdraw).unwrap();
        withdraw_as(&mut b, owner(), FundMeAction::CheaperWithdraw).unwrap();

        assert_eq!(a.state, b.state);
        assert_eq!(a.events.events().last(), b.events.events().last());
        drop(a);
        drop(b);
        assert_eq!(treasury_a.paid, treasury_b.paid);
    }

    #[test]
    fn test_initialize_action_rejected_on_live_ledger() {
        let feed = create_test_feed();
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        let action = FundMeAction::Initialize { price_feed: feed_address() };
        assert!(matches!(execute(&mut ctx, &action), Err(FundMeError::InvalidInput { .. })));
    }

    #[test]
    fn test_fund_rejects_invalid_feed_answer() {
        let mut feed = create_test_feed();
        feed.rounds.get_mut(&1).unwrap().answer = -1;
        let mut treasury = RecordingTreasury::default();
        let mut ctx = create_test_context(&feed, &mut treasury);

        assert_eq!(
            fund_as(&mut ctx, funder(), ONE_ETH),
            Err(FundMeError::InvalidPrice { answer: -1 })
        );
    }

    #[test]
    fn test_query_helpers() {
        let feed = create_test_feed();
        assert_eq!(get_version(&feed), 0);
        assert_eq!(get_minimum_usd(), 50 * ONE);
    }

    #[test]
    fn test_verify_accounting_detects_drift() {
        let mut state = FundMeState::new(owner(), feed_address()).unwrap();
        assert!(verify_accounting(&state).is_ok());

        state.balance = 1;
        assert_eq!(verify_accounting(&state), Err(FundMeError::InvalidStateTransition));

        state.balance = ONE_ETH;
        state.address_to_amount_funded.insert(funder(), ONE_ETH);
        assert_eq!(verify_accounting(&state), Err(FundMeError::InvalidStateTransition));

        state.funders.push(funder());
        assert!(verify_accounting(&state).is_ok());
    }
}

//! In-Process Development Chain
//!
//! Deploys the mock price feed and the ledger the way the deploy tooling
//! does on `hardhat`/`localhost`, then executes calls against them with
//! funded dev accounts. No gas is charged, so balance changes are exact.
//!
//! ```text
//! nonce 0: MockV3Aggregator(8, 2000e8)   <- deployer
//! nonce 1: FundMe(mock address)          <- deployer
//! ```

use std::collections::BTreeSet;

use fund_me_common::{
    constants::deploy::{DEV_ACCOUNT_BALANCE, DEV_ACCOUNT_COUNT},
    constants::price_feed::{DECIMALS, INITIAL_ANSWER},
    errors::{FundMeError, FundMeResult},
    events::EventLog,
    network::NetworkConfig,
    price_feed::NativeTransfer,
    types::{derive_contract_address, Address, CallContext, FundMeAction, PriceFeedAction},
    BTreeMap, Vec,
};
use fund_me_price_feed::{MockAggregatorState, PriceFeedContext};

use crate::{execute, initialize, FundMeContext, FundMeState};

// ============ Accounts ============

/// Externally owned account balances
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    balances: BTreeMap<Address, u128>,
    rejecting: BTreeSet<Address>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account` (0 if unknown)
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, account: &Address, amount: u128) -> FundMeResult<()> {
        let balance = self.balance_of(account)
            .checked_add(amount)
            .ok_or(FundMeError::Overflow)?;
        self.balances.insert(*account, balance);
        Ok(())
    }

    pub fn debit(&mut self, account: &Address, amount: u128) -> FundMeResult<()> {
        let available = self.balance_of(account);
        let balance = available
            .checked_sub(amount)
            .ok_or(FundMeError::InsufficientBalance {
                available,
                requested: amount,
            })?;
        self.balances.insert(*account, balance);
        Ok(())
    }

    /// Make every incoming transfer to `account` fail
    pub fn reject_transfers_to(&mut self, account: Address) {
        self.rejecting.insert(account);
    }

    /// Undo `reject_transfers_to`
    pub fn accept_transfers_to(&mut self, account: &Address) {
        self.rejecting.remove(account);
    }
}

impl NativeTransfer for AccountBook {
    fn transfer(&mut self, to: &Address, amount: u128) -> FundMeResult<()> {
        if self.rejecting.contains(to) {
            return Err(FundMeError::TransferFailed { to: *to, amount });
        }
        self.credit(to, amount)
    }
}

/// Address of dev account `index`
pub fn dev_account(index: usize) -> Address {
    let mut address = [0u8; 32];
    address[12..20].copy_from_slice(b"devacct/");
    address[24..].copy_from_slice(&(index as u64 + 1).to_be_bytes());
    address
}

// ============ Chain ============

/// A development chain with the feed and ledger deployed
#[derive(Debug, Clone)]
pub struct Devnet {
    network: NetworkConfig,
    accounts: Vec<Address>,
    book: AccountBook,
    block_height: u64,
    feed_address: Address,
    feed: MockAggregatorState,
    fund_me_address: Address,
    fund_me: FundMeState,
    events: EventLog,
}

impl Devnet {
    /// Fresh chain with both contracts deployed by account 0
    ///
    /// # Errors
    /// - `InvalidInput` for live networks, which are not simulated
    pub fn deploy(network: NetworkConfig) -> FundMeResult<Self> {
        if !network.is_development() {
            return Err(FundMeError::InvalidInput {
                param: "network",
                reason: "live networks are not simulated",
            });
        }

        // 1. Fund dev accounts
        let accounts: Vec<Address> = (0..DEV_ACCOUNT_COUNT).map(dev_account).collect();
        let mut book = AccountBook::new();
        for account in &accounts {
            book.credit(account, DEV_ACCOUNT_BALANCE)?;
        }
        let deployer = accounts[0];
        let mut events = EventLog::new();

        // 2. Mock feed at nonce 0
        let mut block_height = 1;
        let (feed, feed_events) =
            fund_me_price_feed::deploy(deployer, DECIMALS, INITIAL_ANSWER, block_height)?;
        let feed_address = derive_contract_address(&deployer, 0);
        events.extend(feed_events);

        // 3. Ledger at nonce 1, bound to whatever feed the network resolves to
        block_height += 1;
        let price_feed = network.resolve_price_feed(Some(feed_address))?;
        let (fund_me, ledger_events) =
            initialize(&CallContext::new(deployer, block_height), price_feed)?;
        let fund_me_address = derive_contract_address(&deployer, 1);
        events.extend(ledger_events);

        Ok(Self {
            network,
            accounts,
            book,
            block_height,
            feed_address,
            feed,
            fund_me_address,
            fund_me,
            events,
        })
    }

    // ============ Accessors ============

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Account 0, the deployer and ledger owner
    pub fn deployer(&self) -> Address {
        self.accounts[0]
    }

    /// Dev account by index
    pub fn account(&self, index: usize) -> Option<Address> {
        self.accounts.get(index).copied()
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn feed_address(&self) -> Address {
        self.feed_address
    }

    pub fn feed(&self) -> &MockAggregatorState {
        &self.feed
    }

    pub fn fund_me_address(&self) -> Address {
        self.fund_me_address
    }

    pub fn fund_me(&self) -> &FundMeState {
        &self.fund_me
    }

    /// Every event emitted since genesis
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Native balance of an account or contract
    pub fn balance_of(&self, account: &Address) -> u128 {
        if *account == self.fund_me_address {
            return self.fund_me.balance;
        }
        self.book.balance_of(account)
    }

    /// Make every payout to `account` fail
    pub fn reject_transfers_to(&mut self, account: Address) {
        self.book.reject_transfers_to(account);
    }

    pub fn accept_transfers_to(&mut self, account: &Address) {
        self.book.accept_transfers_to(account);
    }

    // ============ Transactions ============

    /// `fund()` from `from` with `value` attached
    pub fn fund(&mut self, from: Address, value: u128) -> FundMeResult<()> {
        self.call_fund_me(from, value, FundMeAction::Fund)
    }

    /// Plain transfer to the ledger; empty calldata hits `receive`
    pub fn send(&mut self, from: Address, value: u128, data: &[u8]) -> FundMeResult<()> {
        let action = if data.is_empty() {
            FundMeAction::Receive
        } else {
            FundMeAction::Fallback { data: data.to_vec() }
        };
        self.call_fund_me(from, value, action)
    }

    pub fn withdraw(&mut self, from: Address) -> FundMeResult<()> {
        self.call_fund_me(from, 0, FundMeAction::Withdraw)
    }

    pub fn cheaper_withdraw(&mut self, from: Address) -> FundMeResult<()> {
        self.call_fund_me(from, 0, FundMeAction::CheaperWithdraw)
    }

    /// Publish a new answer on the mock feed
    pub fn update_answer(&mut self, from: Address, answer: i64) -> FundMeResult<()> {
        self.block_height += 1;
        let mut ctx = PriceFeedContext::new(self.feed.clone(), from, self.block_height);
        fund_me_price_feed::execute(&mut ctx, &PriceFeedAction::UpdateAnswer { answer })?;

        self.feed = ctx.state;
        self.events.extend(ctx.events);
        Ok(())
    }

    /// Execute one ledger call; the sender is debited only if it succeeds
    fn call_fund_me(&mut self, from: Address, value: u128, action: FundMeAction) -> FundMeResult<()> {
        let available = self.book.balance_of(&from);
        if available < value {
            return Err(FundMeError::InsufficientBalance {
                available,
                requested: value,
            });
        }

        self.block_height += 1;
        let call = CallContext::with_value(from, value, self.block_height);
        let mut ctx = FundMeContext::new(self.fund_me.clone(), call, &self.feed, &mut self.book);
        execute(&mut ctx, &action)?;
        let FundMeContext { state, events, .. } = ctx;

        self.book.debit(&from, value)?;
        self.fund_me = state;
        self.events.extend(events);
        Ok(())
    }
}

// ============ Tests ============

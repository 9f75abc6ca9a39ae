//! FundMe Ledger - Charms App Entry Point
//!
//! This app validates ledger operations using client-side validation.
//!
//! ## What This App Validates
//!
//! - **Initialize**: Deployer creates the ledger bound to a price feed
//! - **Fund / Receive / Fallback**: Anyone contributes at least $50 worth
//! - **Withdraw / CheaperWithdraw**: Owner drains the ledger to coin outputs
//!
//! The price feed charm is read from reference inputs and never consumed.

use charms_sdk::data::{App, Data, Transaction};

/// Main validation function for ledger operations.
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    fund_me::charms::validate_fund_me_operation(app, tx, x, w)
}

// Use the Charms SDK main macro to generate the entry point
charms_sdk::main!(app_contract);

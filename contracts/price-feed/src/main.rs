//! FundMe Mock Price Feed - Charms App Entry Point
//!
//! This app validates feed operations using client-side validation.
//!
//! ## What This App Validates
//!
//! - **Initialize**: Operator deploys the feed with its first answer
//! - **UpdateAnswer**: Operator publishes a new round
//! - **UpdateRoundData**: Operator overwrites the latest round
//!
//! The ledger reads the feed as a reference input and never consumes it.

use charms_sdk::data::{App, Data, Transaction};

/// Main validation function for price feed operations.
///
/// # Arguments
/// * `app` - The price feed app definition
/// * `tx` - The transaction being validated
/// * `x` - Public inputs
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    fund_me_price_feed::charms::validate_price_feed_operation(app, tx, x, w)
}

// Use the Charms SDK main macro to generate the entry point
charms_sdk::main!(app_contract);

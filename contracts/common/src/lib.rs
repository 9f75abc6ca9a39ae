//! FundMe Common Library
//!
//! Shared types, constants, and utilities for the FundMe ledger and its
//! price feed.
//!
//! - **Constants**: funding threshold, native and feed precision
//! - **Errors**: one typed error enum with stable codes
//! - **Events**: structured events collected in an `EventLog`
//! - **Price Feed**: the `AggregatorV3` capability the ledger is handed
//! - **Math**: checked native/USD conversion
//! - **Access Control**: owner/operator checks and payable guards
//! - **Network**: development chains and live feed addresses
//!
//! This crate is `no_std` compatible for WASM compilation when built
//! without the default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod price_feed;
pub mod access_control;
pub mod network;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use price_feed::{AggregatorV3, NativeTransfer};
pub use access_control::*;
pub use network::*;

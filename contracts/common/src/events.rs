//! Protocol Events for FundMe
//!
//! Events are emitted during execution and can be indexed off-chain for
//! building UIs, analytics, and notifications.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::Address;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Ledger Events (0x01 - 0x1F)
    LedgerDeployed = 0x01,
    Funded = 0x02,
    Withdrawn = 0x03,

    // Price Feed Events (0x20 - 0x3F)
    FeedDeployed = 0x20,
    AnswerUpdated = 0x21,
    NewRound = 0x22,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum FundMeEvent {
    // ============ Ledger Events ============

    /// Emitted when the ledger is constructed
    LedgerDeployed {
        owner: Address,
        price_feed: Address,
        block_height: u64,
    },

    /// Emitted on every accepted contribution
    Funded {
        funder: Address,
        amount: u128,
        usd_value: u128,
        total_funded: u128,
        new_funder: bool,
        block_height: u64,
    },

    /// Emitted when the owner drains the ledger
    Withdrawn {
        owner: Address,
        amount: u128,
        funders_cleared: u32,
        block_height: u64,
    },

    // ============ Price Feed Events ============

    /// Emitted when a feed is deployed
    FeedDeployed {
        operator: Address,
        decimals: u8,
        block_height: u64,
    },

    /// Emitted when the feed publishes an answer
    AnswerUpdated {
        current: i64,
        round_id: u64,
        updated_at: u64,
        block_height: u64,
    },

    /// Emitted when the feed opens a new round
    NewRound {
        round_id: u64,
        started_by: Address,
        started_at: u64,
        block_height: u64,
    },
}

impl FundMeEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::LedgerDeployed { .. } => EventType::LedgerDeployed,
            Self::Funded { .. } => EventType::Funded,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::FeedDeployed { .. } => EventType::FeedDeployed,
            Self::AnswerUpdated { .. } => EventType::AnswerUpdated,
            Self::NewRound { .. } => EventType::NewRound,
        }
    }

    /// Get the block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::LedgerDeployed { block_height, .. } => *block_height,
            Self::Funded { block_height, .. } => *block_height,
            Self::Withdrawn { block_height, .. } => *block_height,
            Self::FeedDeployed { block_height, .. } => *block_height,
            Self::AnswerUpdated { block_height, .. } => *block_height,
            Self::NewRound { block_height, .. } => *block_height,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<FundMeEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: FundMeEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[FundMeEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<FundMeEvent> {
        self.events
    }

    /// Append every event from another log
    pub fn extend(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&FundMeEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

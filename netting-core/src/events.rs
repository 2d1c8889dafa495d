//! Observable records of registry and netting activity
//!
//! Every mutation publishes one [`SystemEvent`] so off-path indexers can
//! learn assigned IDs without the call's return value.

use crate::types::{AccountId, PaymentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of one netting pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettingReport {
    /// Pass ID (UUIDv7 for time-ordering)
    pub pass_id: Uuid,

    /// Legs read from the registry
    pub input_legs: usize,

    /// Netted legs appended to the sink
    pub output_legs: usize,

    /// Sum of netted amounts paid into the clearing account
    pub total_in: Decimal,

    /// Sum of netted amounts paid out of the clearing account
    pub total_out: Decimal,

    /// Completed timestamp
    pub completed_at: DateTime<Utc>,
}

impl NettingReport {
    /// Check the clearing account is a pure pass-through
    pub fn is_balanced(&self) -> bool {
        self.total_in == self.total_out
    }
}

/// Event published by the payment system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemEvent {
    /// Leg recorded
    PaymentAdded {
        /// Assigned ID
        id: PaymentId,
        /// Invoking principal
        from: AccountId,
    },

    /// Leg removed by request
    PaymentDeleted {
        /// Removed ID
        id: PaymentId,
    },

    /// Netting pass completed
    NettingPerformed {
        /// Pass summary
        report: NettingReport,
        /// Input legs removed from the registry by the pass
        consumed: Vec<PaymentId>,
    },
}

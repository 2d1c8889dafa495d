//! Error types for the payment registry and netting engine

use crate::types::{AccountId, PaymentId, PoolId};
use thiserror::Error;

/// Result type for registry and netting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Registry and netting errors
#[derive(Error, Debug)]
pub enum Error {
    /// No live leg for this payment ID.
    ///
    /// Callers match on the literal text, keep it stable.
    #[error("Invalid payment ID not found: {id}")]
    NotFound {
        /// Requested ID
        id: PaymentId,
    },

    /// Identifier text is not `0x` followed by 64 lowercase hex digits
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Net position left the representable range; the pass was aborted
    #[error("Arithmetic overflow in net position of {account}")]
    ArithmeticOverflow {
        /// Account whose running position overflowed
        account: AccountId,
    },

    /// Amount is negative or not an integer
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Leg denominated in a pool other than the one being netted
    #[error("Pool mismatch: expected {expected}, found {found}")]
    PoolMismatch {
        /// Pool of the netting pass
        expected: PoolId,
        /// Pool of the offending leg
        found: PoolId,
    },

    /// Leg names the clearing account as payer or payee
    #[error("Leg touches clearing account {account}")]
    ClearingAccountLeg {
        /// Clearing account of the pool
        account: AccountId,
    },

    /// Index past the end of the netted output
    #[error("Netted payment index {index} out of range (len {len})")]
    NettedIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current output length
        len: usize,
    },

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

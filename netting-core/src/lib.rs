//! Payment-intent registry and multilateral netting engine
//!
//! Parties record bilateral payment legs against one fungible asset pool.
//! A netting pass compresses the ordered batch of legs into at most one
//! transfer per account, with the pool's clearing account as counterparty
//! to every net payer and net payee.
//!
//! # Architecture
//!
//! - **Registry**: content-addressed, insertion-ordered store of pending legs
//! - **Netting**: pure reduction of a batch to net legs in encounter order
//! - **Sink**: append-only output of netting passes
//! - **System / Actor**: serialized access to all three
//!
//! # Invariants
//!
//! - Conservation: Σ(netted into pool) == Σ(netted out of pool)
//! - Determinism: same batch → same output, same order
//! - No silent overflow: checked arithmetic aborts the pass
//! - Failed passes leave the registry and sink untouched

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod netting;
pub mod registry;
pub mod sink;
pub mod system;
pub mod types;

// Re-exports
pub use actor::{spawn_from_config, spawn_system_actor, SystemHandle};
pub use config::{Config, OutputPolicy};
pub use error::{Error, Result};
pub use events::{NettingReport, SystemEvent};
pub use metrics::Metrics;
pub use netting::NettingEngine;
pub use registry::PaymentRegistry;
pub use sink::SettlementSink;
pub use system::PaymentSystem;
pub use types::{
    AccountId, Amount, AssetPool, ClearingPool, NettedLeg, PaymentId, PaymentLeg, PoolId,
};

//! Payment system orchestration layer
//!
//! Ties the registry, netting engine and settlement sink together behind a
//! single lock, so `intent_to_pay`, `delete_payment` and `perform_netting`
//! are linearizable with respect to each other.
//!
//! # Example
//!
//! ```
//! use netting_core::{Amount, ClearingPool, OutputPolicy, PaymentSystem};
//!
//! # fn main() -> netting_core::Result<()> {
//! let system = PaymentSystem::new(ClearingPool::new("POOL", "CorrA$"), OutputPolicy::ConsumeBatch);
//!
//! system.intent_to_pay("A".into(), "B".into(), Amount::from(50u64), "POOL".into())?;
//! system.intent_to_pay("B".into(), "A".into(), Amount::from(20u64), "POOL".into())?;
//!
//! let report = system.perform_netting()?;
//! assert_eq!(report.output_legs, 2);
//! assert_eq!(system.num_netted(), 2);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::{Config, OutputPolicy},
    events::{NettingReport, SystemEvent},
    metrics::Metrics,
    netting::NettingEngine,
    registry::PaymentRegistry,
    sink::SettlementSink,
    types::{AccountId, Amount, AssetPool, NettedLeg, PaymentId, PaymentLeg, PoolId},
    Error, Result,
};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default event broadcast capacity
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// State guarded by the system lock
#[derive(Debug, Default)]
struct State {
    registry: PaymentRegistry,
    sink: SettlementSink,
}

/// Payment registry and netting service
pub struct PaymentSystem {
    /// Registry and output
    state: Mutex<State>,

    /// Clearing pool
    pool: Arc<dyn AssetPool>,

    /// Netting engine for `pool`
    engine: NettingEngine,

    /// Effect of a successful pass
    policy: OutputPolicy,

    /// Event publisher
    events: broadcast::Sender<SystemEvent>,

    /// Metrics (if enabled)
    metrics: Option<Metrics>,
}

impl PaymentSystem {
    /// Create system clearing through `pool`
    pub fn new(pool: impl AssetPool + 'static, policy: OutputPolicy) -> Self {
        Self::with_pool(Arc::new(pool), policy, DEFAULT_EVENT_CAPACITY)
    }

    /// Create system from a shared pool
    pub fn with_pool(pool: Arc<dyn AssetPool>, policy: OutputPolicy, event_capacity: usize) -> Self {
        let engine = NettingEngine::for_pool(pool.as_ref());
        let (events, _) = broadcast::channel(event_capacity.max(1));

        Self {
            state: Mutex::new(State::default()),
            pool,
            engine,
            policy,
            events,
            metrics: None,
        }
    }

    /// Create system from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_pool(
            Arc::new(config.pool.to_pool()),
            config.netting.output_policy,
            config.actor.event_capacity,
        ))
    }

    /// Attach metrics
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Record an intended payment from `principal`
    ///
    /// Returns the assigned ID. Publishes [`SystemEvent::PaymentAdded`].
    ///
    /// Stricter than a bare registry `add`: a system nets exactly one pool,
    /// so a leg in any other pool fails with [`Error::PoolMismatch`]. Legs
    /// naming the clearing account fail with [`Error::ClearingAccountLeg`]
    /// and amounts above [`Amount::MAX_LEG`] with [`Error::InvalidAmount`].
    /// Nothing is stored on failure.
    pub fn intent_to_pay(
        &self,
        principal: AccountId,
        to: AccountId,
        amount: Amount,
        pool: PoolId,
    ) -> Result<PaymentId> {
        let leg = PaymentLeg::new(principal, to, amount, pool);
        self.engine.check_leg(&leg)?;
        let PaymentLeg {
            from: principal,
            to,
            amount,
            pool,
        } = leg;

        let mut state = self.state.lock();
        let id = state.registry.add(principal.clone(), to, amount, pool);
        let live = state.registry.len();

        tracing::debug!(%id, from = %principal, %amount, "Payment recorded");

        if let Some(ref metrics) = self.metrics {
            metrics.record_payment_added(live);
        }
        self.publish(SystemEvent::PaymentAdded { id, from: principal });

        Ok(id)
    }

    /// Look up a live payment
    pub fn get_payment(&self, id: &PaymentId) -> Result<PaymentLeg> {
        self.state.lock().registry.get(id).cloned()
    }

    /// Delete a live payment
    ///
    /// Publishes [`SystemEvent::PaymentDeleted`].
    pub fn delete_payment(&self, id: &PaymentId) -> Result<PaymentLeg> {
        let mut state = self.state.lock();
        let leg = state.registry.delete(id)?;
        let live = state.registry.len();

        tracing::debug!(%id, "Payment deleted");

        if let Some(ref metrics) = self.metrics {
            metrics.record_payment_deleted(live);
        }
        self.publish(SystemEvent::PaymentDeleted { id: *id });

        Ok(leg)
    }

    /// Live payments in insertion order
    pub fn payments(&self) -> Vec<(PaymentId, PaymentLeg)> {
        self.state.lock().registry.list()
    }

    /// Number of live payments
    pub fn num_payments(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// ID assigned by the most recent `intent_to_pay`
    ///
    /// Polling-style accessor kept for callers that only see an
    /// acknowledgement. Another caller's `intent_to_pay` may overwrite the
    /// slot before it is read; use the returned ID where possible. The slot
    /// is not cleared by deletion or by a consuming pass, so it may name a
    /// leg that no longer exists.
    pub fn last_pid(&self) -> Option<PaymentId> {
        self.state.lock().registry.last_assigned()
    }

    /// Net the whole current batch and append the result to the sink
    ///
    /// On failure the registry and sink are left untouched.
    pub fn perform_netting(&self) -> Result<NettingReport> {
        let started = Instant::now();
        let mut state = self.state.lock();

        let batch = state.registry.list();
        let netted = match self.net_batch(&batch) {
            Ok(netted) => netted,
            Err(e) => {
                tracing::warn!(error = %e, legs = batch.len(), "Netting pass aborted");
                if let Some(ref metrics) = self.metrics {
                    metrics.record_pass_failure();
                }
                return Err(e);
            }
        };

        let (total_in, total_out) = match self.clearing_totals(&netted) {
            Ok(totals) => totals,
            Err(e) => {
                tracing::warn!(error = %e, "Netting pass aborted on clearing totals");
                if let Some(ref metrics) = self.metrics {
                    metrics.record_pass_failure();
                }
                return Err(e);
            }
        };

        let output_legs = netted.len();
        let consumed = match self.policy {
            OutputPolicy::Accumulate => {
                state.sink.extend(netted);
                Vec::new()
            }
            OutputPolicy::ClearPrevious => {
                state.sink.clear();
                state.sink.extend(netted);
                Vec::new()
            }
            OutputPolicy::ConsumeBatch => {
                state.sink.extend(netted);
                // The batch is the whole registry
                state.registry.clear();
                batch.iter().map(|(id, _)| *id).collect()
            }
        };

        let report = NettingReport {
            pass_id: Uuid::now_v7(),
            input_legs: batch.len(),
            output_legs,
            total_in,
            total_out,
            completed_at: Utc::now(),
        };

        tracing::info!(
            pass_id = %report.pass_id,
            pool = %self.pool.symbol(),
            "Netting complete: {} legs -> {} net legs ({} through clearing)",
            report.input_legs,
            report.output_legs,
            report.total_in
        );

        if let Some(ref metrics) = self.metrics {
            metrics.record_pass(
                output_legs,
                state.registry.len(),
                started.elapsed().as_secs_f64(),
            );
        }
        self.publish(SystemEvent::NettingPerformed {
            report: report.clone(),
            consumed,
        });

        Ok(report)
    }

    /// Number of netted legs in the sink
    pub fn num_netted(&self) -> usize {
        self.state.lock().sink.len()
    }

    /// Netted leg at an index
    pub fn netted_payment(&self, index: usize) -> Result<NettedLeg> {
        self.state.lock().sink.get(index).cloned()
    }

    /// All netted legs in append order
    pub fn netted_payments(&self) -> Vec<NettedLeg> {
        self.state.lock().sink.as_slice().to_vec()
    }

    /// Clearing pool
    pub fn pool(&self) -> &dyn AssetPool {
        self.pool.as_ref()
    }

    /// Pool ticker symbol
    pub fn pool_symbol(&self) -> &str {
        self.pool.symbol()
    }

    /// Configured output policy
    pub fn policy(&self) -> OutputPolicy {
        self.policy
    }

    /// Crate version
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Subscribe to system events
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.events.subscribe()
    }

    /// Metrics (if enabled)
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    fn net_batch(&self, batch: &[(PaymentId, PaymentLeg)]) -> Result<Vec<NettedLeg>> {
        self.engine.compute_netting(batch.iter().map(|(_, leg)| leg))
    }

    /// Sum netted legs into and out of the clearing account
    fn clearing_totals(&self, netted: &[NettedLeg]) -> Result<(Decimal, Decimal)> {
        let clearing = self.engine.clearing_account();
        let overflow = || Error::ArithmeticOverflow {
            account: clearing.clone(),
        };

        let mut total_in = Decimal::ZERO;
        let mut total_out = Decimal::ZERO;
        for leg in netted {
            let amount = leg.amount.as_decimal();
            if leg.is_into(clearing) {
                total_in = total_in.checked_add(amount).ok_or_else(overflow)?;
            } else {
                total_out = total_out.checked_add(amount).ok_or_else(overflow)?;
            }
        }

        Ok((total_in, total_out))
    }

    fn publish(&self, event: SystemEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for PaymentSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSystem")
            .field("pool", &self.pool.id())
            .field("policy", &self.policy)
            .field("state", &*self.state.lock())
            .finish()
    }
}

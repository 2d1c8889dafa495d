//! Actor-based serialization for the payment system
//!
//! One Tokio task owns the [`PaymentSystem`]; every request travels through
//! a bounded mailbox and is answered on a oneshot channel. Requests are
//! applied in mailbox order, which gives the total order required between
//! concurrent `intent_to_pay`, `delete_payment` and netting passes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           SystemHandle (Clone)                │
//! │      Sends requests to actor mailbox          │
//! └─────────────────────┬────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │            SystemActor (Single Task)          │
//! │  PaymentRegistry ─► NettingEngine ─► Sink     │
//! └──────────────────────────────────────────────┘
//! ```

use crate::{
    events::{NettingReport, SystemEvent},
    system::PaymentSystem,
    types::{AccountId, Amount, NettedLeg, PaymentId, PaymentLeg, PoolId},
    Config, Error, Result,
};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Message sent to the system actor
#[derive(Debug)]
pub enum SystemMessage {
    /// Record an intended payment
    IntentToPay {
        principal: AccountId,
        to: AccountId,
        amount: Amount,
        pool: PoolId,
        response: oneshot::Sender<Result<PaymentId>>,
    },

    /// Look up a payment
    GetPayment {
        id: PaymentId,
        response: oneshot::Sender<Result<PaymentLeg>>,
    },

    /// Delete a payment
    DeletePayment {
        id: PaymentId,
        response: oneshot::Sender<Result<PaymentLeg>>,
    },

    /// List live payments
    Payments {
        response: oneshot::Sender<Vec<(PaymentId, PaymentLeg)>>,
    },

    /// Read the last assigned ID
    LastPid {
        response: oneshot::Sender<Option<PaymentId>>,
    },

    /// Run one netting pass
    PerformNetting {
        response: oneshot::Sender<Result<NettingReport>>,
    },

    /// Count netted legs
    NumNetted { response: oneshot::Sender<usize> },

    /// Read a netted leg
    NettedPayment {
        index: usize,
        response: oneshot::Sender<Result<NettedLeg>>,
    },

    /// Subscribe to events
    Subscribe {
        response: oneshot::Sender<broadcast::Receiver<SystemEvent>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the payment system
#[derive(Debug)]
pub struct SystemActor {
    system: PaymentSystem,
    mailbox: mpsc::Receiver<SystemMessage>,
}

impl SystemActor {
    /// Create new actor
    pub fn new(system: PaymentSystem, mailbox: mpsc::Receiver<SystemMessage>) -> Self {
        Self { system, mailbox }
    }

    /// Run the actor event loop until shutdown or all handles are dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let SystemMessage::Shutdown = msg {
                tracing::info!("Payment system actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: SystemMessage) {
        // A dropped response receiver means the caller gave up; nothing to do
        match msg {
            SystemMessage::IntentToPay {
                principal,
                to,
                amount,
                pool,
                response,
            } => {
                let _ = response.send(self.system.intent_to_pay(principal, to, amount, pool));
            }

            SystemMessage::GetPayment { id, response } => {
                let _ = response.send(self.system.get_payment(&id));
            }

            SystemMessage::DeletePayment { id, response } => {
                let _ = response.send(self.system.delete_payment(&id));
            }

            SystemMessage::Payments { response } => {
                let _ = response.send(self.system.payments());
            }

            SystemMessage::LastPid { response } => {
                let _ = response.send(self.system.last_pid());
            }

            SystemMessage::PerformNetting { response } => {
                let _ = response.send(self.system.perform_netting());
            }

            SystemMessage::NumNetted { response } => {
                let _ = response.send(self.system.num_netted());
            }

            SystemMessage::NettedPayment { index, response } => {
                let _ = response.send(self.system.netted_payment(index));
            }

            SystemMessage::Subscribe { response } => {
                let _ = response.send(self.system.subscribe());
            }

            SystemMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct SystemHandle {
    sender: mpsc::Sender<SystemMessage>,
}

impl SystemHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<SystemMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SystemMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Record an intended payment
    pub async fn intent_to_pay(
        &self,
        principal: AccountId,
        to: AccountId,
        amount: Amount,
        pool: PoolId,
    ) -> Result<PaymentId> {
        self.request(|response| SystemMessage::IntentToPay {
            principal,
            to,
            amount,
            pool,
            response,
        })
        .await?
    }

    /// Look up a payment
    pub async fn get_payment(&self, id: PaymentId) -> Result<PaymentLeg> {
        self.request(|response| SystemMessage::GetPayment { id, response })
            .await?
    }

    /// Delete a payment
    pub async fn delete_payment(&self, id: PaymentId) -> Result<PaymentLeg> {
        self.request(|response| SystemMessage::DeletePayment { id, response })
            .await?
    }

    /// List live payments in insertion order
    pub async fn payments(&self) -> Result<Vec<(PaymentId, PaymentLeg)>> {
        self.request(|response| SystemMessage::Payments { response })
            .await
    }

    /// Last assigned ID (racy under concurrent callers)
    pub async fn last_pid(&self) -> Result<Option<PaymentId>> {
        self.request(|response| SystemMessage::LastPid { response })
            .await
    }

    /// Run one netting pass
    pub async fn perform_netting(&self) -> Result<NettingReport> {
        self.request(|response| SystemMessage::PerformNetting { response })
            .await?
    }

    /// Number of netted legs
    pub async fn num_netted(&self) -> Result<usize> {
        self.request(|response| SystemMessage::NumNetted { response })
            .await
    }

    /// Netted leg at an index
    pub async fn netted_payment(&self, index: usize) -> Result<NettedLeg> {
        self.request(|response| SystemMessage::NettedPayment { index, response })
            .await?
    }

    /// Subscribe to system events
    pub async fn subscribe(&self) -> Result<broadcast::Receiver<SystemEvent>> {
        self.request(|response| SystemMessage::Subscribe { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SystemMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the system actor
pub fn spawn_system_actor(system: PaymentSystem, mailbox_capacity: usize) -> SystemHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = SystemActor::new(system, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    SystemHandle::new(tx)
}

/// Build a system from configuration and spawn its actor
pub fn spawn_from_config(config: &Config) -> Result<SystemHandle> {
    let system = PaymentSystem::from_config(config)?;
    Ok(spawn_system_actor(system, config.actor.mailbox_capacity))
}

//! Content-addressed store of pending payment legs
//!
//! Legs are keyed by a SHA-256 derived [`PaymentId`] and iterated in
//! insertion order. Deleting a leg never reorders the rest.
//!
//! # Invariants
//!
//! - Every key maps to exactly one leg that was added and not yet deleted
//! - No two live legs share an ID
//! - Iteration order == insertion order

use crate::{
    types::{AccountId, Amount, PaymentId, PaymentLeg, PoolId},
    Error, Result,
};
use std::collections::{BTreeMap, HashMap};

/// ID derivation function: leg and insertion nonce to ID
pub type IdFn = fn(&PaymentLeg, u64) -> PaymentId;

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    leg: PaymentLeg,
}

/// Registry of pending payment legs
#[derive(Debug)]
pub struct PaymentRegistry {
    /// Live legs by ID
    entries: HashMap<PaymentId, Entry>,

    /// Insertion sequence to ID
    order: BTreeMap<u64, PaymentId>,

    /// Next insertion nonce
    next_nonce: u64,

    /// Most recently assigned ID
    last_assigned: Option<PaymentId>,

    id_fn: IdFn,
}

impl Default for PaymentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::with_id_fn(PaymentId::derive)
    }

    /// Create empty registry with a custom ID derivation
    pub fn with_id_fn(id_fn: IdFn) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_nonce: 0,
            last_assigned: None,
            id_fn,
        }
    }

    /// Record a new leg and return its fresh ID
    ///
    /// If the derived ID is already live the nonce is advanced until it is not.
    pub fn add(&mut self, from: AccountId, to: AccountId, amount: Amount, pool: PoolId) -> PaymentId {
        let leg = PaymentLeg::new(from, to, amount, pool);

        let (id, seq) = loop {
            let nonce = self.next_nonce;
            self.next_nonce += 1;

            let candidate = (self.id_fn)(&leg, nonce);
            if !self.entries.contains_key(&candidate) {
                break (candidate, nonce);
            }
            tracing::warn!(id = %candidate, nonce, "Payment ID collision, advancing nonce");
        };

        self.order.insert(seq, id);
        self.entries.insert(id, Entry { seq, leg });
        self.last_assigned = Some(id);

        id
    }

    /// Look up a live leg
    pub fn get(&self, id: &PaymentId) -> Result<&PaymentLeg> {
        self.entries
            .get(id)
            .map(|entry| &entry.leg)
            .ok_or(Error::NotFound { id: *id })
    }

    /// Remove a live leg
    pub fn delete(&mut self, id: &PaymentId) -> Result<PaymentLeg> {
        let entry = self.entries.remove(id).ok_or(Error::NotFound { id: *id })?;
        self.order.remove(&entry.seq);
        Ok(entry.leg)
    }

    /// Live legs in insertion order
    pub fn list(&self) -> Vec<(PaymentId, PaymentLeg)> {
        self.iter().map(|(id, leg)| (*id, leg.clone())).collect()
    }

    /// Iterate live legs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PaymentId, &PaymentLeg)> + '_ {
        self.order.values().filter_map(move |id| {
            self.entries.get(id).map(|entry| (id, &entry.leg))
        })
    }

    /// ID assigned by the most recent `add`
    ///
    /// Single shared slot: under concurrent callers another `add` may
    /// overwrite it before it is read. Prefer the value returned by `add`.
    pub fn last_assigned(&self) -> Option<PaymentId> {
        self.last_assigned
    }

    /// Check if an ID resolves to a live leg
    pub fn contains(&self, id: &PaymentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of live legs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no legs are live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every live leg
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

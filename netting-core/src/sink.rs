//! Append-only output of netting passes

use crate::{types::NettedLeg, Error, Result};

/// Ordered sequence of netted legs
#[derive(Debug, Default, Clone)]
pub struct SettlementSink {
    legs: Vec<NettedLeg>,
}

impl SettlementSink {
    /// Create empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the output of a pass
    pub fn extend(&mut self, legs: impl IntoIterator<Item = NettedLeg>) {
        self.legs.extend(legs);
    }

    /// Netted leg at an index
    pub fn get(&self, index: usize) -> Result<&NettedLeg> {
        self.legs.get(index).ok_or(Error::NettedIndexOutOfRange {
            index,
            len: self.legs.len(),
        })
    }

    /// Number of netted legs
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// All netted legs in append order
    pub fn as_slice(&self) -> &[NettedLeg] {
        &self.legs
    }

    /// Drop prior output
    pub fn clear(&mut self) {
        self.legs.clear();
    }
}

//! Multilateral netting through a clearing counterparty
//!
//! Reduces an ordered batch of bilateral legs to at most one transfer per
//! account, each against the pool's clearing account.
//!
//! # Algorithm
//!
//! 1. Walk legs in batch order, adding `amount` to the payer's net position
//!    and subtracting it from the payee's
//! 2. Record each account the first time it appears (payer before payee)
//! 3. Emit one leg per non-zero account in that encounter order:
//!    positive → account pays clearing, negative → clearing pays account
//!
//! # Example
//!
//! ```text
//! Legs (in order):
//!   A → B  50     A → C 200     A → E  75     C → B 300
//!   D → C 100     E → B  25     E → D 175
//!
//! Encounter order: A, B, C, E, D
//! Net positions:   A +325, B −375, C 0, E +125, D −75
//!
//! Netted legs:
//!   A → pool 325
//!   pool → B 375
//!   E → pool 125
//!   pool → D  75
//! ```
//!
//! The clearing account never appears in input legs, so it is a pure
//! pass-through: Σ(into clearing) == Σ(out of clearing) for every batch.
//! Leg amounts are capped at [`Amount::MAX_LEG`] and positions use the full
//! `Decimal` width. All arithmetic is still checked; an overflow aborts the
//! whole pass.

use crate::{
    types::{AccountId, Amount, AssetPool, NettedLeg, PaymentLeg, PoolId},
    Error, Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Netting engine for a single asset pool
#[derive(Debug, Clone)]
pub struct NettingEngine {
    /// Pool every input leg must be denominated in
    pool: PoolId,

    /// Counterparty to every net position
    clearing: AccountId,
}

impl NettingEngine {
    /// Create engine for a pool
    pub fn new(pool: PoolId, clearing: AccountId) -> Self {
        Self { pool, clearing }
    }

    /// Create engine clearing through an asset pool
    pub fn for_pool(pool: &dyn AssetPool) -> Self {
        Self::new(pool.id().clone(), pool.clearing_account().clone())
    }

    /// Pool being netted
    pub fn pool(&self) -> &PoolId {
        &self.pool
    }

    /// Clearing account
    pub fn clearing_account(&self) -> &AccountId {
        &self.clearing
    }

    /// Check a leg can enter a pass of this engine
    ///
    /// The leg must be denominated in the engine's pool, must not name the
    /// clearing account on either side, and must fit [`Amount::MAX_LEG`].
    pub fn check_leg(&self, leg: &PaymentLeg) -> Result<()> {
        if leg.pool != self.pool {
            return Err(Error::PoolMismatch {
                expected: self.pool.clone(),
                found: leg.pool.clone(),
            });
        }
        if leg.from == self.clearing || leg.to == self.clearing {
            return Err(Error::ClearingAccountLeg {
                account: self.clearing.clone(),
            });
        }
        if !leg.amount.fits_leg() {
            return Err(Error::InvalidAmount(format!(
                "{} exceeds leg maximum {}",
                leg.amount,
                Amount::MAX_LEG
            )));
        }
        Ok(())
    }

    /// Compute netted legs for a batch, preserving encounter order
    pub fn compute_netting<'a, I>(&self, legs: I) -> Result<Vec<NettedLeg>>
    where
        I: IntoIterator<Item = &'a PaymentLeg>,
    {
        let positions = self.calculate_net_positions(legs)?;
        self.generate_net_legs(&positions)
    }

    /// Accumulate signed net positions in encounter order
    fn calculate_net_positions<'a, I>(&self, legs: I) -> Result<NetPositions>
    where
        I: IntoIterator<Item = &'a PaymentLeg>,
    {
        let mut positions = NetPositions::default();

        for leg in legs {
            self.check_leg(leg)?;

            let amount = leg.amount.as_decimal();
            positions.apply(&leg.from, amount, Decimal::checked_add)?;
            positions.apply(&leg.to, amount, Decimal::checked_sub)?;
        }

        Ok(positions)
    }

    /// Turn non-zero positions into legs against the clearing account
    fn generate_net_legs(&self, positions: &NetPositions) -> Result<Vec<NettedLeg>> {
        let mut legs = Vec::new();

        for account in &positions.encountered {
            let net = positions.net(account);

            if net > Decimal::ZERO {
                legs.push(NettedLeg {
                    from: account.clone(),
                    to: self.clearing.clone(),
                    amount: Amount::new(net)?,
                    pool: self.pool.clone(),
                });
            } else if net < Decimal::ZERO {
                legs.push(NettedLeg {
                    from: self.clearing.clone(),
                    to: account.clone(),
                    amount: Amount::new(-net)?,
                    pool: self.pool.clone(),
                });
            }
        }

        Ok(legs)
    }
}

/// Per-pass running positions, discarded after the pass
#[derive(Debug, Default)]
struct NetPositions {
    positions: HashMap<AccountId, Decimal>,
    encountered: Vec<AccountId>,
}

impl NetPositions {
    fn apply(
        &mut self,
        account: &AccountId,
        amount: Decimal,
        op: fn(Decimal, Decimal) -> Option<Decimal>,
    ) -> Result<()> {
        if !self.positions.contains_key(account) {
            self.encountered.push(account.clone());
        }
        let position = self.positions.entry(account.clone()).or_insert(Decimal::ZERO);

        *position = op(*position, amount).ok_or_else(|| Error::ArithmeticOverflow {
            account: account.clone(),
        })?;

        Ok(())
    }

    fn net(&self, account: &AccountId) -> Decimal {
        self.positions.get(account).copied().unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = "0xPOOL";

    fn engine() -> NettingEngine {
        NettingEngine::new(PoolId::new(POOL), AccountId::new(POOL))
    }

    fn leg(from: &str, to: &str, amount: u64) -> PaymentLeg {
        PaymentLeg::new(from.into(), to.into(), Amount::from(amount), POOL.into())
    }

    fn summary(legs: &[NettedLeg]) -> Vec<String> {
        legs.iter()
            .map(|l| format!("{}->{}:{}", l.from, l.to, l.amount))
            .collect()
    }

    #[test]
    fn test_empty_batch() {
        let netted = engine().compute_netting(&Vec::<PaymentLeg>::new()).unwrap();
        assert!(netted.is_empty());
    }

    #[test]
    fn test_single_leg_decomposition() {
        let netted = engine().compute_netting(&[leg("A", "B", 500)]).unwrap();
        assert_eq!(
            summary(&netted),
            vec!["A->0xPOOL:500", "0xPOOL->B:500"]
        );
    }

    #[test]
    fn test_round_trip_nets_to_nothing() {
        let netted = engine()
            .compute_netting(&[leg("A", "B", 70), leg("B", "A", 70)])
            .unwrap();
        assert!(netted.is_empty());
    }

    #[test]
    fn test_self_payment_cancels() {
        let netted = engine().compute_netting(&[leg("A", "A", 70)]).unwrap();
        assert!(netted.is_empty());
    }

    #[test]
    fn test_first_appearance_order() {
        let batch = vec![
            leg("A", "B", 50),
            leg("A", "C", 200),
            leg("A", "E", 75),
            leg("C", "B", 300),
            leg("D", "C", 100),
            leg("E", "B", 25),
            leg("E", "D", 175),
        ];

        let netted = engine().compute_netting(&batch).unwrap();
        assert_eq!(
            summary(&netted),
            vec![
                "A->0xPOOL:325",
                "0xPOOL->B:375",
                "E->0xPOOL:125",
                "0xPOOL->D:75",
            ]
        );
    }

    #[test]
    fn test_order_not_sorted_by_id() {
        // Z appears first, so it is emitted first
        let netted = engine()
            .compute_netting(&[leg("Z", "A", 10), leg("M", "Z", 4)])
            .unwrap();
        assert_eq!(
            summary(&netted),
            vec![
                "Z->0xPOOL:6",
                "0xPOOL->A:10",
                "M->0xPOOL:4",
            ]
        );
    }

    #[test]
    fn test_position_overflow_aborts_pass() {
        let a = AccountId::new("A");
        let mut positions = NetPositions::default();
        positions.apply(&a, Decimal::MAX, Decimal::checked_add).unwrap();

        let err = positions
            .apply(&a, Decimal::ONE, Decimal::checked_add)
            .unwrap_err();
        assert!(matches!(err, Error::ArithmeticOverflow { account } if account.as_str() == "A"));
    }

    #[test]
    fn test_max_leg_amounts_accumulate() {
        let max = Amount::MAX_LEG;
        let batch = vec![
            PaymentLeg::new("A".into(), "B".into(), max, POOL.into()),
            PaymentLeg::new("A".into(), "C".into(), max, POOL.into()),
        ];

        let netted = engine().compute_netting(&batch).unwrap();
        assert_eq!(netted.len(), 3);
        assert_eq!(
            netted[0].amount.as_decimal(),
            Decimal::from(u64::MAX) + Decimal::from(u64::MAX)
        );
    }

    #[test]
    fn test_oversized_leg_rejected() {
        let big: Amount = "40000000000000000000000000000".parse().unwrap();
        let batch = vec![
            PaymentLeg::new("A".into(), "B".into(), big, POOL.into()),
            PaymentLeg::new("A".into(), "C".into(), big, POOL.into()),
        ];

        let err = engine().compute_netting(&batch).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }

    #[test]
    fn test_clearing_account_leg_rejected() {
        for batch in [vec![leg("A", POOL, 10)], vec![leg(POOL, "B", 10)]] {
            let err = engine().compute_netting(&batch).unwrap_err();
            assert!(matches!(err, Error::ClearingAccountLeg { account } if account.as_str() == POOL));
        }
    }

    #[test]
    fn test_foreign_pool_rejected() {
        let foreign = PaymentLeg::new("A".into(), "B".into(), Amount::from(1u64), "OTHER".into());
        let err = engine().compute_netting(&[leg("A", "B", 1), foreign]).unwrap_err();
        assert!(matches!(err, Error::PoolMismatch { .. }));
    }
}

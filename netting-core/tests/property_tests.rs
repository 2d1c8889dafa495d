//! Property-based tests for registry and netting invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Identifier round trip: decode(encode(x)) == x
//! - Conservation: Σ(into pool) == Σ(out of pool), clearing-account legs refused
//! - Determinism: same batch → same output
//! - Exactness: every netted amount equals the account's true net position

use netting_core::{
    codec, AccountId, Amount, Error, NettedLeg, NettingEngine, PaymentLeg, PaymentRegistry,
    PoolId,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

const POOL: &str = "0xPOOL";

/// Strategy for account IDs drawn from a small set, so positions collide
fn account_strategy() -> impl Strategy<Value = AccountId> {
    prop_oneof![
        Just(AccountId::new("BANKA")),
        Just(AccountId::new("BANKB")),
        Just(AccountId::new("BANKC")),
        Just(AccountId::new("BANKD")),
        Just(AccountId::new("BANKE")),
        Just(AccountId::new("BANKF")),
    ]
}

/// Strategy for any account, the clearing account included
fn any_account_strategy() -> impl Strategy<Value = AccountId> {
    prop_oneof![
        5 => account_strategy(),
        1 => Just(AccountId::new(POOL)),
    ]
}

/// Strategy for legs in the test pool
fn leg_strategy() -> impl Strategy<Value = PaymentLeg> {
    (account_strategy(), account_strategy(), 0u64..1_000_000_000u64).prop_map(
        |(from, to, amount)| PaymentLeg::new(from, to, Amount::from(amount), PoolId::new(POOL)),
    )
}

/// Strategy for legs that may name the clearing account
fn any_leg_strategy() -> impl Strategy<Value = PaymentLeg> {
    (any_account_strategy(), any_account_strategy(), 0u64..1_000_000_000u64).prop_map(
        |(from, to, amount)| PaymentLeg::new(from, to, Amount::from(amount), PoolId::new(POOL)),
    )
}

/// Strategy for legs spanning the whole leg amount range
fn wide_leg_strategy() -> impl Strategy<Value = PaymentLeg> {
    (account_strategy(), account_strategy(), any::<u64>()).prop_map(|(from, to, amount)| {
        PaymentLeg::new(from, to, Amount::from(amount), PoolId::new(POOL))
    })
}

fn engine() -> NettingEngine {
    NettingEngine::new(PoolId::new(POOL), AccountId::new(POOL))
}

fn clearing() -> AccountId {
    AccountId::new(POOL)
}

fn reference_nets(batch: &[PaymentLeg]) -> HashMap<AccountId, i128> {
    let mut nets = HashMap::new();
    for leg in batch {
        let amount: i128 = leg.amount.to_string().parse().unwrap();
        *nets.entry(leg.from.clone()).or_insert(0) += amount;
        *nets.entry(leg.to.clone()).or_insert(0) -= amount;
    }
    nets
}

fn counterparty(leg: &NettedLeg) -> &AccountId {
    if leg.is_into(&clearing()) {
        &leg.from
    } else {
        &leg.to
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: decoding an encoded identifier yields the original bytes
    #[test]
    fn prop_codec_round_trip(bytes in prop::array::uniform32(any::<u8>())) {
        let text = codec::encode(&bytes);
        prop_assert_eq!(text.len(), 66);
        prop_assert_eq!(codec::decode(&text).unwrap(), bytes);
    }

    /// Property: encoding a decoded canonical string yields the same string
    #[test]
    fn prop_codec_canonical_text(text in "0x[0-9a-f]{64}") {
        let bytes = codec::decode(&text).unwrap();
        prop_assert_eq!(codec::encode(&bytes), text);
    }

    /// Property: the clearing account is a pure pass-through, and legs
    /// naming it are refused rather than netted
    #[test]
    fn prop_netting_conserves_value(batch in prop::collection::vec(any_leg_strategy(), 0..40)) {
        let touches_clearing = batch
            .iter()
            .any(|leg| leg.from == clearing() || leg.to == clearing());

        let netted = match engine().compute_netting(&batch) {
            Ok(netted) => {
                prop_assert!(!touches_clearing);
                netted
            }
            Err(Error::ClearingAccountLeg { account }) => {
                prop_assert!(touches_clearing);
                prop_assert_eq!(account, clearing());
                return Ok(());
            }
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error {}", e))),
        };

        let mut into_pool = Decimal::ZERO;
        let mut out_of_pool = Decimal::ZERO;
        for leg in &netted {
            if leg.is_into(&clearing()) {
                into_pool += leg.amount.as_decimal();
            } else {
                prop_assert_eq!(&leg.from, &clearing());
                out_of_pool += leg.amount.as_decimal();
            }
        }
        prop_assert_eq!(into_pool, out_of_pool);
    }

    /// Property: re-running the same batch produces an identical sequence
    #[test]
    fn prop_netting_deterministic(batch in prop::collection::vec(leg_strategy(), 0..40)) {
        let first = engine().compute_netting(&batch).unwrap();
        let second = engine().compute_netting(&batch).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: one leg per non-zero account, amount equal to its net
    #[test]
    fn prop_netting_matches_reference(batch in prop::collection::vec(leg_strategy(), 0..40)) {
        let netted = engine().compute_netting(&batch).unwrap();
        let nets = reference_nets(&batch);

        let mut seen = HashSet::new();
        for leg in &netted {
            prop_assert!(!leg.amount.is_zero());

            let account = counterparty(leg).clone();
            prop_assert!(seen.insert(account.clone()), "account {} emitted twice", account);

            let amount: i128 = leg.amount.to_string().parse().unwrap();
            let expected = nets[&account];
            if leg.is_into(&clearing()) {
                prop_assert_eq!(amount, expected);
            } else {
                prop_assert_eq!(-amount, expected);
            }
        }

        let non_zero = nets.values().filter(|net| **net != 0).count();
        prop_assert_eq!(seen.len(), non_zero);
    }

    /// Property: full-width leg amounts never overflow a position
    #[test]
    fn prop_netting_wide_amounts(batch in prop::collection::vec(wide_leg_strategy(), 0..40)) {
        let netted = engine().compute_netting(&batch).unwrap();
        let nets = reference_nets(&batch);

        for leg in &netted {
            let amount: i128 = leg.amount.to_string().parse().unwrap();
            let net = nets[counterparty(leg)];
            prop_assert_eq!(amount, net.abs());
        }
    }

    /// Property: output follows first-appearance order of the batch
    #[test]
    fn prop_netting_encounter_order(batch in prop::collection::vec(leg_strategy(), 0..40)) {
        let netted = engine().compute_netting(&batch).unwrap();

        let mut encounter = Vec::new();
        for leg in &batch {
            for account in [&leg.from, &leg.to] {
                if !encounter.contains(account) {
                    encounter.push(account.clone());
                }
            }
        }

        let emitted: Vec<&AccountId> = netted.iter().map(counterparty).collect();
        let expected: Vec<&AccountId> = encounter
            .iter()
            .filter(|account| emitted.contains(account))
            .collect();
        prop_assert_eq!(emitted, expected);
    }

    /// Property: every added leg resolves to exactly what was added
    #[test]
    fn prop_registry_lookup_consistency(batch in prop::collection::vec(leg_strategy(), 1..30)) {
        let mut registry = PaymentRegistry::new();
        let mut ids = Vec::new();
        for leg in &batch {
            ids.push(registry.add(leg.from.clone(), leg.to.clone(), leg.amount, leg.pool.clone()));
        }

        prop_assert_eq!(registry.len(), batch.len());
        for (id, leg) in ids.iter().zip(&batch) {
            prop_assert_eq!(registry.get(id).unwrap(), leg);
        }

        let listed: Vec<PaymentLeg> = registry.list().into_iter().map(|(_, leg)| leg).collect();
        prop_assert_eq!(listed, batch);
    }

    /// Property: deleted IDs never resolve, survivors keep their order
    #[test]
    fn prop_registry_delete_finality(
        batch in prop::collection::vec(leg_strategy(), 1..30),
        mask in prop::collection::vec(any::<bool>(), 30),
    ) {
        let mut registry = PaymentRegistry::new();
        let ids: Vec<_> = batch
            .iter()
            .map(|leg| registry.add(leg.from.clone(), leg.to.clone(), leg.amount, leg.pool.clone()))
            .collect();

        let mut survivors = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            if mask[i] {
                registry.delete(id).unwrap();
            } else {
                survivors.push(*id);
            }
        }

        for (i, id) in ids.iter().enumerate() {
            prop_assert_eq!(registry.get(id).is_ok(), !mask[i]);
        }
        let listed: Vec<_> = registry.list().into_iter().map(|(id, _)| id).collect();
        prop_assert_eq!(listed, survivors);
    }
}

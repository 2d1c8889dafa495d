//! Core types for the payment registry
//!
//! All types are designed for:
//! - Exact arithmetic (integral `Decimal` for amounts)
//! - Deterministic content hashing (payment IDs)
//! - Canonical text forms for identifiers

use crate::{codec, Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Account identifier (participant address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Asset pool identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(String);

impl PoolId {
    /// Create new pool ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PoolId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Non-negative integral amount
///
/// Backed by `Decimal` with scale 0. Fractional and negative values are
/// rejected at construction, never rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Largest amount a single payment leg may carry (`u64::MAX`)
    ///
    /// Net positions accumulate in the full 96-bit `Decimal`, which leaves
    /// 32 bits of headroom over any leg.
    pub const MAX_LEG: Amount = Amount(Decimal::from_parts(u32::MAX, u32::MAX, 0, false, 0));

    /// Create from decimal, rejecting negative or fractional values
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::InvalidAmount(format!("negative amount {}", value)));
        }
        if !value.fract().is_zero() {
            return Err(Error::InvalidAmount(format!("fractional amount {}", value)));
        }
        // 100.00 and 100 must hash identically
        let mut value = value.normalize();
        value.rescale(0);
        Ok(Self(value))
    }

    /// Get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check the amount fits a single payment leg
    pub fn fits_leg(&self) -> bool {
        *self <= Self::MAX_LEG
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str(s)
            .map_err(|e| Error::InvalidAmount(format!("{}: {:?}", e, s)))?;
        Amount::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-derived 32-byte payment identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaymentId([u8; 32]);

impl PaymentId {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive the ID of a leg at a given insertion nonce
    ///
    /// Fields are separated by a zero byte; the nonce is appended big-endian.
    pub fn derive(leg: &PaymentLeg, nonce: u64) -> Self {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(leg.from.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(leg.to.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(leg.amount.to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(leg.pool.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(nonce.to_be_bytes());

        Self(hasher.finalize().into())
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode(&self.0))
    }
}

impl fmt::Debug for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentId({})", self)
    }
}

impl FromStr for PaymentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        codec::decode(s).map(Self)
    }
}

impl Serialize for PaymentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PaymentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Pending bilateral payment obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLeg {
    /// Payer (the principal that created the leg)
    pub from: AccountId,

    /// Payee
    pub to: AccountId,

    /// Amount owed
    pub amount: Amount,

    /// Pool the amount is denominated in
    pub pool: PoolId,
}

impl PaymentLeg {
    /// Create new leg
    pub fn new(from: AccountId, to: AccountId, amount: Amount, pool: PoolId) -> Self {
        Self {
            from,
            to,
            amount,
            pool,
        }
    }

    /// Check if payer and payee are the same account
    pub fn is_self_payment(&self) -> bool {
        self.from == self.to
    }
}

/// Net transfer produced by a netting pass
///
/// One side is always the clearing account of `pool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettedLeg {
    /// Payer
    pub from: AccountId,

    /// Payee
    pub to: AccountId,

    /// Net amount, never zero
    pub amount: Amount,

    /// Pool netted against
    pub pool: PoolId,
}

impl NettedLeg {
    /// Check if the transfer pays into the clearing account
    pub fn is_into(&self, clearing: &AccountId) -> bool {
        &self.to == clearing
    }
}

/// External fungible-balance ledger acting as clearing counterparty
///
/// The netting core only reads identity and symbol; balance movement
/// belongs to the implementor.
pub trait AssetPool: Send + Sync {
    /// Pool identifier legs are denominated in
    fn id(&self) -> &PoolId;

    /// Account that stands in as counterparty to every net position
    fn clearing_account(&self) -> &AccountId;

    /// Ticker symbol, for diagnostics
    fn symbol(&self) -> &str;
}

/// Plain-value asset pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingPool {
    id: PoolId,
    clearing_account: AccountId,
    symbol: String,
}

impl ClearingPool {
    /// Create a pool that clears through its own identifier
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            clearing_account: AccountId::new(id.clone()),
            id: PoolId::new(id),
            symbol: symbol.into(),
        }
    }

    /// Override the clearing account
    pub fn with_clearing_account(mut self, account: AccountId) -> Self {
        self.clearing_account = account;
        self
    }
}

impl AssetPool for ClearingPool {
    fn id(&self) -> &PoolId {
        &self.id
    }

    fn clearing_account(&self) -> &AccountId {
        &self.clearing_account
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

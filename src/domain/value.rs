//! Multi-asset value arithmetic over (coin, assets) pairs.
//!
//! Every leaf quantity is strictly positive; zero entries are pruned on
//! construction so equality and emptiness checks are structural.

use crate::foundation::util::encoding::{decode_hex, parse_decimal_u64};
use crate::foundation::{CoordinatorError, PolicyId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The native-coin pseudo-unit on the wire. Never stored in the asset map.
pub const LOVELACE_UNIT: &str = "lovelace";

const POLICY_HEX_LEN: usize = 56;
const MAX_ASSET_NAME_LEN: usize = 32;

/// A token name within a policy, 0..=32 bytes. Ordered by raw bytes, which is
/// the canonical on-chain ordering.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(CoordinatorError::InvalidUnit(format!("asset name is {} bytes, max {}", bytes.len(), MAX_ASSET_NAME_LEN)));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

pub type AssetBundle = BTreeMap<PolicyId, BTreeMap<AssetName, u64>>;

/// `policy(56 hex) || name(0..=64 hex)`, or the literal `lovelace`.
pub fn parse_unit(unit: &str) -> Result<(PolicyId, AssetName)> {
    if unit.len() < POLICY_HEX_LEN {
        return Err(CoordinatorError::InvalidUnit(format!("unit {unit:?} is shorter than a policy id")));
    }
    let (policy_hex, name_hex) = unit.split_at(POLICY_HEX_LEN);
    let policy = policy_hex.parse::<PolicyId>().map_err(|_| CoordinatorError::InvalidUnit(format!("bad policy id in unit {unit:?}")))?;
    let name_bytes = decode_hex(name_hex).map_err(|_| CoordinatorError::InvalidUnit(format!("bad asset name in unit {unit:?}")))?;
    Ok((policy, AssetName::new(name_bytes)?))
}

pub fn format_unit(policy: &PolicyId, name: &AssetName) -> String {
    format!("{policy}{name}")
}

/// A chain value: native coin plus a multi-asset bundle.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Value {
    pub coin: u64,
    assets: AssetBundle,
}

impl Value {
    pub fn from_coin(coin: u64) -> Self {
        Self { coin, assets: AssetBundle::new() }
    }

    pub fn new(coin: u64, assets: AssetBundle) -> Self {
        let mut value = Self { coin, assets };
        value.prune();
        value
    }

    pub fn assets(&self) -> &AssetBundle {
        &self.assets
    }

    pub fn is_empty(&self) -> bool {
        self.coin == 0 && self.assets.is_empty()
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }

    pub fn quantity_of(&self, policy: &PolicyId, name: &AssetName) -> u64 {
        self.assets.get(policy).and_then(|names| names.get(name)).copied().unwrap_or(0)
    }

    /// Componentwise addition. Quantities are chain-bounded u64; saturation
    /// here is unreachable for real chain state.
    pub fn add(&self, other: &Value) -> Value {
        let mut out = self.clone();
        out.coin = out.coin.saturating_add(other.coin);
        for (policy, names) in &other.assets {
            let bucket = out.assets.entry(*policy).or_default();
            for (name, qty) in names {
                let slot = bucket.entry(name.clone()).or_insert(0);
                *slot = slot.saturating_add(*qty);
            }
        }
        out.prune();
        out
    }

    /// Componentwise subtraction; fails if any component would go negative.
    pub fn sub(&self, other: &Value) -> Result<Value> {
        let coin = self
            .coin
            .checked_sub(other.coin)
            .ok_or(CoordinatorError::InsufficientAda { available: self.coin, needed: other.coin })?;
        let mut assets = self.assets.clone();
        for (policy, names) in &other.assets {
            for (name, qty) in names {
                let available = self.quantity_of(policy, name);
                let remaining = available.checked_sub(*qty).ok_or_else(|| CoordinatorError::InsufficientTokens {
                    unit: format_unit(policy, name),
                    available,
                    needed: *qty,
                })?;
                let bucket = assets.entry(*policy).or_default();
                if remaining == 0 {
                    bucket.remove(name);
                } else {
                    bucket.insert(name.clone(), remaining);
                }
            }
        }
        let mut out = Value { coin, assets };
        out.prune();
        Ok(out)
    }

    /// Fold wire `(unit, quantity)` entries into this value. `lovelace` adds
    /// to the coin component; anything else must be a well-formed asset unit.
    pub fn add_wire_amount(&mut self, unit: &str, quantity: &str) -> Result<()> {
        let qty = parse_decimal_u64(quantity).map_err(|_| CoordinatorError::InvalidUnit(format!("bad quantity {quantity:?} for unit {unit:?}")))?;
        if unit == LOVELACE_UNIT {
            self.coin = self.coin.saturating_add(qty);
            return Ok(());
        }
        let (policy, name) = parse_unit(unit)?;
        if qty > 0 {
            let slot = self.assets.entry(policy).or_default().entry(name).or_insert(0);
            *slot = slot.saturating_add(qty);
        }
        Ok(())
    }

    pub fn from_wire_amounts<'a, I>(amounts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut value = Value::default();
        for (unit, quantity) in amounts {
            value.add_wire_amount(unit, quantity)?;
        }
        Ok(value)
    }

    /// If the value carries tokens and its coin is below the floor, lift the
    /// coin to the floor; otherwise leave it untouched.
    pub fn ensure_min_ada_if_tokens(mut self, floor: u64) -> Self {
        if self.has_assets() && self.coin < floor {
            self.coin = floor;
        }
        self
    }

    /// Flattened `(unit, quantity)` view in canonical order, coin excluded.
    pub fn asset_entries(&self) -> Vec<(String, u64)> {
        let mut out = Vec::new();
        for (policy, names) in &self.assets {
            for (name, qty) in names {
                out.push((format_unit(policy, name), *qty));
            }
        }
        out
    }

    fn prune(&mut self) {
        for names in self.assets.values_mut() {
            names.retain(|_, qty| *qty > 0);
        }
        self.assets.retain(|_, names| !names.is_empty());
    }
}

/// One wire-shape amount entry, as the indexer and clients exchange them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AmountEntry {
    pub unit: String,
    pub quantity: String,
}

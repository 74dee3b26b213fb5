//! Signature data types and boundary validation

use crate::math::{parse_scalar_hex_strict, ScalarKind};
use anyhow::{Context, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Raw signature record as found in JSON/CSV input.
///
/// `r`, `s`, `z` are hex strings (an optional `0x` prefix is accepted).
/// The same `txid` may appear on several records; spending multiple inputs
/// of one transaction produces one signature per input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInput {
    pub txid: String,
    pub r: String,
    pub s: String,
    pub z: String,
}

/// Validated signature over the curve order `n`.
///
/// Invariants: `1 <= r, s <= n-1` and `0 <= z <= n-1`. Immutable once built.
#[derive(Debug, Clone)]
pub struct Signature {
    pub txid: String,
    pub r: BigUint,
    pub s: BigUint,
    pub z: BigUint,
}

impl SignatureInput {
    /// Validates and converts this record against the curve order `n`.
    pub fn parse(&self, n: &BigUint) -> Result<Signature> {
        let r = parse_scalar_hex_strict(&self.r, ScalarKind::RorS, n)
            .with_context(|| format!("invalid r for txid {}", self.txid))?;
        let s = parse_scalar_hex_strict(&self.s, ScalarKind::RorS, n)
            .with_context(|| format!("invalid s for txid {}", self.txid))?;
        let z = parse_scalar_hex_strict(&self.z, ScalarKind::Z, n)
            .with_context(|| format!("invalid z for txid {}", self.txid))?;

        Ok(Signature {
            txid: self.txid.clone(),
            r,
            s,
            z,
        })
    }
}

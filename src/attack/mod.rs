//! Attack implementations and shared result types

use num_bigint::BigUint;

pub mod correlated_nonce;
pub use correlated_nonce::CorrelatedNonceAttack;

/// A private-key candidate that met the cross-signature consensus threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredKey {
    pub private_key: BigUint,
    /// Number of signatures that independently produced this key.
    pub support: usize,
}

//! ECDSA private key recovery from correlated nonces
//!
//! This library attempts to recover an ECDSA private key from signatures
//! whose nonces are statistically correlated with the public r and z
//! components, by searching a small offset window around a weighted
//! estimate and keeping candidates that agree across signatures.

pub mod attack;
pub mod math;
pub mod provider;
pub mod signature;

pub use attack::{CorrelatedNonceAttack, RecoveredKey};
pub use signature::{Signature, SignatureInput};

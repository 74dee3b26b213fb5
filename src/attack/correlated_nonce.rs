//! Correlated nonce attack implementation
//!
//! Recovers ECDSA private keys when the signer's nonce k is correlated with
//! the public signature components: k is estimated as a fixed linear blend
//! of r and z, a small offset window around the estimate is searched, and a
//! private-key candidate is accepted when enough signatures independently
//! produce the same value.
//!
//! The blend weight is an unvalidated heuristic; the attack preserves its
//! exact arithmetic for reproducibility and takes no position on how often
//! it converges against real signatures.

use super::RecoveredKey;
use crate::math::{mod_inverse, Weight};
use crate::signature::Signature;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Default offset window around the baseline nonce estimate.
pub const DEFAULT_DELTA_MIN: i64 = -50;
pub const DEFAULT_DELTA_MAX: i64 = 50;

/// A hypothesized private key derived from one trial nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub d: BigUint,
    pub k: BigUint,
    /// Offset from the baseline nonce estimate that produced this candidate.
    pub delta: i64,
}

/// Baseline nonce estimate `round((1-weight)*r + weight*z) mod n`,
/// clamped into `[1, n-1]`.
///
/// With `weight = numer/denom` the blend is
/// `((denom-numer)*r + numer*z) / denom`, evaluated in integer arithmetic
/// and rounded half-up, so the residue is exact for inputs of any size.
pub fn estimate_nonce(r: &BigUint, z: &BigUint, weight: &Weight, n: &BigUint) -> BigUint {
    let numer = BigUint::from(weight.numer());
    let denom = BigUint::from(weight.denom());

    let t = (&denom - &numer) * r + numer * z;
    let mut k = ((t + weight.denom() / 2) / denom) % n;
    if k.is_zero() {
        k = BigUint::one();
    }
    k
}

/// Correlated nonce attack over a configurable curve order.
pub struct CorrelatedNonceAttack {
    order: BigUint,
    weight: Weight,
    deltas: Vec<i64>,
    threshold: Option<usize>,
}

impl CorrelatedNonceAttack {
    /// `threshold = None` defers to `max(2, signature_count / 2)` at run time.
    pub fn new(order: BigUint, weight: Weight, deltas: Vec<i64>, threshold: Option<usize>) -> Self {
        Self {
            order,
            weight,
            deltas,
            threshold,
        }
    }

    /// The default window: every integer in `[-50, 50]`, ascending.
    pub fn default_deltas() -> Vec<i64> {
        (DEFAULT_DELTA_MIN..=DEFAULT_DELTA_MAX).collect()
    }

    pub fn name(&self) -> &'static str {
        "correlated-nonce"
    }

    /// Consensus threshold in effect for a run over `signature_count` inputs.
    pub fn effective_threshold(&self, signature_count: usize) -> usize {
        self.threshold.unwrap_or_else(|| (signature_count / 2).max(2))
    }

    /// Searches the offset window around the baseline estimate for one
    /// signature and returns every surviving private-key candidate.
    ///
    /// For each delta: `k = (k_base + delta) mod n`, skipped when the
    /// window wraps onto `k = 0`; otherwise `d = (s*k - z) * r^(-1) mod n`,
    /// kept iff `1 < d < n`. The inverse of r depends only on the
    /// signature, so it is computed once; if r is not invertible the whole
    /// signature yields nothing.
    pub fn search(&self, sig: &Signature) -> Vec<Candidate> {
        let n = &self.order;
        let k_base = estimate_nonce(&sig.r, &sig.z, &self.weight, n);

        let inv_r = match mod_inverse(&sig.r, n) {
            Some(inv) => inv,
            None => {
                warn!(txid = %sig.txid, "r is not invertible mod n, skipping signature");
                return Vec::new();
            }
        };

        let one = BigUint::one();
        let mut candidates = Vec::new();
        for &delta in &self.deltas {
            let k = offset_mod(&k_base, delta, n);
            // a zero nonce is not a valid candidate
            if k.is_zero() {
                continue;
            }
            // d = (s*k - z) * inv_r mod n, with the subtraction lifted to
            // avoid going negative: z < n, so s*k mod n + n - z stays positive.
            let sk = (&sig.s * &k) % n;
            let d = ((sk + n - &sig.z) % n * &inv_r) % n;
            if d > one {
                candidates.push(Candidate { d, k, delta });
            }
        }
        candidates
    }

    /// Runs the full pipeline: per-signature search, advisory reporting,
    /// and consensus aggregation. Returns the recovered candidates sorted
    /// ascending by key; an empty result means the heuristic did not
    /// converge and is not an error.
    pub fn recover(&self, signatures: &[Signature]) -> Vec<RecoveredKey> {
        let threshold = self.effective_threshold(signatures.len());

        let mut per_signature = Vec::with_capacity(signatures.len());
        for sig in signatures {
            let candidates = self.search(sig);
            if candidates.is_empty() {
                warn!(txid = %sig.txid, "no private key candidates for signature");
            } else {
                info!(
                    txid = %sig.txid,
                    count = candidates.len(),
                    "found private key candidates"
                );
            }
            per_signature.push(candidates);
        }

        let counts = support_counts(&per_signature);
        let recovered: Vec<RecoveredKey> = counts
            .into_iter()
            .filter(|(_, support)| *support >= threshold)
            .map(|(private_key, support)| RecoveredKey {
                private_key,
                support,
            })
            .collect();

        if recovered.is_empty() {
            warn!(threshold, "no candidate reached the consensus threshold");
        } else {
            info!(
                threshold,
                count = recovered.len(),
                "candidates reached the consensus threshold"
            );
        }
        recovered
    }
}

fn offset_mod(k_base: &BigUint, delta: i64, n: &BigUint) -> BigUint {
    if delta >= 0 {
        (k_base + BigUint::from(delta as u64)) % n
    } else {
        let step = BigUint::from(delta.unsigned_abs()) % n;
        (k_base + (n - step)) % n
    }
}

/// Maps each candidate key to the number of signatures supporting it.
///
/// Each signature votes at most once per distinct d, even when several
/// offsets coincide on the same value. The BTreeMap keeps the result
/// independent of signature and candidate iteration order.
pub fn support_counts(per_signature: &[Vec<Candidate>]) -> BTreeMap<BigUint, usize> {
    let mut counts: BTreeMap<BigUint, usize> = BTreeMap::new();
    for candidates in per_signature {
        let distinct: BTreeSet<&BigUint> = candidates.iter().map(|c| &c.d).collect();
        for d in distinct {
            *counts.entry(d.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Returns every candidate key supported by at least `threshold` signatures.
pub fn aggregate(per_signature: &[Vec<Candidate>], threshold: usize) -> BTreeSet<BigUint> {
    support_counts(per_signature)
        .into_iter()
        .filter(|(_, support)| *support >= threshold)
        .map(|(d, _)| d)
        .collect()
}

//! Modular arithmetic and strict input parsing over a configurable curve order

use anyhow::{anyhow, bail, Result};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Num, One, Zero};

/// secp256k1 curve order n in hexadecimal.
pub const SECP256K1_ORDER_HEX: &str =
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";

/// Returns the secp256k1 curve order n.
pub fn secp256k1_order() -> BigUint {
    BigUint::from_str_radix(SECP256K1_ORDER_HEX, 16)
        .expect("SECP256K1_ORDER_HEX should parse as base-16")
}

/// Parses a curve order from hex and applies boundary validation.
///
/// The order must be an odd integer greater than 3. Primality is not
/// verified here; the recovery arithmetic assumes a prime order and
/// inverses may not exist under a composite one.
pub fn parse_order(s: &str) -> Result<BigUint> {
    let digits = strip_hex_prefix(s);
    if digits.is_empty() {
        bail!("Empty curve order");
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid curve order: only hex digits allowed");
    }
    let n = BigUint::from_str_radix(digits, 16)
        .map_err(|e| anyhow!("Failed to parse curve order: {}", e))?;
    if n <= BigUint::from(3u8) {
        bail!("Curve order must be greater than 3");
    }
    if (&n % 2u8).is_zero() {
        bail!("Curve order must be odd");
    }
    Ok(n)
}

pub enum ScalarKind {
    RorS,
    Z,
}

fn strip_hex_prefix(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Parses a signature component from hex with range validation against `n`.
///
/// Leading zeros are allowed (fixed-width hex is the norm for signature
/// dumps). `r` and `s` must lie in `[1, n-1]`; `z` in `[0, n-1]`.
pub fn parse_scalar_hex_strict(s: &str, kind: ScalarKind, n: &BigUint) -> Result<BigUint> {
    let digits = strip_hex_prefix(s);
    if digits.is_empty() {
        bail!("Empty hex string");
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid hex string: only hex digits allowed");
    }

    let value =
        BigUint::from_str_radix(digits, 16).map_err(|e| anyhow!("Failed to parse hex: {}", e))?;

    if &value >= n {
        bail!("Value >= curve order n, ensure your data is already reduced");
    }

    match kind {
        ScalarKind::RorS => {
            if value.is_zero() {
                bail!("r and s values cannot be zero");
            }
        }
        ScalarKind::Z => {}
    }

    Ok(value)
}

pub fn to_hex_string(value: &BigUint) -> String {
    format!("{:064x}", value)
}

pub fn to_decimal_string(value: &BigUint) -> String {
    value.to_string()
}

/// Modular inverse of `a` modulo `n` via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, n) != 1`, in particular when `a ≡ 0 (mod n)`.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let a = BigInt::from_biguint(Sign::Plus, a % n);
    let n_int = BigInt::from_biguint(Sign::Plus, n.clone());
    if a.is_zero() {
        return None;
    }

    let (mut old_r, mut r) = (a, n_int.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }

    let inv = ((old_s % &n_int) + &n_int) % &n_int;
    inv.to_biguint()
}

/// Exact decimal weight in `[0, 1]` for the nonce-estimation blend.
///
/// Stored as `numer / denom` with `denom` a power of ten, so the blend
/// `(1-w)*r + w*z` can be evaluated in big-integer arithmetic with no
/// floating-point error on 256-bit inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weight {
    numer: u64,
    denom: u64,
}

impl Weight {
    /// Parses a decimal string such as `"0.3653"`, `"1"`, or `".5"`.
    ///
    /// At most 18 fractional digits are accepted so the denominator fits
    /// in a `u64`. The value must lie in `[0, 1]`.
    pub fn parse(s: &str) -> Result<Weight> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty weight string");
        }
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            bail!("Invalid weight: expected a decimal number in [0, 1]");
        }
        if frac_part.len() > 18 {
            bail!("Invalid weight: at most 18 fractional digits supported");
        }

        let int_value: u64 = int_part
            .parse()
            .map_err(|e| anyhow!("Invalid weight integer part: {}", e))?;
        let denom = 10u64.pow(frac_part.len() as u32);
        let frac_value: u64 = if frac_part.is_empty() {
            0
        } else {
            frac_part
                .parse()
                .map_err(|e| anyhow!("Invalid weight fraction: {}", e))?
        };

        let numer = int_value
            .checked_mul(denom)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(|| anyhow!("Weight out of range"))?;
        if numer > denom {
            bail!("Weight must be in [0, 1]");
        }
        Ok(Weight { numer, denom })
    }

    pub fn numer(&self) -> u64 {
        self.numer
    }

    pub fn denom(&self) -> u64 {
        self.denom
    }
}

impl Default for Weight {
    /// The reference blend weight, 0.3653.
    fn default() -> Self {
        Weight {
            numer: 3653,
            denom: 10000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> BigUint {
        secp256k1_order()
    }

    #[test]
    fn test_parse_scalar_hex_strict_valid() {
        let r = parse_scalar_hex_strict(
            "27c90531406bbf08bd6325b06fe0ac32e61a66f3d8b2762a7bf2ac6c13e76ddc",
            ScalarKind::RorS,
            &n(),
        )
        .unwrap();
        assert!(!r.is_zero());
    }

    #[test]
    fn test_parse_scalar_hex_allows_0x_prefix_and_leading_zeros() {
        let a = parse_scalar_hex_strict("0x00ff", ScalarKind::RorS, &n()).unwrap();
        assert_eq!(a, BigUint::from(255u32));
    }

    #[test]
    fn test_parse_scalar_hex_rejects_zero_for_r_s() {
        assert!(parse_scalar_hex_strict("0", ScalarKind::RorS, &n()).is_err());
        assert!(parse_scalar_hex_strict("000", ScalarKind::RorS, &n()).is_err());
    }

    #[test]
    fn test_parse_scalar_hex_allows_zero_for_z() {
        assert!(parse_scalar_hex_strict("0", ScalarKind::Z, &n()).is_ok());
    }

    #[test]
    fn test_parse_scalar_hex_rejects_value_ge_n() {
        let result = parse_scalar_hex_strict(SECP256K1_ORDER_HEX, ScalarKind::Z, &n());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("curve order"));
    }

    #[test]
    fn test_parse_scalar_hex_rejects_garbage() {
        assert!(parse_scalar_hex_strict("xyz", ScalarKind::Z, &n()).is_err());
        assert!(parse_scalar_hex_strict("", ScalarKind::Z, &n()).is_err());
    }

    #[test]
    fn test_parse_order_secp256k1() {
        let order = parse_order(SECP256K1_ORDER_HEX).unwrap();
        assert_eq!(order, secp256k1_order());
    }

    #[test]
    fn test_parse_order_rejects_even_and_tiny() {
        assert!(parse_order("10").is_err());
        assert!(parse_order("3").is_err());
        assert!(parse_order("").is_err());
    }

    #[test]
    fn test_mod_inverse() {
        let a = BigUint::from(12345u32);
        let inv = mod_inverse(&a, &n()).unwrap();
        assert_eq!((a * inv) % n(), BigUint::one());
    }

    #[test]
    fn test_mod_inverse_of_zero_is_none() {
        assert!(mod_inverse(&BigUint::zero(), &n()).is_none());
        assert!(mod_inverse(&n(), &n()).is_none());
    }

    #[test]
    fn test_mod_inverse_large_value() {
        let a = &n() - BigUint::from(7u32);
        let inv = mod_inverse(&a, &n()).unwrap();
        assert_eq!((a * inv) % n(), BigUint::one());
    }

    #[test]
    fn test_hex_rendering_fixed_width() {
        let a = BigUint::from(255u32);
        assert_eq!(to_hex_string(&a).len(), 64);
        assert!(to_hex_string(&a).ends_with("ff"));
    }

    #[test]
    fn test_weight_parse_default() {
        let w = Weight::parse("0.3653").unwrap();
        assert_eq!(w, Weight::default());
        assert_eq!(w.numer(), 3653);
        assert_eq!(w.denom(), 10000);
    }

    #[test]
    fn test_weight_parse_endpoints() {
        assert_eq!(Weight::parse("0").unwrap().numer(), 0);
        let one = Weight::parse("1").unwrap();
        assert_eq!(one.numer(), one.denom());
        let one_dot = Weight::parse("1.000").unwrap();
        assert_eq!(one_dot.numer(), one_dot.denom());
    }

    #[test]
    fn test_weight_parse_bare_fraction() {
        let w = Weight::parse(".5").unwrap();
        assert_eq!(w.numer(), 5);
        assert_eq!(w.denom(), 10);
    }

    #[test]
    fn test_weight_rejects_out_of_range() {
        assert!(Weight::parse("1.0001").is_err());
        assert!(Weight::parse("2").is_err());
        assert!(Weight::parse("-0.5").is_err());
        assert!(Weight::parse("abc").is_err());
        assert!(Weight::parse("").is_err());
    }
}

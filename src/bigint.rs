//! Arbitrary-precision modular arithmetic kernel.
//!
//! Inverse/mul/add/sub operations parameterized by an arbitrary prime
//! modulus, so the same kernel serves all five curve orders rather than one
//! hard-coded secp256k1 constant.

use dashu::integer::{fast_div::ConstDivisor, UBig};

use crate::error::LatticeError;

/// `a^-1 mod m`, `m` assumed prime. Uses the extended Euclidean algorithm
/// (by way of `dashu`'s `ConstDivisor` ring inverse) rather than Fermat
/// exponentiation, since callers here build a fresh ring per call against
/// whichever curve order is in play, with no precomputed exponent to reuse.
pub fn inv_mod(a: &UBig, m: &UBig) -> Result<UBig, LatticeError> {
    let ring = ConstDivisor::new(m.clone());
    ring.reduce(a.clone())
        .inv()
        .map(|residue| residue.residue())
        .ok_or_else(|| LatticeError::NotInvertible(format!("{a}")))
}

/// `(a + b) mod m`.
pub fn add_mod(a: &UBig, b: &UBig, m: &UBig) -> UBig {
    (a + b) % m
}

/// `(a * b) mod m`.
pub fn mul_mod(a: &UBig, b: &UBig, m: &UBig) -> UBig {
    (a * b) % m
}

/// `(a - b) mod m`, wrapping into `[0, m)` since `UBig` has no sign.
pub fn sub_mod(a: &UBig, b: &UBig, m: &UBig) -> UBig {
    let a = a % m;
    let b = b % m;
    if a >= b {
        a - b
    } else {
        m - (b - a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secp256k1_order() -> UBig {
        UBig::from_str_radix(
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
            16,
        )
        .unwrap()
    }

    #[test]
    fn inverse_round_trips() {
        let n = secp256k1_order();
        let a = UBig::from(123456789u64);
        let inv = inv_mod(&a, &n).unwrap();
        assert_eq!(mul_mod(&a, &inv, &n), UBig::from(1u8));
    }

    #[test]
    fn zero_is_not_invertible() {
        let n = secp256k1_order();
        assert!(inv_mod(&UBig::ZERO, &n).is_err());
    }

    #[test]
    fn sub_mod_wraps() {
        let m = UBig::from(17u8);
        assert_eq!(sub_mod(&UBig::from(3u8), &UBig::from(5u8), &m), UBig::from(15u8));
    }
}

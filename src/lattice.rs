//! HNP lattice builder: constructs the `(m+2) x (m+2)` basis matrix from a
//! chosen subset of signatures. This is the one module where
//! faithfulness to the source formulas is non-negotiable: the matrix
//! entries encode the number-theoretic identities that make the HNP short
//! vector exist at all.

use dashu::integer::UBig;
use num_bigint::BigInt;

use crate::bigint::{inv_mod, mul_mod, sub_mod};
use crate::curve::Curve;
use crate::error::LatticeError;
use crate::input::{KnownBits, SignatureSample};
use crate::reduction::IntegerMatrix;

fn to_bigint(u: &UBig) -> BigInt {
    BigInt::from_bytes_be(num_bigint::Sign::Plus, &u.to_be_bytes())
}

/// Builds the HNP basis for `subset`.
///
/// `global_hash` is `Some(h)` when every sample shares one message hash,
/// `None` when each sample carries its own `hash` field.
pub fn build_matrix(
    subset: &[SignatureSample],
    curve: Curve,
    leak_width: u32,
    known_bits: KnownBits,
    global_hash: Option<&UBig>,
) -> Result<IntegerMatrix, LatticeError> {
    if leak_width < 4 {
        return Err(LatticeError::BadInput(format!(
            "leak width {leak_width} below the minimum of 4"
        )));
    }
    let m = subset.len();
    let n = curve.order();
    let card = UBig::ONE << (curve.bitsize() as usize);
    let k_bits = UBig::ONE << (leak_width as usize);

    let mut lattice = IntegerMatrix::zeros(m + 2);

    for (i, sig) in subset.iter().enumerate() {
        let hash = global_hash.cloned().unwrap_or_else(|| sig.hash.clone());
        let s_inv = inv_mod(&sig.s, &n).map_err(|_| {
            LatticeError::BadInput(format!("signature {i} has non-invertible s"))
        })?;

        lattice.set(i, i, to_bigint(&(&(&k_bits * &UBig::from(2u8)) * &n)));

        match known_bits {
            KnownBits::Lsb => {
                let k_inv = inv_mod(&k_bits, &n)?;
                let row_m = mul_mod(&mul_mod(&k_inv, &sig.r, &n), &s_inv, &n);
                lattice.set(m, i, to_bigint(&(&(&k_bits * &UBig::from(2u8)) * &row_m)));

                let h_term = mul_mod(&hash, &s_inv, &n);
                let inner = sub_mod(&sig.kp, &h_term, &n);
                let row_last = mul_mod(&k_inv, &inner, &n);
                let scaled = &(&k_bits * &UBig::from(2u8)) * &row_last + &n;
                lattice.set(m + 1, i, to_bigint(&scaled));
            }
            KnownBits::Msb => {
                let row_m = mul_mod(&sig.r, &s_inv, &n);
                lattice.set(m, i, to_bigint(&(&(&k_bits * &UBig::from(2u8)) * &row_m)));

                let h_term = mul_mod(&hash, &s_inv, &n);
                let shift = &card / &k_bits;
                let scaled_kp = &sig.kp * &shift;
                // `scaled_kp - h_term` is a signed quantity; compute it over
                // BigInt to avoid UBig's unsigned underflow, then fold the
                // `2*K*(...) + n` offset in signed arithmetic before storing.
                let term = to_bigint(&scaled_kp) - to_bigint(&h_term);
                let scaled = to_bigint(&(&k_bits * &UBig::from(2u8))) * term + to_bigint(&n);
                lattice.set(m + 1, i, scaled);
            }
        }
    }

    lattice.set(m, m, BigInt::from(1));
    lattice.set(m + 1, m + 1, to_bigint(&n));

    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashu::integer::UBig;

    fn sample(r: u64, s: u64, kp: u64, hash: u64) -> SignatureSample {
        SignatureSample {
            r: UBig::from(r),
            s: UBig::from(s),
            kp: UBig::from(kp),
            hash: UBig::from(hash),
        }
    }

    #[test]
    fn basis_has_expected_shape() {
        let curve = Curve::Secp256k1;
        let subset = vec![
            sample(111, 222, 5, 999),
            sample(333, 444, 6, 888),
            sample(555, 666, 7, 777),
        ];
        let m = subset.len();
        let basis = build_matrix(&subset, curve, 6, KnownBits::Lsb, None).unwrap();
        assert_eq!(basis.dim(), m + 2);
        assert_eq!(*basis.get(m, m), BigInt::from(1));
        assert_eq!(*basis.get(m + 1, m + 1), to_bigint(&curve.order()));

        let mut nonzero = 0usize;
        for row in 0..m + 2 {
            for col in 0..m + 2 {
                if *basis.get(row, col) != BigInt::from(0) {
                    nonzero += 1;
                }
            }
        }
        // diagonal block (m) + the two tail diagonal entries + the two
        // dense rows of m entries each = 3m + 2.
        assert_eq!(nonzero, 3 * m + 2);
    }

    #[test]
    fn rejects_leak_width_below_minimum() {
        let subset = vec![sample(1, 2, 3, 4)];
        assert!(build_matrix(&subset, Curve::Secp256k1, 3, KnownBits::Lsb, None).is_err());
    }

    #[test]
    fn rejects_non_invertible_s() {
        let curve = Curve::Secp256k1;
        let subset = vec![sample(1, 0, 3, 4)];
        assert!(build_matrix(&subset, curve, 6, KnownBits::Lsb, None).is_err());
    }
}

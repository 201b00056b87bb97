//! Curve oracle: order/bit-size lookup, scalar-to-point derivation, and
//! public-point validity checking for the five supported named curves.
//!
//! `Curve` is a small tagged enum over precomputed per-curve facts (order,
//! bit size, field width) plus one scalar-multiplication entry point,
//! delegated per-variant to the matching RustCrypto curve crate rather than
//! hand-rolled elliptic-curve arithmetic.

use dashu::integer::UBig;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::{AffinePoint, CurveArithmetic, PublicKey, SecretKey};

use crate::error::LatticeError;

/// The closed set of curves this engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Secp224r1,
    Secp256k1,
    Secp256r1,
    Secp384r1,
    Secp521r1,
}

impl Curve {
    /// Case-insensitive lookup by the JSON contract's curve name.
    pub fn from_name(name: &str) -> Result<Self, LatticeError> {
        match name.to_ascii_uppercase().as_str() {
            "SECP224R1" => Ok(Curve::Secp224r1),
            "SECP256K1" => Ok(Curve::Secp256k1),
            "SECP256R1" => Ok(Curve::Secp256r1),
            "SECP384R1" => Ok(Curve::Secp384r1),
            "SECP521R1" => Ok(Curve::Secp521r1),
            _ => Err(LatticeError::UnknownCurve(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Curve::Secp224r1 => "SECP224R1",
            Curve::Secp256k1 => "SECP256K1",
            Curve::Secp256r1 => "SECP256R1",
            Curve::Secp384r1 => "SECP384R1",
            Curve::Secp521r1 => "SECP521R1",
        }
    }

    /// Prime order `n` of the base point, from the fixed authoritative
    /// table (cross-checked in tests against each curve crate's own
    /// `Curve::ORDER` constant).
    pub fn order(&self) -> UBig {
        let hex = match self {
            Curve::Secp224r1 => "FFFFFFFFFFFFFFFFFFFFFFFFFFFF16A2E0B8F03E13DD29455C5C2A3D",
            Curve::Secp256k1 => "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
            Curve::Secp256r1 => "FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551",
            Curve::Secp384r1 => "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFC7634D81F4372DDF581A0DB248B0A77AECEC196ACCC52973",
            Curve::Secp521r1 => "1FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFA51868783BF2F966B7FCC0148F709A5D03BB5C9B8899C47AEBB6FB71E91386409",
        };
        UBig::from_str_radix(hex, 16).expect("hard-coded curve order is valid hex")
    }

    /// Curve key size in bits, `B = ceil(log2 n)`.
    pub fn bitsize(&self) -> u32 {
        match self {
            Curve::Secp224r1 => 224,
            Curve::Secp256k1 => 256,
            Curve::Secp256r1 => 256,
            Curve::Secp384r1 => 384,
            Curve::Secp521r1 => 521,
        }
    }

    /// SEC1 field-element width in bytes, used to pad/unpad coordinates.
    fn field_len(&self) -> usize {
        match self {
            Curve::Secp224r1 => 28,
            Curve::Secp256k1 => 32,
            Curve::Secp256r1 => 32,
            Curve::Secp384r1 => 48,
            Curve::Secp521r1 => 66,
        }
    }

    /// `d * G`. Fails with `InvalidScalar` if `d = 0` or `d >= n`.
    pub fn derive(&self, d: &UBig) -> Result<(UBig, UBig), LatticeError> {
        let bytes = pad_be(&d.to_be_bytes(), self.field_len())?;
        match self {
            Curve::Secp224r1 => derive_generic::<p224::NistP224>(&bytes),
            Curve::Secp256k1 => derive_generic::<k256::Secp256k1>(&bytes),
            Curve::Secp256r1 => derive_generic::<p256::NistP256>(&bytes),
            Curve::Secp384r1 => derive_generic::<p384::NistP384>(&bytes),
            Curve::Secp521r1 => derive_generic::<p521::NistP521>(&bytes),
        }
    }

    /// Checks `Q = (x, y)` satisfies the curve equation and is not the
    /// point at infinity.
    pub fn on_curve(&self, x: &UBig, y: &UBig) -> bool {
        let len = self.field_len();
        let (Ok(x_bytes), Ok(y_bytes)) = (pad_be(&x.to_be_bytes(), len), pad_be(&y.to_be_bytes(), len))
        else {
            return false;
        };
        match self {
            Curve::Secp224r1 => on_curve_generic::<p224::NistP224>(&x_bytes, &y_bytes),
            Curve::Secp256k1 => on_curve_generic::<k256::Secp256k1>(&x_bytes, &y_bytes),
            Curve::Secp256r1 => on_curve_generic::<p256::NistP256>(&x_bytes, &y_bytes),
            Curve::Secp384r1 => on_curve_generic::<p384::NistP384>(&x_bytes, &y_bytes),
            Curve::Secp521r1 => on_curve_generic::<p521::NistP521>(&x_bytes, &y_bytes),
        }
    }
}

/// Left-pads (or rejects if too long) a big-endian byte string to `len`.
fn pad_be(bytes: &[u8], len: usize) -> Result<Vec<u8>, LatticeError> {
    if bytes.len() > len {
        return Err(LatticeError::InvalidScalar);
    }
    let mut out = vec![0u8; len];
    out[len - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

fn derive_generic<C>(d_bytes: &[u8]) -> Result<(UBig, UBig), LatticeError>
where
    C: CurveArithmetic,
    AffinePoint<C>: ToEncodedPoint<C>,
{
    let secret = SecretKey::<C>::from_slice(d_bytes).map_err(|_| LatticeError::InvalidScalar)?;
    let encoded = secret.public_key().to_encoded_point(false);
    let x = encoded.x().ok_or(LatticeError::InvalidScalar)?;
    let y = encoded.y().ok_or(LatticeError::InvalidScalar)?;
    Ok((UBig::from_be_bytes(x), UBig::from_be_bytes(y)))
}

fn on_curve_generic<C>(x_bytes: &[u8], y_bytes: &[u8]) -> bool
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
{
    let encoded = elliptic_curve::sec1::EncodedPoint::<C>::from_affine_coordinates(
        x_bytes.into(),
        y_bytes.into(),
        false,
    );
    PublicKey::<C>::from_sec1_bytes(encoded.as_bytes()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_names_round_trip() {
        for curve in [
            Curve::Secp224r1,
            Curve::Secp256k1,
            Curve::Secp256r1,
            Curve::Secp384r1,
            Curve::Secp521r1,
        ] {
            assert_eq!(Curve::from_name(curve.name()).unwrap(), curve);
            assert_eq!(Curve::from_name(&curve.name().to_ascii_lowercase()).unwrap(), curve);
        }
    }

    #[test]
    fn unknown_curve_rejected() {
        assert!(Curve::from_name("secp999k7").is_err());
    }

    #[test]
    fn identity_like_point_is_not_on_curve() {
        assert!(!Curve::Secp256k1.on_curve(&UBig::ZERO, &UBig::ZERO));
    }

    #[test]
    fn derive_then_on_curve_agrees() {
        let curve = Curve::Secp256k1;
        let d = UBig::from(12345u64);
        let (x, y) = curve.derive(&d).unwrap();
        assert!(curve.on_curve(&x, &y));
    }

    #[test]
    fn zero_scalar_is_invalid() {
        assert!(Curve::Secp256k1.derive(&UBig::ZERO).is_err());
    }
}

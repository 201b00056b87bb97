//! Input adapter: normalizes the external JSON contract into
//! the in-memory `ProblemInstance` the recovery driver consumes.

use dashu::integer::UBig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::curve::Curve;
use crate::error::LatticeError;

/// `LSB` or `MSB` leaked-bit alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownBits {
    Lsb,
    Msb,
}

impl KnownBits {
    fn from_str(s: &str) -> Result<Self, LatticeError> {
        match s.to_ascii_uppercase().as_str() {
            "LSB" => Ok(KnownBits::Lsb),
            "MSB" => Ok(KnownBits::Msb),
            other => Err(LatticeError::MalformedInput(format!(
                "known_type must be \"LSB\" or \"MSB\", got {other:?}"
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            KnownBits::Lsb => "LSB",
            KnownBits::Msb => "MSB",
        }
    }
}

/// One `(r, s, kp, h)` signature sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSample {
    pub r: UBig,
    pub s: UBig,
    pub kp: UBig,
    pub hash: UBig,
}

/// A fully-validated, in-memory recovery problem.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    pub curve: Curve,
    pub public_key: (UBig, UBig),
    pub known_bits: KnownBits,
    pub leak_width: u32,
    pub signatures: Vec<SignatureSample>,
    /// `Some(h)` when every signature shares one message hash (the
    /// top-level `message` key was present); `None` when each sample
    /// carries its own `hash`.
    pub global_hash: Option<UBig>,
    /// The raw message bytes `global_hash` was derived from, retained so
    /// `to_json` can re-emit the original `message` key instead of the
    /// digest it produced (the digest alone can't be turned back into the
    /// bytes that hashed to it).
    pub message: Option<Vec<u8>>,
}

/// Raw wire shape of the JSON contract, deserialized before
/// validation and big-integer conversion.
#[derive(Debug, Deserialize, Serialize)]
struct RawProblem {
    curve: String,
    public_key: (DecimalBigInt, DecimalBigInt),
    known_type: String,
    known_bits: u32,
    signatures: Vec<RawSignature>,
    #[serde(default)]
    message: Option<MessageBytes>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawSignature {
    r: DecimalBigInt,
    s: DecimalBigInt,
    kp: DecimalBigInt,
    #[serde(default)]
    hash: Option<DecimalBigInt>,
}

/// An arbitrary-precision integer accepted either as a JSON number (the
/// reference generator's actual output, since Python dumps its native ints
/// straight through `json.dump`) or as a decimal string (friendlier to
/// hand-author and round-trips losslessly through `serde_json::Value`
/// regardless). `serde_json`'s `arbitrary_precision` feature keeps large
/// number literals as exact decimal text instead of collapsing them to
/// `f64`, which is what makes the JSON-number path safe for 521-bit values.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DecimalBigInt(UBig);

impl<'de> Deserialize<'de> for DecimalBigInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected a decimal integer, got {other}"
                )))
            }
        };
        UBig::from_str_radix(&text, 10)
            .map(DecimalBigInt)
            .map_err(|_| serde::de::Error::custom(format!("{text:?} is not a decimal integer")))
    }
}

impl Serialize for DecimalBigInt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

/// `message` is documented as a JSON array of byte integers, but the
/// original tool's generator and attacker disagree on whether it's an
/// array or a hex string; accept either.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageBytes {
    Bytes(Vec<u8>),
    Hex(String),
}

impl<'de> Deserialize<'de> for MessageBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bytes(Vec<u8>),
            Hex(String),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bytes(b) => MessageBytes::Bytes(b),
            Repr::Hex(h) => MessageBytes::Hex(h),
        })
    }
}

impl MessageBytes {
    fn into_bytes(self) -> Result<Vec<u8>, LatticeError> {
        match self {
            MessageBytes::Bytes(b) => Ok(b),
            MessageBytes::Hex(h) => {
                let h = h.strip_prefix("0x").unwrap_or(&h);
                hex::decode(h)
                    .map_err(|e| LatticeError::MalformedInput(format!("message hex: {e}")))
            }
        }
    }
}

impl ProblemInstance {
    /// Parses and validates a problem instance from the JSON contract
    /// Fails fast with `MalformedInput`/`BadInput`/
    /// `UnknownCurve`/`InvalidPublicKey` before any lattice work.
    pub fn from_json(data: &str) -> Result<Self, LatticeError> {
        let raw: RawProblem = serde_json::from_str(data)
            .map_err(|e| LatticeError::MalformedInput(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawProblem) -> Result<Self, LatticeError> {
        let curve = Curve::from_name(&raw.curve)?;
        let known_bits = KnownBits::from_str(&raw.known_type)?;

        let qx = raw.public_key.0 .0;
        let qy = raw.public_key.1 .0;
        if !curve.on_curve(&qx, &qy) {
            return Err(LatticeError::InvalidPublicKey);
        }

        let (global_hash, message) = match raw.message {
            Some(msg) => {
                let bytes = msg.into_bytes()?;
                let digest = Sha256::digest(&bytes);
                (Some(UBig::from_be_bytes(&digest)), Some(bytes))
            }
            None => (None, None),
        };

        if raw.signatures.is_empty() {
            return Err(LatticeError::MalformedInput(
                "signatures must not be empty".to_string(),
            ));
        }

        let mut signatures = Vec::with_capacity(raw.signatures.len());
        for (i, sig) in raw.signatures.into_iter().enumerate() {
            let hash = match (&global_hash, sig.hash) {
                (Some(_), _) => UBig::ZERO, // unused per-sample when global_hash is Some
                (None, Some(h)) => h.0,
                (None, None) => {
                    return Err(LatticeError::MalformedInput(format!(
                        "signatures[{i}] is missing \"hash\" and no top-level \"message\" was given"
                    )))
                }
            };
            let r = sig.r.0;
            let s = sig.s.0;
            let kp = sig.kp.0;

            let n = curve.order();
            if r == UBig::ZERO || r >= n || s == UBig::ZERO || s >= n {
                return Err(LatticeError::BadInput(format!(
                    "signatures[{i}] has r or s out of range [1, n)"
                )));
            }
            let kbi = UBig::ONE << (raw.known_bits as usize);
            if kp >= kbi {
                return Err(LatticeError::BadInput(format!(
                    "signatures[{i}].kp has more than known_bits bits"
                )));
            }

            signatures.push(SignatureSample { r, s, kp, hash });
        }

        Ok(ProblemInstance {
            curve,
            public_key: (qx, qy),
            known_bits,
            leak_width: raw.known_bits,
            signatures,
            global_hash,
            message,
        })
    }

    /// Re-serializes this instance back into the JSON contract shape, used
    /// to exercise the input adapter's idempotence property.
    pub fn to_json(&self) -> Result<String, LatticeError> {
        let raw = RawProblem {
            curve: self.curve.name().to_string(),
            public_key: (
                DecimalBigInt(self.public_key.0.clone()),
                DecimalBigInt(self.public_key.1.clone()),
            ),
            known_type: self.known_bits.as_str().to_string(),
            known_bits: self.leak_width,
            signatures: self
                .signatures
                .iter()
                .map(|s| RawSignature {
                    r: DecimalBigInt(s.r.clone()),
                    s: DecimalBigInt(s.s.clone()),
                    kp: DecimalBigInt(s.kp.clone()),
                    hash: self
                        .global_hash
                        .is_none()
                        .then(|| DecimalBigInt(s.hash.clone())),
                })
                .collect(),
            message: self.message.clone().map(MessageBytes::Bytes),
        };
        serde_json::to_string(&raw).map_err(|e| LatticeError::MalformedInput(e.to_string()))
    }
}

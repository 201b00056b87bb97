use thiserror::Error;

/// Every failure mode this crate can surface, from JSON parsing down to a
/// degenerate signature discovered mid-build.
///
/// `NotFound` deliberately is not one of these variants: recovery exhaustion
/// is a normal negative result, represented as `Ok(None)` by the driver, not
/// an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LatticeError {
    #[error("unknown curve {0:?}, expected one of SECP224R1, SECP256K1, SECP256R1, SECP384R1, SECP521R1")]
    UnknownCurve(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("public key is not a valid point on the curve")]
    InvalidPublicKey,

    #[error("scalar out of range for this curve")]
    InvalidScalar,

    #[error("known_bits must be at least {minimum}, got {got}")]
    InsufficientLeakage { minimum: u32, got: u32 },

    #[error("need at least {required} signatures for this leakage width, got {got}")]
    NotEnoughSignatures { required: usize, got: usize },

    #[error("{0} is not invertible modulo the curve order")]
    NotInvertible(String),
}

//! Recovers an ECDSA private key from signatures whose nonces leaked a
//! fixed number of least- or most-significant bits, by reducing the
//! problem to the Hidden Number Problem and solving it with lattice basis
//! reduction (LLL, then escalating BKZ block sizes).
//!
//! Data flows one-way: [`input`] → [`recover`]'s driver → [`lattice`]'s
//! basis builder → [`reduction`]'s oracle → [`recover`]'s extractor →
//! [`curve`]'s verification.

pub mod bigint;
pub mod curve;
pub mod error;
pub mod input;
pub mod lattice;
pub mod recover;
pub mod reduction;

pub use curve::Curve;
pub use error::LatticeError;
pub use input::{KnownBits, ProblemInstance, SignatureSample};
pub use recover::recover_private_key;

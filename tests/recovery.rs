//! End-to-end exercises of the public API: the fast precondition-failure
//! paths run unconditionally; the slow, full lattice-reduction recoveries
//! are gated behind `#[ignore]` since they burn real CPU time reducing a
//! ~60-dimensional basis (run with `cargo test -- --ignored`).

use dashu::integer::UBig;
use lattice_attack::bigint::{add_mod, inv_mod, mul_mod};
use lattice_attack::error::LatticeError;
use lattice_attack::input::{KnownBits, ProblemInstance, SignatureSample};
use lattice_attack::{recover_private_key, Curve};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_scalar(rng: &mut ChaCha8Rng, n: &UBig) -> UBig {
    let byte_len = (n.bit_len() + 7) / 8;
    loop {
        let mut buf = vec![0u8; byte_len];
        rng.fill_bytes(&mut buf);
        let candidate = UBig::from_be_bytes(&buf) % n;
        if candidate != UBig::ZERO {
            return candidate;
        }
    }
}

/// Builds a `ProblemInstance` with `count` signatures leaking `leak_width`
/// bits of a freshly generated private key, returning the instance and the
/// planted key so a test can assert recovery found exactly it.
fn synthetic_instance(
    curve: Curve,
    leak_width: u32,
    known_bits: KnownBits,
    count: usize,
    seed: u64,
) -> (ProblemInstance, UBig) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = curve.order();
    let d = random_scalar(&mut rng, &n);
    let public_key = curve.derive(&d).unwrap();
    let h = UBig::from(42u64);
    let kbi = UBig::ONE << (leak_width as usize);

    let mut signatures = Vec::with_capacity(count);
    for _ in 0..count {
        let k = random_scalar(&mut rng, &n);
        let (rx, _) = curve.derive(&k).unwrap();
        let r = &rx % &n;
        let k_inv = inv_mod(&k, &n).unwrap();
        let s = mul_mod(&k_inv, &add_mod(&h, &mul_mod(&r, &d, &n), &n), &n);
        let kp = match known_bits {
            KnownBits::Lsb => &k % &kbi,
            KnownBits::Msb => &k >> (curve.bitsize() - leak_width) as usize,
        };
        signatures.push(SignatureSample { r, s, kp, hash: h.clone() });
    }

    let instance = ProblemInstance {
        curve,
        public_key,
        known_bits,
        leak_width,
        signatures,
        global_hash: Some(h),
        message: None,
    };
    (instance, d)
}

#[test]
fn rejects_leakage_below_the_minimum_bit_floor() {
    let (instance, _) = synthetic_instance(Curve::Secp256k1, 3, KnownBits::Lsb, 10, 1);
    let err = recover_private_key(&instance, false, Some(1)).unwrap_err();
    assert_eq!(
        err,
        LatticeError::InsufficientLeakage { minimum: 4, got: 3 }
    );
}

#[test]
fn rejects_too_few_signatures_for_the_leak_width() {
    let (instance, _) = synthetic_instance(Curve::Secp256k1, 6, KnownBits::Lsb, 3, 2);
    let err = recover_private_key(&instance, false, Some(2)).unwrap_err();
    match err {
        LatticeError::NotEnoughSignatures { required, got } => {
            assert_eq!(got, 3);
            assert!(required > got);
        }
        other => panic!("expected NotEnoughSignatures, got {other:?}"),
    }
}

#[test]
fn malformed_json_is_rejected_before_any_lattice_work() {
    let err = ProblemInstance::from_json("{ not json").unwrap_err();
    assert!(matches!(err, LatticeError::MalformedInput(_)));
}

#[test]
#[ignore]
fn recovers_planted_key_secp256k1_lsb() {
    let curve = Curve::Secp256k1;
    let leak_width = 6;
    let count = lattice_attack::recover::minimum_sigs_required(leak_width, curve) + 5;
    let (instance, planted) =
        synthetic_instance(curve, leak_width, KnownBits::Lsb, count, 7);
    let found = recover_private_key(&instance, true, Some(7))
        .expect("recovery should not error")
        .expect("recovery should find the planted key");
    assert_eq!(found, planted);
}

#[test]
#[ignore]
fn recovers_planted_key_secp256r1_msb() {
    let curve = Curve::Secp256r1;
    let leak_width = 8;
    let count = lattice_attack::recover::minimum_sigs_required(leak_width, curve) + 5;
    let (instance, planted) =
        synthetic_instance(curve, leak_width, KnownBits::Msb, count, 9);
    let found = recover_private_key(&instance, true, Some(9))
        .expect("recovery should not error")
        .expect("recovery should find the planted key");
    assert_eq!(found, planted);
}

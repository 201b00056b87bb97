//! Candidate extraction/verification and the recovery driver
//! that orchestrates subsampling, lattice construction and the escalating
//! reduction schedule.

use dashu::integer::UBig;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, info_span};

use crate::curve::Curve;
use crate::error::LatticeError;
use crate::input::ProblemInstance;
use crate::lattice::build_matrix;
use crate::reduction::{self, IntegerMatrix};

/// Minimum known-bits the scheme can work with at all.
pub const MINIMUM_BITS: u32 = 4;

/// The escalating reduction schedule: plain LLL, then
/// BKZ with these block sizes in order, reusing the basis between steps.
const BKZ_SCHEDULE: [usize; 5] = [15, 25, 40, 50, 60];

const SIGNATURES_NUMBER_MARGIN: f64 = 1.03;

/// `ceil(1.03 * (4/3) * B / l)`, the minimum sample count the reduction
/// schedule needs to succeed with high probability. The original Python
/// tool truncates (`int(...)`) instead of rounding up; this crate rounds up
/// instead, the choice pinned down as a testable property (see DESIGN.md).
pub fn minimum_sigs_required(leak_width: u32, curve: Curve) -> usize {
    let b = f64::from(curve.bitsize());
    let raw = SIGNATURES_NUMBER_MARGIN * (4.0 / 3.0) * b / f64::from(leak_width);
    raw.ceil() as usize
}

/// Scans a reduced basis for a row whose second-to-last column, reduced
/// mod `n`, derives to the target public key (or its negation). Returns
/// the first such verified candidate.
pub fn extract_candidate(
    basis: &IntegerMatrix,
    public_key: &(UBig, UBig),
    curve: Curve,
) -> Option<UBig> {
    let n = curve.order();
    let candidate_col = basis.dim() - 2;
    for row in basis.rows() {
        let raw = &row[candidate_col];
        let candidate = bigint_mod(raw, &n);
        if candidate == UBig::ZERO {
            continue;
        }
        if curve.derive(&candidate).ok().as_ref() == Some(public_key) {
            return Some(candidate);
        }
        let complement = &n - &candidate;
        if curve.derive(&complement).ok().as_ref() == Some(public_key) {
            return Some(complement);
        }
    }
    None
}

/// Reduces a (possibly negative) `num_bigint::BigInt` modulo `n`, folding
/// the result into `[0, n)`.
fn bigint_mod(value: &num_bigint::BigInt, n: &UBig) -> UBig {
    use num_traits::Signed;
    let n_big = num_bigint::BigInt::from_bytes_be(num_bigint::Sign::Plus, &n.to_be_bytes());
    let mut reduced = value % &n_big;
    if reduced.is_negative() {
        reduced += &n_big;
    }
    let (_, bytes) = reduced.to_bytes_be();
    UBig::from_be_bytes(&bytes)
}

/// Draws `count` indices from `[0, len)` without replacement.
fn sample_indices(rng: &mut ChaCha8Rng, len: usize, count: usize) -> Vec<usize> {
    rand::seq::index::sample(rng, len, count).into_vec()
}

/// Runs the full reduction schedule once against `subset`, returning the
/// verified private key candidate if the schedule finds one.
fn run_schedule(
    instance: &ProblemInstance,
    subset_indices: &[usize],
) -> Result<Option<UBig>, LatticeError> {
    let subset: Vec<_> = subset_indices
        .iter()
        .map(|&i| instance.signatures[i].clone())
        .collect();

    let span = info_span!("build_matrix", m = subset.len());
    let _enter = span.enter();
    let mut basis = build_matrix(
        &subset,
        instance.curve,
        instance.leak_width,
        instance.known_bits,
        instance.global_hash.as_ref(),
    )?;
    drop(_enter);

    debug!("constructed {}x{} lattice, starting LLL", basis.dim(), basis.dim());
    basis = reduction::lll(basis);
    if let Some(key) = extract_candidate(&basis, &instance.public_key, instance.curve) {
        info!("key recovered after LLL");
        return Ok(Some(key));
    }

    for &beta in &BKZ_SCHEDULE {
        debug!(block_size = beta, "running BKZ");
        basis = reduction::bkz(basis, beta);
        if let Some(key) = extract_candidate(&basis, &instance.public_key, instance.curve) {
            info!(block_size = beta, "key recovered after BKZ");
            return Ok(Some(key));
        }
    }
    Ok(None)
}

/// Runs the recovery driver. Returns `Ok(Some(d))`
/// on success, `Ok(None)` when the schedule (and, if `loop_until_found`,
/// every reshuffle) is exhausted without a match. `NotFound` is a normal
/// negative result, not an error.
pub fn recover_private_key(
    instance: &ProblemInstance,
    loop_until_found: bool,
    seed: Option<u64>,
) -> Result<Option<UBig>, LatticeError> {
    if instance.leak_width < MINIMUM_BITS {
        return Err(LatticeError::InsufficientLeakage {
            minimum: MINIMUM_BITS,
            got: instance.leak_width,
        });
    }

    let n_req = minimum_sigs_required(instance.leak_width, instance.curve);
    if instance.signatures.len() < n_req {
        return Err(LatticeError::NotEnoughSignatures {
            required: n_req,
            got: instance.signatures.len(),
        });
    }

    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_rng(rand::thread_rng()).expect("OS entropy available"),
    };

    loop {
        let subset = sample_indices(&mut rng, instance.signatures.len(), n_req);
        if let Some(key) = run_schedule(instance, &subset)? {
            return Ok(Some(key));
        }
        if !loop_until_found {
            return Ok(None);
        }
        info!("reduction schedule exhausted, reshuffling and trying again");
    }
}

/// Parallel variant of [`recover_private_key`]: fans independent reshuffle
/// attempts out across a `rayon` thread pool and returns the first verified
/// candidate, letting the other in-flight attempts run to completion. An
/// optional alternative to the single-threaded loop, not a replacement for
/// it.
#[cfg(feature = "parallel-retry")]
pub fn recover_private_key_parallel(
    instance: &ProblemInstance,
    attempts: usize,
    seed: Option<u64>,
) -> Result<Option<UBig>, LatticeError> {
    use std::sync::atomic::{AtomicBool, Ordering};

    if instance.leak_width < MINIMUM_BITS {
        return Err(LatticeError::InsufficientLeakage {
            minimum: MINIMUM_BITS,
            got: instance.leak_width,
        });
    }
    let n_req = minimum_sigs_required(instance.leak_width, instance.curve);
    if instance.signatures.len() < n_req {
        return Err(LatticeError::NotEnoughSignatures {
            required: n_req,
            got: instance.signatures.len(),
        });
    }

    let found = AtomicBool::new(false);
    let base_seed = seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    let results: Vec<Option<UBig>> = rayon::broadcast(|ctx| {
        if ctx.index() >= attempts || found.load(Ordering::Relaxed) {
            return None;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(ctx.index() as u64));
        let subset = sample_indices(&mut rng, instance.signatures.len(), n_req);
        let outcome = run_schedule(instance, &subset).ok().flatten();
        if outcome.is_some() {
            found.store(true, Ordering::Relaxed);
        }
        outcome
    });
    Ok(results.into_iter().flatten().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_signature_bound_matches_precomputed_table() {
        // secp256k1, l=6: ceil(1.03 * 4/3 * 256 / 6) = ceil(58.5...) = 59
        assert_eq!(minimum_sigs_required(6, Curve::Secp256k1), 59);
        // secp521r1, l=4: ceil(1.03 * 4/3 * 521 / 4) = ceil(178.88...) = 179
        assert_eq!(minimum_sigs_required(4, Curve::Secp521r1), 179);
    }

    #[test]
    fn extractor_finds_planted_key_in_trivial_basis() {
        let curve = Curve::Secp256k1;
        let d = UBig::from(999u64);
        let (qx, qy) = curve.derive(&d).unwrap();
        // A 1x1 basis whose sole entry is exactly the planted key.
        let mut basis = IntegerMatrix::zeros(1);
        basis.set(
            0,
            0,
            num_bigint::BigInt::from_bytes_be(num_bigint::Sign::Plus, &d.to_be_bytes()),
        );
        // extract_candidate expects dim() - 2 as the candidate column,
        // so pad to a 2x2 basis with the candidate in column 0.
        let mut basis2 = IntegerMatrix::zeros(2);
        basis2.set(0, 0, basis.get(0, 0).clone());
        let found = extract_candidate(&basis2, &(qx, qy), curve);
        assert_eq!(found, Some(d));
    }
}

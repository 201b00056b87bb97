//! Lattice reduction oracle: LLL and BKZ-with-block-size over an integer
//! basis.
//!
//! No maintained pure-Rust binding to a production lattice library (fplll,
//! NTL) exists among this crate's dependency stack, so this module vendors
//! one. Both LLL and BKZ are one algorithm, LLL with deep insertions: at
//! index `k` the
//! routine searches backwards up to `window` positions for an insertion
//! point that shortens the Gram-Schmidt profile. Plain LLL is `window = 1`
//! (only the adjacent swap the textbook algorithm allows); BKZ with block
//! size `β` is `window = β`. This keeps every intermediate basis an exact
//! unimodular transform of the input; no dependent-vector bookkeeping is
//! needed, unlike full enumeration-based BKZ, which trades some quality at
//! a given block size for a reduction oracle that's simple to get right.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// An integer-entry square basis matrix, row-major, matching the "integer
/// matrix type with row-major access" contract the reduction routines need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerMatrix {
    rows: Vec<Vec<BigInt>>,
}

impl IntegerMatrix {
    /// A `dim x dim` matrix of zeros.
    pub fn zeros(dim: usize) -> Self {
        IntegerMatrix {
            rows: vec![vec![BigInt::zero(); dim]; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, row: usize, col: usize) -> &BigInt {
        &self.rows[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: BigInt) {
        self.rows[row][col] = value;
    }

    pub fn row(&self, row: usize) -> &[BigInt] {
        &self.rows[row]
    }

    pub fn rows(&self) -> &[Vec<BigInt>] {
        &self.rows
    }

    fn from_rows(rows: Vec<Vec<BigInt>>) -> Self {
        IntegerMatrix { rows }
    }
}

/// LLL-reduce an integer basis (Lenstra–Lenstra–Lovász, `delta = 0.99`).
pub fn lll(basis: IntegerMatrix) -> IntegerMatrix {
    deep_lll(basis, 1)
}

/// BKZ-reduce an integer basis with block size `beta`, auto-aborting once a
/// full pass finds no further improvement.
pub fn bkz(basis: IntegerMatrix, beta: usize) -> IntegerMatrix {
    deep_lll(basis, beta.max(1))
}

fn lll_delta() -> BigRational {
    BigRational::new(BigInt::from(99), BigInt::from(100))
}

/// LLL with deep insertions, bounded to searching at most `window` steps
/// back from the current index. Returns a basis of the same rank spanning
/// the same lattice.
fn deep_lll(basis: IntegerMatrix, window: usize) -> IntegerMatrix {
    let n = basis.dim();
    if n == 0 {
        return basis;
    }
    let delta = lll_delta();
    let mut b = basis.rows;
    let (mut bstar, mut mu) = gram_schmidt(&b);

    let mut k = 1usize;
    while k < n {
        size_reduce_row(&mut b, &mu, k);
        let (nb, nmu) = gram_schmidt(&b);
        bstar = nb;
        mu = nmu;

        let window_start = k.saturating_sub(window);

        // Squared norm of b[k] projected beyond index j, starting at j=0
        // (the full vector) and peeling off one Gram-Schmidt component at a
        // time as j increases.
        let mut residual = normsq(&vec_to_rational(&b[k]));
        let mut insertion: Option<usize> = None;
        for j in 0..k {
            if j >= window_start && residual < &delta * normsq(&bstar[j]) {
                insertion = Some(j);
                break;
            }
            let comp = &mu[k][j] * &mu[k][j] * normsq(&bstar[j]);
            residual -= comp;
        }

        match insertion {
            Some(i) if i < k => {
                let moved = b.remove(k);
                b.insert(i, moved);
                let (nb, nmu) = gram_schmidt(&b);
                bstar = nb;
                mu = nmu;
                k = i.max(1);
            }
            _ => k += 1,
        }
    }
    IntegerMatrix::from_rows(b)
}

/// Reduces `b[k]` against `b[0..k)` using the integer-rounded GSO
/// coefficients, the standard LLL "size reduction" step.
fn size_reduce_row(b: &mut [Vec<BigInt>], mu: &[Vec<BigRational>], k: usize) {
    for j in (0..k).rev() {
        let q = round_rational(&mu[k][j]);
        if !q.is_zero() {
            let dim = b[k].len();
            for col in 0..dim {
                let delta = &q * &b[j][col];
                b[k][col] -= delta;
            }
        }
    }
}

fn vec_to_rational(v: &[BigInt]) -> Vec<BigRational> {
    v.iter().map(|x| BigRational::from_integer(x.clone())).collect()
}

fn dot(a: &[BigRational], b: &[BigRational]) -> BigRational {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn normsq(v: &[BigRational]) -> BigRational {
    dot(v, v)
}

/// Gram-Schmidt orthogonalization, returning the orthogonal vectors and the
/// `mu[i][j] = <b_i, b*_j> / <b*_j, b*_j>` coefficients for `j < i`.
fn gram_schmidt(b: &[Vec<BigInt>]) -> (Vec<Vec<BigRational>>, Vec<Vec<BigRational>>) {
    let n = b.len();
    let mut bstar: Vec<Vec<BigRational>> = Vec::with_capacity(n);
    let mut mu = vec![vec![BigRational::zero(); n]; n];
    for i in 0..n {
        let mut vi = vec_to_rational(&b[i]);
        for j in 0..i {
            let denom = normsq(&bstar[j]);
            let coeff = if denom.is_zero() {
                BigRational::zero()
            } else {
                dot(&vec_to_rational(&b[i]), &bstar[j]) / &denom
            };
            mu[i][j] = coeff.clone();
            for (vi_c, bstar_c) in vi.iter_mut().zip(bstar[j].iter()) {
                *vi_c -= &coeff * bstar_c;
            }
        }
        bstar.push(vi);
    }
    (bstar, mu)
}

/// Rounds a rational to the nearest integer, ties away from zero.
fn round_rational(r: &BigRational) -> BigInt {
    let half = BigRational::new(BigInt::from(1), BigInt::from(2));
    if r.is_negative() {
        (r - &half).ceil().to_integer()
    } else {
        (r + &half).floor().to_integer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_from(rows: Vec<Vec<i64>>) -> IntegerMatrix {
        IntegerMatrix::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(BigInt::from).collect())
                .collect(),
        )
    }

    #[test]
    fn lll_reduces_a_nearly_dependent_basis() {
        // A classic tiny example: one huge near-parallel pair of vectors
        // should collapse to something much shorter after reduction.
        let basis = matrix_from(vec![vec![1, 1, 1], vec![-1, 0, 2], vec![3, 5, 6]]);
        let reduced = lll(basis.clone());
        let original_norm: BigInt = basis.rows()[0].iter().map(|x| x * x).sum();
        let shortest: BigInt = reduced
            .rows()
            .iter()
            .map(|row| row.iter().map(|x| x * x).sum::<BigInt>())
            .min()
            .unwrap();
        assert!(shortest <= original_norm);
    }

    #[test]
    fn reduction_preserves_lattice_rank() {
        let basis = matrix_from(vec![vec![4, 0, 0], vec![0, 4, 0], vec![0, 0, 4]]);
        let reduced = bkz(basis, 2);
        // An already-orthogonal basis should come back unchanged in norm.
        for row in reduced.rows() {
            let norm: BigInt = row.iter().map(|x| x * x).sum();
            assert_eq!(norm, BigInt::from(16));
        }
    }

    #[test]
    fn deep_insertion_window_one_matches_plain_lll() {
        let basis = matrix_from(vec![vec![1, 1, 1], vec![-1, 0, 2], vec![3, 5, 6]]);
        assert_eq!(lll(basis.clone()), bkz(basis, 1));
    }
}

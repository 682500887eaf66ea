#![deny(missing_docs)]
#![allow(non_snake_case)]

use clear_on_drop::clear::Clear;
use curve25519_dalek::scalar::Scalar;

/// Represents a degree-1 vector polynomial \\(\mathbf{a} + \mathbf{b} \cdot x\\).
pub struct VecPoly1(pub Vec<Scalar>, pub Vec<Scalar>);

/// Represents a degree-2 scalar polynomial \\(a + b \cdot x + c \cdot x^2\\)
pub struct Poly2(pub Scalar, pub Scalar, pub Scalar);

/// Provides an iterator over the powers of a `Scalar`.
///
/// This struct is created by the `exp_iter` function.
pub struct ScalarExp {
    x: Scalar,
    next_exp_x: Scalar,
}

impl Iterator for ScalarExp {
    type Item = Scalar;

    fn next(&mut self) -> Option<Scalar> {
        let exp_x = self.next_exp_x;
        self.next_exp_x *= self.x;
        Some(exp_x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::max_value(), None)
    }
}

/// Return an iterator of the powers of `x`.
pub fn exp_iter(x: Scalar) -> ScalarExp {
    let next_exp_x = Scalar::one();
    ScalarExp { x, next_exp_x }
}

/// Flat position of entry `component` of party `party` in an
/// interleaved sequence built for `parties` parties.
///
/// Entries are grouped by component: all parties' entry 0, then all
/// parties' entry 1, and so on.
pub fn interleaved_index(component: usize, party: usize, parties: usize) -> usize {
    component * parties + party
}

/// Builds the interleaved sequence of `components * parties` entries,
/// where `entry(i, j)` lands at `interleaved_index(i, j, parties)`.
///
/// This is the only place the layout is decided; both the aggregated
/// `l`, `r` vectors and the derived generator vectors go through it.
pub fn interleave<T, F>(components: usize, parties: usize, mut entry: F) -> Vec<T>
where
    F: FnMut(usize, usize) -> T,
{
    let mut out = Vec::with_capacity(components * parties);
    for i in 0..components {
        for j in 0..parties {
            debug_assert_eq!(out.len(), interleaved_index(i, j, parties));
            out.push(entry(i, j));
        }
    }
    out
}

/// Computes the elementwise sum of two equal-length vectors.
pub fn add_vec(a: &[Scalar], b: &[Scalar]) -> Vec<Scalar> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a_i, b_i)| a_i + b_i).collect()
}

/// Computes an inner product of two vectors
/// \\[
///    {\langle {\mathbf{a}}, {\mathbf{b}} \rangle} = \sum\_{i=0}^{n-1} a\_i \cdot b\_i.
/// \\]
/// Panics if the lengths of \\(\mathbf{a}\\) and \\(\mathbf{b}\\) are not equal.
pub fn inner_product(a: &[Scalar], b: &[Scalar]) -> Scalar {
    let mut out = Scalar::zero();
    if a.len() != b.len() {
        panic!("inner_product(a,b): lengths of vectors do not match");
    }
    for i in 0..a.len() {
        out += a[i] * b[i];
    }
    out
}

impl VecPoly1 {
    /// Returns the zero polynomial with vectors of length `n`.
    pub fn zero(n: usize) -> Self {
        VecPoly1(vec![Scalar::zero(); n], vec![Scalar::zero(); n])
    }

    /// Computes the scalar polynomial \\(\langle \mathbf{l}(x), \mathbf{r}(x) \rangle\\).
    pub fn inner_product(&self, rhs: &VecPoly1) -> Poly2 {
        // Uses Karatsuba's method
        let l = self;
        let r = rhs;

        let t0 = inner_product(&l.0, &r.0);
        let t2 = inner_product(&l.1, &r.1);

        let l0_plus_l1 = add_vec(&l.0, &l.1);
        let r0_plus_r1 = add_vec(&r.0, &r.1);

        let t1 = inner_product(&l0_plus_l1, &r0_plus_r1) - t0 - t2;

        Poly2(t0, t1, t2)
    }

    /// Evaluates the polynomial at `x`.
    pub fn eval(&self, x: Scalar) -> Vec<Scalar> {
        let n = self.0.len();
        let mut out = vec![Scalar::zero(); n];
        for i in 0..n {
            out[i] = self.0[i] + self.1[i] * x;
        }
        out
    }
}

impl Poly2 {
    /// Evaluates the polynomial at `x`.
    pub fn eval(&self, x: Scalar) -> Scalar {
        self.0 + x * (self.1 + x * self.2)
    }
}

impl Drop for VecPoly1 {
    fn drop(&mut self) {
        for e in self.0.iter_mut() {
            e.clear();
        }
        for e in self.1.iter_mut() {
            e.clear();
        }
    }
}

impl Drop for Poly2 {
    fn drop(&mut self) {
        self.0.clear();
        self.1.clear();
        self.2.clear();
    }
}

/// Raises `x` to the power `n` using binary exponentiation,
/// with (1 to 2)*lg(n) scalar multiplications. Not constant time in `n`.
pub fn scalar_exp_vartime(x: &Scalar, mut n: u64) -> Scalar {
    let mut result = Scalar::one();
    let mut aux = *x; // x, x^2, x^4, x^8, ...
    while n > 0 {
        if n & 1 == 1 {
            result = result * aux;
        }
        n = n >> 1;
        aux = aux * aux;
    }
    result
}

/// Takes the sum of all the powers of `x`, up to `n`.
pub fn sum_of_powers(x: &Scalar, n: usize) -> Scalar {
    exp_iter(*x)
        .take(n)
        .fold(Scalar::zero(), |acc, exp_x| acc + exp_x)
}

/// Given `data` with `len >= 32`, return the first 32 bytes.
pub fn read32(data: &[u8]) -> [u8; 32] {
    let mut buf32 = [0u8; 32];
    buf32[..].copy_from_slice(&data[..32]);
    buf32
}

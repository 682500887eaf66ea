//! The `generators` module contains API for producing a
//! set of generators for a balance proof.

#![allow(non_snake_case)]
#![deny(missing_docs)]

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_COMPRESSED;
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::MultiscalarMul;

use byteorder::{ByteOrder, LittleEndian};
use digest::{ExtendableOutput, Input, XofReader};
use sha3::{Sha3XofReader, Sha3_512, Shake256};

use util;

/// Represents a pair of base points for Pedersen commitments.
///
/// The balance proof implementation and API is designed to support
/// pluggable bases for Pedersen commitments, so that the choice of
/// bases is not hard-coded.
///
/// The default generators are:
///
/// * `B`: the `ristretto255` basepoint;
/// * `B_blinding`: the result of `ristretto255` SHA3-512
/// hash-to-group on input `B_bytes`.
#[derive(Copy, Clone, Debug)]
pub struct PedersenGens {
    /// Base for the committed value
    pub B: RistrettoPoint,
    /// Base for the blinding factor
    pub B_blinding: RistrettoPoint,
}

impl PedersenGens {
    /// Creates a Pedersen commitment using the value scalar and a blinding factor.
    pub fn commit(&self, value: Scalar, blinding: Scalar) -> RistrettoPoint {
        RistrettoPoint::multiscalar_mul(&[value, blinding], &[self.B, self.B_blinding])
    }
}

impl Default for PedersenGens {
    fn default() -> Self {
        PedersenGens {
            B: RISTRETTO_BASEPOINT_POINT,
            B_blinding: RistrettoPoint::hash_from_bytes::<Sha3_512>(
                RISTRETTO_BASEPOINT_COMPRESSED.as_bytes(),
            ),
        }
    }
}

/// The `GeneratorsChain` creates an arbitrary-long sequence of
/// orthogonal generators.  The sequence can be deterministically
/// produced starting with an arbitrary point.
struct GeneratorsChain {
    reader: Sha3XofReader,
}

impl GeneratorsChain {
    /// Creates a chain of generators, determined by the hash of `label`.
    fn new(label: &[u8]) -> Self {
        let mut shake = Shake256::default();
        shake.input(b"GeneratorsChain");
        shake.input(label);

        GeneratorsChain {
            reader: shake.xof_result(),
        }
    }
}

impl Iterator for GeneratorsChain {
    type Item = RistrettoPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let mut uniform_bytes = [0u8; 64];
        self.reader.read(&mut uniform_bytes);

        Some(RistrettoPoint::from_uniform_bytes(&uniform_bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::max_value(), None)
    }
}

/// The `BulletproofGens` struct contains the base generator vectors
/// \\({\mathbf{G}}\\) and \\({\mathbf{H}}\\) of every party: party
/// \\(j\\) commits to its bits against its own share
/// \\({\mathbf{G}}^{(j)}, {\mathbf{H}}^{(j)}\\), drawn from a chain of
/// its own.
///
/// The base vectors are never modified: an aggregated proof derives
/// its own, longer vectors with [`BulletproofGens::interleaved`], so one
/// `BulletproofGens` can be shared read-only by any number of
/// concurrent proofs.
#[derive(Clone, Debug)]
pub struct BulletproofGens {
    /// The maximum bitsize of values provable with these generators.
    pub gens_capacity: usize,
    /// The maximum number of parties that can be aggregated.
    pub party_capacity: usize,
    /// Precomputed \\(\mathbf G\\) generators for each party.
    G_vec: Vec<Vec<RistrettoPoint>>,
    /// Precomputed \\(\mathbf H\\) generators for each party.
    H_vec: Vec<Vec<RistrettoPoint>>,
}

impl BulletproofGens {
    /// Create a new `BulletproofGens` object.
    ///
    /// # Inputs
    ///
    /// * `gens_capacity` is the number of generators to precompute
    ///    for each party, that is, the largest bitsize these
    ///    generators can prove.
    ///
    /// * `party_capacity` is the maximum number of parties that can
    ///    produce an aggregated proof.
    pub fn new(gens_capacity: usize, party_capacity: usize) -> Self {
        let chains = |letter: u8| -> Vec<Vec<RistrettoPoint>> {
            (0..party_capacity)
                .map(|j| {
                    let mut label = [letter, 0, 0, 0, 0];
                    LittleEndian::write_u32(&mut label[1..5], j as u32);
                    GeneratorsChain::new(&label).take(gens_capacity).collect()
                })
                .collect()
        };

        BulletproofGens {
            gens_capacity,
            party_capacity,
            G_vec: chains(b'G'),
            H_vec: chains(b'H'),
        }
    }

    /// Returns j-th share of generators, with an appropriate
    /// slice of vectors G and H for the j-th party.
    pub(crate) fn share(&self, j: usize) -> BulletproofGensShare {
        BulletproofGensShare {
            gens: self,
            share: j,
        }
    }

    /// Derives freshly allocated generator vectors for an aggregated
    /// proof of `m` parties proving `n`-bit ranges.
    ///
    /// Position `util::interleaved_index(i, j, m)` holds generator `i`
    /// of party `j`. The vectors are then extended to the next power of
    /// two with generators from separate chains, which the parties'
    /// zero padding is committed against.
    ///
    /// Callers check `n <= gens_capacity` and `m <= party_capacity`.
    pub(crate) fn interleaved(&self, n: usize, m: usize) -> InterleavedGens {
        let padded_len = (n * m).next_power_of_two();
        let padding = padded_len - n * m;

        let mut G_vec = util::interleave(n, m, |i, j| self.G_vec[j][i]);
        let mut H_vec = util::interleave(n, m, |i, j| self.H_vec[j][i]);
        G_vec.extend(GeneratorsChain::new(b"G padding").take(padding));
        H_vec.extend(GeneratorsChain::new(b"H padding").take(padding));

        InterleavedGens { G_vec, H_vec }
    }
}

/// Represents a view of the generators used by a specific party in an
/// aggregated proof.
#[derive(Copy, Clone)]
pub(crate) struct BulletproofGensShare<'a> {
    /// The parent object that this is a view into
    gens: &'a BulletproofGens,
    /// Which share we are
    share: usize,
}

impl<'a> BulletproofGensShare<'a> {
    /// Return an iterator over this party's first `n` \\(\mathbf G\\) generators.
    pub(crate) fn G(&self, n: usize) -> impl Iterator<Item = &'a RistrettoPoint> {
        self.gens.G_vec[self.share].iter().take(n)
    }

    /// Return an iterator over this party's first `n` \\(\mathbf H\\) generators.
    pub(crate) fn H(&self, n: usize) -> impl Iterator<Item = &'a RistrettoPoint> {
        self.gens.H_vec[self.share].iter().take(n)
    }
}

/// Generator vectors owned by a single aggregated proof.
///
/// Created by [`BulletproofGens::interleaved`].
#[derive(Clone, Debug)]
pub(crate) struct InterleavedGens {
    /// Interleaved and padded \\(\mathbf G\\) generators.
    pub(crate) G_vec: Vec<RistrettoPoint>,
    /// Interleaved and padded \\(\mathbf H\\) generators.
    pub(crate) H_vec: Vec<RistrettoPoint>,
}

impl InterleavedGens {
    /// The padded length of the vectors, a power of two.
    pub(crate) fn len(&self) -> usize {
        self.G_vec.len()
    }

    /// Per-position factors \\(y^{-k}\\) applied to the \\(\mathbf H\\)
    /// generators, for every flat position `k`.
    pub(crate) fn h_factors(&self, y_inv: Scalar) -> Vec<Scalar> {
        util::exp_iter(y_inv).take(self.len()).collect()
    }
}

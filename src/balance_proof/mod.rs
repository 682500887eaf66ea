#![allow(non_snake_case)]
//! Aggregated balance proofs.
//!
//! Each party holds an amount \\(v\_j\\) and a blinding factor
//! \\(\gamma\_j\\), commits to it as \\(V\_j\\), and has a
//! [`Role`](messages::Role): sources count positively, destinations
//! negatively. A [`Coordinator`](coordinator::Coordinator) combines the
//! parties' messages:
//!
//! * round 0: value commitments \\(V\_j\\), bit commitments \\(A\_j, S\_j\\)
//!   and balance nonces \\(K\_j\\), answered with challenges \\(y, z, c\\);
//! * round 1: polynomial commitments \\(T\_{1,j}, T\_{2,j}\\), answered
//!   with challenges \\(x\\) and \\(e\\);
//! * round 2: proof shares, folded into one inner-product proof over
//!   the parties' generators, interleaved bit by bit.
//!
//! The range statements are summed without sign: party \\(j\\) weights
//! its value by \\(z^2 c^{j+1}\\), so one party's bits cannot make up for
//! another's, and the inner-product proof opens exactly the aggregated
//! \\(t(x)\\). The value commitments and the balance nonces are summed
//! with the party's sign. The signed commitment \\(V\\) therefore opens to
//! \\(\sum \pm v\_j\\), and the balance signature
//! \\(s \cdot B\_{blinding} = K + e \cdot V\\) only verifies when that sum
//! is zero.

use std::iter;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::{Identity, VartimeMultiscalarMul};
use merlin::Transcript;
use rand::{thread_rng, CryptoRng, RngCore};
use rayon::prelude::*;

use errors::ProofError;
use generators::{BulletproofGens, PedersenGens};
use inner_product_proof::InnerProductProof;
use transcript::TranscriptProtocol;
use util;

use serde::de::Visitor;
use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

pub mod challenges;
pub mod coordinator;
pub mod messages;
pub mod party;

use self::coordinator::Coordinator;
use self::messages::Role;
use self::party::Party;

/// Number of compressed points in a proof besides the inner-product
/// proof: \\(V, A, S, T\_1, T\_2, K\\).
const POINT_COUNT: usize = 6;
/// Number of scalars in a proof besides the inner-product proof.
const SCALAR_COUNT: usize = 7;

/// A proof that every party's committed amount lies in
/// \\([0, 2^n)\\) and that the sources balance the destinations.
///
/// The parties' value commitments and roles are the statement being
/// proven; they are not part of the proof and must be given to the
/// verifier in party order.
#[derive(Clone, Debug)]
pub struct AggregateProof {
    /// Bitsize of each party's range
    n: u8,
    /// Signed sum of the parties' value commitments
    V: CompressedRistretto,
    /// Commitment to the bits of the values
    A: CompressedRistretto,
    /// Commitment to the blinding factors
    S: CompressedRistretto,
    /// Commitment to the \\(t_1\\) coefficient of \\( t(x) \\)
    T_1: CompressedRistretto,
    /// Commitment to the \\(t_2\\) coefficient of \\( t(x) \\)
    T_2: CompressedRistretto,
    /// Nonce commitment of the balance signature
    K: CompressedRistretto,
    y: Scalar,
    z: Scalar,
    x: Scalar,
    /// Blinding factor for the synthetic commitment to \\(t(x)\\)
    t_x_blinding: Scalar,
    /// Evaluation of the polynomial \\(t(x)\\) at the challenge point \\(x\\)
    t_x: Scalar,
    /// Blinding factor for the synthetic commitment to the inner-product arguments
    e_blinding: Scalar,
    /// Response of the balance signature
    excess: Scalar,
    /// Proof data for the inner-product argument.
    ipp_proof: InnerProductProof,
}

impl AggregateProof {
    /// Create a balance proof for the amounts `values`, with blinding
    /// factors `blindings` and roles `roles`, each in \\([0, 2^n)\\).
    ///
    /// This is a convenience wrapper around
    /// [`AggregateProof::prove_with_rng`], using the thread-local RNG.
    pub fn prove(
        bp_gens: &BulletproofGens,
        pc_gens: &PedersenGens,
        transcript: &mut Transcript,
        values: &[u64],
        blindings: &[Scalar],
        roles: &[Role],
        n: usize,
    ) -> Result<(AggregateProof, Vec<CompressedRistretto>), ProofError> {
        AggregateProof::prove_with_rng(
            bp_gens,
            pc_gens,
            transcript,
            values,
            blindings,
            roles,
            n,
            &mut thread_rng(),
        )
    }

    /// Create a balance proof, running every party and the coordinator
    /// locally. Returns the proof and the parties' value commitments,
    /// in party order.
    ///
    /// The parties commit one after another, since they share `rng`;
    /// the two later rounds run the parties in parallel.
    pub fn prove_with_rng<T: RngCore + CryptoRng>(
        bp_gens: &BulletproofGens,
        pc_gens: &PedersenGens,
        transcript: &mut Transcript,
        values: &[u64],
        blindings: &[Scalar],
        roles: &[Role],
        n: usize,
        rng: &mut T,
    ) -> Result<(AggregateProof, Vec<CompressedRistretto>), ProofError> {
        if values.len() != blindings.len() || values.len() != roles.len() {
            return Err(ProofError::WrongNumBlindingFactors);
        }
        let m = values.len();

        let coordinator = Coordinator::new(bp_gens, pc_gens, transcript, n, roles.to_vec())?;

        let parties: Vec<_> = values
            .iter()
            .zip(blindings.iter())
            .map(|(&v, &v_blinding)| Party::new(bp_gens, pc_gens, v, v_blinding, n))
            // Collect the iterator of Results into a Result<Vec>
            .collect::<Result<Vec<_>, _>>()?;

        let (parties, bit_commitments): (Vec<_>, Vec<_>) = parties
            .into_iter()
            .enumerate()
            .map(|(j, p)| p.assign_position_with_rng(j, m, rng))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .unzip();

        let value_commitments: Vec<CompressedRistretto> = bit_commitments
            .iter()
            .map(|bc| bc.V_j.compress())
            .collect();

        let (coordinator, bit_challenge) = coordinator.receive_bit_commitments(bit_commitments)?;

        let (parties, poly_commitments): (Vec<_>, Vec<_>) = parties
            .into_par_iter()
            .map(|p| p.apply_challenge(&bit_challenge))
            .unzip();

        let (coordinator, poly_challenge) =
            coordinator.receive_poly_commitments(poly_commitments)?;

        let proof_shares: Vec<_> = parties
            .into_par_iter()
            .map(|p| p.apply_challenge(&poly_challenge))
            .collect::<Result<Vec<_>, _>>()?;

        let (proof, _) = coordinator.receive_trusted_shares(&proof_shares)?;

        Ok((proof, value_commitments))
    }

    /// Verifies a balance proof for the parties committed to in
    /// `value_commitments`, with roles `roles`, each proving an `n`-bit
    /// range.
    pub fn verify(
        &self,
        bp_gens: &BulletproofGens,
        pc_gens: &PedersenGens,
        transcript: &mut Transcript,
        value_commitments: &[CompressedRistretto],
        roles: &[Role],
        n: usize,
    ) -> Result<(), ProofError> {
        let m = value_commitments.len();

        if n == 0 || n > 64 {
            return Err(ProofError::InvalidBitsize);
        }
        if m == 0 || roles.len() != m {
            return Err(ProofError::InvalidAggregation);
        }
        if bp_gens.gens_capacity < n || bp_gens.party_capacity < m {
            return Err(ProofError::InvalidGeneratorsLength);
        }
        let nm = n
            .checked_mul(m)
            .filter(|nm| nm.checked_next_power_of_two().is_some())
            .ok_or(ProofError::InvalidAggregation)?;
        if self.n as usize != n {
            return Err(ProofError::VerificationError);
        }

        transcript.balanceproof_domain_sep(n as u64, m as u64);

        let (y, z) = challenges::bit_challenges(&self.V, self.n, &self.A, &self.S);
        let x = challenges::poly_challenge(&z, &self.T_1, &self.T_2);
        if y.scalar != self.y || z.scalar != self.z || x.scalar != self.x {
            return Err(ProofError::VerificationError);
        }

        let decompress = |p: &CompressedRistretto| p.decompress().ok_or(ProofError::VerificationError);
        let V = decompress(&self.V)?;
        let A = decompress(&self.A)?;
        let S = decompress(&self.S)?;
        let T_1 = decompress(&self.T_1)?;
        let T_2 = decompress(&self.T_2)?;
        let K = decompress(&self.K)?;
        let V_vec = value_commitments
            .iter()
            .map(|V_j| decompress(V_j))
            .collect::<Result<Vec<_>, _>>()?;

        // The aggregated commitment is the signed sum of the parties'
        let signed_sum = roles
            .iter()
            .zip(V_vec.iter())
            .fold(RistrettoPoint::identity(), |acc, (role, V_j)| {
                acc + role.apply(*V_j)
            });
        if signed_sum != V {
            return Err(ProofError::VerificationError);
        }

        let c = coordinator::commit_bit_round(
            transcript,
            value_commitments,
            &self.V,
            &self.A,
            &self.S,
            &self.K,
            &self.y,
            &self.z,
        );
        let e = coordinator::commit_poly_round(transcript, &self.T_1, &self.T_2, &self.x);
        let w = coordinator::commit_openings(
            transcript,
            &self.t_x,
            &self.t_x_blinding,
            &self.e_blinding,
            &self.excess,
        );
        let Q = w * pc_gens.B;

        let (x, y, z) = (self.x, self.y, self.z);
        let zz = z * z;
        // z^2 c^(j+1)
        let weights: Vec<Scalar> = util::exp_iter(c).skip(1).take(m).map(|c_j| zz * c_j).collect();

        // t(x) B + t_x_blinding B_blinding == sum_j w_j V_j + delta B + x T_1 + x^2 T_2
        let t_check = RistrettoPoint::vartime_multiscalar_mul(
            weights
                .iter()
                .cloned()
                .chain(iter::once(x))
                .chain(iter::once(x * x))
                .chain(iter::once(delta(n, m, &y, &z, &c) - self.t_x))
                .chain(iter::once(-self.t_x_blinding)),
            V_vec
                .iter()
                .chain(iter::once(&T_1))
                .chain(iter::once(&T_2))
                .chain(iter::once(&pc_gens.B))
                .chain(iter::once(&pc_gens.B_blinding)),
        );
        if t_check != RistrettoPoint::identity() {
            return Err(ProofError::VerificationError);
        }

        // s B_blinding == K + e V, which needs the signed amounts to cancel
        let excess_check = RistrettoPoint::vartime_multiscalar_mul(
            &[Scalar::one(), e, -self.excess],
            &[K, V, pc_gens.B_blinding],
        );
        if excess_check != RistrettoPoint::identity() {
            return Err(ProofError::VerificationError);
        }

        let gens = bp_gens.interleaved(n, m);
        let H_factors = gens.h_factors(y.invert());

        let exp_2: Vec<Scalar> = util::exp_iter(Scalar::from(2u64)).take(n).collect();
        let h = util::interleave(n, m, |i, j| {
            z + weights[j] * exp_2[i] * H_factors[util::interleaved_index(i, j, m)]
        });

        let P = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(Scalar::one())
                .chain(iter::once(x))
                .chain(iter::once(-self.e_blinding))
                .chain(iter::once(self.t_x))
                .chain(iter::repeat(-z).take(nm))
                .chain(h),
            iter::once(&A)
                .chain(iter::once(&S))
                .chain(iter::once(&pc_gens.B_blinding))
                .chain(iter::once(&Q))
                .chain(gens.G_vec[..nm].iter())
                .chain(gens.H_vec[..nm].iter()),
        );

        self.ipp_proof.verify(
            gens.len(),
            transcript,
            H_factors.iter(),
            &P,
            &Q,
            &gens.G_vec,
            &gens.H_vec,
        )
    }

    /// Like [`AggregateProof::verify`], reporting only whether the
    /// proof holds.
    pub fn is_valid(
        &self,
        bp_gens: &BulletproofGens,
        pc_gens: &PedersenGens,
        transcript: &mut Transcript,
        value_commitments: &[CompressedRistretto],
        roles: &[Role],
        n: usize,
    ) -> bool {
        self.verify(bp_gens, pc_gens, transcript, value_commitments, roles, n)
            .is_ok()
    }

    /// The signed sum of the parties' value commitments.
    pub fn commitment(&self) -> CompressedRistretto {
        self.V
    }

    /// The bitsize of the proven ranges.
    pub fn bitsize(&self) -> usize {
        self.n as usize
    }

    /// Number of group elements in the proof: the six aggregated
    /// commitments and the \\(2 \lceil \lg(nm) \rceil\\) points of the
    /// inner-product proof.
    pub fn group_element_count(&self) -> usize {
        POINT_COUNT + 2 * self.ipp_proof.L_vec.len()
    }

    /// Returns the size in bytes required to serialize the proof.
    pub fn serialized_size(&self) -> usize {
        1 + (POINT_COUNT + SCALAR_COUNT) * 32 + self.ipp_proof.serialized_size()
    }

    /// Serializes the proof into a byte array.
    ///
    /// The layout is:
    /// * the bitsize \\(n\\) as one byte,
    /// * six compressed points \\(V, A, S, T\_1, T\_2, K\\),
    /// * seven scalars \\(y, z, x\\), \\(\tilde{t}(x)\\), \\(t(x)\\),
    ///   \\(\tilde{e}\\) and the balance response,
    /// * the inner-product proof.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.push(self.n);
        buf.extend_from_slice(self.V.as_bytes());
        buf.extend_from_slice(self.A.as_bytes());
        buf.extend_from_slice(self.S.as_bytes());
        buf.extend_from_slice(self.T_1.as_bytes());
        buf.extend_from_slice(self.T_2.as_bytes());
        buf.extend_from_slice(self.K.as_bytes());
        buf.extend_from_slice(self.y.as_bytes());
        buf.extend_from_slice(self.z.as_bytes());
        buf.extend_from_slice(self.x.as_bytes());
        buf.extend_from_slice(self.t_x_blinding.as_bytes());
        buf.extend_from_slice(self.t_x.as_bytes());
        buf.extend_from_slice(self.e_blinding.as_bytes());
        buf.extend_from_slice(self.excess.as_bytes());
        buf.extend(self.ipp_proof.to_bytes());
        buf
    }

    /// Deserializes the proof from a byte slice.
    ///
    /// Returns an error if the byte slice cannot be parsed into an
    /// `AggregateProof`.
    pub fn from_bytes(slice: &[u8]) -> Result<AggregateProof, ProofError> {
        let fixed_len = 1 + (POINT_COUNT + SCALAR_COUNT) * 32;
        if slice.len() < fixed_len {
            return Err(ProofError::FormatError);
        }
        if (slice.len() - 1) % 32 != 0 {
            return Err(ProofError::FormatError);
        }

        let n = slice[0];
        if n == 0 || n > 64 {
            return Err(ProofError::FormatError);
        }

        use util::read32;

        let body = &slice[1..];
        let read_point = |i: usize| CompressedRistretto(read32(&body[i * 32..]));
        let read_scalar = |i: usize| {
            let pos = (POINT_COUNT + i) * 32;
            Scalar::from_canonical_bytes(read32(&body[pos..])).ok_or(ProofError::FormatError)
        };

        let ipp_proof = InnerProductProof::from_bytes(&slice[fixed_len..])?;

        Ok(AggregateProof {
            n,
            V: read_point(0),
            A: read_point(1),
            S: read_point(2),
            T_1: read_point(3),
            T_2: read_point(4),
            K: read_point(5),
            y: read_scalar(0)?,
            z: read_scalar(1)?,
            x: read_scalar(2)?,
            t_x_blinding: read_scalar(3)?,
            t_x: read_scalar(4)?,
            e_blinding: read_scalar(5)?,
            excess: read_scalar(6)?,
            ipp_proof,
        })
    }
}

impl Serialize for AggregateProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes()[..])
    }
}

impl<'de> Deserialize<'de> for AggregateProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AggregateProofVisitor;

        impl<'de> Visitor<'de> for AggregateProofVisitor {
            type Value = AggregateProof;

            fn expecting(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                formatter.write_str("a valid AggregateProof")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<AggregateProof, E>
            where
                E: serde::de::Error,
            {
                AggregateProof::from_bytes(v).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(AggregateProofVisitor)
    }
}

/// The weight \\(z^2 c^{j+1}\\) of party `j`'s value in the aggregated
/// range statement.
pub(crate) fn party_weight(z: &Scalar, c: &Scalar, j: usize) -> Scalar {
    z * z * util::scalar_exp_vartime(c, j as u64 + 1)
}

/// Compute
/// \\[
/// \delta(y,z,c) = (z - z^{2}) \langle \mathbf{1}, {\mathbf{y}}^{nm} \rangle - z^{3} \langle \mathbf{1}, {\mathbf{2}}^{n} \rangle \sum\_{j=0}^{m-1} c^{j+1}
/// \\]
/// for `m` parties proving `n`-bit ranges.
pub(crate) fn delta(n: usize, m: usize, y: &Scalar, z: &Scalar, c: &Scalar) -> Scalar {
    let sum_y = util::sum_of_powers(y, n * m);
    let sum_2 = util::sum_of_powers(&Scalar::from(2u64), n);
    let sum_c = c * util::sum_of_powers(c, m);

    (z - z * z) * sum_y - z * z * z * sum_2 * sum_c
}

/// The share of \\(\delta(y,z,c)\\) of party `j`, whose bit `i` sits at
/// flat position \\(im + j\\).
pub(crate) fn party_delta(n: usize, m: usize, j: usize, y: &Scalar, z: &Scalar, c: &Scalar) -> Scalar {
    let offset_y = util::scalar_exp_vartime(y, j as u64);
    let sum_y = offset_y * util::sum_of_powers(&util::scalar_exp_vartime(y, m as u64), n);
    let sum_2 = util::sum_of_powers(&Scalar::from(2u64), n);

    (z - z * z) * sum_y - z * party_weight(z, c, j) * sum_2
}

#[cfg(test)]
mod tests {
    use super::*;

    use bincode;
    use errors::MPCError;
    use balance_proof::messages::ProofShare;

    #[test]
    fn test_delta() {
        let mut rng = thread_rng();
        let y = Scalar::random(&mut rng);
        let z = Scalar::random(&mut rng);
        let c = Scalar::random(&mut rng);

        // 3 parties of 100 bits, to overflow the group order during
        // the computation
        let (n, m) = (100, 3);

        // direct computation, term by term
        let z2 = z * z;
        let z3 = z2 * z;
        let mut power_g = Scalar::zero();
        let mut exp_y = Scalar::one(); // start at y^0 = 1
        for k in 0..n * m {
            let (i, j) = (k / m, k % m);
            let exp_2 = util::scalar_exp_vartime(&Scalar::from(2u64), i as u64);
            let exp_c = util::scalar_exp_vartime(&c, j as u64 + 1);
            power_g += (z - z2) * exp_y - z3 * exp_c * exp_2;

            exp_y = exp_y * y; // y^k -> y^(k+1)
        }

        assert_eq!(power_g, delta(n, m, &y, &z, &c));

        let shares = (0..m).fold(Scalar::zero(), |acc, j| acc + party_delta(n, m, j, &y, &z, &c));
        assert_eq!(shares, delta(n, m, &y, &z, &c));
    }

    /// Given a bitsize `n`, amounts and roles, prove and verify the
    /// proof, including a round trip through `bincode`.
    fn balance_create_and_verify_helper(n: usize, values: &[u64], roles: &[Role]) -> bool {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(n, values.len());

        let (proof_bytes, value_commitments) = {
            let mut rng = thread_rng();
            let blindings: Vec<Scalar> = values.iter().map(|_| Scalar::random(&mut rng)).collect();

            let mut transcript = Transcript::new(b"AggregatedBalanceProofTest");
            let (proof, value_commitments) = AggregateProof::prove(
                &bp_gens,
                &pc_gens,
                &mut transcript,
                values,
                &blindings,
                roles,
                n,
            )
            .unwrap();

            (bincode::serialize(&proof).unwrap(), value_commitments)
        };

        let proof: AggregateProof = bincode::deserialize(&proof_bytes).unwrap();

        let mut transcript = Transcript::new(b"AggregatedBalanceProofTest");
        proof
            .verify(&bp_gens, &pc_gens, &mut transcript, &value_commitments, roles, n)
            .is_ok()
    }

    #[test]
    fn create_and_verify_single_zero() {
        assert!(balance_create_and_verify_helper(8, &[0], &[Role::Source]));
    }

    #[test]
    fn create_and_verify_pair() {
        assert!(balance_create_and_verify_helper(
            16,
            &[4242, 4242],
            &[Role::Source, Role::Destination]
        ));
    }

    #[test]
    fn create_and_verify_three_parties() {
        // 3 * 8 positions, padded to 32
        assert!(balance_create_and_verify_helper(
            8,
            &[200, 150, 50],
            &[Role::Source, Role::Destination, Role::Destination]
        ));
    }

    #[test]
    fn create_and_verify_64_bit() {
        assert!(balance_create_and_verify_helper(
            64,
            &[u64::max_value(), u64::max_value()],
            &[Role::Destination, Role::Source]
        ));
    }

    #[test]
    fn imbalance_fails() {
        assert!(!balance_create_and_verify_helper(
            8,
            &[10, 9],
            &[Role::Source, Role::Destination]
        ));
        assert!(!balance_create_and_verify_helper(8, &[1], &[Role::Source]));
    }

    fn prove_pair(bp_gens: &BulletproofGens, pc_gens: &PedersenGens) -> (AggregateProof, Vec<CompressedRistretto>) {
        let mut transcript = Transcript::new(b"statement");
        AggregateProof::prove(
            bp_gens,
            pc_gens,
            &mut transcript,
            &[7, 7],
            &[Scalar::from(3u64), Scalar::from(4u64)],
            &[Role::Source, Role::Destination],
            8,
        )
        .unwrap()
    }

    #[test]
    fn verify_rejects_wrong_statement() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);
        let (proof, commitments) = prove_pair(&bp_gens, &pc_gens);
        let roles = [Role::Source, Role::Destination];

        let verify = |commitments: &[CompressedRistretto], roles: &[Role]| {
            let mut transcript = Transcript::new(b"statement");
            proof.verify(&bp_gens, &pc_gens, &mut transcript, commitments, roles, 8)
        };

        assert!(verify(&commitments, &roles).is_ok());
        assert_eq!(
            verify(&commitments, &[Role::Source, Role::Source]),
            Err(ProofError::VerificationError)
        );
        assert_eq!(
            verify(&[commitments[1], commitments[0]], &roles),
            Err(ProofError::VerificationError)
        );
        let other = pc_gens.commit(Scalar::from(7u64), Scalar::from(5u64)).compress();
        assert_eq!(
            verify(&[commitments[0], other], &roles),
            Err(ProofError::VerificationError)
        );
        assert_eq!(
            verify(&commitments[..1], &roles),
            Err(ProofError::InvalidAggregation)
        );
        assert_eq!(verify(&[], &[]), Err(ProofError::InvalidAggregation));
    }

    #[test]
    fn verify_checks_generator_capacity() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);
        let (proof, commitments) = prove_pair(&bp_gens, &pc_gens);

        let mut transcript = Transcript::new(b"statement");
        assert_eq!(
            proof.verify(
                &bp_gens,
                &pc_gens,
                &mut transcript,
                &commitments,
                &[Role::Source, Role::Destination],
                16
            ),
            Err(ProofError::InvalidGeneratorsLength)
        );

        // more parties than the generators were built for
        let many = vec![commitments[0]; 3];
        let many_roles = vec![Role::Source; 3];
        let mut transcript = Transcript::new(b"statement");
        assert_eq!(
            proof.verify(&bp_gens, &pc_gens, &mut transcript, &many, &many_roles, 8),
            Err(ProofError::InvalidGeneratorsLength)
        );
    }

    #[test]
    fn prove_rejects_mismatched_inputs() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);
        let mut transcript = Transcript::new(b"mismatch");

        let result = AggregateProof::prove(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            &[1, 2],
            &[Scalar::one()],
            &[Role::Source, Role::Destination],
            8,
        );
        assert_eq!(result.err(), Some(ProofError::WrongNumBlindingFactors));

        let mut transcript = Transcript::new(b"mismatch");
        let result = AggregateProof::prove(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            &[300],
            &[Scalar::one()],
            &[Role::Source],
            8,
        );
        assert_eq!(result.err(), Some(ProofError::ValueOutOfRange));

        let mut transcript = Transcript::new(b"mismatch");
        let result = AggregateProof::prove(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            &[1, 1, 0],
            &[Scalar::one(), Scalar::one(), Scalar::one()],
            &[Role::Source, Role::Destination, Role::Source],
            8,
        );
        assert_eq!(result.err(), Some(ProofError::InvalidGeneratorsLength));
    }

    /// Runs the protocol by hand up to the proof shares.
    fn run_to_shares<'a, 'b>(
        bp_gens: &'b BulletproofGens,
        pc_gens: &'b PedersenGens,
        transcript: &'a mut Transcript,
        values: &[u64],
        roles: &[Role],
        n: usize,
    ) -> (
        coordinator::CoordinatorAwaitingProofShares<'a, 'b>,
        Vec<ProofShare>,
        Vec<CompressedRistretto>,
    ) {
        let mut rng = thread_rng();
        let m = values.len();
        let coordinator =
            Coordinator::new(bp_gens, pc_gens, transcript, n, roles.to_vec()).unwrap();

        let (parties, bit_commitments): (Vec<_>, Vec<_>) = values
            .iter()
            .enumerate()
            .map(|(j, &v)| {
                Party::new(bp_gens, pc_gens, v, Scalar::random(&mut rng), n)
                    .unwrap()
                    .assign_position_with_rng(j, m, &mut rng)
                    .unwrap()
            })
            .unzip();
        let commitments = bit_commitments.iter().map(|bc| bc.V_j.compress()).collect();
        let (coordinator, bit_challenge) =
            coordinator.receive_bit_commitments(bit_commitments).unwrap();

        let (parties, poly_commitments): (Vec<_>, Vec<_>) = parties
            .into_iter()
            .map(|p| p.apply_challenge(&bit_challenge))
            .unzip();
        let (coordinator, poly_challenge) = coordinator
            .receive_poly_commitments(poly_commitments)
            .unwrap();

        let shares = parties
            .into_iter()
            .map(|p| p.apply_challenge(&poly_challenge).unwrap())
            .collect();

        (coordinator, shares, commitments)
    }

    #[test]
    fn consistency_check_holds_for_honest_parties() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 3);
        let roles = [Role::Source, Role::Destination, Role::Destination];
        let mut transcript = Transcript::new(b"consistency");

        let (coordinator, shares, commitments) =
            run_to_shares(&bp_gens, &pc_gens, &mut transcript, &[9, 4, 5], &roles, 8);
        let (proof, check) = coordinator.receive_shares(&shares).unwrap();
        assert!(check.holds());
        assert_eq!(check.t_x, proof.t_x);

        let mut transcript = Transcript::new(b"consistency");
        assert!(proof.is_valid(&bp_gens, &pc_gens, &mut transcript, &commitments, &roles, 8));
    }

    #[test]
    fn inconsistent_share_is_reported_and_rejected() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 3);
        let roles = [Role::Source, Role::Destination, Role::Destination];
        let mut transcript = Transcript::new(b"consistency");

        let (coordinator, mut shares, commitments) =
            run_to_shares(&bp_gens, &pc_gens, &mut transcript, &[9, 4, 5], &roles, 8);
        shares[1].t_x += Scalar::one();

        let (proof, check) = coordinator.receive_trusted_shares(&shares).unwrap();
        assert!(!check.holds());
        assert_eq!(check.t_x - check.lr, Scalar::one());

        let mut transcript = Transcript::new(b"consistency");
        assert_eq!(
            proof.verify(&bp_gens, &pc_gens, &mut transcript, &commitments, &roles, 8),
            Err(ProofError::VerificationError)
        );
    }

    #[test]
    fn detect_malformed_share_lengths() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);
        let roles = [Role::Source, Role::Destination];
        let mut transcript = Transcript::new(b"malformed");

        let (coordinator, mut shares, _) =
            run_to_shares(&bp_gens, &pc_gens, &mut transcript, &[3, 3], &roles, 8);
        shares[1].r_vec.pop();

        assert_eq!(
            coordinator.receive_trusted_shares(&shares).err(),
            Some(MPCError::MalformedProofShares {
                bad_shares: vec![1]
            })
        );
    }

    #[test]
    fn detect_tampered_share() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 3);
        let roles = [Role::Destination, Role::Source, Role::Destination];
        let mut transcript = Transcript::new(b"tampered");

        let (coordinator, mut shares, _) =
            run_to_shares(&bp_gens, &pc_gens, &mut transcript, &[1, 3, 2], &roles, 8);
        shares[2].t_x_blinding += Scalar::one();

        assert_eq!(
            coordinator.receive_shares(&shares).err(),
            Some(MPCError::MalformedProofShares {
                bad_shares: vec![2]
            })
        );
    }

    #[test]
    fn wrong_number_of_messages() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);
        let mut transcript = Transcript::new(b"counts");

        let coordinator = Coordinator::new(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            8,
            vec![Role::Source, Role::Destination],
        )
        .unwrap();
        let (_, bit_commitment) = Party::new(&bp_gens, &pc_gens, 5, Scalar::one(), 8)
            .unwrap()
            .assign_position(0, 2)
            .unwrap();

        assert_eq!(
            coordinator
                .receive_bit_commitments(vec![bit_commitment])
                .err(),
            Some(MPCError::WrongNumBitCommitments)
        );
    }

    #[test]
    fn coordinator_rejects_bad_aggregation() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);

        let mut transcript = Transcript::new(b"empty");
        assert_eq!(
            Coordinator::new(&bp_gens, &pc_gens, &mut transcript, 8, vec![]).err(),
            Some(MPCError::InvalidAggregation)
        );

        let mut transcript = Transcript::new(b"too many");
        assert_eq!(
            Coordinator::new(&bp_gens, &pc_gens, &mut transcript, 8, vec![Role::Source; 3]).err(),
            Some(MPCError::InvalidGeneratorsLength)
        );
    }

    #[test]
    fn serialization_layout() {
        let pc_gens = PedersenGens::default();
        let bp_gens = BulletproofGens::new(8, 2);
        let mut transcript = Transcript::new(b"layout");

        let (proof, _) = AggregateProof::prove(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            &[12, 12],
            &[Scalar::from(1u64), Scalar::from(2u64)],
            &[Role::Source, Role::Destination],
            8,
        )
        .unwrap();

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), proof.serialized_size());
        assert_eq!(bytes.len(), 1 + 13 * 32 + (2 * 4 + 2) * 32);
        assert_eq!(bytes[0], 8);
        assert_eq!(&bytes[1..33], proof.commitment().as_bytes());
        // 2 parties * 8 bits = 16 positions, 4 folding rounds
        assert_eq!(proof.group_element_count(), 6 + 2 * 4);

        let decoded = AggregateProof::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.to_bytes(), bytes);

        assert_eq!(
            AggregateProof::from_bytes(&bytes[..bytes.len() - 1]).err(),
            Some(ProofError::FormatError)
        );
        let mut bad_n = bytes.clone();
        bad_n[0] = 65;
        assert_eq!(
            AggregateProof::from_bytes(&bad_n).err(),
            Some(ProofError::FormatError)
        );
    }
}

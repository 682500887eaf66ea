//! The `coordinator` module contains the API for the coordinator state
//! while the coordinator is engaging in an aggregated balance proof.
//!
//! The coordinator sees only public messages. It combines them by role,
//! derives the round challenges, and folds the parties' final vectors
//! into a single inner-product proof.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use merlin::Transcript;

use errors::MPCError;
use generators::{BulletproofGens, PedersenGens};
use inner_product_proof::InnerProductProof;
use transcript::TranscriptProtocol;
use util;

use super::challenges::{self, Challenge};
use super::messages::*;
use super::AggregateProof;

/// Result of comparing the sum of the parties' own inner products
/// against the aggregated \\(t(x)\\).
///
/// A mismatch means a party or the aggregation is broken, and the
/// proof will not verify. It is reported separately from the proof
/// itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConsistencyCheck {
    /// The aggregated \\(t(x)\\) carried in the proof.
    pub t_x: Scalar,
    /// \\(\sum\_j \langle \mathbf{l}\_j, \mathbf{r}\_j \rangle\\).
    pub lr: Scalar,
}

impl ConsistencyCheck {
    /// Whether both sides agree.
    pub fn holds(&self) -> bool {
        self.t_x == self.lr
    }
}

/// Used to construct a coordinator for the aggregated balance proof.
pub struct Coordinator {}

impl Coordinator {
    /// Creates a new coordinator for parties with the given `roles`,
    /// proving `n`-bit ranges. Party `j` has role `roles[j]`.
    pub fn new<'a, 'b>(
        bp_gens: &'b BulletproofGens,
        pc_gens: &'b PedersenGens,
        transcript: &'a mut Transcript,
        n: usize,
        roles: Vec<Role>,
    ) -> Result<CoordinatorAwaitingBitCommitments<'a, 'b>, MPCError> {
        if n == 0 || n > 64 {
            return Err(MPCError::InvalidBitsize);
        }
        if roles.is_empty() {
            return Err(MPCError::InvalidAggregation);
        }
        if bp_gens.gens_capacity < n || bp_gens.party_capacity < roles.len() {
            return Err(MPCError::InvalidGeneratorsLength);
        }

        transcript.balanceproof_domain_sep(n as u64, roles.len() as u64);

        Ok(CoordinatorAwaitingBitCommitments {
            bp_gens,
            pc_gens,
            transcript,
            n,
            roles,
        })
    }
}

/// A coordinator waiting for the parties to send their [`BitCommitment`]s.
pub struct CoordinatorAwaitingBitCommitments<'a, 'b> {
    bp_gens: &'b BulletproofGens,
    pc_gens: &'b PedersenGens,
    transcript: &'a mut Transcript,
    n: usize,
    roles: Vec<Role>,
}

impl<'a, 'b> CoordinatorAwaitingBitCommitments<'a, 'b> {
    /// Receive each party's [`BitCommitment`]s and compute the [`BitChallenge`].
    pub fn receive_bit_commitments(
        self,
        bit_commitments: Vec<BitCommitment>,
    ) -> Result<(CoordinatorAwaitingPolyCommitments<'a, 'b>, BitChallenge), MPCError> {
        if self.roles.len() != bit_commitments.len() {
            return Err(MPCError::WrongNumBitCommitments);
        }

        let value_commitments: Vec<CompressedRistretto> =
            bit_commitments.iter().map(|bc| bc.V_j.compress()).collect();

        let mut V = RistrettoPoint::identity();
        let mut A = RistrettoPoint::identity();
        let mut S = RistrettoPoint::identity();
        let mut K = RistrettoPoint::identity();
        for (role, bc) in self.roles.iter().zip(bit_commitments.iter()) {
            V += role.apply(bc.V_j);
            A += bc.A_j;
            S += bc.S_j;
            K += role.apply(bc.K_j);
        }
        let (V, A, S, K) = (V.compress(), A.compress(), S.compress(), K.compress());

        let (y, z) = challenges::bit_challenges(&V, self.n as u8, &A, &S);
        let c = commit_bit_round(
            self.transcript,
            &value_commitments,
            &V,
            &A,
            &S,
            &K,
            &y.scalar,
            &z.scalar,
        );
        let bit_challenge = BitChallenge {
            y: y.scalar,
            z: z.scalar,
            c,
        };
        debug!(
            "received {} bit commitments, challenges y, z and c derived",
            bit_commitments.len()
        );

        Ok((
            CoordinatorAwaitingPolyCommitments {
                bp_gens: self.bp_gens,
                pc_gens: self.pc_gens,
                transcript: self.transcript,
                n: self.n,
                roles: self.roles,
                bit_challenge,
                bit_commitments,
                z_challenge: z,
                V,
                A,
                S,
                K,
            },
            bit_challenge,
        ))
    }
}

/// A coordinator which has sent the [`BitChallenge`] to the parties and
/// is waiting for their [`PolyCommitment`]s.
pub struct CoordinatorAwaitingPolyCommitments<'a, 'b> {
    bp_gens: &'b BulletproofGens,
    pc_gens: &'b PedersenGens,
    transcript: &'a mut Transcript,
    n: usize,
    roles: Vec<Role>,
    bit_challenge: BitChallenge,
    bit_commitments: Vec<BitCommitment>,
    z_challenge: Challenge,
    /// Signed sum of the value commitments
    V: CompressedRistretto,
    /// Sum of the commitments to the parties' bits
    A: CompressedRistretto,
    /// Sum of the commitments to the parties' bit blindings
    S: CompressedRistretto,
    /// Signed sum of the balance signature nonces
    K: CompressedRistretto,
}

impl<'a, 'b> CoordinatorAwaitingPolyCommitments<'a, 'b> {
    /// Receive [`PolyCommitment`]s from the parties and compute the
    /// [`PolyChallenge`].
    pub fn receive_poly_commitments(
        self,
        poly_commitments: Vec<PolyCommitment>,
    ) -> Result<(CoordinatorAwaitingProofShares<'a, 'b>, PolyChallenge), MPCError> {
        if self.roles.len() != poly_commitments.len() {
            return Err(MPCError::WrongNumPolyCommitments);
        }

        // The range statements of all parties are summed without sign
        let mut T_1 = RistrettoPoint::identity();
        let mut T_2 = RistrettoPoint::identity();
        for pc in poly_commitments.iter() {
            T_1 += pc.T_1_j;
            T_2 += pc.T_2_j;
        }
        let (T_1, T_2) = (T_1.compress(), T_2.compress());

        let x = challenges::poly_challenge(&self.z_challenge, &T_1, &T_2);
        let e = commit_poly_round(self.transcript, &T_1, &T_2, &x.scalar);

        let poly_challenge = PolyChallenge { x: x.scalar, e };
        debug!(
            "received {} poly commitments, challenges x and e derived",
            poly_commitments.len()
        );

        Ok((
            CoordinatorAwaitingProofShares {
                bp_gens: self.bp_gens,
                pc_gens: self.pc_gens,
                transcript: self.transcript,
                n: self.n,
                roles: self.roles,
                bit_challenge: self.bit_challenge,
                bit_commitments: self.bit_commitments,
                poly_challenge,
                poly_commitments,
                V: self.V,
                A: self.A,
                S: self.S,
                T_1,
                T_2,
                K: self.K,
            },
            poly_challenge,
        ))
    }
}

/// Commits the first round to the `transcript` and returns the
/// challenge \\(c\\) separating the parties' range statements.
///
/// Every party's own value commitment is bound here, before \\(c\\).
pub(super) fn commit_bit_round(
    transcript: &mut Transcript,
    value_commitments: &[CompressedRistretto],
    V: &CompressedRistretto,
    A: &CompressedRistretto,
    S: &CompressedRistretto,
    K: &CompressedRistretto,
    y: &Scalar,
    z: &Scalar,
) -> Scalar {
    for V_j in value_commitments {
        transcript.commit_point(b"V_j", V_j);
    }
    transcript.commit_point(b"V", V);
    transcript.commit_point(b"A", A);
    transcript.commit_point(b"S", S);
    transcript.commit_point(b"K", K);
    transcript.commit_scalar(b"y", y);
    transcript.commit_scalar(b"z", z);

    transcript.challenge_scalar(b"c")
}

/// Commits the second round to the `transcript` and returns the balance
/// signature challenge \\(e\\).
pub(super) fn commit_poly_round(
    transcript: &mut Transcript,
    T_1: &CompressedRistretto,
    T_2: &CompressedRistretto,
    x: &Scalar,
) -> Scalar {
    transcript.commit_point(b"T_1", T_1);
    transcript.commit_point(b"T_2", T_2);
    transcript.commit_scalar(b"x", x);

    transcript.challenge_scalar(b"e")
}

/// Commits the aggregated openings to the `transcript` and returns the
/// challenge \\(w\\) binding \\(t(x)\\) into the IPP statement.
pub(super) fn commit_openings(
    transcript: &mut Transcript,
    t_x: &Scalar,
    t_x_blinding: &Scalar,
    e_blinding: &Scalar,
    excess: &Scalar,
) -> Scalar {
    transcript.commit_scalar(b"t_x", t_x);
    transcript.commit_scalar(b"t_x_blinding", t_x_blinding);
    transcript.commit_scalar(b"e_blinding", e_blinding);
    transcript.commit_scalar(b"s", excess);

    transcript.challenge_scalar(b"w")
}

/// A coordinator which has sent the [`PolyChallenge`] to the parties and
/// is waiting to aggregate their [`ProofShare`]s into an
/// [`AggregateProof`].
pub struct CoordinatorAwaitingProofShares<'a, 'b> {
    bp_gens: &'b BulletproofGens,
    pc_gens: &'b PedersenGens,
    transcript: &'a mut Transcript,
    n: usize,
    roles: Vec<Role>,
    bit_challenge: BitChallenge,
    bit_commitments: Vec<BitCommitment>,
    poly_challenge: PolyChallenge,
    poly_commitments: Vec<PolyCommitment>,
    V: CompressedRistretto,
    A: CompressedRistretto,
    S: CompressedRistretto,
    T_1: CompressedRistretto,
    T_2: CompressedRistretto,
    K: CompressedRistretto,
}

impl<'a, 'b> CoordinatorAwaitingProofShares<'a, 'b> {
    /// Assembles proof shares into an `AggregateProof`.
    ///
    /// Used as a helper function by `receive_trusted_shares` (which
    /// just hands back the result) and `receive_shares` (which
    /// validates the proof shares first).
    fn assemble_shares(
        &mut self,
        proof_shares: &[ProofShare],
    ) -> Result<(AggregateProof, ConsistencyCheck), MPCError> {
        let m = self.roles.len();
        if m != proof_shares.len() {
            return Err(MPCError::WrongNumProofShares);
        }

        // Validate lengths for each share
        let mut bad_shares = Vec::<usize>::new(); // no allocations until we append
        for (j, share) in proof_shares.iter().enumerate() {
            share.check_size(self.n).unwrap_or_else(|_| {
                bad_shares.push(j);
            });
        }

        if bad_shares.len() > 0 {
            return Err(MPCError::MalformedProofShares { bad_shares });
        }

        let mut t_x = Scalar::zero();
        let mut t_x_blinding = Scalar::zero();
        let mut e_blinding = Scalar::zero();
        let mut excess = Scalar::zero();
        let mut lr = Scalar::zero();
        for (role, ps) in self.roles.iter().zip(proof_shares.iter()) {
            t_x += ps.t_x;
            t_x_blinding += ps.t_x_blinding;
            e_blinding += ps.e_blinding;
            excess += role.apply(ps.excess);
            lr += util::inner_product(&ps.l_vec, &ps.r_vec);
        }

        let check = ConsistencyCheck { t_x, lr };
        if !check.holds() {
            warn!("sum of party inner products does not match the aggregated t(x)");
        }

        let w = commit_openings(
            self.transcript,
            &t_x,
            &t_x_blinding,
            &e_blinding,
            &excess,
        );
        let Q = w * self.pc_gens.B;

        let gens = self.bp_gens.interleaved(self.n, m);
        let H_factors = gens.h_factors(self.bit_challenge.y.invert());

        let mut l_vec = util::interleave(self.n, m, |i, j| proof_shares[j].l_vec[i]);
        let mut r_vec = util::interleave(self.n, m, |i, j| proof_shares[j].r_vec[i]);
        l_vec.resize(gens.len(), Scalar::zero());
        r_vec.resize(gens.len(), Scalar::zero());

        let ipp_proof = InnerProductProof::create(
            self.transcript,
            &Q,
            &H_factors,
            gens.G_vec,
            gens.H_vec,
            l_vec,
            r_vec,
        );
        debug!(
            "folded {} proof shares into an inner product proof of {} rounds",
            m,
            ipp_proof.L_vec.len()
        );

        let proof = AggregateProof {
            n: self.n as u8,
            V: self.V,
            A: self.A,
            S: self.S,
            T_1: self.T_1,
            T_2: self.T_2,
            K: self.K,
            y: self.bit_challenge.y,
            z: self.bit_challenge.z,
            x: self.poly_challenge.x,
            t_x_blinding,
            t_x,
            e_blinding,
            excess,
            ipp_proof,
        };

        Ok((proof, check))
    }

    /// Assemble the final aggregated [`AggregateProof`] from the given
    /// `proof_shares`, checking each share against the commitments its
    /// party sent.
    ///
    /// If any share fails, returns
    /// [`MPCError::MalformedProofShares`] listing the offending parties.
    pub fn receive_shares(
        mut self,
        proof_shares: &[ProofShare],
    ) -> Result<(AggregateProof, ConsistencyCheck), MPCError> {
        if self.roles.len() != proof_shares.len() {
            return Err(MPCError::WrongNumProofShares);
        }

        let m = self.roles.len();
        let mut bad_shares = Vec::new();
        for (j, share) in proof_shares.iter().enumerate() {
            match share.audit_share(
                self.bp_gens,
                self.pc_gens,
                self.n,
                j,
                m,
                &self.bit_commitments[j],
                &self.bit_challenge,
                &self.poly_commitments[j],
                &self.poly_challenge,
            ) {
                Ok(_) => {}
                Err(_) => bad_shares.push(j),
            }
        }

        if bad_shares.len() > 0 {
            warn!("proof shares from parties {:?} failed the audit", bad_shares);
            return Err(MPCError::MalformedProofShares { bad_shares });
        }

        self.assemble_shares(proof_shares)
    }

    /// Assemble the final aggregated [`AggregateProof`] from the given
    /// `proof_shares`, but skip validation of the proof.
    ///
    /// ## WARNING
    ///
    /// This function does **NOT** validate the proof shares beyond
    /// their lengths.  It is suitable for creating aggregated proofs
    /// when all parties are known by the coordinator to be honest (for
    /// instance, when one process plays all roles).
    ///
    /// Otherwise, use
    /// [`receive_shares`](CoordinatorAwaitingProofShares::receive_shares).
    pub fn receive_trusted_shares(
        mut self,
        proof_shares: &[ProofShare],
    ) -> Result<(AggregateProof, ConsistencyCheck), MPCError> {
        self.assemble_shares(proof_shares)
    }
}

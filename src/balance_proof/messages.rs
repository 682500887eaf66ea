//! The `messages` module contains the API for the messages passed
//! between the parties and the coordinator of an aggregated balance
//! proof.
//!
//! For more explanation of how the `coordinator`, `party`, and
//! `messages` modules orchestrate the protocol execution, see the
//! documentation in the [`balance_proof`](::balance_proof) module.

use std::iter;
use std::ops::Neg;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::{Identity, VartimeMultiscalarMul};

use generators::{BulletproofGens, PedersenGens};
use util;

/// Which side of the balance a party's amount is on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    /// An input amount, counted positively.
    Source,
    /// An output amount, counted negatively.
    Destination,
}

impl Role {
    /// Weights `value` by the role's sign: unchanged for a source,
    /// negated for a destination.
    ///
    /// Every signed aggregate goes through this one routine.
    pub fn apply<T: Neg<Output = T>>(self, value: T) -> T {
        match self {
            Role::Source => value,
            Role::Destination => -value,
        }
    }
}

/// A commitment to a party's value, the bits of its value, and the
/// nonce of its share of the balance signature.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct BitCommitment {
    pub(super) V_j: RistrettoPoint,
    pub(super) A_j: RistrettoPoint,
    pub(super) S_j: RistrettoPoint,
    pub(super) K_j: RistrettoPoint,
}

/// Challenge values derived from all parties' [`BitCommitment`]s.
///
/// `c` separates the parties' range statements: party `j` weights its
/// value by \\(z^2 c^{j+1}\\).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct BitChallenge {
    pub(super) y: Scalar,
    pub(super) z: Scalar,
    pub(super) c: Scalar,
}

/// A commitment to a party's polynomial coefficents.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct PolyCommitment {
    pub(super) T_1_j: RistrettoPoint,
    pub(super) T_2_j: RistrettoPoint,
}

/// Challenge values derived from all parties' [`PolyCommitment`]s.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct PolyChallenge {
    pub(super) x: Scalar,
    pub(super) e: Scalar,
}

/// A party's proof share, ready for aggregation into the final
/// [`AggregateProof`](::AggregateProof).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofShare {
    pub(super) t_x: Scalar,
    pub(super) t_x_blinding: Scalar,
    pub(super) e_blinding: Scalar,
    pub(super) l_vec: Vec<Scalar>,
    pub(super) r_vec: Vec<Scalar>,
    pub(super) excess: Scalar,
}

impl ProofShare {
    /// Checks that the vectors of this share have the bitsize of the
    /// proof.
    pub(super) fn check_size(&self, expected_n: usize) -> Result<(), ()> {
        if self.l_vec.len() != expected_n || self.r_vec.len() != expected_n {
            return Err(());
        }
        Ok(())
    }

    /// Audit an individual proof share to determine whether it is
    /// malformed.
    ///
    /// Each share is a single-party range proof for position `j` of
    /// `m`, against that party's own generators, so it can be checked
    /// with the party's own commitments. The `excess` only verifies in
    /// aggregate, where the signed amounts cancel, so it is not checked
    /// here.
    pub(super) fn audit_share(
        &self,
        bp_gens: &BulletproofGens,
        pc_gens: &PedersenGens,
        n: usize,
        j: usize,
        m: usize,
        bit_commitment: &BitCommitment,
        bit_challenge: &BitChallenge,
        poly_commitment: &PolyCommitment,
        poly_challenge: &PolyChallenge,
    ) -> Result<(), ()> {
        self.check_size(n)?;

        let x = poly_challenge.x;
        let (y, z) = (bit_challenge.y, bit_challenge.z);
        let offset_zz = super::party_weight(&z, &bit_challenge.c, j);

        // y^{-(i m + j)} for this party's positions
        let y_inv = y.invert();
        let offset_y_inv = util::scalar_exp_vartime(&y_inv, j as u64);
        let step_y_inv = util::scalar_exp_vartime(&y_inv, m as u64);

        if util::inner_product(&self.l_vec, &self.r_vec) != self.t_x {
            return Err(());
        }

        // <l, G> + <r, H'> == A + x*S - e_blinding*B_blinding - z<1, G> + <z + w_j 2^i y^-k, H>
        let g = self.l_vec.iter().map(|l_i| -z - l_i);
        let h = util::exp_iter(step_y_inv)
            .zip(util::exp_iter(Scalar::from(2u64)))
            .zip(self.r_vec.iter())
            .take(n)
            .map(|((y_inv_i, exp_2), r_i)| {
                z + offset_y_inv * y_inv_i * (offset_zz * exp_2 - r_i)
            });

        let bp_share = bp_gens.share(j);
        let P_check = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(Scalar::one())
                .chain(iter::once(x))
                .chain(iter::once(-self.e_blinding))
                .chain(g)
                .chain(h),
            iter::once(&bit_commitment.A_j)
                .chain(iter::once(&bit_commitment.S_j))
                .chain(iter::once(&pc_gens.B_blinding))
                .chain(bp_share.G(n))
                .chain(bp_share.H(n)),
        );
        if P_check != RistrettoPoint::identity() {
            return Err(());
        }

        let delta = super::party_delta(n, m, j, &y, &z, &bit_challenge.c);
        let t_check = RistrettoPoint::vartime_multiscalar_mul(
            &[
                offset_zz,
                x,
                x * x,
                delta - self.t_x,
                -self.t_x_blinding,
            ],
            &[
                bit_commitment.V_j,
                poly_commitment.T_1_j,
                poly_commitment.T_2_j,
                pc_gens.B,
                pc_gens.B_blinding,
            ],
        );
        if t_check != RistrettoPoint::identity() {
            return Err(());
        }

        Ok(())
    }
}

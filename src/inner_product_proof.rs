#![allow(non_snake_case)]
//! Inner-product argument used to fold the interleaved \\(\mathbf{l}\\),
//! \\(\mathbf{r}\\) vectors of an aggregated proof into
//! \\(2 \lg n\\) points and two scalars.

use std::borrow::Borrow;
use std::iter;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use merlin::Transcript;

use errors::ProofError;
use transcript::TranscriptProtocol;
use util;

/// Proof that \\(P = \langle \mathbf{a}, \mathbf{G} \rangle + \langle \mathbf{b}, \mathbf{H'} \rangle + \langle \mathbf{a}, \mathbf{b} \rangle Q\\).
#[derive(Clone, Debug)]
pub struct InnerProductProof {
    pub(crate) L_vec: Vec<CompressedRistretto>,
    pub(crate) R_vec: Vec<CompressedRistretto>,
    pub(crate) a: Scalar,
    pub(crate) b: Scalar,
}

/// Scalars the verifier needs to collapse all folding rounds into one
/// multiscalar multiplication.
struct FoldingScalars {
    /// \\(u\_i^2\\), in the order the rounds were run.
    u_sq: Vec<Scalar>,
    /// \\(u\_i^{-2}\\)
    u_inv_sq: Vec<Scalar>,
    /// \\(s\_i\\), the coefficient of \\(G\_i\\) in the folded generator.
    s: Vec<Scalar>,
}

impl InnerProductProof {
    /// Create an inner-product proof of `a_vec`, `b_vec` against the
    /// bases \\(\mathbf{G}\\) and \\(\mathbf{H'}\\), where
    /// \\(H'\_i = H\_i \cdot \texttt{Hprime\\_factors}\_i\\).
    ///
    /// Challenges are drawn from `transcript`, so they depend on
    /// everything the enclosing protocol committed before.
    ///
    /// All vectors must have the same length, a power of two.
    pub fn create(
        transcript: &mut Transcript,
        Q: &RistrettoPoint,
        Hprime_factors: &[Scalar],
        mut G_vec: Vec<RistrettoPoint>,
        mut H_vec: Vec<RistrettoPoint>,
        mut a_vec: Vec<Scalar>,
        mut b_vec: Vec<Scalar>,
    ) -> InnerProductProof {
        let mut n = G_vec.len();
        assert_eq!(H_vec.len(), n);
        assert_eq!(a_vec.len(), n);
        assert_eq!(b_vec.len(), n);
        assert_eq!(Hprime_factors.len(), n);
        assert!(n.is_power_of_two());

        transcript.innerproduct_domain_sep(n as u64);

        let rounds = n.trailing_zeros() as usize;
        let mut L_vec = Vec::with_capacity(rounds);
        let mut R_vec = Vec::with_capacity(rounds);

        let mut G = &mut G_vec[..];
        let mut H = &mut H_vec[..];
        let mut a = &mut a_vec[..];
        let mut b = &mut b_vec[..];

        // The H' factors are folded into H by the first round; later
        // rounds work on plain generators.
        let mut factors = Some(Hprime_factors);

        while n != 1 {
            n = n / 2;
            let (a_L, a_R) = a.split_at_mut(n);
            let (b_L, b_R) = b.split_at_mut(n);
            let (G_L, G_R) = G.split_at_mut(n);
            let (H_L, H_R) = H.split_at_mut(n);

            let factor = |k: usize| factors.map_or(Scalar::one(), |f| f[k]);

            let c_L = util::inner_product(a_L, b_R);
            let c_R = util::inner_product(a_R, b_L);

            let L = RistrettoPoint::vartime_multiscalar_mul(
                a_L.iter()
                    .cloned()
                    .chain(b_R.iter().enumerate().map(|(i, b_i)| b_i * factor(i)))
                    .chain(iter::once(c_L)),
                G_R.iter().chain(H_L.iter()).chain(iter::once(Q)),
            )
            .compress();
            let R = RistrettoPoint::vartime_multiscalar_mul(
                a_R.iter()
                    .cloned()
                    .chain(b_L.iter().enumerate().map(|(i, b_i)| b_i * factor(n + i)))
                    .chain(iter::once(c_R)),
                G_L.iter().chain(H_R.iter()).chain(iter::once(Q)),
            )
            .compress();

            transcript.commit_point(b"L", &L);
            transcript.commit_point(b"R", &R);
            L_vec.push(L);
            R_vec.push(R);

            let u = transcript.challenge_scalar(b"u");
            let u_inv = u.invert();

            for i in 0..n {
                a_L[i] = a_L[i] * u + u_inv * a_R[i];
                b_L[i] = b_L[i] * u_inv + u * b_R[i];
                G_L[i] = RistrettoPoint::vartime_multiscalar_mul(&[u_inv, u], &[G_L[i], G_R[i]]);
                H_L[i] = RistrettoPoint::vartime_multiscalar_mul(
                    &[u * factor(i), u_inv * factor(n + i)],
                    &[H_L[i], H_R[i]],
                );
            }

            factors = None;
            a = a_L;
            b = b_L;
            G = G_L;
            H = H_L;
        }

        InnerProductProof {
            L_vec,
            R_vec,
            a: a[0],
            b: b[0],
        }
    }

    /// Replays the folding challenges for vectors of length `n` and
    /// derives the scalars of the collapsed verification equation.
    ///
    /// `n` comes from the verifier, not the proof, so a malicious proof
    /// cannot make us allocate without bound.
    fn folding_scalars(
        &self,
        n: usize,
        transcript: &mut Transcript,
    ) -> Result<FoldingScalars, ProofError> {
        let rounds = self.L_vec.len();
        // also keeps the shift below from overflowing
        if rounds >= 32 || n != (1 << rounds) || self.R_vec.len() != rounds {
            return Err(ProofError::VerificationError);
        }

        transcript.innerproduct_domain_sep(n as u64);

        let mut u_sq = Vec::with_capacity(rounds);
        for (L, R) in self.L_vec.iter().zip(self.R_vec.iter()) {
            transcript.commit_point(b"L", L);
            transcript.commit_point(b"R", R);
            u_sq.push(transcript.challenge_scalar(b"u"));
        }

        let mut u_inv_sq = u_sq.clone();
        let all_inv = Scalar::batch_invert(&mut u_inv_sq);
        for (u, u_inv) in u_sq.iter_mut().zip(u_inv_sq.iter_mut()) {
            *u = *u * *u;
            *u_inv = *u_inv * *u_inv;
        }

        // s_0 = 1 / (u_1 ... u_k); setting bit j of the index multiplies
        // by the square of the challenge of round k - j.
        let mut s = Vec::with_capacity(n);
        s.push(all_inv);
        for i in 1..n {
            let top_bit = (31 - (i as u32).leading_zeros()) as usize;
            s.push(s[i - (1 << top_bit)] * u_sq[rounds - 1 - top_bit]);
        }

        Ok(FoldingScalars { u_sq, u_inv_sq, s })
    }

    /// Checks the proof against `P`, for vectors of length `n`.
    pub fn verify<I>(
        &self,
        n: usize,
        transcript: &mut Transcript,
        Hprime_factors: I,
        P: &RistrettoPoint,
        Q: &RistrettoPoint,
        G: &[RistrettoPoint],
        H: &[RistrettoPoint],
    ) -> Result<(), ProofError>
    where
        I: IntoIterator,
        I::Item: Borrow<Scalar>,
    {
        if G.len() != n || H.len() != n {
            return Err(ProofError::VerificationError);
        }

        let FoldingScalars { u_sq, u_inv_sq, s } = self.folding_scalars(n, transcript)?;

        let decompress_all = |points: &[CompressedRistretto]| {
            points
                .iter()
                .map(|p| p.decompress().ok_or(ProofError::VerificationError))
                .collect::<Result<Vec<_>, _>>()
        };
        let Ls = decompress_all(&self.L_vec)?;
        let Rs = decompress_all(&self.R_vec)?;

        let g_scalars = s.iter().map(|s_i| self.a * s_i);
        // 1/s_i is s_{n-1-i}
        let h_scalars = Hprime_factors
            .into_iter()
            .zip(s.iter().rev())
            .map(|(h_i, s_inv_i)| self.b * s_inv_i * h_i.borrow());

        let expected_P = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(self.a * self.b)
                .chain(g_scalars)
                .chain(h_scalars)
                .chain(u_sq.iter().map(|u| -u))
                .chain(u_inv_sq.iter().map(|u| -u)),
            iter::once(Q)
                .chain(G.iter())
                .chain(H.iter())
                .chain(Ls.iter())
                .chain(Rs.iter()),
        );

        if expected_P == *P {
            Ok(())
        } else {
            Err(ProofError::VerificationError)
        }
    }

    /// Size in bytes of the encoding: \\(32 (2 \lg n + 2)\\).
    pub fn serialized_size(&self) -> usize {
        32 * (2 * self.L_vec.len() + 2)
    }

    /// Encodes the proof as the pairs \\(L\_i, R\_i\\) in round order
    /// followed by \\(a\\) and \\(b\\).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        for (L, R) in self.L_vec.iter().zip(self.R_vec.iter()) {
            buf.extend_from_slice(L.as_bytes());
            buf.extend_from_slice(R.as_bytes());
        }
        buf.extend_from_slice(self.a.as_bytes());
        buf.extend_from_slice(self.b.as_bytes());
        buf
    }

    /// Decodes a proof written by [`InnerProductProof::to_bytes`].
    ///
    /// Fails with `FormatError` unless the slice holds an even number
    /// of points (fewer than 64) and two canonical scalars.
    pub fn from_bytes(slice: &[u8]) -> Result<InnerProductProof, ProofError> {
        if slice.len() % 32 != 0 || slice.len() < 64 {
            return Err(ProofError::FormatError);
        }
        let points = slice.len() / 32 - 2;
        if points % 2 != 0 || points / 2 >= 32 {
            return Err(ProofError::FormatError);
        }

        use util::read32;

        let (L_vec, R_vec): (Vec<_>, Vec<_>) = slice[..points * 32]
            .chunks(64)
            .map(|pair| {
                (
                    CompressedRistretto(read32(&pair[..32])),
                    CompressedRistretto(read32(&pair[32..])),
                )
            })
            .unzip();

        let scalar = |pos: usize| {
            Scalar::from_canonical_bytes(read32(&slice[pos..])).ok_or(ProofError::FormatError)
        };
        let a = scalar(points * 32)?;
        let b = scalar(points * 32 + 32)?;

        Ok(InnerProductProof { L_vec, R_vec, a, b })
    }
}

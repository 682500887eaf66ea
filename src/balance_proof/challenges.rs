//! Hash-derived challenges of the balance proof.
//!
//! The three round challenges are SHA-256 digests over a fixed byte
//! layout of the aggregated commitments, so that any implementation
//! holding the same public values derives the same challenges:
//!
//! * \\(y = H(V \\| n \\| A \\| S)\\)
//! * \\(z = H(A \\| S \\| d\_y)\\)
//! * \\(x = H(d\_z \\| T\_1 \\| T\_2)\\)
//!
//! Points are written in their 32-byte compressed encoding, \\(n\\) is a
//! single byte, and \\(d\_y\\), \\(d\_z\\) are the raw digests that
//! produced \\(y\\) and \\(z\\). A digest is read as a big-endian
//! integer and reduced modulo the group order.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha256};

/// A challenge scalar together with the digest it was reduced from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Challenge {
    /// The challenge as a scalar.
    pub scalar: Scalar,
    /// The SHA-256 output the scalar was derived from.
    pub digest: [u8; 32],
}

impl Challenge {
    fn from_parts(parts: &[&[u8]]) -> Challenge {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.input(part);
        }

        let mut digest = [0u8; 32];
        digest.copy_from_slice(hasher.result().as_slice());

        Challenge {
            scalar: scalar_from_be_bytes(&digest),
            digest,
        }
    }
}

/// Reduces a big-endian 256-bit integer modulo the group order.
pub fn scalar_from_be_bytes(bytes: &[u8; 32]) -> Scalar {
    let mut le = *bytes;
    le.reverse();
    Scalar::from_bytes_mod_order(le)
}

/// Derives the challenges \\(y\\) and \\(z\\) from the aggregated value
/// commitment `V`, the bitsize `n` and the aggregated bit commitments.
pub fn bit_challenges(
    V: &CompressedRistretto,
    n: u8,
    A: &CompressedRistretto,
    S: &CompressedRistretto,
) -> (Challenge, Challenge) {
    let y = Challenge::from_parts(&[V.as_bytes(), &[n], A.as_bytes(), S.as_bytes()]);
    let z = Challenge::from_parts(&[A.as_bytes(), S.as_bytes(), &y.digest]);
    (y, z)
}

/// Derives the challenge \\(x\\) from the digest of \\(z\\) and the
/// aggregated polynomial commitments.
pub fn poly_challenge(
    z: &Challenge,
    T_1: &CompressedRistretto,
    T_2: &CompressedRistretto,
) -> Challenge {
    Challenge::from_parts(&[&z.digest, T_1.as_bytes(), T_2.as_bytes()])
}

//! Errors related to proving and verifying aggregated balance proofs.

/// Represents an error in proof creation, verification, or parsing.
#[derive(Fail, Clone, Debug, Eq, PartialEq)]
pub enum ProofError {
    /// This error occurs when a proof failed to verify.
    #[fail(display = "Proof verification failed.")]
    VerificationError,
    /// This error occurs when the proof encoding is malformed.
    #[fail(display = "Proof data could not be parsed.")]
    FormatError,
    /// This error occurs when the bitsize is outside `1..=64`.
    #[fail(display = "Invalid bitsize, must be between 1 and 64.")]
    InvalidBitsize,
    /// This error occurs when the number of parties is zero.
    #[fail(display = "Invalid aggregation size, must contain at least one party.")]
    InvalidAggregation,
    /// This error occurs when there are insufficient generators for the proof.
    #[fail(display = "Invalid generators size, too few generators for proof")]
    InvalidGeneratorsLength,
    /// This error occurs when the number of values, blindings and roles differ.
    #[fail(display = "Wrong number of blinding factors or roles supplied.")]
    WrongNumBlindingFactors,
    /// This error occurs when a party's amount does not fit the bitsize.
    #[fail(display = "Value does not lie in the range [0, 2^n).")]
    ValueOutOfRange,
    /// This error results from an internal error during proving.
    ///
    /// The single-party prover is implemented by performing
    /// multiparty computation with ourselves.  However, because the
    /// MPC protocol is not exposed by the single-party API, we
    /// consider its errors to be internal errors.
    #[fail(display = "Internal error during proof creation: {}", _0)]
    ProvingError(MPCError),
}

impl From<MPCError> for ProofError {
    fn from(e: MPCError) -> ProofError {
        match e {
            MPCError::InvalidBitsize => ProofError::InvalidBitsize,
            MPCError::InvalidAggregation => ProofError::InvalidAggregation,
            MPCError::InvalidGeneratorsLength => ProofError::InvalidGeneratorsLength,
            MPCError::ValueOutOfRange => ProofError::ValueOutOfRange,
            _ => ProofError::ProvingError(e),
        }
    }
}

/// Represents an error during the multiparty computation protocol for
/// proof aggregation.
///
/// This is a separate type from the `ProofError` to allow a layered
/// API: although the MPC protocol is used internally for local
/// proving, its API should not expose the complexity of the MPC
/// protocol.
#[derive(Fail, Clone, Debug, Eq, PartialEq)]
pub enum MPCError {
    /// This error occurs when the coordinator gives a zero challenge,
    /// which would annihilate the blinding factors.
    #[fail(display = "Coordinator gave a malicious challenge value.")]
    MaliciousDealer,
    /// This error occurs when the bitsize is outside `1..=64`.
    #[fail(display = "Invalid bitsize, must be between 1 and 64.")]
    InvalidBitsize,
    /// This error occurs when the coordinator is given an empty party list.
    #[fail(display = "Invalid aggregation size, must contain at least one party.")]
    InvalidAggregation,
    /// This error occurs when there are insufficient generators for the proof.
    #[fail(display = "Invalid generators size, too few generators for proof")]
    InvalidGeneratorsLength,
    /// This error occurs when a party's amount does not fit the bitsize.
    #[fail(display = "Value does not lie in the range [0, 2^n).")]
    ValueOutOfRange,
    /// This error occurs when the coordinator is given the wrong
    /// number of bit commitments.
    #[fail(display = "Wrong number of bit commitments")]
    WrongNumBitCommitments,
    /// This error occurs when the coordinator is given the wrong
    /// number of polynomial commitments.
    #[fail(display = "Wrong number of polynomial commitments")]
    WrongNumPolyCommitments,
    /// This error occurs when the coordinator is given the wrong
    /// number of proof shares.
    #[fail(display = "Wrong number of proof shares")]
    WrongNumProofShares,
    /// This error occurs when one or more parties submit proof shares
    /// whose vectors do not have the expected length.
    #[fail(display = "Malformed proof shares from parties {:?}", bad_shares)]
    MalformedProofShares {
        /// A vector with the indexes of the parties whose shares were malformed.
        bad_shares: Vec<usize>,
    },
}

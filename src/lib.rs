#![allow(non_snake_case)]
#![deny(missing_docs)]

//! Multi-party aggregated range proofs with a zero-sum balance check.
//!
//! A set of parties, each holding a secret amount and a secret
//! blinding factor, jointly produce one compact proof that every
//! amount lies in \\([0, 2^n)\\) and that the amounts of the
//! [`Role::Source`] parties sum to the amounts of the
//! [`Role::Destination`] parties.
//!
//! The protocol is run by a [`balance_proof::coordinator`] talking to
//! one [`balance_proof::party`] per amount; [`AggregateProof::prove`]
//! runs both sides locally.

extern crate byteorder;
extern crate clear_on_drop;
extern crate curve25519_dalek;
extern crate digest;
extern crate merlin;
extern crate rand;
extern crate rayon;
extern crate sha2;
extern crate sha3;
extern crate subtle;

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate bincode;

mod util;

mod errors;
mod generators;
mod inner_product_proof;
mod transcript;

pub mod balance_proof;

pub use balance_proof::messages::Role;
pub use balance_proof::AggregateProof;
pub use errors::{MPCError, ProofError};
pub use generators::{BulletproofGens, PedersenGens};

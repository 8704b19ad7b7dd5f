//! ZK layer for the anonymous Greeter.
//!
//! This crate contains:
//! - Anonymous identities and their public membership commitments.
//! - An incremental Merkle group for off-chain membership bookkeeping.
//! - A SNARK circuit proving group membership without revealing the member.
//! - Prover + verifier orchestration.
//! - Serialization helpers for transporting proofs and public inputs.

pub mod circuit;
pub mod constants;
pub mod groth16;
pub mod group;
pub mod hash;
pub mod identity;
pub mod types;

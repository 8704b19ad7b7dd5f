//! Anonymous identities.
//!
//! An identity is an opaque pair of field elements (trapdoor + nullifier) that
//! never leaves the member's machine. Only the derived commitment is published
//! to the group.

use crate::hash::{hash_bytes, hash_one, hash_two};
use ark_bn254::Fr;
use ark_ff::UniformRand;
use rand::RngCore;

/// A member's secret identity.
#[derive(Clone, Debug)]
pub struct Identity {
    /// Random secret used only for the commitment.
    pub trapdoor: Fr,
    /// Random secret that also feeds the per-scope nullifier hash.
    pub nullifier: Fr,
}

impl Identity {
    /// Generate a fresh random identity.
    pub fn new(rng: &mut impl RngCore) -> Self {
        Self {
            trapdoor: Fr::rand(rng),
            nullifier: Fr::rand(rng),
        }
    }

    /// Derive an identity deterministically from a seed.
    ///
    /// Both secrets are domain-separated Poseidon digests of the seed, so the
    /// same seed always reproduces the same identity.
    pub fn from_seed(seed: &[u8]) -> Self {
        let base = hash_bytes(seed);
        Self {
            trapdoor: hash_two(base, Fr::from(1u64)),
            nullifier: hash_two(base, Fr::from(2u64)),
        }
    }

    /// The identity secret: Poseidon(nullifier, trapdoor).
    ///
    /// MUST match the circuit's derivation.
    pub fn secret(&self) -> Fr {
        hash_two(self.nullifier, self.trapdoor)
    }

    /// The public membership commitment: Poseidon(secret).
    pub fn commitment(&self) -> Fr {
        hash_one(self.secret())
    }
}

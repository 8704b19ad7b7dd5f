//! R1CS circuit for proving anonymous group membership.
//!
//! What this circuit proves (for one member):
//! 1) The prover knows the trapdoor + nullifier behind some membership commitment.
//! 2) That commitment sits in a Merkle tree with the public root (the group).
//! 3) The public nullifier hash equals Poseidon(external_nullifier, nullifier),
//!    which lets a verifier reject proof reuse within one scope.
//! 4) The public signal hash is bound into the statement, so the proof cannot be
//!    replayed with a different message.
//!
//! Privacy: the identity secrets and the Merkle path are witnesses (never
//! public). Nothing in the public inputs identifies which member proved.

use crate::constants::poseidon_config;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// In-circuit twin of `hash::hash_one`.
fn hash_one_var(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    x: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, cfg);
    sponge.absorb(&[x.clone()].as_slice())?;
    Ok(sponge.squeeze_field_elements(1)?[0].clone())
}

/// In-circuit twin of `hash::hash_two`.
fn hash_two_var(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    left: &FpVar<Fr>,
    right: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, cfg);
    sponge.absorb(&[left.clone(), right.clone()].as_slice())?;
    Ok(sponge.squeeze_field_elements(1)?[0].clone())
}

/// Membership circuit for a group Merkle tree of depth `DEPTH`.
#[derive(Clone, Debug)]
pub struct MembershipCircuit<const DEPTH: usize> {
    /// Private identity secrets.
    pub identity_trapdoor: Fr,
    pub identity_nullifier: Fr,

    /// Private Merkle inclusion path for the identity commitment.
    pub path_elements: Vec<Fr>,
    pub path_indices: Vec<bool>,

    /// Public inputs.
    pub public_merkle_root: Fr,
    pub public_nullifier_hash: Fr,
    pub public_signal_hash: Fr,
    pub public_external_nullifier: Fr,
}

impl<const DEPTH: usize> ConstraintSynthesizer<Fr> for MembershipCircuit<DEPTH> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // --- Public inputs ---
        // IMPORTANT: Allocation order MUST match
        // `groth16::membership_public_inputs_to_field_elems`.
        let merkle_root = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_merkle_root))?;
        let nullifier_hash =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_nullifier_hash))?;
        let signal_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_signal_hash))?;
        let external_nullifier =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(self.public_external_nullifier))?;

        // --- Witness (private) identity and path ---
        if self.path_elements.len() != DEPTH || self.path_indices.len() != DEPTH {
            return Err(SynthesisError::Unsatisfiable);
        }

        let trapdoor = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.identity_trapdoor))?;
        let identity_nullifier =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.identity_nullifier))?;

        let cfg = poseidon_config();

        // Re-derive the membership commitment from the secrets.
        let secret = hash_two_var(cs.clone(), &cfg, &identity_nullifier, &trapdoor)?;
        let commitment = hash_one_var(cs.clone(), &cfg, &secret)?;

        // Fold the Merkle path from the commitment up to the root.
        let mut current = commitment;
        for level in 0..DEPTH {
            let sibling = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.path_elements[level]))?;
            let is_right = Boolean::new_witness(cs.clone(), || Ok(self.path_indices[level]))?;

            // is_right => the sibling sits on the left.
            let left = is_right.select(&sibling, &current)?;
            let right = is_right.select(&current, &sibling)?;
            current = hash_two_var(cs.clone(), &cfg, &left, &right)?;
        }
        current.enforce_equal(&merkle_root)?;

        // Scope-bound nullifier: Poseidon(external_nullifier, identity_nullifier).
        let computed_nullifier_hash =
            hash_two_var(cs.clone(), &cfg, &external_nullifier, &identity_nullifier)?;
        computed_nullifier_hash.enforce_equal(&nullifier_hash)?;

        // Bind the signal into the statement. Squaring keeps the input from
        // being optimized out of the constraint system (Semaphore does the
        // same with its signal hash).
        let _signal_hash_squared = &signal_hash * &signal_hash;

        Ok(())
    }
}

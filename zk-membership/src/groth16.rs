//! Groth16 prover/verifier orchestration for the membership circuit.
//!
//! SECURITY NOTE (prototype): Groth16 requires a trusted setup that produces a
//! proving key (PK) and verifying key (VK). This prototype generates keys
//! locally. In production, an MPC ceremony (or a transparent system) should be
//! used.

use crate::circuit::MembershipCircuit;
use crate::group::MerkleWitness;
use crate::hash::{hash_bytes, hash_two};
use crate::identity::Identity;
use crate::types::MembershipPublicInputs;
use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkError {
    #[error("invalid witness depth: expected {expected}, got {got}")]
    InvalidWitnessDepth { expected: usize, got: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("proof verification failed")]
    VerificationFailed,

    #[error("arkworks error: {0}")]
    Ark(String),
}

/// The proof scope for a greeter group.
///
/// Proofs are bound to this value, so a proof for one group cannot be replayed
/// against another.
pub fn external_nullifier_from_group_id(group_id: u64) -> Fr {
    Fr::from(group_id)
}

/// Field encoding of a signal (the greeting message bytes).
pub fn signal_hash(signal: &[u8]) -> Fr {
    hash_bytes(signal)
}

/// Scope-bound nullifier hash for an identity.
///
/// This MUST match the circuit's derivation.
pub fn nullifier_hash(external_nullifier: Fr, identity: &Identity) -> Fr {
    hash_two(external_nullifier, identity.nullifier)
}

/// Convert public inputs to the vector expected by Groth16.
///
/// ORDERING MUST MATCH the circuit's `new_input` allocation order.
pub fn membership_public_inputs_to_field_elems(inputs: &MembershipPublicInputs) -> Vec<Fr> {
    vec![
        inputs.merkle_root,
        inputs.nullifier_hash,
        inputs.signal_hash,
        inputs.external_nullifier,
    ]
}

/// Generate a Groth16 keypair for the membership circuit.
///
/// For a fixed `DEPTH`, this must be run once; the constraint system only
/// depends on the depth, never on member data.
pub fn setup_keys<const DEPTH: usize>(
    rng: &mut impl RngCore,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ZkError> {
    // An all-zero witness; only the circuit shape matters for setup.
    let circuit = MembershipCircuit::<DEPTH> {
        identity_trapdoor: Fr::from(0u64),
        identity_nullifier: Fr::from(0u64),
        path_elements: vec![Fr::from(0u64); DEPTH],
        path_indices: vec![false; DEPTH],
        public_merkle_root: Fr::from(0u64),
        public_nullifier_hash: Fr::from(0u64),
        public_signal_hash: Fr::from(0u64),
        public_external_nullifier: Fr::from(0u64),
    };

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    let vk = pk.vk.clone();
    Ok((pk, vk))
}

/// Prove membership of `identity` in the group behind `witness`, bound to a
/// signal and scope.
///
/// Returns the proof together with the public inputs the verifier must check
/// it against (root, nullifier hash, signal hash, external nullifier).
pub fn prove_membership<const DEPTH: usize>(
    rng: &mut impl RngCore,
    pk: &ProvingKey<Bn254>,
    identity: &Identity,
    witness: &MerkleWitness,
    external_nullifier: Fr,
    signal_hash: Fr,
) -> Result<(Proof<Bn254>, MembershipPublicInputs), ZkError> {
    if witness.depth() != DEPTH {
        return Err(ZkError::InvalidWitnessDepth {
            expected: DEPTH,
            got: witness.depth(),
        });
    }

    let public_inputs = MembershipPublicInputs {
        merkle_root: witness.compute_root(),
        nullifier_hash: nullifier_hash(external_nullifier, identity),
        signal_hash,
        external_nullifier,
    };

    let circuit = MembershipCircuit::<DEPTH> {
        identity_trapdoor: identity.trapdoor,
        identity_nullifier: identity.nullifier,
        path_elements: witness.path_elements.clone(),
        path_indices: witness.path_indices.clone(),
        public_merkle_root: public_inputs.merkle_root,
        public_nullifier_hash: public_inputs.nullifier_hash,
        public_signal_hash: public_inputs.signal_hash,
        public_external_nullifier: public_inputs.external_nullifier,
    };

    let proof = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    Ok((proof, public_inputs))
}

/// Verify a membership proof against its public inputs.
pub fn verify_membership_proof(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    inputs: &MembershipPublicInputs,
) -> Result<(), ZkError> {
    let pvk = prepare_verifying_key(vk);
    let ok = Groth16::<Bn254>::verify_proof(
        &pvk,
        proof,
        &membership_public_inputs_to_field_elems(inputs),
    )
    .map_err(|e| ZkError::Ark(format!("{e}")))?;

    if !ok {
        return Err(ZkError::VerificationFailed);
    }
    Ok(())
}

/// Serialize a proving key to bytes.
pub fn serialize_pk(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    pk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, ZkError> {
    ProvingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    vk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ZkError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ZkError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const TEST_DEPTH: usize = 4;

    fn test_setup() -> (
        ProvingKey<Bn254>,
        VerifyingKey<Bn254>,
        Group,
        Identity,
        u32,
    ) {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let (pk, vk) = setup_keys::<TEST_DEPTH>(&mut rng).expect("setup");

        let identity = Identity::from_seed(b"anon2");
        let mut group = Group::new(TEST_DEPTH).expect("group");
        group
            .add_member(Identity::from_seed(b"anon1").commitment())
            .expect("add");
        let index = group.add_member(identity.commitment()).expect("add");

        (pk, vk, group, identity, index)
    }

    #[test]
    fn prove_then_verify() {
        let (pk, vk, group, identity, index) = test_setup();
        let witness = group.merkle_witness(index).expect("witness");

        let external_nullifier = external_nullifier_from_group_id(42);
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let (proof, inputs) = prove_membership::<TEST_DEPTH>(
            &mut rng,
            &pk,
            &identity,
            &witness,
            external_nullifier,
            signal_hash(b"Hello World"),
        )
        .expect("prove");

        assert_eq!(inputs.merkle_root, group.root());
        assert_eq!(inputs.nullifier_hash, nullifier_hash(external_nullifier, &identity));
        verify_membership_proof(&vk, &proof, &inputs).expect("verify");
    }

    #[test]
    fn tampered_signal_fails_verification() {
        let (pk, vk, group, identity, index) = test_setup();
        let witness = group.merkle_witness(index).expect("witness");

        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let (proof, mut inputs) = prove_membership::<TEST_DEPTH>(
            &mut rng,
            &pk,
            &identity,
            &witness,
            external_nullifier_from_group_id(42),
            signal_hash(b"Hello World"),
        )
        .expect("prove");

        inputs.signal_hash = signal_hash(b"Hello Mallory");
        assert!(matches!(
            verify_membership_proof(&vk, &proof, &inputs),
            Err(ZkError::VerificationFailed)
        ));
    }

    #[test]
    fn proof_is_scope_bound() {
        let (pk, vk, group, identity, index) = test_setup();
        let witness = group.merkle_witness(index).expect("witness");

        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let (proof, mut inputs) = prove_membership::<TEST_DEPTH>(
            &mut rng,
            &pk,
            &identity,
            &witness,
            external_nullifier_from_group_id(42),
            signal_hash(b"Hello World"),
        )
        .expect("prove");

        // A different scope invalidates both the external nullifier and the
        // nullifier hash derived from it.
        inputs.external_nullifier = external_nullifier_from_group_id(43);
        assert!(verify_membership_proof(&vk, &proof, &inputs).is_err());
    }

    #[test]
    fn witness_depth_mismatch_is_rejected() {
        let (pk, _vk, _group, identity, _index) = test_setup();

        let mut wrong_depth_group = Group::new(TEST_DEPTH + 1).expect("group");
        let index = wrong_depth_group
            .add_member(identity.commitment())
            .expect("add");
        let witness = wrong_depth_group.merkle_witness(index).expect("witness");

        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let err = prove_membership::<TEST_DEPTH>(
            &mut rng,
            &pk,
            &identity,
            &witness,
            external_nullifier_from_group_id(42),
            signal_hash(b"hi"),
        )
        .expect_err("depth mismatch");

        assert!(matches!(
            err,
            ZkError::InvalidWitnessDepth { expected: TEST_DEPTH, got } if got == TEST_DEPTH + 1
        ));
    }

    #[test]
    fn keys_and_proofs_round_trip_through_bytes() {
        let (pk, vk, group, identity, index) = test_setup();
        let witness = group.merkle_witness(index).expect("witness");

        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let (proof, inputs) = prove_membership::<TEST_DEPTH>(
            &mut rng,
            &pk,
            &identity,
            &witness,
            external_nullifier_from_group_id(42),
            signal_hash(b"Hello World"),
        )
        .expect("prove");

        let vk2 = deserialize_vk(&serialize_vk(&vk).expect("ser")).expect("de");
        let proof2 = deserialize_proof(&serialize_proof(&proof).expect("ser")).expect("de");
        verify_membership_proof(&vk2, &proof2, &inputs).expect("verify");
    }
}

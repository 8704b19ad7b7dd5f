//! Types shared between the circuit and the host-side prover/verifier.

use ark_bn254::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

/// JSON-friendly representation of a field element.
///
/// We expose Fr values as hex strings to avoid ambiguities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrHex {
    pub hex: String,
}

impl FrHex {
    pub fn from_fr(x: &Fr) -> Self {
        // Use arkworks' canonical compressed encoding so all components agree.
        let mut bytes = Vec::new();
        x.serialize_compressed(&mut bytes)
            .expect("in-memory serialization");
        Self { hex: hex::encode(bytes) }
    }

    pub fn to_fr(&self) -> Result<Fr, String> {
        let bytes = hex::decode(&self.hex).map_err(|e| format!("invalid hex: {e}"))?;
        Fr::deserialize_compressed(&bytes[..]).map_err(|e| format!("invalid field bytes: {e}"))
    }
}

/// Public inputs of a membership proof.
///
/// Ordering MUST match the circuit's public input allocation order:
/// merkle_root, nullifier_hash, signal_hash, external_nullifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipPublicInputs {
    /// Root of the group Merkle tree the member proved inclusion in.
    pub merkle_root: Fr,
    /// Poseidon(external_nullifier, identity nullifier); consumed by the
    /// verifier to reject proof reuse within one scope.
    pub nullifier_hash: Fr,
    /// Field encoding of the signal (the greeting message).
    pub signal_hash: Fr,
    /// Scope of the proof; the greeter uses its group id.
    pub external_nullifier: Fr,
}

/// Hex form of [`MembershipPublicInputs`] for transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipPublicInputsHex {
    pub merkle_root: FrHex,
    pub nullifier_hash: FrHex,
    pub signal_hash: FrHex,
    pub external_nullifier: FrHex,
}

impl MembershipPublicInputs {
    pub fn to_hex(&self) -> MembershipPublicInputsHex {
        MembershipPublicInputsHex {
            merkle_root: FrHex::from_fr(&self.merkle_root),
            nullifier_hash: FrHex::from_fr(&self.nullifier_hash),
            signal_hash: FrHex::from_fr(&self.signal_hash),
            external_nullifier: FrHex::from_fr(&self.external_nullifier),
        }
    }
}

impl MembershipPublicInputsHex {
    pub fn to_inputs(&self) -> Result<MembershipPublicInputs, String> {
        Ok(MembershipPublicInputs {
            merkle_root: self.merkle_root.to_fr()?,
            nullifier_hash: self.nullifier_hash.to_fr()?,
            signal_hash: self.signal_hash.to_fr()?,
            external_nullifier: self.external_nullifier.to_fr()?,
        })
    }
}

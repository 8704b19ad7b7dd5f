//! The Greeter contract, hosted in-process.
//!
//! This is the stateful verifier side of the system: it owns the membership
//! group, consumes nullifier hashes, verifies membership proofs and emits an
//! event for every accepted state transition. Rejections are typed errors,
//! never panics.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Proof, VerifyingKey};
use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;
use zk_membership::group::{Group, GroupError};
use zk_membership::groth16::{
    external_nullifier_from_group_id, signal_hash, verify_membership_proof, ZkError,
};
use zk_membership::types::{FrHex, MembershipPublicInputs};

/// Usernames follow the original bytes32 discipline.
pub const MAX_USERNAME_BYTES: usize = 32;

/// Greeting messages are short signals, not documents.
pub const MAX_MESSAGE_BYTES: usize = 256;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("username must be 1..={MAX_USERNAME_BYTES} bytes")]
    InvalidUsername,

    #[error("message must be 1..={MAX_MESSAGE_BYTES} bytes")]
    InvalidMessage,

    #[error("identity commitment already registered")]
    DuplicateCommitment,

    #[error("group is full: capacity {0}")]
    GroupFull(u64),

    #[error("merkle root does not match the current group root")]
    StaleRoot,

    #[error("nullifier hash already used")]
    NullifierAlreadyUsed,

    #[error("membership proof rejected")]
    InvalidProof,

    #[error("group error: {0}")]
    Group(GroupError),
}

/// Events observable on the contract, mirroring the on-chain originals:
/// `NewUser(identityCommitment, username)` and `NewGreeting(greeting)`.
#[derive(Clone, Debug, PartialEq)]
pub enum GreeterEvent {
    NewUser {
        identity_commitment: Fr,
        username: String,
    },
    NewGreeting {
        message: String,
    },
}

impl GreeterEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GreeterEvent::NewUser { .. } => "new_user",
            GreeterEvent::NewGreeting { .. } => "new_greeting",
        }
    }

    /// JSON payload persisted to the event log.
    pub fn payload_json(&self) -> serde_json::Value {
        match self {
            GreeterEvent::NewUser {
                identity_commitment,
                username,
            } => json!({
                "identity_commitment_hex": FrHex::from_fr(identity_commitment).hex,
                "username": username,
            }),
            GreeterEvent::NewGreeting { message } => json!({ "message": message }),
        }
    }
}

/// The Greeter: a membership group plus a proof-guarded greeting endpoint.
pub struct Greeter {
    group_id: u64,
    group: Group,
    used_nullifiers: HashSet<Fr>,
    vk: VerifyingKey<Bn254>,
}

impl Greeter {
    /// The deployment procedure: a fresh contract for one group.
    pub fn deploy(
        group_id: u64,
        depth: usize,
        vk: VerifyingKey<Bn254>,
    ) -> Result<Self, ContractError> {
        let group = Group::new(depth).map_err(ContractError::Group)?;
        Ok(Self {
            group_id,
            group,
            used_nullifiers: HashSet::new(),
            vk,
        })
    }

    pub fn group_id(&self) -> u64 {
        self.group_id
    }

    pub fn depth(&self) -> usize {
        self.group.depth()
    }

    pub fn capacity(&self) -> u64 {
        self.group.capacity()
    }

    pub fn member_count(&self) -> u64 {
        self.group.member_count()
    }

    /// Ordered member commitments, index = join order.
    pub fn members(&self) -> &[Fr] {
        self.group.members()
    }

    pub fn merkle_root(&self) -> Fr {
        self.group.root()
    }

    /// Restore a consumed nullifier when rebuilding state from storage.
    pub fn mark_nullifier_used(&mut self, nullifier_hash: Fr) {
        self.used_nullifiers.insert(nullifier_hash);
    }

    /// Register a member: insert the commitment into the group and emit
    /// `NewUser`.
    pub fn join_group(
        &mut self,
        identity_commitment: Fr,
        username: &str,
    ) -> Result<(u32, GreeterEvent), ContractError> {
        if username.is_empty() || username.len() > MAX_USERNAME_BYTES {
            return Err(ContractError::InvalidUsername);
        }
        if self.group.members().contains(&identity_commitment) {
            return Err(ContractError::DuplicateCommitment);
        }

        let position = self.group.add_member(identity_commitment).map_err(|e| match e {
            GroupError::GroupFull(capacity) => ContractError::GroupFull(capacity),
            other => ContractError::Group(other),
        })?;

        let event = GreeterEvent::NewUser {
            identity_commitment,
            username: username.to_string(),
        };
        Ok((position, event))
    }

    /// Accept an anonymous greeting: verify the membership proof against the
    /// current root, consume the nullifier hash and emit `NewGreeting`.
    pub fn greet(
        &mut self,
        message: &str,
        merkle_root: Fr,
        nullifier_hash: Fr,
        proof: &Proof<Bn254>,
    ) -> Result<GreeterEvent, ContractError> {
        if message.is_empty() || message.len() > MAX_MESSAGE_BYTES {
            return Err(ContractError::InvalidMessage);
        }
        if merkle_root != self.group.root() {
            return Err(ContractError::StaleRoot);
        }
        if self.used_nullifiers.contains(&nullifier_hash) {
            return Err(ContractError::NullifierAlreadyUsed);
        }

        let inputs = MembershipPublicInputs {
            merkle_root,
            nullifier_hash,
            signal_hash: signal_hash(message.as_bytes()),
            external_nullifier: external_nullifier_from_group_id(self.group_id),
        };

        verify_membership_proof(&self.vk, proof, &inputs)
            .map_err(|_: ZkError| ContractError::InvalidProof)?;

        // Only consume the nullifier once the proof is accepted.
        self.used_nullifiers.insert(nullifier_hash);

        Ok(GreeterEvent::NewGreeting {
            message: message.to_string(),
        })
    }
}

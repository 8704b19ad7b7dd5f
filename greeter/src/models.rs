use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group_id: u64,
    pub depth: usize,
    pub capacity: u64,
    pub member_count: u64,
    pub merkle_root_hex: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberItem {
    pub position: u32,
    pub identity_commitment_hex: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberListResponse {
    pub group_id: u64,
    pub members: Vec<MemberItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinGroupRequest {
    /// Compressed field encoding of the identity commitment, hex.
    pub identity_commitment_hex: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinGroupResponse {
    pub position: u32,
    /// Group root after insertion.
    pub merkle_root_hex: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GreetRequest {
    pub message: String,
    pub merkle_root_hex: String,
    pub nullifier_hash_hex: String,
    /// Compressed Groth16 proof bytes, base64.
    pub proof_b64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GreetResponse {
    pub greeting_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GreetingItem {
    pub greeting_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub merkle_root_hex: String,
    pub nullifier_hash_hex: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GreetingListResponse {
    pub greetings: Vec<GreetingItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventItem {
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub kind: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<EventItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ZkVkResponse {
    pub curve: String,
    pub proof_system: String,
    pub vk_b64: String,
}

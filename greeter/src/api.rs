use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;
use zk_membership::groth16::deserialize_proof;
use zk_membership::types::FrHex;

use ark_bn254::Fr;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/group", get(get_group))
        .route("/api/v1/group/members", get(list_members).post(join_group))
        .route("/api/v1/greetings", get(list_greetings).post(greet))
        .route("/api/v1/events", get(list_events))
        .route("/api/v1/zk/vk", get(get_vk))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn parse_fr(hex: &str, what: &str) -> Result<Fr, ApiError> {
    FrHex { hex: hex.to_string() }
        .to_fr()
        .map_err(|_| ApiError::BadRequest(format!("invalid {what} hex")))
}

fn fr_hex(x: &Fr) -> String {
    FrHex::from_fr(x).hex
}

async fn get_group(State(state): State<AppState>) -> Result<Json<GroupResponse>, ApiError> {
    let greeter = state.greeter.lock().await;

    Ok(Json(GroupResponse {
        group_id: greeter.group_id(),
        depth: greeter.depth(),
        capacity: greeter.capacity(),
        member_count: greeter.member_count(),
        merkle_root_hex: fr_hex(&greeter.merkle_root()),
    }))
}

async fn list_members(State(state): State<AppState>) -> Result<Json<MemberListResponse>, ApiError> {
    let group_id = state.greeter.lock().await.group_id();
    let rows = db::list_members(&state.db).await?;

    let members = rows
        .into_iter()
        .map(|(position, identity_commitment_hex, username)| MemberItem {
            position,
            identity_commitment_hex,
            username,
        })
        .collect();

    Ok(Json(MemberListResponse { group_id, members }))
}

async fn join_group(
    State(state): State<AppState>,
    Json(req): Json<JoinGroupRequest>,
) -> Result<Json<JoinGroupResponse>, ApiError> {
    let commitment = parse_fr(&req.identity_commitment_hex, "identity commitment")?;

    // Hold the contract lock across persistence so the event log order
    // matches acceptance order.
    let mut greeter = state.greeter.lock().await;
    let (position, event) = greeter.join_group(commitment, &req.username)?;
    let merkle_root_hex = fr_hex(&greeter.merkle_root());

    db::insert_member(&state.db, position, &req.identity_commitment_hex, &req.username).await?;
    db::insert_event(&state.db, event.kind(), &event.payload_json().to_string()).await?;

    tracing::info!(position, username = %req.username, "new member joined");

    Ok(Json(JoinGroupResponse { position, merkle_root_hex }))
}

async fn greet(
    State(state): State<AppState>,
    Json(req): Json<GreetRequest>,
) -> Result<Json<GreetResponse>, ApiError> {
    let merkle_root = parse_fr(&req.merkle_root_hex, "merkle root")?;
    let nullifier_hash = parse_fr(&req.nullifier_hash_hex, "nullifier hash")?;

    let proof_bytes = base64::engine::general_purpose::STANDARD
        .decode(&req.proof_b64)
        .map_err(|_| ApiError::BadRequest("invalid proof_b64".to_string()))?;
    let proof =
        deserialize_proof(&proof_bytes).map_err(|_| ApiError::BadRequest("invalid proof".to_string()))?;

    let mut greeter = state.greeter.lock().await;
    let event = greeter.greet(&req.message, merkle_root, nullifier_hash, &proof)?;

    let greeting_id = Uuid::new_v4();
    db::insert_greeting(
        &state.db,
        greeting_id,
        &req.message,
        &req.merkle_root_hex,
        &req.nullifier_hash_hex,
        &req.proof_b64,
    )
    .await?;
    db::insert_event(&state.db, event.kind(), &event.payload_json().to_string()).await?;

    tracing::info!(%greeting_id, "anonymous greeting accepted");

    Ok(Json(GreetResponse {
        greeting_id,
        message: req.message,
    }))
}

async fn list_greetings(
    State(state): State<AppState>,
) -> Result<Json<GreetingListResponse>, ApiError> {
    let rows = db::list_greetings(&state.db).await?;

    let greetings = rows
        .into_iter()
        .map(
            |(greeting_id, created_at, message, merkle_root_hex, nullifier_hash_hex)| GreetingItem {
                greeting_id,
                created_at,
                message,
                merkle_root_hex,
                nullifier_hash_hex,
            },
        )
        .collect();

    Ok(Json(GreetingListResponse { greetings }))
}

async fn list_events(State(state): State<AppState>) -> Result<Json<EventListResponse>, ApiError> {
    let rows = db::list_events(&state.db).await?;

    let mut events = Vec::with_capacity(rows.len());
    for (seq, created_at, kind, payload_json) in rows {
        let payload = serde_json::from_str(&payload_json).map_err(|_| ApiError::Internal)?;
        events.push(EventItem {
            seq,
            created_at,
            kind,
            payload,
        });
    }

    Ok(Json(EventListResponse { events }))
}

async fn get_vk(State(state): State<AppState>) -> Result<Json<ZkVkResponse>, ApiError> {
    let vk_bytes = zk_membership::groth16::serialize_vk(state.keys.vk.as_ref())
        .map_err(|_| ApiError::Internal)?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(vk_bytes);

    Ok(Json(ZkVkResponse {
        curve: "bn254".to_string(),
        proof_system: "groth16".to_string(),
        vk_b64: b64,
    }))
}

use greeter::contract::Greeter;
use greeter::errors::ApiError;
use greeter::state::{load_or_setup_keys, AppState};
use greeter::{api, db};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zk_membership::constants::DEFAULT_TREE_DEPTH;
use zk_membership::types::FrHex;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Store local state under greeter/data (ignored by git).
    let data_dir = PathBuf::from("data");
    std::fs::create_dir_all(&data_dir).map_err(|_| ApiError::Internal)?;

    let db_path = data_dir.join("greeter.sqlite");
    // rwc: create the database file on first run.
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());

    let db = db::connect(&db_url).await?;
    db::init_schema(&db).await?;

    let group_id = std::env::var("GREETER_GROUP_ID")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(42);

    // Proving artifacts: loaded from disk, generated on first run.
    let keys =
        tokio::task::spawn_blocking(move || load_or_setup_keys::<DEFAULT_TREE_DEPTH>(&data_dir))
            .await
            .map_err(|_| ApiError::Internal)??;

    // Deploy the contract and replay persisted state into it.
    let mut greeter = Greeter::deploy(group_id, DEFAULT_TREE_DEPTH, keys.vk.as_ref().clone())
        .map_err(|_| ApiError::Internal)?;

    for (position, commitment_hex, username) in db::list_members(&db).await? {
        let commitment = FrHex { hex: commitment_hex }
            .to_fr()
            .map_err(|_| ApiError::Internal)?;
        let (replayed, _event) = greeter
            .join_group(commitment, &username)
            .map_err(|_| ApiError::Internal)?;
        // Positions are dense, so replay must land on the stored slot.
        if replayed != position {
            return Err(ApiError::Internal);
        }
    }

    for nullifier_hex in db::list_nullifier_hashes(&db).await? {
        let nullifier = FrHex { hex: nullifier_hex }
            .to_fr()
            .map_err(|_| ApiError::Internal)?;
        greeter.mark_nullifier_used(nullifier);
    }

    tracing::info!(
        group_id,
        members = greeter.member_count(),
        "greeter deployed"
    );

    let state = AppState::new(db, keys, greeter);

    let app = api::router(state);

    let addr = std::env::var("GREETER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(%addr, "greeter listening");

    axum::serve(listener, app).await.map_err(|_| ApiError::Internal)?;

    Ok(())
}

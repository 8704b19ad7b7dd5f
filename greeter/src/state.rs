use crate::contract::Greeter;
use crate::db::Db;
use crate::errors::ApiError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use zk_membership::groth16::{deserialize_pk, deserialize_vk, serialize_pk, serialize_vk, setup_keys};

use ark_bn254::Bn254;
use ark_groth16::{ProvingKey, VerifyingKey};
use rand::rngs::OsRng;

#[derive(Clone)]
pub struct ZkKeys {
    pub pk: Arc<ProvingKey<Bn254>>,
    pub vk: Arc<VerifyingKey<Bn254>>,
}

/// Ensure Groth16 artifacts exist on disk and load them.
///
/// Artifacts live under `<data>/keys/`; when absent, the trusted setup
/// (prototype) runs once and both keys are persisted for later runs.
pub fn load_or_setup_keys<const DEPTH: usize>(data_dir: &Path) -> Result<ZkKeys, ApiError> {
    let keys_dir = data_dir.join("keys");
    std::fs::create_dir_all(&keys_dir).map_err(|_| ApiError::Internal)?;

    let pk_path = keys_dir.join("groth16_pk.bin");
    let vk_path = keys_dir.join("groth16_vk.bin");

    if pk_path.exists() && vk_path.exists() {
        let pk_bytes = std::fs::read(&pk_path).map_err(|_| ApiError::Internal)?;
        let vk_bytes = std::fs::read(&vk_path).map_err(|_| ApiError::Internal)?;

        let pk = deserialize_pk(&pk_bytes).map_err(|_| ApiError::Internal)?;
        let vk = deserialize_vk(&vk_bytes).map_err(|_| ApiError::Internal)?;

        return Ok(ZkKeys { pk: Arc::new(pk), vk: Arc::new(vk) });
    }

    // Trusted setup randomness (prototype).
    //
    // IMPORTANT: In production, use MPC setup or a transparent proof system.
    let mut rng = OsRng;
    let (pk, vk) = setup_keys::<DEPTH>(&mut rng).map_err(|_| ApiError::Internal)?;

    let pk_bytes = serialize_pk(&pk).map_err(|_| ApiError::Internal)?;
    let vk_bytes = serialize_vk(&vk).map_err(|_| ApiError::Internal)?;

    std::fs::write(&pk_path, pk_bytes).map_err(|_| ApiError::Internal)?;
    std::fs::write(&vk_path, vk_bytes).map_err(|_| ApiError::Internal)?;

    Ok(ZkKeys { pk: Arc::new(pk), vk: Arc::new(vk) })
}

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub keys: ZkKeys,
    /// The deployed contract. One lock serializes all state transitions, so
    /// event order always matches acceptance order.
    pub greeter: Arc<Mutex<Greeter>>,
}

impl AppState {
    pub fn new(db: Db, keys: ZkKeys, greeter: Greeter) -> Self {
        Self {
            db,
            keys,
            greeter: Arc::new(Mutex::new(greeter)),
        }
    }
}

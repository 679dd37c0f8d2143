use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    store::{Blob, KvStore},
    AppState, VaultError,
};

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Every field is optional here so that a missing one becomes our own 400
/// rather than axum's 422.
#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    pub key: Option<String>,
    pub encrypted: Option<String>,
    pub iv: Option<String>,
}

pub async fn store_secret<S: KvStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<Value>, VaultError> {
    let Ok(Json(body)) = body else {
        return Err(VaultError::Validation("Missing required fields".into()));
    };
    let (Some(key), Some(encrypted), Some(iv)) = (body.key, body.encrypted, body.iv) else {
        return Err(VaultError::Validation("Missing required fields".into()));
    };

    state
        .vault
        .store(&key, Blob::from(encrypted), Blob::from(iv))?;

    info!("secret stored");
    Ok(Json(json!({"success": true})))
}

// ── Retrieve ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RetrieveParams {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub encrypted: Blob,
    pub iv: Blob,
}

/// Fetch-and-destroy. The record is gone once this returns 200.
///
/// A query string that does not deserialize (e.g. a repeated `key`) is
/// treated like a missing key.
pub async fn retrieve_secret<S: KvStore>(
    State(state): State<AppState<S>>,
    params: Result<Query<RetrieveParams>, QueryRejection>,
) -> Result<Json<RetrieveResponse>, VaultError> {
    let Ok(Query(params)) = params else {
        return Err(VaultError::Validation("Missing key".into()));
    };
    let key = params.key.unwrap_or_default();
    let record = state.vault.retrieve(&key)?;

    info!("secret burned after read");
    Ok(Json(RetrieveResponse {
        encrypted: record.encrypted,
        iv: record.iv,
    }))
}

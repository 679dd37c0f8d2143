use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use directories::ProjectDirs;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    handlers::{health, retrieve_secret, store_secret},
    store::{spawn_sweep, KvStore, MemoryStore, RedbStore},
    vault::{Vault, VaultConfig, DEFAULT_TTL},
    AppState,
};

/// Which backing store the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Durable redb file in the data directory.
    #[default]
    Redb,
    /// Process-lifetime map; everything is lost on restart.
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown backend '{other}' (expected redb or memory)")),
        }
    }
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub data_dir: Option<PathBuf>,
    /// Lifetime of an unread secret.
    pub ttl: Duration,
    /// How often expired entries are physically reclaimed.
    pub sweep_interval: Duration,
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("PETI_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PETI_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            backend: std::env::var("PETI_BACKEND")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or_default(),
            data_dir: std::env::var("PETI_DATA_DIR").ok().map(PathBuf::from),
            ttl: parse_ttl(std::env::var("PETI_TTL_SECS").ok().as_deref()),
            sweep_interval: Duration::from_secs(
                std::env::var("PETI_SWEEP_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|&secs: &u64| secs > 0)
                    .unwrap_or(300),
            ),
            cors_origins: std::env::var("PETI_CORS_ORIGINS").ok(),
        }
    }
}

/// Parse `PETI_TTL_SECS`. Unset, unparsable and zero values fall back to
/// [`DEFAULT_TTL`]; a zero TTL would expire every secret as it is stored.
fn parse_ttl(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_TTL;
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!("PETI_TTL_SECS=0 would expire secrets immediately; using the default");
            DEFAULT_TTL
        }
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => {
            warn!(value = %raw, "invalid PETI_TTL_SECS; using the default");
            DEFAULT_TTL
        }
    }
}

/// Resolve the data directory for `peti.db`, creating it if needed.
///
/// An explicit directory (`PETI_DATA_DIR`) wins; otherwise the platform data
/// dir is used (`~/.local/share/peti/`, etc.).
pub fn resolve_data_dir(data_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let path = match data_dir {
        Some(d) => d.clone(),
        None => ProjectDirs::from("", "", "peti")
            .context("could not determine platform data directory")?
            .data_dir()
            .to_owned(),
    };
    std::fs::create_dir_all(&path).context("create data dir")?;
    Ok(path)
}

/// Build the HTTP router for a vault over any backing store.
pub fn router<S: KvStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/vault",
            get(retrieve_secret::<S>).post(store_secret::<S>),
        )
        .with_state(state)
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    if cfg.ttl.is_zero() {
        anyhow::bail!("ttl must be at least one second");
    }
    if cfg.sweep_interval.is_zero() {
        anyhow::bail!("sweep interval must be at least one second");
    }
    let vault_config = VaultConfig {
        ttl: cfg.ttl,
        ..VaultConfig::default()
    };
    info!(ttl_secs = vault_config.ttl.as_secs(), backend = ?cfg.backend, "starting vault");

    let app = match cfg.backend {
        Backend::Redb => {
            let data_dir = resolve_data_dir(cfg.data_dir.as_ref())?;
            info!(data_dir = %data_dir.display(), "using data directory");

            let store = RedbStore::open(&data_dir.join("peti.db")).context("open store")?;
            spawn_sweep(store.clone(), cfg.sweep_interval);
            router(AppState {
                vault: Vault::new(store, vault_config),
            })
        }
        Backend::Memory => {
            info!("using in-memory store; secrets will not survive a restart");
            let store = MemoryStore::new();
            spawn_sweep(store.clone(), cfg.sweep_interval);
            router(AppState {
                vault: Vault::new(store, vault_config),
            })
        }
    };

    let app = app
        .layer(build_cors(cfg.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "peti server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app).await.context("server error")
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<http::HeaderValue> =
                o.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}

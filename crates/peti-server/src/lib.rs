pub mod error;
pub mod handlers;
pub mod server;
pub mod store;
pub mod vault;

pub use error::{StoreError, VaultError};
pub use server::{resolve_data_dir, router, run, Backend, ServerConfig};
pub use vault::{Vault, VaultConfig};

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
    pub vault: Vault<S>,
}

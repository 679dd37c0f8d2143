use std::io::Read;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peti_crypto::{decrypt_message, encrypt_message, hash_password, CryptoError, EncodedSecret};
use peti_server::Backend;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "peti", about = "peti — burn-after-reading encrypted message vault", version)]
struct Cli {
    /// peti server URL (default: http://localhost:8080 or $PETI_SERVER)
    #[arg(long, env = "PETI_SERVER", default_value = "http://localhost:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the vault HTTP server
    Serve {
        /// Port to listen on (default: $PETI_PORT or 8080)
        #[arg(long, env = "PETI_PORT", default_value = "8080")]
        port: u16,
        /// Host to bind (default: $PETI_HOST or 0.0.0.0)
        #[arg(long, env = "PETI_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Backing store: redb or memory (default: $PETI_BACKEND or redb)
        #[arg(long, env = "PETI_BACKEND", default_value = "redb")]
        backend: Backend,
    },
    /// Encrypt a message locally and leave it in the vault
    Seal {
        /// Message text; read from stdin when omitted
        message: Option<String>,
        /// Password (prompted when omitted)
        #[arg(long, env = "PETI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Fetch a message from the vault, destroying it, and decrypt it locally
    Open {
        /// Password (prompted when omitted)
        #[arg(long, env = "PETI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Print the lookup key the vault would index a password under
    Hash {
        /// Password (prompted when omitted)
        #[arg(long, env = "PETI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PETI_LOG_LEVEL")
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            backend,
        } => cmd_serve(host, port, backend).await,

        Commands::Seal { message, password } => {
            let message = match message {
                Some(m) => m,
                None => read_stdin()?,
            };
            let password = resolve_password(password, true)?;
            cmd_seal(&cli.server, &message, &password).await
        }

        Commands::Open { password } => {
            let password = resolve_password(password, false)?;
            cmd_open(&cli.server, &password).await
        }

        Commands::Hash { password } => {
            let password = resolve_password(password, false)?;
            println!("{}", hash_password(&password)?);
            Ok(())
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_serve(host: String, port: u16, backend: Backend) -> Result<()> {
    let cfg = peti_server::ServerConfig {
        host,
        port,
        backend,
        ..Default::default()
    };

    peti_server::run(cfg).await
}

async fn cmd_seal(server: &str, message: &str, password: &str) -> Result<()> {
    let sealed = encrypt_message(message, password).context("encrypt message")?;
    let key = hash_password(password)?;

    let body = serde_json::json!({
        "key": key.as_str(),
        "encrypted": sealed.encrypted,
        "iv": sealed.iv,
    });

    let resp = Client::new()
        .post(vault_url(server))
        .json(&body)
        .send()
        .await
        .context("HTTP request failed")?;

    match resp.status() {
        s if s.is_success() => {
            println!("✓ sealed; it burns on first read or in 24h");
            Ok(())
        }
        StatusCode::CONFLICT => {
            anyhow::bail!("a message already exists for this password; choose a different password")
        }
        status => {
            let text = error_text(resp).await;
            anyhow::bail!("server returned {status}: {text}")
        }
    }
}

async fn cmd_open(server: &str, password: &str) -> Result<()> {
    let key = hash_password(password)?;

    let resp = Client::new()
        .get(vault_url(server))
        .query(&[("key", key.as_str())])
        .send()
        .await
        .context("HTTP request failed")?;

    match resp.status() {
        s if s.is_success() => {
            let secret: EncodedSecret = resp.json().await.context("parse response")?;
            match decrypt_message(&secret.encrypted, &secret.iv, password) {
                Ok(message) => {
                    println!("{message}");
                    Ok(())
                }
                Err(CryptoError::AuthenticationFailure) => {
                    anyhow::bail!("decryption failed: wrong password or corrupted data")
                }
                Err(e) => Err(e).context("decrypt message"),
            }
        }
        StatusCode::NOT_FOUND => {
            anyhow::bail!("no message found (already read, expired, or never stored)")
        }
        status => {
            let text = error_text(resp).await;
            anyhow::bail!("server returned {status}: {text}")
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn vault_url(server: &str) -> String {
    format!("{}/api/vault", server.trim_end_matches('/'))
}

async fn error_text(resp: reqwest::Response) -> String {
    let json: Value = resp.json().await.unwrap_or_default();
    json["error"].as_str().unwrap_or("").to_owned()
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read message from stdin")?;
    Ok(trim_trailing_newline(buf))
}

fn trim_trailing_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

/// Use the supplied password or prompt for one; `confirm` asks twice.
fn resolve_password(password: Option<String>, confirm: bool) -> Result<String> {
    let password = match password {
        Some(p) => p,
        None => {
            let first = rpassword::prompt_password("password: ").context("read password")?;
            if confirm {
                let second =
                    rpassword::prompt_password("confirm password: ").context("read password")?;
                if first != second {
                    anyhow::bail!("passwords do not match");
                }
            }
            first
        }
    };
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    Ok(password)
}

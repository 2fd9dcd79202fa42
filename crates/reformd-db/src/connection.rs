//! SurrealDB connection management.
//!
//! The waitlist talks to SurrealDB over WebSocket: plain `ws` for a
//! sidecar instance, `wss` for a hosted one. Root credentials are
//! optional so a local `--unauthenticated` instance works unchanged.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws, Wss};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Root credentials for SurrealDB.
#[derive(Clone)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port`, optionally prefixed with `ws://` or `wss://`. A bare
    /// address connects without TLS.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Sign in as root when set.
    pub credentials: Option<DbCredentials>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "reformd".into(),
            database: "waitlist".into(),
            credentials: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Plain,
    Tls,
}

/// Split a configured URL into its transport and the address the ws
/// engine expects.
fn endpoint(url: &str) -> (Transport, &str) {
    let url = url.trim().trim_end_matches('/');
    if let Some(address) = url.strip_prefix("wss://") {
        (Transport::Tls, address)
    } else if let Some(address) = url.strip_prefix("ws://") {
        (Transport::Plain, address)
    } else {
        (Transport::Plain, url)
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, sign in when credentials are configured, and select the
    /// signup namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let (transport, address) = endpoint(&config.url);
        info!(
            address,
            tls = transport == Transport::Tls,
            namespace = %config.namespace,
            database = %config.database,
            authenticated = config.credentials.is_some(),
            "Connecting to SurrealDB"
        );

        let db = match transport {
            Transport::Tls => Surreal::new::<Wss>(address).await?,
            Transport::Plain => Surreal::new::<Ws>(address).await?,
        };

        if let Some(credentials) = &config.credentials {
            db.signin(Root {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Connected to SurrealDB");

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

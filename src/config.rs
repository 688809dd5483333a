//! BucketKV - Process Configuration
//! Storage location, listener address and the token signing secret.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::{BucketKvError, Result};

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "bucketkv.redb";

/// Default data directory when `DB_PATH` is unset.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default listening port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Shared HMAC secret used to verify bearer tokens.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret, rejecting an empty one.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(BucketKvError::Config(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }
        Ok(Self(secret))
    }

    /// Raw secret bytes, used as the HMAC key.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Configuration for the BucketKV server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database file.
    pub data_dir: PathBuf,

    /// TCP port the HTTP server listens on.
    pub port: u16,

    /// Address the HTTP server binds to.
    pub bind_addr: IpAddr,

    /// Secret for bearer token verification.
    pub secret: Secret,
}

impl Config {
    /// Create a new Config with a custom data directory and secret.
    pub fn new(data_dir: impl Into<PathBuf>, secret: Secret) -> Self {
        Self {
            data_dir: data_dir.into(),
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            secret,
        }
    }

    /// Set the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Reads `DB_PATH`, `PORT`, `BIND_ADDR` and `JWT_SECRET`. A missing secret is an
    /// error: the server never runs without authentication.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let secret = var("JWT_SECRET").ok_or_else(|| {
            BucketKvError::Config(
                "JWT_SECRET environment variable is not set, refusing to start".to_string(),
            )
        })?;
        let data_dir = var("DB_PATH").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let mut config = Self::new(data_dir, Secret::new(secret)?);

        if let Some(port) = var("PORT") {
            let port = port
                .parse()
                .map_err(|_| BucketKvError::Config(format!("invalid PORT value {port:?}")))?;
            config = config.with_port(port);
        }
        if let Some(addr) = var("BIND_ADDR") {
            let addr = addr
                .parse()
                .map_err(|_| BucketKvError::Config(format!("invalid BIND_ADDR value {addr:?}")))?;
            config = config.with_bind_addr(addr);
        }

        Ok(config)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

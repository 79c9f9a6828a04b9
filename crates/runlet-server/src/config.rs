// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for runlet-server.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// Base directory for extracted code packages
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = get("RUNLET_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let bind = get("RUNLET_BIND").unwrap_or_else(|| "0.0.0.0".to_string());
        let bind_addr: SocketAddr = format!("{}:{}", bind, port)
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress)?;

        let data_dir = get("RUNLET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("runlet"));

        Ok(Self {
            bind_addr,
            data_dir,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The port number is invalid.
    #[error("Invalid port number")]
    InvalidPort,
    /// The bind address is invalid.
    #[error("Invalid bind address")]
    InvalidBindAddress,
}

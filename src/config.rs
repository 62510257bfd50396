//! Configuration Management for TN3270R
//!
//! This module provides the session configuration: which terminal type to
//! announce, whether TN3270E may be negotiated, and the timeouts and buffer
//! sizes used by the connection. Configurations serialize to JSON and can be
//! persisted in a platform-appropriate location.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::lib3270::codes::Tn3270eFunction;

/// Terminal type announced when none is configured
pub const DEFAULT_TERMINAL_TYPE: &str = "IBM-3279-2-E";

/// Settings for one TN3270 session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Terminal type sent in TERMINAL-TYPE IS, e.g. "IBM-3279-2-E"
    pub terminal_type: String,
    /// Accept TN3270E when the host offers it
    pub tn3270e_enabled: bool,
    /// Specific LU to CONNECT to during TN3270E DEVICE-TYPE negotiation
    pub lu_name: Option<String>,
    /// TN3270E functions requested from the host
    pub functions: Vec<Tn3270eFunction>,
    /// Overall budget for reaching 3270 mode
    pub negotiation_timeout_ms: u64,
    /// Budget for establishing the TCP connection
    pub connect_timeout_ms: u64,
    /// Size of each read from the socket
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            terminal_type: DEFAULT_TERMINAL_TYPE.to_string(),
            tn3270e_enabled: true,
            lu_name: None,
            functions: Vec::new(),
            negotiation_timeout_ms: 5_000,
            connect_timeout_ms: 10_000,
            read_buffer_size: 4096,
        }
    }
}

impl SessionConfig {
    /// Create a configuration for the given terminal type with default settings
    pub fn new<S: Into<String>>(terminal_type: S) -> Self {
        Self {
            terminal_type: terminal_type.into(),
            ..Self::default()
        }
    }

    /// Enable or disable TN3270E
    pub fn with_tn3270e(mut self, enabled: bool) -> Self {
        self.tn3270e_enabled = enabled;
        self
    }

    /// Request a specific LU name
    pub fn with_lu_name<S: Into<String>>(mut self, lu_name: S) -> Self {
        self.lu_name = Some(lu_name.into());
        self
    }

    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_millis(self.negotiation_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Check that the configuration can be sent on the wire
    pub fn validate(&self) -> ConfigResult<()> {
        if self.terminal_type.is_empty() || !self.terminal_type.is_ascii() {
            return Err(ConfigError::InvalidParameter {
                parameter: "terminal_type".to_string(),
                value: self.terminal_type.clone(),
                reason: "must be a non-empty ASCII string".to_string(),
            });
        }

        if let Some(lu_name) = &self.lu_name {
            if lu_name.is_empty() || !lu_name.is_ascii() {
                return Err(ConfigError::InvalidParameter {
                    parameter: "lu_name".to_string(),
                    value: lu_name.clone(),
                    reason: "must be a non-empty ASCII string".to_string(),
                });
            }
        }

        if self.read_buffer_size == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "read_buffer_size".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Determine a platform-appropriate default config file path.
/// Priority:
/// 1) TN3270R_CONFIG env var
/// 2) Platform config dir, e.g. ~/.config/tn3270r/session.json
/// 3) Current directory fallback: ./session.json
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var("TN3270R_CONFIG") {
        return PathBuf::from(p);
    }

    match dirs::config_dir() {
        Some(base) => base.join("tn3270r").join("session.json"),
        None => PathBuf::from("session.json"),
    }
}

/// Load and validate a configuration file
pub fn load_config(path: &Path) -> ConfigResult<SessionConfig> {
    let file_error = |error: String| ConfigError::FileError {
        path: path.display().to_string(),
        error,
    };

    let json = fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let config = SessionConfig::from_json(&json).map_err(|e| file_error(e.to_string()))?;
    config.validate()?;

    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load the configuration at `path` if it exists; otherwise return defaults
pub fn load_config_or_default(path: &Path) -> ConfigResult<SessionConfig> {
    if path.exists() {
        load_config(path)
    } else {
        log::debug!("No configuration at {}, using defaults", path.display());
        Ok(SessionConfig::default())
    }
}

/// Save a configuration, creating parent directories as needed
pub fn save_config(config: &SessionConfig, path: &Path) -> ConfigResult<()> {
    let file_error = |error: String| ConfigError::FileError {
        path: path.display().to_string(),
        error,
    };

    let json = config.to_json().map_err(|e| file_error(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| file_error(e.to_string()))?;
        }
    }

    fs::write(path, json).map_err(|e| file_error(e.to_string()))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: TOML file on disk, overridable by environment
//! variables. Policy knobs (`allow_launch`,
//! `allow_attach`, `allowed_root`) gate `createTarget`/`launch`/`attach`
//! in the Session Manager.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::Deserialize;

use crate::lifecycle::LifecycleError;

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8765
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp/dbgd")
}

fn default_lldb_path() -> String {
    "lldb".to_string()
}

fn default_true() -> bool {
    true
}

/// Mirrors the on-disk TOML shape; every field has a spec-mandated
/// default so an empty or missing config file still boots the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: IpAddr,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// When true, `createTarget`/`launch` are permitted.
    #[serde(default = "default_true")]
    pub allow_launch: bool,

    /// When true, `attach` is permitted.
    #[serde(default = "default_true")]
    pub allow_attach: bool,

    /// Targets and attach requests are confined under this root when set.
    #[serde(default)]
    pub allowed_root: Option<PathBuf>,

    #[serde(default = "default_lldb_path")]
    pub lldb_path: String,

    /// Use the in-process simulated engine instead of a real `lldb`
    /// subprocess. Only meaningful when `dbg-engine`'s `test-support`
    /// feature is compiled in.
    #[serde(default)]
    pub use_simulated_engine: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            log_dir: default_log_dir(),
            allow_launch: true,
            allow_attach: true,
            allowed_root: None,
            lldb_path: default_lldb_path(),
            use_simulated_engine: false,
        }
    }
}

impl Config {
    /// Loads `path` if it exists, otherwise starts from defaults; either
    /// way, the `DBG_*` environment variables listed below take final
    /// precedence. This mirrors the layered config/env override pattern
    /// the rest of the pack uses for daemon settings.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, LifecycleError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).map_err(|e| LifecycleError::Config(e.to_string()))?
            }
            _ => Config::default(),
        };

        if let Ok(host) = std::env::var("DBG_SERVER_HOST") {
            config.server_host = host.parse().map_err(|_| LifecycleError::Config(format!("invalid DBG_SERVER_HOST: {host}")))?;
        }
        if let Ok(port) = std::env::var("DBG_SERVER_PORT") {
            config.server_port = port.parse().map_err(|_| LifecycleError::Config(format!("invalid DBG_SERVER_PORT: {port}")))?;
        }
        if let Ok(dir) = std::env::var("DBG_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Ok(flag) = std::env::var("DBG_ALLOW_LAUNCH") {
            config.allow_launch = parse_bool_env(&flag);
        }
        if let Ok(flag) = std::env::var("DBG_ALLOW_ATTACH") {
            config.allow_attach = parse_bool_env(&flag);
        }
        if let Ok(root) = std::env::var("DBG_ALLOWED_ROOT") {
            config.allowed_root = Some(PathBuf::from(root));
        }
        if let Ok(path) = std::env::var("DBG_LLDB_PATH") {
            config.lldb_path = path;
        }
        if let Ok(flag) = std::env::var("DBG_USE_SIMULATED_ENGINE") {
            config.use_simulated_engine = parse_bool_env(&flag);
        }

        Ok(config)
    }

    /// Returns an error unless `path` is the allowed root or lies under
    /// it. Used by `createTarget`/`attach` to enforce the path restriction.
    pub fn check_allowed_root(&self, path: &std::path::Path) -> Result<(), dbg_core::DbgError> {
        let Some(root) = &self.allowed_root else { return Ok(()) };
        let candidate = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());
        if candidate.starts_with(&root) {
            Ok(())
        } else {
            Err(dbg_core::DbgError::target_outside_allowed_root(format!(
                "{} is outside the allowed root {}",
                path.display(),
                root.display()
            )))
        }
    }
}

fn parse_bool_env(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_knobs_default_to_permissive() {
        let config = Config::default();
        assert_eq!(config.server_port, 8765);
        assert_eq!(config.server_host, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(config.allow_launch);
        assert!(config.allow_attach);
    }

    #[test]
    fn loads_from_toml_text() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("dbgd.toml");
        std::fs::write(&path, "server_port = 9999\nallow_launch = true\n").expect("write");
        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.server_port, 9999);
        assert!(config.allow_launch);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(std::path::Path::new("/nonexistent/dbgd.toml"))).expect("load");
        assert_eq!(config.server_port, 8765);
    }

    #[test]
    fn allowed_root_rejects_paths_outside_it() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let mut config = Config::default();
        config.allowed_root = Some(dir.path().to_path_buf());
        assert!(config.check_allowed_root(dir.path()).is_ok());
        assert!(config.check_allowed_root(std::path::Path::new("/etc/passwd")).is_err());
    }
}

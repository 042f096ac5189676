// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_ITERATIONS;
use crate::db;

pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Sqlite {
        path: PathBuf,
    },
    Remote {
        url: String,
        #[serde(default)]
        api_key: Option<String>,
    },
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Sqlite { .. } => "sqlite",
            Backend::Remote { .. } => "remote",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: Backend,
    pub max_login_attempts: u32,
    pub hash_iterations: u32,
}

/// On-disk shape of `config.json`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    backend: Option<Backend>,
    max_login_attempts: Option<u32>,
    hash_iterations: Option<u32>,
}

impl Config {
    pub fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            hash_iterations: DEFAULT_ITERATIONS,
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(db::project_dirs()?.config_dir().join("config.json"))
    }

    /// Defaults, then `config.json` from the platform config dir, then
    /// `MIZAN_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::with_backend(Backend::Sqlite {
            path: db::default_db_path()?,
        });
        let path = Self::config_path()?;
        if path.exists() {
            cfg.merge_file(&path)?;
        }
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Read config {}", path.display()))?;
        let file: FileConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        if let Some(b) = file.backend {
            self.backend = b;
        }
        if let Some(n) = file.max_login_attempts {
            self.max_login_attempts = n;
        }
        if let Some(n) = file.hash_iterations {
            self.hash_iterations = n;
        }
        Ok(())
    }

    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = get("MIZAN_BACKEND") {
            self.backend = match kind.trim().to_lowercase().as_str() {
                "memory" => Backend::Memory,
                "sqlite" => Backend::Sqlite {
                    path: match &self.backend {
                        Backend::Sqlite { path } => path.clone(),
                        _ => db::default_db_path()?,
                    },
                },
                "remote" => Backend::Remote {
                    url: get("MIZAN_REMOTE_URL")
                        .ok_or_else(|| anyhow!("MIZAN_BACKEND=remote needs MIZAN_REMOTE_URL"))?,
                    api_key: None,
                },
                other => bail!("Unknown backend '{}' (use memory|sqlite|remote)", other),
            };
        }
        match &mut self.backend {
            Backend::Sqlite { path } => {
                if let Some(p) = get("MIZAN_DB") {
                    *path = PathBuf::from(p);
                }
            }
            Backend::Remote { url, api_key } => {
                if let Some(u) = get("MIZAN_REMOTE_URL") {
                    *url = u;
                }
                if let Some(k) = get("MIZAN_REMOTE_KEY") {
                    *api_key = Some(k);
                }
            }
            Backend::Memory => {}
        }
        if let Some(n) = get("MIZAN_MAX_LOGIN_ATTEMPTS") {
            self.max_login_attempts = n
                .trim()
                .parse()
                .with_context(|| format!("Invalid MIZAN_MAX_LOGIN_ATTEMPTS '{}'", n))?;
        }
        if let Some(n) = get("MIZAN_HASH_ITERATIONS") {
            self.hash_iterations = n
                .trim()
                .parse()
                .with_context(|| format!("Invalid MIZAN_HASH_ITERATIONS '{}'", n))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_login_attempts == 0 {
            bail!("max_login_attempts must be at least 1");
        }
        if self.hash_iterations == 0 {
            bail!("hash_iterations must be at least 1");
        }
        if let Backend::Remote { url, .. } = &self.backend {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                bail!("Remote store URL must be http(s), got '{}'", url);
            }
        }
        Ok(())
    }
}

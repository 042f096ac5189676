// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Mizan", "mizan"));

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")
}

pub fn default_db_path() -> Result<PathBuf> {
    let proj = project_dirs()?;
    Ok(proj.data_dir().join("mizan.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data dir {}", dir.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS accounts(
        user_id TEXT PRIMARY KEY,
        user_name TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0', -- decimal string, LYD
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        seq INTEGER NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL,
        UNIQUE(user_id, seq),
        FOREIGN KEY(user_id) REFERENCES accounts(user_id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id, seq);
    "#,
    )
}

//! Persistent storage using SQLite (rusqlite)
//!
//! This module provides:
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - The terminal player's profile (handle, channel, direct-message opt-in)
//! - Per-guild command prefixes for the hub

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

/// Current schema version. Bump this when making schema changes.
const SCHEMA_VERSION: u32 = 1;

/// Prefix used by guilds that never set one.
pub const DEFAULT_PREFIX: &str = "!";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("could not determine data directory")]
    NoDataDirectory,
    #[error("database schema version {found} is newer than supported version {supported}")]
    FutureSchemaVersion { found: u32, supported: u32 },
    #[error("failed to create data directory: {0}")]
    CreateDirFailed(std::io::Error),
    #[error("invalid prefix {0:?}")]
    InvalidPrefix(String),
}

/// The terminal player's saved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub handle: Option<String>,
    pub channel: Option<String>,
    pub allow_direct: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            handle: None,
            channel: None,
            allow_direct: true,
        }
    }
}

/// The main storage handle.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// Uses OS-standard directories:
    /// - Linux: `$XDG_DATA_HOME/spyword/` or `~/.local/share/spyword/`
    /// - macOS: `~/Library/Application Support/spyword/`
    pub fn open() -> Result<Self, StorageError> {
        let data_dir = Self::data_dir()?;
        std::fs::create_dir_all(&data_dir).map_err(StorageError::CreateDirFailed)?;

        let conn = Connection::open(data_dir.join("spyword.db"))?;
        let storage = Storage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let storage = Storage {
            conn: Connection::open_in_memory()?,
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "spyword")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    pub fn profile(&self) -> Result<Profile, StorageError> {
        let profile = self
            .conn
            .query_row(
                "SELECT handle, channel, allow_direct FROM profile WHERE id = 1",
                [],
                |row| {
                    Ok(Profile {
                        handle: row.get(0)?,
                        channel: row.get(1)?,
                        allow_direct: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile.unwrap_or_default())
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO profile (id, handle, channel, allow_direct) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                handle = excluded.handle,
                channel = excluded.channel,
                allow_direct = excluded.allow_direct",
            params![profile.handle, profile.channel, profile.allow_direct],
        )?;
        Ok(())
    }

    /// The command prefix for `guild`, or [`DEFAULT_PREFIX`].
    pub fn guild_prefix(&self, guild: &str) -> Result<String, StorageError> {
        let prefix: Option<String> = self
            .conn
            .query_row(
                "SELECT prefix FROM guild_config WHERE guild = ?1",
                params![guild],
                |row| row.get(0),
            )
            .optional()?;
        Ok(prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()))
    }

    /// Store a new prefix for `guild`. Empty or whitespace-bearing prefixes
    /// are rejected since they could never be typed in front of a command.
    pub fn set_guild_prefix(&self, guild: &str, prefix: &str) -> Result<(), StorageError> {
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(StorageError::InvalidPrefix(prefix.to_string()));
        }
        self.conn.execute(
            "INSERT INTO guild_config (guild, prefix) VALUES (?1, ?2)
             ON CONFLICT(guild) DO UPDATE SET prefix = excluded.prefix",
            params![guild, prefix],
        )?;
        Ok(())
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            self.create_schema_v1()?;
        } else if current_version > SCHEMA_VERSION {
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        let table_exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> = self
            .conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| row.get(0))
            .optional()?;

        Ok(version.unwrap_or(0))
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                schema_version INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Single-row table for the local player
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                handle TEXT,
                channel TEXT,
                allow_direct INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS guild_config (
                guild TEXT PRIMARY KEY,
                prefix TEXT NOT NULL
            );
            "#,
        )?;

        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        self.conn.execute(
            "INSERT INTO meta (schema_version, created_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, created_at],
        )?;

        Ok(())
    }
}

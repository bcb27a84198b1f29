//! Single-file JSON backend.
//!
//! All games live in one versioned archive that is rewritten on every save
//! (write to a temporary sibling, then rename over the original).

use super::{find_index, sort_newest_first, GameStore, StoreError, StoreResult};
use crate::types::Game;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Schema version for archive format compatibility
/// Version 1: games with completed rounds, penalties and rules
/// Version 2: open round persisted alongside the game (phase, bomb, cloud)
pub const ARCHIVE_SCHEMA_VERSION: u32 = 2;

/// On-disk snapshot of every stored game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameArchive {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub games: Vec<Game>,
}

impl GameArchive {
    pub fn new(games: Vec<Game>) -> Self {
        Self {
            schema_version: ARCHIVE_SCHEMA_VERSION,
            saved_at: Utc::now(),
            games,
        }
    }

    /// Refuse archives written by a newer version of the app
    pub fn validate(&self) -> StoreResult<()> {
        if self.schema_version > ARCHIVE_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: self.schema_version,
                supported: ARCHIVE_SCHEMA_VERSION,
            });
        }
        Ok(())
    }
}

/// Archive file as found on disk; early versions stored a bare list of games
#[derive(Deserialize)]
#[serde(untagged)]
enum ArchiveFile {
    Versioned(GameArchive),
    Bare(Vec<Game>),
}

pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the archive
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_games(&self) -> StoreResult<Vec<Game>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<ArchiveFile>(&raw)? {
            ArchiveFile::Versioned(archive) => {
                archive.validate()?;
                Ok(archive.games)
            }
            ArchiveFile::Bare(games) => {
                tracing::info!(
                    "Reading unversioned archive {}; it will be upgraded on next save",
                    self.path.display()
                );
                Ok(games)
            }
        }
    }

    async fn write_games(&self, games: Vec<Game>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&GameArchive::new(games))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl GameStore for FileStore {
    async fn save_game(&self, game: &Game) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut games = self.read_games().await?;
        match find_index(&games, &game.id) {
            Some(index) => games[index] = game.clone(),
            None => games.push(game.clone()),
        }
        self.write_games(games).await?;
        tracing::debug!("Saved game {} to {}", game.id, self.path.display());
        Ok(())
    }

    async fn load_games(&self) -> StoreResult<Vec<Game>> {
        let _guard = self.lock.lock().await;
        let mut games = self.read_games().await?;
        sort_newest_first(&mut games);
        Ok(games)
    }

    async fn load_game(&self, id: &str) -> StoreResult<Option<Game>> {
        let _guard = self.lock.lock().await;
        let games = self.read_games().await?;
        Ok(games.into_iter().find(|g| g.id == id))
    }

    async fn delete_game(&self, id: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut games = self.read_games().await?;
        let before = games.len();
        games.retain(|g| g.id != id);
        if games.len() != before {
            self.write_games(games).await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

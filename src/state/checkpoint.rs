use crate::utils::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ratings,
    Watchlist,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Ratings => write!(f, "ratings"),
            Category::Watchlist => write!(f, "watchlist"),
        }
    }
}

/// Title ids already submitted, per category, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub ratings: Vec<String>,
    #[serde(default)]
    pub watchlist: Vec<String>,
}

impl Checkpoint {
    pub fn ids(&self, category: Category) -> &[String] {
        match category {
            Category::Ratings => &self.ratings,
            Category::Watchlist => &self.watchlist,
        }
    }

    pub fn contains(&self, category: Category, title_id: &str) -> bool {
        self.ids(category).iter().any(|id| id == title_id)
    }

    /// Appends `title_id` unless it is already recorded. Returns whether it was added.
    pub fn record(&mut self, category: Category, title_id: &str) -> bool {
        if self.contains(category, title_id) {
            return false;
        }
        let ids = match category {
            Category::Ratings => &mut self.ratings,
            Category::Watchlist => &mut self.watchlist,
        };
        ids.push(title_id.to_string());
        true
    }
}

pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing, unreadable or corrupt file yields an empty checkpoint.
    pub fn load(&self) -> Checkpoint {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No checkpoint yet, starting fresh");
                return Checkpoint::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Checkpoint unreadable, starting fresh");
                return Checkpoint::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Already processed file broken, starting fresh");
                Checkpoint::default()
            }
        }
    }

    /// Writes to a sibling temp file and renames it over the checkpoint.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let tmp_path = self.tmp_path();

        let write = || -> Result<()> {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, checkpoint)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            std::fs::rename(&tmp_path, &self.path)?;
            Ok(())
        };

        write().map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            TransferError::CheckpointError(format!("{}: {}", self.path.display(), e))
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

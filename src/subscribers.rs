use miette::{IntoDiagnostic, Result};
use serde::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use teloxide::types::ChatId;

/// Outcome of a subscription toggle.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    lc_auto_daily_ids: Vec<String>,
}

/// Durable set of chats subscribed to the daily push.
///
/// Backed by a flat JSON file that is rewritten after every toggle and
/// never otherwise. Membership keeps insertion order; fan-out iterates a
/// snapshot taken with [`SubscriberStore::all`].
#[derive(Debug)]
pub struct SubscriberStore {
    path: PathBuf,
    ids: Vec<ChatId>,
}

impl SubscriberStore {
    /// Reads the persisted subscriber set. Never fails: a missing file is
    /// seeded empty, an unreadable or corrupt one degrades to an empty
    /// set with a warning.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let ids = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<StoreFile>(&raw) {
                Ok(file) => parse_ids(file.lc_auto_daily_ids),
                Err(error) => {
                    log::warn!(
                        "Subscriber store {} is corrupt, starting empty: {error}",
                        path.display()
                    );
                    Vec::new()
                }
            },
            Err(error) if error.kind() == ErrorKind::NotFound => {
                if let Err(error) = seed_empty_store(&path) {
                    log::warn!(
                        "Could not seed subscriber store {}: {error}",
                        path.display()
                    );
                }
                Vec::new()
            }
            Err(error) => {
                log::warn!(
                    "Could not read subscriber store {}, starting empty: {error}",
                    path.display()
                );
                Vec::new()
            }
        };

        log::debug!("Loaded {} subscriber(s) from {}", ids.len(), path.display());
        Self { path, ids }
    }

    /// Flips the membership of `chat_id` and persists the new set before
    /// returning. A persist failure propagates; the in-memory mutation
    /// stands (no rollback).
    pub fn toggle(&mut self, chat_id: ChatId) -> Result<Toggle> {
        let toggle = match self.ids.iter().position(|&id| id == chat_id) {
            Some(position) => {
                self.ids.remove(position);
                Toggle::Removed
            }
            None => {
                self.ids.push(chat_id);
                Toggle::Added
            }
        };
        self.persist()?;
        Ok(toggle)
    }

    /// Snapshot of the current membership, in subscription order.
    pub fn all(&self) -> Vec<ChatId> {
        self.ids.clone()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let file = StoreFile {
            lc_auto_daily_ids: self.ids.iter().map(|id| id.to_string()).collect(),
        };
        let raw = serde_json::to_string_pretty(&file).into_diagnostic()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        fs::write(&self.path, raw).into_diagnostic()
    }
}

fn parse_ids(raw_ids: Vec<String>) -> Vec<ChatId> {
    raw_ids
        .into_iter()
        .filter_map(|raw| match raw.parse::<i64>() {
            Ok(id) => Some(ChatId(id)),
            Err(_) => {
                log::warn!("Skipping unparsable subscriber id {raw:?}");
                None
            }
        })
        .collect()
}

fn seed_empty_store(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, "{}")
}

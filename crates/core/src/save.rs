//! Save-game persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{models::World, state::GameState};

/// Metadata describing a persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveEntry {
    /// Absolute path to the save file on disk.
    pub path: PathBuf,
    /// Human readable save name.
    pub name: String,
    /// Name of the trader in the save.
    pub player: String,
    /// Day the save was taken on.
    pub day: u32,
    /// Timestamp when the save was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Serialized representation of a save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    name: String,
    saved_at: DateTime<Utc>,
    state: GameState,
}

impl SavePayload {
    fn new(name: Option<&str>, state: GameState) -> Self {
        let display_name = name
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .unwrap_or_else(|| state.player.name.clone());
        Self {
            name: display_name,
            saved_at: Utc::now(),
            state,
        }
    }

    /// Consume the payload and return the stored game state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Borrow the stored game state without consuming the payload.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Display name of the save.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn entry(&self, path: PathBuf) -> SaveEntry {
        SaveEntry {
            path,
            name: self.name.clone(),
            player: self.state.player.name.clone(),
            day: self.state.current_day,
            updated_at: self.saved_at,
        }
    }
}

/// Manager responsible for loading and writing save files.
#[derive(Debug, Clone)]
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the save files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return all readable saves sorted by timestamp (most recent first).
    pub fn entries(&self) -> Result<Vec<SaveEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).context("failed to read save directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match self.read_payload(entry.path()) {
                Ok(payload) => entries.push(payload.entry(entry.path())),
                Err(err) => {
                    warn!("Failed to read save {:?}: {err:#}", entry.path());
                }
            }
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    /// Write a new save file for `state` and return its entry.
    pub fn create_save(&self, name: Option<&str>, state: GameState) -> Result<SaveEntry> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let payload = SavePayload::new(name, state);
        let file_name = format!(
            "{}_{}.json",
            sanitize_component(&payload.name),
            payload.saved_at.format("%Y%m%d%H%M%S%3f")
        );
        let path = self.root.join(file_name);
        self.write_payload(&path, &payload)?;
        info!(path = %path.display(), day = payload.state.current_day, "Save created");

        Ok(payload.entry(path))
    }

    /// Overwrite an existing save with updated state, keeping its name.
    pub fn update_save(&self, entry: &SaveEntry, state: GameState) -> Result<SaveEntry> {
        let mut payload = self.read_payload(&entry.path)?;
        payload.state = state;
        payload.saved_at = Utc::now();
        self.write_payload(&entry.path, &payload)?;
        Ok(payload.entry(entry.path.clone()))
    }

    /// Load payload for the provided entry.
    pub fn load(&self, entry: &SaveEntry) -> Result<SavePayload> {
        self.read_payload(&entry.path)
    }

    /// Load and validate the world stored in `entry`.
    pub fn load_world(&self, entry: &SaveEntry) -> Result<World> {
        let payload = self.load(entry)?;
        let world = payload
            .into_state()
            .into_world()
            .with_context(|| format!("save {} is incompatible", entry.path.display()))?;
        Ok(world)
    }

    /// Load most recent save entry, if any.
    pub fn latest(&self) -> Result<Option<SaveEntry>> {
        let entries = self.entries()?;
        Ok(entries.into_iter().next())
    }

    fn write_payload(&self, path: &Path, payload: &SavePayload) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised = serde_json::to_vec_pretty(payload)?;
        fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
    }

    fn read_payload(&self, path: impl AsRef<Path>) -> Result<SavePayload> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(payload)
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "save".to_string()
    } else {
        result
    }
}

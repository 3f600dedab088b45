use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Station id to display name, persisted as a JSON object.
///
/// The file is read once by [`FavoritesStore::load`] and rewritten in full on
/// every toggle.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FavoritesStore {
    /// Reads the favorites file. A missing or unreadable file yields an empty
    /// store.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("could not load favorites from {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no favorites file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("could not load favorites from {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        FavoritesStore { path, entries }
    }

    pub fn save(&self) -> Result<(), FavoritesError> {
        let content = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, content).map_err(|source| FavoritesError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Adds the station if absent, removes it otherwise, then persists.
    /// A failed save is logged and does not undo the toggle.
    pub fn toggle(&mut self, station_id: &str, name: &str) -> Toggle {
        let outcome = if self.entries.remove(station_id).is_some() {
            Toggle::Removed
        } else {
            self.entries
                .insert(station_id.to_owned(), name.to_owned());
            Toggle::Added
        };

        if let Err(e) = self.save() {
            warn!("could not save favorites: {}", e);
        }

        outcome
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.entries.contains_key(station_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

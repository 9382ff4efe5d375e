use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationDirectoryError {
    #[error("failed to read station file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid station file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct StationEntry {
    id: String,
}

/// Station id to display name lookup, loaded once at startup and shared read-only.
#[derive(Debug, Default, Clone)]
pub struct StationDirectory {
    names: HashMap<String, String>,
}

impl StationDirectory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StationDirectoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StationDirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses the `{ "<display name>": { "id": "<station id>", ... } }` layout.
    /// When several names share an id, the first one in the file wins.
    pub fn from_json(raw: &str) -> Result<Self, StationDirectoryError> {
        let entries: IndexMap<String, StationEntry> = serde_json::from_str(raw)?;
        Ok(Self::from_pairs(
            entries.into_iter().map(|(name, entry)| (entry.id, name)),
        ))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut names: HashMap<String, String> = HashMap::new();
        for (id, name) in pairs {
            names.entry(id.into()).or_insert_with(|| name.into());
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical name, or the id itself for unknown stations.
    pub fn display_name<'a>(&'a self, station_id: &'a str) -> &'a str {
        self.names
            .get(station_id)
            .map(String::as_str)
            .unwrap_or(station_id)
    }

    /// Name as shown in notification text: "ANKARA GAR, Ankara" -> "Ankara gar".
    pub fn short_name(&self, station_id: &str) -> String {
        let name = self.display_name(station_id);
        let base = name.split(',').next().unwrap_or(name).trim().to_lowercase();
        let mut chars = base.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

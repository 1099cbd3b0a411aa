use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::RoomPosition;

pub const ROSTER_FILE_NAME: &str = "patrons.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct PatronId(String);

impl PatronId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One roster entry. Image fields are opaque asset identifiers and are never
/// resolved by the engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patron {
    pub id: PatronId,
    pub name: String,
    pub dialog_text: String,
    #[serde(default)]
    pub floor: Option<u32>,
    #[serde(default)]
    pub room_number: Option<u32>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub npc_image: Option<String>,
    #[serde(default)]
    pub item_image: Option<String>,
    #[serde(default)]
    pub poster_image: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub join_date: Option<String>,
    #[serde(default)]
    pub special_notes: Option<String>,
}

impl Patron {
    /// Requested room, only when both floor and room are given.
    pub fn explicit_placement(&self) -> Option<RoomPosition> {
        match (self.floor, self.room_number) {
            (Some(floor), Some(room)) => Some(RoomPosition { floor, room }),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse roster at '{field}': {source}")]
    Parse {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate patron id '{id}' at roster index {index}")]
    DuplicateId { id: PatronId, index: usize },
    #[error("patron at roster index {index} has an empty id")]
    EmptyId { index: usize },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RosterFile {
    patrons: Vec<Patron>,
}

/// Ordered, validated patron list. Input order drives placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    patrons: Vec<Patron>,
}

impl Roster {
    pub fn new(patrons: Vec<Patron>) -> Result<Self, RosterError> {
        let mut seen = HashSet::with_capacity(patrons.len());
        for (index, patron) in patrons.iter().enumerate() {
            if patron.id.as_str().trim().is_empty() {
                return Err(RosterError::EmptyId { index });
            }
            if !seen.insert(patron.id.as_str()) {
                return Err(RosterError::DuplicateId {
                    id: patron.id.clone(),
                    index,
                });
            }
        }
        Ok(Self { patrons })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RosterError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let file: RosterFile =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                let field = error.path().to_string();
                RosterError::Parse {
                    field,
                    source: error.into_inner(),
                }
            })?;
        Self::new(file.patrons)
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = fs::read_to_string(path).map_err(|source| RosterError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            patron_count = roster.len(),
            "roster_loaded"
        );
        Ok(roster)
    }

    pub fn patrons(&self) -> &[Patron] {
        &self.patrons
    }

    pub fn get(&self, index: usize) -> Option<&Patron> {
        self.patrons.get(index)
    }

    pub fn len(&self) -> usize {
        self.patrons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patrons.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.patrons
            .iter()
            .position(|patron| patron.id.as_str() == id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Patron> {
        self.index_of(id).and_then(|index| self.patrons.get(index))
    }
}

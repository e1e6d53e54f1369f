//! Participant roster.
//!
//! Ids are student registration numbers; lookups ignore case.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Registration number, e.g. `ZS24000001`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Academic programme.
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub semester: Option<u8>,
    #[serde(default)]
    pub sex: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            program: None,
            semester: None,
            sex: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    participants: Vec<Participant>,
}

/// In-memory roster keyed by normalised id.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<String, Participant>,
}

fn normalize(id: &str) -> String {
    id.trim().to_uppercase()
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a roster from a TOML file with a `[[participants]]` array.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster: {}", path.display()))?;
        let file: RosterFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        let mut registry = Self::new();
        for participant in file.participants {
            registry
                .register(participant)
                .with_context(|| format!("invalid roster: {}", path.display()))?;
        }
        tracing::debug!(count = registry.len(), "roster loaded");
        Ok(registry)
    }

    pub fn register(&mut self, participant: Participant) -> Result<(), RegistryError> {
        let key = normalize(&participant.id);
        if key.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.participants.contains_key(&key) {
            return Err(RegistryError::Duplicate(participant.id));
        }
        self.participants.insert(key, participant);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(&normalize(id))
    }

    /// Like [`get`](Self::get) but an unknown id is an error.
    pub fn require(&self, id: &str) -> Result<&Participant, RegistryError> {
        self.get(id)
            .ok_or_else(|| RegistryError::Unknown(id.trim().to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(&normalize(id))
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        let mut all: Vec<&Participant> = self.participants.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all.into_iter()
    }
}

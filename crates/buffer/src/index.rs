//! Filename index
//!
//! Maps a source filename to the identities of buffered envelopes whose
//! exception stack frames reference it. Kept in step with the ring by
//! [`EnvelopeBuffer`](crate::EnvelopeBuffer): inserted on put, removed on
//! eviction, dropped on clear or reset.

use std::collections::{HashMap, HashSet};

use spotlight_envelope::{EnvelopeUnit, Uuid};

/// Filename to envelope identities
#[derive(Debug, Default)]
pub struct FilenameIndex {
    files: HashMap<String, HashSet<Uuid>>,
}

impl FilenameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every file the unit references
    pub fn insert(&mut self, unit: &EnvelopeUnit) {
        for file in unit.filenames() {
            self.files.entry(file.to_owned()).or_default().insert(unit.id());
        }
    }

    /// Forget the unit, dropping files that no longer have any envelope
    pub fn remove(&mut self, unit: &EnvelopeUnit) {
        let id = unit.id();
        for file in unit.filenames() {
            if let Some(ids) = self.files.get_mut(file) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.files.remove(file);
                }
            }
        }
    }

    /// Identities of envelopes referencing a file whose name ends with `suffix`
    pub fn ids_matching(&self, suffix: &str) -> HashSet<Uuid> {
        self.files
            .iter()
            .filter(|(file, _)| file.ends_with(suffix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Number of distinct files indexed
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;

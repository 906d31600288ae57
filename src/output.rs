use serde::{Deserialize, Serialize};

use crate::checklist::Attribution;

/// One species with every synonym resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub english_name: String,
    pub latin_name: String,
    pub avibase_id: String,
    /// Sorted and deduplicated.
    pub synonyms: Vec<String>,
}

/// The result of a run, and the unit that gets memoized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub entries: Vec<OutputEntry>,
    pub attributions: Vec<Attribution>,
}

impl Output {
    pub fn species_count(&self) -> usize {
        self.entries.len()
    }

    pub fn synonym_count(&self) -> usize {
        self.entries.iter().map(|e| e.synonyms.len()).sum()
    }

    pub fn find(&self, avibase_id: &str) -> Option<&OutputEntry> {
        self.entries.iter().find(|e| e.avibase_id == avibase_id)
    }
}

use std::collections::{BTreeSet, HashMap};

use super::scheme::SynonymScheme;
use super::types::{SynonymOutcome, SynonymResponse};
use crate::checklist::AvibaseEntry;
use crate::output::OutputEntry;

struct Merged {
    entry: AvibaseEntry,
    synonyms: BTreeSet<String>,
}

/// Fold responses into one entry per identifier.
///
/// Identifiers keep the order of their first successful response. Synonyms
/// from every successful response are unioned, trimmed and sorted; the
/// species' own latin name is dropped. Failed responses contribute nothing,
/// so an identifier whose lookups all failed is absent from the result.
pub fn merge_responses<S: SynonymScheme + ?Sized>(
    scheme: &S,
    responses: &[SynonymResponse],
) -> Vec<OutputEntry> {
    let mut merged: Vec<Merged> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for response in responses {
        let SynonymOutcome::Fetched(body) = &response.outcome else {
            continue;
        };
        let entry = &response.request.entry;
        let slot = *slots.entry(entry.avibase_id.as_str()).or_insert_with(|| {
            merged.push(Merged {
                entry: entry.clone(),
                synonyms: BTreeSet::new(),
            });
            merged.len() - 1
        });

        let target = &mut merged[slot];
        for synonym in scheme.extract_synonyms(&response.request, body) {
            let synonym = synonym.trim();
            if !synonym.is_empty() && synonym != target.entry.latin_name {
                target.synonyms.insert(synonym.to_string());
            }
        }
    }

    merged
        .into_iter()
        .map(|m| OutputEntry {
            english_name: m.entry.english_name,
            latin_name: m.entry.latin_name,
            avibase_id: m.entry.avibase_id,
            synonyms: m.synonyms.into_iter().collect(),
        })
        .collect()
}

//! How species map to synonym lookups and how synonyms are read back.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::types::{SynonymRequest, DEFAULT_LANGUAGES, SPECIES_PATH};
use crate::checklist::AvibaseEntry;
use crate::errors::RosterError;

static SYNONYM_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".synonyms li, .synonyms td").expect("valid synonym selector")
});

/// Pluggable lookup scheme. Both methods must be deterministic.
pub trait SynonymScheme: Send + Sync {
    /// One or more lookups for a species.
    fn requests_for(&self, entry: &AvibaseEntry) -> Vec<SynonymRequest>;

    /// Raw synonym values found in a fetched body.
    fn extract_synonyms(&self, request: &SynonymRequest, body: &str) -> Vec<String>;
}

/// Lookups for every entry, flattened in entry order.
pub fn generate_requests<S: SynonymScheme + ?Sized>(
    scheme: &S,
    entries: &[AvibaseEntry],
) -> Vec<SynonymRequest> {
    entries
        .iter()
        .flat_map(|entry| scheme.requests_for(entry))
        .collect()
}

/// Avibase species pages, one request per language.
#[derive(Debug, Clone)]
pub struct AvibaseSynonyms {
    species_url: Url,
    languages: Vec<String>,
}

impl AvibaseSynonyms {
    /// An empty language list falls back to English only.
    pub fn new(base: &Url, languages: Vec<String>) -> Result<Self, RosterError> {
        let species_url = base
            .join(SPECIES_PATH)
            .map_err(|source| RosterError::InvalidUrl {
                url: base.to_string(),
                source,
            })?;
        let languages = if languages.is_empty() {
            DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect()
        } else {
            languages
        };
        Ok(Self {
            species_url,
            languages,
        })
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    fn species_url(&self, avibase_id: &str, language: &str) -> Url {
        let mut url = self.species_url.clone();
        url.query_pairs_mut()
            .append_pair("lang", language)
            .append_pair("avibaseid", avibase_id)
            .append_pair("sec", "synonyms");
        url
    }
}

impl SynonymScheme for AvibaseSynonyms {
    fn requests_for(&self, entry: &AvibaseEntry) -> Vec<SynonymRequest> {
        self.languages
            .iter()
            .map(|language| SynonymRequest {
                entry: entry.clone(),
                url: self.species_url(&entry.avibase_id, language),
            })
            .collect()
    }

    fn extract_synonyms(&self, _request: &SynonymRequest, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);
        document
            .select(&SYNONYM_SELECTOR)
            .flat_map(|element| {
                element
                    .text()
                    .collect::<String>()
                    .split(',')
                    .map(|name| name.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> AvibaseEntry {
        AvibaseEntry {
            english_name: "Mallard".to_string(),
            latin_name: "Anas platyrhynchos".to_string(),
            avibase_id: id.to_string(),
        }
    }

    fn base() -> Url {
        Url::parse("http://avibase.bsc-eoc.org/").unwrap()
    }

    #[test]
    fn test_one_request_per_language() {
        let scheme =
            AvibaseSynonyms::new(&base(), vec!["EN".to_string(), "FR".to_string()]).unwrap();
        let requests = scheme.requests_for(&entry("A1B2C3D4"));

        let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://avibase.bsc-eoc.org/species.jsp?lang=EN&avibaseid=A1B2C3D4&sec=synonyms",
                "http://avibase.bsc-eoc.org/species.jsp?lang=FR&avibaseid=A1B2C3D4&sec=synonyms",
            ]
        );
        assert!(requests.iter().all(|r| r.avibase_id() == "A1B2C3D4"));
    }

    #[test]
    fn test_default_language() {
        let scheme = AvibaseSynonyms::new(&base(), Vec::new()).unwrap();
        assert_eq!(scheme.languages(), ["EN".to_string()]);
    }

    #[test]
    fn test_generate_requests_keeps_entry_order() {
        let scheme =
            AvibaseSynonyms::new(&base(), vec!["EN".to_string(), "DE".to_string()]).unwrap();
        let entries = vec![entry("000A"), entry("000B")];
        let ids: Vec<String> = generate_requests(&scheme, &entries)
            .iter()
            .map(|r| r.avibase_id().to_string())
            .collect();
        assert_eq!(ids, vec!["000A", "000A", "000B", "000B"]);
    }

    #[test]
    fn test_extract_synonyms() {
        let scheme = AvibaseSynonyms::new(&base(), Vec::new()).unwrap();
        let request = scheme.requests_for(&entry("A1B2C3D4")).remove(0);
        let body = "<html><body>\
            <ul class=\"synonyms\"><li>Anas boschas</li><li> Anas platyrhyncha , Anas domestica </li><li> </li></ul>\
            <ul><li>Not a synonym</li></ul>\
            </body></html>";

        assert_eq!(
            scheme.extract_synonyms(&request, body),
            vec!["Anas boschas", "Anas platyrhyncha", "Anas domestica"]
        );
    }
}

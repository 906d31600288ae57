#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use avibase_rosters::checklist::{checklist_url, AvibaseEntry};
use avibase_rosters::client::HttpResponse;
use avibase_rosters::errors::TransportError;
use avibase_rosters::{AvibaseSynonyms, SynonymScheme, Transport};
use chrono::{DateTime, TimeZone, Utc};
use url::Url;

pub const BASE: &str = "http://avibase.test/";

pub fn base_url() -> Url {
    Url::parse(BASE).unwrap()
}

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn scheme() -> AvibaseSynonyms {
    AvibaseSynonyms::new(&base_url(), Vec::new()).unwrap()
}

pub struct Species {
    pub english: String,
    pub latin: String,
    pub id: String,
    pub rare: bool,
}

impl Species {
    pub fn new(english: &str, latin: &str, id: &str, rare: bool) -> Self {
        Self {
            english: english.to_string(),
            latin: latin.to_string(),
            id: id.to_string(),
            rare,
        }
    }

    pub fn entry(&self) -> AvibaseEntry {
        AvibaseEntry {
            english_name: self.english.clone(),
            latin_name: self.latin.clone(),
            avibase_id: self.id.clone(),
        }
    }
}

pub fn checklist_page(region: &str, species: &[Species]) -> String {
    let rows: String = species
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td><a href=\"species.jsp?lang=EN&amp;avibaseid={}\"><i>{}</i></a></td><td>{}</td></tr>",
                s.english,
                s.id,
                s.latin,
                if s.rare { "Rare" } else { "" }
            )
        })
        .collect();
    format!(
        "<html><head><title>Avibase checklist {region}</title></head><body>\
         <table><tr><td colspan=\"3\">Anseriformes</td></tr>{rows}</table></body></html>"
    )
}

pub fn synonym_page(names: &[&str]) -> String {
    let items: String = names.iter().map(|n| format!("<li>{n}</li>")).collect();
    format!("<html><body><ul class=\"synonyms\">{items}</ul></body></html>")
}

/// Canned responses by exact URL; anything else is a 404. Every request is
/// recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, (u16, Option<String>, Vec<u8>)>>,
    unreachable: Mutex<Vec<String>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &Url, status: u16, body: impl Into<Vec<u8>>) {
        self.route_with_type(url, status, Some("text/html; charset=utf-8"), body);
    }

    pub fn route_with_type(
        &self,
        url: &Url,
        status: u16,
        content_type: Option<&str>,
        body: impl Into<Vec<u8>>,
    ) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            (status, content_type.map(str::to_string), body.into()),
        );
    }

    pub fn unreachable(&self, url: &Url) {
        self.unreachable.lock().unwrap().push(url.to_string());
    }

    pub fn checklist(&self, region: &str, species: &[Species]) {
        let url = checklist_url(&base_url(), region).unwrap();
        self.route(&url, 200, checklist_page(region, species));
    }

    /// Synonym pages for every lookup the default scheme issues for `species`.
    pub fn synonyms(&self, species: &Species, names: &[&str]) {
        for request in scheme().requests_for(&species.entry()) {
            self.route(&request.url, 200, synonym_page(names));
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());

        if self.unreachable.lock().unwrap().contains(&url.to_string()) {
            return Err(TransportError::Request {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let route = self.routes.lock().unwrap().get(url.as_str()).cloned();
        Ok(match route {
            Some((status, content_type, body)) => HttpResponse {
                status,
                status_text: if status == 200 { "OK" } else { "Error" }.to_string(),
                content_type,
                body,
            },
            None => HttpResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                content_type: None,
                body: Vec::new(),
            },
        })
    }
}

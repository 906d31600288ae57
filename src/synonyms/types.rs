//! Type definitions for the synonym lookup stage.

use tokio::time::Duration;
use url::Url;

use crate::checklist::AvibaseEntry;

pub const MAX_CONCURRENT_REQUESTS: usize = 10;
pub const ALLOWED_ERROR_PROPORTION: f64 = 0.01;
pub const MAX_ATTEMPTS: usize = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

pub const SPECIES_PATH: &str = "species.jsp";
pub const DEFAULT_LANGUAGES: &[&str] = &["EN"];

/// One outbound synonym lookup for a species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymRequest {
    pub entry: AvibaseEntry,
    pub url: Url,
}

impl SynonymRequest {
    pub fn avibase_id(&self) -> &str {
        &self.entry.avibase_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynonymOutcome {
    Fetched(String),
    Failed(String),
}

impl SynonymOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SynonymOutcome::Failed(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            SynonymOutcome::Failed(reason) => Some(reason),
            SynonymOutcome::Fetched(_) => None,
        }
    }
}

/// A request paired with what came back for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymResponse {
    pub request: SynonymRequest,
    pub outcome: SynonymOutcome,
}

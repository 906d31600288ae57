//! Type definitions for the checklist module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROOT_URL: &str = "http://avibase.bsc-eoc.org/";
pub const CHECKLIST_PATH: &str = "checklist.jsp";
pub const REGION_PARAM: &str = "region";

pub const AUTHOR: &str = "Avibase - Denis LePage";
/// Names the tool that produced the record: package name and version.
pub const SCRAPING_METHODOLOGY: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
pub const CONTEXT: &str =
    "Scraped the Avibase Website to list the set of birds that can be found in a given region.";

/// Species rows have exactly this many cells. Anything else is decoration.
pub const SPECIES_ROW_CELLS: usize = 3;

/// One species row read from a checklist table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvibaseEntry {
    pub english_name: String,
    pub latin_name: String,
    pub avibase_id: String,
}

/// Provenance record for one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub origin_url: String,
    pub collected_at: DateTime<Utc>,
    pub original_title: String,
    pub author: String,
    pub author_url: String,
    pub scraping_methodology: String,
    pub context: Vec<String>,
}

/// How rows are filtered and how malformed rows are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub include_rare: bool,
    /// Skip rows whose identifier cannot be recovered instead of failing.
    pub skip_malformed_rows: bool,
}

/// Everything one region contributes to a run.
#[derive(Debug, Clone)]
pub struct RegionChecklist {
    pub region: String,
    pub entries: Vec<AvibaseEntry>,
    pub attribution: Attribution,
    pub skipped_rows: usize,
}

impl RegionChecklist {
    /// One-line progress report, e.g. `US-NY: 412 entries`.
    pub fn summary(&self) -> String {
        if self.skipped_rows == 0 {
            format!("{}: {} entries", self.region, self.entries.len())
        } else {
            format!(
                "{}: {} entries, skipped {} unreadable rows",
                self.region,
                self.entries.len(),
                self.skipped_rows
            )
        }
    }
}

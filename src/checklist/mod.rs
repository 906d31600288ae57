//! Checklist processing for Avibase regions.
//!
//! This module fetches a region's checklist page, extracts its species rows,
//! and records where and when the page was collected.

mod attribution;
mod fetcher;
mod parser;
mod types;

pub use self::types::*;

pub use self::attribution::build_attribution;
pub use self::fetcher::{checklist_url, fetch_region, read_checklist};
pub use self::parser::{extract_entries, is_rare, parse_avibase_id, Extraction};

//! Per-region checklist retrieval.

use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use super::attribution::build_attribution;
use super::parser::extract_entries;
use super::types::{ExtractOptions, RegionChecklist, CHECKLIST_PATH, REGION_PARAM};
use crate::client::Transport;
use crate::errors::RosterError;
use crate::TARGET_WEB_REQUEST;

/// `<base>/checklist.jsp?region=<code>`
pub fn checklist_url(base: &Url, region: &str) -> Result<Url, RosterError> {
    let mut url = base
        .join(CHECKLIST_PATH)
        .map_err(|source| RosterError::InvalidUrl {
            url: base.to_string(),
            source,
        })?;
    url.query_pairs_mut().append_pair(REGION_PARAM, region);
    Ok(url)
}

/// Fetch one region's checklist and extract its entries.
///
/// A transport failure, a non-200 status, or a body with no markup in it
/// fails the region. Bytes invalid in the page's charset are replaced rather
/// than rejected. `clock` is read once the page has arrived.
pub async fn fetch_region<T: Transport>(
    transport: &T,
    base: &Url,
    region: &str,
    options: ExtractOptions,
    clock: fn() -> DateTime<Utc>,
) -> Result<RegionChecklist, RosterError> {
    let url = checklist_url(base, region)?;
    info!(target: TARGET_WEB_REQUEST, "Loading checklist for {} from {}", region, url);

    let response = transport.get(&url).await?;
    if !response.is_success() {
        return Err(RosterError::Status {
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text,
        });
    }
    let collected_at = clock();

    let (body, encoding, had_errors) = response.text();
    debug!(
        target: TARGET_WEB_REQUEST,
        "Received {} bytes from {} as {}",
        response.body.len(),
        url,
        encoding.name()
    );
    if had_errors {
        warn!(
            target: TARGET_WEB_REQUEST,
            "{} is not valid {}, replaced undecodable bytes",
            url,
            encoding.name()
        );
    }
    if !body.contains('<') {
        return Err(RosterError::Parse {
            url: url.to_string(),
            reason: "body contains no markup".to_string(),
        });
    }

    read_checklist(&body, region, &url, options, collected_at)
}

/// Parse a checklist body. The document only lives for the duration of this
/// call.
pub fn read_checklist(
    body: &str,
    region: &str,
    url: &Url,
    options: ExtractOptions,
    collected_at: DateTime<Utc>,
) -> Result<RegionChecklist, RosterError> {
    let document = Html::parse_document(body);
    let extraction = extract_entries(&document, region, options)?;
    let attribution = build_attribution(&document, url, collected_at);

    Ok(RegionChecklist {
        region: region.to_string(),
        entries: extraction.entries,
        attribution,
        skipped_rows: extraction.skipped_rows,
    })
}

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::types::{Attribution, AUTHOR, CONTEXT, ROOT_URL, SCRAPING_METHODOLOGY};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid title selector"));

/// Provenance for one checklist page. Deterministic given its inputs.
pub fn build_attribution(
    document: &Html,
    origin_url: &Url,
    collected_at: DateTime<Utc>,
) -> Attribution {
    let original_title = document
        .select(&TITLE_SELECTOR)
        .flat_map(|title| title.text())
        .collect::<String>()
        .trim()
        .to_string();

    Attribution {
        origin_url: origin_url.to_string(),
        collected_at,
        original_title,
        author: AUTHOR.to_string(),
        author_url: ROOT_URL.to_string(),
        scraping_methodology: SCRAPING_METHODOLOGY.to_string(),
        context: vec![CONTEXT.to_string()],
    }
}

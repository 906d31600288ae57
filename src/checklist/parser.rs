//! Species row extraction from a parsed checklist document.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::types::{AvibaseEntry, ExtractOptions, SPECIES_ROW_CELLS};
use crate::errors::{RosterError, RowDefect};
use crate::TARGET_WEB_REQUEST;

// Constant selectors; `Selector::parse` only fails on invalid CSS.
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("valid cell selector"));
static ITALIC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i").expect("valid italic selector"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("valid anchor selector"));

const AVIBASE_ID_MARKER: &str = "avibaseid=";
const RARE_MARKER: &str = "Rare";

/// Entries kept from one document, plus how many malformed rows were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub entries: Vec<AvibaseEntry>,
    pub skipped_rows: usize,
}

struct SpeciesRow {
    entry: AvibaseEntry,
    rare: bool,
}

/// Recover the identifier from a checklist link: the run of uppercase
/// hexadecimal digits directly after `avibaseid=`.
///
/// Returns `None` when no occurrence of the marker is followed by at least
/// one such digit.
pub fn parse_avibase_id(href: &str) -> Option<&str> {
    href.match_indices(AVIBASE_ID_MARKER).find_map(|(at, marker)| {
        let rest = &href[at + marker.len()..];
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(b))
            .count();
        (len > 0).then(|| &rest[..len])
    })
}

/// Rarity is a plain substring test on the status cell.
pub fn is_rare(status_text: &str) -> bool {
    status_text.contains(RARE_MARKER)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn read_species_row(cells: &[ElementRef]) -> Result<SpeciesRow, RowDefect> {
    let english_name = element_text(&cells[0]);

    let name_cell = &cells[1];
    let latin_name = name_cell
        .select(&ITALIC_SELECTOR)
        .map(|i| i.text().collect::<String>())
        .collect::<String>()
        .trim()
        .to_string();

    let anchor = name_cell
        .select(&ANCHOR_SELECTOR)
        .next()
        .ok_or(RowDefect::MissingAnchor)?;
    let href = anchor.value().attr("href").ok_or(RowDefect::MissingHref)?;
    let avibase_id = parse_avibase_id(href)
        .ok_or_else(|| RowDefect::MissingIdentifier(href.to_string()))?
        .to_string();

    let rare = is_rare(&cells[2].text().collect::<String>());

    Ok(SpeciesRow {
        entry: AvibaseEntry {
            english_name,
            latin_name,
            avibase_id,
        },
        rare,
    })
}

/// Walk every table row in the document and keep the species rows.
///
/// Rows without exactly three cells are ignored. A three-cell row whose
/// identifier cannot be recovered fails the extraction unless
/// `skip_malformed_rows` is set, in which case it is counted and skipped.
pub fn extract_entries(
    document: &Html,
    region: &str,
    options: ExtractOptions,
) -> Result<Extraction, RosterError> {
    let mut extraction = Extraction::default();
    let mut rare_excluded = 0;

    for (row_index, row) in document.select(&ROW_SELECTOR).enumerate() {
        let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
        if cells.len() != SPECIES_ROW_CELLS {
            continue;
        }

        let species = match read_species_row(&cells) {
            Ok(species) => species,
            Err(defect) if options.skip_malformed_rows => {
                warn!(target: TARGET_WEB_REQUEST, "Skipping row {} of {}: {}", row_index, region, defect);
                extraction.skipped_rows += 1;
                continue;
            }
            Err(defect) => {
                return Err(RosterError::Extraction {
                    region: region.to_string(),
                    row: row_index,
                    defect,
                })
            }
        };

        if !species.rare || options.include_rare {
            extraction.entries.push(species.entry);
        } else {
            rare_excluded += 1;
        }
    }

    debug!(
        target: TARGET_WEB_REQUEST,
        "Region {}: {} entries kept, {} rare excluded, {} skipped",
        region,
        extraction.entries.len(),
        rare_excluded,
        extraction.skipped_rows
    );

    Ok(extraction)
}

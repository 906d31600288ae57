//! Synonym lookup for every species found in the checklists.
//!
//! Requests are generated per species, executed as one bounded-concurrency
//! batch, and folded back into one output entry per Avibase identifier.

mod batch;
mod merge;
mod scheme;
mod types;

pub use self::types::*;

pub use self::batch::BatchResolver;
pub use self::merge::merge_responses;
pub use self::scheme::{generate_requests, AvibaseSynonyms, SynonymScheme};

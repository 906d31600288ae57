pub mod checklist;
pub mod client;
pub mod environment;
pub mod errors;
pub mod logging;
pub mod memo;
pub mod output;
pub mod pipeline;
pub mod synonyms;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_PIPELINE: &str = "pipeline";
pub const TARGET_MEMO: &str = "memo";

pub use crate::client::{ReqwestTransport, Transport};
pub use crate::errors::RosterError;
pub use crate::memo::{FileMemoStore, MemoKey, MemoStore};
pub use crate::output::{Output, OutputEntry};
pub use crate::pipeline::{Input, Pipeline, RunOutcome};
pub use crate::synonyms::{AvibaseSynonyms, SynonymScheme};

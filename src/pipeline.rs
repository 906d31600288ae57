//! The memoized fetch-and-merge run.

use chrono::{DateTime, Utc};
use std::fmt;
use tokio::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::checklist::{fetch_region, ExtractOptions};
use crate::client::Transport;
use crate::errors::RosterError;
use crate::memo::{MemoKey, MemoStore};
use crate::output::Output;
use crate::synonyms::{
    generate_requests, merge_responses, BatchResolver, SynonymScheme, MAX_ATTEMPTS, RETRY_DELAY,
};
use crate::{TARGET_MEMO, TARGET_PIPELINE};

/// What to fetch and how to report on it.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub region_codes: Vec<String>,
    pub include_rare: bool,
    pub force_reload: bool,
    pub skip_malformed_rows: bool,
    pub verbose: bool,
    pub indent: usize,
}

impl Input {
    pub fn memo_key(&self) -> MemoKey {
        MemoKey::new(&self.region_codes, self.include_rare)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            include_rare: self.include_rare,
            skip_malformed_rows: self.skip_malformed_rows,
        }
    }

    /// Progress message: `info` when verbose, `debug` otherwise.
    pub fn vlog(&self, message: fmt::Arguments) {
        let pad = "  ".repeat(self.indent);
        if self.verbose {
            info!(target: TARGET_PIPELINE, "{}{}", pad, message);
        } else {
            debug!(target: TARGET_PIPELINE, "{}{}", pad, message);
        }
    }

    /// Indent level for collaborators logging beneath this run.
    pub fn v_indent(&self) -> usize {
        self.indent + 1
    }
}

/// A finished run.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: Output,
    /// True when the output came straight from the memo store.
    pub from_memo: bool,
    /// Set when the output was computed but could not be memoized.
    pub warning: Option<RosterError>,
}

pub struct Pipeline<T, S, M> {
    transport: T,
    scheme: S,
    store: M,
    base_url: Url,
    clock: fn() -> DateTime<Utc>,
    max_attempts: usize,
    retry_delay: Duration,
}

impl<T: Transport, S: SynonymScheme, M: MemoStore> Pipeline<T, S, M> {
    pub fn new(transport: T, scheme: S, store: M, base_url: Url) -> Self {
        Self {
            transport,
            scheme,
            store,
            base_url,
            clock: Utc::now,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, max_attempts: usize, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = retry_delay;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    /// Return the memoized output for `input` if there is one, otherwise run
    /// the full pipeline and memoize its result.
    ///
    /// A failed run writes nothing. A failed write still returns the output,
    /// with the error in [`RunOutcome::warning`].
    pub async fn execute(&self, input: &Input) -> Result<RunOutcome, RosterError> {
        input.vlog(format_args!("Starting avibase downloader..."));
        let key = input.memo_key();

        if !input.force_reload {
            match self.store.read(&key).await {
                Ok(Some(output)) => {
                    input.vlog(format_args!("Found memoized output - returning."));
                    return Ok(RunOutcome {
                        output,
                        from_memo: true,
                        warning: None,
                    });
                }
                Ok(None) => {
                    debug!(target: TARGET_MEMO, "No memoized output for {}", key.digest());
                }
                Err(err) => {
                    warn!(target: TARGET_MEMO, "Ignoring unreadable memoized output: {}", err);
                }
            }
        }

        let output = self.run(input).await?;

        let warning = match self.store.write(&key, &output).await {
            Ok(()) => None,
            Err(err) => {
                warn!(target: TARGET_MEMO, "Memoization failed: {}", err);
                Some(RosterError::Persistence(err))
            }
        };

        input.vlog(format_args!("Avibase downloader done."));
        Ok(RunOutcome {
            output,
            from_memo: false,
            warning,
        })
    }

    /// Regions are fetched one after another and the first failing region
    /// ends the run.
    async fn run(&self, input: &Input) -> Result<Output, RosterError> {
        let options = input.extract_options();
        let mut entries = Vec::new();
        let mut attributions = Vec::new();

        for region in &input.region_codes {
            let checklist =
                fetch_region(&self.transport, &self.base_url, region, options, self.clock).await?;
            input.vlog(format_args!("{}", checklist.summary()));
            entries.extend(checklist.entries);
            attributions.push(checklist.attribution);
        }

        input.vlog(format_args!(
            "Found {} avibase entries. Now looking for synonyms...",
            entries.len()
        ));
        let requests = generate_requests(&self.scheme, &entries);

        let responses = BatchResolver::new(&self.transport)
            .with_retry(self.max_attempts, self.retry_delay)
            .with_indent(input.v_indent())
            .resolve(requests)
            .await
            .map_err(RosterError::BatchFailure)?;

        let entries = merge_responses(&self.scheme, &responses);
        input.vlog(format_args!("Merged {} species.", entries.len()));

        Ok(Output {
            entries,
            attributions,
        })
    }
}

use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "avibase_rosters.log";

fn stdout_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,pipeline=info,web_request=info,memo=info"
    } else {
        "warn,pipeline=warn,web_request=warn,memo=warn"
    }
}

/// Logs go to stderr (stdout carries the output JSON) and to a daily file.
pub fn configure_logging(verbose: bool) {
    // html5ever complains loudly about the checklist markup
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() == &Level::WARN && metadata.target().starts_with("html5ever"))
    });

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(stdout_directives(verbose))),
        )
        .with_filter(custom_filter);

    let file_appender = rolling::daily(LOG_DIR, LOG_FILE);
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new("info,web_request=debug,pipeline=debug,memo=debug"));

    tracing_subscriber::Registry::default()
        .with(stderr_log)
        .with(file_log)
        .init();
}

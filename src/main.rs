use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

use avibase_rosters::environment::Settings;
use avibase_rosters::logging::configure_logging;
use avibase_rosters::{
    AvibaseSynonyms, FileMemoStore, Input, Pipeline, ReqwestTransport, TARGET_PIPELINE,
};

#[derive(Parser, Debug)]
#[clap(
    name = "avibase_rosters",
    about = "Build per-region bird species rosters with synonyms from Avibase"
)]
struct Cli {
    /// Region code to include (repeatable). Falls back to AVIBASE_REGIONS.
    #[clap(short, long = "region")]
    regions: Vec<String>,

    /// Keep species flagged as rare in a region
    #[clap(long)]
    include_rare: bool,

    /// Ignore any memoized output and fetch everything again
    #[clap(long)]
    force_reload: bool,

    /// Skip species rows whose identifier cannot be read instead of failing
    #[clap(long)]
    skip_malformed_rows: bool,

    /// Directory holding memoized outputs
    #[clap(long)]
    memo_dir: Option<PathBuf>,

    /// Avibase root URL
    #[clap(long)]
    base_url: Option<String>,

    /// Language for synonym lookups (repeatable)
    #[clap(long = "lang")]
    languages: Vec<String>,

    /// Write the output JSON here instead of stdout
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Log progress
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging(cli.verbose);

    let settings = Settings::from_env();
    let region_codes = if cli.regions.is_empty() {
        settings.region_codes
    } else {
        cli.regions
    };
    if region_codes.is_empty() {
        bail!("no regions given; pass --region or set AVIBASE_REGIONS");
    }

    let base_url = cli.base_url.unwrap_or(settings.base_url);
    let base_url =
        Url::parse(&base_url).with_context(|| format!("invalid base URL {}", base_url))?;
    let languages = if cli.languages.is_empty() {
        settings.synonym_languages
    } else {
        cli.languages
    };
    let memo_dir = cli.memo_dir.unwrap_or(settings.memo_dir);

    let transport = ReqwestTransport::new()?;
    let scheme = AvibaseSynonyms::new(&base_url, languages)?;
    let store = FileMemoStore::new(memo_dir);
    let pipeline = Pipeline::new(transport, scheme, store, base_url);

    let input = Input {
        region_codes,
        include_rare: cli.include_rare,
        force_reload: cli.force_reload,
        skip_malformed_rows: cli.skip_malformed_rows,
        verbose: cli.verbose,
        indent: 0,
    };

    let outcome = pipeline
        .execute(&input)
        .await
        .context("roster run failed")?;
    if let Some(warning) = &outcome.warning {
        warn!(target: TARGET_PIPELINE, "{}", warning);
    }
    info!(
        target: TARGET_PIPELINE,
        "{} species, {} synonyms, {} regions{}",
        outcome.output.species_count(),
        outcome.output.synonym_count(),
        outcome.output.attributions.len(),
        if outcome.from_memo { " (memoized)" } else { "" }
    );

    let json = serde_json::to_string_pretty(&outcome.output)?;
    match cli.output {
        Some(path) => tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}

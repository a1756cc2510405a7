//! Command-line surface and run orchestration.
//!
//! One entry point, no subcommands: the tool either synchronises the
//! topics vocabulary from a source, or (with `--fmt`) only rewrites the
//! vocabularies file with the standard formatting so the following sync
//! commits with a clean diff.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use time::OffsetDateTime;

use crate::merge::OverridePolicy;
use crate::source::SourceFormat;
use crate::vocab::CvItem;
use crate::{Result, merge, paths, report, source, store};

#[derive(Parser, Debug)]
#[command(
    name = "mtsync",
    version,
    about = "Synchronise the Media Topics vocabulary from IPTC"
)]
pub struct Cli {
    /// Use a local source file instead of fetching from the IPTC endpoint.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Rewrite the vocabularies file with standardised formatting, skip the sync.
    #[arg(long = "fmt", short = 't', default_value_t = false)]
    pub format_only: bool,

    /// Write the result here instead of back to the vocabularies file.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Format of the local source file.
    #[arg(long, short = 's', value_enum, default_value = "json")]
    pub source_format: SourceFormat,

    /// Fields to take from the source even when a local value exists.
    /// Comma separated (`name,parent,iptc_subject,wikidata`), or `_all`.
    #[arg(
        long = "override",
        short = 'r',
        value_name = "FIELDS",
        value_parser = OverridePolicy::parse
    )]
    pub override_fields: Option<OverridePolicy>,

    /// Vocabularies file to sync into.
    #[arg(long, value_name = "PATH")]
    pub vocabularies: Option<PathBuf>,

    /// Directory for run reports.
    #[arg(long, value_name = "PATH")]
    pub reports_dir: Option<PathBuf>,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Errors only.
    #[arg(short = 'q', long, default_value_t = false)]
    pub quiet: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let vocab_path = cli
        .vocabularies
        .clone()
        .unwrap_or_else(paths::default_vocabularies_path);
    let out_path = cli.output.clone().unwrap_or_else(|| vocab_path.clone());

    if cli.format_only {
        tracing::info!(
            path = %vocab_path.display(),
            "standardising vocabularies file formatting (skipping sync)"
        );
        let doc = store::load(&vocab_path)?;
        store::write(&out_path, &doc)?;
        return Ok(());
    }

    tracing::info!("starting Media Topics synchronisation");

    let mut doc = store::load(&vocab_path)?;
    let stored = store::topics_items(&doc, &vocab_path)?;
    let existing: BTreeMap<String, CvItem> = stored
        .iter()
        .map(|item| (item.qcode.clone(), item.clone()))
        .collect();

    let candidates = source::load_candidates(cli.source_format, cli.file.as_deref(), &existing)?;
    tracing::info!(count = candidates.len(), "loaded source items");

    let policy = cli.override_fields.clone().unwrap_or_default();
    let outcome = merge::merge(&stored, &candidates, &policy);

    let reports_dir = cli
        .reports_dir
        .clone()
        .unwrap_or_else(paths::default_reports_dir);
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let report_path = report::write(&reports_dir, &report::render(&outcome.results), now)?;

    store::set_topics_items(&mut doc, &outcome.items, &vocab_path)?;
    store::write(&out_path, &doc)?;

    let new = outcome.results.iter().filter(|r| r.is_new).count();
    let deviated = outcome
        .results
        .iter()
        .filter(|r| !r.deviated_fields.is_empty())
        .count();
    let missing = outcome
        .results
        .iter()
        .filter(|r| r.missing_translation)
        .count();
    tracing::info!(
        new,
        deviated,
        missing_translation = missing,
        report = %report_path.display(),
        output = %out_path.display(),
        "synchronisation complete"
    );
    Ok(())
}

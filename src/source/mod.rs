//! Taxonomy source loading.
//!
//! Two source formats produce the same row representation: the IPTC JSON
//! concept set (fetched from the IPTC endpoint or read from a local file)
//! and the spreadsheet export consumed as CSV. Downstream stages never see
//! the format difference.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::hierarchy::ParentStack;
use crate::vocab::CvItem;

pub mod concepts;
pub mod sheet;

/// IPTC Media Topics endpoint. `lang=x-all` because not every entry carries
/// a Norwegian translation.
pub const RESOURCE_URL: &str = "https://cv.iptc.org/newscodes/mediatopic";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Scheme prefix on raw codes in both source formats.
const QCODE_PREFIX: &str = "medtop:";

/// Label languages in preference order: Norwegian, then English fallbacks.
pub const LANGUAGE_PRIORITY: [&str; 4] = ["no", "en", "en-us", "en-gb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceFormat {
    #[default]
    Json,
    Spreadsheet,
}

/// One raw row from either source format, prior to name resolution and
/// parent reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    /// Bare code, scheme prefix stripped and trimmed.
    pub qcode: String,
    /// Labels keyed by lowercased language tag.
    pub labels: BTreeMap<String, String>,
    /// Depth from the level columns (spreadsheet only).
    pub level: Option<usize>,
    /// Explicit parent from a `broader` reference (JSON only).
    pub parent: Option<String>,
    pub iptc_subject: Option<String>,
    pub wikidata: Option<String>,
}

/// A freshly loaded item ready for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: CvItem,
    pub missing_translation: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("`--file` is required when `--source-format` is `spreadsheet`")]
    FileRequired,

    #[error("spreadsheet header is missing the {column} column")]
    MissingColumn { column: &'static str },
}

/// Load the source and resolve every row into a merge candidate.
///
/// `existing` supplies the stored `is_active` flag for codes we already
/// track; new codes default to active. Any load or parse failure is fatal
/// for the run.
pub fn load_candidates(
    format: SourceFormat,
    file: Option<&Path>,
    existing: &BTreeMap<String, CvItem>,
) -> Result<Vec<Candidate>, LoadError> {
    let rows = match format {
        SourceFormat::Json => {
            let text = match file {
                Some(path) => read_file(path)?,
                None => fetch_concept_set()?,
            };
            concepts::rows_from_json(&text)?
        }
        SourceFormat::Spreadsheet => {
            let path = file.ok_or(LoadError::FileRequired)?;
            let reader = File::open(path).map_err(|e| LoadError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            let sheet = sheet::SheetSource::open(reader)?;
            sheet.collect::<Result<Vec<_>, _>>()?
        }
    };

    let mut stack = ParentStack::new();
    let candidates = rows
        .into_iter()
        .map(|row| resolve_row(row, existing, &mut stack))
        .collect();
    Ok(candidates)
}

/// Apply the name policy and parent reconstruction to one row.
fn resolve_row(
    row: SourceRow,
    existing: &BTreeMap<String, CvItem>,
    stack: &mut ParentStack,
) -> Candidate {
    let missing_translation = row
        .labels
        .get("no")
        .map(|label| label.trim().is_empty())
        .unwrap_or(true);
    let name = preferred_label(&row.labels).unwrap_or_default();

    // JSON rows carry the parent explicitly; sheet rows go through the stack.
    let parent = match row.parent {
        Some(parent) => Some(parent),
        None => stack.resolve(row.level, &row.qcode),
    };

    let is_active = existing
        .get(&row.qcode)
        .map(|item| item.is_active)
        .unwrap_or(true);

    Candidate {
        item: CvItem {
            qcode: row.qcode,
            name,
            parent,
            iptc_subject: row.iptc_subject,
            wikidata: row.wikidata,
            is_active,
            extra: serde_json::Map::new(),
        },
        missing_translation,
    }
}

/// Pick the display label by language priority; empty when nothing usable.
pub fn preferred_label(labels: &BTreeMap<String, String>) -> Option<String> {
    LANGUAGE_PRIORITY.iter().find_map(|lang| {
        labels
            .get(*lang)
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(str::to_string)
    })
}

/// Strip the scheme prefix and surrounding whitespace from a raw code.
pub fn strip_code_prefix(raw: &str) -> String {
    raw.trim()
        .strip_prefix(QCODE_PREFIX)
        .unwrap_or_else(|| raw.trim())
        .trim()
        .to_string()
}

/// Last path segment of a reference URI, trimmed. `None` when the value has
/// no path separator or ends with one.
pub fn extract_code(value: &str) -> Option<String> {
    let (_, code) = value.rsplit_once('/')?;
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn fetch_concept_set() -> Result<String, LoadError> {
    let url = std::env::var("MTSYNC_TOPICS_URL").unwrap_or_else(|_| RESOURCE_URL.to_string());

    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    let resp = agent
        .get(&url)
        .query("lang", "x-all")
        .query("format", "json")
        .call()
        .map_err(|e| LoadError::Fetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    let mut body = String::new();
    resp.into_reader()
        .read_to_string(&mut body)
        .map_err(|e| LoadError::Fetch {
            url,
            reason: e.to_string(),
        })?;
    Ok(body)
}

//! Default file locations, overridable per run.

use std::path::PathBuf;

/// Persisted vocabularies document. `MTSYNC_VOCABULARIES` overrides the
/// default `data/vocabularies.json` under the working directory.
pub(crate) fn default_vocabularies_path() -> PathBuf {
    if let Ok(path) = std::env::var("MTSYNC_VOCABULARIES")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from("data").join("vocabularies.json")
}

/// Directory for run reports. `MTSYNC_REPORTS_DIR` overrides the default
/// `reports/sync_topics` under the working directory.
pub(crate) fn default_reports_dir() -> PathBuf {
    if let Ok(path) = std::env::var("MTSYNC_REPORTS_DIR")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from("reports").join("sync_topics")
}

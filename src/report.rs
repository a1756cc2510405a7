//! Run report rendering.
//!
//! Pure formatting over the reconciliation list; the single write happens
//! in [`write`]. Three markdown tables per run: new items, items missing a
//! Norwegian label, and items whose stored values deviate from the source.
//! Row order follows source order.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::merge::{MergeField, Reconciliation};
use crate::vocab::CvItem;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to format report timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Render the run report as markdown. Deterministic for a given input.
pub fn render(results: &[Reconciliation]) -> String {
    let mut lines: Vec<String> = Vec::new();
    new_items_table(results, &mut lines);
    missing_translation_table(results, &mut lines);
    deviated_table(results, &mut lines);
    lines.join("\r\n")
}

/// Write a rendered report to `<dir>/<timestamp>.md`, creating the
/// directory when needed. Returns the path written.
pub fn write(dir: &Path, rendered: &str, now: OffsetDateTime) -> Result<PathBuf, ReportError> {
    let stamp = now.format(format_description!(
        "[year]-[month]-[day]T[hour]-[minute]"
    ))?;
    let path = dir.join(format!("{stamp}.md"));

    fs::create_dir_all(dir).map_err(|e| ReportError::Write {
        path: path.clone(),
        source: e,
    })?;
    fs::write(&path, rendered).map_err(|e| ReportError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

fn new_items_table(results: &[Reconciliation], lines: &mut Vec<String>) {
    lines.extend(heading("New Items:"));

    let new: Vec<&Reconciliation> = results.iter().filter(|r| r.is_new).collect();
    if new.is_empty() {
        lines.push("No new items discovered".to_string());
        return;
    }

    lines.extend([
        String::new(),
        "| Qcode | Name | Parent | Wikidata | IPTC Subject |".to_string(),
        "| ----- | ---- | ------ | -------- | ------------ |".to_string(),
    ]);
    for result in new {
        let item = &result.item;
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            item.qcode,
            item.name,
            item.parent.as_deref().unwrap_or(""),
            item.wikidata.as_deref().unwrap_or(""),
            item.iptc_subject.as_deref().unwrap_or(""),
        ));
    }
}

fn missing_translation_table(results: &[Reconciliation], lines: &mut Vec<String>) {
    lines.extend(heading("Missing Norwegian Translation:"));

    let missing: Vec<&Reconciliation> =
        results.iter().filter(|r| r.missing_translation).collect();
    if missing.is_empty() {
        lines.push("All topics are translated".to_string());
        return;
    }

    lines.extend([
        String::new(),
        "| Qcode | Name |".to_string(),
        "| ----- | ---- |".to_string(),
    ]);
    for result in missing {
        lines.push(format!("| {} | {} |", result.item.qcode, result.item.name));
    }
}

fn deviated_table(results: &[Reconciliation], lines: &mut Vec<String>) {
    lines.extend(heading("Deviated Items:"));

    let deviated: Vec<&Reconciliation> = results
        .iter()
        .filter(|r| !r.deviated_fields.is_empty())
        .collect();
    if deviated.is_empty() {
        lines.push("No deviated items found".to_string());
        return;
    }

    lines.extend([
        String::new(),
        "| Qcode | Field | Existing | Incoming |".to_string(),
        "| ----- | ----- | -------- | -------- |".to_string(),
    ]);
    for result in deviated {
        for field in &result.deviated_fields {
            let stored = result
                .existing
                .as_ref()
                .map(|item| field_text(item, *field))
                .unwrap_or_default();
            lines.push(format!(
                "| {} | {} | {} | {} |",
                result.item.qcode,
                field.as_str(),
                stored,
                field_text(&result.item, *field),
            ));
        }
    }
}

fn field_text(item: &CvItem, field: MergeField) -> String {
    match field {
        MergeField::Name => item.name.clone(),
        MergeField::Parent => item.parent.clone().unwrap_or_default(),
        MergeField::IptcSubject => item.iptc_subject.clone().unwrap_or_default(),
        MergeField::Wikidata => item.wikidata.clone().unwrap_or_default(),
    }
}

fn heading(title: &str) -> [String; 3] {
    [
        String::new(),
        title.to_string(),
        "-".repeat(title.len()).to_string(),
    ]
}

//! Persisted vocabularies document.
//!
//! The document is a JSON array of vocabularies; only the one with
//! `_id == "topics"` is read or replaced. The outer layer stays a
//! [`serde_json::Value`] so every other vocabulary, and any field we do not
//! model, round-trips byte-for-byte. The rewrite is whole-document and
//! atomic: a temp file in the target directory is persisted over the
//! destination, so a failed run never truncates the stored taxonomy.
//!
//! Formatting contract (for clean VCS diffs): 4-space indentation,
//! non-ASCII written verbatim, trailing CRLF.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};
use thiserror::Error;

use crate::vocab::CvItem;

/// `_id` of the Media Topics vocabulary inside the document.
pub const TOPICS_ID: &str = "topics";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("no vocabulary with _id `topics` in {}", .path.display())]
    TopicsMissing { path: PathBuf },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load the whole vocabularies document.
pub fn load(path: &Path) -> Result<Value, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Decode the items of the topics vocabulary. A malformed item is fatal;
/// merging against a half-read taxonomy would fabricate "new" entries.
pub fn topics_items(doc: &Value, path: &Path) -> Result<Vec<CvItem>, StoreError> {
    let vocab = find_topics(doc).ok_or_else(|| StoreError::TopicsMissing {
        path: path.to_path_buf(),
    })?;

    let raw = match vocab.get("items") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    raw.iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                reason: format!("topics item: {e}"),
            })
        })
        .collect()
}

/// Replace the items of the topics vocabulary.
pub fn set_topics_items(doc: &mut Value, items: &[CvItem], path: &Path) -> Result<(), StoreError> {
    let vocab = find_topics_mut(doc).ok_or_else(|| StoreError::TopicsMissing {
        path: path.to_path_buf(),
    })?;
    let items = serde_json::to_value(items).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    vocab
        .as_object_mut()
        .map(|vocab| vocab.insert("items".to_string(), items));
    Ok(())
}

/// Rewrite the document with the standard formatting, atomically.
pub fn write(path: &Path, doc: &Value) -> Result<(), StoreError> {
    let rendered = render(doc).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new("."))).map_err(|e| {
        StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    tmp.write_all(rendered.as_bytes())
        .map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    tmp.persist(path).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

fn render(doc: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    buf.extend_from_slice(b"\r\n");
    // Serializer output is valid UTF-8 by construction.
    Ok(String::from_utf8(buf).expect("serialized json is utf-8"))
}

fn find_topics(doc: &Value) -> Option<&Value> {
    doc.as_array()?
        .iter()
        .find(|vocab| vocab.get("_id").and_then(Value::as_str) == Some(TOPICS_ID))
}

fn find_topics_mut(doc: &mut Value) -> Option<&mut Value> {
    doc.as_array_mut()?
        .iter_mut()
        .find(|vocab| vocab.get("_id").and_then(Value::as_str) == Some(TOPICS_ID))
}

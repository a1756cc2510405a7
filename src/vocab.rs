//! Controlled-vocabulary item model.
//!
//! Matches the shape of entries in the `topics` vocabulary of the persisted
//! vocabularies document. Unknown keys on stored items are kept in `extra`
//! so a rewrite round-trips them untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvItem {
    pub qcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub iptc_subject: Option<String>,
    #[serde(default)]
    pub wikidata: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl CvItem {
    pub fn new(qcode: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qcode: qcode.into(),
            name: name.into(),
            parent: None,
            iptc_subject: None,
            wikidata: None,
            is_active: true,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_item_defaults_to_active_and_keeps_unknown_keys() {
        let raw = json!({
            "qcode": "01000000",
            "name": "kultur og underholdning",
            "parent": null,
            "single_value": true
        });
        let item: CvItem = serde_json::from_value(raw).unwrap();
        assert!(item.is_active);
        assert_eq!(item.extra.get("single_value"), Some(&json!(true)));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back.get("single_value"), Some(&json!(true)));
    }
}

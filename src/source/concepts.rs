//! IPTC JSON concept-set loader.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{LoadError, SourceRow, extract_code, strip_code_prefix};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConceptSetFile {
    #[serde(rename = "conceptSet")]
    concept_set: Vec<Concept>,
}

/// One Media Topic concept as published by IPTC.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Concept {
    qcode: String,
    #[serde(rename = "prefLabel")]
    pref_label: BTreeMap<String, String>,
    broader: Vec<String>,
    #[serde(rename = "exactMatch")]
    exact_match: Vec<String>,
    #[serde(rename = "closeMatch")]
    close_match: Vec<String>,
}

impl Concept {
    fn into_row(self) -> SourceRow {
        let labels = self
            .pref_label
            .into_iter()
            .map(|(lang, label)| (lang.to_lowercase(), label))
            .collect();

        // The concept states its parent directly, as a broader-concept URI.
        let parent = self.broader.first().and_then(|uri| extract_code(uri));

        let iptc_subject = closest_match(&self.exact_match, &self.close_match, "subjectcode");
        let wikidata = closest_match(&self.exact_match, &self.close_match, "wikidata");

        SourceRow {
            qcode: strip_code_prefix(&self.qcode),
            labels,
            level: None,
            parent,
            iptc_subject,
            wikidata,
        }
    }
}

/// First cross-scheme reference matching `needle`, exact matches first.
fn closest_match(exact: &[String], close: &[String], needle: &str) -> Option<String> {
    exact
        .iter()
        .chain(close.iter())
        .find(|uri| uri.contains(needle))
        .and_then(|uri| extract_code(uri))
}

/// Parse a concept-set document into source rows, preserving file order.
pub fn rows_from_json(text: &str) -> Result<Vec<SourceRow>, LoadError> {
    let file: ConceptSetFile = serde_json::from_str(text).map_err(|e| LoadError::Parse {
        what: "IPTC concept set".to_string(),
        reason: e.to_string(),
    })?;

    Ok(file
        .concept_set
        .into_iter()
        .map(Concept::into_row)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "conceptSet": [
            {
                "qcode": "medtop:04000000",
                "prefLabel": {"no": "økonomi og næringsliv", "en-GB": "economy, business and finance"},
                "broader": [],
                "exactMatch": ["http://cv.iptc.org/newscodes/subjectcode/04000000"],
                "closeMatch": []
            },
            {
                "qcode": "medtop:20000170",
                "prefLabel": {"en-US": "economic sector"},
                "broader": ["http://cv.iptc.org/newscodes/mediatopic/04000000"],
                "exactMatch": [],
                "closeMatch": ["https://www.wikidata.org/entity/Q3958441"]
            }
        ]
    }"#;

    #[test]
    fn concepts_map_to_rows_with_explicit_parents() {
        let rows = rows_from_json(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);

        let root = &rows[0];
        assert_eq!(root.qcode, "04000000");
        assert_eq!(root.parent, None);
        assert_eq!(root.iptc_subject, Some("04000000".into()));
        assert_eq!(root.labels.get("no").unwrap(), "økonomi og næringsliv");
        assert!(root.labels.contains_key("en-gb"));

        let child = &rows[1];
        assert_eq!(child.parent, Some("04000000".into()));
        assert_eq!(child.wikidata, Some("Q3958441".into()));
        assert_eq!(child.iptc_subject, None);
        assert_eq!(child.level, None);
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(matches!(
            rows_from_json("{not json"),
            Err(LoadError::Parse { .. })
        ));
    }

    #[test]
    fn missing_concept_set_key_yields_no_rows() {
        let rows = rows_from_json("{}").unwrap();
        assert!(rows.is_empty());
    }
}

//! End-to-end runs against the fixture vocabularies document.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mtsync::cli::{Cli, run};
use mtsync::merge::OverridePolicy;
use mtsync::source::SourceFormat;
use mtsync::vocab::CvItem;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

struct Workspace {
    _dir: TempDir,
    vocabularies: PathBuf,
    reports: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let vocabularies = dir.path().join("vocabularies.json");
        fs::copy(fixture("vocabularies.json"), &vocabularies).expect("copy fixture");
        let reports = dir.path().join("reports");
        Self {
            _dir: dir,
            vocabularies,
            reports,
        }
    }

    fn cli(&self, source_format: SourceFormat, file: &str) -> Cli {
        Cli {
            file: Some(fixture(file)),
            format_only: false,
            output: None,
            source_format,
            override_fields: None,
            vocabularies: Some(self.vocabularies.clone()),
            reports_dir: Some(self.reports.clone()),
            verbose: 0,
            quiet: true,
        }
    }

    fn topics(&self) -> Vec<CvItem> {
        let doc = serde_json::from_str::<serde_json::Value>(
            &fs::read_to_string(&self.vocabularies).expect("read vocabularies"),
        )
        .expect("parse vocabularies");
        let vocab = doc
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["_id"] == "topics")
            .expect("topics vocabulary");
        vocab["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| serde_json::from_value(item.clone()).expect("topics item"))
            .collect()
    }

    fn report_contents(&self) -> String {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.reports)
            .expect("reports dir")
            .map(|e| e.expect("dir entry").path())
            .collect();
        assert_eq!(entries.len(), 1, "one report per run");
        fs::read_to_string(entries.remove(0)).expect("read report")
    }
}

fn topic<'a>(items: &'a [CvItem], qcode: &str) -> &'a CvItem {
    items
        .iter()
        .find(|item| item.qcode == qcode)
        .unwrap_or_else(|| panic!("no topic {qcode}"))
}

#[test]
fn json_sync_preserves_local_values_and_appends_new_topics() {
    let ws = Workspace::new();
    run(ws.cli(SourceFormat::Json, "concept_set.json")).expect("sync");

    let items = ws.topics();
    assert_eq!(items.len(), 5);

    // Local name wins under the default policy; the empty cross-reference
    // is filled from the source.
    let culture = topic(&items, "01000000");
    assert_eq!(culture.name, "Kultur (lokal)");
    assert_eq!(culture.iptc_subject.as_deref(), Some("01000000"));

    // New topics arrive with their broader-concept parents, active.
    let archaeology = topic(&items, "20000002");
    assert_eq!(archaeology.name, "arkeologi");
    assert_eq!(archaeology.parent.as_deref(), Some("01000000"));
    assert_eq!(archaeology.wikidata.as_deref(), Some("Q23498"));
    assert!(archaeology.is_active);

    let excavation = topic(&items, "20000003");
    assert_eq!(excavation.name, "excavation");
    assert_eq!(excavation.parent.as_deref(), Some("20000002"));

    // A locally added code the source does not know stays untouched.
    assert_eq!(topic(&items, "99000000").name, "lokal kode");

    let report = ws.report_contents();
    assert!(report.contains("| 20000002 | arkeologi | 01000000 |"));
    assert!(report.contains("| 20000003 | excavation |"));
    assert!(report.contains("| 01000000 | name | Kultur (lokal) | kultur og underholdning |"));
}

#[test]
fn json_sync_with_all_override_takes_incoming_values() {
    let ws = Workspace::new();
    let mut cli = ws.cli(SourceFormat::Json, "concept_set.json");
    cli.override_fields = Some(OverridePolicy::parse("_all").expect("policy"));
    run(cli).expect("sync");

    let items = ws.topics();
    assert_eq!(topic(&items, "01000000").name, "kultur og underholdning");
}

#[test]
fn sibling_vocabularies_round_trip_untouched() {
    let ws = Workspace::new();
    run(ws.cli(SourceFormat::Json, "concept_set.json")).expect("sync");

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&ws.vocabularies).unwrap()).unwrap();
    let genre = doc
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["_id"] == "genre")
        .expect("genre vocabulary");
    assert_eq!(genre["display_name"], "Genre");
    assert_eq!(genre["items"][0]["qcode"], "Nyheter");
}

#[test]
fn spreadsheet_sync_reconstructs_parents_from_levels() {
    let ws = Workspace::new();
    run(ws.cli(SourceFormat::Spreadsheet, "media_topics.csv")).expect("sync");

    let items = ws.topics();
    assert_eq!(topic(&items, "01000000").parent, None);
    assert_eq!(topic(&items, "20000002").parent.as_deref(), Some("01000000"));
    assert_eq!(topic(&items, "20000003").parent.as_deref(), Some("20000002"));
    // Return from level 3 to level 2: sibling of 20000002.
    assert_eq!(topic(&items, "20000038").parent.as_deref(), Some("01000000"));
    assert_eq!(topic(&items, "04000000").parent, None);

    // The untranslated row lands in the report.
    assert!(ws.report_contents().contains("| 20000003 | excavation |"));
}

#[test]
fn spreadsheet_mode_without_a_file_is_a_usage_error() {
    let ws = Workspace::new();
    let mut cli = ws.cli(SourceFormat::Spreadsheet, "media_topics.csv");
    cli.file = None;
    let err = run(cli).expect_err("must fail");
    assert!(err.to_string().contains("--file"));
}

#[test]
fn failed_load_leaves_the_document_untouched() {
    let ws = Workspace::new();
    let before = fs::read_to_string(&ws.vocabularies).unwrap();

    let mut cli = ws.cli(SourceFormat::Json, "concept_set.json");
    cli.file = Some(ws._dir.path().join("does-not-exist.json"));
    run(cli).expect_err("must fail");

    assert_eq!(fs::read_to_string(&ws.vocabularies).unwrap(), before);
    assert!(!ws.reports.exists(), "no report for a failed run");
}

#[test]
fn reformat_mode_is_stable_and_skips_the_sync() {
    let ws = Workspace::new();
    // Start from compact formatting.
    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&ws.vocabularies).unwrap()).unwrap();
    fs::write(&ws.vocabularies, serde_json::to_string(&doc).unwrap()).unwrap();

    let mut cli = ws.cli(SourceFormat::Json, "concept_set.json");
    cli.format_only = true;
    run(cli).expect("reformat");

    let first = fs::read_to_string(&ws.vocabularies).unwrap();
    assert!(first.starts_with("[\n    {"));
    assert!(first.ends_with("\r\n"));
    assert!(!ws.reports.exists(), "reformat writes no report");
    // Topics unchanged.
    assert_eq!(ws.topics().len(), 3);

    let mut cli = ws.cli(SourceFormat::Json, "concept_set.json");
    cli.format_only = true;
    run(cli).expect("reformat again");
    assert_eq!(fs::read_to_string(&ws.vocabularies).unwrap(), first);
}

#[test]
fn second_sync_run_reports_no_new_items() {
    let ws = Workspace::new();
    run(ws.cli(SourceFormat::Json, "concept_set.json")).expect("first run");
    fs::remove_dir_all(&ws.reports).expect("clear reports");

    run(ws.cli(SourceFormat::Json, "concept_set.json")).expect("second run");
    let report = ws.report_contents();
    assert!(report.contains("No new items discovered"));
}

//! Merge of freshly loaded items into the stored vocabulary.
//!
//! Policy: stored values win unless the field is explicitly forced, so
//! local editorial corrections survive a routine sync. Deviations between
//! the two sides are recorded for the run report, never raised as errors;
//! they are domain disagreements for an editor, not program faults.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::source::Candidate;
use crate::vocab::CvItem;

/// The four fields the merge may touch. `is_active` is deliberately not
/// here: enable/disable is a manual editorial decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MergeField {
    Name,
    Parent,
    IptcSubject,
    Wikidata,
}

impl MergeField {
    pub const ALL: [MergeField; 4] = [
        MergeField::Name,
        MergeField::Parent,
        MergeField::IptcSubject,
        MergeField::Wikidata,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MergeField::Name => "name",
            MergeField::Parent => "parent",
            MergeField::IptcSubject => "iptc_subject",
            MergeField::Wikidata => "wikidata",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "name" => Some(MergeField::Name),
            "parent" => Some(MergeField::Parent),
            "iptc_subject" => Some(MergeField::IptcSubject),
            "wikidata" => Some(MergeField::Wikidata),
            _ => None,
        }
    }

    fn get(self, item: &CvItem) -> Option<&str> {
        let value = match self {
            MergeField::Name => Some(item.name.as_str()),
            MergeField::Parent => item.parent.as_deref(),
            MergeField::IptcSubject => item.iptc_subject.as_deref(),
            MergeField::Wikidata => item.wikidata.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn set(self, item: &mut CvItem, value: Option<String>) {
        match self {
            MergeField::Name => item.name = value.unwrap_or_default(),
            MergeField::Parent => item.parent = value,
            MergeField::IptcSubject => item.iptc_subject = value,
            MergeField::Wikidata => item.wikidata = value,
        }
    }
}

/// Which fields the incoming value wins on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverridePolicy {
    /// Stored values win; only empty fields are filled in.
    #[default]
    PreserveExisting,
    /// The named fields take the incoming value when one is present.
    Override(BTreeSet<MergeField>),
}

/// Sentinel meaning "override every mergeable field".
pub const ALL_FIELDS: &str = "_all";

impl OverridePolicy {
    /// Parse a comma-separated field list, or [`ALL_FIELDS`].
    pub fn parse(spec: &str) -> Result<Self, String> {
        if spec.trim() == ALL_FIELDS {
            return Ok(OverridePolicy::Override(MergeField::ALL.into()));
        }

        let mut fields = BTreeSet::new();
        for raw in spec.split(',').filter(|raw| !raw.trim().is_empty()) {
            let field = MergeField::parse(raw)
                .ok_or_else(|| format!("unknown override field `{}`", raw.trim()))?;
            fields.insert(field);
        }
        if fields.is_empty() {
            Ok(OverridePolicy::PreserveExisting)
        } else {
            Ok(OverridePolicy::Override(fields))
        }
    }

    fn forces(&self, field: MergeField) -> bool {
        match self {
            OverridePolicy::PreserveExisting => false,
            OverridePolicy::Override(fields) => fields.contains(&field),
        }
    }
}

/// Merge one field value. Empty strings count as absent on both sides, so a
/// blank incoming cell never erases a stored value, forced or not.
pub fn merge_field(
    existing: Option<&str>,
    incoming: Option<&str>,
    forced: bool,
) -> Option<String> {
    let existing = existing.filter(|v| !v.trim().is_empty());
    let incoming = incoming.filter(|v| !v.trim().is_empty());
    let value = if forced {
        incoming.or(existing)
    } else {
        existing.or(incoming)
    };
    value.map(str::to_string)
}

/// Outcome of one incoming item against the stored vocabulary.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The incoming item (pre-merge values).
    pub item: CvItem,
    /// Stored snapshot before the merge, when the code was known.
    pub existing: Option<CvItem>,
    pub is_new: bool,
    pub missing_translation: bool,
    /// Fields where both sides are set and disagree. Empty for items whose
    /// stored record is inactive.
    pub deviated_fields: Vec<MergeField>,
}

#[derive(Debug)]
pub struct MergeOutcome {
    /// Full item list for the rewritten vocabulary: stored items in their
    /// stored order, then new items in source order.
    pub items: Vec<CvItem>,
    /// One entry per incoming item, in source order.
    pub results: Vec<Reconciliation>,
}

/// Merge `candidates` into `stored`, applying `policy` per field.
///
/// Stored items whose code does not appear in the source are left
/// untouched.
pub fn merge(
    stored: &[CvItem],
    candidates: &[Candidate],
    policy: &OverridePolicy,
) -> MergeOutcome {
    let incoming_by_code: BTreeMap<&str, &Candidate> = candidates
        .iter()
        .map(|candidate| (candidate.item.qcode.as_str(), candidate))
        .collect();
    let stored_by_code: BTreeMap<&str, &CvItem> = stored
        .iter()
        .map(|item| (item.qcode.as_str(), item))
        .collect();

    let mut items: Vec<CvItem> = stored.to_vec();
    for item in &mut items {
        let Some(candidate) = incoming_by_code.get(item.qcode.as_str()) else {
            continue;
        };
        for field in MergeField::ALL {
            let merged = merge_field(
                field.get(item),
                field.get(&candidate.item),
                policy.forces(field),
            );
            field.set(item, merged);
        }
    }

    let mut results = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let existing = stored_by_code.get(candidate.item.qcode.as_str()).copied();

        let deviated_fields = match existing {
            Some(original) if original.is_active => MergeField::ALL
                .into_iter()
                .filter(|field| {
                    matches!(
                        (field.get(original), field.get(&candidate.item)),
                        (Some(old), Some(new)) if old != new
                    )
                })
                .collect(),
            _ => Vec::new(),
        };

        if existing.is_none() {
            let mut item = candidate.item.clone();
            item.is_active = true;
            items.push(item);
        }

        results.push(Reconciliation {
            item: candidate.item.clone(),
            existing: existing.cloned(),
            is_new: existing.is_none(),
            missing_translation: candidate.missing_translation,
            deviated_fields,
        });
    }

    MergeOutcome { items, results }
}

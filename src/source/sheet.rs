//! Spreadsheet-export loader.
//!
//! The IPTC sheet (consumed as its CSV export) has a banner row, then the
//! header row, then data. Columns are located by header substring because
//! the sheet gains and loses language columns between releases. The level
//! columns encode each row's depth; parent codes are reconstructed later
//! from that depth, see [`crate::hierarchy`].

use std::collections::BTreeMap;
use std::io::Read;
use std::ops::Range;

use csv::StringRecord;

use super::{LoadError, SourceRow, extract_code, strip_code_prefix};

/// Zero-based index of the header row; data starts on the next row.
const HEADER_ROW: usize = 1;

/// Column holding the prefixed code of the row.
const QCODE_COLUMN: usize = 1;

/// Columns Level1..Level6. Exactly one is populated per well-formed row.
const LEVEL_COLUMNS: Range<usize> = 2..8;

/// Header prefix of the per-language name columns, e.g. `Name (no)`.
const NAME_PREFIX: &str = "Name (";

#[derive(Debug)]
struct HeaderIndices {
    /// Lowercased language tag to column index.
    name_columns: BTreeMap<String, usize>,
    subject_code: usize,
    wikidata: usize,
}

impl HeaderIndices {
    fn from_record(record: &StringRecord) -> Result<Self, LoadError> {
        let mut name_columns = BTreeMap::new();
        let mut subject_code = None;
        let mut wikidata = None;

        for (index, value) in record.iter().enumerate() {
            if let Some(rest) = value.strip_prefix(NAME_PREFIX) {
                let language = rest.trim_end_matches(')').to_lowercase();
                name_columns.insert(language, index);
            } else if value.contains("SubjectCode") {
                subject_code = Some(index);
            } else if value.contains("Wikidata") {
                wikidata = Some(index);
            }
        }

        if name_columns.is_empty() {
            return Err(LoadError::MissingColumn { column: "Name (..)" });
        }
        Ok(Self {
            name_columns,
            subject_code: subject_code.ok_or(LoadError::MissingColumn {
                column: "SubjectCode",
            })?,
            wikidata: wikidata.ok_or(LoadError::MissingColumn { column: "Wikidata" })?,
        })
    }
}

/// Forward-only scan over the sheet's data rows.
pub struct SheetSource<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    header: HeaderIndices,
}

impl<R: Read> SheetSource<R> {
    /// Read up to the header row and locate the required columns.
    pub fn open(reader: R) -> Result<Self, LoadError> {
        let mut records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        let mut header = None;
        for _ in 0..=HEADER_ROW {
            header = records.next();
        }
        let header = header
            .transpose()
            .map_err(csv_parse_error)?
            .ok_or(LoadError::Parse {
                what: "spreadsheet".to_string(),
                reason: "no header row".to_string(),
            })?;

        Ok(Self {
            records,
            header: HeaderIndices::from_record(&header)?,
        })
    }

    /// Convert one data record; `None` for blank filler rows.
    fn row_from_record(&self, record: &StringRecord) -> Option<SourceRow> {
        let qcode = strip_code_prefix(record.get(QCODE_COLUMN)?);
        if qcode.is_empty() {
            return None;
        }

        let level = LEVEL_COLUMNS
            .clone()
            .find(|&index| !cell(record, index).is_empty())
            .map(|index| index - LEVEL_COLUMNS.start);

        let labels = self
            .header
            .name_columns
            .iter()
            .filter_map(|(language, &index)| {
                let value = cell(record, index);
                if value.is_empty() {
                    None
                } else {
                    Some((language.clone(), value.to_string()))
                }
            })
            .collect();

        Some(SourceRow {
            qcode,
            labels,
            level,
            parent: None,
            iptc_subject: extract_code(cell(record, self.header.subject_code)),
            wikidata: extract_code(cell(record, self.header.wikidata)),
        })
    }
}

impl<R: Read> Iterator for SheetSource<R> {
    type Item = Result<SourceRow, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(csv_parse_error(e))),
            };
            if let Some(row) = self.row_from_record(&record) {
                return Some(Ok(row));
            }
        }
    }
}

fn cell<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("").trim()
}

fn csv_parse_error(e: csv::Error) -> LoadError {
    LoadError::Parse {
        what: "spreadsheet".to_string(),
        reason: e.to_string(),
    }
}

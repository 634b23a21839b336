use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{IssueRecord, IssueTable};

/// Columns that must be present for the dashboard to run at all.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Issue Status",
    "Functional Area",
    "Issue Rating",
    "Soft Target Date",
    "Hard Target Date",
    "Revised Hard Target Date",
];

const OWNER_COLUMN: &str = "Owner";
const CREATED_COLUMN: &str = "Created On";

const DATE_FORMATS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 3] = [
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("workbook has no worksheets")]
    NoSheets,
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported input format: {0} (expected xlsx, xls or csv)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Input format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Excel,
    Csv,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xls" => Ok(Self::Excel),
            "csv" => Ok(Self::Csv),
            "" => Err(LoadError::UnsupportedFormat(path.display().to_string())),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Explicit memoization of parsed uploads, keyed by a SHA-256 of the raw
/// bytes: re-submitting identical content returns the cached table.
#[derive(Default)]
pub struct LoadCache {
    entries: HashMap<[u8; 32], Arc<IssueTable>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, bytes: &[u8], format: SheetFormat) -> Result<Arc<IssueTable>, LoadError> {
        let key = content_key(bytes);
        if let Some(table) = self.entries.get(&key) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(parse_bytes(bytes, format)?);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn content_key(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

pub fn load_path(path: &Path) -> Result<IssueTable, LoadError> {
    let format = SheetFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, format)
}

pub fn parse_bytes(bytes: &[u8], format: SheetFormat) -> Result<IssueTable, LoadError> {
    match format {
        SheetFormat::Excel => parse_workbook(bytes),
        SheetFormat::Csv => parse_csv(bytes),
    }
}

/// Day-first date parsing; anything unparseable is null, never an error.
pub fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    None
}

fn parse_workbook(bytes: &[u8]) -> Result<IssueTable, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(LoadError::NoSheets)??;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => Vec::new(),
    };
    let layout = ColumnLayout::resolve(&columns)?;

    let mut records = Vec::new();
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                if layout.date_columns.contains(&index) {
                    date_cell_to_string(cell)
                } else {
                    cell_to_string(cell)
                }
            })
            .collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        records.push(layout.build_record(cells));
    }

    Ok(IssueTable {
        columns,
        records,
        has_owner: layout.owner.is_some(),
    })
}

fn parse_csv(bytes: &[u8]) -> Result<IssueTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let layout = ColumnLayout::resolve(&columns)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let cells: Vec<String> = row.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        records.push(layout.build_record(cells));
    }

    Ok(IssueTable {
        columns,
        records,
        has_owner: layout.owner.is_some(),
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.clone(),
        Data::DurationIso(v) => v.clone(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Date cells render as ISO dates so the day-first parser reads them back;
/// everything else falls through to the plain rendering.
fn date_cell_to_string(cell: &Data) -> String {
    match cell {
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| dt.date().to_string())
            .unwrap_or_else(|| v.to_string()),
        other => cell_to_string(other),
    }
}

/// Column indices resolved from the header row. Extra columns need no
/// mapping; they ride along in the raw cells.
struct ColumnLayout {
    status: usize,
    area: usize,
    rating: usize,
    soft: usize,
    hard: usize,
    revised: usize,
    owner: Option<usize>,
    date_columns: Vec<usize>,
}

impl ColumnLayout {
    fn resolve(header: &[String]) -> Result<Self, LoadError> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let position = |name: &str| find(name).unwrap_or(usize::MAX);
        let soft = position("Soft Target Date");
        let hard = position("Hard Target Date");
        let revised = position("Revised Hard Target Date");

        let mut date_columns = vec![soft, hard, revised];
        if let Some(created) = find(CREATED_COLUMN) {
            date_columns.push(created);
        }

        Ok(Self {
            status: position("Issue Status"),
            area: position("Functional Area"),
            rating: position("Issue Rating"),
            soft,
            hard,
            revised,
            owner: find(OWNER_COLUMN),
            date_columns,
        })
    }

    fn build_record(&self, cells: Vec<String>) -> IssueRecord {
        let text = |index: usize| cells.get(index).cloned().unwrap_or_default();
        let date = |index: usize| cells.get(index).map(String::as_str).and_then(parse_day_first);

        let status = text(self.status);
        let area = text(self.area);
        let rating = text(self.rating);
        let soft_target = date(self.soft);
        let hard_target = date(self.hard);
        let revised_target = date(self.revised);
        let owner = self
            .owner
            .map(text)
            .filter(|value| !value.trim().is_empty());

        IssueRecord {
            status,
            area,
            rating,
            soft_target,
            hard_target,
            revised_target,
            owner,
            cells,
        }
    }
}

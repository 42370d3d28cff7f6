//! Decoding uploads into typed, column-major tables.

use std::collections::HashMap;
#[cfg(feature = "spreadsheet")]
use std::io::Cursor;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{Error, Result};
use crate::upload::{Format, Upload};

lazy_static! {
    static ref TIME_HINT: Regex = Regex::new("(?i)date|time").unwrap();
}

/// Markers that stand for "no value" in uploaded tables.
static MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Cell {
    fn from_text(raw: &str) -> Cell {
        if is_missing_marker(raw) {
            return Cell::Missing;
        }

        match raw.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Cell::Number(x),
            // "inf" and friends can't be standardized
            Ok(_) => Cell::Missing,
            Err(_) => Cell::Text(raw.to_owned()),
        }
    }

    fn is_missing(&self) -> bool {
        matches!(*self, Cell::Missing)
    }
}

/// The typed contents of one column. Every cell may be missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl Values {
    /// Infers the column type: numeric if every present cell is a number, timestamp if every
    /// present cell is (or parses as) a timestamp, text otherwise.
    fn infer(cells: Vec<Cell>) -> Values {
        let present = || cells.iter().filter(|c| !c.is_missing());

        if present().all(|c| matches!(c, Cell::Number(_))) {
            return Values::Numeric(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Number(x) => Some(x),
                        _ => None,
                    })
                    .collect(),
            );
        }

        if present().all(|c| matches!(c, Cell::Timestamp(_))) {
            return Values::Timestamp(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Timestamp(t) => Some(t),
                        _ => None,
                    })
                    .collect(),
            );
        }

        Values::Text(
            cells
                .into_iter()
                .map(|c| match c {
                    Cell::Missing => None,
                    Cell::Number(x) => Some(x.to_string()),
                    Cell::Text(s) => Some(s),
                    Cell::Timestamp(t) => Some(t.to_string()),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Numeric(v) => v.len(),
            Values::Text(v) => v.len(),
            Values::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if every cell of the column is missing
    pub fn is_all_missing(&self) -> bool {
        match self {
            Values::Numeric(v) => v.iter().all(Option::is_none),
            Values::Text(v) => v.iter().all(Option::is_none),
            Values::Timestamp(v) => v.iter().all(Option::is_none),
        }
    }

    pub fn get(&self, row: usize) -> Cell {
        match self {
            Values::Numeric(v) => v[row].map_or(Cell::Missing, Cell::Number),
            Values::Text(v) => v[row].clone().map_or(Cell::Missing, Cell::Text),
            Values::Timestamp(v) => v[row].map_or(Cell::Missing, Cell::Timestamp),
        }
    }

    /// Rearranges the cells so that the new `i`th cell is the old `order[i]`th one
    pub fn reorder(&mut self, order: &[usize]) {
        fn apply<T: Clone>(v: &mut Vec<T>, order: &[usize]) {
            *v = order.iter().map(|&i| v[i].clone()).collect();
        }

        match self {
            Values::Numeric(v) => apply(v, order),
            Values::Text(v) => apply(v, order),
            Values::Timestamp(v) => apply(v, order),
        }
    }

    /// Propagates the last present value forward, then the first present value backward
    pub fn fill_forward_backward(&mut self) {
        fn fill<T: Clone>(v: &mut [Option<T>]) {
            let mut last = None;
            for cell in v.iter_mut() {
                match cell {
                    Some(x) => last = Some(x.clone()),
                    None => *cell = last.clone(),
                }
            }

            let mut next = None;
            for cell in v.iter_mut().rev() {
                match cell {
                    Some(x) => next = Some(x.clone()),
                    None => *cell = next.clone(),
                }
            }
        }

        match self {
            Values::Numeric(v) => fill(v),
            Values::Text(v) => fill(v),
            Values::Timestamp(v) => fill(v),
        }
    }

    /// Coerces a text column into a timestamp column if every present cell parses as a date
    fn coerce_timestamps(self) -> Values {
        match self {
            Values::Text(v) => {
                if v.iter().all(Option::is_none) {
                    return Values::Text(v);
                }

                let parsed: Option<Vec<Option<NaiveDateTime>>> = v
                    .iter()
                    .map(|cell| match cell {
                        Some(s) => parse_timestamp(s).map(Some),
                        None => Some(None),
                    })
                    .collect();

                match parsed {
                    Some(timestamps) => Values::Timestamp(timestamps),
                    None => Values::Text(v),
                }
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Values,
}

/// A decoded upload: ordered rows by named columns, stored column-major.
///
/// Invariants:
///
/// - There is at least one column and at least one row
/// - Every column holds exactly `nrows` cells
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    nrows: usize,
}

impl Dataset {
    /// Builds a dataset from already-typed columns.
    ///
    /// Returns `EmptyResult` if there are no columns or no rows.
    ///
    /// # Panics
    ///
    /// Panics if the columns differ in length
    pub fn new(columns: Vec<Column>) -> Result<Dataset> {
        let nrows = columns.first().map_or(0, |c| c.values.len());
        assert!(columns.iter().all(|c| c.values.len() == nrows));

        if columns.first().map_or(true, |c| c.values.is_empty()) {
            return Err(Error::EmptyResult);
        }

        Ok(Dataset { columns, nrows })
    }

    /// Decodes an upload with the parser chosen by its file extension
    pub fn parse(upload: &Upload) -> Result<Dataset> {
        let (header, rows) = match upload.format()? {
            Format::Csv => read_csv(upload.bytes())?,
            Format::Spreadsheet => read_spreadsheet(upload.bytes())?,
        };

        let dataset = Dataset::from_cells(header, rows)?;
        debug!(
            "parsed {} ({} rows, {} columns)",
            upload.filename(),
            dataset.nrows(),
            dataset.ncols()
        );
        Ok(dataset)
    }

    fn from_cells(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Dataset> {
        let names = dedup_names(header);
        let mut cells: Vec<Vec<Cell>> = names.iter().map(|_| Vec::with_capacity(rows.len())).collect();

        for row in rows {
            let mut row = row.into_iter();
            for column in cells.iter_mut() {
                column.push(row.next().unwrap_or(Cell::Missing));
            }
        }

        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column {
                name,
                values: Values::infer(cells).coerce_timestamps(),
            })
            .collect();

        Dataset::new(columns)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the cells of row `i` keyed by column name
    pub fn row(&self, i: usize) -> Vec<(&str, Cell)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.values.get(i)))
            .collect()
    }

    /// Locates the column to use as a time axis.
    ///
    /// The first column that is either timestamp-typed, or whose name mentions a date or time and
    /// whose values can be read as timestamps, wins. An integer column with such a name is read as
    /// Unix epoch seconds.
    pub fn time_column(&self) -> Option<(usize, Vec<Option<NaiveDateTime>>)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(i, column)| match &column.values {
                Values::Timestamp(v) => Some((i, v.clone())),
                Values::Numeric(v) if TIME_HINT.is_match(&column.name) => {
                    epoch_seconds(v).map(|v| (i, v))
                }
                _ => None,
            })
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

fn is_missing_marker(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw) || raw.trim().is_empty()
}

/// Renames repeated header names `a, a` to `a, a.1`, and names blank headers by position.
fn dedup_names(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Parses the date and date-time layouts commonly found in exported tables
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn epoch_seconds(values: &[Option<f64>]) -> Option<Vec<Option<NaiveDateTime>>> {
    if values.iter().all(Option::is_none) {
        return None;
    }

    values
        .iter()
        .map(|cell| match *cell {
            Some(x) if x.fract() == 0.0 => DateTime::from_timestamp(x as i64, 0)
                .map(|dt| Some(dt.naive_utc())),
            Some(_) => None,
            None => Some(None),
        })
        .collect()
}

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let text = std::str::from_utf8(bytes).map_err(Error::decode)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(Error::decode)?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();

    let mut rows = vec![];
    for record in reader.records() {
        let record = record.map_err(Error::decode)?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok((header, rows))
}

#[cfg(feature = "spreadsheet")]
fn read_spreadsheet(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(Error::decode)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(Error::decode)?,
        None => return Err(Error::EmptyResult),
    };

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => return Err(Error::EmptyResult),
    };

    let rows = rows
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::Float(x) if x.is_finite() => Cell::Number(*x),
                    Data::Float(_) => Cell::Missing,
                    Data::String(s) => {
                        if is_missing_marker(s) {
                            Cell::Missing
                        } else {
                            Cell::Text(s.clone())
                        }
                    }
                    Data::Bool(b) => Cell::Text(b.to_string()),
                    Data::DateTime(_) => cell.as_datetime().map_or(Cell::Missing, Cell::Timestamp),
                    Data::DateTimeIso(s) => {
                        parse_timestamp(s).map_or_else(|| Cell::Text(s.clone()), Cell::Timestamp)
                    }
                    Data::DurationIso(s) => Cell::Text(s.clone()),
                    Data::Error(_) | Data::Empty => Cell::Missing,
                })
                .collect()
        })
        .collect();

    Ok((header, rows))
}

#[cfg(not(feature = "spreadsheet"))]
fn read_spreadsheet(_: &[u8]) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    Err(Error::Decode {
        reason: "spreadsheet support is not compiled in".to_owned(),
    })
}

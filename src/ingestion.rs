//! Decoding delimited text and workbook sheets into [`Frame`]s, and encoding
//! frames back out.

use crate::error::{RestructureError, Result};
use crate::schema::{CellValue, Frame, TransformConfig};
use crate::utils::{dedupe_headers, format_number, parse_number};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use log::debug;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Workbook,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        if extension == "csv" {
            Ok(InputFormat::Csv)
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Ok(InputFormat::Workbook)
        } else if extension.is_empty() {
            Err(RestructureError::UnsupportedFormat(format!(
                "'{}' has no file extension",
                path.display()
            )))
        } else {
            Err(RestructureError::UnsupportedFormat(format!(".{}", extension)))
        }
    }
}

fn unnamed(position: usize) -> String {
    format!("Unnamed: {}", position)
}

fn header_names(raw: Vec<String>) -> Vec<String> {
    let named: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(position, name)| {
            if name.trim().is_empty() {
                unnamed(position)
            } else {
                name
            }
        })
        .collect();
    dedupe_headers(named)
}

/// A column decodes as numbers only when every non-empty field parses and
/// renders back to exactly the same text, so "01", "1.50" or integers beyond
/// f64 precision keep the column as text.
fn is_numeric_column(fields: &[&str]) -> bool {
    let mut populated = fields.iter().filter(|field| !field.is_empty()).peekable();
    if populated.peek().is_none() {
        return false;
    }
    populated.all(|field| parse_number(field).is_some_and(|value| format_number(value) == *field))
}

/// Columns that are grouping keys are always text.
fn numeric_columns(headers: &[String], rows: &[Vec<String>], config: &TransformConfig) -> Vec<bool> {
    headers
        .iter()
        .enumerate()
        .map(|(position, name)| {
            if !config.infer_numbers
                || *name == config.chat_id_column
                || *name == config.response_kind_column
            {
                return false;
            }
            let fields: Vec<&str> = rows
                .iter()
                .map(|row| row.get(position).map(String::as_str).unwrap_or(""))
                .collect();
            is_numeric_column(&fields)
        })
        .collect()
}

fn decode_field(field: String, numeric: bool) -> CellValue {
    if field.is_empty() {
        return CellValue::Missing;
    }
    if numeric {
        if let Some(value) = parse_number(&field) {
            return CellValue::Number(value);
        }
    }
    CellValue::Text(field)
}

/// Reads comma-delimited text with a header row. Empty fields decode as
/// `Missing`; number inference is decided once per column.
pub fn read_csv<R: Read>(reader: R, config: &TransformConfig) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = header_names(reader.headers()?.iter().map(String::from).collect());

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw_rows.push(record.iter().map(String::from).collect::<Vec<String>>());
    }

    let numeric = numeric_columns(&headers, &raw_rows, config);
    debug!(
        "Numeric CSV columns: {:?}",
        headers
            .iter()
            .zip(&numeric)
            .filter(|(_, numeric)| **numeric)
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
    );

    let mut frame = Frame::new(headers);
    for row in raw_rows {
        let cells = row
            .into_iter()
            .enumerate()
            .map(|(position, field)| {
                decode_field(field, numeric.get(position).copied().unwrap_or(false))
            })
            .collect();
        frame.push_row(cells);
    }

    debug!(
        "Decoded CSV with {} column(s) and {} row(s)",
        frame.column_count(),
        frame.row_count()
    );
    Ok(frame)
}

pub fn read_csv_path(path: &Path, config: &TransformConfig) -> Result<Frame> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file), config)
}

/// Largest integer magnitude an f64 holds exactly.
const EXACT_INTEGER_LIMIT: i64 = 1 << 53;

fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Int(value) if value.unsigned_abs() <= EXACT_INTEGER_LIMIT as u64 => {
            CellValue::Number(*value as f64)
        }
        Data::Int(value) => CellValue::Text(value.to_string()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::text(if *value { "True" } else { "False" }),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => CellValue::Text(format_datetime(&datetime)),
            None => CellValue::Number(value.as_f64()),
        },
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
    }
}

fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

fn header_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        other => decode_cell(other).to_string(),
    }
}

/// Decodes one worksheet range; the first row is the header.
fn frame_from_range(range: &Range<Data>) -> Frame {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Frame::default();
    };

    let headers = header_names(header_row.iter().map(header_cell).collect());
    let mut cells: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(decode_cell).collect())
        .collect();

    // Used ranges can end in rows that only hold formatting
    while cells
        .last()
        .is_some_and(|row| row.iter().all(CellValue::is_missing))
    {
        cells.pop();
    }

    Frame::from_rows(headers, cells)
}

fn frames_from_ranges(ranges: Vec<(String, Range<Data>)>) -> Result<Vec<(String, Frame)>> {
    if ranges.is_empty() {
        return Err(RestructureError::EmptyWorkbook);
    }

    Ok(ranges
        .into_iter()
        .map(|(name, range)| {
            let frame = frame_from_range(&range);
            debug!(
                "Decoded sheet '{}' with {} column(s) and {} row(s)",
                name,
                frame.column_count(),
                frame.row_count()
            );
            (name, frame)
        })
        .collect())
}

/// Reads every sheet of a workbook, in workbook order. The first row of each
/// sheet is its header.
pub fn read_workbook(path: &Path) -> Result<Vec<(String, Frame)>> {
    let mut workbook = open_workbook_auto(path)?;

    let mut ranges = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        ranges.push((name, range));
    }

    frames_from_ranges(ranges)
}

fn sheet_position<T: TryFrom<usize>>(sheet: &str, position: usize) -> Result<T> {
    T::try_from(position).map_err(|_| RestructureError::SheetTooLarge {
        sheet: sheet.to_string(),
    })
}

/// Writes every `(sheet name, frame)` pair as one worksheet of a new `.xlsx`
/// workbook. `Missing` cells are left blank.
pub fn write_workbook_path(path: &Path, sheets: &[(&str, &Frame)]) -> Result<()> {
    let mut workbook = Workbook::new();

    for (name, frame) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;

        for (position, header) in frame.columns().iter().enumerate() {
            worksheet.write_string(0, sheet_position::<u16>(name, position)?, header)?;
        }

        for (row_position, row) in frame.rows().iter().enumerate() {
            let row_number = sheet_position::<u32>(name, row_position + 1)?;
            for (position, cell) in row.iter().enumerate() {
                let column = sheet_position::<u16>(name, position)?;
                match cell {
                    CellValue::Text(text) => {
                        worksheet.write_string(row_number, column, text)?;
                    }
                    CellValue::Number(value) => {
                        worksheet.write_number(row_number, column, *value)?;
                    }
                    CellValue::Missing => {}
                }
            }
        }

        debug!(
            "Wrote sheet '{}' with {} row(s)",
            name,
            frame.row_count()
        );
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes `frame` as comma-delimited text. `Missing` cells become empty fields.
pub fn write_csv<W: Write>(writer: W, frame: &Frame) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(frame.columns())?;
    for row in frame.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_path(path: &Path, frame: &Frame) -> Result<()> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), frame)
}

pub fn frame_to_csv_string(frame: &Frame) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, frame)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes `frame` as pretty JSON: `{ "columns": [...], "rows": [[...]] }`.
pub fn write_json<W: Write>(writer: W, frame: &Frame) -> Result<()> {
    serde_json::to_writer_pretty(writer, frame)?;
    Ok(())
}

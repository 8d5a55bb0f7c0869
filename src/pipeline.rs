//! File-level processing: decode a source, run a transform over each sheet,
//! report what happened and write the results back out.

use crate::columns::ColumnLayout;
use crate::consolidation::{ConsolidationReport, ResponseConsolidator};
use crate::conversation::{BuildOutcome, ConversationBuilder};
use crate::error::Result;
use crate::ingestion::{read_csv_path, read_workbook, write_csv_path, write_workbook_path, InputFormat};
use crate::schema::{Frame, TransformConfig};
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// Rows shown in a before/after preview.
pub const PREVIEW_ROWS: usize = 10;
/// Message column names listed in a summary before eliding the rest.
const SUMMARY_NAME_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct ProcessedSheet {
    pub name: String,
    pub original: Frame,
    pub processed: Frame,
    pub outcome: BuildOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Processed { sheets: usize },
    NoMessageColumns,
}

#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub source_name: String,
    pub format: InputFormat,
    pub sheets: Vec<ProcessedSheet>,
    pub status: ProcessingStatus,
    marker: String,
}

impl ProcessedFile {
    /// Human readable status line for the whole file.
    pub fn status_message(&self) -> String {
        match (self.status, self.format) {
            (ProcessingStatus::Processed { .. }, InputFormat::Csv) => {
                format!("Successfully processed {}", self.source_name)
            }
            (ProcessingStatus::Processed { sheets }, InputFormat::Workbook) => {
                format!("Successfully processed {} sheet(s) in {}", sheets, self.source_name)
            }
            (ProcessingStatus::NoMessageColumns, InputFormat::Csv) => {
                format!("No {} columns found in {}", self.marker, self.source_name)
            }
            (ProcessingStatus::NoMessageColumns, InputFormat::Workbook) => format!(
                "No {} columns found in any sheet of {}",
                self.marker, self.source_name
            ),
        }
    }

    /// The first original sheet and the first transformed sheet, truncated to
    /// [`PREVIEW_ROWS`] rows.
    pub fn preview(&self) -> (Option<Frame>, Option<Frame>) {
        let original = self.sheets.first().map(|sheet| sheet.original.head(PREVIEW_ROWS));
        let processed = self
            .sheets
            .iter()
            .find(|sheet| sheet.outcome.did_transform())
            .map(|sheet| sheet.processed.head(PREVIEW_ROWS));
        (original, processed)
    }

    /// Summary of the first transformed sheet.
    pub fn summary(&self, config: &TransformConfig) -> Option<ProcessingSummary> {
        self.sheets
            .iter()
            .find(|sheet| sheet.outcome.did_transform())
            .map(|sheet| ProcessingSummary::from_frame(&sheet.original, config))
    }

    pub fn output_name(&self) -> String {
        output_name(&self.source_name, self.format)
    }

    /// Writes the processed sheets into `dir`; returns the file written.
    pub fn write_output(&self, dir: &Path) -> Result<PathBuf> {
        let sheets: Vec<(&str, &Frame)> = self
            .sheets
            .iter()
            .map(|sheet| (sheet.name.as_str(), &sheet.processed))
            .collect();
        write_sheets(dir, &self.source_name, self.format, &sheets)
    }
}

/// Which message columns a build used and where the transcript went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingSummary {
    /// Message column names, ascending by index
    pub message_columns: Vec<String>,
    /// Leftmost message column; the transcript is placed before it
    pub anchor_column: Option<String>,
    pub conversation_column: String,
}

impl ProcessingSummary {
    pub fn from_frame(frame: &Frame, config: &TransformConfig) -> Self {
        let layout = ColumnLayout::scan(frame, config);
        Self {
            message_columns: layout.names().into_iter().map(String::from).collect(),
            anchor_column: layout.first_by_position().map(|column| column.name.clone()),
            conversation_column: config.conversation_column.clone(),
        }
    }
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<&str> = self
            .message_columns
            .iter()
            .take(SUMMARY_NAME_LIMIT)
            .map(String::as_str)
            .collect();
        let ellipsis = if self.message_columns.len() > SUMMARY_NAME_LIMIT {
            "..."
        } else {
            ""
        };

        writeln!(
            f,
            "Found {} message columns: {}{}",
            self.message_columns.len(),
            shown.join(", "),
            ellipsis
        )?;
        match &self.anchor_column {
            Some(anchor) => write!(
                f,
                "Added new '{}' column to the left of {}",
                self.conversation_column, anchor
            ),
            None => write!(f, "No '{}' column was added", self.conversation_column),
        }
    }
}

/// Runs the conversation builder over already decoded sheets, one at a time.
pub fn process_frames(
    source_name: &str,
    format: InputFormat,
    sheets: Vec<(String, Frame)>,
    config: &TransformConfig,
) -> ProcessedFile {
    let builder = ConversationBuilder::new(config.clone());
    let mut processed_sheets = Vec::with_capacity(sheets.len());
    let mut transformed = 0;

    for (name, original) in sheets {
        let (processed, outcome) = builder.apply(original.clone());
        if outcome.did_transform() {
            transformed += 1;
        } else {
            info!("Sheet '{}' of {} has no message columns", name, source_name);
        }
        processed_sheets.push(ProcessedSheet {
            name,
            original,
            processed,
            outcome,
        });
    }

    let status = if transformed > 0 {
        ProcessingStatus::Processed {
            sheets: transformed,
        }
    } else {
        ProcessingStatus::NoMessageColumns
    };

    let file = ProcessedFile {
        source_name: source_name.to_string(),
        format,
        sheets: processed_sheets,
        status,
        marker: config.message_prefix.trim_end_matches('_').to_string(),
    };
    info!("{}", file.status_message());
    file
}

/// Decodes `path` (CSV or workbook) and builds conversations on every sheet.
pub fn process_file(path: &Path, config: &TransformConfig) -> Result<ProcessedFile> {
    let format = InputFormat::from_path(path)?;
    let source_name = file_name(path);
    let sheets = load_sheets(path, format, config)?;
    Ok(process_frames(&source_name, format, sheets, config))
}

#[derive(Debug, Clone)]
pub struct ConsolidatedSheet {
    pub name: String,
    pub frame: Frame,
    pub report: ConsolidationReport,
}

#[derive(Debug, Clone)]
pub struct ConsolidatedFile {
    pub source_name: String,
    pub format: InputFormat,
    pub sheets: Vec<ConsolidatedSheet>,
}

impl ConsolidatedFile {
    pub fn output_name(&self) -> String {
        output_name(&self.source_name, self.format)
    }

    pub fn write_output(&self, dir: &Path) -> Result<PathBuf> {
        let sheets: Vec<(&str, &Frame)> = self
            .sheets
            .iter()
            .map(|sheet| (sheet.name.as_str(), &sheet.frame))
            .collect();
        write_sheets(dir, &self.source_name, self.format, &sheets)
    }
}

/// Decodes `path` and consolidates responses on every sheet. The first
/// schema error aborts the whole file.
pub fn consolidate_file(path: &Path, config: &TransformConfig) -> Result<ConsolidatedFile> {
    let format = InputFormat::from_path(path)?;
    let source_name = file_name(path);
    let consolidator = ResponseConsolidator::new(config.clone());

    let mut sheets = Vec::new();
    for (name, frame) in load_sheets(path, format, config)? {
        let (frame, report) = consolidator.consolidate_with_report(&frame).map_err(|err| {
            warn!("Sheet '{}' of {} cannot be consolidated: {}", name, source_name, err);
            err
        })?;
        sheets.push(ConsolidatedSheet {
            name,
            frame,
            report,
        });
    }

    info!("Consolidated {} sheet(s) in {}", sheets.len(), source_name);
    Ok(ConsolidatedFile {
        source_name,
        format,
        sheets,
    })
}

fn load_sheets(path: &Path, format: InputFormat, config: &TransformConfig) -> Result<Vec<(String, Frame)>> {
    match format {
        InputFormat::Csv => {
            let frame = read_csv_path(path, config)?;
            Ok(vec![(file_stem(path), frame)])
        }
        InputFormat::Workbook => read_workbook(path),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `processed_<name>` for CSV sources; workbooks are always written as
/// `processed_<stem>.xlsx`.
pub fn output_name(source_name: &str, format: InputFormat) -> String {
    match format {
        InputFormat::Csv => format!("processed_{}", source_name),
        InputFormat::Workbook => {
            let stem = Path::new(source_name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| source_name.to_string());
            format!("processed_{}.xlsx", stem)
        }
    }
}

/// CSV sources produce one CSV file; workbooks produce one workbook holding
/// every sheet in source order.
fn write_sheets(
    dir: &Path,
    source_name: &str,
    format: InputFormat,
    sheets: &[(&str, &Frame)],
) -> Result<PathBuf> {
    let path = dir.join(output_name(source_name, format));

    match format {
        InputFormat::Csv => {
            let empty = Frame::default();
            let frame = sheets.first().map_or(&empty, |(_, frame)| *frame);
            write_csv_path(&path, frame)?;
        }
        InputFormat::Workbook => write_workbook_path(&path, sheets)?,
    }

    info!("Wrote {} sheet(s) to {}", sheets.len(), path.display());
    Ok(path)
}

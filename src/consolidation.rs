//! Pivots per-response rows into one row per chat id.
//!
//! Two merge policies coexist in a single pass over the input:
//! - base row data: first row seen for a chat id wins ([`BaseSnapshots`])
//! - response values: last row seen for a (chat id, kind) pair wins ([`ResponseLookup`])

use crate::columns::ColumnLayout;
use crate::error::{RestructureError, Result};
use crate::schema::{CellValue, Frame, TransformConfig};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Base row data per chat id, in order of first appearance. Insert-if-absent.
#[derive(Debug, Default)]
pub struct BaseSnapshots {
    order: Vec<CellValue>,
    rows: HashMap<CellValue, Vec<CellValue>>,
}

impl BaseSnapshots {
    /// Stores `row` for `chat_id` unless one is already stored.
    /// Returns true when the chat id was new.
    pub fn insert_if_absent(&mut self, chat_id: &CellValue, row: impl FnOnce() -> Vec<CellValue>) -> bool {
        if self.rows.contains_key(chat_id) {
            return false;
        }
        self.order.push(chat_id.clone());
        self.rows.insert(chat_id.clone(), row());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Chat ids with their snapshots, in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&CellValue, &Vec<CellValue>)> {
        self.order
            .iter()
            .filter_map(move |chat_id| self.rows.get(chat_id).map(|row| (chat_id, row)))
    }
}

/// Effective message per (chat id, response kind). Always overwrites.
#[derive(Debug, Default)]
pub struct ResponseLookup {
    values: HashMap<(CellValue, CellValue), CellValue>,
}

impl ResponseLookup {
    /// Stores `value`, returning the value it replaced.
    pub fn overwrite(&mut self, chat_id: CellValue, kind: CellValue, value: CellValue) -> Option<CellValue> {
        self.values.insert((chat_id, kind), value)
    }

    pub fn get(&self, chat_id: &CellValue, kind: &CellValue) -> Option<&CellValue> {
        // Tuple keys need owned parts for lookup
        self.values.get(&(chat_id.clone(), kind.clone()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn kinds(&self) -> HashSet<&CellValue> {
        self.values.keys().map(|(_, kind)| kind).collect()
    }
}

/// Counters from one consolidation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationReport {
    pub input_rows: usize,
    pub chat_ids: usize,
    pub responses_recorded: usize,
    /// Rows whose message columns were all blank or missing
    pub rows_without_message: usize,
    /// Response kinds that were tracked but have no output column
    pub ignored_kinds: Vec<CellValue>,
}

#[derive(Debug, Clone, Copy)]
struct KeyColumns {
    chat_id: usize,
    response_kind: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseConsolidator {
    config: TransformConfig,
}

impl ResponseConsolidator {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn consolidate(&self, frame: &Frame) -> Result<Frame> {
        self.consolidate_with_report(frame).map(|(output, _)| output)
    }

    pub fn consolidate_with_report(&self, frame: &Frame) -> Result<(Frame, ConsolidationReport)> {
        let layout = ColumnLayout::scan(frame, &self.config);
        let keys = self.validate(frame, &layout)?;

        let mut snapshots = BaseSnapshots::default();
        let mut responses = ResponseLookup::default();
        let mut report = ConsolidationReport {
            input_rows: frame.row_count(),
            ..ConsolidationReport::default()
        };

        for row in frame.rows() {
            let chat_id = &row[keys.chat_id];
            let kind = &row[keys.response_kind];

            if snapshots.insert_if_absent(chat_id, || {
                row.iter()
                    .enumerate()
                    .filter(|(position, _)| *position != keys.response_kind)
                    .map(|(_, cell)| cell.clone())
                    .collect()
            }) {
                debug!("New chat id '{}'", chat_id);
            }

            // Highest-indexed populated message column wins within a row
            let effective = layout
                .descending()
                .find_map(|column| row.get(column.position).and_then(|cell| cell.presence().value()));

            match effective {
                Some(value) => {
                    if responses
                        .overwrite(chat_id.clone(), kind.clone(), value.clone())
                        .is_some()
                    {
                        debug!("Chat id '{}': later '{}' response replaces earlier one", chat_id, kind);
                    }
                }
                None => report.rows_without_message += 1,
            }
        }

        let expected = CellValue::text(self.config.expected_label.as_str());
        let actual = CellValue::text(self.config.actual_label.as_str());

        let mut columns: Vec<String> = frame
            .columns()
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != keys.response_kind)
            .map(|(_, name)| name.clone())
            .collect();
        columns.push(self.config.expected_label.clone());
        columns.push(self.config.actual_label.clone());

        let mut output = Frame::new(columns);
        for (chat_id, base) in snapshots.iter() {
            let mut row = base.clone();
            row.push(responses.get(chat_id, &expected).cloned().unwrap_or_default());
            row.push(responses.get(chat_id, &actual).cloned().unwrap_or_default());
            output.push_row(row);
        }

        let mut ignored: Vec<CellValue> = responses
            .kinds()
            .into_iter()
            .filter(|kind| **kind != expected && **kind != actual)
            .cloned()
            .collect();
        ignored.sort_by_key(|kind| kind.to_string());
        if !ignored.is_empty() {
            warn!(
                "Response kind(s) without an output column were dropped: {}",
                ignored
                    .iter()
                    .map(|kind| format!("'{}'", kind))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        report.chat_ids = snapshots.len();
        report.responses_recorded = responses.len();
        report.ignored_kinds = ignored;

        info!(
            "Consolidated {} row(s) into {} chat id(s)",
            report.input_rows, report.chat_ids
        );

        Ok((output, report))
    }

    fn validate(&self, frame: &Frame, layout: &ColumnLayout) -> Result<KeyColumns> {
        let chat_id = frame.column_index(&self.config.chat_id_column);
        let response_kind = frame.column_index(&self.config.response_kind_column);

        let mut missing = Vec::new();
        if chat_id.is_none() {
            missing.push(self.config.chat_id_column.clone());
        }
        if response_kind.is_none() {
            missing.push(self.config.response_kind_column.clone());
        }
        if !layout.has_messages() {
            missing.push(format!("{}<n> message columns", self.config.message_prefix));
        }

        match (chat_id, response_kind) {
            (Some(chat_id), Some(response_kind)) if missing.is_empty() => Ok(KeyColumns {
                chat_id,
                response_kind,
            }),
            _ => Err(RestructureError::Schema { missing }),
        }
    }
}

/// Runs a default-configured [`ResponseConsolidator`] over `frame`.
pub fn consolidate_responses(frame: &Frame) -> Result<Frame> {
    ResponseConsolidator::default().consolidate(frame)
}

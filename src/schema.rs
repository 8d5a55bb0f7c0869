use crate::utils::format_number;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single cell of a decoded table.
///
/// Serializes untagged: text as a JSON string, numbers as JSON numbers and
/// missing cells as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Missing,
}

/// How a cell participates in message extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence<'a> {
    Present(&'a CellValue),
    /// Text that is empty after trimming whitespace
    Blank,
    Absent,
}

impl<'a> Presence<'a> {
    pub fn value(self) -> Option<&'a CellValue> {
        match self {
            Presence::Present(value) => Some(value),
            Presence::Blank | Presence::Absent => None,
        }
    }
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn presence(&self) -> Presence<'_> {
        match self {
            CellValue::Missing => Presence::Absent,
            CellValue::Text(text) if text.trim().is_empty() => Presence::Blank,
            CellValue::Text(_) | CellValue::Number(_) => Presence::Present(self),
        }
    }

    /// Bit pattern used for equality and hashing of numeric cells.
    fn number_key(value: f64) -> u64 {
        if value.is_nan() {
            f64::NAN.to_bits()
        } else if value == 0.0 {
            0.0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => {
                Self::number_key(*a) == Self::number_key(*b)
            }
            (CellValue::Missing, CellValue::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(text) => text.hash(state),
            CellValue::Number(value) => Self::number_key(*value).hash(state),
            CellValue::Missing => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(value) => f.write_str(&format_number(*value)),
            CellValue::Missing => Ok(()),
        }
    }
}

/// An in-memory table: ordered named columns and ordered rows.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(from = "FrameData")]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Wire shape of a [`Frame`]; rows are normalised on the way in.
#[derive(Deserialize)]
struct FrameData {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

impl From<FrameData> for Frame {
    fn from(data: FrameData) -> Self {
        Frame::from_rows(data.columns, data.rows)
    }
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a frame, padding short rows with `Missing` and truncating long ones.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut frame = Self::new(columns);
        for row in rows {
            frame.push_row(row);
        }
        frame
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Cell lookup by column name, using the first column with that name.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.column_index(column)
            .and_then(|index| self.cell(row, index))
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Missing);
        self.rows.push(row);
    }

    /// Splices a new column in at `position`; `values` is aligned with the rows
    /// and padded with `Missing` when short.
    pub fn insert_column(&mut self, position: usize, name: impl Into<String>, values: Vec<CellValue>) {
        let position = position.min(self.columns.len());
        self.columns.insert(position, name.into());

        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(position, values.next().unwrap_or(CellValue::Missing));
        }
    }

    /// Overwrites an existing column's cells in row order.
    pub fn replace_column(&mut self, position: usize, values: Vec<CellValue>) {
        let mut values = values.into_iter();
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(position) {
                *cell = values.next().unwrap_or(CellValue::Missing);
            }
        }
    }

    /// A preview holding the first `n` rows.
    pub fn head(&self, n: usize) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TransformConfig {
    #[schemars(description = "Name of the transcript column inserted by the conversation builder.")]
    pub conversation_column: String,

    #[schemars(
        description = "Prefix that marks a numbered message column. The remainder of the name must be a base-10 integer (e.g. 'Message_No_3')."
    )]
    pub message_prefix: String,

    #[schemars(description = "Column holding the chat id used to group rows during consolidation.")]
    pub chat_id_column: String,

    #[schemars(
        description = "Column holding the response kind of each row ('Expected' or 'Actual'). It is dropped from consolidated output."
    )]
    pub response_kind_column: String,

    #[schemars(description = "Response kind label for reference outputs; also the name of the appended output column.")]
    pub expected_label: String,

    #[schemars(description = "Response kind label for observed outputs; also the name of the appended output column.")]
    pub actual_label: String,

    #[schemars(description = "Role prefix for odd-numbered message columns.")]
    pub bot_label: String,

    #[schemars(description = "Role prefix for even-numbered message columns.")]
    pub user_label: String,

    #[schemars(
        description = "When true, numeric-looking fields of delimited text are decoded as numbers instead of text."
    )]
    pub infer_numbers: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            conversation_column: "Conversation".to_string(),
            message_prefix: "Message_No_".to_string(),
            chat_id_column: "ChatID".to_string(),
            response_kind_column: "ActualOrExpected".to_string(),
            expected_label: "Expected".to_string(),
            actual_label: "Actual".to_string(),
            bot_label: "Bot".to_string(),
            user_label: "User".to_string(),
            infer_numbers: true,
        }
    }
}

impl TransformConfig {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TransformConfig)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Loads a config document; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

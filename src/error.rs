use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestructureError {
    #[error("Schema error: {}", describe_missing(.missing))]
    Schema { missing: Vec<String> },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("The workbook does not contain any worksheets")]
    EmptyWorkbook,

    #[error("Sheet '{sheet}' exceeds the worksheet size limits")]
    SheetTooLarge { sheet: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RestructureError {
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

fn describe_missing(missing: &[String]) -> String {
    format!("missing required field(s): {}", missing.join(", "))
}

pub type Result<T> = std::result::Result<T, RestructureError>;

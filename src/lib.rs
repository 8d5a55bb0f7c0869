//! # Chat Log Restructurer
//!
//! A library for turning tabular chat-log exports (CSV files or spreadsheet
//! workbooks) into shapes that are easier to analyse.
//!
//! ## Core Concepts
//!
//! - **Message columns**: columns named `Message_No_<n>`. Odd `n` carries bot turns, even `n` user turns
//! - **Conversation**: every populated message cell of a row, in index order, rendered as `"<Role>: <value>"` and joined by newlines
//! - **Chat group**: all rows sharing a `ChatID`, each tagged `Expected` or `Actual` in `ActualOrExpected`
//! - **Consolidation**: one output row per chat id carrying both the expected and the actual response
//!
//! ## Example
//!
//! ```rust
//! use chat_log_restructurer::*;
//!
//! let frame = Frame::from_rows(
//!     vec!["ChatID".to_string(), "Message_No_1".to_string(), "Message_No_2".to_string()],
//!     vec![vec![CellValue::text("c1"), CellValue::text("hi"), CellValue::text("hello")]],
//! );
//!
//! let (frame, transformed) = build_conversations(frame);
//! assert!(transformed);
//! assert_eq!(
//!     frame.value(0, "Conversation"),
//!     Some(&CellValue::text("Bot: hi\nUser: hello"))
//! );
//! ```

pub mod columns;
pub mod consolidation;
pub mod conversation;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod schema;
pub mod utils;

pub use columns::{parse_message_index, ColumnLayout, MessageColumn, Role};
pub use consolidation::{
    consolidate_responses, BaseSnapshots, ConsolidationReport, ResponseConsolidator,
    ResponseLookup,
};
pub use conversation::{build_conversations, BuildOutcome, ConversationBuilder};
pub use error::{RestructureError, Result};
pub use ingestion::*;
pub use pipeline::*;
pub use schema::*;

use log::debug;
use std::path::Path;

/// Entry point bundling both transforms behind one configuration.
#[derive(Debug, Clone, Default)]
pub struct ChatLogProcessor {
    config: TransformConfig,
}

impl ChatLogProcessor {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn build_conversations(&self, frame: Frame) -> (Frame, bool) {
        ConversationBuilder::new(self.config.clone()).build(frame)
    }

    pub fn consolidate_responses(&self, frame: &Frame) -> Result<Frame> {
        ResponseConsolidator::new(self.config.clone()).consolidate(frame)
    }

    pub fn process_file(&self, path: &Path) -> Result<ProcessedFile> {
        debug!("Processing {}", path.display());
        pipeline::process_file(path, &self.config)
    }

    pub fn consolidate_file(&self, path: &Path) -> Result<ConsolidatedFile> {
        debug!("Consolidating {}", path.display());
        pipeline::consolidate_file(path, &self.config)
    }
}

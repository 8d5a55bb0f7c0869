use crate::columns::{ColumnLayout, MessageColumn};
use crate::schema::{CellValue, Frame, TransformConfig};
use log::{debug, info};

/// What a conversation build did to the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A new transcript column was spliced in at `position`.
    Inserted {
        position: usize,
        /// Message column names in ascending index order
        message_columns: Vec<String>,
    },
    /// The frame already had a transcript column; its cells were regenerated.
    Refreshed { position: usize },
    /// No message columns were found and the frame was returned untouched.
    NoMessageColumns,
}

impl BuildOutcome {
    pub fn did_transform(&self) -> bool {
        !matches!(self, BuildOutcome::NoMessageColumns)
    }
}

/// Folds numbered message columns into a single role-prefixed transcript column.
#[derive(Debug, Clone, Default)]
pub struct ConversationBuilder {
    config: TransformConfig,
}

impl ConversationBuilder {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Returns the transformed frame and whether a transcript was written.
    pub fn build(&self, frame: Frame) -> (Frame, bool) {
        let (frame, outcome) = self.apply(frame);
        (frame, outcome.did_transform())
    }

    pub fn apply(&self, mut frame: Frame) -> (Frame, BuildOutcome) {
        let layout = ColumnLayout::scan(&frame, &self.config);
        if !layout.has_messages() {
            debug!(
                "No {}<n> columns among {} column(s); frame left unchanged",
                self.config.message_prefix,
                frame.column_count()
            );
            return (frame, BuildOutcome::NoMessageColumns);
        }

        debug!(
            "Building conversations from {} message column(s): {}",
            layout.message_count(),
            layout.names().join(", ")
        );

        let transcripts: Vec<CellValue> = frame
            .rows()
            .iter()
            .map(|row| CellValue::Text(self.transcript(row, layout.ascending())))
            .collect();

        let outcome = match frame.column_index(&self.config.conversation_column) {
            Some(position) => {
                frame.replace_column(position, transcripts);
                BuildOutcome::Refreshed { position }
            }
            None => {
                // has_messages() guarantees a first position
                let position = layout.first_position().unwrap_or(0);
                frame.insert_column(position, self.config.conversation_column.clone(), transcripts);
                BuildOutcome::Inserted {
                    position,
                    message_columns: layout.names().into_iter().map(String::from).collect(),
                }
            }
        };

        info!(
            "Built '{}' column for {} row(s) ({:?})",
            self.config.conversation_column,
            frame.row_count(),
            outcome
        );

        (frame, outcome)
    }

    /// Renders one row's transcript. Blank and missing cells are skipped.
    fn transcript(&self, row: &[CellValue], columns: &[MessageColumn]) -> String {
        columns
            .iter()
            .filter_map(|column| {
                let value = row.get(column.position)?.presence().value()?;
                Some(format!("{}: {}", column.role().label(&self.config), value))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Runs a default-configured [`ConversationBuilder`] over `frame`.
pub fn build_conversations(frame: Frame) -> (Frame, bool) {
    ConversationBuilder::default().build(frame)
}

//! Classification of column names into plain columns and numbered message columns.
//!
//! Names are parsed once per frame; both transforms consume the resulting
//! [`ColumnLayout`] instead of re-matching names per row.

use crate::schema::{Frame, TransformConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Bot,
    User,
}

impl Role {
    /// Odd indices belong to the bot, even indices to the user.
    pub fn for_index(index: u64) -> Self {
        if index % 2 == 1 {
            Role::Bot
        } else {
            Role::User
        }
    }

    pub fn label<'a>(&self, config: &'a TransformConfig) -> &'a str {
        match self {
            Role::Bot => &config.bot_label,
            Role::User => &config.user_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageColumn {
    /// Integer suffix of the column name
    pub index: u64,
    /// Position of the column in the frame
    pub position: usize,
    pub name: String,
}

impl MessageColumn {
    pub fn role(&self) -> Role {
        Role::for_index(self.index)
    }
}

/// Parses the integer suffix of a message column name.
///
/// The whole remainder after `prefix` must be ASCII digits; signs, spaces
/// and trailing text disqualify the column. Matching is case-sensitive.
pub fn parse_message_index(name: &str, prefix: &str) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// The classified columns of one frame.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    /// Message columns sorted ascending by index. Equal indices keep frame order.
    messages: Vec<MessageColumn>,
}

impl ColumnLayout {
    pub fn scan(frame: &Frame, config: &TransformConfig) -> Self {
        Self::scan_names(frame.columns(), &config.message_prefix)
    }

    pub fn scan_names(columns: &[String], prefix: &str) -> Self {
        let mut messages: Vec<MessageColumn> = columns
            .iter()
            .enumerate()
            .filter_map(|(position, name)| {
                parse_message_index(name, prefix).map(|index| MessageColumn {
                    index,
                    position,
                    name: name.clone(),
                })
            })
            .collect();

        // Stable sort: duplicate indices stay in column order
        messages.sort_by_key(|column| column.index);

        Self { messages }
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn ascending(&self) -> &[MessageColumn] {
        &self.messages
    }

    pub fn descending(&self) -> impl Iterator<Item = &MessageColumn> {
        self.messages.iter().rev()
    }

    /// The leftmost message column in the frame.
    pub fn first_by_position(&self) -> Option<&MessageColumn> {
        self.messages.iter().min_by_key(|column| column.position)
    }

    pub fn first_position(&self) -> Option<usize> {
        self.first_by_position().map(|column| column.position)
    }

    pub fn names(&self) -> Vec<&str> {
        self.messages.iter().map(|column| column.name.as_str()).collect()
    }
}

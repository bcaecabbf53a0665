//! Inline keyboard markup in Telegraf's shape
//!
//! Handlers build keyboards with these helpers; the platform adapter turns
//! them into the native client's markup.

use serde::{Deserialize, Serialize};

/// A single inline button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    Callback { text: String, data: String },
    Url { text: String, url: String },
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Button::Callback { text: text.into(), data: data.into() }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Url { text: text.into(), url: url.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Button::Callback { text, .. } | Button::Url { text, .. } => text,
        }
    }
}

/// Rows of inline buttons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn inline(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// One button per row
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

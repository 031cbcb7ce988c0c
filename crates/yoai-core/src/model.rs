//! Request payload types for the bot API.

use serde::{Deserialize, Serialize};

/// A reply-keyboard option shown under a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonOption {
    /// Text shown on the button.
    pub label: String,
    /// Text sent back to the bot when the button is pressed.
    pub value: String,
}

impl ButtonOption {
    /// Creates an option.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// An inline button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Text shown on the button.
    pub label: String,
    /// Target URL.
    pub url: String,
}

impl InlineButton {
    /// Creates an inline button.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Button layout attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buttons {
    /// Number of buttons per row.
    pub grid: u32,
    /// Reply-keyboard options.
    pub options: Vec<ButtonOption>,
    /// URL buttons.
    pub inline_buttons: Vec<InlineButton>,
}

impl Default for Buttons {
    fn default() -> Self {
        Self {
            grid: 1,
            options: Vec::new(),
            inline_buttons: Vec::new(),
        }
    }
}

impl Buttons {
    /// Creates an empty single-column layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of buttons per row.
    pub fn grid(mut self, grid: u32) -> Self {
        self.grid = grid;
        self
    }

    /// Adds a reply-keyboard option.
    pub fn option(mut self, option: ButtonOption) -> Self {
        self.options.push(option);
        self
    }

    /// Adds an inline URL button.
    pub fn inline(mut self, button: InlineButton) -> Self {
        self.inline_buttons.push(button);
        self
    }
}

/// A command advertised in the client's command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    /// Command name without the leading `/`.
    pub command: String,
    /// Short help text.
    pub description: String,
}

impl BotCommand {
    /// Creates a command entry.
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

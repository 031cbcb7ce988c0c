//! Command token extraction.
//!
//! A command is recognized purely by its text: the first whitespace-delimited
//! word, when the text starts with [`COMMAND_PREFIX`]. No argument schema is
//! imposed; [`command_args`] hands the remainder to the handler as-is.

/// Prefix that marks a message as a command.
pub const COMMAND_PREFIX: char = '/';

/// Returns the command token of `text`, prefix included.
///
/// The token runs up to the first whitespace character, or to the end of the
/// text if there is none. Text that does not start with the prefix has no
/// token.
///
/// ```rust,ignore
/// assert_eq!(command_token("/echo hello"), Some("/echo"));
/// assert_eq!(command_token("/start"), Some("/start"));
/// assert_eq!(command_token("hello /echo"), None);
/// ```
pub fn command_token(text: &str) -> Option<&str> {
    if !text.starts_with(COMMAND_PREFIX) {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some(&text[..end])
}

/// Returns everything after the command token, trimmed.
pub fn command_args(text: &str) -> Option<&str> {
    let token = command_token(text)?;
    Some(text[token.len()..].trim())
}

/// Builds the registry key for a command registered as `name`.
pub fn command_key(name: &str) -> String {
    format!("{COMMAND_PREFIX}{name}")
}

//! Constants for the interactive search prompt

/// Maximum number of URLs kept in the back/forward history
pub const MAX_NAVIGATION_HISTORY: usize = 50;

/// Prompt shown before each input line
pub const PROMPT: &str = "search> ";

/// Prefix that marks a line as a command instead of a search term
pub const COMMAND_PREFIX: char = ':';

/// Characters of result details shown before truncating
pub const DETAILS_PREVIEW_CHARS: usize = 120;

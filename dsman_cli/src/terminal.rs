//! Terminal detection for colored output

use is_terminal::IsTerminal;
use std::env;
use std::io::{stderr, stdout};

/// Whether records written to stdout land on a terminal that renders ANSI colors
pub fn stdout_supports_color() -> bool {
    stdout().is_terminal() && term_supports_color()
}

/// Whether diagnostics written to stderr land on a terminal
pub fn stderr_is_terminal() -> bool {
    stderr().is_terminal() && term_supports_color()
}

#[cfg(windows)]
fn term_supports_color() -> bool {
    true
}

#[cfg(not(windows))]
fn term_supports_color() -> bool {
    !matches!(env::var("TERM").as_deref(), Ok("dumb") | Ok("") | Err(_))
}

/// Determine if record output should be colored
///
/// Honors the `output.color_enabled` setting and the `NO_COLOR` convention.
pub fn should_use_color(color_enabled: bool) -> bool {
    color_enabled && env::var_os("NO_COLOR").is_none() && stdout_supports_color()
}

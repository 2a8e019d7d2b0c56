//! Terminal display and formatting utilities.
//!
//! Handles colorized JSON output and token status rendering for
//! human-readable terminal output.

use std::io::IsTerminal;

pub mod json_printer;
pub mod token_status;

/// Color only when writing to a terminal and `NO_COLOR` is unset.
pub fn use_color(json_mode: bool) -> bool {
    !json_mode && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Print a section heading such as `--- Header ---`.
pub fn print_section(title: &str) {
    println!("--- {title} ---");
}

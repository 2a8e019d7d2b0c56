//! Colorized JSON pretty-printing for terminal output.
//!
//! Renders JSON values with syntax highlighting:
//! - Field names in cyan
//! - Strings in green
//! - Numbers in yellow
//! - Booleans in magenta
//! - Null in red

use std::fmt::Write;

use serde_json::Value;

const RESET: &str = "\x1b[0m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const RED: &str = "\x1b[31m";

/// Print a JSON value with colorized syntax highlighting.
///
/// When `use_color` is false, outputs plain JSON without colors
/// (suitable for machine consumption or piping).
pub fn print_json(value: &Value, use_color: bool) {
    println!("{}", render_json(value, use_color));
}

/// Render a JSON value with 2-space indentation.
pub fn render_json(value: &Value, use_color: bool) -> String {
    let mut out = String::new();
    render(value, use_color, 0, &mut out);
    out
}

fn render(value: &Value, color: bool, depth: usize, out: &mut String) {
    match value {
        Value::Null => paint(out, "null", RED, color),
        Value::Bool(b) => paint(out, &b.to_string(), MAGENTA, color),
        Value::Number(n) => paint(out, &n.to_string(), YELLOW, color),
        // Display on a Value yields the escaped JSON literal.
        Value::String(_) => paint(out, &value.to_string(), GREEN, color),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                indent(out, depth + 1);
                render(item, color, depth + 1, out);
                separator(out, i + 1 < items.len());
            }
            indent(out, depth);
            out.push(']');
        }
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                indent(out, depth + 1);
                paint(out, &Value::String(key.clone()).to_string(), CYAN, color);
                out.push_str(": ");
                render(item, color, depth + 1, out);
                separator(out, i + 1 < map.len());
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

fn paint(out: &mut String, text: &str, code: &str, color: bool) {
    if color {
        let _ = write!(out, "{code}{text}{RESET}");
    } else {
        out.push_str(text);
    }
}

fn indent(out: &mut String, depth: usize) {
    out.push_str(&"  ".repeat(depth));
}

fn separator(out: &mut String, more: bool) {
    out.push_str(if more { ",\n" } else { "\n" });
}

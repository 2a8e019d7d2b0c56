//! Handler for the `decode` subcommand.
//!
//! Decodes and pretty-prints a token's header and payload without
//! verifying its signature. Supports reading the token from a CLI
//! argument, environment variable, or stdin.

use anyhow::Result;
use apple_signin::core::decoder;
use chrono::Utc;
use serde_json::json;

use crate::cli::DecodeArgs;
use crate::display::{self, json_printer, token_status};
use crate::input;

/// Execute the `decode` subcommand with the given arguments.
pub fn execute(args: &DecodeArgs) -> Result<()> {
    let token = input::read_token(args.token.as_deref(), args.token_env.as_deref())?;
    let decoded = decoder::decode_token(&token)?;

    if args.json {
        let output = json!({
            "header": decoded.header,
            "payload": decoded.payload,
        });
        json_printer::print_json(&output, false);
        return Ok(());
    }

    let color = display::use_color(args.json);
    display::print_section("Header");
    json_printer::print_json(&decoded.header, color);
    display::print_section("Payload");
    json_printer::print_json(&decoded.payload, color);
    token_status::display_token_status(&decoded.payload, Utc::now(), color);
    println!("Signature: not verified (use `verify`)");
    Ok(())
}

//! Handler for the `verify` subcommand.
//!
//! Verifies a token against the published key set, optionally at a
//! simulated time (`--at`) and optionally requiring a specific subject
//! (`--user`).

use anyhow::Result;
use apple_signin::core::decoder;
use apple_signin::{FixedClock, Payload, TokenVerifier, VerificationError};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::cli::VerifyArgs;
use crate::display::{self, json_printer, token_status};
use crate::input;
use crate::time_travel::parse_time_expression;

/// Execute the `verify` subcommand with the given arguments.
///
/// Returns `Ok(true)` if the token verified (and matched `--user`, when
/// given), `Ok(false)` if it was rejected. Input and configuration
/// problems are errors.
pub fn execute(args: &VerifyArgs) -> Result<bool> {
    let token = input::read_token(args.token.as_deref(), args.token_env.as_deref())?;
    let config = super::verifier_config(&args.key_set).with_clock_skew_seconds(args.clock_skew);
    let mut verifier = TokenVerifier::new(config)?;

    let now = Utc::now();
    let time_target = args
        .at
        .as_deref()
        .map(|expr| parse_time_expression(expr, now))
        .transpose()?;
    if let Some(target) = &time_target {
        verifier = verifier.with_clock(FixedClock(target.timestamp));
    }

    match verifier.verify_payload(&token) {
        Ok(payload) => {
            let user_matches = args.user.as_deref().map(|user| payload.verify_user(user));
            let evaluated_at = time_target.as_ref().map_or(now, |t| t.timestamp);
            report_verified(args, &token, &payload, user_matches, evaluated_at);
            if let Some(target) = &time_target
                && !args.json
            {
                println!(
                    "Evaluated at: {} ({})",
                    target.timestamp.to_rfc3339(),
                    target.expression
                );
            }
            Ok(user_matches.unwrap_or(true))
        }
        Err(e) => {
            report_rejected(args, &e);
            Ok(false)
        }
    }
}

fn report_verified(
    args: &VerifyArgs,
    token: &str,
    payload: &Payload,
    user_matches: Option<bool>,
    evaluated_at: DateTime<Utc>,
) {
    let header = decoder::decode_header(token).ok();

    if args.json {
        let mut output = json!({
            "verified": true,
            "kid": header.as_ref().map(|h| h.kid.as_str()),
            "alg": header.as_ref().map(|h| h.alg.as_str()),
            "payload": payload.claims(),
        });
        if let Some(matches) = user_matches {
            output["user_matches"] = Value::Bool(matches);
        }
        json_printer::print_json(&output, false);
        return;
    }

    let color = display::use_color(args.json);
    let claims = Value::Object(payload.claims().clone());
    display::print_section("Payload");
    json_printer::print_json(&claims, color);
    token_status::display_token_status(&claims, evaluated_at, color);

    display::print_section("Verification");
    if let Some(header) = header {
        println!("Key: {} ({})", header.kid, header.alg);
    }
    println!("Result: VERIFIED");
    match user_matches {
        Some(true) => println!("User: MATCH"),
        Some(false) => println!("User: MISMATCH"),
        None => {}
    }
}

fn report_rejected(args: &VerifyArgs, error: &VerificationError) {
    if args.json {
        let output = json!({
            "verified": false,
            "error": error.to_string(),
            "retryable": error.is_retryable(),
        });
        json_printer::print_json(&output, false);
        return;
    }

    display::print_section("Verification");
    println!("Result: REJECTED ({error})");
    if error.is_retryable() {
        println!("The key set could not be fetched; retrying may succeed.");
    }
}

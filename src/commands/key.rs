//! Handler for the `key` subcommand.
//!
//! Fetches the published key set, rebuilds the key named by `kid` and
//! prints its algorithm, size, RFC 7638 thumbprint and PEM encoding.

use anyhow::{Context, Result};
use apple_signin::TokenVerifier;
use serde_json::json;

use crate::cli::KeyArgs;
use crate::display::{self, json_printer};

/// Execute the `key` subcommand with the given arguments.
pub fn execute(args: &KeyArgs) -> Result<()> {
    let verifier = TokenVerifier::new(super::verifier_config(&args.key_set))?;
    let material = verifier
        .fetch_public_key(&args.kid)
        .context("failed to load signing key")?;
    let pem = material.public_key.to_pem()?;
    let algorithm = format!("{:?}", material.algorithm);

    if args.json {
        let output = json!({
            "kid": material.kid,
            "alg": algorithm,
            "modulus_bits": material.public_key.modulus_bits(),
            "thumbprint": material.public_key.thumbprint(),
            "pem": pem,
        });
        json_printer::print_json(&output, false);
        return Ok(());
    }

    display::print_section("Key");
    println!("Key ID: {}", material.kid);
    println!("Algorithm: {algorithm}");
    println!("Modulus: {} bits", material.public_key.modulus_bits());
    println!("Thumbprint: {}", material.public_key.thumbprint());
    print!("{pem}");
    Ok(())
}

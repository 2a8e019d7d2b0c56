//! Command handlers for each CLI subcommand.
//!
//! Each subcommand is implemented in its own module and exposes
//! a single `execute` function that receives the parsed arguments.

use std::time::Duration;

use apple_signin::VerifierConfig;

use crate::cli::KeySetArgs;

pub mod decode;
pub mod key;
pub mod verify;

/// Verifier settings shared by the commands that fetch keys.
fn verifier_config(key_set: &KeySetArgs) -> VerifierConfig {
    VerifierConfig::default()
        .with_key_set_url(key_set.keys_url.clone())
        .with_timeout(Duration::from_secs(key_set.timeout))
}

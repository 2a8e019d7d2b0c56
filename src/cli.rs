//! CLI argument definitions for apple-signin.
//!
//! Uses `clap` derive macros to define the command-line interface.
//! Each subcommand has its own argument struct for type-safe parsing.
//!
//! # Security
//!
//! `DecodeArgs` and `VerifyArgs` implement custom `Debug` to redact the
//! token and user identifier, preventing accidental leakage through
//! debug formatting, error chains, or logging.

use std::fmt;

use apple_signin::config::{APPLE_KEYS_URL, DEFAULT_TIMEOUT_SECS};
use clap::{Parser, Subcommand};

/// Inspect and verify Sign in with Apple identity tokens (JWT) against
/// Apple's published signing keys.
#[derive(Debug, Parser)]
#[command(name = "apple-signin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log verification steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode and inspect an identity token without verifying it.
    Decode(DecodeArgs),

    /// Verify an identity token's signature and time claims.
    Verify(VerifyArgs),

    /// Fetch one signing key from the key set and show its details.
    Key(KeyArgs),
}

/// Where to fetch signing keys from.
#[derive(Debug, clap::Args)]
pub struct KeySetArgs {
    /// URL of the published key set.
    ///
    /// Must be HTTPS unless it points at localhost.
    #[arg(long, value_name = "URL", env = "APPLE_SIGNIN_KEYS_URL", default_value = APPLE_KEYS_URL)]
    pub keys_url: String,

    /// Timeout in seconds for fetching the key set.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

/// Arguments for the `decode` subcommand.
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// The identity token to decode. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts the token field to prevent accidental leakage.
impl fmt::Debug for DecodeArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `verify` subcommand.
#[derive(clap::Args)]
pub struct VerifyArgs {
    /// The identity token to verify. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    #[command(flatten)]
    pub key_set: KeySetArgs,

    /// Seconds of clock skew tolerated for exp, nbf and iat.
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub clock_skew: u64,

    /// Evaluate exp, nbf and iat at a different time.
    ///
    /// Accepts relative expressions like "+7d", "-1h", "+30m" or
    /// absolute timestamps in RFC 3339 or Unix epoch format.
    #[arg(long, value_name = "EXPR", allow_hyphen_values = true)]
    pub at: Option<String>,

    /// Also require the token's subject to equal this user identifier.
    #[arg(long, value_name = "SUB")]
    pub user: Option<String>,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts the token and user identifier.
impl fmt::Debug for VerifyArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("key_set", &self.key_set)
            .field("clock_skew", &self.clock_skew)
            .field("at", &self.at)
            .field("user", &self.user.as_ref().map(|_| "[REDACTED]"))
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `key` subcommand.
#[derive(Debug, clap::Args)]
pub struct KeyArgs {
    /// Key identifier (`kid`) to look up.
    pub kid: String,

    #[command(flatten)]
    pub key_set: KeySetArgs,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

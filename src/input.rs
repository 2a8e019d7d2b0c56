//! Token input for the CLI.
//!
//! A token comes from the positional argument, a named environment
//! variable, or stdin, in that order of precedence. Every copy is held
//! in a [`Zeroizing`] buffer so it is wiped when dropped.

use std::io::{IsTerminal, Read};

use thiserror::Error;
use zeroize::Zeroizing;

/// Longest token accepted on stdin.
const MAX_STDIN_BYTES: u64 = 64 * 1024;

/// Problems with what the user handed the CLI.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no token provided: pass it as an argument, with --token-env, or on stdin")]
    NoTokenProvided,

    #[error("environment variable '{name}' is not set or not valid UTF-8")]
    EnvVarNotFound { name: String },

    #[error("invalid environment variable name '{name}'")]
    InvalidEnvVarName { name: String },

    #[error("invalid time expression '{expression}': {reason}")]
    InvalidTimeExpression { expression: String, reason: String },

    #[error("token on stdin exceeds maximum size of {limit} bytes")]
    StdinTooLarge { limit: u64 },

    #[error("failed to read token from stdin: {0}")]
    Stdin(#[from] std::io::Error),
}

/// Resolve the token from argument, environment variable or stdin.
///
/// Surrounding whitespace is trimmed. An empty result is an error.
pub fn read_token(
    arg: Option<&str>,
    env_name: Option<&str>,
) -> Result<Zeroizing<String>, InputError> {
    let raw = if let Some(token) = arg {
        Zeroizing::new(token.to_string())
    } else if let Some(name) = env_name {
        read_env(name)?
    } else {
        read_stdin()?
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::NoTokenProvided);
    }
    Ok(Zeroizing::new(trimmed.to_string()))
}

fn read_env(name: &str) -> Result<Zeroizing<String>, InputError> {
    validate_env_var_name(name)?;
    std::env::var(name)
        .map(Zeroizing::new)
        .map_err(|_| InputError::EnvVarNotFound {
            name: name.to_string(),
        })
}

fn read_stdin() -> Result<Zeroizing<String>, InputError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(InputError::NoTokenProvided);
    }
    read_bounded(stdin.lock(), MAX_STDIN_BYTES)
}

/// Read at most `limit` bytes; one byte more is an error, not a cut.
fn read_bounded(reader: impl Read, limit: u64) -> Result<Zeroizing<String>, InputError> {
    let mut bytes = Zeroizing::new(Vec::new());
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(InputError::StdinTooLarge { limit });
    }
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Zeroizing::new(text.to_string()))
}

/// Reject names that `std::env::var` would panic on or that cannot be
/// a portable variable name.
pub fn validate_env_var_name(name: &str) -> Result<(), InputError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(InputError::InvalidEnvVarName {
            name: name.escape_default().to_string(),
        })
    }
}

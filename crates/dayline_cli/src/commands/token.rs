//! Token command implementation.

use super::parse_owner;
use crate::error::{CliError, CliResult};
use dayline_core::OwnerId;
use dayline_sync_server::{AuthConfig, TokenValidator};
use serde::Serialize;
use std::time::Duration;

/// An issued token.
#[derive(Debug, Serialize)]
pub struct TokenResult {
    /// Owner the token names.
    pub owner: String,
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Validity in seconds.
    pub expires_in: u64,
}

/// Issues a bearer token, for a new owner when none is given.
pub fn execute(secret: &str, owner: Option<&str>, expiry: Duration) -> CliResult<TokenResult> {
    if secret.is_empty() {
        return Err(CliError::InvalidArgument("auth secret must not be empty".into()));
    }
    let owner = match owner {
        Some(owner) => parse_owner(owner)?,
        None => OwnerId::new(),
    };

    let validator = TokenValidator::new(AuthConfig::new(secret.as_bytes().to_vec()).with_expiry(expiry));
    Ok(TokenResult {
        owner: owner.to_string(),
        token: validator.issue(owner)?,
        expires_in: expiry.as_secs(),
    })
}

/// Runs the token command.
pub fn run(secret: &str, owner: Option<&str>, expiry: Duration, format: &str) -> CliResult<()> {
    let result = execute(secret, owner, expiry)?;
    match format {
        "json" => super::print_json(&result),
        _ => {
            println!("{}", result.token);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let owner = OwnerId::new();
        let result = execute("secret", Some(&owner.to_string()), Duration::from_secs(60)).unwrap();
        assert_eq!(result.owner, owner.to_string());

        let validator = TokenValidator::new(AuthConfig::new(b"secret".to_vec()));
        let header = format!("Bearer {}", result.token);
        assert_eq!(validator.validate_bearer(&header).unwrap(), owner);
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(execute("", None, Duration::from_secs(60)).is_err());
    }
}

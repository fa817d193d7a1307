//! Client credential resolution.
//!
//! The platform client secret can come from several places, checked in order:
//!
//! 1. **Direct value** - the positional command-line argument
//! 2. **File reference** - e.g. a mounted CI secret (`ORGSYNC_CLIENT_SECRET_FILE`)
//! 3. **Env var reference** - e.g. `ORGSYNC_CLIENT_SECRET`
//!
//! The interactive prompt is the caller's last resort and lives in the binary.

use secrecy::SecretString;
use std::fs;

/// Environment variable holding the client id.
pub const CLIENT_ID_ENV_VAR: &str = "ORGSYNC_CLIENT_ID";

/// Environment variable holding the client secret.
pub const CLIENT_SECRET_ENV_VAR: &str = "ORGSYNC_CLIENT_SECRET";

/// Environment variable naming a file that contains the client secret.
pub const CLIENT_SECRET_FILE_ENV_VAR: &str = "ORGSYNC_CLIENT_SECRET_FILE";

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Secret from {origin} is empty")]
    Empty { origin: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first source that is configured.
///
/// A configured-but-broken source (unreadable file, unset variable) is an
/// error rather than a silent fall-through, so a typo in a CI variable name
/// does not end in an interactive prompt on a headless runner.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::Empty {
                origin: format!("file '{}'", expanded),
            });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(var_name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(var_name) {
            Ok(value) if value.trim().is_empty() => Err(SecretError::Empty {
                origin: format!("environment variable '{}'", var_name),
            }),
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: var_name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: var_name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Like [`resolve_secret`], but a missing source yields `None`.
pub fn resolve_secret_optional(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<Option<SecretString>> {
    match resolve_secret(direct, file_path, env_var) {
        Ok(secret) => Ok(Some(secret)),
        Err(SecretError::NoSourceProvided) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Resolves the client secret using the standard argument/file/env order.
///
/// The file and env sources are only consulted when their variables are set,
/// so an unconfigured environment yields `Ok(None)` and the caller may prompt.
pub fn resolve_client_secret(direct: Option<&str>) -> Result<Option<SecretString>> {
    let file_path = std::env::var(CLIENT_SECRET_FILE_ENV_VAR).ok();
    let env_var = std::env::var_os(CLIENT_SECRET_ENV_VAR).map(|_| CLIENT_SECRET_ENV_VAR);
    resolve_secret_optional(direct, file_path.as_deref(), env_var)
}

/// Expands a leading `~` to the user's home directory (HOME, then USERPROFILE).
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

//! Secure credential handling for completion backends.
//!
//! The API credential is resolved exactly once, at startup, from a
//! primary-then-legacy environment variable chain, and stored in a wrapper
//! that:
//!
//! - **Cannot be accidentally logged**: `Debug` output shows `[REDACTED]`
//! - **Is zeroed on drop** via the `secrecy` crate
//! - **Must be explicitly exposed** via `.expose()` at the point of use
//! - **Tracks its source** so configuration issues can be diagnosed without
//!   printing the value
//!
//! Absence of both variables is a configuration error raised before any
//! pipeline work begins; the credential is never re-read mid-run.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::config::ConfigError;

/// Primary environment variable for the Gemini API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Legacy environment variable, accepted for backward compatibility.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the primary environment variable
    PrimaryEnv,
    /// Loaded from the legacy environment variable
    LegacyEnv,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::PrimaryEnv => write!(f, "primary environment variable"),
            CredentialSource::LegacyEnv => write!(f, "legacy environment variable"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value. After this point the value cannot be
    /// accidentally logged.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Resolve a credential from `primary`, falling back to `legacy`.
    ///
    /// Resolution order is fixed: the primary variable always wins when
    /// both are set. Absence of both is a [`ConfigError`], not a pipeline
    /// error.
    pub fn from_env_chain(
        primary: &'static str,
        legacy: &'static str,
        name: &'static str,
    ) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var(primary) {
            return Ok(Self::new(value, CredentialSource::PrimaryEnv, name));
        }
        if let Ok(value) = std::env::var(legacy) {
            tracing::warn!(
                variable = legacy,
                "credential loaded from legacy environment variable"
            );
            return Ok(Self::new(value, CredentialSource::LegacyEnv, name));
        }
        Err(ConfigError::MissingCredential {
            name,
            primary,
            legacy,
        })
    }

    /// Explicitly expose the credential value. Call this only at the point
    /// of use (an HTTP header), never in a format string.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the credential is the empty string.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Where the credential came from.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the Gemini credential from the standard variable chain.
pub fn resolve_gemini_credential() -> Result<ApiCredential, ConfigError> {
    ApiCredential::from_env_chain(GOOGLE_API_KEY_ENV, GEMINI_API_KEY_ENV, "Gemini API key")
}

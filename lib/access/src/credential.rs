//! Service credentials and the credential registry.
//!
//! Every inbound API request presents an opaque service key. The registry
//! maps each key to the route classes the calling service may reach and the
//! call origins it may present. The registry is built once at process start
//! from configuration and never mutated afterward; the gate borrows it for
//! the life of the process.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of route a request targets.
///
/// Internal routes are session-protected and first-party; external routes
/// are partner-facing and authenticated by API key alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    /// Session-protected first-party routes.
    Internal,
    /// Partner/public routes, API-key only.
    External,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::External => write!(f, "external"),
        }
    }
}

/// A single allowed-origin pattern.
///
/// A pattern is matched as an exact prefix of the presented origin, except
/// that a trailing `:*` marker matches any numeric port (the regex is
/// compiled once when the registry is built).
#[derive(Debug, Clone)]
struct OriginPattern {
    raw: String,
    any_port: Option<Regex>,
}

impl OriginPattern {
    fn parse(pattern: &str) -> Result<Self, RegistryError> {
        if let Some(prefix) = pattern.strip_suffix(":*") {
            if prefix.contains('*') {
                return Err(RegistryError::InvalidOriginPattern {
                    pattern: pattern.to_string(),
                    reason: "wildcard is only allowed as a trailing port marker".to_string(),
                });
            }
            let regex = Regex::new(&format!(r"^{}:\d+(/.*)?$", regex::escape(prefix))).map_err(
                |e| RegistryError::InvalidOriginPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                },
            )?;
            Ok(Self {
                raw: pattern.to_string(),
                any_port: Some(regex),
            })
        } else if pattern.contains('*') {
            Err(RegistryError::InvalidOriginPattern {
                pattern: pattern.to_string(),
                reason: "wildcard is only allowed as a trailing port marker".to_string(),
            })
        } else {
            Ok(Self {
                raw: pattern.to_string(),
                any_port: None,
            })
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match &self.any_port {
            Some(regex) => regex.is_match(origin),
            None => origin.starts_with(&self.raw),
        }
    }
}

/// A registered service credential.
///
/// Immutable after registry construction.
#[derive(Debug, Clone)]
pub struct ServiceCredential {
    key: String,
    name: String,
    route_classes: Vec<RouteClass>,
    origins: Vec<OriginPattern>,
}

impl ServiceCredential {
    /// Returns the operator-facing label for this credential.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the credential grants access to the route class.
    #[must_use]
    pub fn allows_route_class(&self, class: RouteClass) -> bool {
        self.route_classes.contains(&class)
    }

    /// Returns true if the presented origin matches an allowed pattern.
    ///
    /// A credential configured with no origin patterns accepts any origin.
    #[must_use]
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.origins.is_empty() || self.origins.iter().any(|p| p.matches(origin))
    }
}

/// Declarative form of a credential, as found in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSpec {
    /// The opaque API key the caller presents.
    pub key: String,
    /// Operator-facing label (appears in decision logs, never the key).
    pub name: String,
    /// Route classes the credential may reach.
    pub route_classes: Vec<RouteClass>,
    /// Allowed origin patterns; empty means any origin.
    #[serde(default)]
    pub origins: Vec<String>,
}

/// Immutable mapping of service API keys to their entitlements.
///
/// Built once at startup; an empty registry is permitted and denies every
/// presented key.
#[derive(Debug, Default)]
pub struct CredentialRegistry {
    credentials: Vec<ServiceCredential>,
}

impl CredentialRegistry {
    /// Builds a registry from declarative credential specs.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty key, a duplicate key, or an origin
    /// pattern that does not compile.
    pub fn from_specs(specs: Vec<CredentialSpec>) -> Result<Self, RegistryError> {
        let mut credentials: Vec<ServiceCredential> = Vec::with_capacity(specs.len());

        for spec in specs {
            if spec.key.is_empty() {
                return Err(RegistryError::EmptyKey { name: spec.name });
            }
            if credentials.iter().any(|c| c.key == spec.key) {
                return Err(RegistryError::DuplicateKey { name: spec.name });
            }

            let mut origins = Vec::with_capacity(spec.origins.len());
            for pattern in &spec.origins {
                origins.push(OriginPattern::parse(pattern)?);
            }

            credentials.push(ServiceCredential {
                key: spec.key,
                name: spec.name,
                route_classes: spec.route_classes,
                origins,
            });
        }

        Ok(Self { credentials })
    }

    /// Builds a registry from the JSON array form used in configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not parse or a spec is invalid.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let specs: Vec<CredentialSpec> =
            serde_json::from_str(json).map_err(|e| RegistryError::InvalidJson {
                reason: e.to_string(),
            })?;
        Self::from_specs(specs)
    }

    /// Resolves a presented API key to its credential, if registered.
    ///
    /// Plain equality lookup over a small fixed set.
    #[must_use]
    pub fn resolve(&self, presented_key: &str) -> Option<&ServiceCredential> {
        self.credentials.iter().find(|c| c.key == presented_key)
    }

    /// Returns the number of registered credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Returns true if no credentials are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

/// Errors from building the credential registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The configured JSON did not parse.
    InvalidJson { reason: String },
    /// A credential was configured with an empty key.
    EmptyKey { name: String },
    /// Two credentials share the same key.
    DuplicateKey { name: String },
    /// An origin pattern could not be compiled.
    InvalidOriginPattern { pattern: String, reason: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { reason } => {
                write!(f, "invalid credential configuration: {reason}")
            }
            Self::EmptyKey { name } => {
                write!(f, "credential '{name}' has an empty key")
            }
            Self::DuplicateKey { name } => {
                write!(f, "credential '{name}' duplicates an existing key")
            }
            Self::InvalidOriginPattern { pattern, reason } => {
                write!(f, "invalid origin pattern '{pattern}': {reason}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

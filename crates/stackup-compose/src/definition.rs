//! Service definitions and configuration references.

use std::collections::BTreeMap;
use std::fmt;

use stackup_common::error::{Result, StackupError};
use stackup_common::types::PortMapping;

/// How a missing variable is handled during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionPolicy {
    /// The variable must be present in the environment source.
    Required,
    /// The variable falls back to the given default when absent.
    Default(String),
}

/// A single environment value of a service, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigValue {
    /// A fixed value written directly in the declaration.
    Literal(String),
    /// A reference to a variable of the environment source.
    Reference {
        /// Referenced variable name.
        variable: String,
        /// Behaviour when the variable is absent.
        policy: ResolutionPolicy,
    },
}

impl ConfigValue {
    /// A reference that fails resolution when the variable is absent.
    #[must_use]
    pub fn required(variable: impl Into<String>) -> Self {
        Self::Reference {
            variable: variable.into(),
            policy: ResolutionPolicy::Required,
        }
    }

    /// A reference that falls back to `default` when the variable is absent.
    #[must_use]
    pub fn with_default(variable: impl Into<String>, default: impl Into<String>) -> Self {
        Self::Reference {
            variable: variable.into(),
            policy: ResolutionPolicy::Default(default.into()),
        }
    }

    /// A fixed value.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Returns the referenced variable name, if this is a reference.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Reference { variable, .. } => Some(variable),
        }
    }

    /// Parses a declaration value.
    ///
    /// `${VAR}` and `${VAR:?message}` are required references,
    /// `${VAR:-default}` is an optional reference, anything else is a literal.
    ///
    /// # Errors
    ///
    /// Returns an error if a `${...}` form has an empty or invalid variable name.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(inner) = raw.strip_prefix("${").and_then(|r| r.strip_suffix('}')) else {
            return Ok(Self::literal(raw));
        };

        let (variable, policy) = if let Some((name, default)) = inner.split_once(":-") {
            (name, ResolutionPolicy::Default(default.to_string()))
        } else if let Some((name, _message)) = inner.split_once(":?") {
            (name, ResolutionPolicy::Required)
        } else {
            (inner, ResolutionPolicy::Required)
        };

        if !is_valid_variable_name(variable) {
            return Err(StackupError::Config {
                message: format!("invalid variable reference \"{raw}\""),
            });
        }

        Ok(Self::Reference {
            variable: variable.to_string(),
            policy,
        })
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Reference {
                variable,
                policy: ResolutionPolicy::Required,
            } => write!(f, "${{{variable}}}"),
            Self::Reference {
                variable,
                policy: ResolutionPolicy::Default(default),
            } => write!(f, "${{{variable}:-{default}}}"),
        }
    }
}

/// Returns whether `name` is a POSIX-style variable name.
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One runnable unit of a topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    /// Unique service name; also the hostname peers use to reach it.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Published ports, in declaration order.
    pub ports: Vec<PortMapping>,
    /// Environment passed to the service, before resolution.
    pub env: BTreeMap<String, ConfigValue>,
    /// Names of services that must be running before this one starts.
    pub depends_on: Vec<String>,
    /// Network to attach to; the topology default when `None`.
    pub network: Option<String>,
}

impl ServiceDefinition {
    /// Creates a definition with no ports, env, or dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ports: Vec::new(),
            env: BTreeMap::new(),
            depends_on: Vec::new(),
            network: None,
        }
    }

    /// Adds a port mapping.
    #[must_use]
    pub fn port(mut self, mapping: PortMapping) -> Self {
        self.ports.push(mapping);
        self
    }

    /// Adds an environment entry.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        let _ = self.env.insert(key.into(), value);
        self
    }

    /// Declares a dependency on another service.
    #[must_use]
    pub fn depends_on(mut self, service: impl Into<String>) -> Self {
        let service = service.into();
        if !self.depends_on.contains(&service) {
            self.depends_on.push(service);
        }
        self
    }

    /// Attaches the service to a named network.
    #[must_use]
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reference_is_required() {
        let value = ConfigValue::parse("${POSTGRES_USER}").unwrap();
        assert_eq!(value, ConfigValue::required("POSTGRES_USER"));
    }

    #[test]
    fn question_form_is_required() {
        let value = ConfigValue::parse("${POSTGRES_PASSWORD:?set a password}").unwrap();
        assert_eq!(value, ConfigValue::required("POSTGRES_PASSWORD"));
    }

    #[test]
    fn dash_form_carries_default() {
        let value = ConfigValue::parse("${POSTGRES_DB:-invest}").unwrap();
        assert_eq!(value, ConfigValue::with_default("POSTGRES_DB", "invest"));
    }

    #[test]
    fn empty_default_is_allowed() {
        let value = ConfigValue::parse("${SUFFIX:-}").unwrap();
        assert_eq!(value, ConfigValue::with_default("SUFFIX", ""));
    }

    #[test]
    fn non_reference_is_literal() {
        assert_eq!(
            ConfigValue::parse("mongodb://mongo:27017").unwrap(),
            ConfigValue::literal("mongodb://mongo:27017")
        );
        assert_eq!(
            ConfigValue::parse("prefix-${X}").unwrap(),
            ConfigValue::literal("prefix-${X}")
        );
    }

    #[test]
    fn invalid_reference_is_rejected() {
        assert!(ConfigValue::parse("${}").is_err());
        assert!(ConfigValue::parse("${1ABC}").is_err());
        assert!(ConfigValue::parse("${A-B}").is_err());
    }

    #[test]
    fn display_round_trips_reference_syntax() {
        assert_eq!(ConfigValue::required("A").to_string(), "${A}");
        assert_eq!(ConfigValue::with_default("A", "b").to_string(), "${A:-b}");
    }

    #[test]
    fn builder_deduplicates_dependencies() {
        let def = ServiceDefinition::new("pgbouncer", "edoburu/pgbouncer")
            .depends_on("db")
            .depends_on("db");
        assert_eq!(def.depends_on, vec!["db"]);
    }
}

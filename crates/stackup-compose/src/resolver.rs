//! Resolution of configuration references against an environment source.

use std::collections::BTreeMap;

use stackup_common::error::{Result, StackupError};

use crate::definition::{ConfigValue, ResolutionPolicy};
use crate::env::EnvSource;

/// Materializes [`ConfigValue`]s into concrete strings.
///
/// Values are opaque strings; no coercion is attempted.
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'a> {
    source: &'a EnvSource,
}

impl<'a> ConfigResolver<'a> {
    /// Creates a resolver reading from `source`.
    #[must_use]
    pub const fn new(source: &'a EnvSource) -> Self {
        Self { source }
    }

    /// Resolves a single value declared by `service`.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::MissingConfig`] if a required variable is absent.
    pub fn resolve_value(&self, service: &str, value: &ConfigValue) -> Result<String> {
        match value {
            ConfigValue::Literal(literal) => Ok(literal.clone()),
            ConfigValue::Reference { variable, policy } => {
                match (self.source.get(variable), policy) {
                    (Some(found), _) => Ok(found.to_string()),
                    (None, ResolutionPolicy::Default(default)) => {
                        tracing::debug!(service, variable = %variable, "using default value");
                        Ok(default.clone())
                    }
                    (None, ResolutionPolicy::Required) => Err(StackupError::MissingConfig {
                        variable: variable.clone(),
                        service: service.to_string(),
                    }),
                }
            }
        }
    }

    /// Resolves every entry of a service environment.
    ///
    /// Entries are visited in key order, so the first missing variable
    /// reported is the same on every run.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::MissingConfig`] for the first required
    /// variable that is absent.
    pub fn resolve(
        &self,
        service: &str,
        env: &BTreeMap<String, ConfigValue>,
    ) -> Result<BTreeMap<String, String>> {
        env.iter()
            .map(|(key, value)| Ok((key.clone(), self.resolve_value(service, value)?)))
            .collect()
    }
}

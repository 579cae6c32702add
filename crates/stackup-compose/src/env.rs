//! Environment sources for variable resolution.
//!
//! An [`EnvSource`] is an explicit, owned snapshot of variables. It is built
//! from layers (dotenv files, the process environment, in-memory pairs)
//! applied in order, later layers overriding earlier ones, and then injected
//! into the composer. Nothing reads the process environment after that.

use std::collections::BTreeMap;
use std::path::Path;

use stackup_common::config::StackupConfig;
use stackup_common::error::{Result, StackupError};

use crate::definition::is_valid_variable_name;

/// A snapshot of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the layers named by `config`: each existing env file in order,
    /// then the process environment when enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing env file cannot be read or parsed.
    pub fn load(config: &StackupConfig) -> Result<Self> {
        let mut source = Self::new();
        for path in &config.env_files {
            let _ = source.layer_optional_file(path)?;
        }
        if config.use_process_env {
            source.layer_process_env();
        }
        tracing::debug!(variables = source.len(), "environment source loaded");
        Ok(source)
    }

    /// Adds a variable, replacing any previous value.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.vars.insert(name.into(), value.into());
        self
    }

    /// Layers a dotenv file on top of the current variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed, or
    /// defines an invalid variable name.
    pub fn layer_file(&mut self, path: &Path) -> Result<()> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(path, &e))?;
        let mut count = 0usize;
        for item in iter {
            let (name, value) = item.map_err(|e| dotenv_error(path, &e))?;
            if !is_valid_variable_name(&name) {
                return Err(StackupError::Config {
                    message: format!(
                        "invalid variable name \"{name}\" in {}",
                        path.display()
                    ),
                });
            }
            let _ = self.vars.insert(name, value);
            count += 1;
        }
        tracing::debug!(path = %path.display(), count, "layered env file");
        Ok(())
    }

    /// Layers a dotenv file if it exists. Returns whether it was applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn layer_optional_file(&mut self, path: &Path) -> Result<bool> {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "env file absent, skipping");
            return Ok(false);
        }
        self.layer_file(path)?;
        Ok(true)
    }

    /// Layers the current process environment on top of the current variables.
    ///
    /// Entries that are not valid UTF-8 or not valid variable names are skipped.
    pub fn layer_process_env(&mut self) {
        for (name, value) in std::env::vars_os() {
            let (Some(name), Some(value)) = (name.to_str(), value.to_str()) else {
                continue;
            };
            if !is_valid_variable_name(name) {
                tracing::trace!(name, "skipping process variable with unusual name");
                continue;
            }
            let _ = self.vars.insert(name.to_string(), value.to_string());
        }
    }

    /// Layers in-memory pairs on top of the current variables.
    pub fn layer<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Returns the value of a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Returns whether the variable is present (possibly empty).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the source holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = Self::new();
        source.layer(iter);
        source
    }
}

fn dotenv_error(path: &Path, err: &dotenvy::Error) -> StackupError {
    StackupError::Config {
        message: format!("failed to load env file {}: {err}", path.display()),
    }
}

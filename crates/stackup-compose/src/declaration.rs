//! Loading of YAML topology declarations.
//!
//! ```yaml
//! project: invest
//! network: backend
//! services:
//!   db:
//!     image: postgres:15
//!     ports: ["5432:5432"]
//!     env:
//!       POSTGRES_USER: ${POSTGRES_USER}
//!       POSTGRES_DB: ${POSTGRES_DB:-invest}
//!   pgbouncer:
//!     image: edoburu/pgbouncer
//!     depends_on: [db]
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use stackup_common::constants::{APP_NAME, DEFAULT_NETWORK_SUFFIX};
use stackup_common::error::{Result, StackupError};
use stackup_common::types::PortMapping;

use crate::definition::{ConfigValue, ServiceDefinition};
use crate::graph::ServiceGraph;

/// Root of a topology file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologyDeclaration {
    /// Project name; prefixes container names.
    #[serde(default)]
    pub project: Option<String>,
    /// Network services join unless they name their own.
    #[serde(default)]
    pub network: Option<String>,
    /// Services in declaration order.
    pub services: IndexMap<String, ServiceDeclaration>,
}

/// One entry of the `services` map.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDeclaration {
    /// Image reference.
    pub image: String,
    /// Published ports.
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    /// Environment entries; values may be `${VAR}` references.
    #[serde(default, alias = "environment")]
    pub env: IndexMap<String, EnvScalar>,
    /// Services that must start first.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Network override.
    #[serde(default)]
    pub network: Option<String>,
}

/// A scalar environment value as written in YAML.
///
/// Floats and nulls are accepted by the parser only so they can be rejected
/// with a message naming the variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnvScalar {
    /// A string, possibly a `${VAR}` reference.
    Text(String),
    /// An integer such as a port.
    Integer(i64),
    /// A floating-point number; its source text is already lost.
    Float(f64),
    /// A boolean flag.
    Bool(bool),
    /// A key with no value (`KEY:` or `KEY: ~`).
    Null,
}

impl EnvScalar {
    fn into_config_value(self) -> Result<ConfigValue> {
        match self {
            Self::Text(text) => ConfigValue::parse(&text),
            Self::Integer(n) => Ok(ConfigValue::literal(n.to_string())),
            Self::Bool(b) => Ok(ConfigValue::literal(b.to_string())),
            Self::Float(x) => Err(StackupError::Config {
                message: format!(
                    "floating-point value {x} must be quoted (e.g. \"1.10\") so its text is kept"
                ),
            }),
            Self::Null => Err(StackupError::Config {
                message: "has no value; write \"\" for an empty string".into(),
            }),
        }
    }
}

/// A loaded topology: project identity plus service definitions.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Project name.
    pub project: String,
    /// Default network.
    pub network: String,
    /// Definitions in declaration order.
    pub services: Vec<ServiceDefinition>,
}

impl Topology {
    /// Builds the dependency graph of this topology.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate names or dangling dependencies.
    pub fn graph(&self) -> Result<ServiceGraph> {
        ServiceGraph::from_definitions(self.services.iter().cloned())
    }
}

impl TopologyDeclaration {
    /// Parses a declaration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or has unknown keys.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Reads and parses a declaration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading topology declaration");
        let content = std::fs::read_to_string(path).map_err(|e| StackupError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Converts the declaration into service definitions.
    ///
    /// The project name is `project_override`, else the declared name, else
    /// the application name. The default network is the declared one, else
    /// `<project>_default`.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value is a malformed reference.
    pub fn into_topology(self, project_override: Option<&str>) -> Result<Topology> {
        let project = project_override
            .map(str::to_string)
            .or(self.project)
            .unwrap_or_else(|| APP_NAME.to_string());
        let network = self
            .network
            .unwrap_or_else(|| format!("{project}_{DEFAULT_NETWORK_SUFFIX}"));

        let services = self
            .services
            .into_iter()
            .map(|(name, decl)| decl.into_definition(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Topology {
            project,
            network,
            services,
        })
    }
}

impl ServiceDeclaration {
    fn into_definition(self, name: String) -> Result<ServiceDefinition> {
        let mut def = ServiceDefinition::new(name, self.image);
        def.ports = self.ports;
        def.network = self.network;
        for (key, value) in self.env {
            let value = value.into_config_value().map_err(|e| StackupError::Config {
                message: format!("service \"{}\", variable {key}: {e}", def.name),
            })?;
            let _ = def.env.insert(key, value);
        }
        for dep in self.depends_on {
            def = def.depends_on(dep);
        }
        Ok(def)
    }
}

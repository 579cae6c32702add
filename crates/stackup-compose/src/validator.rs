//! Static checks run on a topology before anything is resolved or started.
//!
//! Duplicate names and dangling dependencies are already rejected while the
//! [`ServiceGraph`] is built; this module covers the rest.

use std::collections::HashMap;

use stackup_common::constants::MAX_SERVICE_NAME_LEN;
use stackup_common::error::{Result, StackupError};
use stackup_common::types::Protocol;

use crate::graph::ServiceGraph;

/// Validates a service graph for semantic correctness.
///
/// # Checks performed
///
/// 1. Service names are DNS-label-like, so peers can use them as hostnames.
/// 2. Every service declares a non-empty image.
/// 3. No two services publish the same host port and protocol.
///
/// # Errors
///
/// Returns an error if any check fails.
pub fn validate(graph: &ServiceGraph) -> Result<()> {
    tracing::debug!(services = graph.len(), "validating topology");
    check_service_names(graph)?;
    check_images(graph)?;
    check_host_ports(graph)?;
    Ok(())
}

/// Returns whether `name` can be used as a service name.
pub fn is_valid_service_name(name: &str) -> bool {
    let mut chars = name.chars();
    name.len() <= MAX_SERVICE_NAME_LEN
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.".contains(c))
}

fn check_service_names(graph: &ServiceGraph) -> Result<()> {
    for svc in graph.services() {
        if !is_valid_service_name(&svc.name) {
            return Err(StackupError::Config {
                message: format!(
                    "invalid service name \"{}\": use lowercase letters, digits, '-', '_' or '.' \
                     (at most {MAX_SERVICE_NAME_LEN} characters)",
                    svc.name
                ),
            });
        }
    }
    Ok(())
}

fn check_images(graph: &ServiceGraph) -> Result<()> {
    for svc in graph.services() {
        if svc.image.trim().is_empty() {
            return Err(StackupError::Config {
                message: format!("service \"{}\" has no image", svc.name),
            });
        }
    }
    Ok(())
}

fn check_host_ports(graph: &ServiceGraph) -> Result<()> {
    let mut bound: HashMap<(u16, Protocol), &str> = HashMap::new();
    for svc in graph.services() {
        for mapping in &svc.ports {
            if let Some(owner) = bound.insert((mapping.host, mapping.protocol), &svc.name) {
                return Err(StackupError::Config {
                    message: format!(
                        "host port {}/{} is published by both \"{owner}\" and \"{}\"",
                        mapping.host, mapping.protocol, svc.name
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use stackup_common::types::PortMapping;

    use super::*;
    use crate::definition::ServiceDefinition;

    fn graph(defs: Vec<ServiceDefinition>) -> ServiceGraph {
        ServiceGraph::from_definitions(defs).unwrap()
    }

    #[test]
    fn validate_empty_graph_succeeds() {
        assert!(validate(&ServiceGraph::new()).is_ok());
    }

    #[test]
    fn validate_valid_topology_succeeds() {
        let g = graph(vec![
            ServiceDefinition::new("db", "postgres:15").port(PortMapping::tcp(5432, 5432)),
            ServiceDefinition::new("mongo-express", "mongo-express")
                .port(PortMapping::tcp(8081, 8081)),
        ]);
        assert!(validate(&g).is_ok());
    }

    #[test]
    fn uppercase_name_fails() {
        let g = graph(vec![ServiceDefinition::new("Db", "postgres")]);
        let msg = validate(&g).unwrap_err().to_string();
        assert!(msg.contains("invalid service name"), "got: {msg}");
    }

    #[test]
    fn overlong_name_fails() {
        let name = "a".repeat(MAX_SERVICE_NAME_LEN + 1);
        assert!(!is_valid_service_name(&name));
        assert!(is_valid_service_name(&"a".repeat(MAX_SERVICE_NAME_LEN)));
    }

    #[test]
    fn leading_dash_fails() {
        assert!(!is_valid_service_name("-db"));
        assert!(!is_valid_service_name(""));
    }

    #[test]
    fn empty_image_fails() {
        let g = graph(vec![ServiceDefinition::new("broken", "  ")]);
        let msg = validate(&g).unwrap_err().to_string();
        assert!(msg.contains("has no image"), "got: {msg}");
    }

    #[test]
    fn shared_host_port_fails_naming_both() {
        let g = graph(vec![
            ServiceDefinition::new("db", "postgres").port(PortMapping::tcp(5432, 5432)),
            ServiceDefinition::new("pgbouncer", "pgbouncer").port(PortMapping::tcp(5432, 6432)),
        ]);
        let msg = validate(&g).unwrap_err().to_string();
        assert!(msg.contains("\"db\""), "got: {msg}");
        assert!(msg.contains("\"pgbouncer\""), "got: {msg}");
    }

    #[test]
    fn same_port_different_protocol_is_allowed() {
        let g = graph(vec![
            ServiceDefinition::new("dns-tcp", "dns").port(PortMapping::tcp(53, 53)),
            ServiceDefinition::new("dns-udp", "dns").port("53:53/udp".parse().unwrap()),
        ]);
        assert!(validate(&g).is_ok());
    }
}

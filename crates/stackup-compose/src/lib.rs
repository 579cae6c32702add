//! # stackup-compose
//!
//! Turns a topology declaration and an environment source into an
//! immutable, dependency-ordered [`TopologyPlan`](composer::TopologyPlan).
//!
//! Handles:
//! - **Definition**: `ServiceDefinition` and `ConfigValue` (required/default references).
//! - **Declaration**: loading the YAML topology file.
//! - **Env**: layering dotenv files and the process environment.
//! - **Resolver**: materializing `ConfigValue`s against an environment source.
//! - **Graph**: dependency graph and deterministic topological ordering.
//! - **Validator**: pre-flight checks run before anything is started.
//! - **Composer**: combining all of the above into a plan.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod composer;
pub mod declaration;
pub mod definition;
pub mod env;
pub mod graph;
pub mod resolver;
pub mod validator;

//! Service lifecycle management for stackup.
//!
//! - [`backend`]: the [`RuntimeDriver`](backend::RuntimeDriver) seam and its
//!   implementations (in-memory, Docker CLI).
//! - [`engine`]: drives a plan through a driver in dependency order,
//!   rolling back on failure.
//! - [`state`]: the persisted record of what was started.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod backend;
pub mod engine;
pub mod state;

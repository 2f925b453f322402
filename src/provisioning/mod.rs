//! PostgreSQL and PostGIS provisioning tasks for remote database hosts.
//!
//! Each task is a short, linear sequence of remote shell invocations gated by
//! an existence check, so that non-idempotent setup steps (such as PostGIS
//! initialisation) are only ever performed once. The module follows the
//! crate's hexagonal layout:
//!
//! - Domain types in [`domain`]
//! - Port contracts for the remote transport and SQL templates in [`ports`]
//! - Adapter implementations (SSH, `minijinja`, in-memory cluster) in
//!   [`adapters`]
//! - Task orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

//! pgprovision: PostgreSQL and PostGIS provisioning over remote shells.
//!
//! This crate runs short, idempotency-guarded provisioning tasks against
//! remote database hosts and bridges new instances to an HTTP authorization
//! service.
//!
//! # Architecture
//!
//! pgprovision follows hexagonal architecture principles:
//!
//! - **Domain**: validated identifiers, secrets, hosts, and versions
//! - **Ports**: the remote executor and SQL template renderer contracts
//! - **Adapters**: SSH, `minijinja`, and an in-memory cluster simulator
//!
//! # Modules
//!
//! - [`provisioning`]: provisioning domain, ports, adapters, and services
//! - [`config`]: layered configuration
//! - [`telemetry`]: `tracing` subscriber setup
//! - [`shell`]: shell and SQL quoting helpers

pub mod config;
pub mod provisioning;
pub mod shell;
pub mod telemetry;

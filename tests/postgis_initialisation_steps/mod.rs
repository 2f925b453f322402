//! Step definitions for PostGIS initialisation scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

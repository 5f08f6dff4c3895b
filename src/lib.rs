//! colshell - administrative shell for a column-oriented table store
//!
//! The shell turns operator commands into calls on a cluster's
//! administrative, data, replication and access-control interfaces, and
//! turns cluster failures into short diagnoses.

pub mod bulk;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod observability;
pub mod replication;
pub mod security;
pub mod shell;

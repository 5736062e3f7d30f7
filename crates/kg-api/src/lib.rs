//! HTTP adapter for the knowledge graph store.

pub mod config;
pub mod server;

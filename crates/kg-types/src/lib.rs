//! Core types and traits for the knowledge graph store.
//!
//! Field names serialize in camelCase (`entityType`, `relationType`, ...) so the
//! same shapes are used on disk and on the wire.

mod dto;
mod graph;
mod record;
mod traits;
mod validate;

pub use dto::*;
pub use graph::*;
pub use record::{decode_graph, encode_graph, Record};
pub use traits::*;
pub use validate::{
    check_entity, check_observations, check_record, check_relation, ValidationError,
};

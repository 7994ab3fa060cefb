pub mod chemistry;
pub mod domain;
pub mod error;
pub mod eviction;
pub mod lattice;
pub mod spatial;

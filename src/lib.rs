//! Read gateway for table-shaped data.
//!
//! Query strings are compiled into parameterized SQL fragments against a
//! per-table column registry, and serialized responses are cached under a
//! content fingerprint of the compiled query.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

//! Schema-level building blocks: field values, column registries and the entity catalog.

pub mod catalog;
pub mod columns;
pub mod entities;
pub mod error;
pub mod value;

//! Read pipeline: filter compilation, storage and serializer contracts, and the
//! cache-aside service tying them together.

pub mod error;
pub mod query;
pub mod reads;
pub mod repos;
pub mod serializer;

//! Serializable response bodies.

pub mod categories;
pub mod products;

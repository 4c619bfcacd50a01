//! Persistence-independent catalog entities.

pub mod category;
pub mod product;
pub mod types;

//! Core library exports for the catalog service.
//!
//! The `data` feature exposes the persistence layer (domain types, Diesel
//! models, schema and repositories). The default `server` feature adds forms,
//! file storage, services and the actix-web routes.

pub mod db;
pub mod domain;
pub mod error_conversions;
pub mod models;
pub mod repository;
pub mod schema;

#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;
#[cfg(feature = "server")]
pub mod storage;

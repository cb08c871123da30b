#![deny(missing_docs)]

//! Core library for the edu API: typed record keys, the Redis record store, materials,
//! quizzes and assignments, and the adapters for the hosted naming, quiz and vector services.

/// HTTP routing and REST handlers.
pub mod api;
/// Wiring of the store and adapters from configuration.
pub mod bootstrap;
/// Environment-driven configuration management.
pub mod config;
/// Record key parsing and sequence arithmetic.
pub mod keys;
/// Structured logging and tracing setup.
pub mod logging;
/// Record activity counters.
pub mod metrics;
/// Title generation client.
pub mod naming;
/// Decoders for prediction service replies.
pub mod prediction;
/// Quiz generation client and XML parsing.
pub mod quiz;
/// Record managers for every namespace.
pub mod records;
/// Hash-oriented record store abstraction and backends.
pub mod store;
/// Vector search client.
pub mod vector;

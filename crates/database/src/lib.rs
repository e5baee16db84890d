//! # Inflammation Database Crate
//!
//! This crate is the boundary to the relational store holding trial readings.
//! It hides the driver behind a small trait so the rest of the workspace only
//! ever sees driver-neutral `RawRow`s.
//!
//! ## Public API
//!
//! - `connect_to_database` / `connect_from_env`: open a SQLite connection.
//! - `QueryConnection`: the execute-and-fetch contract a connection satisfies.
//! - `query_database`: runs one query and always releases the connection.
//! - `SqlQuery`: a parameterized statement.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect_from_env, connect_to_database};
pub use error::DbError;
pub use repository::{query_database, QueryConnection, SqlQuery, TRIAL_TABLE};

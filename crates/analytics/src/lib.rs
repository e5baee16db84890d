//! # Inflammation Analytics
//!
//! This crate holds the trial data model: loading a patients x days matrix
//! from a delimited file or a database query, the daily summary statistics,
//! and per-patient normalisation.
//!
//! ## Architectural Principles
//!
//! - **One validation contract:** both loading paths end in
//!   `loader::stack_rows`, so a `Trial` always holds a rectangular 2-D matrix.
//! - **Pure transforms:** statistics and `Trial::normalise` never modify the
//!   stored matrix; they return new arrays.
//!
//! ## Public API
//!
//! - `Trial`: owns a matrix and hands out statistics, normalised data and patients.
//! - `Patient`: one row of readings with its own statistics.
//! - `loader`: the two ingestion paths.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod loader;
pub mod patient;
mod reduce;
pub mod trial;

// Re-export the key components to create a clean, public-facing API.
pub use error::{AnalyticsError, ConversionFailure};
pub use loader::QueryMatrix;
pub use patient::Patient;
pub use trial::{Trial, TrialSummary};

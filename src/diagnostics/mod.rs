//! Structured diagnostics for trace ingestion.
//!
//! Non-fatal conditions found while parsing or normalizing a trace are
//! collected as values, sorted deterministically and logged through
//! `tracing` instead of aborting the run.

pub mod ingest_diagnostics;

pub use ingest_diagnostics::{sort_diagnostics, EdgeDirection, IngestDiagnostic};

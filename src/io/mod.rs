//! File input and output.

/// Ranking export to CSV.
pub mod export;
/// Three-phase CSV ingestion.
pub mod ingest;

pub use ingest::{IngestIssue, IngestOptions, Ingestion, SourceKind, SourcePaths, ingest, ingest_readers};

//! # Collection Indexer
//!
//! Decides when a music collection is re-indexed and makes sure only one
//! indexing pass runs at a time.
//!
//! ## Core Guarantees
//! - **Single flight** - overlapping calls never start a second pass
//! - **Ordered phases** - track metadata is indexed before album artwork
//! - **Always released** - the run guard clears even when a phase fails
//!
//! ## Architecture
//! - `core` - The coordinator, its guard and reference collaborators
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{IndexingError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}

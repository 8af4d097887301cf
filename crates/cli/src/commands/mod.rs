//! Command implementations for the Sentinel CLI
//!
//! `scan` is the request layer: it loads and validates a receipt image, builds
//! the transaction context from flags, runs the pipeline and renders the
//! outcome. `config` writes the example configuration or shows the resolved one.

pub mod config;
pub mod scan;

//! PPI Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the PPI project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all PPI workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: Centralized tracing subscriber initialization
//!
//! # Example
//!
//! ```no_run
//! use ppi_common::{Result, PpiError};
//!
//! fn require_taxa(taxa: &[u32]) -> Result<()> {
//!     if taxa.is_empty() {
//!         return Err(PpiError::Precondition("taxon list is empty".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{PpiError, Result};

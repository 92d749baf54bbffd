//! PPI Ingest Library
//!
//! Ingestion pipeline for externally-sourced protein-protein interaction data.
//!
//! Raw interaction records reference proteins by Ensembl peptide id. Each
//! peptide id maps to zero or more internal genes, so one interaction expands
//! into every resulting gene pair (cartesian fan-out). Validated gene
//! associations are batch-persisted while memory stays bounded: each organism
//! is processed to completion through a single-producer/single-consumer
//! bounded channel before the next one starts.
//!
//! # Example
//!
//! ```no_run
//! use ppi_ingest::catalog::InMemoryGeneCatalog;
//! use ppi_ingest::config::StringDbConfig;
//! use ppi_ingest::orchestrator::StringLoadOrchestrator;
//! use ppi_ingest::sink::MemoryAssociationSink;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StringDbConfig::from_env()?;
//!     let catalog = Arc::new(InMemoryGeneCatalog::new());
//!     let sink = Arc::new(MemoryAssociationSink::new());
//!     let orchestrator = StringLoadOrchestrator::new(config, catalog, sink);
//!     let report = orchestrator
//!         .load("protein.links.detailed.txt.gz", Some("peptide_mapping.tsv"), &[9606])
//!         .await?;
//!     println!("persisted {} associations", report.total_persisted());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod sink;

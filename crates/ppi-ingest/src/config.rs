//! Ingestion configuration
//!
//! Configuration for STRING interaction loads: external-database identity
//! used to label persisted associations, plus pipeline tuning knobs.

use serde::{Deserialize, Serialize};

use ppi_common::PpiError;

/// Main configuration for a STRING interaction load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringDbConfig {
    /// External database name recorded on every persisted association
    pub source_name: String,
    /// External database release (e.g. "12.0")
    pub source_version: String,
    /// Base URL for external cross-links
    pub source_base_url: String,
    /// Bounded-channel capacity between converter and loader
    pub channel_capacity: usize,
    /// Number of validated associations flushed to the sink at once
    pub store_batch_size: usize,
    /// Emit a progress log line every this many persisted associations
    pub progress_interval: u64,
}

impl StringDbConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PPI_SOURCE_NAME`: external database name (default: "string-db")
    /// - `PPI_SOURCE_VERSION`: external database release (default: "12.0")
    /// - `PPI_SOURCE_BASE_URL`: base URL for cross-links
    /// - `PPI_CHANNEL_CAPACITY`: bounded-channel capacity (default: 1000)
    /// - `PPI_STORE_BATCH_SIZE`: sink flush batch size (default: 500)
    /// - `PPI_PROGRESS_INTERVAL`: progress log interval (default: 1000)
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            source_name: std::env::var("PPI_SOURCE_NAME")
                .unwrap_or_else(|_| "string-db".to_string()),
            source_version: std::env::var("PPI_SOURCE_VERSION")
                .unwrap_or_else(|_| "12.0".to_string()),
            source_base_url: std::env::var("PPI_SOURCE_BASE_URL")
                .unwrap_or_else(|_| "https://string-db.org".to_string()),
            channel_capacity: std::env::var("PPI_CHANNEL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_channel_capacity()),
            store_batch_size: std::env::var("PPI_STORE_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_store_batch_size()),
            progress_interval: std::env::var("PPI_PROGRESS_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_progress_interval()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source_name.is_empty() {
            return Err(PpiError::Config("PPI_SOURCE_NAME cannot be empty".to_string()).into());
        }
        if self.source_version.is_empty() {
            return Err(PpiError::Config("PPI_SOURCE_VERSION cannot be empty".to_string()).into());
        }
        if self.channel_capacity == 0 {
            return Err(
                PpiError::Config("PPI_CHANNEL_CAPACITY must be greater than 0".to_string()).into(),
            );
        }
        if self.store_batch_size == 0 {
            return Err(
                PpiError::Config("PPI_STORE_BATCH_SIZE must be greater than 0".to_string()).into(),
            );
        }
        if self.progress_interval == 0 {
            return Err(
                PpiError::Config("PPI_PROGRESS_INTERVAL must be greater than 0".to_string()).into(),
            );
        }
        Ok(())
    }
}

fn default_channel_capacity() -> usize {
    1000
}

fn default_store_batch_size() -> usize {
    500
}

fn default_progress_interval() -> u64 {
    1000
}

impl Default for StringDbConfig {
    fn default() -> Self {
        Self {
            source_name: "string-db".to_string(),
            source_version: "12.0".to_string(),
            source_base_url: "https://string-db.org".to_string(),
            channel_capacity: default_channel_capacity(),
            store_batch_size: default_store_batch_size(),
            progress_interval: default_progress_interval(),
        }
    }
}

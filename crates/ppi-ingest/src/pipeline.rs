//! Organism-batch pipeline supervisor
//!
//! Runs one converter (producer) and one loader (consumer) over a fresh
//! bounded channel, once per organism batch. The caller's authorization
//! context is captured here and handed to the loader, which installs it
//! before processing the first item.
//!
//! Completion signaling: the producer closes the channel by dropping its
//! sender; the consumer's join handle carries the batch summary or the first
//! fatal error. Awaiting both handles replaces any polling, so when `run`
//! returns both sides have necessarily finished.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::catalog::GeneCatalog;
use crate::config::StringDbConfig;
use crate::convert::InteractionConverter;
use crate::loader::AssociationLoader;
use crate::models::{InteractionRecord, LoadSummary};
use crate::resolver::PeptideResolver;
use crate::sink::AssociationSink;

/// Supervisor for one organism's producer/consumer batch
pub struct InteractionPipeline {
    config: StringDbConfig,
    resolver: Arc<PeptideResolver>,
    catalog: Arc<dyn GeneCatalog>,
    sink: Arc<dyn AssociationSink>,
}

impl InteractionPipeline {
    pub fn new(
        config: StringDbConfig,
        resolver: Arc<PeptideResolver>,
        catalog: Arc<dyn GeneCatalog>,
        sink: Arc<dyn AssociationSink>,
    ) -> Self {
        Self {
            config,
            resolver,
            catalog,
            sink,
        }
    }

    /// Run one organism batch to completion and return its summary.
    ///
    /// Each call gets a fresh channel and fresh worker tasks; a batch runs
    /// exactly once. On a consumer failure the producer is cancelled, awaited
    /// for its graceful stop, and the error is propagated to the caller.
    pub async fn run(
        &self,
        taxon_id: u32,
        batch_id: Uuid,
        records: Vec<InteractionRecord>,
    ) -> Result<LoadSummary> {
        let record_count = records.len();
        info!(
            batch_id = %batch_id,
            taxon_id = taxon_id,
            records = record_count,
            channel_capacity = self.config.channel_capacity,
            "Starting interaction pipeline"
        );

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let cancel = CancellationToken::new();

        // Persistence must be authorized as the caller that started the
        // load, not as whatever the worker task would otherwise run as.
        let auth = AuthContext::current().unwrap_or_else(AuthContext::system);

        let loader = AssociationLoader::new(
            rx,
            Arc::clone(&self.catalog),
            Arc::clone(&self.sink),
            self.config.source_name.clone(),
            self.config.source_version.clone(),
            self.config.source_base_url.clone(),
            self.config.store_batch_size,
            self.config.progress_interval,
            auth,
        );
        let loader_handle = tokio::spawn(loader.run());

        let converter = InteractionConverter::new(
            Arc::clone(&self.resolver),
            tx,
            cancel.clone(),
        );
        let converter_handle = tokio::spawn(converter.run(records));

        // The consumer finishes only after the producer has closed the
        // channel and the backlog is drained, so join it first; on a fatal
        // consumer error, cancel the producer and wait for its graceful stop
        // before surfacing the failure.
        let load_result = match loader_handle.await {
            Ok(result) => result,
            Err(join_err) => {
                error!(batch_id = %batch_id, error = %join_err, "Loader task panicked");
                cancel.cancel();
                let _ = converter_handle.await;
                return Err(anyhow!("Loader task aborted: {join_err}"));
            },
        };

        if load_result.is_err() {
            cancel.cancel();
        }

        let emitted = converter_handle
            .await
            .context("Converter task aborted")?;

        let summary = load_result.with_context(|| {
            format!("Interaction load failed for taxon {taxon_id} (batch {batch_id})")
        })?;

        debug!(
            batch_id = %batch_id,
            candidates = emitted,
            "Producer and consumer both completed"
        );
        info!(
            batch_id = %batch_id,
            taxon_id = taxon_id,
            records = record_count,
            candidates = emitted,
            persisted = summary.persisted,
            dropped = summary.dropped,
            "Interaction pipeline complete"
        );

        Ok(summary)
    }
}

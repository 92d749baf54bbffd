//! Association validation and persistence (consumer side)
//!
//! Drains the candidate channel until the producer closes it. Each candidate
//! endpoint is validated against the internal gene catalog; a missing gene
//! drops the candidate with a warning while the batch keeps going. Validated
//! associations are buffered and flushed to the sink in batches, with a final
//! flush when the channel is drained.
//!
//! A sink or catalog failure is fatal for the whole organism batch: the
//! loader returns the error, the remaining channel contents are abandoned,
//! and the caller aborts the run (stop on first hard error).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::catalog::GeneCatalog;
use crate::models::{
    AssociationCandidate, ExternalSourceRef, Gene, GeneAssociation, LoadSummary,
};
use crate::sink::AssociationSink;

/// Consumer half of an organism batch
pub struct AssociationLoader {
    rx: mpsc::Receiver<AssociationCandidate>,
    catalog: Arc<dyn GeneCatalog>,
    sink: Arc<dyn AssociationSink>,
    source_name: String,
    source_version: String,
    source_base_url: String,
    store_batch_size: usize,
    progress_interval: u64,
    auth: AuthContext,
}

impl AssociationLoader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rx: mpsc::Receiver<AssociationCandidate>,
        catalog: Arc<dyn GeneCatalog>,
        sink: Arc<dyn AssociationSink>,
        source_name: String,
        source_version: String,
        source_base_url: String,
        store_batch_size: usize,
        progress_interval: u64,
        auth: AuthContext,
    ) -> Self {
        Self {
            rx,
            catalog,
            sink,
            source_name,
            source_version,
            source_base_url,
            store_batch_size,
            progress_interval,
            auth,
        }
    }

    /// Drain the channel to completion under the captured authorization
    /// context, returning the batch summary.
    pub async fn run(self) -> Result<LoadSummary> {
        let auth = self.auth.clone();
        debug!(principal = %auth.principal(), "Loader starting under captured context");
        auth.scope(self.drain()).await
    }

    async fn drain(mut self) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        let mut buffer: Vec<GeneAssociation> = Vec::with_capacity(self.store_batch_size);
        let mut next_progress_at = self.progress_interval;

        while let Some(candidate) = self.rx.recv().await {
            let Some(association) = self.validate(&candidate).await? else {
                summary.dropped += 1;
                continue;
            };

            buffer.push(association);

            if buffer.len() >= self.store_batch_size {
                self.flush(&mut buffer, &mut summary).await?;

                if summary.persisted >= next_progress_at {
                    info!(
                        persisted = summary.persisted,
                        channel_depth = self.rx.len(),
                        "Load progress"
                    );
                    next_progress_at += self.progress_interval;
                }
            }
        }

        // Producer is done and the channel is empty; flush the remainder.
        self.flush(&mut buffer, &mut summary).await?;

        debug!(
            persisted = summary.persisted,
            dropped = summary.dropped,
            "Loader drained channel"
        );
        Ok(summary)
    }

    /// Validate both endpoints against the catalog.
    ///
    /// `Ok(None)` means the candidate is dropped (an endpoint is unknown);
    /// an `Err` is a catalog failure and fatal for the batch.
    async fn validate(&self, candidate: &AssociationCandidate) -> Result<Option<GeneAssociation>> {
        let Some(gene1) = self.lookup(candidate.gene1.ncbi_gene_id).await? else {
            return Ok(None);
        };
        let Some(gene2) = self.lookup(candidate.gene2.ncbi_gene_id).await? else {
            return Ok(None);
        };

        Ok(Some(GeneAssociation {
            gene1,
            gene2,
            source: ExternalSourceRef {
                key: candidate.source_key.clone(),
                db_name: self.source_name.clone(),
                db_version: self.source_version.clone(),
                base_url: self.source_base_url.clone(),
            },
            evidence: candidate.evidence,
            combined_score: candidate.combined_score,
        }))
    }

    async fn lookup(&self, ncbi_gene_id: i64) -> Result<Option<Gene>> {
        let gene = self
            .catalog
            .find_by_ncbi_gene_id(ncbi_gene_id)
            .await
            .context("Gene catalog lookup failed")?;

        if gene.is_none() {
            warn!(
                ncbi_gene_id = ncbi_gene_id,
                "Dropping candidate: gene not found in catalog"
            );
        }
        Ok(gene)
    }

    async fn flush(
        &self,
        buffer: &mut Vec<GeneAssociation>,
        summary: &mut LoadSummary,
    ) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        self.sink
            .persist_batch(buffer)
            .await
            .context("Failed to persist association batch")?;

        summary.persisted += buffer.len() as u64;
        buffer.clear();
        Ok(())
    }
}

//! Load orchestration across organisms
//!
//! Validates preconditions, builds the run-wide peptide resolver, groups the
//! links file by taxon, and runs one pipeline per requested organism
//! strictly sequentially. Sequential processing is deliberate: the candidate
//! working set for one organism can be large, and running organisms one at a
//! time caps peak resident memory.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use ppi_common::PpiError;

use crate::auth::AuthContext;
use crate::catalog::GeneCatalog;
use crate::config::StringDbConfig;
use crate::models::{LoadReport, TaxonBatchOutcome};
use crate::parser::{read_input, PeptideMappingParser, StringLinksParser};
use crate::pipeline::InteractionPipeline;
use crate::resolver::PeptideResolver;
use crate::sink::AssociationSink;

/// Driver for a full STRING interaction load
pub struct StringLoadOrchestrator {
    config: StringDbConfig,
    catalog: Arc<dyn GeneCatalog>,
    sink: Arc<dyn AssociationSink>,
}

impl StringLoadOrchestrator {
    pub fn new(
        config: StringDbConfig,
        catalog: Arc<dyn GeneCatalog>,
        sink: Arc<dyn AssociationSink>,
    ) -> Self {
        Self {
            config,
            catalog,
            sink,
        }
    }

    /// Load interactions for the requested taxa.
    ///
    /// Preconditions are checked before anything spawns: `taxa` must be
    /// non-empty and the links file must be readable. A missing mapping file
    /// is the accepted degenerate case (everything resolves to no genes).
    ///
    /// The first fatal batch error aborts the remaining taxa; the error
    /// reports the organism in progress and the counts persisted before it.
    pub async fn load(
        &self,
        links_path: impl AsRef<Path>,
        mapping_path: Option<impl AsRef<Path>>,
        taxa: &[u32],
    ) -> Result<LoadReport> {
        let links_path = links_path.as_ref();
        let started_at = Utc::now();
        let start = Instant::now();

        self.check_preconditions(links_path, taxa)?;

        let auth = AuthContext::current().unwrap_or_else(AuthContext::system);
        info!(
            links_file = %links_path.display(),
            taxa = taxa.len(),
            principal = %auth.principal(),
            "Starting interaction load"
        );

        // One resolver for the whole run, shared read-only by every batch.
        let resolver = Arc::new(self.build_resolver(mapping_path.as_ref().map(|p| p.as_ref()))?);

        let links_content = read_input(links_path)?;
        let mut by_taxon = StringLinksParser::new()
            .parse(&links_content)
            .context("Failed to parse interaction links file")?;
        drop(links_content);

        let pipeline = InteractionPipeline::new(
            self.config.clone(),
            Arc::clone(&resolver),
            Arc::clone(&self.catalog),
            Arc::clone(&self.sink),
        );

        let mut batches = Vec::with_capacity(taxa.len());

        // Strictly sequential across organisms to bound peak memory.
        for &taxon_id in taxa {
            let records = by_taxon.remove(&taxon_id).unwrap_or_default();
            if records.is_empty() {
                warn!(taxon_id = taxon_id, "No interaction records for taxon");
            }

            let batch_id = Uuid::new_v4();
            let summary = pipeline
                .run(taxon_id, batch_id, records)
                .await
                .with_context(|| {
                    let persisted_so_far: u64 =
                        batches.iter().map(|b: &TaxonBatchOutcome| b.summary.persisted).sum();
                    format!(
                        "Aborting load at taxon {taxon_id}: \
                         {persisted_so_far} associations persisted in earlier batches"
                    )
                })?;

            batches.push(TaxonBatchOutcome {
                taxon_id,
                batch_id,
                summary,
            });
        }

        let report = LoadReport {
            batches,
            started_at,
            completed_at: Utc::now(),
        };

        info!(
            taxa = report.batches.len(),
            persisted = report.total_persisted(),
            dropped = report.total_dropped(),
            duration_secs = start.elapsed().as_secs_f64(),
            "Interaction load complete"
        );

        Ok(report)
    }

    fn check_preconditions(&self, links_path: &Path, taxa: &[u32]) -> Result<()> {
        if taxa.is_empty() {
            return Err(PpiError::Precondition(
                "at least one taxon id is required".to_string(),
            )
            .into());
        }

        // Fail fast with a descriptive error rather than mid-run.
        std::fs::metadata(links_path).map_err(|e| {
            PpiError::Precondition(format!(
                "links file {} is not readable: {}",
                links_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    fn build_resolver(&self, mapping_path: Option<&Path>) -> Result<PeptideResolver> {
        let Some(path) = mapping_path else {
            warn!("No peptide mapping source supplied; all lookups will resolve to no genes");
            return Ok(PeptideResolver::empty());
        };

        if !path.exists() {
            warn!(
                mapping_file = %path.display(),
                "Peptide mapping file absent; all lookups will resolve to no genes"
            );
            return Ok(PeptideResolver::empty());
        }

        let content = read_input(path)?;
        let mappings = PeptideMappingParser::new()
            .parse(&content)
            .context("Failed to parse peptide mapping file")?;

        info!(peptides = mappings.len(), "Built peptide resolver");
        Ok(PeptideResolver::new(mappings))
    }
}

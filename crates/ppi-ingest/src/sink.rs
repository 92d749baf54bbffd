//! Association persistence sink
//!
//! The loader flushes validated associations here in batches; batching is an
//! optimization, the sink must simply accept repeated calls from the single
//! consumer task of a batch. Any error is treated as fatal for the organism
//! batch in progress.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::auth::AuthContext;
use crate::models::GeneAssociation;

/// Write side of the persistence boundary
#[async_trait]
pub trait AssociationSink: Send + Sync {
    /// Persist a batch of validated associations. Either the whole batch is
    /// accepted or an error is returned.
    async fn persist_batch(&self, batch: &[GeneAssociation]) -> Result<()>;
}

/// In-memory sink for tests and dry runs.
///
/// Records the principal active at each persist call so context propagation
/// into the consumer task is observable.
#[derive(Debug, Default)]
pub struct MemoryAssociationSink {
    state: Mutex<MemorySinkState>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    associations: Vec<GeneAssociation>,
    principals: Vec<String>,
}

impl MemoryAssociationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn associations(&self) -> Vec<GeneAssociation> {
        self.state.lock().unwrap().associations.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Principals observed per persist call, in call order
    pub fn principals(&self) -> Vec<String> {
        self.state.lock().unwrap().principals.clone()
    }
}

#[async_trait]
impl AssociationSink for MemoryAssociationSink {
    async fn persist_batch(&self, batch: &[GeneAssociation]) -> Result<()> {
        let principal = AuthContext::current()
            .map(|ctx| ctx.principal().to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        let mut state = self.state.lock().unwrap();
        state.principals.push(principal);
        state.associations.extend_from_slice(batch);
        Ok(())
    }
}

/// Postgres-backed sink using multi-row inserts
#[cfg(feature = "database")]
pub struct PgAssociationSink {
    pool: sqlx::PgPool,
}

#[cfg(feature = "database")]
impl PgAssociationSink {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl AssociationSink for PgAssociationSink {
    async fn persist_batch(&self, batch: &[GeneAssociation]) -> Result<()> {
        use anyhow::Context;

        if batch.is_empty() {
            return Ok(());
        }

        let created_by = AuthContext::current()
            .map(|ctx| ctx.principal().to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        let mut builder = sqlx::QueryBuilder::new(
            "INSERT INTO gene_associations \
             (gene1_id, gene2_id, source_key, source_db, source_version, source_url, \
              evidence, combined_score, created_by) ",
        );

        builder.push_values(batch, |mut row, assoc| {
            row.push_bind(assoc.gene1.id)
                .push_bind(assoc.gene2.id)
                .push_bind(&assoc.source.key)
                .push_bind(&assoc.source.db_name)
                .push_bind(&assoc.source.db_version)
                .push_bind(&assoc.source.base_url)
                .push_bind(assoc.evidence.channels().to_vec())
                .push_bind(assoc.combined_score as i32)
                .push_bind(created_by.clone());
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to insert association batch")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvidenceVector, ExternalSourceRef, Gene, EVIDENCE_CHANNELS};

    fn association() -> GeneAssociation {
        let gene = |id: i64| Gene {
            id,
            ncbi_gene_id: id,
            ensembl_gene_id: format!("ENSG{id:011}"),
            symbol: None,
            taxon_id: 9606,
        };
        GeneAssociation {
            gene1: gene(100),
            gene2: gene(200),
            source: ExternalSourceRef {
                key: "ENSP001|ENSP002".to_string(),
                db_name: "string-db".to_string(),
                db_version: "12.0".to_string(),
                base_url: "https://string-db.org".to_string(),
            },
            evidence: EvidenceVector::new([true; EVIDENCE_CHANNELS]),
            combined_score: 700,
        }
    }

    #[tokio::test]
    async fn test_memory_sink_records_batches() {
        let sink = MemoryAssociationSink::new();
        sink.persist_batch(&[association(), association()])
            .await
            .unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_sink_records_principal() {
        let sink = MemoryAssociationSink::new();
        let ctx = AuthContext::new("curator", vec![]);
        ctx.scope(async { sink.persist_batch(&[association()]).await })
            .await
            .unwrap();
        assert_eq!(sink.principals(), vec!["curator".to_string()]);
    }
}

//! Internal gene catalog lookup
//!
//! The loader validates each candidate endpoint against this catalog before
//! an association may be persisted. Lookups are purely reads; the catalog is
//! only ever queried from the single consumer task of a batch.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Gene;

/// Read-only gene lookup by external (NCBI) gene id
#[async_trait]
pub trait GeneCatalog: Send + Sync {
    /// Find a gene by its NCBI gene id; `None` when the catalog does not
    /// know the gene.
    async fn find_by_ncbi_gene_id(&self, ncbi_gene_id: i64) -> Result<Option<Gene>>;
}

/// In-memory catalog for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryGeneCatalog {
    genes: HashMap<i64, Gene>,
}

impl InMemoryGeneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genes(genes: Vec<Gene>) -> Self {
        Self {
            genes: genes.into_iter().map(|g| (g.ncbi_gene_id, g)).collect(),
        }
    }

    pub fn insert(&mut self, gene: Gene) {
        self.genes.insert(gene.ncbi_gene_id, gene);
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

#[async_trait]
impl GeneCatalog for InMemoryGeneCatalog {
    async fn find_by_ncbi_gene_id(&self, ncbi_gene_id: i64) -> Result<Option<Gene>> {
        Ok(self.genes.get(&ncbi_gene_id).cloned())
    }
}

/// Postgres-backed catalog
#[cfg(feature = "database")]
pub struct PgGeneCatalog {
    pool: sqlx::PgPool,
}

#[cfg(feature = "database")]
impl PgGeneCatalog {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl GeneCatalog for PgGeneCatalog {
    async fn find_by_ncbi_gene_id(&self, ncbi_gene_id: i64) -> Result<Option<Gene>> {
        use anyhow::Context;

        let row: Option<(i64, i64, String, Option<String>, i32)> = sqlx::query_as(
            r#"
            SELECT id, ncbi_gene_id, ensembl_gene_id, symbol, taxon_id
            FROM genes
            WHERE ncbi_gene_id = $1
            "#,
        )
        .bind(ncbi_gene_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query gene catalog")?;

        Ok(row.map(
            |(id, ncbi_gene_id, ensembl_gene_id, symbol, taxon_id)| Gene {
                id,
                ncbi_gene_id,
                ensembl_gene_id,
                symbol,
                taxon_id: taxon_id as u32,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(ncbi_gene_id: i64) -> Gene {
        Gene {
            id: ncbi_gene_id * 10,
            ncbi_gene_id,
            ensembl_gene_id: format!("ENSG{ncbi_gene_id:011}"),
            symbol: None,
            taxon_id: 9606,
        }
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let catalog = InMemoryGeneCatalog::with_genes(vec![gene(100), gene(200)]);

        let found = catalog.find_by_ncbi_gene_id(100).await.unwrap();
        assert_eq!(found.map(|g| g.id), Some(1000));

        let missing = catalog.find_by_ncbi_gene_id(999).await.unwrap();
        assert!(missing.is_none());
    }
}

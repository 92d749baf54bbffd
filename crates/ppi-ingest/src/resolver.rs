//! Peptide-to-gene identifier resolution
//!
//! The resolver holds the immutable peptide-to-gene mapping for a run. It is
//! built once from the mapping file before any pipeline starts and is then
//! shared read-only across organism batches, so it needs no locking.

use std::collections::{BTreeSet, HashMap};

use crate::models::GeneRef;

/// Genes a single Ensembl peptide id maps to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeptideMapping {
    pub ensembl_gene_id: String,
    pub ncbi_gene_ids: BTreeSet<i64>,
}

/// Immutable peptide id -> gene mapping for one run
#[derive(Debug, Default)]
pub struct PeptideResolver {
    mappings: HashMap<String, PeptideMapping>,
}

impl PeptideResolver {
    /// An empty resolver; every lookup yields no genes. Used when no mapping
    /// source is available.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(mappings: HashMap<String, PeptideMapping>) -> Self {
        Self { mappings }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Resolve a peptide id to its gene endpoints.
    ///
    /// A leading taxon prefix ("9606.ENSP...") is stripped before lookup.
    /// A miss, or a mapping with no NCBI gene ids, yields an empty vec; that
    /// is a sparse-mapping fact for the caller to log, not an error.
    pub fn resolve(&self, peptide_id: &str) -> Vec<GeneRef> {
        let key = strip_taxon_prefix(peptide_id);

        match self.mappings.get(key) {
            Some(mapping) => mapping
                .ncbi_gene_ids
                .iter()
                .map(|ncbi_gene_id| GeneRef {
                    ncbi_gene_id: *ncbi_gene_id,
                    ensembl_gene_id: mapping.ensembl_gene_id.clone(),
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Strip a single leading digits-and-dot taxon prefix from a peptide id.
///
/// Upstream sources sometimes prepend the organism taxon id ("9606.ENSP001");
/// the mapping file keys are bare peptide ids.
pub fn strip_taxon_prefix(peptide_id: &str) -> &str {
    match peptide_id.split_once('.') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        },
        _ => peptide_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(peptide: &str, gene: &str, ncbi_ids: &[i64]) -> PeptideResolver {
        let mut mappings = HashMap::new();
        mappings.insert(
            peptide.to_string(),
            PeptideMapping {
                ensembl_gene_id: gene.to_string(),
                ncbi_gene_ids: ncbi_ids.iter().copied().collect(),
            },
        );
        PeptideResolver::new(mappings)
    }

    #[test]
    fn test_strip_taxon_prefix() {
        assert_eq!(strip_taxon_prefix("9606.ENSP001"), "ENSP001");
        assert_eq!(strip_taxon_prefix("ENSP001"), "ENSP001");
        assert_eq!(strip_taxon_prefix("511145.b0001"), "b0001");
    }

    #[test]
    fn test_strip_taxon_prefix_requires_digits() {
        // Only a purely numeric prefix is a taxon prefix
        assert_eq!(strip_taxon_prefix("ENSP.001"), "ENSP.001");
        assert_eq!(strip_taxon_prefix(".ENSP001"), ".ENSP001");
    }

    #[test]
    fn test_resolve_prefixed_and_bare_are_identical() {
        let resolver = resolver_with("ENSP001", "ENSG001", &[100, 101]);
        assert_eq!(resolver.resolve("9606.ENSP001"), resolver.resolve("ENSP001"));
        assert_eq!(resolver.resolve("ENSP001").len(), 2);
    }

    #[test]
    fn test_resolve_miss_is_empty() {
        let resolver = resolver_with("ENSP001", "ENSG001", &[100]);
        assert!(resolver.resolve("ENSP999").is_empty());
    }

    #[test]
    fn test_resolve_empty_gene_set_is_empty() {
        let resolver = resolver_with("ENSP001", "ENSG001", &[]);
        assert!(resolver.resolve("ENSP001").is_empty());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = resolver_with("ENSP001", "ENSG001", &[101, 100]);
        let genes = resolver.resolve("ENSP001");
        // BTreeSet ordering makes fan-out deterministic across runs
        assert_eq!(genes[0].ncbi_gene_id, 100);
        assert_eq!(genes[1].ncbi_gene_id, 101);
    }

    #[test]
    fn test_empty_resolver() {
        let resolver = PeptideResolver::empty();
        assert!(resolver.is_empty());
        assert!(resolver.resolve("9606.ENSP001").is_empty());
    }
}

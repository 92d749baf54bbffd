//! Domain models for the interaction ingestion pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of evidence channels carried by each interaction record
pub const EVIDENCE_CHANNELS: usize = 7;

/// Separator used to build the synthetic external-record key from the two
/// peptide ids of an interaction
pub const SOURCE_KEY_SEPARATOR: char = '|';

/// Presence flags for the seven interaction evidence channels:
/// neighborhood, fusion, cooccurrence, coexpression, experimental,
/// database, textmining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceVector([bool; EVIDENCE_CHANNELS]);

impl EvidenceVector {
    pub fn new(channels: [bool; EVIDENCE_CHANNELS]) -> Self {
        Self(channels)
    }

    /// Build from per-channel scores; a channel counts as present when its
    /// score is non-zero.
    pub fn from_channel_scores(scores: [u16; EVIDENCE_CHANNELS]) -> Self {
        let mut channels = [false; EVIDENCE_CHANNELS];
        for (flag, score) in channels.iter_mut().zip(scores.iter()) {
            *flag = *score > 0;
        }
        Self(channels)
    }

    pub fn channels(&self) -> &[bool; EVIDENCE_CHANNELS] {
        &self.0
    }

    /// True when at least one channel is present
    pub fn any(&self) -> bool {
        self.0.iter().any(|c| *c)
    }
}

/// One raw interaction for one organism, as parsed from the links file.
/// Consumed exactly once by the converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// First Ensembl peptide id, possibly taxon-prefixed (e.g. "9606.ENSP...")
    pub protein1: String,
    /// Second Ensembl peptide id, possibly taxon-prefixed
    pub protein2: String,
    pub evidence: EvidenceVector,
    pub combined_score: u16,
}

impl InteractionRecord {
    /// Synthetic external-record key shared by every candidate expanded from
    /// this record
    pub fn source_key(&self) -> String {
        format!(
            "{}{}{}",
            self.protein1, SOURCE_KEY_SEPARATOR, self.protein2
        )
    }
}

/// Lightweight, unvalidated gene endpoint produced during fan-out.
/// Exists only between converter and loader; never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneRef {
    pub ncbi_gene_id: i64,
    pub ensembl_gene_id: String,
}

/// One gene-pair association expanded from an interaction record.
///
/// All candidates from the same record carry an identical `source_key`,
/// `evidence` and `combined_score`; only the endpoints differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationCandidate {
    pub gene1: GeneRef,
    pub gene2: GeneRef,
    pub source_key: String,
    pub evidence: EvidenceVector,
    pub combined_score: u16,
}

/// A gene as known to the internal catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    /// Internal catalog id
    pub id: i64,
    pub ncbi_gene_id: i64,
    pub ensembl_gene_id: String,
    pub symbol: Option<String>,
    pub taxon_id: u32,
}

/// Identity of the external database an association came from, as supplied
/// by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSourceRef {
    /// Synthetic external-record key ("protein1|protein2")
    pub key: String,
    pub db_name: String,
    pub db_version: String,
    pub base_url: String,
}

/// The durable entity: two catalog-validated genes plus the external-record
/// descriptor. Created only after both endpoints are confirmed to exist;
/// never partially created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneAssociation {
    pub gene1: Gene,
    pub gene2: Gene,
    pub source: ExternalSourceRef,
    pub evidence: EvidenceVector,
    pub combined_score: u16,
}

/// Per-organism-batch result returned by the consumer when it finishes
/// draining the channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Associations persisted to the sink
    pub persisted: u64,
    /// Candidates dropped because an endpoint was missing from the catalog
    pub dropped: u64,
}

/// Outcome of one organism batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonBatchOutcome {
    pub taxon_id: u32,
    pub batch_id: Uuid,
    pub summary: LoadSummary,
}

/// Result of a full load run across all requested organisms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub batches: Vec<TaxonBatchOutcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn total_persisted(&self) -> u64 {
        self.batches.iter().map(|b| b.summary.persisted).sum()
    }

    pub fn total_dropped(&self) -> u64 {
        self.batches.iter().map(|b| b.summary.dropped).sum()
    }
}

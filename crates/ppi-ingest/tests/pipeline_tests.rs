//! Pipeline behavior tests: fan-out, backpressure, validation, completion

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ppi_ingest::auth::AuthContext;
use ppi_ingest::catalog::InMemoryGeneCatalog;
use ppi_ingest::config::StringDbConfig;
use ppi_ingest::convert::InteractionConverter;
use ppi_ingest::models::{
    EvidenceVector, Gene, GeneAssociation, InteractionRecord, EVIDENCE_CHANNELS,
};
use ppi_ingest::pipeline::InteractionPipeline;
use ppi_ingest::resolver::{PeptideMapping, PeptideResolver};
use ppi_ingest::sink::{AssociationSink, MemoryAssociationSink};

fn record(protein1: &str, protein2: &str) -> InteractionRecord {
    InteractionRecord {
        protein1: protein1.to_string(),
        protein2: protein2.to_string(),
        evidence: EvidenceVector::new([true, false, false, false, false, true, false]),
        combined_score: 550,
    }
}

fn resolver(entries: &[(&str, &[i64])]) -> Arc<PeptideResolver> {
    let mut mappings = HashMap::new();
    for (peptide, ncbi_ids) in entries {
        mappings.insert(
            peptide.to_string(),
            PeptideMapping {
                ensembl_gene_id: format!("ENSG-{peptide}"),
                ncbi_gene_ids: ncbi_ids.iter().copied().collect(),
            },
        );
    }
    Arc::new(PeptideResolver::new(mappings))
}

fn catalog(ncbi_ids: &[i64]) -> Arc<InMemoryGeneCatalog> {
    let genes = ncbi_ids
        .iter()
        .map(|&ncbi_gene_id| Gene {
            id: ncbi_gene_id * 10,
            ncbi_gene_id,
            ensembl_gene_id: format!("ENSG{ncbi_gene_id:011}"),
            symbol: None,
            taxon_id: 9606,
        })
        .collect();
    Arc::new(InMemoryGeneCatalog::with_genes(genes))
}

fn pipeline(
    resolver: Arc<PeptideResolver>,
    catalog: Arc<InMemoryGeneCatalog>,
    sink: Arc<MemoryAssociationSink>,
) -> InteractionPipeline {
    InteractionPipeline::new(StringDbConfig::default(), resolver, catalog, sink)
}

/// Sink that fails every persist call
struct FailingSink;

#[async_trait]
impl AssociationSink for FailingSink {
    async fn persist_batch(&self, _batch: &[GeneAssociation]) -> anyhow::Result<()> {
        anyhow::bail!("constraint violation")
    }
}

#[tokio::test]
async fn test_fan_out_cartesian_product() {
    let resolver = resolver(&[("ENSP001", &[1, 2, 3]), ("ENSP002", &[10, 20])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    let pipeline = pipeline(resolver, catalog(&[1, 2, 3, 10, 20]), Arc::clone(&sink));

    let summary = pipeline
        .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP002")])
        .await
        .unwrap();

    // 3 x 2 genes -> 6 candidates, all valid
    assert_eq!(summary.persisted, 6);
    assert_eq!(summary.dropped, 0);

    let associations = sink.associations();
    assert_eq!(associations.len(), 6);
    for assoc in &associations {
        assert_eq!(assoc.source.key, "9606.ENSP001|9606.ENSP002");
        assert_eq!(assoc.combined_score, 550);
        assert_eq!(
            assoc.evidence.channels(),
            &[true, false, false, false, false, true, false]
        );
    }
}

#[tokio::test]
async fn test_zero_fan_out_when_one_side_unresolved() {
    let resolver = resolver(&[("ENSP001", &[1])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    let pipeline = pipeline(resolver, catalog(&[1]), Arc::clone(&sink));

    let summary = pipeline
        .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP999")])
        .await
        .unwrap();

    assert_eq!(summary.persisted, 0);
    assert_eq!(summary.dropped, 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_prefix_stripping_matches_bare_ids() {
    let resolver = resolver(&[("ENSP001", &[1]), ("ENSP002", &[2])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    let pipeline = pipeline(resolver, catalog(&[1, 2]), Arc::clone(&sink));

    // Prefixed and bare ids resolve identically
    let summary = pipeline
        .run(
            9606,
            Uuid::new_v4(),
            vec![
                record("9606.ENSP001", "9606.ENSP002"),
                record("ENSP001", "ENSP002"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(summary.persisted, 2);
}

#[tokio::test]
async fn test_partial_validity_drops_candidate() {
    let resolver = resolver(&[("ENSP001", &[100]), ("ENSP002", &[101])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    // 100 exists, 101 does not
    let pipeline = pipeline(resolver, catalog(&[100]), Arc::clone(&sink));

    let summary = pipeline
        .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP002")])
        .await
        .unwrap();

    assert_eq!(summary.persisted, 0);
    assert_eq!(summary.dropped, 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_reference_scenario() {
    // ENSP001 -> {100, 101}, ENSP002 -> {200}; catalog has 100 and 200.
    let resolver = resolver(&[("ENSP001", &[100, 101]), ("ENSP002", &[200])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    let pipeline = pipeline(resolver, catalog(&[100, 200]), Arc::clone(&sink));

    let summary = pipeline
        .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP002")])
        .await
        .unwrap();

    // Two candidates generated, one persisted: (100, 200)
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.dropped, 1);

    let associations = sink.associations();
    assert_eq!(associations.len(), 1);
    assert_eq!(associations[0].gene1.ncbi_gene_id, 100);
    assert_eq!(associations[0].gene2.ncbi_gene_id, 200);
}

#[tokio::test]
async fn test_empty_catalog_persists_nothing() {
    let resolver = resolver(&[("ENSP001", &[1]), ("ENSP002", &[2])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    let pipeline = pipeline(resolver, catalog(&[]), Arc::clone(&sink));

    let summary = pipeline
        .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP002")])
        .await
        .unwrap();

    assert_eq!(summary.persisted, 0);
    assert_eq!(summary.dropped, 1);
}

#[tokio::test]
async fn test_counts_are_stable_across_reruns() {
    let records = vec![
        record("9606.ENSP001", "9606.ENSP002"),
        record("9606.ENSP002", "9606.ENSP003"),
    ];
    let resolver = resolver(&[
        ("ENSP001", &[1]),
        ("ENSP002", &[2]),
        ("ENSP003", &[3, 4]),
    ]);

    for _ in 0..2 {
        let sink = Arc::new(MemoryAssociationSink::new());
        let pipeline = pipeline(
            Arc::clone(&resolver),
            catalog(&[1, 2, 3, 4]),
            Arc::clone(&sink),
        );
        let summary = pipeline
            .run(9606, Uuid::new_v4(), records.clone())
            .await
            .unwrap();

        // 1x1 + 1x2 candidates, no duplicates introduced by the queue
        assert_eq!(summary.persisted, 3);
        assert_eq!(sink.len(), 3);
    }
}

#[tokio::test]
async fn test_fatal_sink_error_aborts_batch() {
    let resolver = resolver(&[("ENSP001", &[1]), ("ENSP002", &[2])]);
    let pipeline = InteractionPipeline::new(
        StringDbConfig::default(),
        resolver,
        catalog(&[1, 2]),
        Arc::new(FailingSink),
    );

    let result = pipeline
        .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP002")])
        .await;

    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("taxon 9606"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_auth_context_reaches_sink() {
    let resolver = resolver(&[("ENSP001", &[1]), ("ENSP002", &[2])]);
    let sink = Arc::new(MemoryAssociationSink::new());
    let pipeline = pipeline(resolver, catalog(&[1, 2]), Arc::clone(&sink));

    let ctx = AuthContext::new("curator", vec!["writer".to_string()]);
    ctx.scope(async {
        pipeline
            .run(9606, Uuid::new_v4(), vec![record("9606.ENSP001", "9606.ENSP002")])
            .await
    })
    .await
    .unwrap();

    // The sink ran on the consumer task but saw the caller's principal
    assert_eq!(sink.principals(), vec!["curator".to_string()]);
}

#[tokio::test]
async fn test_backpressure_blocks_producer_at_capacity() {
    let resolver = resolver(&[("ENSP001", &[1]), ("ENSP002", &[2])]);
    let records: Vec<InteractionRecord> = (0..5)
        .map(|_| record("9606.ENSP001", "9606.ENSP002"))
        .collect();

    let (tx, mut rx) = mpsc::channel(2);
    let converter = InteractionConverter::new(resolver, tx, CancellationToken::new());
    let handle = tokio::spawn(converter.run(records));

    // With nobody draining, the producer must stall once the channel holds
    // its full capacity.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(rx.len(), 2);
    assert!(!handle.is_finished());

    // Draining unblocks the producer; all candidates arrive exactly once.
    let mut received = 0;
    while rx.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 5);
    assert_eq!(handle.await.unwrap(), 5);
}

#[tokio::test]
async fn test_cancellation_stops_producer_gracefully() {
    let resolver = resolver(&[("ENSP001", &[1]), ("ENSP002", &[2])]);
    let records: Vec<InteractionRecord> = (0..100)
        .map(|_| record("9606.ENSP001", "9606.ENSP002"))
        .collect();

    let (tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let converter = InteractionConverter::new(resolver, tx, cancel.clone());
    let handle = tokio::spawn(converter.run(records));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    // Graceful stop: the task completes normally with a partial count.
    let emitted = handle.await.unwrap();
    assert!(emitted < 100);
    drop(rx);
}

#[tokio::test]
async fn test_evidence_channel_count() {
    // The wire format carries exactly seven evidence channels
    assert_eq!(EVIDENCE_CHANNELS, 7);
}

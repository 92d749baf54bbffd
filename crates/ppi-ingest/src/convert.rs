//! Interaction-to-candidate conversion (producer side)
//!
//! For each raw interaction record, both peptide ids are resolved
//! independently; the full cartesian product of the two gene sets is emitted
//! onto the bounded channel, one candidate per gene pair. A record with an
//! unresolved side produces nothing: partial fan-out is not permitted.
//!
//! Writes to a full channel suspend the producer; that backpressure is the
//! load-shedding mechanism, not an error. Completion is signaled by dropping
//! the sender, which closes the channel for the consumer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::{AssociationCandidate, InteractionRecord};
use crate::resolver::PeptideResolver;

/// Producer half of an organism batch
pub struct InteractionConverter {
    resolver: Arc<PeptideResolver>,
    tx: mpsc::Sender<AssociationCandidate>,
    cancel: CancellationToken,
}

impl InteractionConverter {
    pub fn new(
        resolver: Arc<PeptideResolver>,
        tx: mpsc::Sender<AssociationCandidate>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            resolver,
            tx,
            cancel,
        }
    }

    /// Convert all records, emitting candidates onto the channel.
    ///
    /// Returns the number of candidates emitted. Cancellation, or a consumer
    /// that has gone away, stops conversion early; that is a graceful stop,
    /// not a failure, because the subsystem makes no atomicity guarantee
    /// across an organism batch.
    pub async fn run(self, records: Vec<InteractionRecord>) -> u64 {
        let mut emitted = 0u64;

        'records: for record in records {
            let genes1 = self.resolver.resolve(&record.protein1);
            if genes1.is_empty() {
                warn!(
                    peptide_id = %record.protein1,
                    "Skipping interaction: first protein resolved to no genes"
                );
                continue;
            }

            let genes2 = self.resolver.resolve(&record.protein2);
            if genes2.is_empty() {
                warn!(
                    peptide_id = %record.protein2,
                    "Skipping interaction: second protein resolved to no genes"
                );
                continue;
            }

            let source_key = record.source_key();

            for gene1 in &genes1 {
                for gene2 in &genes2 {
                    let candidate = AssociationCandidate {
                        gene1: gene1.clone(),
                        gene2: gene2.clone(),
                        source_key: source_key.clone(),
                        evidence: record.evidence,
                        combined_score: record.combined_score,
                    };

                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            debug!(emitted = emitted, "Conversion cancelled, stopping early");
                            break 'records;
                        }
                        sent = self.tx.send(candidate) => {
                            if sent.is_err() {
                                // Consumer dropped its receiver; nothing left
                                // to deliver to.
                                warn!(emitted = emitted, "Candidate channel closed, stopping early");
                                break 'records;
                            }
                            emitted += 1;
                        }
                    }
                }
            }
        }

        debug!(emitted = emitted, "Conversion finished");
        // Dropping self.tx here closes the channel: the consumer sees
        // end-of-stream once it has drained what was delivered.
        emitted
    }
}

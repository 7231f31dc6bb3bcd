//! Batch conversion of independent passages.
//!
//! Each passage is converted on its own graph; a fatal error in one
//! passage is recorded as a failure and the batch moves on. The registry
//! lists every converted passage with its fingerprint, in input order.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::convert::{ConvertError, GraphConverter};
use crate::passage::Passage;
use crate::policy::ConvertPolicy;
use crate::types::{ConversionReport, DerivationTree};

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Passage with its terminal layer.
    pub passage: Passage,
    /// Parser output for the passage.
    pub tree: DerivationTree,
}

impl ConversionJob {
    /// Create a job.
    pub fn new(passage: Passage, tree: DerivationTree) -> Self {
        Self { passage, tree }
    }
}

/// A successfully converted passage.
#[derive(Debug, Clone)]
pub struct ConvertedPassage {
    /// The populated passage.
    pub passage: Passage,
    /// What happened during conversion.
    pub report: ConversionReport,
}

/// A passage whose conversion failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Passage id.
    pub passage_id: String,
    /// Error message.
    pub error: String,
    /// Whether the failure was a cycle violation.
    pub cycle_violation: bool,
}

/// Metadata for a single passage in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageRegistryEntry {
    /// Passage id.
    pub passage_id: String,
    /// Graph fingerprint.
    pub fingerprint: String,
    /// Number of nodes.
    pub node_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Number of recorded warnings.
    pub warning_count: usize,
}

/// Registry of all converted passages in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageRegistry {
    /// Individual entries.
    pub entries: Vec<PassageRegistryEntry>,
    /// Hash of the registry for integrity verification.
    pub registry_hash: String,
}

impl PassageRegistry {
    /// Create a new registry from entries.
    pub fn new(entries: Vec<PassageRegistryEntry>) -> Self {
        let registry_hash = canonical_hash_hex(&entries);
        Self {
            entries,
            registry_hash,
        }
    }

    /// Get entry by passage id.
    pub fn get(&self, passage_id: &str) -> Option<&PassageRegistryEntry> {
        self.entries.iter().find(|e| e.passage_id == passage_id)
    }
}

/// Result of a batch conversion.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Policy ID used.
    pub policy_id: String,
    /// Policy parameters hash.
    pub policy_params_hash: String,
    /// Converted passages, in input order.
    pub converted: Vec<ConvertedPassage>,
    /// Failed passages, in input order.
    pub failures: Vec<BatchFailure>,
    /// Registry of converted passages.
    pub registry: PassageRegistry,
}

impl BatchResult {
    /// Whether every passage converted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Batch converter for many independent passages.
#[derive(Debug, Clone, Default)]
pub struct BatchConverter {
    converter: GraphConverter,
}

impl BatchConverter {
    /// Create a new batch converter.
    pub fn new(policy: ConvertPolicy) -> Self {
        Self {
            converter: GraphConverter::new(policy),
        }
    }

    /// Get the underlying converter.
    pub fn converter(&self) -> &GraphConverter {
        &self.converter
    }

    /// Convert every job sequentially.
    pub fn convert_all(&self, jobs: Vec<ConversionJob>) -> BatchResult {
        let outcomes = jobs.into_iter().map(|job| self.convert_one(job)).collect();
        self.assemble(outcomes)
    }

    /// Convert every job on the rayon pool. Output order matches input order.
    #[cfg(feature = "parallel")]
    pub fn convert_all_parallel(&self, jobs: Vec<ConversionJob>) -> BatchResult {
        use rayon::prelude::*;

        let outcomes = jobs.into_par_iter().map(|job| self.convert_one(job)).collect();
        self.assemble(outcomes)
    }

    fn convert_one(&self, job: ConversionJob) -> Result<ConvertedPassage, (String, ConvertError)> {
        let ConversionJob { mut passage, tree } = job;
        match self.converter.convert(&mut passage, &tree) {
            Ok(report) => Ok(ConvertedPassage { passage, report }),
            Err(e) => Err((passage.id().to_string(), e)),
        }
    }

    fn assemble(&self, outcomes: Vec<Result<ConvertedPassage, (String, ConvertError)>>) -> BatchResult {
        let mut converted = Vec::new();
        let mut failures = Vec::new();
        let mut entries = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(done) => {
                    entries.push(PassageRegistryEntry {
                        passage_id: done.passage.id().to_string(),
                        fingerprint: done.report.fingerprint.clone(),
                        node_count: done.passage.num_nodes(),
                        edge_count: done.passage.num_edges(),
                        warning_count: done.report.warnings.len(),
                    });
                    converted.push(done);
                }
                Err((passage_id, error)) => {
                    tracing::warn!(
                        passage_id = %passage_id,
                        error = %error,
                        "Passage conversion failed, skipping"
                    );
                    failures.push(BatchFailure {
                        passage_id,
                        cycle_violation: matches!(error, ConvertError::CycleViolation { .. }),
                        error: error.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            converted = converted.len(),
            failed = failures.len(),
            "Batch conversion finished"
        );

        BatchResult {
            policy_id: self.converter.policy().policy_id().to_string(),
            policy_params_hash: self.converter.policy().params_hash(),
            converted,
            failures,
            registry: PassageRegistry::new(entries),
        }
    }
}

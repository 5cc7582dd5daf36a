//! Per-record validation orchestrator.
//!
//! One record at a time: run the deterministic rule validators, layer the
//! external agents' findings onto the per-field results, then hand the
//! merged verdicts to the synthesizer. The orchestrator owns the client,
//! cache, and resolver it is constructed with, so independent runs never
//! share circuit or cache state.
//!
//! External agents run in table order. Later agents reuse the resolutions
//! earlier ones cached, so a record costs at most one upstream round per
//! distinct lookup.

use std::sync::Arc;
use std::time::Duration;

use sightline_core::{
    qa, validators, FieldValidationResult, Record, RecordValidationResult, Synthesizer,
};

use crate::agents::{
    CountyRecordAgent, ExternalAgent, FamilyAgent, PlaceAgent, StateRecordAgent, TaxonAgent,
};
use crate::cache::LookupCache;
use crate::client::ResilientClient;
use crate::config::RuntimeConfig;
use crate::hierarchy::HierarchyValidator;
use crate::provider::TaxonomyProvider;
use crate::resilience::CircuitState;
use crate::resolver::NameResolver;

/// Validates records end-to-end: static rules plus upstream verification.
pub struct ValidationOrchestrator {
    client: Arc<ResilientClient>,
    resolver: Arc<NameResolver>,
    agents: Vec<Arc<dyn ExternalAgent>>,
    synthesizer: Synthesizer,
    record_deadline: Option<Duration>,
}

impl ValidationOrchestrator {
    /// Wire up a full orchestrator over the given provider.
    pub fn new(provider: Arc<dyn TaxonomyProvider>, config: RuntimeConfig) -> Self {
        let client = Arc::new(ResilientClient::with_config(provider, config.client));
        let cache = Arc::new(LookupCache::new(config.cache.max_entries));
        let resolver = Arc::new(
            NameResolver::new(client.clone(), cache, config.cache.ttls)
                .strict(config.strict_resolution),
        );
        let hierarchy = Arc::new(HierarchyValidator::new(resolver.clone()));

        // The fixed agent table, in column order.
        let agents: Vec<Arc<dyn ExternalAgent>> = vec![
            Arc::new(FamilyAgent::new(hierarchy.clone())),
            Arc::new(TaxonAgent::new(hierarchy.clone())),
            Arc::new(PlaceAgent::new(resolver.clone())),
            Arc::new(StateRecordAgent::new(hierarchy.clone(), resolver.clone())),
            Arc::new(CountyRecordAgent::new(hierarchy, resolver.clone())),
        ];

        Self {
            client,
            resolver,
            agents,
            synthesizer: Synthesizer::new(),
            record_deadline: config.record_deadline,
        }
    }

    /// Drop all state carried over from a previous run: cached lookups and
    /// the circuit position.
    pub fn begin_run(&self) {
        self.resolver.clear_cache();
        self.client.reset_circuit();
    }

    /// Current circuit state (diagnostics).
    pub fn circuit_state(&self) -> CircuitState {
        self.client.circuit_state()
    }

    /// Validate one record. Never fails: every upstream problem is folded
    /// into the result, and a deadline abort reports `Incomplete`.
    pub async fn validate_record(
        &self,
        row_index: usize,
        record: &Record,
    ) -> RecordValidationResult {
        let work = self.validate_inner(row_index, record);
        match self.record_deadline {
            Some(deadline) => match tokio::time::timeout(deadline, work).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(row_index, deadline = ?deadline, "Record validation aborted");
                    RecordValidationResult::incomplete(row_index)
                }
            },
            None => work.await,
        }
    }

    /// Validate a batch in input order, then apply the cross-row QA pass.
    pub async fn validate_batch(&self, records: &[Record]) -> Vec<RecordValidationResult> {
        let mut results = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            let result = self.validate_record(row_index, record).await;
            tracing::debug!(
                row_index,
                status = result.status.as_str(),
                "Record validated"
            );
            results.push(result);
        }
        qa::enforce_record_uniqueness(records, &mut results, &self.synthesizer);
        results
    }

    async fn validate_inner(&self, row_index: usize, record: &Record) -> RecordValidationResult {
        let mut fields: Vec<FieldValidationResult> = validators::registry()
            .iter()
            .map(|v| v.validate(record.field(v.field()), record))
            .collect();

        for agent in &self.agents {
            let finding = agent.validate(record.field(agent.field()), record).await;
            if let Some(base) = fields.iter_mut().find(|f| f.field == finding.field) {
                merge_finding(base, finding, agent.name());
            }
        }

        self.synthesizer.synthesize(row_index, record, fields)
    }
}

/// Fold an agent's finding into the rule result for the same field.
///
/// The rule correction wins when both propose one: a full-confidence
/// normalization must not be displaced by a below-threshold suggestion,
/// which is preserved in the metadata instead.
fn merge_finding(base: &mut FieldValidationResult, finding: FieldValidationResult, agent: &str) {
    let contributed =
        !finding.errors.is_empty() || !finding.warnings.is_empty() || finding.correction.is_some();

    if !finding.is_valid {
        base.is_valid = false;
    }
    base.errors.extend(finding.errors);
    base.warnings.extend(finding.warnings);
    base.metadata.extend(finding.metadata);

    if let Some(correction) = finding.correction {
        if base.correction.is_none() {
            base.correction = Some(correction);
        } else {
            base.metadata.insert(
                "suggested_value".to_string(),
                serde_json::json!(correction.value),
            );
        }
    }
    if contributed {
        base.validator.push_str(", ");
        base.validator.push_str(agent);
    }
}

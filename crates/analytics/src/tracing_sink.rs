use agentads_core::collaborators::DecisionSink;
use agentads_core::types::DecisionRecord;
use tracing::{debug, info};

/// Emits each decision record as a structured log line.
/// Used when no ClickHouse backend is configured.
pub struct TracingSink;

impl DecisionSink for TracingSink {
    fn record(&self, record: DecisionRecord) {
        let selected = record.scored.iter().filter(|s| s.selected).count();
        info!(
            target: "agentads::decision_log",
            decision_id = %record.decision_id,
            request_id = %record.request_id,
            agent_id = %record.agent_id,
            taxonomy = %record.effective_taxonomy,
            migrated = record.taxonomy_migrated,
            match_kind = record.match_kind.as_str(),
            status = ?record.status,
            fetched = record.candidates_fetched,
            eligible = record.candidates_eligible,
            selected = selected,
            latency_us = record.latency_us,
            "Decision recorded"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&record) {
                debug!(target: "agentads::decision_log", record = %json, "Decision record detail");
            }
        }
    }
}

//! Flat row shape of the `decision_log` table.

use agentads_core::types::{DecisionRecord, DecisionStatus};
use clickhouse::Row;
use serde::Serialize;
use uuid::Uuid;

/// One decision as written to ClickHouse via a typed `RowBinary` insert.
/// Field order matches the table columns. Nested parts of the record are
/// stored as JSON strings.
#[derive(Debug, Clone, Row, Serialize)]
pub struct DecisionRow {
    #[serde(with = "clickhouse::serde::uuid")]
    pub decision_id: Uuid,
    pub request_id: String,
    pub agent_id: String,
    pub node_id: String,
    pub placement_type: String,
    pub surface: String,
    pub requested_taxonomy: String,
    pub effective_taxonomy: String,
    pub taxonomy_migrated: u8,
    pub match_kind: String,
    pub status: String,
    pub candidates_fetched: u64,
    pub candidates_eligible: u64,
    pub units_selected: u64,
    pub rejections: String,
    pub scored: String,
    pub latency_us: u64,
    /// Milliseconds since the epoch, the wire form of `DateTime64(3)`.
    pub timestamp: i64,
}

impl DecisionRow {
    pub fn from_record(record: &DecisionRecord) -> Self {
        Self {
            decision_id: record.decision_id,
            request_id: record.request_id.clone(),
            agent_id: record.agent_id.clone(),
            node_id: record.node_id.clone(),
            placement_type: record.placement_type.as_str().to_string(),
            surface: record.surface.clone(),
            requested_taxonomy: record.requested_taxonomy.clone(),
            effective_taxonomy: record.effective_taxonomy.clone(),
            taxonomy_migrated: record.taxonomy_migrated as u8,
            match_kind: record.match_kind.as_str().to_string(),
            status: match record.status {
                DecisionStatus::Filled => "filled",
                DecisionStatus::NoFill => "no_fill",
            }
            .to_string(),
            candidates_fetched: record.candidates_fetched as u64,
            candidates_eligible: record.candidates_eligible as u64,
            units_selected: record.scored.iter().filter(|s| s.selected).count() as u64,
            rejections: serde_json::to_string(&record.rejections).unwrap_or_default(),
            scored: serde_json::to_string(&record.scored).unwrap_or_default(),
            latency_us: record.latency_us,
            timestamp: record.timestamp.timestamp_millis(),
        }
    }
}

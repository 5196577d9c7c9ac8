#![warn(clippy::unwrap_used)]

pub mod logger;
pub mod row;
pub mod tracing_sink;

pub use logger::{ClickHouseWriter, DecisionLogger, RowWriter};
pub use row::DecisionRow;
pub use tracing_sink::TracingSink;

use agentads_core::collaborators::DecisionSink;
use agentads_core::config::ClickHouseConfig;
use std::sync::Arc;

/// Build the decision sink for this node: ClickHouse when enabled, the log otherwise.
pub async fn create_sink(config: &ClickHouseConfig) -> anyhow::Result<Arc<dyn DecisionSink>> {
    if config.enabled {
        Ok(Arc::new(DecisionLogger::new(config).await?))
    } else {
        tracing::info!("ClickHouse disabled, decision records go to the log");
        Ok(Arc::new(TracingSink))
    }
}

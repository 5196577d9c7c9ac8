//! Asynchronous decision logger that batches records and writes to ClickHouse.
//! Uses a channel-based architecture so the decision path never waits on I/O.

use crate::row::DecisionRow;
use agentads_core::collaborators::DecisionSink;
use agentads_core::config::ClickHouseConfig;
use agentads_core::types::DecisionRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 100_000;

/// Destination for flushed batches.
#[async_trait]
pub trait RowWriter: Send + Sync + 'static {
    async fn write(&self, rows: &[DecisionRow]) -> anyhow::Result<()>;
}

/// Decision logger with background batch writer.
pub struct DecisionLogger {
    sender: mpsc::Sender<DecisionRecord>,
    dropped: AtomicU64,
}

impl DecisionLogger {
    /// Connect to ClickHouse, verify the schema and spawn the background writer.
    pub async fn new(config: &ClickHouseConfig) -> anyhow::Result<Self> {
        let writer = ClickHouseWriter::new(config).await?;
        let logger = Self::spawn(
            writer,
            CHANNEL_CAPACITY,
            config.batch_size,
            Duration::from_millis(config.flush_interval_ms),
        );
        info!(
            url = %config.url,
            database = %config.database,
            "Decision logger initialized with ClickHouse backend"
        );
        Ok(logger)
    }

    /// Spawn a batch writer over `writer`. Must be called inside a tokio runtime.
    pub fn spawn<W: RowWriter>(
        writer: W,
        capacity: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<DecisionRecord>(capacity);
        tokio::spawn(async move {
            run_batches(writer, receiver, batch_size.max(1), flush_interval).await;
        });
        Self {
            sender,
            dropped: AtomicU64::new(0),
        }
    }

    /// Records dropped because the queue was full or the writer had stopped.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DecisionSink for DecisionLogger {
    fn record(&self, record: DecisionRecord) {
        if let Err(e) = self.sender.try_send(record) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("decision_log.dropped").increment(1);
            warn!("Decision record dropped: {}", e);
        } else {
            metrics::counter!("decision_log.queued").increment(1);
        }
    }
}

/// Buffer records until `batch_size` or `flush_interval`, whichever comes first.
/// Returns after the channel closes and the remainder is flushed.
async fn run_batches<W: RowWriter>(
    writer: W,
    mut receiver: mpsc::Receiver<DecisionRecord>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut buffer: Vec<DecisionRow> = Vec::with_capacity(batch_size);
    let mut interval = tokio::time::interval(flush_interval);

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Some(record) => {
                    buffer.push(DecisionRow::from_record(&record));
                    if buffer.len() >= batch_size {
                        flush(&writer, &mut buffer).await;
                    }
                }
                None => {
                    if !buffer.is_empty() {
                        flush(&writer, &mut buffer).await;
                    }
                    debug!("Decision log channel closed, writer exiting");
                    return;
                }
            },
            _ = interval.tick() => {
                if !buffer.is_empty() {
                    flush(&writer, &mut buffer).await;
                }
            }
        }
    }
}

async fn flush<W: RowWriter>(writer: &W, buffer: &mut Vec<DecisionRow>) {
    let count = buffer.len();
    debug!(count = count, "Flushing decision batch");

    match writer.write(buffer).await {
        Ok(()) => {
            metrics::counter!("decision_log.flushed").increment(count as u64);
            debug!(count = count, "Decision batch flushed successfully");
        }
        Err(e) => {
            metrics::counter!("decision_log.flush_errors").increment(1);
            error!(error = %e, count = count, "Failed to flush decision batch");
        }
    }

    buffer.clear();
}

/// Writes batches into the `decision_log` table.
pub struct ClickHouseWriter {
    client: clickhouse::Client,
}

impl ClickHouseWriter {
    pub async fn new(config: &ClickHouseConfig) -> anyhow::Result<Self> {
        let client = clickhouse::Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        Self::ensure_schema(&client).await?;

        Ok(Self { client })
    }

    async fn ensure_schema(client: &clickhouse::Client) -> anyhow::Result<()> {
        client
            .query(
                "CREATE TABLE IF NOT EXISTS decision_log (
                    decision_id UUID,
                    request_id String,
                    agent_id String,
                    node_id String,
                    placement_type LowCardinality(String),
                    surface String,
                    requested_taxonomy String,
                    effective_taxonomy String,
                    taxonomy_migrated UInt8,
                    match_kind LowCardinality(String),
                    status LowCardinality(String),
                    candidates_fetched UInt64,
                    candidates_eligible UInt64,
                    units_selected UInt64,
                    rejections String,
                    scored String,
                    latency_us UInt64,
                    timestamp DateTime64(3)
                ) ENGINE = MergeTree()
                ORDER BY (timestamp, status, node_id)
                PARTITION BY toYYYYMM(timestamp)
                TTL toDateTime(timestamp) + INTERVAL 90 DAY",
            )
            .execute()
            .await?;

        info!("ClickHouse decision_log schema verified");
        Ok(())
    }
}

#[async_trait]
impl RowWriter for ClickHouseWriter {
    async fn write(&self, rows: &[DecisionRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut insert = self.client.insert::<DecisionRow>("decision_log")?;
        for row in rows {
            insert.write(row).await?;
        }
        insert.end().await?;
        Ok(())
    }
}

use crate::config::IntegrityPolicy;
use crate::datasource::{ContractReader, EventSource, EventSourceError};
use crate::db::{Repository, StoreError};
use crate::domain::{EventCursor, LogEvent};
use crate::engine::EngineError;
use crate::handlers::{apply_event, ContractContexts, HandlerContext, Outcome};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Pulls decoded events from an [`EventSource`] and applies them one at a
/// time, each in its own transaction together with the cursor update.
#[derive(Clone)]
pub struct Indexer {
    source: Arc<dyn EventSource>,
    reader: Arc<dyn ContractReader>,
    contexts: Arc<ContractContexts>,
    repo: Arc<Repository>,
    policy: IntegrityPolicy,
    batch_size: usize,
    poll_interval: Duration,
}

impl Indexer {
    pub fn new(
        source: Arc<dyn EventSource>,
        reader: Arc<dyn ContractReader>,
        contexts: Arc<ContractContexts>,
        repo: Arc<Repository>,
    ) -> Self {
        Self {
            source,
            reader,
            contexts,
            repo,
            policy: IntegrityPolicy::Halt,
            batch_size: 500,
            poll_interval: Duration::from_millis(5000),
        }
    }

    pub fn with_policy(mut self, policy: IntegrityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Fetch one batch after the stored cursor and apply it.
    pub async fn run_once(&self) -> Result<BatchReport, IndexerError> {
        let cursor = self.repo.get_cursor().await?;
        let events = self.source.fetch_events(cursor, self.batch_size).await?;

        let mut report = BatchReport {
            fetched: events.len(),
            cursor,
            ..BatchReport::default()
        };

        for event in &events {
            let position = EventCursor::from_event(event);
            // Sources may overlap with what was already applied.
            if report.cursor.is_some_and(|c| position <= c) {
                debug!(event_id = %event.meta.event_id(), "Event at or before cursor, skipping");
                continue;
            }

            match self.apply(event, position).await? {
                Applied::Outcome(Outcome::Applied) => report.applied += 1,
                Applied::Outcome(Outcome::Duplicate) => report.duplicates += 1,
                Applied::Skipped => report.skipped += 1,
            }
            report.cursor = Some(position);
        }

        if report.fetched > 0 {
            info!(
                fetched = report.fetched,
                applied = report.applied,
                duplicates = report.duplicates,
                skipped = report.skipped,
                "Batch indexed"
            );
        }
        Ok(report)
    }

    /// Poll until `shutdown` flips to true or an event halts indexing.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), IndexerError> {
        info!(policy = ?self.policy, batch_size = self.batch_size, "Indexer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_once().await?;
            // A full batch means more may be waiting.
            if report.fetched >= self.batch_size {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Indexer stopped");
        Ok(())
    }

    async fn apply(
        &self,
        event: &LogEvent,
        position: EventCursor,
    ) -> Result<Applied, IndexerError> {
        let event_id = event.meta.event_id();
        let ctx = HandlerContext::new(self.reader.as_ref(), self.contexts.as_ref());

        let mut store = self.repo.begin().await?;
        let result = apply_event(&mut store, ctx, event).await;

        match result {
            Ok(outcome) => {
                store.store_cursor(position, &event_id).await?;
                store.commit().await?;
                debug!(event_id = %event_id, event = event.event.name(), ?outcome, "Event applied");
                Ok(Applied::Outcome(outcome))
            }
            Err(err) if self.skippable(&err) => {
                store.rollback().await?;
                if err.is_integrity_violation() {
                    error!(
                        event_id = %event_id,
                        event = event.event.name(),
                        error = %err,
                        "Integrity violation, skipping event"
                    );
                } else {
                    warn!(
                        event_id = %event_id,
                        event = event.event.name(),
                        error = %err,
                        "Invalid event, skipping"
                    );
                }

                let mut store = self.repo.begin().await?;
                store.store_cursor(position, &event_id).await?;
                store.commit().await?;
                Ok(Applied::Skipped)
            }
            Err(err) => {
                store.rollback().await?;
                error!(
                    event_id = %event_id,
                    event = event.event.name(),
                    error = %err,
                    "Halting indexer"
                );
                Err(IndexerError::Engine {
                    event_id,
                    source: err,
                })
            }
        }
    }

    fn skippable(&self, err: &EngineError) -> bool {
        err.is_invalid_event()
            || (err.is_integrity_violation() && self.policy == IntegrityPolicy::Skip)
    }
}

enum Applied {
    Outcome(Outcome),
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub fetched: usize,
    pub applied: usize,
    pub duplicates: usize,
    pub skipped: usize,
    /// Cursor after the batch.
    pub cursor: Option<EventCursor>,
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error(transparent)]
    Source(#[from] EventSourceError),
    #[error("event {event_id}: {source}")]
    Engine {
        event_id: String,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl IndexerError {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, IndexerError::Engine { source, .. } if source.is_integrity_violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{MockContractReader, MockEventSource};
    use crate::db::migrations::init_db;
    use crate::domain::{
        Address, EventMeta, FeeRegistered, NewFundCreated, ProtocolEvent, Timestamp,
    };
    use tempfile::TempDir;

    async fn setup_repo() -> (Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Arc::new(Repository::new(pool)), temp_dir)
    }

    fn addr(byte: u8) -> Address {
        Address::parse(&format!("0x{}", format!("{:02x}", byte).repeat(20))).unwrap()
    }

    fn meta(block_number: u64, log_index: u64, contract: Address) -> EventMeta {
        EventMeta {
            tx_hash: format!("0x{:064x}", block_number),
            log_index,
            block_number,
            timestamp: Timestamp::new(1_600_000_000 + block_number as i64),
            address: contract,
            from: addr(0xee),
        }
    }

    fn fee_registered(block_number: u64, identifier: &str) -> LogEvent {
        LogEvent {
            meta: meta(block_number, 0, addr(0x01)),
            event: ProtocolEvent::FeeRegistered(FeeRegistered {
                fee: addr(block_number as u8),
                identifier: identifier.to_string(),
            }),
        }
    }

    fn indexer(source: MockEventSource, repo: Arc<Repository>) -> Indexer {
        Indexer::new(
            Arc::new(source),
            Arc::new(MockContractReader::new()),
            Arc::new(ContractContexts::new()),
            repo,
        )
    }

    #[tokio::test]
    async fn test_run_once_applies_and_advances_cursor() {
        let (repo, _temp) = setup_repo().await;
        let source = MockEventSource::new().with_events(vec![
            fee_registered(10, "MANAGEMENT"),
            fee_registered(11, "PERFORMANCE"),
        ]);
        let indexer = indexer(source, repo.clone());

        let report = indexer.run_once().await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.applied, 2);
        assert_eq!(report.cursor, Some(EventCursor::new(11, 0)));
        assert_eq!(repo.get_cursor().await.unwrap(), Some(EventCursor::new(11, 0)));

        let again = indexer.run_once().await.unwrap();
        assert_eq!(again.fetched, 0);
        assert_eq!(repo.count_events().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_event_is_skipped() {
        let (repo, _temp) = setup_repo().await;
        let source = MockEventSource::new().with_events(vec![
            fee_registered(10, "NOT_A_FEE"),
            fee_registered(11, "MANAGEMENT"),
        ]);
        let report = indexer(source, repo.clone()).run_once().await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.applied, 1);
        assert_eq!(repo.count_events().await.unwrap(), 1);
        assert_eq!(repo.get_cursor().await.unwrap(), Some(EventCursor::new(11, 0)));
    }

    #[tokio::test]
    async fn test_missing_context_halts_without_advancing() {
        let (repo, _temp) = setup_repo().await;
        let requestor = addr(0x77);
        let source = MockEventSource::new().with_events(vec![
            fee_registered(10, "MANAGEMENT"),
            LogEvent {
                meta: meta(11, 0, requestor),
                event: ProtocolEvent::RequestExecutorAdded(crate::domain::RequestExecutorChange {
                    account: addr(0x99),
                }),
            },
        ]);

        let err = indexer(source, repo.clone()).run_once().await.unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Engine {
                source: EngineError::MissingContext { .. },
                ..
            }
        ));
        assert!(!err.is_integrity_violation());
        assert_eq!(repo.get_cursor().await.unwrap(), Some(EventCursor::new(10, 0)));
    }

    #[tokio::test]
    async fn test_integrity_policy_halt_and_skip() {
        // Settling a fee that was never registered.
        let orphan = LogEvent {
            meta: meta(12, 3, addr(0x44)),
            event: ProtocolEvent::ManagementFeeSettled(crate::domain::FeeSettled {
                comptroller_proxy: addr(0x55),
                payer: Some(addr(0x66)),
                shares_quantity: "1".to_string(),
            }),
        };

        let (repo, _temp) = setup_repo().await;
        let halting = indexer(MockEventSource::new().with_event(orphan.clone()), repo.clone());
        let err = halting.run_once().await.unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(repo.get_cursor().await.unwrap(), None);

        let skipping = halting.with_policy(IntegrityPolicy::Skip);
        let report = skipping.run_once().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(repo.get_cursor().await.unwrap(), Some(EventCursor::new(12, 3)));
        assert_eq!(repo.count_events().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (repo, _temp) = setup_repo().await;
        let source = MockEventSource::new().with_event(LogEvent {
            meta: meta(1, 0, addr(0x01)),
            event: ProtocolEvent::NewFundCreated(NewFundCreated {
                creator: addr(0x02),
                comptroller_proxy: addr(0x03),
                vault_proxy: addr(0x04),
                fund_owner: addr(0x05),
                fund_name: "Alpha".to_string(),
                denomination_asset: addr(0x06),
            }),
        });
        let indexer = Indexer::new(
            Arc::new(source),
            Arc::new(MockContractReader::new().with_decimals(addr(0x06), 6)),
            Arc::new(ContractContexts::new()),
            repo.clone(),
        )
        .with_poll_interval(Duration::from_millis(10));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { indexer.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        handle.await.unwrap().unwrap();
        assert_eq!(repo.get_cursor().await.unwrap(), Some(EventCursor::new(1, 0)));
        assert!(repo.get_fund(addr(0x04).as_str()).await.unwrap().is_some());
    }
}

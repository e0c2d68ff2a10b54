//! Event source backed by a JSON-lines file of decoded logs.

use super::{EventSource, EventSourceError};
use crate::domain::{sort_events_deterministic, EventCursor, LogEvent};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Reads one [`LogEvent`] per line. Blank lines are ignored.
///
/// The file may be appended to while the indexer runs; every fetch rereads it.
#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    path: PathBuf,
}

impl JsonlEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parse a JSON-lines document into events in chain order.
pub fn parse_events(contents: &str) -> Result<Vec<LogEvent>, EventSourceError> {
    let mut events = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: LogEvent =
            serde_json::from_str(line).map_err(|e| EventSourceError::Parse {
                line: idx + 1,
                message: e.to_string(),
            })?;
        events.push(event);
    }
    sort_events_deterministic(&mut events);
    Ok(events)
}

#[async_trait]
impl EventSource for JsonlEventSource {
    async fn fetch_events(
        &self,
        after: Option<EventCursor>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, EventSourceError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            // Nothing delivered yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let events: Vec<LogEvent> = parse_events(&contents)?
            .into_iter()
            .filter(|e| after.map_or(true, |c| EventCursor::from_event(e) > c))
            .take(limit)
            .collect();

        debug!(path = %self.path.display(), count = events.len(), "Fetched events");
        Ok(events)
    }
}

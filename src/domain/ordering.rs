//! Chain ordering of logs.

use crate::domain::LogEvent;
use serde::{Deserialize, Serialize};

/// Position of a log in chain order.
///
/// Ordering: block_number -> log_index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCursor {
    pub block_number: u64,
    pub log_index: u64,
}

impl EventCursor {
    pub fn new(block_number: u64, log_index: u64) -> Self {
        EventCursor {
            block_number,
            log_index,
        }
    }

    pub fn from_event(event: &LogEvent) -> Self {
        EventCursor {
            block_number: event.meta.block_number,
            log_index: event.meta.log_index,
        }
    }
}

/// Sort logs into chain order.
pub fn sort_events_deterministic(events: &mut [LogEvent]) {
    events.sort_by_key(EventCursor::from_event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Address, EventMeta, LogEvent, ProtocolEvent, RequestExecutorChange, Timestamp,
    };

    fn make_event(block_number: u64, log_index: u64) -> LogEvent {
        LogEvent {
            meta: EventMeta {
                tx_hash: format!("0x{:x}", block_number),
                log_index,
                block_number,
                timestamp: Timestamp::new(block_number as i64 * 12),
                address: Address::zero(),
                from: Address::zero(),
            },
            event: ProtocolEvent::RequestExecutorAdded(RequestExecutorChange {
                account: Address::zero(),
            }),
        }
    }

    #[test]
    fn test_cursor_orders_by_block_then_log() {
        assert!(EventCursor::new(1, 9) < EventCursor::new(2, 0));
        assert!(EventCursor::new(2, 0) < EventCursor::new(2, 1));
    }

    #[test]
    fn test_sort_events_deterministic() {
        let mut events = vec![make_event(2, 0), make_event(1, 5), make_event(1, 2)];
        sort_events_deterministic(&mut events);

        let order: Vec<EventCursor> = events.iter().map(EventCursor::from_event).collect();
        assert_eq!(
            order,
            vec![
                EventCursor::new(1, 2),
                EventCursor::new(1, 5),
                EventCursor::new(2, 0)
            ]
        );
    }
}

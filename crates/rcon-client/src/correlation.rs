use std::collections::HashMap;

use rcon_core::RequestId;
use tokio::sync::oneshot;

use crate::RconError;

/// Single-use completion handle for one outstanding command.
pub type ReplyTx = oneshot::Sender<Result<String, RconError>>;

/// Hands out request identifiers, post-increment from [`RequestId::FIRST`].
#[derive(Debug)]
pub struct IdAllocator {
    next: i64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next: RequestId::FIRST.0,
        }
    }
}

impl IdAllocator {
    /// Returns the next identifier. Saturates at `i64::MAX`.
    pub fn next_id(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Outstanding requests keyed by identifier.
///
/// Every entry is removed exactly once, either by [`resolve`](Self::resolve)
/// or by [`expire`](Self::expire).
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: HashMap<RequestId, ReplyTx>,
}

impl CorrelationTable {
    /// Registers a pending request. Reserved identifiers are refused and the
    /// handle is failed immediately.
    pub fn register(&mut self, id: RequestId, reply: ReplyTx) {
        if id.is_reserved() {
            let _ = reply.send(Err(RconError::ReservedIdentifier(id)));
            return;
        }
        if self.pending.insert(id, reply).is_some() {
            tracing::warn!(id = %id, "replaced an outstanding request with the same identifier");
        }
    }

    /// Delivers a reply payload. Returns false when nothing was waiting.
    pub fn resolve(&mut self, id: RequestId, message: String) -> bool {
        match self.pending.remove(&id) {
            Some(reply) => {
                let _ = reply.send(Ok(message));
                true
            }
            None => false,
        }
    }

    /// Fails a request whose reply window has closed. Returns false when the
    /// request was already resolved.
    pub fn expire(&mut self, id: RequestId, err: RconError) -> bool {
        match self.pending.remove(&id) {
            Some(reply) => {
                let _ = reply.send(Err(err));
                true
            }
            None => false,
        }
    }

    /// Whether a request with this identifier is still waiting.
    pub fn contains(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no request is outstanding.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rcon_core::RequestId;
    use tokio::sync::oneshot;

    use super::{CorrelationTable, IdAllocator};
    use crate::RconError;

    #[test]
    fn allocator_starts_at_one_and_increases() {
        let mut ids = IdAllocator::default();
        let drawn: Vec<_> = (0..5).map(|_| ids.next_id()).collect();

        assert_eq!(drawn.first(), Some(&RequestId::FIRST));
        assert!(drawn.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(drawn.iter().all(|id| !id.is_reserved()));
    }

    #[test]
    fn reply_resolves_once_and_late_timeout_is_ignored() {
        let mut table = CorrelationTable::default();
        let (tx, mut rx) = oneshot::channel();
        table.register(RequestId(1), tx);

        assert!(table.resolve(RequestId(1), "ok".to_string()));
        assert!(!table.expire(
            RequestId(1),
            RconError::Timeout {
                id: RequestId(1),
                after_ms: 1_000
            }
        ));
        assert_eq!(rx.try_recv().expect("reply delivered"), Ok("ok".to_string()));
        assert!(table.is_empty());
    }

    #[test]
    fn timeout_wins_and_late_reply_is_dropped() {
        let mut table = CorrelationTable::default();
        let (tx, mut rx) = oneshot::channel();
        table.register(RequestId(2), tx);

        let timeout = RconError::Timeout {
            id: RequestId(2),
            after_ms: 1_000,
        };
        assert!(table.expire(RequestId(2), timeout.clone()));
        assert!(!table.resolve(RequestId(2), "late".to_string()));
        assert_eq!(rx.try_recv().expect("timeout delivered"), Err(timeout));
    }

    #[test]
    fn reserved_identifiers_are_never_registered() {
        let mut table = CorrelationTable::default();
        for id in [RequestId::GENERIC, RequestId::BROADCAST] {
            let (tx, mut rx) = oneshot::channel();
            table.register(id, tx);
            assert!(!table.contains(id));
            assert_eq!(
                rx.try_recv().expect("handle failed"),
                Err(RconError::ReservedIdentifier(id))
            );
        }
        assert_eq!(table.len(), 0);
    }
}

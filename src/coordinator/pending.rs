use std::collections::HashMap;

use crate::models::{ContextId, PendingSummary};

/// Latest unsaved summary per context. At most one entry per context.
#[derive(Debug, Default)]
pub struct PendingStore {
    entries: HashMap<ContextId, PendingSummary>,
}

impl PendingStore {
    /// Store `pending`, replacing whatever its context held before.
    pub fn put(&mut self, pending: PendingSummary) -> Option<PendingSummary> {
        self.entries.insert(pending.context, pending)
    }

    pub fn get(&self, context: ContextId) -> Option<&PendingSummary> {
        self.entries.get(&context)
    }

    pub fn take(&mut self, context: ContextId) -> Option<PendingSummary> {
        self.entries.remove(&context)
    }

    pub fn discard(&mut self, context: ContextId) {
        if self.entries.remove(&context).is_some() {
            tracing::debug!("Discarded pending summary for {}", context);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Per-account revision counter for the task list.
///
/// Cached views of a list (HTTP validators, rendered pages) are keyed by the
/// revision; invalidating bumps it so every cached copy goes stale. Counters live
/// in memory, so entity tags also carry a per-process epoch and a restart
/// invalidates everything.
#[derive(Debug)]
pub struct ListRevisions {
    epoch: String,
    revisions: RwLock<HashMap<String, u64>>,
}

impl Default for ListRevisions {
    fn default() -> Self {
        Self::new()
    }
}

impl ListRevisions {
    pub fn new() -> Self {
        let mut epoch = uuid::Uuid::new_v4().simple().to_string();
        epoch.truncate(8);
        Self {
            epoch,
            revisions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn current(&self, owner_id: &str) -> u64 {
        self.revisions
            .read()
            .await
            .get(owner_id)
            .copied()
            .unwrap_or(0)
    }

    /// Mark every cached view of `owner_id`'s list as stale. Returns the new revision.
    pub async fn invalidate(&self, owner_id: &str) -> u64 {
        let mut revisions = self.revisions.write().await;
        let revision = revisions.entry(owner_id.to_string()).or_insert(0);
        *revision += 1;
        tracing::trace!(user_id = owner_id, revision = *revision, "Task list invalidated");
        *revision
    }

    /// Weak entity tag for the current revision of `owner_id`'s list.
    pub async fn etag(&self, owner_id: &str) -> String {
        format!(
            "W/\"tasks-{}-{}-{}\"",
            self.epoch,
            owner_id,
            self.current(owner_id).await
        )
    }
}

//! Activity log sink.
//!
//! Mutation handlers append an activity entry after they succeed. The append
//! is detached: it runs on its own task, its failure is logged and dropped,
//! and the handler's response never waits for it.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    UserRegistered,
    PasswordChanged,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRegistered => write!(f, "user_registered"),
            Self::PasswordChanged => write!(f, "password_changed"),
        }
    }
}

/// One activity log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub kind: ActivityKind,
    pub user_id: String,
    /// Milliseconds since Unix epoch.
    pub at_ms: u64,
}

/// Error returned by an activity sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityError(pub String);

impl std::fmt::Display for ActivityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "activity append failed: {}", self.0)
    }
}

impl std::error::Error for ActivityError {}

/// Destination for activity entries.
pub trait ActivitySink: Send + Sync {
    fn append(&self, activity: Activity) -> BoxFuture<'static, Result<(), ActivityError>>;
}

/// Writes activities to the log and nowhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivitySink;

impl ActivitySink for TracingActivitySink {
    fn append(&self, activity: Activity) -> BoxFuture<'static, Result<(), ActivityError>> {
        async move {
            tracing::info!(
                kind = %activity.kind,
                user_id = %activity.user_id,
                at_ms = activity.at_ms,
                "activity"
            );
            Ok(())
        }
        .boxed()
    }
}

/// Keeps activities in memory, or fails every append when built with
/// [`MemoryActivitySink::failing`].
#[derive(Debug, Clone, Default)]
pub struct MemoryActivitySink {
    entries: Arc<Mutex<Vec<Activity>>>,
    fail: bool,
}

impl MemoryActivitySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            entries: Arc::default(),
            fail: true,
        }
    }

    /// Snapshot of the recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<Activity> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl ActivitySink for MemoryActivitySink {
    fn append(&self, activity: Activity) -> BoxFuture<'static, Result<(), ActivityError>> {
        let entries = Arc::clone(&self.entries);
        let fail = self.fail;
        async move {
            if fail {
                return Err(ActivityError("sink rejected entry".to_string()));
            }
            entries
                .lock()
                .map_err(|_| ActivityError("lock poisoned".to_string()))?
                .push(activity);
            Ok(())
        }
        .boxed()
    }
}

/// Append an activity on a detached task. Errors are logged and discarded.
///
/// Must be called from within a tokio runtime.
pub fn record_detached(sink: &Arc<dyn ActivitySink>, activity: Activity) {
    let append = sink.append(activity);
    tokio::spawn(async move {
        if let Err(e) = append.await {
            tracing::debug!("ignoring activity sink failure: {e}");
        }
    });
}

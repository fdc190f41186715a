/// Session-scoped view dedup guard
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use story_core::{StoryError, StoryId, UserId, ViewBackend, ViewInsert};
use tracing::{debug, warn};

type ViewKey = (UserId, StoryId);

/// Result of a `record_view` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// The backend created a new record
    Recorded,
    /// The backend already held a record (another path or device won)
    AlreadyRecorded,
    /// Confirmed earlier in this session; no backend call was made
    Skipped,
    /// Another call for the same pair is awaiting the backend
    InFlight,
    /// Transient backend failure; a later activation may retry
    Failed,
}

impl ViewOutcome {
    /// Whether the view is known to be durably recorded
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Recorded | Self::AlreadyRecorded | Self::Skipped)
    }
}

#[derive(Default)]
struct GuardState {
    recorded: HashSet<ViewKey>,
    pending: HashSet<ViewKey>,
}

/// Records views at most once per (viewer, story)
///
/// A pair enters the recorded set only after the backend confirms it
/// (`Inserted` or `AlreadyExists`). Failures leave it unset so the next
/// activation tries again.
#[derive(Clone)]
pub struct ViewGuard {
    backend: Arc<dyn ViewBackend>,
    state: Arc<Mutex<GuardState>>,
}

/// Clears the pending mark when the submitting call ends, including when its
/// future is dropped mid-await
struct PendingMark<'a> {
    guard: &'a ViewGuard,
    key: Option<ViewKey>,
}

impl PendingMark<'_> {
    /// Move the pair from pending to recorded
    fn confirm(mut self) {
        if let Some(key) = self.key.take() {
            let mut state = self.guard.state();
            state.pending.remove(&key);
            state.recorded.insert(key);
        }
    }
}

impl Drop for PendingMark<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.guard.state().pending.remove(&key);
        }
    }
}

impl ViewGuard {
    pub fn new(backend: Arc<dyn ViewBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(GuardState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that `viewer` saw `story`
    ///
    /// Never returns an error: conflicts are success, transient failures are
    /// logged and reported as `ViewOutcome::Failed`.
    pub async fn record_view(&self, viewer: &UserId, story: &StoryId) -> ViewOutcome {
        let key = (viewer.clone(), story.clone());

        {
            let mut state = self.state();
            if state.recorded.contains(&key) {
                debug!(viewer = %viewer, story_id = %story, "View already confirmed this session");
                return ViewOutcome::Skipped;
            }
            if !state.pending.insert(key.clone()) {
                debug!(viewer = %viewer, story_id = %story, "View submission already in flight");
                return ViewOutcome::InFlight;
            }
        }

        let mark = PendingMark {
            guard: self,
            key: Some(key),
        };

        match self.backend.insert_view(viewer, story).await {
            Ok(ViewInsert::Inserted) => {
                mark.confirm();
                debug!(viewer = %viewer, story_id = %story, "View recorded");
                ViewOutcome::Recorded
            }
            Ok(ViewInsert::AlreadyExists) | Err(StoryError::ViewRecordConflict) => {
                mark.confirm();
                debug!(viewer = %viewer, story_id = %story, "View recorded elsewhere");
                ViewOutcome::AlreadyRecorded
            }
            Err(e) => {
                drop(mark);
                warn!(viewer = %viewer, story_id = %story, error = %e, "Failed to record view");
                ViewOutcome::Failed
            }
        }
    }

    /// Whether this session has a confirmed view for the pair
    pub fn is_recorded(&self, viewer: &UserId, story: &StoryId) -> bool {
        self.state()
            .recorded
            .contains(&(viewer.clone(), story.clone()))
    }

    /// Number of pairs confirmed this session
    pub fn recorded_count(&self) -> usize {
        self.state().recorded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        calls: AtomicUsize,
        responses: Mutex<Vec<story_core::Result<ViewInsert>>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<story_core::Result<ViewInsert>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl ViewBackend for ScriptedBackend {
        async fn insert_view(
            &self,
            _viewer: &UserId,
            _story: &StoryId,
        ) -> story_core::Result<ViewInsert> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn ids() -> (UserId, StoryId) {
        (UserId::new("u1"), StoryId::new("s7"))
    }

    #[tokio::test]
    async fn second_call_is_skipped_after_success() {
        let backend = ScriptedBackend::new(vec![Ok(ViewInsert::Inserted)]);
        let guard = ViewGuard::new(backend.clone());
        let (viewer, story) = ids();

        assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Recorded);
        assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Skipped);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(guard.is_recorded(&viewer, &story));
    }

    #[tokio::test]
    async fn conflict_error_counts_as_recorded() {
        let backend = ScriptedBackend::new(vec![Err(StoryError::ViewRecordConflict)]);
        let guard = ViewGuard::new(backend);
        let (viewer, story) = ids();

        let outcome = guard.record_view(&viewer, &story).await;
        assert_eq!(outcome, ViewOutcome::AlreadyRecorded);
        assert!(outcome.is_confirmed());
        assert!(guard.is_recorded(&viewer, &story));
    }

    #[tokio::test]
    async fn failure_leaves_pair_unset_for_retry() {
        let backend = ScriptedBackend::new(vec![
            Err(StoryError::view_record("timeout")),
            Ok(ViewInsert::Inserted),
        ]);
        let guard = ViewGuard::new(backend.clone());
        let (viewer, story) = ids();

        assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Failed);
        assert!(!guard.is_recorded(&viewer, &story));

        assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Recorded);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pairs_are_keyed_by_viewer_and_story() {
        let backend = ScriptedBackend::new(vec![
            Ok(ViewInsert::Inserted),
            Ok(ViewInsert::Inserted),
            Ok(ViewInsert::Inserted),
        ]);
        let guard = ViewGuard::new(backend.clone());

        guard.record_view(&UserId::new("u1"), &StoryId::new("s1")).await;
        guard.record_view(&UserId::new("u2"), &StoryId::new("s1")).await;
        guard.record_view(&UserId::new("u1"), &StoryId::new("s2")).await;

        assert_eq!(guard.recorded_count(), 3);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }
}

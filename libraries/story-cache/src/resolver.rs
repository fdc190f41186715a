/// Cache resolver - tiered media resolution with per-id in-flight dedup
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use story_core::{
    CacheEntry, CacheStatus, LocalCacheStore, MediaFetcher, SigningService, Story, StoryId,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Where a resolved URI came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOrigin {
    /// Existing local file
    Cache,
    /// Downloaded and written during this resolution
    Downloaded,
    /// Unlocalized signed URL (download or cache write failed)
    SignedUrl,
    /// Raw object-store reference (signing failed)
    RemoteRef,
}

/// Playable URI for a story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub story_id: StoryId,
    pub uri: String,
    pub origin: MediaOrigin,
}

impl ResolvedMedia {
    fn local(story_id: StoryId, path: &Path, origin: MediaOrigin) -> Self {
        Self {
            story_id,
            uri: path.to_string_lossy().into_owned(),
            origin,
        }
    }

    fn remote(story_id: StoryId, url: String, origin: MediaOrigin) -> Self {
        Self {
            story_id,
            uri: url,
            origin,
        }
    }

    /// Whether the URI points at a local cache file
    pub fn is_local(&self) -> bool {
        matches!(self.origin, MediaOrigin::Cache | MediaOrigin::Downloaded)
    }
}

type SharedResolution = Shared<BoxFuture<'static, ResolvedMedia>>;

#[derive(Default)]
struct ResolverState {
    entries: HashMap<StoryId, CacheEntry>,
    in_flight: HashMap<StoryId, SharedResolution>,
}

struct ResolverInner {
    signer: Arc<dyn SigningService>,
    fetcher: Arc<dyn MediaFetcher>,
    store: Arc<dyn LocalCacheStore>,
    // Entries and the in-flight registry share one lock so "is it ready?"
    // and "is it in flight?" are answered atomically.
    state: Mutex<ResolverState>,
}

/// Resolves stories to playable URIs
///
/// Cheap to clone; clones share the same cache entries and in-flight
/// registry. Owned by a viewer session rather than the process.
///
/// Resolution work runs on a spawned tokio task, so it completes (and
/// populates the cache) even if every caller stops waiting.
#[derive(Clone)]
pub struct CacheResolver {
    inner: Arc<ResolverInner>,
}

impl CacheResolver {
    pub fn new(
        signer: Arc<dyn SigningService>,
        fetcher: Arc<dyn MediaFetcher>,
        store: Arc<dyn LocalCacheStore>,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                signer,
                fetcher,
                store,
                state: Mutex::new(ResolverState::default()),
            }),
        }
    }

    /// Resolve a story to a playable URI
    ///
    /// Never fails: degrades to the signed URL, then the raw reference.
    /// Callers arriving while a resolution for the same id is in flight
    /// await that resolution instead of starting another.
    pub async fn resolve(&self, story: &Story) -> ResolvedMedia {
        let resolution = {
            let mut state = self.inner.state.lock().await;

            if let Some(entry) = state.entries.get(&story.id) {
                if let (CacheStatus::Ready, Some(path)) = (entry.status, &entry.local_path) {
                    debug!(story_id = %story.id, "Cache hit");
                    return ResolvedMedia::local(story.id.clone(), path, MediaOrigin::Cache);
                }
            }

            if let Some(existing) = state.in_flight.get(&story.id) {
                debug!(story_id = %story.id, "Joining in-flight resolution");
                existing.clone()
            } else {
                let resolution = self.start(story);
                state
                    .entries
                    .entry(story.id.clone())
                    .and_modify(|entry| {
                        entry.status = CacheStatus::Pending;
                        entry.updated_at = Utc::now();
                    })
                    .or_insert_with(|| CacheEntry::pending(story.id.clone()));
                state
                    .in_flight
                    .insert(story.id.clone(), resolution.clone());
                resolution
            }
        };

        resolution.await
    }

    /// Local path for a story if its entry is `Ready`
    pub async fn ready_path(&self, id: &StoryId) -> Option<PathBuf> {
        let state = self.inner.state.lock().await;
        state
            .entries
            .get(id)
            .filter(|entry| entry.is_ready())
            .and_then(|entry| entry.local_path.clone())
    }

    /// Snapshot of a story's cache entry
    pub async fn entry(&self, id: &StoryId) -> Option<CacheEntry> {
        self.inner.state.lock().await.entries.get(id).cloned()
    }

    /// Whether a resolution for the story is currently in flight
    pub async fn is_in_flight(&self, id: &StoryId) -> bool {
        self.inner.state.lock().await.in_flight.contains_key(id)
    }

    /// Number of stories with a `Ready` entry
    pub async fn ready_count(&self) -> usize {
        let state = self.inner.state.lock().await;
        state.entries.values().filter(|e| e.is_ready()).count()
    }

    /// Spawn the cold-path resolution and wrap it as a shareable future
    fn start(&self, story: &Story) -> SharedResolution {
        let inner = Arc::clone(&self.inner);
        let owned = story.clone();
        let handle = tokio::spawn(async move { inner.resolve_cold(&owned).await });

        let inner = Arc::clone(&self.inner);
        let story_id = story.id.clone();
        let remote_ref = story.remote_ref.clone();

        async move {
            match handle.await {
                Ok(media) => media,
                Err(e) => {
                    error!(story_id = %story_id, error = %e, "Resolution task aborted");
                    inner
                        .finish(
                            &story_id,
                            CacheStatus::Failed,
                            None,
                            Some(remote_ref.clone()),
                        )
                        .await;
                    ResolvedMedia::remote(story_id, remote_ref, MediaOrigin::RemoteRef)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl ResolverInner {
    async fn resolve_cold(&self, story: &Story) -> ResolvedMedia {
        let id = story.id.clone();
        let extension = story.cache_extension();

        // File left behind by an earlier session
        if self.store.exists(&id, &extension).await {
            let path = self.store.path_for(&id, &extension);
            debug!(story_id = %id, path = %path.display(), "Reusing persisted cache file");
            self.finish(&id, CacheStatus::Ready, Some(path.clone()), None)
                .await;
            return ResolvedMedia::local(id, &path, MediaOrigin::Cache);
        }

        let signed = match self.signer.sign(&story.remote_ref).await {
            Ok(signed) => signed,
            Err(e) => {
                warn!(story_id = %id, error = %e, "Signing failed, using raw remote reference");
                self.finish(
                    &id,
                    CacheStatus::Failed,
                    None,
                    Some(story.remote_ref.clone()),
                )
                .await;
                return ResolvedMedia::remote(id, story.remote_ref.clone(), MediaOrigin::RemoteRef);
            }
        };

        self.mark(&id, CacheStatus::Downloading).await;

        let bytes = match self.fetcher.fetch(&signed.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(story_id = %id, error = %e, "Download failed, streaming signed URL");
                self.finish(&id, CacheStatus::Failed, None, Some(signed.url.clone()))
                    .await;
                return ResolvedMedia::remote(id, signed.url, MediaOrigin::SignedUrl);
            }
        };

        match self.store.write(&id, &extension, &bytes).await {
            Ok(path) => {
                info!(story_id = %id, size = bytes.len(), "Story media localized");
                self.finish(&id, CacheStatus::Ready, Some(path.clone()), None)
                    .await;
                ResolvedMedia::local(id, &path, MediaOrigin::Downloaded)
            }
            Err(e) => {
                warn!(story_id = %id, error = %e, "Cache write failed, streaming signed URL");
                self.finish(&id, CacheStatus::Failed, None, Some(signed.url.clone()))
                    .await;
                ResolvedMedia::remote(id, signed.url, MediaOrigin::SignedUrl)
            }
        }
    }

    async fn mark(&self, id: &StoryId, status: CacheStatus) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get_mut(id) {
            if entry.status != CacheStatus::Ready {
                entry.status = status;
                entry.updated_at = Utc::now();
            }
        }
    }

    /// Record the final status and leave the in-flight registry in one step
    async fn finish(
        &self,
        id: &StoryId,
        status: CacheStatus,
        local_path: Option<PathBuf>,
        fallback_url: Option<String>,
    ) {
        let mut state = self.state.lock().await;
        let entry = state
            .entries
            .entry(id.clone())
            .or_insert_with(|| CacheEntry::pending(id.clone()));

        // Ready is terminal
        if entry.status != CacheStatus::Ready {
            entry.status = status;
            entry.local_path = local_path;
            entry.resolved_fallback_url = fallback_url;
            entry.updated_at = Utc::now();
        }

        state.in_flight.remove(id);
    }
}

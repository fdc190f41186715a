/// Bounded background prefetch
use crate::resolver::{CacheResolver, ResolvedMedia};
use futures_util::future::join_all;
use story_core::config::CacheSettings;
use story_core::{Story, StoryFeed};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

/// Leading slice of the feed warmed after it loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchWindow {
    pub groups: usize,
    pub stories_per_group: usize,
    pub concurrency: usize,
}

impl Default for PrefetchWindow {
    fn default() -> Self {
        Self {
            groups: 3,
            stories_per_group: 2,
            concurrency: 3,
        }
    }
}

impl From<&CacheSettings> for PrefetchWindow {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            groups: settings.prefetch_groups,
            stories_per_group: settings.prefetch_stories_per_group,
            concurrency: settings.prefetch_concurrency,
        }
    }
}

/// Outcome of a prefetch batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub requested: usize,
    /// Stories now backed by a local file
    pub localized: usize,
    /// Stories that fell back to a remote URI
    pub degraded: usize,
}

impl PrefetchReport {
    fn from_results(results: &[ResolvedMedia]) -> Self {
        let localized = results.iter().filter(|m| m.is_local()).count();
        Self {
            requested: results.len(),
            localized,
            degraded: results.len() - localized,
        }
    }
}

impl CacheResolver {
    /// Resolve a batch of stories with at most `concurrency` in progress
    ///
    /// Settles every story: a degraded resolution never cancels the rest.
    pub async fn prefetch(&self, stories: Vec<Story>, concurrency: usize) -> PrefetchReport {
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));

        let resolutions = stories.into_iter().map(|story| {
            let permits = Arc::clone(&permits);
            let resolver = self.clone();
            async move {
                let _permit = permits.acquire_owned().await.ok();
                resolver.resolve(&story).await
            }
        });

        let results = join_all(resolutions).await;
        PrefetchReport::from_results(&results)
    }

    /// Prefetch the leading window of a feed
    pub async fn prefetch_feed(&self, feed: &StoryFeed, window: PrefetchWindow) -> PrefetchReport {
        let stories: Vec<Story> = feed
            .leading_window(window.groups, window.stories_per_group)
            .into_iter()
            .cloned()
            .collect();

        let report = self.prefetch(stories, window.concurrency).await;
        info!(
            requested = report.requested,
            localized = report.localized,
            degraded = report.degraded,
            "Prefetch window settled"
        );
        report
    }
}

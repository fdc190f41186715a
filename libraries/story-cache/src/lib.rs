//! Story Cache - media resolution for the story viewer
//!
//! Resolves a story's remote reference to a locally playable URI. Resolution
//! walks three tiers and never fails outright:
//!
//! 1. **Cache hit**: a `Ready` entry (or a file left by an earlier session)
//! 2. **Cold path**: sign the reference, download, write to the cache directory
//! 3. **Fallback**: hand out the signed URL, or the raw reference if signing failed
//!
//! Concurrent requests for the same story id share one underlying resolution,
//! whether they come from background prefetch or on-demand display.
//!
//! # Example
//!
//! ```no_run
//! use story_cache::{CacheResolver, FsCacheStore, PrefetchWindow};
//! use story_core::{MediaFetcher, SigningService, Story, StoryFeed};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     signer: Arc<dyn SigningService>,
//! #     fetcher: Arc<dyn MediaFetcher>,
//! #     feed: StoryFeed,
//! #     story: Story,
//! # ) {
//! let store = Arc::new(FsCacheStore::new("./cache/stories"));
//! let resolver = CacheResolver::new(signer, fetcher, store);
//!
//! // Warm the leading window in the background
//! let report = resolver.prefetch_feed(&feed, PrefetchWindow::default()).await;
//! println!("{} of {} localized", report.localized, report.requested);
//!
//! // Always yields something playable
//! let media = resolver.resolve(&story).await;
//! println!("play {}", media.uri);
//! # }
//! ```

mod fs_store;
mod prefetch;
mod resolver;

pub use fs_store::FsCacheStore;
pub use prefetch::{PrefetchReport, PrefetchWindow};
pub use resolver::{CacheResolver, MediaOrigin, ResolvedMedia};

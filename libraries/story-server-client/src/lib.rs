//! Story Viewer Server Client
//!
//! HTTP implementations of the engine's remote collaborators.
//!
//! # Features
//!
//! - **Signing**: time-limited URLs for object-store media references
//! - **Download**: streamed media fetches from signed URLs
//! - **Views**: inserts into the `story_views` table, with conflicts reported
//!   as already recorded
//!
//! Every failure converts into the matching `StoryError` at the trait
//! boundary, so the cache resolver and view guard can degrade gracefully.

mod client;
mod download;
mod error;
mod signing;
mod types;
mod views;

pub use client::StoryServerClient;
pub use download::HttpMediaFetcher;
pub use error::{Result, ServerClientError};
pub use signing::HttpSigningService;
pub use types::{ServerConfig, SignRequest, SignResponse, ViewRow};
pub use views::HttpViewBackend;

//! Viewer session - the navigator driven by a tokio task
//!
//! The session task owns the `StoryNavigator` and is the only place it is
//! mutated. Commands from the presentation layer arrive over a channel;
//! media resolution and view recording run as spawned tasks that send their
//! results back into the session loop. A `CancellationToken` is the liveness
//! flag: once cancelled, the loop exits and no late result is applied.

use crate::{
    error::{NavigationError, Result},
    events::StoryEvent,
    navigator::StoryNavigator,
    types::{DriverBinding, NavigatorConfig, ViewerSnapshot},
};
use std::time::Duration;
use story_cache::{CacheResolver, PrefetchWindow, ResolvedMedia};
use story_core::{
    EngineConfig, MediaPlayer, NavigationCursor, PlaybackStatus, Story, StoryFeed, StoryId, UserId,
};
use story_views::{ViewGuard, ViewOutcome};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Command channel depth
const COMMAND_BUFFER: usize = 64;

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub navigator: NavigatorConfig,
    /// Cadence of the image clock and dwell timer
    pub tick_interval: Duration,
    /// Leading window warmed when the session starts
    pub prefetch_window: PrefetchWindow,
    /// Upcoming stories resolved in the background after each activation
    pub prefetch_ahead: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            navigator: NavigatorConfig::default(),
            tick_interval: Duration::from_millis(50),
            prefetch_window: PrefetchWindow::default(),
            prefetch_ahead: 2,
        }
    }
}

impl From<&EngineConfig> for SessionConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            navigator: NavigatorConfig::from(config),
            tick_interval: config.playback.tick_interval(),
            prefetch_window: PrefetchWindow::from(&config.cache),
            prefetch_ahead: config.cache.prefetch_ahead,
        }
    }
}

/// Navigation requests answered with `Result<bool>`
#[derive(Debug, Clone, Copy)]
enum Navigation {
    Advance,
    Retreat,
    Pause,
    Resume,
    JumpToGroup(usize),
    Retry,
}

enum Command {
    Navigate(Navigation, oneshot::Sender<Result<bool>>),
    PlaybackStatus {
        binding: DriverBinding,
        status: PlaybackStatus,
    },
    MediaError {
        binding: DriverBinding,
        message: String,
    },
    SetMuted(bool),
    SetLooping(bool),
    Snapshot(oneshot::Sender<ViewerSnapshot>),
}

/// Results of spawned work, delivered back into the session loop
enum Background {
    Resolved {
        binding: DriverBinding,
        media: ResolvedMedia,
    },
    ViewRecorded {
        story_id: StoryId,
        outcome: ViewOutcome,
    },
}

/// A viewer session ready to be spawned
pub struct ViewerSession {
    navigator: StoryNavigator,
    feed: StoryFeed,
    viewer: UserId,
    resolver: CacheResolver,
    views: ViewGuard,
    config: SessionConfig,
}

impl ViewerSession {
    pub fn new(
        feed: StoryFeed,
        viewer: UserId,
        resolver: CacheResolver,
        views: ViewGuard,
        config: SessionConfig,
    ) -> Self {
        let navigator = StoryNavigator::new(feed.clone(), config.navigator.clone());
        Self {
            navigator,
            feed,
            viewer,
            resolver,
            views,
            config,
        }
    }

    /// Attach the device media player used for video stories
    pub fn with_player(mut self, player: Box<dyn MediaPlayer>) -> Self {
        self.navigator.set_player(player);
        self
    }

    /// Start the session task
    ///
    /// Returns the command handle and the event stream. The stream ends when
    /// the session closes.
    pub fn spawn(self) -> (SessionHandle, mpsc::UnboundedReceiver<StoryEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let actor = SessionActor {
            navigator: self.navigator,
            feed: self.feed,
            viewer: self.viewer,
            resolver: self.resolver,
            views: self.views,
            config: self.config,
            commands: command_rx,
            events: event_tx,
            background_tx,
            background_rx,
            token: token.clone(),
        };
        tokio::spawn(actor.run());

        let handle = SessionHandle {
            commands: command_tx,
            token,
        };
        (handle, event_rx)
    }
}

/// Handle for driving a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    token: CancellationToken,
}

impl SessionHandle {
    pub async fn advance(&self) -> Result<bool> {
        self.navigate(Navigation::Advance).await
    }

    pub async fn retreat(&self) -> Result<bool> {
        self.navigate(Navigation::Retreat).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.navigate(Navigation::Pause).await.map(|_| ())
    }

    pub async fn resume(&self) -> Result<()> {
        self.navigate(Navigation::Resume).await.map(|_| ())
    }

    pub async fn jump_to_group(&self, index: usize) -> Result<()> {
        self.navigate(Navigation::JumpToGroup(index))
            .await
            .map(|_| ())
    }

    /// Re-resolve the current story after a playback failure
    pub async fn retry(&self) -> Result<bool> {
        self.navigate(Navigation::Retry).await
    }

    /// Forward a media player status report
    pub async fn playback_status(&self, binding: DriverBinding, status: PlaybackStatus) -> Result<()> {
        self.send(Command::PlaybackStatus { binding, status }).await
    }

    /// Report that the media for `binding` could not be decoded
    pub async fn report_media_error(&self, binding: DriverBinding, message: impl Into<String>) -> Result<()> {
        self.send(Command::MediaError {
            binding,
            message: message.into(),
        })
        .await
    }

    pub async fn set_muted(&self, muted: bool) -> Result<()> {
        self.send(Command::SetMuted(muted)).await
    }

    pub async fn set_looping(&self, looping: bool) -> Result<()> {
        self.send(Command::SetLooping(looping)).await
    }

    pub async fn snapshot(&self) -> Result<ViewerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        response.await.map_err(|_| NavigationError::SessionClosed)
    }

    /// Dismiss the viewer
    ///
    /// Cancels the session loop and every spawned continuation.
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    async fn navigate(&self, navigation: Navigation) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Navigate(navigation, reply)).await?;
        response.await.map_err(|_| NavigationError::SessionClosed)?
    }

    async fn send(&self, command: Command) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(NavigationError::SessionClosed);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| NavigationError::SessionClosed)
    }
}

struct SessionActor {
    navigator: StoryNavigator,
    feed: StoryFeed,
    viewer: UserId,
    resolver: CacheResolver,
    views: ViewGuard,
    config: SessionConfig,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<StoryEvent>,
    background_tx: mpsc::UnboundedSender<Background>,
    background_rx: mpsc::UnboundedReceiver<Background>,
    token: CancellationToken,
}

impl SessionActor {
    async fn run(mut self) {
        info!(
            viewer = %self.viewer,
            groups = self.feed.group_count(),
            stories = self.feed.total_stories(),
            "Viewer session started"
        );

        self.prefetch_window();
        self.dispatch_events();

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(result) = self.background_rx.recv() => self.handle_background(result),
                now = ticker.tick() => {
                    self.navigator.tick(now.saturating_duration_since(last_tick));
                    last_tick = now;
                }
            }
            self.dispatch_events();
        }

        self.token.cancel();
        self.navigator.close();
        info!(viewer = %self.viewer, "Viewer session closed");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Navigate(navigation, reply) => {
                let result = match navigation {
                    Navigation::Advance => self.navigator.advance(),
                    Navigation::Retreat => self.navigator.retreat(),
                    Navigation::Pause => self.navigator.pause().map(|()| true),
                    Navigation::Resume => self.navigator.resume().map(|()| true),
                    Navigation::JumpToGroup(index) => {
                        self.navigator.jump_to_group(index).map(|()| true)
                    }
                    Navigation::Retry => self.navigator.retry(),
                };
                let _ = reply.send(result);
            }
            Command::PlaybackStatus { binding, status } => {
                self.navigator.on_playback_status(&binding, &status);
            }
            Command::MediaError { binding, message } => {
                self.navigator.report_media_error(&binding, message);
            }
            Command::SetMuted(muted) => {
                let _ = self.navigator.set_muted(muted);
            }
            Command::SetLooping(looping) => {
                let _ = self.navigator.set_looping(looping);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.navigator.snapshot());
            }
        }
    }

    fn handle_background(&mut self, result: Background) {
        match result {
            Background::Resolved { binding, media } => {
                if !self.navigator.media_ready(&binding, media.uri) {
                    debug!(story_id = %binding.story_id, "Resolved media arrived for inactive story");
                }
            }
            Background::ViewRecorded { story_id, outcome } => {
                debug!(story_id = %story_id, ?outcome, "View submission settled");
            }
        }
    }

    /// Act on navigator events, then forward them to the presentation layer
    fn dispatch_events(&mut self) {
        for event in self.navigator.drain_events() {
            match &event {
                StoryEvent::MediaRequested { binding, story } => {
                    self.resolve_media(binding.clone(), story.clone());
                }
                StoryEvent::StoryChanged { cursor, .. } => self.prefetch_ahead(*cursor),
                StoryEvent::ViewQualified { story_id } => self.record_view(story_id.clone()),
                _ => {}
            }
            // The presentation layer may have stopped listening
            let _ = self.events.send(event);
        }
    }

    fn resolve_media(&self, binding: DriverBinding, story: Story) {
        let resolver = self.resolver.clone();
        let results = self.background_tx.clone();
        let token = self.token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                media = resolver.resolve(&story) => {
                    let _ = results.send(Background::Resolved { binding, media });
                }
            }
        });
    }

    fn record_view(&self, story_id: StoryId) {
        let views = self.views.clone();
        let viewer = self.viewer.clone();
        let results = self.background_tx.clone();
        let token = self.token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                outcome = views.record_view(&viewer, &story_id) => {
                    let _ = results.send(Background::ViewRecorded { story_id, outcome });
                }
            }
        });
    }

    fn prefetch_window(&self) {
        if self.feed.is_empty() {
            return;
        }
        let resolver = self.resolver.clone();
        let feed = self.feed.clone();
        let window = self.config.prefetch_window;
        let token = self.token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                _ = resolver.prefetch_feed(&feed, window) => {}
            }
        });
    }

    fn prefetch_ahead(&self, cursor: NavigationCursor) {
        let stories: Vec<Story> = self
            .feed
            .upcoming(cursor, self.config.prefetch_ahead)
            .into_iter()
            .cloned()
            .collect();
        if stories.is_empty() {
            return;
        }

        let resolver = self.resolver.clone();
        let concurrency = self.config.prefetch_window.concurrency;
        let token = self.token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                _ = resolver.prefetch(stories, concurrency) => {}
            }
        });
    }
}

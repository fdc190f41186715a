//! Story navigator - the navigation state machine
//!
//! Owns the cursor, the bound progress driver and the dwell timer. All
//! mutation goes through `&mut self`; asynchronous work (media resolution,
//! view recording) is requested through events and answered by calling back
//! with the binding that requested it.

use crate::{
    error::{NavigationError, Result},
    events::StoryEvent,
    progress::ProgressDriver,
    types::{DriverBinding, MediaState, NavigationState, NavigatorConfig, ViewerSnapshot},
};
use std::time::Duration;
use story_core::{MediaPlayer, NavigationCursor, PlaybackStatus, Story, StoryFeed};
use tracing::{debug, error, info, warn};

/// Navigation state machine over a story feed
pub struct StoryNavigator {
    feed: StoryFeed,
    config: NavigatorConfig,
    state: NavigationState,

    // Exactly one driver, replaced atomically with the cursor
    driver: Option<ProgressDriver>,
    generation: u64,
    media: MediaState,
    media_uri: Option<String>,

    // Dwell countdown for the active story; dropped on cursor change
    dwell_remaining: Option<Duration>,

    // Completion that arrived while paused, applied on resume
    deferred_completion: bool,
    feed_finished: bool,

    player: Option<Box<dyn MediaPlayer>>,
    muted: bool,
    looping: bool,

    alive: bool,
    pending_events: Vec<StoryEvent>,
}

impl StoryNavigator {
    /// Create a navigator positioned at the first story
    ///
    /// An empty feed starts (and stays) `Exhausted`.
    pub fn new(feed: StoryFeed, config: NavigatorConfig) -> Self {
        let mut navigator = Self {
            feed,
            config,
            state: NavigationState::Exhausted,
            driver: None,
            generation: 0,
            media: MediaState::Resolving,
            media_uri: None,
            dwell_remaining: None,
            deferred_completion: false,
            feed_finished: false,
            player: None,
            muted: false,
            looping: false,
            alive: true,
            pending_events: Vec::new(),
        };

        match navigator.feed.first_cursor() {
            Some(cursor) => navigator.activate(cursor),
            None => {
                info!("Story feed is empty");
                navigator.emit_state_changed();
            }
        }

        navigator
    }

    /// Attach the device media player used for video stories
    pub fn set_player(&mut self, mut player: Box<dyn MediaPlayer>) {
        player.set_muted(self.muted);
        self.player = Some(player);
    }

    // ===== Queries =====

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn cursor(&self) -> Option<NavigationCursor> {
        self.state.cursor()
    }

    pub fn feed(&self) -> &StoryFeed {
        &self.feed
    }

    /// Story at the cursor
    pub fn current_story(&self) -> Option<&Story> {
        self.cursor().and_then(|cursor| self.feed.story_at(cursor))
    }

    /// Binding of the active driver
    pub fn binding(&self) -> Option<&DriverBinding> {
        self.driver.as_ref().map(ProgressDriver::binding)
    }

    /// Progress of the active story, 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        self.driver.as_ref().map_or(0.0, ProgressDriver::progress)
    }

    pub fn media_state(&self) -> &MediaState {
        &self.media
    }

    pub fn media_uri(&self) -> Option<&str> {
        self.media_uri.as_deref()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_closed(&self) -> bool {
        !self.alive
    }

    /// Whether the binding belongs to the active driver
    pub fn is_current(&self, binding: &DriverBinding) -> bool {
        self.binding() == Some(binding)
    }

    /// Render state for the presentation layer
    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            state: self.state,
            story: self.current_story().cloned(),
            binding: self.binding().cloned(),
            progress: self.progress(),
            media: self.media.clone(),
            media_uri: self.media_uri.clone(),
            muted: self.muted,
            looping: self.looping,
            closed: !self.alive,
        }
    }

    // ===== Navigation =====

    /// Move to the next story, crossing into the next group when needed
    ///
    /// Returns `false` (and changes nothing) at the last story of the last
    /// group.
    pub fn advance(&mut self) -> Result<bool> {
        self.ensure_alive()?;
        let Some(cursor) = self.cursor() else {
            return Ok(false);
        };

        match self.feed.next_cursor(cursor) {
            Some(next) => {
                self.activate(next);
                Ok(true)
            }
            None => {
                debug!(cursor = %cursor, "Advance at end of feed");
                Ok(false)
            }
        }
    }

    /// Move to the previous story, crossing into the previous group's last
    /// story when needed
    ///
    /// Returns `false` (and changes nothing) at the very first story.
    pub fn retreat(&mut self) -> Result<bool> {
        self.ensure_alive()?;
        let Some(cursor) = self.cursor() else {
            return Ok(false);
        };

        match self.feed.previous_cursor(cursor) {
            Some(previous) => {
                self.activate(previous);
                Ok(true)
            }
            None => {
                debug!(cursor = %cursor, "Retreat at start of feed");
                Ok(false)
            }
        }
    }

    /// Move to the first story of group `index`
    ///
    /// # Errors
    ///
    /// `EmptyFeed` when there is nothing to show, `GroupOutOfRange` when the
    /// index is past the last group. Neither changes any state.
    pub fn jump_to_group(&mut self, index: usize) -> Result<()> {
        self.ensure_alive()?;
        if self.feed.is_empty() {
            return Err(NavigationError::EmptyFeed);
        }
        let count = self.feed.group_count();
        if index >= count {
            return Err(NavigationError::GroupOutOfRange { index, count });
        }

        self.activate(NavigationCursor::new(index, 0));
        Ok(())
    }

    /// Freeze progress without moving the cursor
    pub fn pause(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let NavigationState::Loaded(cursor) = self.state else {
            return Ok(());
        };

        self.state = NavigationState::Paused(cursor);
        if let Some(driver) = self.driver.as_mut() {
            driver.freeze();
        }
        if self.video_loaded() {
            if let Some(player) = self.player.as_mut() {
                player.pause();
            }
        }
        self.emit_state_changed();
        Ok(())
    }

    /// Continue progress from its frozen value
    pub fn resume(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let NavigationState::Paused(cursor) = self.state else {
            return Ok(());
        };

        self.state = NavigationState::Loaded(cursor);
        if let Some(driver) = self.driver.as_mut() {
            driver.thaw();
        }
        if self.video_loaded() {
            if let Some(player) = self.player.as_mut() {
                player.play();
            }
        }
        self.emit_state_changed();

        if std::mem::take(&mut self.deferred_completion) {
            self.on_driver_complete();
        }
        Ok(())
    }

    /// Re-resolve and rebind the current story after a playback failure
    ///
    /// Returns `false` when the current media has not failed.
    pub fn retry(&mut self) -> Result<bool> {
        self.ensure_alive()?;
        if !self.media.is_failed() {
            return Ok(false);
        }
        let Some(cursor) = self.cursor() else {
            return Ok(false);
        };

        info!(cursor = %cursor, "Retrying story media");
        self.bind(cursor);
        Ok(true)
    }

    pub fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.ensure_alive()?;
        self.muted = muted;
        if let Some(player) = self.player.as_mut() {
            player.set_muted(muted);
        }
        Ok(())
    }

    /// Loop videos instead of advancing when they finish
    pub fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.ensure_alive()?;
        self.looping = looping;
        if let Some(driver) = self.driver.as_mut() {
            driver.set_looping(looping);
        }
        Ok(())
    }

    /// Tear down: cancel the driver and dwell timer, release the player
    ///
    /// Every later callback is ignored and commands return `SessionClosed`.
    pub fn close(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.driver = None;
        self.dwell_remaining = None;
        self.deferred_completion = false;
        if let Some(player) = self.player.as_mut() {
            player.unload();
        }
        info!("Story viewer closed");
    }

    // ===== Callbacks =====

    /// Advance the image clock and the dwell timer by `delta`
    pub fn tick(&mut self, delta: Duration) {
        if !self.alive {
            return;
        }

        self.tick_dwell(delta);

        if !self.state.is_loaded() {
            return;
        }
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        if driver.is_video() {
            return;
        }

        let before = driver.progress();
        let completed = driver.tick(delta);
        let after = driver.progress();
        let story_id = driver.binding().story_id.clone();

        if after != before {
            self.pending_events.push(StoryEvent::ProgressChanged {
                story_id,
                progress: after,
            });
        }
        if completed {
            self.on_driver_complete();
        }
    }

    /// Media for `binding` resolved to `uri`
    ///
    /// Returns `false` when the binding is stale (the cursor moved on or the
    /// story was rebound) or the viewer is closed.
    pub fn media_ready(&mut self, binding: &DriverBinding, uri: impl Into<String>) -> bool {
        if !self.accepts(binding, "media") {
            return false;
        }

        let uri = uri.into();
        let Some(driver) = self.driver.as_mut() else {
            return false;
        };
        driver.arm();
        let is_video = driver.is_video();

        if is_video {
            if let Some(player) = self.player.as_mut() {
                player.load(&uri, self.looping);
                if self.state.is_loaded() {
                    player.play();
                }
            }
            self.media_uri = Some(uri);
            self.set_media_state(MediaState::Buffering);
        } else {
            self.media_uri = Some(uri);
            self.set_media_state(MediaState::Ready);
        }
        true
    }

    /// Status report from the media player for `binding`
    ///
    /// Returns `false` when the report was ignored as stale.
    pub fn on_playback_status(&mut self, binding: &DriverBinding, status: &PlaybackStatus) -> bool {
        if !self.accepts(binding, "playback status") {
            return false;
        }

        if let Some(message) = &status.error {
            self.fail_media(message.clone());
            return true;
        }
        if self.media.is_failed() {
            // Only a retry leaves the failed state
            return false;
        }

        let paused = self.state.is_paused();
        let Some(driver) = self.driver.as_mut() else {
            return false;
        };
        if !driver.is_video() {
            return false;
        }

        let before = driver.progress();
        let completed = driver.on_status(status);
        let after = driver.progress();
        let buffering = driver.is_buffering();
        let story_id = driver.binding().story_id.clone();

        if status.did_just_finish && self.looping && !paused {
            if let Some(player) = self.player.as_mut() {
                player.seek_to_start();
                player.play();
            }
        }

        if buffering {
            self.set_media_state(MediaState::Buffering);
        } else if status.is_loaded {
            self.set_media_state(MediaState::Ready);
        }

        if after != before {
            self.pending_events.push(StoryEvent::ProgressChanged {
                story_id,
                progress: after,
            });
        }
        if completed {
            self.on_driver_complete();
        }
        true
    }

    /// The player (or image decoder) failed on the media for `binding`
    ///
    /// Surfaces a retry affordance; never advances on its own.
    pub fn report_media_error(&mut self, binding: &DriverBinding, message: impl Into<String>) -> bool {
        if !self.accepts(binding, "media error") {
            return false;
        }
        self.fail_media(message.into());
        true
    }

    // ===== Events =====

    /// Drain pending events (call after each operation)
    pub fn drain_events(&mut self) -> Vec<StoryEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn ensure_alive(&self) -> Result<()> {
        if self.alive {
            Ok(())
        } else {
            Err(NavigationError::SessionClosed)
        }
    }

    fn accepts(&self, binding: &DriverBinding, what: &str) -> bool {
        if !self.alive {
            debug!(story_id = %binding.story_id, what, "Ignoring callback after close");
            return false;
        }
        if !self.is_current(binding) {
            debug!(
                story_id = %binding.story_id,
                generation = binding.generation,
                what,
                "Ignoring stale callback"
            );
            return false;
        }
        true
    }

    fn video_loaded(&self) -> bool {
        self.media_uri.is_some()
            && !self.media.is_failed()
            && self.driver.as_ref().is_some_and(ProgressDriver::is_video)
    }

    /// Move the cursor and bind a new driver in one step
    fn activate(&mut self, cursor: NavigationCursor) {
        let previous_story_id = self.current_story().map(|story| story.id.clone());
        let Some(story_id) = self.feed.story_at(cursor).map(|story| story.id.clone()) else {
            error!(cursor = %cursor, "Cursor does not address a story");
            return;
        };

        // Cancel everything bound to the previous story first
        self.driver = None;
        self.dwell_remaining = None;
        self.deferred_completion = false;
        self.feed_finished = false;

        let was_loaded = self.state.is_loaded();
        self.state = NavigationState::Loaded(cursor);
        if !was_loaded {
            self.emit_state_changed();
        }

        debug!(cursor = %cursor, story_id = %story_id, "Story activated");
        self.pending_events.push(StoryEvent::StoryChanged {
            cursor,
            story_id,
            previous_story_id,
        });

        self.dwell_remaining = Some(self.config.dwell);
        self.bind(cursor);
    }

    /// Bind a fresh driver for the story at `cursor` and request its media
    fn bind(&mut self, cursor: NavigationCursor) {
        let Some(story) = self.feed.story_at(cursor).cloned() else {
            return;
        };

        self.generation += 1;
        let binding = DriverBinding {
            story_id: story.id.clone(),
            generation: self.generation,
        };

        if let Some(player) = self.player.as_mut() {
            player.unload();
        }

        let mut driver = ProgressDriver::new(
            &story,
            binding.clone(),
            self.config.default_image_duration,
            self.looping,
        );
        if self.state.is_paused() {
            driver.freeze();
        }
        self.driver = Some(driver);
        self.media_uri = None;
        self.deferred_completion = false;

        self.pending_events.push(StoryEvent::ProgressChanged {
            story_id: story.id.clone(),
            progress: 0.0,
        });
        self.media = MediaState::Resolving;
        self.pending_events.push(StoryEvent::MediaStateChanged {
            story_id: story.id.clone(),
            state: MediaState::Resolving,
        });
        self.pending_events
            .push(StoryEvent::MediaRequested { binding, story });
    }

    fn tick_dwell(&mut self, delta: Duration) {
        let Some(remaining) = self.dwell_remaining else {
            return;
        };

        let remaining = remaining.saturating_sub(delta);
        if !remaining.is_zero() {
            self.dwell_remaining = Some(remaining);
            return;
        }

        self.dwell_remaining = None;
        if let Some(story_id) = self.current_story().map(|story| story.id.clone()) {
            debug!(story_id = %story_id, "Dwell elapsed");
            self.pending_events
                .push(StoryEvent::ViewQualified { story_id });
        }
    }

    fn on_driver_complete(&mut self) {
        if self.state.is_paused() {
            self.deferred_completion = true;
            return;
        }
        let Some(cursor) = self.cursor() else {
            return;
        };

        match self.feed.next_cursor(cursor) {
            Some(next) => self.activate(next),
            None if !self.feed_finished => {
                self.feed_finished = true;
                info!(cursor = %cursor, "Reached end of story feed");
                self.pending_events.push(StoryEvent::FeedFinished);
            }
            None => {}
        }
    }

    fn fail_media(&mut self, message: String) {
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        driver.rewind();
        let story_id = driver.binding().story_id.clone();

        warn!(story_id = %story_id, error = %message, "Story media failed to play");
        if let Some(player) = self.player.as_mut() {
            player.unload();
        }
        self.media_uri = None;
        self.set_media_state(MediaState::Failed {
            message: message.clone(),
        });
        self.pending_events
            .push(StoryEvent::Error { story_id, message });
    }

    fn set_media_state(&mut self, state: MediaState) {
        if self.media == state {
            return;
        }
        self.media = state.clone();
        if let Some(story_id) = self.binding().map(|b| b.story_id.clone()) {
            self.pending_events
                .push(StoryEvent::MediaStateChanged { story_id, state });
        }
    }

    fn emit_state_changed(&mut self) {
        self.pending_events.push(StoryEvent::StateChanged {
            state: self.state.into(),
        });
    }
}

impl std::fmt::Debug for StoryNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryNavigator")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("media", &self.media)
            .field("alive", &self.alive)
            .finish_non_exhaustive()
    }
}

//! Game driver
//!
//! Connects a [`GameSession`] to the presentation layer and the leaderboard
//! backend. All session mutations happen here on the caller's thread; the
//! save/fetch round-trip is handed out as a future so the event loop keeps
//! running while it is in flight.

use std::collections::VecDeque;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::highscores::{LeaderboardGateway, LeaderboardUpdate, sync_leaderboard};
use crate::settings::Settings;
use crate::sim::{FinishedRound, GameSession, PlacementError, Scheduler, SessionView, Viewport};

/// Input coming from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationEvent {
    Tap,
    RestartRequested,
}

pub struct Game<S: Scheduler, G: LeaderboardGateway> {
    session: GameSession<S>,
    gateway: Rc<G>,
    leaderboard_size: usize,
    /// Rounds waiting for their save/fetch to be started, oldest first
    finished: VecDeque<FinishedRound>,
}

impl<S, G> Game<S, G>
where
    S: Scheduler,
    G: LeaderboardGateway + 'static,
{
    pub fn new(
        settings: &Settings,
        viewport: Viewport,
        scheduler: S,
        gateway: Rc<G>,
    ) -> Result<Self, PlacementError> {
        Ok(Self {
            session: GameSession::new(settings, viewport, scheduler)?,
            gateway,
            leaderboard_size: settings.leaderboard_size,
            finished: VecDeque::new(),
        })
    }

    pub fn session(&self) -> &GameSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession<S> {
        &mut self.session
    }

    pub fn gateway(&self) -> &Rc<G> {
        &self.gateway
    }

    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    pub fn handle(&mut self, event: PresentationEvent) -> Result<(), PlacementError> {
        match event {
            PresentationEvent::Tap => self.session.on_tap(),
            // A pending round stays queued: its score is still saved, and the
            // fetched board is discarded as stale
            PresentationEvent::RestartRequested => self.session.restart(),
        }
    }

    /// Deliver due timer firings; remembers the round if it just ended
    pub fn update(&mut self) -> Result<(), PlacementError> {
        if let Some(round) = self.session.poll_timers()? {
            self.finished.push_back(round);
        }
        Ok(())
    }

    /// Countdown tick that bypasses the scheduler
    pub fn countdown_tick(&mut self) {
        if let Some(round) = self.session.on_countdown_tick() {
            self.finished.push_back(round);
        }
    }

    pub fn has_pending_sync(&self) -> bool {
        !self.finished.is_empty()
    }

    /// Start saving the oldest finished round. The returned future saves, then
    /// fetches the top scores; feed its output to [`Game::apply_leaderboard`].
    pub fn take_sync(&mut self) -> Option<LocalBoxFuture<'static, LeaderboardUpdate>> {
        let round = self.finished.pop_front()?;
        let gateway = Rc::clone(&self.gateway);
        let top_n = self.leaderboard_size;
        Some(Box::pin(async move {
            sync_leaderboard(&*gateway, round, top_n).await
        }))
    }

    /// Show a fetched leaderboard if its session is still the current one
    pub fn apply_leaderboard(&mut self, update: LeaderboardUpdate) -> bool {
        self.session.apply_leaderboard(update)
    }

    /// Run the oldest pending save/fetch to completion and apply the result
    pub async fn settle(&mut self) -> bool {
        match self.take_sync() {
            Some(sync) => {
                let update = sync.await;
                self.apply_leaderboard(update)
            }
            None => false,
        }
    }
}

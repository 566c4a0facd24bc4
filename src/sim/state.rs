//! Game session state machine
//!
//! A session is `Running` from creation until its countdown reaches zero,
//! then `Ended` until restarted. Every mutation goes through one of the
//! transition methods below; the presentation layer only reads [`SessionView`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::{Fired, Scheduler, SessionClock, Trigger};
use super::placer::{Layout, PlacementError, Position, RandomPlacer, Viewport};
use crate::highscores::{Leaderboard, LeaderboardUpdate, ScoreRecord};
use crate::settings::Settings;

/// Identity of one play-through; bumped on every restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Countdown running, target tappable
    Running,
    /// Time is up; showing results
    Ended,
}

/// Final score of a round, ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRound {
    pub session: SessionId,
    pub record: ScoreRecord,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub score: u32,
    pub time_remaining: u32,
    pub phase: GamePhase,
    pub target: Position,
    /// End-screen scores, best first
    pub leaderboard: Vec<u32>,
}

/// The single active play-through
pub struct GameSession<S: Scheduler> {
    id: SessionId,
    score: u32,
    time_remaining: u32,
    phase: GamePhase,
    target: Position,
    leaderboard: Leaderboard,
    initial_seconds: u32,
    layout: Layout,
    placer: RandomPlacer,
    clock: SessionClock,
    scheduler: S,
}

impl<S: Scheduler> GameSession<S> {
    /// Start a running session and arm its timers
    pub fn new(settings: &Settings, viewport: Viewport, scheduler: S) -> Result<Self, PlacementError> {
        let layout = settings.layout(viewport);
        let mut placer = settings.placer();
        let target = placer.place_in(&layout)?;
        // A round needs at least one tick to count down
        let initial_seconds = settings.initial_seconds.max(1);

        let mut session = Self {
            id: SessionId::from_raw(1),
            score: 0,
            time_remaining: initial_seconds,
            phase: GamePhase::Running,
            target,
            leaderboard: Leaderboard::new(),
            initial_seconds,
            layout,
            placer,
            clock: SessionClock::new(settings.countdown_interval(), settings.reposition_interval()),
            scheduler,
        };
        session.clock.arm(&mut session.scheduler);
        log::info!(
            "Session {} started: {}s on {}x{}",
            session.id,
            session.time_remaining,
            viewport.width,
            viewport.height
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            score: self.score,
            time_remaining: self.time_remaining,
            phase: self.phase,
            target: self.target,
            leaderboard: self.leaderboard.scores(),
        }
    }

    /// Player hit the target
    pub fn on_tap(&mut self) -> Result<(), PlacementError> {
        if !self.is_running() {
            log::debug!("Tap ignored, session {} has ended", self.id);
            return Ok(());
        }
        let target = self.placer.place_in(&self.layout)?;
        self.score += 1;
        self.target = target;
        log::debug!("Hit! score={}", self.score);
        Ok(())
    }

    /// One second elapsed. Returns the finished round when time runs out.
    pub fn on_countdown_tick(&mut self) -> Option<FinishedRound> {
        if !self.is_running() {
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        log::debug!("Tick: {}s left", self.time_remaining);

        if self.time_remaining == 0 {
            Some(self.end_round())
        } else {
            None
        }
    }

    /// Move the target without scoring
    pub fn on_reposition(&mut self) -> Result<(), PlacementError> {
        if !self.is_running() {
            return Ok(());
        }
        self.target = self.placer.place_in(&self.layout)?;
        Ok(())
    }

    /// Start over with a fresh session identity. Also resets a running round.
    pub fn restart(&mut self) -> Result<(), PlacementError> {
        let target = self.placer.place_in(&self.layout)?;

        self.clock.disarm(&mut self.scheduler);
        self.id = self.id.next();
        self.score = 0;
        self.time_remaining = self.initial_seconds;
        self.phase = GamePhase::Running;
        self.target = target;
        self.leaderboard = Leaderboard::new();
        self.clock.arm(&mut self.scheduler);

        log::info!("Session {} started: {}s", self.id, self.time_remaining);
        Ok(())
    }

    /// Screen size changed; the current target is re-placed to stay on screen
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), PlacementError> {
        let layout = Layout::new(viewport, self.layout.reserved_header, self.layout.target_size);
        layout.validate()?;
        self.layout = layout;
        if !self.layout.contains(self.target) {
            self.target = self.placer.place_in(&self.layout)?;
        }
        Ok(())
    }

    /// Route a scheduler firing; firings from disarmed timers are dropped
    pub fn on_timer(&mut self, fired: Fired) -> Result<Option<FinishedRound>, PlacementError> {
        match self.clock.resolve(fired) {
            Some(Trigger::Countdown) => Ok(self.on_countdown_tick()),
            Some(Trigger::Reposition) => self.on_reposition().map(|_| None),
            None => {
                log::debug!("Dropping stale {:?} firing", fired.trigger);
                Ok(None)
            }
        }
    }

    /// Deliver every due firing from the scheduler
    pub fn poll_timers(&mut self) -> Result<Option<FinishedRound>, PlacementError> {
        let mut finished = None;
        for fired in self.scheduler.poll() {
            if let Some(round) = self.on_timer(fired)? {
                finished = Some(round);
            }
        }
        Ok(finished)
    }

    /// Show fetched scores, unless they belong to an earlier session
    pub fn apply_leaderboard(&mut self, update: LeaderboardUpdate) -> bool {
        if update.session != self.id {
            log::debug!(
                "Discarding leaderboard for session {} (current {})",
                update.session,
                self.id
            );
            return false;
        }
        self.leaderboard = update.leaderboard;
        true
    }

    fn end_round(&mut self) -> FinishedRound {
        self.phase = GamePhase::Ended;
        self.clock.disarm(&mut self.scheduler);
        log::info!("Session {} over, final score {}", self.id, self.score);

        FinishedRound {
            session: self.id,
            record: ScoreRecord::now(self.score),
        }
    }
}

impl<S: Scheduler> Drop for GameSession<S> {
    fn drop(&mut self) {
        self.clock.disarm(&mut self.scheduler);
    }
}

impl<S: Scheduler> fmt::Debug for GameSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("score", &self.score)
            .field("time_remaining", &self.time_remaining)
            .field("phase", &self.phase)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

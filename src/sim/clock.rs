//! Session timers
//!
//! Countdown and reposition triggers are periodic timers armed on a
//! [`Scheduler`]. Firings come back as [`Fired`] values tagged with the token
//! that armed them, so a session can tell its own live timers apart from
//! leftovers of a round that already ended.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle for an armed periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

/// Which session trigger a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Decrements the time remaining
    Countdown,
    /// Moves the target somewhere else
    Reposition,
}

/// One timer expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub token: TimerToken,
    pub trigger: Trigger,
}

/// Periodic timer source
pub trait Scheduler {
    /// Start firing `trigger` every `interval` until cancelled
    fn arm(&mut self, trigger: Trigger, interval: Duration) -> TimerToken;
    /// Stop a timer; unknown or already-cancelled tokens are ignored
    fn cancel(&mut self, token: TimerToken);
    /// Collect due firings in deadline order, at most one per timer
    fn poll(&mut self) -> Vec<Fired>;
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn arm(&mut self, trigger: Trigger, interval: Duration) -> TimerToken {
        (**self).arm(trigger, interval)
    }

    fn cancel(&mut self, token: TimerToken) {
        (**self).cancel(token);
    }

    fn poll(&mut self) -> Vec<Fired> {
        (**self).poll()
    }
}

#[derive(Debug, Clone)]
struct ArmedTimer {
    trigger: Trigger,
    interval: Duration,
    next_due: Duration,
}

/// Scheduler driven by an explicit clock, for tests and simulated play
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_token: u64,
    timers: BTreeMap<TimerToken, ArmedTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the scheduler was created
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward; the next `poll` fires each overdue timer once
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Move the clock to an absolute time (never backwards)
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }

    pub fn is_armed(&self, token: TimerToken) -> bool {
        self.timers.contains_key(&token)
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&mut self, trigger: Trigger, interval: Duration) -> TimerToken {
        // A zero period has no next deadline
        let interval = interval.max(Duration::from_millis(1));
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.timers.insert(
            token,
            ArmedTimer {
                trigger,
                interval,
                next_due: self.now + interval,
            },
        );
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.timers.remove(&token);
    }

    fn poll(&mut self) -> Vec<Fired> {
        let now = self.now;
        let mut due: Vec<(&TimerToken, &mut ArmedTimer)> = self
            .timers
            .iter_mut()
            .filter(|(_, t)| t.next_due <= now)
            .collect();
        // Earliest deadline first, arming order breaks ties
        due.sort_by_key(|(token, t)| (t.next_due, **token));

        due.into_iter()
            .map(|(token, timer)| {
                // Missed periods collapse into this one firing; the next
                // deadline stays on the timer's original grid
                let behind = (now - timer.next_due).as_nanos() % timer.interval.as_nanos();
                timer.next_due = now + timer.interval - Duration::from_nanos(behind as u64);
                Fired {
                    token: *token,
                    trigger: timer.trigger,
                }
            })
            .collect()
    }
}

/// Scheduler that follows the real monotonic clock
#[derive(Debug)]
pub struct WallClockScheduler {
    origin: Instant,
    inner: ManualScheduler,
}

impl Default for WallClockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClockScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            inner: ManualScheduler::new(),
        }
    }

    fn sync(&mut self) {
        self.inner.advance_to(self.origin.elapsed());
    }
}

impl Scheduler for WallClockScheduler {
    fn arm(&mut self, trigger: Trigger, interval: Duration) -> TimerToken {
        self.sync();
        self.inner.arm(trigger, interval)
    }

    fn cancel(&mut self, token: TimerToken) {
        self.inner.cancel(token);
    }

    fn poll(&mut self) -> Vec<Fired> {
        self.sync();
        self.inner.poll()
    }
}

/// The pair of triggers belonging to one running session
#[derive(Debug, Clone)]
pub struct SessionClock {
    countdown_interval: Duration,
    reposition_interval: Duration,
    countdown: Option<TimerToken>,
    reposition: Option<TimerToken>,
}

impl SessionClock {
    pub fn new(countdown_interval: Duration, reposition_interval: Duration) -> Self {
        Self {
            countdown_interval,
            reposition_interval,
            countdown: None,
            reposition: None,
        }
    }

    /// Arm both triggers, replacing any previous ones
    pub fn arm(&mut self, scheduler: &mut impl Scheduler) {
        self.disarm(scheduler);
        self.countdown = Some(scheduler.arm(Trigger::Countdown, self.countdown_interval));
        self.reposition = Some(scheduler.arm(Trigger::Reposition, self.reposition_interval));
    }

    pub fn disarm(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(token) = self.countdown.take() {
            scheduler.cancel(token);
        }
        if let Some(token) = self.reposition.take() {
            scheduler.cancel(token);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.countdown.is_some() || self.reposition.is_some()
    }

    /// The trigger a firing belongs to, if it came from one of our live timers
    pub fn resolve(&self, fired: Fired) -> Option<Trigger> {
        let live = match fired.trigger {
            Trigger::Countdown => self.countdown,
            Trigger::Reposition => self.reposition,
        };
        (live == Some(fired.token)).then_some(fired.trigger)
    }
}

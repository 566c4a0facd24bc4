//! Session simulation
//!
//! Game rules with no rendering or network dependencies:
//! - Target placement inside the playfield
//! - Countdown and reposition timers behind a `Scheduler`
//! - The Running/Ended state machine

pub mod clock;
pub mod placer;
pub mod state;

pub use clock::{Fired, ManualScheduler, Scheduler, SessionClock, TimerToken, Trigger, WallClockScheduler};
pub use placer::{Layout, PlacementError, Position, RandomPlacer, Viewport};
pub use state::{FinishedRound, GamePhase, GameSession, SessionId, SessionView};

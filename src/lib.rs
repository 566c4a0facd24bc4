//! Target Rush - tap the target before the clock runs out
//!
//! Core modules:
//! - `sim`: Session state machine, timers and target placement
//! - `highscores`: Leaderboard gateway and the save-then-fetch protocol
//! - `game`: Driver wiring the session to presentation events and the gateway
//! - `settings`: Tunable parameters

pub mod game;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use game::{Game, PresentationEvent};
pub use highscores::{GatewayError, Leaderboard, LeaderboardGateway, MemoryLeaderboard, ScoreRecord};
pub use settings::{Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Round length in seconds
    pub const INITIAL_SECONDS: u32 = 30;
    /// Countdown period
    pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;
    /// How often the target jumps on its own
    pub const REPOSITION_INTERVAL_MS: u64 = 1000;

    /// Target side length (px)
    pub const TARGET_SIZE: f32 = 60.0;
    /// Title, score and timer rows above the playfield (px)
    pub const RESERVED_HEADER: f32 = 200.0;
}

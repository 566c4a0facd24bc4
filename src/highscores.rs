//! Shared leaderboard
//!
//! Scores live in a remote `scores` collection reached through a
//! [`LeaderboardGateway`]. A finished round is saved best-effort and the top
//! entries are fetched back for the end screen.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{FinishedRound, SessionId};

/// Number of entries shown on the end screen
pub const LEADERBOARD_SIZE: usize = 5;

/// A completed round as stored in the `scores` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    /// Wall-clock time the round ended
    pub timestamp: SystemTime,
}

impl ScoreRecord {
    pub fn new(score: u32, timestamp: SystemTime) -> Self {
        Self { score, timestamp }
    }

    /// Record stamped with the current time
    pub fn now(score: u32) -> Self {
        Self::new(score, SystemTime::now())
    }
}

/// Display order: higher score first, earlier timestamp wins ties
pub fn rank_order(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    Permission(String),
}

/// Remote score store
///
/// `fetch_top` returns at most `n` records, highest score first. How a
/// backend orders equal scores is backend-defined but must be stable within
/// a single fetch; [`MemoryLeaderboard`] uses [`rank_order`].
#[async_trait(?Send)]
pub trait LeaderboardGateway {
    /// Append one record
    async fn save(&self, record: ScoreRecord) -> Result<(), GatewayError>;
    /// Read the best `n` records
    async fn fetch_top(&self, n: usize) -> Result<Vec<ScoreRecord>, GatewayError>;
}

/// Top scores as shown on the end screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<ScoreRecord>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by display order and keep the best `limit`
    pub fn from_records(mut records: Vec<ScoreRecord>, limit: usize) -> Self {
        records.sort_by(rank_order);
        records.truncate(limit);
        Self { entries: records }
    }

    pub fn entries(&self) -> &[ScoreRecord] {
        &self.entries
    }

    pub fn scores(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.score).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }
}

/// Fetched leaderboard tagged with the session it was requested for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardUpdate {
    pub session: SessionId,
    pub leaderboard: Leaderboard,
}

/// Save a finished round, then fetch the top `top_n` scores.
///
/// Save failures are logged and do not stop the fetch. Fetch failures are
/// logged and produce an empty leaderboard. Nothing is retried.
pub async fn sync_leaderboard<G>(gateway: &G, round: FinishedRound, top_n: usize) -> LeaderboardUpdate
where
    G: LeaderboardGateway + ?Sized,
{
    let FinishedRound { session, record } = round;
    let score = record.score;

    match gateway.save(record).await {
        Ok(()) => log::info!("Saved score {} for session {}", score, session),
        Err(e) => log::error!("Failed to save score {} for session {}: {}", score, session, e),
    }

    let leaderboard = match gateway.fetch_top(top_n).await {
        // Backends may order ties differently; normalise for display
        Ok(records) => Leaderboard::from_records(records, top_n),
        Err(e) => {
            log::warn!("Failed to fetch top {} scores: {}", top_n, e);
            Leaderboard::new()
        }
    };

    LeaderboardUpdate {
        session,
        leaderboard,
    }
}

/// In-process `scores` collection
///
/// Failures can be queued to exercise the error paths.
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    records: RefCell<Vec<ScoreRecord>>,
    save_failures: RefCell<VecDeque<GatewayError>>,
    fetch_failures: RefCell<VecDeque<GatewayError>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    /// Every stored record, in insertion order
    pub fn records(&self) -> Vec<ScoreRecord> {
        self.records.borrow().clone()
    }

    /// Queue a failure for an upcoming `save`; queued failures are used in order
    pub fn fail_next_save(&self, error: GatewayError) {
        self.save_failures.borrow_mut().push_back(error);
    }

    /// Queue a failure for an upcoming `fetch_top`; queued failures are used in order
    pub fn fail_next_fetch(&self, error: GatewayError) {
        self.fetch_failures.borrow_mut().push_back(error);
    }
}

#[async_trait(?Send)]
impl LeaderboardGateway for MemoryLeaderboard {
    async fn save(&self, record: ScoreRecord) -> Result<(), GatewayError> {
        if let Some(err) = self.save_failures.borrow_mut().pop_front() {
            return Err(err);
        }
        self.records.borrow_mut().push(record);
        Ok(())
    }

    async fn fetch_top(&self, n: usize) -> Result<Vec<ScoreRecord>, GatewayError> {
        if let Some(err) = self.fetch_failures.borrow_mut().pop_front() {
            return Err(err);
        }
        let mut top = self.records.borrow().clone();
        top.sort_by(rank_order);
        top.truncate(n);
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn round(id: u64, score: u32) -> FinishedRound {
        FinishedRound {
            session: SessionId::from_raw(id),
            record: ScoreRecord::new(score, at(1_000 + id)),
        }
    }

    #[test]
    fn test_from_records_sorted_and_truncated() {
        let records = vec![
            ScoreRecord::new(3, at(1)),
            ScoreRecord::new(9, at(2)),
            ScoreRecord::new(5, at(3)),
            ScoreRecord::new(1, at(4)),
            ScoreRecord::new(7, at(5)),
            ScoreRecord::new(8, at(6)),
        ];
        let board = Leaderboard::from_records(records, LEADERBOARD_SIZE);
        assert_eq!(board.scores(), vec![9, 8, 7, 5, 3]);
        assert_eq!(board.top_score(), Some(9));
    }

    #[test]
    fn test_ties_earliest_first() {
        let records = vec![
            ScoreRecord::new(4, at(30)),
            ScoreRecord::new(4, at(10)),
            ScoreRecord::new(4, at(20)),
        ];
        let board = Leaderboard::from_records(records, LEADERBOARD_SIZE);
        let times: Vec<SystemTime> = board.entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(times, vec![at(10), at(20), at(30)]);
    }

    #[test]
    fn test_memory_fetch_top_limits() {
        let gateway = MemoryLeaderboard::new();
        block_on(async {
            for (i, score) in [2, 12, 6, 6, 1, 9, 3].into_iter().enumerate() {
                gateway.save(ScoreRecord::new(score, at(i as u64))).await.unwrap();
            }
            let top = gateway.fetch_top(5).await.unwrap();
            let scores: Vec<u32> = top.iter().map(|r| r.score).collect();
            assert_eq!(scores, vec![12, 9, 6, 6, 3]);
            assert_eq!(top[2].timestamp, at(2));
            assert!(gateway.fetch_top(0).await.unwrap().is_empty());
        });
        assert_eq!(gateway.records().len(), 7);
    }

    #[test]
    fn test_queued_failures_in_order() {
        let gateway = MemoryLeaderboard::new();
        gateway.fail_next_save(GatewayError::Network("timeout".into()));
        gateway.fail_next_save(GatewayError::Permission("denied".into()));
        gateway.fail_next_fetch(GatewayError::Permission("denied".into()));
        gateway.fail_next_fetch(GatewayError::Network("timeout".into()));

        block_on(async {
            let first = gateway.save(ScoreRecord::new(1, at(1))).await;
            let second = gateway.save(ScoreRecord::new(2, at(2))).await;
            assert_eq!(first, Err(GatewayError::Network("timeout".into())));
            assert_eq!(second, Err(GatewayError::Permission("denied".into())));
            assert!(gateway.save(ScoreRecord::new(3, at(3))).await.is_ok());

            let first = gateway.fetch_top(5).await;
            let second = gateway.fetch_top(5).await;
            assert_eq!(first, Err(GatewayError::Permission("denied".into())));
            assert_eq!(second, Err(GatewayError::Network("timeout".into())));
            assert_eq!(gateway.fetch_top(5).await.unwrap().len(), 1);
        });
    }

    #[test]
    fn test_sync_saves_then_fetches() {
        let gateway = MemoryLeaderboard::with_records(vec![ScoreRecord::new(20, at(1))]);
        let update = block_on(sync_leaderboard(&gateway, round(3, 7), LEADERBOARD_SIZE));
        assert_eq!(update.session, SessionId::from_raw(3));
        assert_eq!(update.leaderboard.scores(), vec![20, 7]);
    }

    #[test]
    fn test_sync_save_failure_still_fetches() {
        let gateway = MemoryLeaderboard::with_records(vec![ScoreRecord::new(4, at(1))]);
        gateway.fail_next_save(GatewayError::Permission("scores is read-only".into()));

        let update = block_on(sync_leaderboard(&gateway, round(1, 9), LEADERBOARD_SIZE));
        assert_eq!(update.leaderboard.scores(), vec![4]);
        assert_eq!(gateway.records().len(), 1);
    }

    #[test]
    fn test_sync_fetch_failure_yields_empty_board() {
        let gateway = MemoryLeaderboard::new();
        gateway.fail_next_fetch(GatewayError::Network("connection reset".into()));

        let update = block_on(sync_leaderboard(&gateway, round(2, 5), LEADERBOARD_SIZE));
        assert!(update.leaderboard.is_empty());
        // The save still went through
        assert_eq!(gateway.records(), vec![ScoreRecord::new(5, at(1_002))]);
    }
}

use anyhow::Result;
use rusqlite::Connection;

use crate::model::{
    ACTIVE_FIXTURE_ID, AnalysisScore, Availability, Event, Fixture, Player, TrackingPoint,
};
use crate::store;

/// Everything the views read, loaded in one pass.
#[derive(Debug, Clone, Default)]
pub struct HubSnapshot {
    pub players: Vec<Player>,
    pub fixtures: Vec<Fixture>,
    pub availability: Vec<Availability>,
    pub analysis: Vec<AnalysisScore>,
    pub tracking: Vec<TrackingPoint>,
    pub events: Vec<Event>,
}

impl HubSnapshot {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            players: store::load_players(conn)?,
            fixtures: store::load_fixtures(conn)?,
            availability: store::load_availability(conn)?,
            analysis: store::load_analysis_scores(conn)?,
            tracking: store::load_tracking(conn)?,
            events: store::load_events(conn)?,
        })
    }

    pub fn active_fixture(&self) -> Option<&Fixture> {
        self.fixtures
            .iter()
            .find(|f| f.fixture_id == ACTIVE_FIXTURE_ID)
    }
}

/// Read-through cache over the store. Every write bumps `generation`; the
/// snapshot is reloaded only when it was taken at an older generation.
pub struct HubData {
    conn: Connection,
    generation: u64,
    snapshot_generation: Option<u64>,
    snapshot: HubSnapshot,
}

impl HubData {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            generation: 0,
            snapshot_generation: None,
            snapshot: HubSnapshot::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.snapshot_generation != Some(self.generation)
    }

    /// Reloads the snapshot if stale. Returns whether a reload happened.
    pub fn refresh(&mut self) -> Result<bool> {
        if !self.is_stale() {
            return Ok(false);
        }
        self.snapshot = HubSnapshot::load(&self.conn)?;
        self.snapshot_generation = Some(self.generation);
        log::debug!("snapshot reloaded at generation {}", self.generation);
        Ok(true)
    }

    pub fn snapshot(&self) -> &HubSnapshot {
        &self.snapshot
    }

    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        f(&self.conn)
    }

    /// Runs a write against the store and invalidates the snapshot, whether
    /// or not the write succeeded.
    pub fn write<T>(&mut self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let out = f(&mut self.conn);
        self.generation = self.generation.wrapping_add(1);
        out
    }
}

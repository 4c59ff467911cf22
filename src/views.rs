//! Read-side joins and summaries for the six views, as pure functions over a
//! [`HubSnapshot`].

use crate::cache::HubSnapshot;
use crate::model::{
    AnalysisScore, Event, Player, PlayerStatus, TeamSide, TrackingPoint, find_player,
};

pub const TRACKING_TAIL: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Selection,
    Analysis,
    Tracking,
    DataSync,
    Settings,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Dashboard,
        Page::Selection,
        Page::Analysis,
        Page::Tracking,
        Page::DataSync,
        Page::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Selection => "Selection & Availability",
            Page::Analysis => "Player Analysis (GAME)",
            Page::Tracking => "Video & Tracking",
            Page::DataSync => "Data Sync",
            Page::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx % Self::ALL.len()]
    }

    pub fn key(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Selection => "selection",
            Page::Analysis => "analysis",
            Page::Tracking => "tracking",
            Page::DataSync => "data_sync",
            Page::Settings => "settings",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardMetrics {
    pub players: usize,
    pub fixtures: usize,
    pub available: usize,
    pub selected: usize,
}

pub fn dashboard_metrics(snap: &HubSnapshot) -> DashboardMetrics {
    DashboardMetrics {
        players: snap.players.len(),
        fixtures: snap.fixtures.len(),
        available: snap.availability.iter().filter(|a| a.available).count(),
        selected: snap
            .active_fixture()
            .map(|f| f.selected_player_ids.len())
            .unwrap_or(0),
    }
}

/// Display fields of the joined player; empty when the id does not join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRef {
    pub first_name: String,
    pub last_name: String,
    pub shirt_number: Option<u32>,
    pub status: String,
    pub injury_notes: String,
}

impl PlayerRef {
    pub fn lookup(players: &[Player], player_id: Option<i64>) -> Self {
        let Some(p) = player_id.and_then(|id| find_player(players, id)) else {
            return Self::default();
        };
        Self {
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            shirt_number: p.shirt_number,
            status: p.status.as_str().to_string(),
            injury_notes: p.injury_notes.clone(),
        }
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRow {
    pub player_id: i64,
    pub player: PlayerRef,
    pub available: bool,
    pub reason: String,
}

/// Availability left-joined to the roster, sorted by display name.
pub fn availability_rows(snap: &HubSnapshot) -> Vec<AvailabilityRow> {
    let mut rows = snap
        .availability
        .iter()
        .map(|a| AvailabilityRow {
            player_id: a.player_id,
            player: PlayerRef::lookup(&snap.players, Some(a.player_id)),
            available: a.available,
            reason: a.reason.clone(),
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| a.player.name().cmp(&b.player.name()));
    rows
}

/// Roster ordered by last name, the order the squad picker lists players in.
pub fn roster_by_last_name(players: &[Player]) -> Vec<&Player> {
    let mut out = players.iter().collect::<Vec<_>>();
    out.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
    });
    out
}

/// Roster ordered by status then last name, for the unavailable/injured table.
pub fn status_rows(players: &[Player]) -> Vec<&Player> {
    let mut out = players.iter().collect::<Vec<_>>();
    out.sort_by(|a, b| {
        status_rank(&a.status)
            .cmp(&status_rank(&b.status))
            .then_with(|| a.status.as_str().cmp(b.status.as_str()))
            .then_with(|| a.last_name.cmp(&b.last_name))
    });
    out
}

fn status_rank(status: &PlayerStatus) -> u8 {
    match status {
        PlayerStatus::Available => 0,
        PlayerStatus::Injured => 1,
        PlayerStatus::Suspended => 2,
        PlayerStatus::Unavailable => 3,
        PlayerStatus::Other(_) => 4,
    }
}

/// Last appended rating for the player, across all fixtures.
pub fn latest_rating(analysis: &[AnalysisScore], player_id: i64) -> Option<&AnalysisScore> {
    analysis.iter().rev().find(|s| s.player_id == player_id)
}

pub fn rating_history(analysis: &[AnalysisScore], player_id: i64) -> Vec<&AnalysisScore> {
    analysis
        .iter()
        .filter(|s| s.player_id == player_id)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub fixture_id: i64,
    pub time_s: i64,
    pub event: String,
    pub player_id: Option<i64>,
    pub player: PlayerRef,
    pub notes: String,
}

pub fn event_rows<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    players: &[Player],
) -> Vec<EventRow> {
    events
        .into_iter()
        .map(|e| EventRow {
            fixture_id: e.fixture_id,
            time_s: e.time_s,
            event: e.kind.label().to_string(),
            player_id: e.player_id,
            player: PlayerRef::lookup(players, e.player_id),
            notes: e.notes.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRow {
    pub fixture_id: i64,
    pub time_s: i64,
    pub player_id: i64,
    pub player: PlayerRef,
    pub x_pct: f64,
    pub y_pct: f64,
    pub team: TeamSide,
    pub bench: bool,
}

pub fn tracking_rows<'a>(
    points: impl IntoIterator<Item = &'a TrackingPoint>,
    players: &[Player],
) -> Vec<TrackingRow> {
    points
        .into_iter()
        .map(|p| TrackingRow {
            fixture_id: p.fixture_id,
            time_s: p.time_s,
            player_id: p.player_id,
            player: PlayerRef::lookup(players, Some(p.player_id)),
            x_pct: p.x_pct,
            y_pct: p.y_pct,
            team: p.team,
            bench: p.bench,
        })
        .collect()
}

/// The latest `TRACKING_TAIL` tracking points, joined.
pub fn tracking_tail(snap: &HubSnapshot) -> Vec<TrackingRow> {
    let start = snap.tracking.len().saturating_sub(TRACKING_TAIL);
    tracking_rows(&snap.tracking[start..], &snap.players)
}

pub fn selected_names(snap: &HubSnapshot) -> Vec<String> {
    let Some(fixture) = snap.active_fixture() else {
        return Vec::new();
    };
    fixture
        .selected_player_ids
        .iter()
        .map(|id| {
            let name = PlayerRef::lookup(&snap.players, Some(*id)).name();
            if name.is_empty() {
                format!("#{id}")
            } else {
                name
            }
        })
        .collect()
}

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// The single fixture every view works against.
pub const ACTIVE_FIXTURE_ID: i64 = 1;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 9;
pub const RATING_DEFAULT: u8 = 5;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const KICKOFF_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    Available,
    Injured,
    Unavailable,
    Suspended,
    Other(String),
}

impl PlayerStatus {
    pub const CHOICES: [PlayerStatus; 4] = [
        PlayerStatus::Available,
        PlayerStatus::Injured,
        PlayerStatus::Unavailable,
        PlayerStatus::Suspended,
    ];

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "available" => PlayerStatus::Available,
            "injured" => PlayerStatus::Injured,
            "unavailable" => PlayerStatus::Unavailable,
            "suspended" => PlayerStatus::Suspended,
            _ => PlayerStatus::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlayerStatus::Available => "available",
            PlayerStatus::Injured => "injured",
            PlayerStatus::Unavailable => "unavailable",
            PlayerStatus::Suspended => "suspended",
            PlayerStatus::Other(raw) => raw.as_str(),
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::CHOICES.iter().position(|s| s == self);
        match idx {
            Some(idx) => Self::CHOICES[(idx + 1) % Self::CHOICES.len()].clone(),
            None => PlayerStatus::Available,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub player_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub status: PlayerStatus,
    pub injury_notes: String,
    pub shirt_number: Option<u32>,
    pub rfu_id: Option<String>,
    pub front_row_trained: bool,
    pub suspected_concussions: u32,
}

impl Player {
    pub fn new(player_id: i64, first_name: &str, last_name: &str) -> Self {
        Self {
            player_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            status: PlayerStatus::Available,
            injury_notes: String::new(),
            shirt_number: None,
            rfu_id: None,
            front_row_trained: false,
            suspected_concussions: 0,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn initials(&self) -> String {
        let mut out = String::new();
        if let Some(c) = self.first_name.trim().chars().next() {
            out.extend(c.to_uppercase());
        }
        if let Some(c) = self.last_name.trim().chars().next() {
            out.extend(c.to_uppercase());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
    Neutral,
}

impl Venue {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "away" => Venue::Away,
            "neutral" => Venue::Neutral,
            _ => Venue::Home,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Venue::Home => "Home",
            Venue::Away => "Away",
            Venue::Neutral => "Neutral",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Venue::Home => Venue::Away,
            Venue::Away => Venue::Neutral,
            Venue::Neutral => Venue::Home,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub fixture_id: i64,
    pub team: String,
    pub opposition: String,
    pub venue: Venue,
    pub ground_address: String,
    pub date: Option<NaiveDate>,
    pub kickoff: Option<NaiveTime>,
    pub selected_player_ids: Vec<i64>,
    pub video_url: Option<String>,
}

impl Fixture {
    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    pub fn kickoff_label(&self) -> String {
        self.kickoff
            .map(|t| t.format(KICKOFF_FORMAT).to_string())
            .unwrap_or_default()
    }

    pub fn headline(&self) -> String {
        format!(
            "{} vs {} | {} | {} {}",
            self.team,
            self.opposition,
            self.venue.label(),
            self.date_label(),
            self.kickoff_label()
        )
        .trim_end()
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub player_id: i64,
    pub available: bool,
    pub reason: String,
}

/// One GAME rating: Go Forward, Attitude, Mighty Defence, Energy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisScore {
    pub fixture_id: i64,
    pub player_id: i64,
    pub go_forward: u8,
    pub attitude: u8,
    pub mighty_defence: u8,
    pub energy: u8,
    pub notes: String,
}

impl AnalysisScore {
    pub const AXES: [&'static str; 4] = ["Go Forward", "Attitude", "Mighty Defence", "Energy"];

    pub fn values(&self) -> [u8; 4] {
        [
            self.go_forward,
            self.attitude,
            self.mighty_defence,
            self.energy,
        ]
    }
}

pub fn clamp_rating(value: i64) -> u8 {
    value.clamp(RATING_MIN as i64, RATING_MAX as i64) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSide {
    Klr,
    Opp,
}

impl TeamSide {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("opp") {
            TeamSide::Opp
        } else {
            TeamSide::Klr
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TeamSide::Klr => "KLR",
            TeamSide::Opp => "OPP",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            TeamSide::Klr => TeamSide::Opp,
            TeamSide::Opp => TeamSide::Klr,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingPoint {
    pub fixture_id: i64,
    pub time_s: i64,
    pub player_id: i64,
    pub x_pct: f64,
    pub y_pct: f64,
    pub team: TeamSide,
    pub bench: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Carry,
    Tackle,
    RuckClean,
    Jackal,
    Offload,
    Linebreak,
    Kick,
    Pass,
    TurnoverWon,
    Try,
    PenaltyWon,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::Carry,
        EventKind::Tackle,
        EventKind::RuckClean,
        EventKind::Jackal,
        EventKind::Offload,
        EventKind::Linebreak,
        EventKind::Kick,
        EventKind::Pass,
        EventKind::TurnoverWon,
        EventKind::Try,
        EventKind::PenaltyWon,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Carry => "Carry",
            EventKind::Tackle => "Tackle",
            EventKind::RuckClean => "Ruck Clean",
            EventKind::Jackal => "Jackal",
            EventKind::Offload => "Offload",
            EventKind::Linebreak => "Linebreak",
            EventKind::Kick => "Kick",
            EventKind::Pass => "Pass",
            EventKind::TurnoverWon => "Turnover Won",
            EventKind::Try => "Try",
            EventKind::PenaltyWon => "Penalty Won",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub fixture_id: i64,
    pub time_s: i64,
    pub kind: EventKind,
    pub player_id: Option<i64>,
    pub notes: String,
}

pub fn find_player(players: &[Player], player_id: i64) -> Option<&Player> {
    players.iter().find(|p| p.player_id == player_id)
}

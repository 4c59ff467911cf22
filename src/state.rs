use std::collections::VecDeque;

use crate::cache::HubSnapshot;
use crate::importers::{ImportKind, parse_bool_lenient};
use crate::model::{
    ACTIVE_FIXTURE_ID, EventKind, Fixture, Player, PlayerStatus, RATING_DEFAULT, TeamSide, Venue,
    clamp_rating,
};
use crate::overlay::{PITCH_LENGTH, PITCH_WIDTH};
use crate::timeline::{Timeline, time_bounds};
use crate::views::{Page, roster_by_last_name};

pub const LOG_CAPACITY: usize = 200;

pub const DEFAULT_TEAM: &str = "KLRUFC U17 Colts";
pub const DEFAULT_OPPOSITION: &str = "TBC";
pub const DEFAULT_GROUND: &str = "Underley Park, Kirkby Lonsdale";

/// Where a committed text buffer goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    AvailabilityReason { player_id: i64 },
    AnalysisNotes,
    EventNotes,
    EventTime,
    ScrubTime,
    VideoUrl,
    ImportPath,
    LegacyDir,
    ExportPath,
    Fixture(FixtureField),
    RosterCell { row: usize, col: RosterColumn },
}

impl InputTarget {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputTarget::AvailabilityReason { .. } => "Reason",
            InputTarget::AnalysisNotes => "Notes (optional)",
            InputTarget::EventNotes => "Event notes",
            InputTarget::EventTime => "Time (seconds)",
            InputTarget::ScrubTime => "Go to time (s)",
            InputTarget::VideoUrl => "Video link",
            InputTarget::ImportPath => "Import file",
            InputTarget::LegacyDir => "Legacy data dir",
            InputTarget::ExportPath => "Export workbook",
            InputTarget::Fixture(field) => field.label(),
            InputTarget::RosterCell { col, .. } => col.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub target: InputTarget,
    pub buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPanel {
    Availability,
    Squad,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    pub panel: SelectionPanel,
    pub availability_cursor: usize,
    pub squad_cursor: usize,
    pub chosen: Vec<i64>,
    pub dirty: bool,
}

impl SelectionState {
    fn new() -> Self {
        Self {
            panel: SelectionPanel::Availability,
            availability_cursor: 0,
            squad_cursor: 0,
            chosen: Vec::new(),
            dirty: false,
        }
    }

    pub fn is_chosen(&self, player_id: i64) -> bool {
        self.chosen.contains(&player_id)
    }

    /// Adds or removes the player, keeping pick order for the rest.
    pub fn toggle(&mut self, player_id: i64) {
        if let Some(idx) = self.chosen.iter().position(|id| *id == player_id) {
            self.chosen.remove(idx);
        } else {
            self.chosen.push(player_id);
        }
        self.dirty = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisField {
    Player,
    Fixture,
    GoForward,
    Attitude,
    MightyDefence,
    Energy,
    Notes,
}

impl AnalysisField {
    pub const ALL: [AnalysisField; 7] = [
        AnalysisField::Player,
        AnalysisField::Fixture,
        AnalysisField::GoForward,
        AnalysisField::Attitude,
        AnalysisField::MightyDefence,
        AnalysisField::Energy,
        AnalysisField::Notes,
    ];

    pub fn rating_index(self) -> Option<usize> {
        match self {
            AnalysisField::GoForward => Some(0),
            AnalysisField::Attitude => Some(1),
            AnalysisField::MightyDefence => Some(2),
            AnalysisField::Energy => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisState {
    pub field: AnalysisField,
    pub player_cursor: usize,
    pub fixture_id: i64,
    pub ratings: [u8; 4],
    pub notes: String,
}

impl AnalysisState {
    fn new() -> Self {
        Self {
            field: AnalysisField::Player,
            player_cursor: 0,
            fixture_id: ACTIVE_FIXTURE_ID,
            ratings: [RATING_DEFAULT; 4],
            notes: String::new(),
        }
    }

    pub fn adjust(&mut self, delta: i64, roster_len: usize) {
        match self.field {
            AnalysisField::Player => {
                self.player_cursor = cycle_index(self.player_cursor, delta, roster_len);
            }
            AnalysisField::Fixture => {
                self.fixture_id = (self.fixture_id + delta).max(1);
            }
            AnalysisField::Notes => {}
            field => {
                if let Some(idx) = field.rating_index() {
                    self.ratings[idx] = clamp_rating(self.ratings[idx] as i64 + delta);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    List,
    Pitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPanel {
    Timeline,
    Tagging,
    Markers,
}

impl TrackingPanel {
    pub fn next(self) -> Self {
        match self {
            TrackingPanel::Timeline => TrackingPanel::Tagging,
            TrackingPanel::Tagging => TrackingPanel::Markers,
            TrackingPanel::Markers => TrackingPanel::Timeline,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrackingPanel::Timeline => "Timeline",
            TrackingPanel::Tagging => "Event tagging",
            TrackingPanel::Markers => "Markers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    Player,
    Event,
    Time,
    Notes,
}

impl TagField {
    pub const ALL: [TagField; 4] = [TagField::Player, TagField::Event, TagField::Time, TagField::Notes];
}

/// A marker dropped on the pitch, waiting to be mapped to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMarker {
    pub x_pct: f64,
    pub y_pct: f64,
    pub player_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TrackingState {
    pub mode: TrackingMode,
    pub panel: TrackingPanel,
    pub tag_field: TagField,
    /// 0 is "(team)", otherwise an index into the roster plus one.
    pub tag_player: usize,
    pub tag_event: usize,
    pub tag_time: i64,
    pub tag_notes: String,
    pub cursor: (f64, f64),
    pub markers: Vec<PendingMarker>,
    pub marker_selected: usize,
    pub marker_team: TeamSide,
    pub marker_bench: bool,
}

impl TrackingState {
    fn new() -> Self {
        Self {
            mode: TrackingMode::Pitch,
            panel: TrackingPanel::Timeline,
            tag_field: TagField::Player,
            tag_player: 0,
            tag_event: 0,
            tag_time: 0,
            tag_notes: String::new(),
            cursor: (PITCH_LENGTH / 2.0, PITCH_WIDTH / 2.0),
            markers: Vec::new(),
            marker_selected: 0,
            marker_team: TeamSide::Klr,
            marker_bench: false,
        }
    }

    pub fn tag_event_kind(&self) -> EventKind {
        EventKind::ALL[self.tag_event % EventKind::ALL.len()]
    }

    pub fn move_cursor(&mut self, dx: f64, dy: f64) {
        self.cursor.0 = (self.cursor.0 + dx).clamp(0.0, PITCH_LENGTH);
        self.cursor.1 = (self.cursor.1 + dy).clamp(0.0, PITCH_WIDTH);
    }

    pub fn drop_marker(&mut self) {
        self.markers.push(PendingMarker {
            x_pct: self.cursor.0,
            y_pct: self.cursor.1,
            player_id: None,
        });
        self.marker_selected = self.markers.len() - 1;
    }

    pub fn remove_selected_marker(&mut self) {
        if self.marker_selected < self.markers.len() {
            self.markers.remove(self.marker_selected);
        }
        self.marker_selected = self.marker_selected.min(self.markers.len().saturating_sub(1));
    }

    pub fn select_marker(&mut self, delta: i64) {
        self.marker_selected = cycle_index(self.marker_selected, delta, self.markers.len());
    }

    /// Steps the selected marker through "(skip)" and the roster.
    pub fn cycle_marker_player(&mut self, roster: &[&Player], delta: i64) {
        let Some(marker) = self.markers.get_mut(self.marker_selected) else {
            return;
        };
        let current = marker
            .player_id
            .and_then(|id| roster.iter().position(|p| p.player_id == id))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let next = cycle_index(current, delta, roster.len() + 1);
        marker.player_id = if next == 0 {
            None
        } else {
            Some(roster[next - 1].player_id)
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncField {
    Path,
    Kind,
    LegacyDir,
    ExportPath,
}

impl SyncField {
    pub const ALL: [SyncField; 4] = [
        SyncField::Path,
        SyncField::Kind,
        SyncField::LegacyDir,
        SyncField::ExportPath,
    ];
}

#[derive(Debug, Clone)]
pub struct ImportPreview {
    pub kind: ImportKind,
    pub source: String,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone)]
pub struct SyncState {
    pub field: SyncField,
    pub path: String,
    pub kind: ImportKind,
    pub legacy_dir: String,
    pub export_path: String,
    pub preview: Option<ImportPreview>,
    pub message: Option<String>,
}

impl SyncState {
    fn new() -> Self {
        Self {
            field: SyncField::Path,
            path: String::new(),
            kind: ImportKind::GmsPlayers,
            legacy_dir: String::new(),
            export_path: String::new(),
            preview: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPanel {
    Fixture,
    Roster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureField {
    Team,
    Opposition,
    Venue,
    Ground,
    Date,
    Kickoff,
}

impl FixtureField {
    pub const ALL: [FixtureField; 6] = [
        FixtureField::Team,
        FixtureField::Opposition,
        FixtureField::Venue,
        FixtureField::Ground,
        FixtureField::Date,
        FixtureField::Kickoff,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FixtureField::Team => "Team",
            FixtureField::Opposition => "Opposition",
            FixtureField::Venue => "Venue",
            FixtureField::Ground => "Ground address",
            FixtureField::Date => "Date (YYYY-MM-DD)",
            FixtureField::Kickoff => "Kickoff (HH:MM)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureForm {
    pub team: String,
    pub opposition: String,
    pub venue: Venue,
    pub ground: String,
    pub date: String,
    pub kickoff: String,
}

impl FixtureForm {
    pub fn defaults() -> Self {
        Self {
            team: DEFAULT_TEAM.to_string(),
            opposition: DEFAULT_OPPOSITION.to_string(),
            venue: Venue::Home,
            ground: DEFAULT_GROUND.to_string(),
            date: String::new(),
            kickoff: String::new(),
        }
    }

    pub fn from_fixture(f: &Fixture) -> Self {
        Self {
            team: f.team.clone(),
            opposition: f.opposition.clone(),
            venue: f.venue,
            ground: f.ground_address.clone(),
            date: f.date_label(),
            kickoff: f.kickoff_label(),
        }
    }

    pub fn value(&self, field: FixtureField) -> String {
        match field {
            FixtureField::Team => self.team.clone(),
            FixtureField::Opposition => self.opposition.clone(),
            FixtureField::Venue => self.venue.label().to_string(),
            FixtureField::Ground => self.ground.clone(),
            FixtureField::Date => self.date.clone(),
            FixtureField::Kickoff => self.kickoff.clone(),
        }
    }

    pub fn set(&mut self, field: FixtureField, value: String) {
        match field {
            FixtureField::Team => self.team = value,
            FixtureField::Opposition => self.opposition = value,
            FixtureField::Venue => self.venue = Venue::parse(&value),
            FixtureField::Ground => self.ground = value,
            FixtureField::Date => self.date = value,
            FixtureField::Kickoff => self.kickoff = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterColumn {
    Id,
    FirstName,
    LastName,
    Shirt,
    Status,
    InjuryNotes,
    RfuId,
    FrontRow,
    Concussions,
}

impl RosterColumn {
    pub const ALL: [RosterColumn; 9] = [
        RosterColumn::Id,
        RosterColumn::FirstName,
        RosterColumn::LastName,
        RosterColumn::Shirt,
        RosterColumn::Status,
        RosterColumn::InjuryNotes,
        RosterColumn::RfuId,
        RosterColumn::FrontRow,
        RosterColumn::Concussions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RosterColumn::Id => "ID",
            RosterColumn::FirstName => "First",
            RosterColumn::LastName => "Last",
            RosterColumn::Shirt => "Shirt",
            RosterColumn::Status => "Status",
            RosterColumn::InjuryNotes => "Injury notes",
            RosterColumn::RfuId => "RFU ID",
            RosterColumn::FrontRow => "Front row",
            RosterColumn::Concussions => "Concussions",
        }
    }

    /// Toggle-style columns change in place instead of opening the editor.
    pub fn is_toggle(self) -> bool {
        matches!(self, RosterColumn::Status | RosterColumn::FrontRow)
    }

    pub fn cell(self, p: &Player) -> String {
        match self {
            RosterColumn::Id => p.player_id.to_string(),
            RosterColumn::FirstName => p.first_name.clone(),
            RosterColumn::LastName => p.last_name.clone(),
            RosterColumn::Shirt => p.shirt_number.map(|n| n.to_string()).unwrap_or_default(),
            RosterColumn::Status => p.status.as_str().to_string(),
            RosterColumn::InjuryNotes => p.injury_notes.clone(),
            RosterColumn::RfuId => p.rfu_id.clone().unwrap_or_default(),
            RosterColumn::FrontRow => if p.front_row_trained { "Yes" } else { "No" }.to_string(),
            RosterColumn::Concussions => p.suspected_concussions.to_string(),
        }
    }

    /// Writes an edited cell back. Numeric cells reject text that does not
    /// parse; empty shirt numbers clear the field.
    pub fn apply(self, p: &mut Player, raw: &str) -> Result<(), String> {
        let value = raw.trim();
        match self {
            RosterColumn::Id => {
                p.player_id = value
                    .parse::<i64>()
                    .map_err(|_| format!("player id must be a whole number, got {value:?}"))?;
            }
            RosterColumn::FirstName => p.first_name = value.to_string(),
            RosterColumn::LastName => p.last_name = value.to_string(),
            RosterColumn::Shirt => {
                p.shirt_number = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse::<u32>()
                            .map_err(|_| format!("shirt number must be a number, got {value:?}"))?,
                    )
                };
            }
            RosterColumn::Status => p.status = PlayerStatus::parse(value),
            RosterColumn::InjuryNotes => p.injury_notes = value.to_string(),
            RosterColumn::RfuId => {
                p.rfu_id = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            RosterColumn::FrontRow => p.front_row_trained = parse_bool_lenient(value),
            RosterColumn::Concussions => {
                p.suspected_concussions = if value.is_empty() {
                    0
                } else {
                    value
                        .parse::<u32>()
                        .map_err(|_| format!("concussions must be a number, got {value:?}"))?
                };
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SettingsState {
    pub panel: SettingsPanel,
    pub fixture_field: FixtureField,
    pub form: FixtureForm,
    pub form_loaded: bool,
    pub roster: Vec<Player>,
    pub roster_dirty: bool,
    pub roster_row: usize,
    pub roster_col: usize,
}

impl SettingsState {
    fn new() -> Self {
        Self {
            panel: SettingsPanel::Fixture,
            fixture_field: FixtureField::Team,
            form: FixtureForm::defaults(),
            form_loaded: false,
            roster: Vec::new(),
            roster_dirty: false,
            roster_row: 0,
            roster_col: 1,
        }
    }

    pub fn roster_column(&self) -> RosterColumn {
        RosterColumn::ALL[self.roster_col % RosterColumn::ALL.len()]
    }

    pub fn add_roster_row(&mut self) {
        let next_id = self
            .roster
            .iter()
            .map(|p| p.player_id)
            .max()
            .unwrap_or(0)
            + 1;
        self.roster.push(Player::new(next_id, "", ""));
        self.roster_row = self.roster.len() - 1;
        self.roster_dirty = true;
    }

    pub fn delete_roster_row(&mut self) {
        if self.roster_row < self.roster.len() {
            self.roster.remove(self.roster_row);
            self.roster_dirty = true;
        }
        self.roster_row = self.roster_row.min(self.roster.len().saturating_sub(1));
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub page: Page,
    pub input: Option<TextInput>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub timeline: Timeline,
    pub selection: SelectionState,
    pub analysis: AnalysisState,
    pub tracking: TrackingState,
    pub sync: SyncState,
    pub settings: SettingsState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            page: Page::Dashboard,
            input: None,
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            help_overlay: false,
            timeline: Timeline::new(),
            selection: SelectionState::new(),
            analysis: AnalysisState::new(),
            tracking: TrackingState::new(),
            sync: SyncState::new(),
            settings: SettingsState::new(),
        }
    }

    /// Appends a console line. Lines tagged `[WARN]` also go to the log file
    /// at warn level.
    pub fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if msg.starts_with("[WARN]") {
            log::warn!("{msg}");
        } else {
            log::info!("{msg}");
        }
        self.logs.push_back(msg);
        while self.logs.len() > LOG_CAPACITY {
            self.logs.pop_front();
        }
    }

    pub fn begin_input(&mut self, target: InputTarget, initial: impl Into<String>) {
        self.input = Some(TextInput {
            target,
            buffer: initial.into(),
        });
    }

    pub fn next_page(&mut self) {
        self.page = Page::from_index(self.page.index() + 1);
    }

    pub fn prev_page(&mut self) {
        self.page = Page::from_index(self.page.index() + Page::ALL.len() - 1);
    }

    /// Re-syncs cursors, bounds and unsaved-form mirrors after the snapshot
    /// changed.
    pub fn on_snapshot(&mut self, snap: &HubSnapshot) {
        let (lo, hi) = time_bounds(&snap.tracking, &snap.events, ACTIVE_FIXTURE_ID);
        self.timeline.set_bounds(lo, hi);

        let active = snap.active_fixture();
        if !self.selection.dirty {
            self.selection.chosen = active
                .map(|f| f.selected_player_ids.clone())
                .unwrap_or_default();
        }
        self.selection.availability_cursor =
            clamp_cursor(self.selection.availability_cursor, snap.availability.len());
        self.selection.squad_cursor = clamp_cursor(self.selection.squad_cursor, snap.players.len());

        self.analysis.player_cursor = clamp_cursor(self.analysis.player_cursor, snap.players.len());
        self.tracking.tag_player = self.tracking.tag_player.min(snap.players.len());

        if !self.settings.form_loaded {
            if let Some(f) = active {
                self.settings.form = FixtureForm::from_fixture(f);
            }
            self.settings.form_loaded = true;
        }
        if !self.settings.roster_dirty {
            self.settings.roster = snap.players.clone();
        }
        self.settings.roster_row = clamp_cursor(self.settings.roster_row, self.settings.roster.len());
    }

    /// The analysis picker lists the roster in stored order.
    pub fn analysis_player<'a>(&self, snap: &'a HubSnapshot) -> Option<&'a Player> {
        snap.players.get(self.analysis.player_cursor)
    }

    pub fn squad_player<'a>(&self, snap: &'a HubSnapshot) -> Option<&'a Player> {
        roster_by_last_name(&snap.players)
            .get(self.selection.squad_cursor)
            .copied()
    }

    /// `None` means the event is tagged to the team.
    pub fn tag_player_id(&self, snap: &HubSnapshot) -> Option<i64> {
        if self.tracking.tag_player == 0 {
            return None;
        }
        snap.players
            .get(self.tracking.tag_player - 1)
            .map(|p| p.player_id)
    }
}

pub fn cycle_index(current: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    ((current as i64 + delta).rem_euclid(len)) as usize
}

pub fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use crossterm::event::{KeyCode, KeyEvent};
use rusqlite::Connection;

use crate::cache::HubData;
use crate::config::Config;
use crate::export;
use crate::importers;
use crate::legacy;
use crate::model::{
    ACTIVE_FIXTURE_ID, AnalysisScore, Availability, DATE_FORMAT, Event, EventKind, Fixture,
    KICKOFF_FORMAT, Player, TrackingPoint,
};
use crate::state::{
    AnalysisField, AppState, FixtureField, ImportPreview, InputTarget, RosterColumn,
    SelectionPanel, SettingsPanel, SyncField, TagField, TextInput, TrackingMode, TrackingPanel,
    TrackingState, clamp_cursor, cycle_index,
};
use crate::store;
use crate::timeline::Ticker;
use crate::views::{Page, availability_rows};

const CURSOR_STEP: f64 = 1.0;
const CURSOR_JUMP: f64 = 5.0;

pub struct App {
    pub data: HubData,
    pub state: AppState,
    pub config: Config,
    pub should_quit: bool,
    playback: Ticker,
}

impl App {
    pub fn new(data: HubData, config: Config) -> Self {
        let mut state = AppState::new();
        state.sync.legacy_dir = config.data_dir.display().to_string();
        state.sync.export_path = config.export_path.display().to_string();
        let playback = Ticker::new(config.playback_base, Instant::now());
        let mut app = Self {
            data,
            state,
            config,
            should_quit: false,
            playback,
        };
        app.refresh();
        app.sync_playback(Instant::now());
        app
    }

    /// Reloads the snapshot if a write made it stale and re-syncs the forms.
    pub fn refresh(&mut self) {
        match self.data.refresh() {
            Ok(true) => {
                let snap = self.data.snapshot();
                self.state.on_snapshot(snap);
            }
            Ok(false) => {}
            Err(err) => self
                .state
                .push_log(format!("[WARN] Reload from store failed: {err:#}")),
        }
    }

    pub fn playback_interval(&self) -> Duration {
        self.state
            .timeline
            .speed()
            .tick_interval(self.config.playback_base)
    }

    /// Time until the next playback step, or `None` while paused.
    pub fn playback_remaining(&self, now: Instant) -> Option<Duration> {
        if self.state.timeline.is_playing() {
            Some(self.playback.remaining(now))
        } else {
            None
        }
    }

    /// Advances the timeline if playing and the tick interval has elapsed.
    pub fn poll_playback(&mut self, now: Instant) -> bool {
        if !self.state.timeline.is_playing() {
            return false;
        }
        if !self.playback.poll(now) {
            return false;
        }
        self.state.timeline.tick()
    }

    fn sync_playback(&mut self, now: Instant) {
        let interval = self.playback_interval();
        self.playback.set_interval(interval);
        self.playback.reset(now);
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if self.state.input.is_some() {
            self.on_input_key(key);
            self.refresh();
            return;
        }
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char(c @ '1'..='6') => {
                self.state.page = Page::from_index(c as usize - '1' as usize);
            }
            KeyCode::Char(']') => self.state.next_page(),
            KeyCode::Char('[') => self.state.prev_page(),
            _ => match self.state.page {
                Page::Dashboard => {}
                Page::Selection => self.on_selection_key(key),
                Page::Analysis => self.on_analysis_key(key),
                Page::Tracking => self.on_tracking_key(key),
                Page::DataSync => self.on_sync_key(key),
                Page::Settings => self.on_settings_key(key),
            },
        }
        self.refresh();
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.input = None,
            KeyCode::Enter => {
                if let Some(input) = self.state.input.take() {
                    self.commit_input(input);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.state.input.as_mut() {
                    input.buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.state.input.as_mut() {
                    input.buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn commit_input(&mut self, input: TextInput) {
        let value = input.buffer;
        match input.target {
            InputTarget::AvailabilityReason { player_id } => {
                self.update_availability(player_id, |row| row.reason = value.trim().to_string());
            }
            InputTarget::AnalysisNotes => self.state.analysis.notes = value,
            InputTarget::EventNotes => self.state.tracking.tag_notes = value,
            InputTarget::EventTime => match value.trim().parse::<i64>() {
                Ok(t) => self.state.tracking.tag_time = t.max(0),
                Err(_) => self
                    .state
                    .push_log(format!("[WARN] Event time must be whole seconds, got {value:?}")),
            },
            InputTarget::ScrubTime => match value.trim().parse::<i64>() {
                Ok(t) => self.state.timeline.scrub(t),
                Err(_) => self
                    .state
                    .push_log(format!("[WARN] Timeline time must be whole seconds, got {value:?}")),
            },
            InputTarget::VideoUrl => self.save_video_url(value.trim()),
            InputTarget::ImportPath => {
                self.state.sync.path = value.trim().to_string();
                self.state.sync.preview = None;
            }
            InputTarget::LegacyDir => self.state.sync.legacy_dir = value.trim().to_string(),
            InputTarget::ExportPath => self.state.sync.export_path = value.trim().to_string(),
            InputTarget::Fixture(field) => self.state.settings.form.set(field, value.trim().to_string()),
            InputTarget::RosterCell { row, col } => {
                let Some(player) = self.state.settings.roster.get_mut(row) else {
                    return;
                };
                match col.apply(player, &value) {
                    Ok(()) => self.state.settings.roster_dirty = true,
                    Err(msg) => self.state.push_log(format!("[WARN] {msg}")),
                }
            }
        }
    }

    fn write<T>(&mut self, what: &str, f: impl FnOnce(&mut Connection) -> Result<T>) -> Option<T> {
        match self.data.write(f) {
            Ok(out) => Some(out),
            Err(err) => {
                self.state.push_log(format!("[WARN] {what} failed: {err:#}"));
                None
            }
        }
    }

    // Selection & Availability

    fn on_selection_key(&mut self, key: KeyEvent) {
        let sel = &mut self.state.selection;
        match key.code {
            KeyCode::Tab => {
                sel.panel = match sel.panel {
                    SelectionPanel::Availability => SelectionPanel::Squad,
                    SelectionPanel::Squad => SelectionPanel::Availability,
                };
                return;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_cursor(1);
                return;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_cursor(-1);
                return;
            }
            _ => {}
        }
        match self.state.selection.panel {
            SelectionPanel::Availability => self.on_availability_key(key),
            SelectionPanel::Squad => self.on_squad_key(key),
        }
    }

    fn move_selection_cursor(&mut self, delta: i64) {
        let snap = self.data.snapshot();
        let sel = &mut self.state.selection;
        match sel.panel {
            SelectionPanel::Availability => {
                let len = snap.availability.len();
                sel.availability_cursor = step_cursor(sel.availability_cursor, delta, len);
            }
            SelectionPanel::Squad => {
                let len = snap.players.len();
                sel.squad_cursor = step_cursor(sel.squad_cursor, delta, len);
            }
        }
    }

    fn on_availability_key(&mut self, key: KeyEvent) {
        let current = availability_rows(self.data.snapshot())
            .into_iter()
            .nth(self.state.selection.availability_cursor);
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let Some(row) = current else {
                    return;
                };
                self.update_availability(row.player_id, |a| a.available = !a.available);
            }
            KeyCode::Char('e') => {
                let Some(row) = current else {
                    return;
                };
                self.state.begin_input(
                    InputTarget::AvailabilityReason {
                        player_id: row.player_id,
                    },
                    row.reason,
                );
            }
            KeyCode::Char('f') => self.fill_availability(),
            _ => {}
        }
    }

    fn update_availability(&mut self, player_id: i64, edit: impl FnOnce(&mut Availability)) {
        let mut rows = self.data.snapshot().availability.clone();
        let Some(row) = rows.iter_mut().find(|a| a.player_id == player_id) else {
            return;
        };
        edit(row);
        let label = if row.available {
            "available".to_string()
        } else if row.reason.is_empty() {
            "unavailable".to_string()
        } else {
            format!("unavailable ({})", row.reason)
        };
        if self
            .write("Availability update", |conn| {
                store::replace_availability(conn, &rows)
            })
            .is_some()
        {
            self.state
                .push_log(format!("[INFO] Player {player_id} marked {label}"));
        }
    }

    /// Adds an "available" row for every roster player without one.
    fn fill_availability(&mut self) {
        let snap = self.data.snapshot();
        let mut rows = snap.availability.clone();
        let missing = snap
            .players
            .iter()
            .filter(|p| !rows.iter().any(|a| a.player_id == p.player_id))
            .map(|p| Availability {
                player_id: p.player_id,
                available: true,
                reason: String::new(),
            })
            .collect::<Vec<_>>();
        if missing.is_empty() {
            self.state
                .push_log("[INFO] Every player already has an availability row");
            return;
        }
        let added = missing.len();
        rows.extend(missing);
        if self
            .write("Availability fill", |conn| {
                store::replace_availability(conn, &rows)
            })
            .is_some()
        {
            self.state
                .push_log(format!("[INFO] Added {added} availability rows"));
        }
    }

    fn on_squad_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let Some(pid) = self
                    .state
                    .squad_player(self.data.snapshot())
                    .map(|p| p.player_id)
                else {
                    return;
                };
                self.state.selection.toggle(pid);
            }
            KeyCode::Char('c') => {
                self.state.selection.chosen.clear();
                self.state.selection.dirty = true;
            }
            KeyCode::Char('r') => {
                self.state.selection.dirty = false;
                self.state.selection.chosen = self
                    .data
                    .snapshot()
                    .active_fixture()
                    .map(|f| f.selected_player_ids.clone())
                    .unwrap_or_default();
            }
            KeyCode::Char('s') => self.save_selection(),
            _ => {}
        }
    }

    fn save_selection(&mut self) {
        if self.data.snapshot().active_fixture().is_none() {
            self.state
                .push_log("[WARN] No fixtures yet. Add one in Settings");
            return;
        }
        let chosen = self.state.selection.chosen.clone();
        if self
            .write("Selection save", |conn| {
                store::save_selection(conn, ACTIVE_FIXTURE_ID, &chosen)
            })
            .is_some()
        {
            self.state.selection.dirty = false;
            self.state
                .push_log(format!("[INFO] Saved squad of {} players", chosen.len()));
        }
    }

    // Player Analysis (GAME)

    fn on_analysis_key(&mut self, key: KeyEvent) {
        let roster_len = self.data.snapshot().players.len();
        let form = &mut self.state.analysis;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                form.field = next_of(&AnalysisField::ALL, form.field, 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                form.field = next_of(&AnalysisField::ALL, form.field, -1);
            }
            KeyCode::Char('h') | KeyCode::Left => form.adjust(-1, roster_len),
            KeyCode::Char('l') | KeyCode::Right => form.adjust(1, roster_len),
            KeyCode::Enter if form.field == AnalysisField::Notes => {
                let notes = form.notes.clone();
                self.state.begin_input(InputTarget::AnalysisNotes, notes);
            }
            KeyCode::Char('s') => self.save_rating(),
            _ => {}
        }
    }

    fn save_rating(&mut self) {
        let Some(player) = self.state.analysis_player(self.data.snapshot()).cloned() else {
            self.state
                .push_log("[WARN] No players yet. Import or add players first");
            return;
        };
        let form = &self.state.analysis;
        let score = AnalysisScore {
            fixture_id: form.fixture_id.max(1),
            player_id: player.player_id,
            go_forward: form.ratings[0],
            attitude: form.ratings[1],
            mighty_defence: form.ratings[2],
            energy: form.ratings[3],
            notes: form.notes.trim().to_string(),
        };
        if self
            .write("Rating save", |conn| store::append_analysis_score(conn, &score))
            .is_some()
        {
            self.state.analysis.notes.clear();
            self.state.push_log(format!(
                "[INFO] Saved GAME rating for {} (fixture {})",
                player.display_name(),
                score.fixture_id
            ));
        }
    }

    // Video & Tracking

    fn on_tracking_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => {
                self.state.tracking.panel = self.state.tracking.panel.next();
                return;
            }
            KeyCode::Char('v') => {
                self.state.tracking.mode = match self.state.tracking.mode {
                    TrackingMode::List => TrackingMode::Pitch,
                    TrackingMode::Pitch => TrackingMode::List,
                };
                return;
            }
            KeyCode::Char('u') => {
                let current = self
                    .data
                    .snapshot()
                    .active_fixture()
                    .and_then(|f| f.video_url.clone())
                    .unwrap_or_default();
                self.state.begin_input(InputTarget::VideoUrl, current);
                return;
            }
            _ => {}
        }
        match self.state.tracking.panel {
            TrackingPanel::Timeline => self.on_timeline_key(key),
            TrackingPanel::Tagging => self.on_tagging_key(key),
            TrackingPanel::Markers => self.on_markers_key(key),
        }
    }

    fn on_timeline_key(&mut self, key: KeyEvent) {
        let timeline = &mut self.state.timeline;
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => timeline.step(-1),
            KeyCode::Char('l') | KeyCode::Right => timeline.step(1),
            KeyCode::Char('H') => timeline.step(-10),
            KeyCode::Char('L') => timeline.step(10),
            KeyCode::Char('g') | KeyCode::Home => timeline.rewind(),
            KeyCode::Char('G') | KeyCode::End => timeline.seek_end(),
            KeyCode::Char(' ') => {
                timeline.toggle_play();
                self.sync_playback(Instant::now());
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                timeline.set_speed(timeline.speed().next());
                self.sync_playback(Instant::now());
            }
            KeyCode::Char('-') => {
                timeline.set_speed(timeline.speed().prev());
                self.sync_playback(Instant::now());
            }
            KeyCode::Char('t') => {
                let cursor = timeline.cursor().to_string();
                self.state.begin_input(InputTarget::ScrubTime, cursor);
            }
            _ => {}
        }
    }

    fn on_tagging_key(&mut self, key: KeyEvent) {
        let roster_len = self.data.snapshot().players.len();
        let cursor = self.state.timeline.cursor();
        let tag = &mut self.state.tracking;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                tag.tag_field = next_of(&TagField::ALL, tag.tag_field, 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                tag.tag_field = next_of(&TagField::ALL, tag.tag_field, -1);
            }
            KeyCode::Char('h') | KeyCode::Left => adjust_tag(tag, -1, roster_len),
            KeyCode::Char('l') | KeyCode::Right => adjust_tag(tag, 1, roster_len),
            KeyCode::Char('c') => tag.tag_time = cursor.max(0),
            KeyCode::Enter => match tag.tag_field {
                TagField::Time => {
                    let current = tag.tag_time.to_string();
                    self.state.begin_input(InputTarget::EventTime, current);
                }
                TagField::Notes => {
                    let current = tag.tag_notes.clone();
                    self.state.begin_input(InputTarget::EventNotes, current);
                }
                _ => {}
            },
            KeyCode::Char('s') => self.save_event(),
            _ => {}
        }
    }

    fn save_event(&mut self) {
        let player_id = self.state.tag_player_id(self.data.snapshot());
        let tag = &self.state.tracking;
        let event = Event {
            fixture_id: ACTIVE_FIXTURE_ID,
            time_s: tag.tag_time.max(0),
            kind: tag.tag_event_kind(),
            player_id,
            notes: tag.tag_notes.trim().to_string(),
        };
        if self
            .write("Event save", |conn| store::append_event(conn, &event))
            .is_some()
        {
            self.state.tracking.tag_notes.clear();
            self.state.push_log(format!(
                "[INFO] Tagged {} at {}s",
                event.kind.label(),
                event.time_s
            ));
        }
    }

    fn on_markers_key(&mut self, key: KeyEvent) {
        let tracking = &mut self.state.tracking;
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => tracking.move_cursor(-CURSOR_STEP, 0.0),
            KeyCode::Char('l') | KeyCode::Right => tracking.move_cursor(CURSOR_STEP, 0.0),
            KeyCode::Char('k') | KeyCode::Up => tracking.move_cursor(0.0, CURSOR_STEP),
            KeyCode::Char('j') | KeyCode::Down => tracking.move_cursor(0.0, -CURSOR_STEP),
            KeyCode::Char('H') => tracking.move_cursor(-CURSOR_JUMP, 0.0),
            KeyCode::Char('L') => tracking.move_cursor(CURSOR_JUMP, 0.0),
            KeyCode::Char('K') => tracking.move_cursor(0.0, CURSOR_JUMP),
            KeyCode::Char('J') => tracking.move_cursor(0.0, -CURSOR_JUMP),
            KeyCode::Char('m') | KeyCode::Enter => tracking.drop_marker(),
            KeyCode::Char(',') => tracking.select_marker(-1),
            KeyCode::Char('.') => tracking.select_marker(1),
            KeyCode::Char('x') | KeyCode::Delete => tracking.remove_selected_marker(),
            KeyCode::Char('t') => tracking.marker_team = tracking.marker_team.toggle(),
            KeyCode::Char('b') => tracking.marker_bench = !tracking.marker_bench,
            KeyCode::Char('p') | KeyCode::Char('P') => {
                let delta = if key.code == KeyCode::Char('p') { 1 } else { -1 };
                let roster = self.data.snapshot().players.iter().collect::<Vec<_>>();
                self.state.tracking.cycle_marker_player(&roster, delta);
            }
            KeyCode::Char('s') => self.save_markers(),
            _ => {}
        }
    }

    fn save_markers(&mut self) {
        let time_s = self.state.timeline.cursor();
        let tracking = &self.state.tracking;
        let points = tracking
            .markers
            .iter()
            .filter_map(|m| {
                Some(TrackingPoint {
                    fixture_id: ACTIVE_FIXTURE_ID,
                    time_s,
                    player_id: m.player_id?,
                    x_pct: round2(m.x_pct),
                    y_pct: round2(m.y_pct),
                    team: tracking.marker_team,
                    bench: tracking.marker_bench,
                })
            })
            .collect::<Vec<_>>();
        if points.is_empty() {
            self.state
                .push_log("[WARN] Map at least one marker to a player before saving");
            return;
        }
        if self
            .write("Tracking save", |conn| store::append_tracking_points(conn, &points))
            .is_some()
        {
            self.state.tracking.markers.clear();
            self.state.tracking.marker_selected = 0;
            self.state.push_log(format!(
                "[INFO] Saved {} tracking points at {time_s}s",
                points.len()
            ));
        }
    }

    fn save_video_url(&mut self, url: &str) {
        if self.data.snapshot().active_fixture().is_none() {
            self.state
                .push_log("[WARN] No fixtures yet. Add one in Settings");
            return;
        }
        let value = if url.is_empty() { None } else { Some(url) };
        if self
            .write("Video link save", |conn| {
                store::save_video_url(conn, ACTIVE_FIXTURE_ID, value)
            })
            .is_some()
        {
            self.state.push_log("[INFO] Video link saved");
        }
    }

    // Data Sync

    fn on_sync_key(&mut self, key: KeyEvent) {
        let sync = &mut self.state.sync;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => sync.field = next_of(&SyncField::ALL, sync.field, 1),
            KeyCode::Char('k') | KeyCode::Up => sync.field = next_of(&SyncField::ALL, sync.field, -1),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('l') | KeyCode::Right
                if sync.field == SyncField::Kind =>
            {
                sync.kind = sync.kind.next();
                sync.preview = None;
            }
            KeyCode::Enter => match sync.field {
                SyncField::Path => {
                    let current = sync.path.clone();
                    self.state.begin_input(InputTarget::ImportPath, current);
                }
                SyncField::Kind => {
                    sync.kind = sync.kind.next();
                    sync.preview = None;
                }
                SyncField::LegacyDir => {
                    let current = sync.legacy_dir.clone();
                    self.state.begin_input(InputTarget::LegacyDir, current);
                }
                SyncField::ExportPath => {
                    let current = sync.export_path.clone();
                    self.state.begin_input(InputTarget::ExportPath, current);
                }
            },
            KeyCode::Char('p') => self.preview_import(),
            KeyCode::Char('c') => self.commit_import(),
            KeyCode::Char('m') => self.migrate_legacy(),
            KeyCode::Char('x') => self.export_workbook(),
            _ => {}
        }
    }

    fn set_sync_message(&mut self, msg: String) {
        self.state.push_log(msg.clone());
        self.state.sync.message = Some(msg);
    }

    pub fn preview_import(&mut self) {
        let path = self.state.sync.path.trim().to_string();
        if path.is_empty() {
            self.set_sync_message("[WARN] Enter a file path to import".to_string());
            return;
        }
        let kind = self.state.sync.kind;
        let parsed = self
            .data
            .read(store::next_player_id)
            .and_then(|first_id| importers::import_players(&PathBuf::from(&path), kind, first_id));
        match parsed {
            Ok(players) => {
                let count = players.len();
                self.state.sync.preview = Some(ImportPreview {
                    kind,
                    source: path,
                    players,
                });
                self.set_sync_message(format!(
                    "[INFO] Parsed {count} players ({}). Press c to commit",
                    kind.label()
                ));
            }
            Err(err) => {
                self.state.sync.preview = None;
                self.set_sync_message(format!("[WARN] Import failed: {err:#}"));
            }
        }
    }

    /// Appends the previewed players, renumbered from the store's next id so
    /// ids stay unique even if the roster changed since the preview.
    pub fn commit_import(&mut self) {
        let Some(preview) = self.state.sync.preview.take() else {
            self.set_sync_message("[WARN] Nothing to commit. Preview a file first".to_string());
            return;
        };
        let committed = self.write("Import commit", |conn| {
            let first_id = store::next_player_id(conn)?;
            let players = preview
                .players
                .iter()
                .enumerate()
                .map(|(idx, p)| Player {
                    player_id: first_id + idx as i64,
                    ..p.clone()
                })
                .collect::<Vec<_>>();
            store::append_players(conn, &players)?;
            Ok(players.len())
        });
        match committed {
            Some(count) => self.set_sync_message(format!(
                "[INFO] Imported {count} players from {}",
                preview.source
            )),
            None => self.state.sync.preview = Some(preview),
        }
    }

    pub fn migrate_legacy(&mut self) {
        let dir = PathBuf::from(self.state.sync.legacy_dir.trim());
        if !dir.is_dir() {
            self.set_sync_message(format!(
                "[WARN] Legacy data dir {} not found",
                dir.display()
            ));
            return;
        }
        if let Some(summary) = self.write("Legacy migration", |conn| {
            legacy::migrate_data_dir(&dir, conn)
        }) {
            self.set_sync_message(format!(
                "[INFO] Migrated {} rows from {} ({} skipped)",
                summary.total(),
                dir.display(),
                summary.skipped.len()
            ));
        }
    }

    pub fn export_workbook(&mut self) {
        let path = PathBuf::from(self.state.sync.export_path.trim());
        match export::export_workbook(&path, self.data.snapshot()) {
            Ok(report) => self.set_sync_message(format!(
                "[INFO] Exported {} players, {} ratings, {} events to {}",
                report.players,
                report.ratings,
                report.events,
                path.display()
            )),
            Err(err) => self.set_sync_message(format!("[WARN] Export failed: {err:#}")),
        }
    }

    // Settings

    fn on_settings_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Tab {
            let settings = &mut self.state.settings;
            settings.panel = match settings.panel {
                SettingsPanel::Fixture => SettingsPanel::Roster,
                SettingsPanel::Roster => SettingsPanel::Fixture,
            };
            return;
        }
        match self.state.settings.panel {
            SettingsPanel::Fixture => self.on_fixture_form_key(key),
            SettingsPanel::Roster => self.on_roster_key(key),
        }
    }

    fn on_fixture_form_key(&mut self, key: KeyEvent) {
        let settings = &mut self.state.settings;
        let field = settings.fixture_field;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                settings.fixture_field = next_of(&FixtureField::ALL, field, 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                settings.fixture_field = next_of(&FixtureField::ALL, field, -1);
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter
                if field == FixtureField::Venue =>
            {
                settings.form.venue = settings.form.venue.next();
            }
            KeyCode::Enter => {
                let current = settings.form.value(field);
                self.state.begin_input(InputTarget::Fixture(field), current);
            }
            KeyCode::Char('s') => self.save_fixture(),
            _ => {}
        }
    }

    pub fn save_fixture(&mut self) {
        let form = self.state.settings.form.clone();
        let date = match parse_optional(&form.date, |raw| NaiveDate::parse_from_str(raw, DATE_FORMAT)) {
            Ok(date) => date,
            Err(()) => {
                self.state
                    .push_log(format!("[WARN] Date must be YYYY-MM-DD, got {:?}", form.date));
                return;
            }
        };
        let kickoff = match parse_optional(&form.kickoff, |raw| {
            NaiveTime::parse_from_str(raw, KICKOFF_FORMAT)
        }) {
            Ok(kickoff) => kickoff,
            Err(()) => {
                self.state
                    .push_log(format!("[WARN] Kickoff must be HH:MM, got {:?}", form.kickoff));
                return;
            }
        };
        let video_url = self
            .data
            .snapshot()
            .active_fixture()
            .and_then(|f| f.video_url.clone());
        let fixture = Fixture {
            fixture_id: ACTIVE_FIXTURE_ID,
            team: form.team.trim().to_string(),
            opposition: form.opposition.trim().to_string(),
            venue: form.venue,
            ground_address: form.ground.trim().to_string(),
            date,
            kickoff,
            selected_player_ids: Vec::new(),
            video_url,
        };
        if self
            .write("Fixture save", |conn| store::upsert_fixture(conn, &fixture))
            .is_some()
        {
            self.state.selection.dirty = false;
            self.state
                .push_log(format!("[INFO] Saved fixture: {}", fixture.headline()));
        }
    }

    fn on_roster_key(&mut self, key: KeyEvent) {
        let settings = &mut self.state.settings;
        let rows = settings.roster.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                settings.roster_row = step_cursor(settings.roster_row, 1, rows);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                settings.roster_row = step_cursor(settings.roster_row, -1, rows);
            }
            KeyCode::Char('h') | KeyCode::Left => {
                settings.roster_col = settings.roster_col.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                settings.roster_col = (settings.roster_col + 1).min(RosterColumn::ALL.len() - 1);
            }
            KeyCode::Enter => {
                let row = settings.roster_row;
                let col = settings.roster_column();
                let Some(player) = settings.roster.get_mut(row) else {
                    return;
                };
                if col.is_toggle() {
                    match col {
                        RosterColumn::Status => player.status = player.status.next(),
                        _ => player.front_row_trained = !player.front_row_trained,
                    }
                    settings.roster_dirty = true;
                } else {
                    let current = col.cell(player);
                    self.state
                        .begin_input(InputTarget::RosterCell { row, col }, current);
                }
            }
            KeyCode::Char('a') => settings.add_roster_row(),
            KeyCode::Char('d') => settings.delete_roster_row(),
            KeyCode::Char('r') => {
                settings.roster_dirty = false;
                settings.roster = self.data.snapshot().players.clone();
                settings.roster_row = clamp_cursor(settings.roster_row, settings.roster.len());
            }
            KeyCode::Char('s') => self.save_roster(),
            _ => {}
        }
    }

    pub fn save_roster(&mut self) {
        let roster = self.state.settings.roster.clone();
        if self
            .write("Roster save", |conn| store::replace_players(conn, &roster))
            .is_some()
        {
            self.state.settings.roster_dirty = false;
            self.state
                .push_log(format!("[INFO] Saved roster of {} players", roster.len()));
        }
    }
}

fn adjust_tag(tag: &mut TrackingState, delta: i64, roster_len: usize) {
    match tag.tag_field {
        TagField::Player => tag.tag_player = cycle_index(tag.tag_player, delta, roster_len + 1),
        TagField::Event => {
            tag.tag_event = cycle_index(tag.tag_event, delta, EventKind::ALL.len());
        }
        TagField::Time => tag.tag_time = (tag.tag_time + delta).max(0),
        TagField::Notes => {}
    }
}

fn next_of<T: Copy + PartialEq>(all: &[T], current: T, delta: i64) -> T {
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    all[cycle_index(idx, delta, all.len())]
}

fn step_cursor(cursor: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = (cursor as i64 + delta).clamp(0, len as i64 - 1);
    next as usize
}

/// Empty input is `None`; anything else must parse.
fn parse_optional<T, E>(raw: &str, parse: impl FnOnce(&str) -> Result<T, E>) -> Result<Option<T>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse(trimmed).map(Some).map_err(|_| ())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Migration from the flat CSV layout (`data/players.csv` and friends) into
//! the sqlite store.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::importers::{RawSheet, parse_bool_lenient, parse_csv_str, parse_int_lenient};
use crate::model::{
    AnalysisScore, Availability, DATE_FORMAT, Event, EventKind, Fixture, KICKOFF_FORMAT, Player,
    PlayerStatus, TeamSide, TrackingPoint, Venue, clamp_rating,
};
use crate::store;

pub const PLAYERS_CSV: &str = "players.csv";
pub const FIXTURES_CSV: &str = "fixtures.csv";
pub const AVAILABILITY_CSV: &str = "availability.csv";
pub const ANALYSIS_CSV: &str = "analysis_scores.csv";
pub const TRACKING_CSV: &str = "tracking.csv";
pub const EVENTS_CSV: &str = "events.csv";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub players: usize,
    pub fixtures: usize,
    pub availability: usize,
    pub analysis: usize,
    pub tracking: usize,
    pub events: usize,
    pub skipped: Vec<String>,
}

impl MigrationSummary {
    pub fn total(&self) -> usize {
        self.players + self.fixtures + self.availability + self.analysis + self.tracking + self.events
    }
}

/// Parses a comma-joined id list. Entries that are not plain digits are
/// skipped one by one.
pub fn parse_selected_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

/// Replaces players, fixtures and availability; appends the three logs.
/// Missing files count as empty tables. Every file is read and parsed before
/// anything is written, and all writes share one transaction, so a failure
/// leaves the store as it was.
pub fn migrate_data_dir(dir: &Path, conn: &mut Connection) -> Result<MigrationSummary> {
    let mut summary = MigrationSummary::default();
    let skipped = &mut summary.skipped;

    let players = read_optional(&dir.join(PLAYERS_CSV))?
        .map(|sheet| players_from_sheet(&sheet, skipped));
    let fixtures = read_optional(&dir.join(FIXTURES_CSV))?
        .map(|sheet| fixtures_from_sheet(&sheet, skipped))
        .unwrap_or_default();
    let availability = read_optional(&dir.join(AVAILABILITY_CSV))?
        .map(|sheet| availability_from_sheet(&sheet, skipped));
    let analysis = read_optional(&dir.join(ANALYSIS_CSV))?
        .map(|sheet| analysis_from_sheet(&sheet, skipped))
        .unwrap_or_default();
    let tracking = read_optional(&dir.join(TRACKING_CSV))?
        .map(|sheet| tracking_from_sheet(&sheet, skipped))
        .unwrap_or_default();
    let events = read_optional(&dir.join(EVENTS_CSV))?
        .map(|sheet| events_from_sheet(&sheet, skipped))
        .unwrap_or_default();

    let tx = conn.transaction().context("begin legacy migration")?;
    if let Some(players) = &players {
        store::replace_players_in(&tx, players)?;
        summary.players = players.len();
    }
    for fixture in &fixtures {
        store::upsert_fixture_in(&tx, fixture)?;
    }
    summary.fixtures = fixtures.len();
    if let Some(rows) = &availability {
        store::replace_availability_in(&tx, rows)?;
        summary.availability = rows.len();
    }
    for row in &analysis {
        store::append_analysis_score(&tx, row)?;
    }
    summary.analysis = analysis.len();
    store::append_tracking_points_in(&tx, &tracking)?;
    summary.tracking = tracking.len();
    for row in &events {
        store::append_event(&tx, row)?;
    }
    summary.events = events.len();
    tx.commit().context("commit legacy migration")?;

    log::info!(
        "legacy migration from {}: {} rows, {} skipped",
        dir.display(),
        summary.total(),
        summary.skipped.len()
    );
    Ok(summary)
}

fn read_optional(path: &Path) -> Result<Option<RawSheet>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read legacy file {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_csv_str(&raw)
        .with_context(|| format!("parse legacy file {}", path.display()))
        .map(Some)
}

struct Columns<'a> {
    sheet: &'a RawSheet,
}

impl<'a> Columns<'a> {
    fn get<'r>(&self, row: &'r [String], name: &str) -> Option<&'r str> {
        let col = self.sheet.column(&[name]);
        RawSheet::cell(row, col).filter(|v| !v.eq_ignore_ascii_case("nan"))
    }

    fn text(&self, row: &[String], name: &str) -> String {
        self.get(row, name).unwrap_or_default().to_string()
    }

    fn int(&self, row: &[String], name: &str) -> Option<i64> {
        self.get(row, name).and_then(parse_int_lenient)
    }

    fn float(&self, row: &[String], name: &str) -> Option<f64> {
        self.get(row, name).and_then(|v| v.parse::<f64>().ok())
    }

    fn flag(&self, row: &[String], name: &str) -> bool {
        self.get(row, name).map(parse_bool_lenient).unwrap_or(false)
    }
}

fn players_from_sheet(sheet: &RawSheet, skipped: &mut Vec<String>) -> Vec<Player> {
    let cols = Columns { sheet };
    let mut out = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        let Some(player_id) = cols.int(row, "player_id") else {
            skipped.push(format!("{PLAYERS_CSV} row {}: no player_id", idx + 2));
            continue;
        };
        out.push(Player {
            player_id,
            first_name: cols.text(row, "first_name"),
            last_name: cols.text(row, "last_name"),
            status: PlayerStatus::parse(&cols.text(row, "status")),
            injury_notes: cols.text(row, "injury_notes"),
            shirt_number: cols
                .int(row, "shirt_number")
                .and_then(|n| u32::try_from(n).ok()),
            rfu_id: cols.get(row, "rfu_id").map(str::to_string),
            front_row_trained: cols.flag(row, "front_row_trained"),
            suspected_concussions: cols
                .int(row, "suspected_concussions")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
        });
    }
    out
}

fn fixtures_from_sheet(sheet: &RawSheet, skipped: &mut Vec<String>) -> Vec<Fixture> {
    let cols = Columns { sheet };
    let mut out = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        let Some(fixture_id) = cols.int(row, "fixture_id") else {
            skipped.push(format!("{FIXTURES_CSV} row {}: no fixture_id", idx + 2));
            continue;
        };
        out.push(Fixture {
            fixture_id,
            team: cols.text(row, "team"),
            opposition: cols.text(row, "opposition"),
            venue: Venue::parse(&cols.text(row, "venue")),
            ground_address: cols.text(row, "ground_address"),
            date: cols
                .get(row, "date")
                .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()),
            kickoff: cols
                .get(row, "kickoff")
                .and_then(|t| NaiveTime::parse_from_str(t, KICKOFF_FORMAT).ok()),
            selected_player_ids: parse_selected_ids(&cols.text(row, "selected_player_ids")),
            video_url: cols.get(row, "video_url").map(str::to_string),
        });
    }
    out
}

fn availability_from_sheet(sheet: &RawSheet, skipped: &mut Vec<String>) -> Vec<Availability> {
    let cols = Columns { sheet };
    let mut out = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        let Some(player_id) = cols.int(row, "player_id") else {
            skipped.push(format!("{AVAILABILITY_CSV} row {}: no player_id", idx + 2));
            continue;
        };
        out.push(Availability {
            player_id,
            available: cols.flag(row, "available"),
            reason: cols.text(row, "reason"),
        });
    }
    out
}

fn analysis_from_sheet(sheet: &RawSheet, skipped: &mut Vec<String>) -> Vec<AnalysisScore> {
    let cols = Columns { sheet };
    let mut out = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        let Some(player_id) = cols.int(row, "player_id") else {
            skipped.push(format!("{ANALYSIS_CSV} row {}: no player_id", idx + 2));
            continue;
        };
        let rating = |name: &str| clamp_rating(cols.int(row, name).unwrap_or(5));
        out.push(AnalysisScore {
            fixture_id: cols.int(row, "fixture_id").unwrap_or(1),
            player_id,
            go_forward: rating("go_forward"),
            attitude: rating("attitude"),
            mighty_defence: rating("mighty_defence"),
            energy: rating("energy"),
            notes: cols.text(row, "notes"),
        });
    }
    out
}

fn tracking_from_sheet(sheet: &RawSheet, skipped: &mut Vec<String>) -> Vec<TrackingPoint> {
    let cols = Columns { sheet };
    let mut out = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        let (Some(time_s), Some(player_id), Some(x_pct), Some(y_pct)) = (
            cols.int(row, "time_s"),
            cols.int(row, "player_id"),
            cols.float(row, "x_pct"),
            cols.float(row, "y_pct"),
        ) else {
            skipped.push(format!("{TRACKING_CSV} row {}: incomplete point", idx + 2));
            continue;
        };
        out.push(TrackingPoint {
            fixture_id: cols.int(row, "fixture_id").unwrap_or(1),
            time_s,
            player_id,
            x_pct,
            y_pct,
            team: TeamSide::parse(&cols.text(row, "team")),
            bench: cols.flag(row, "bench"),
        });
    }
    out
}

fn events_from_sheet(sheet: &RawSheet, skipped: &mut Vec<String>) -> Vec<Event> {
    let cols = Columns { sheet };
    let mut out = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        let Some(kind) = cols.get(row, "event").and_then(EventKind::parse) else {
            skipped.push(format!("{EVENTS_CSV} row {}: unknown event", idx + 2));
            continue;
        };
        let Some(time_s) = cols.int(row, "time_s") else {
            skipped.push(format!("{EVENTS_CSV} row {}: no time_s", idx + 2));
            continue;
        };
        out.push(Event {
            fixture_id: cols.int(row, "fixture_id").unwrap_or(1),
            time_s,
            kind,
            player_id: cols.int(row, "player_id"),
            notes: cols.text(row, "notes"),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::parse_selected_ids;

    #[test]
    fn selected_ids_skip_malformed_entries() {
        assert_eq!(parse_selected_ids("1, 2,x,3"), vec![1, 2, 3]);
        assert_eq!(parse_selected_ids("4.0,5"), vec![5]);
        assert!(parse_selected_ids("").is_empty());
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::model::{
    AnalysisScore, Availability, DATE_FORMAT, Event, EventKind, Fixture, KICKOFF_FORMAT, Player,
    PlayerStatus, TeamSide, TrackingPoint, Venue,
};

const DATA_DIR: &str = "coaching_hub";
const DB_FILE: &str = "hub.sqlite";

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            status TEXT NOT NULL,
            injury_notes TEXT NOT NULL,
            shirt_number INTEGER NULL,
            rfu_id TEXT NULL,
            front_row_trained INTEGER NOT NULL,
            suspected_concussions INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fixtures (
            fixture_id INTEGER PRIMARY KEY,
            team TEXT NOT NULL,
            opposition TEXT NOT NULL,
            venue TEXT NOT NULL,
            ground_address TEXT NOT NULL,
            date TEXT NULL,
            kickoff TEXT NULL,
            video_url TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS fixture_selections (
            fixture_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            PRIMARY KEY (fixture_id, position)
        );

        CREATE TABLE IF NOT EXISTS availability (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL,
            available INTEGER NOT NULL,
            reason TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS analysis_scores (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            fixture_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            go_forward INTEGER NOT NULL,
            attitude INTEGER NOT NULL,
            mighty_defence INTEGER NOT NULL,
            energy INTEGER NOT NULL,
            notes TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_analysis_player ON analysis_scores(player_id);

        CREATE TABLE IF NOT EXISTS tracking (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            fixture_id INTEGER NOT NULL,
            time_s INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            x_pct REAL NOT NULL,
            y_pct REAL NOT NULL,
            team TEXT NOT NULL,
            bench INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tracking_time ON tracking(fixture_id, time_s);

        CREATE TABLE IF NOT EXISTS events (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            fixture_id INTEGER NOT NULL,
            time_s INTEGER NOT NULL,
            event TEXT NOT NULL,
            player_id INTEGER NULL,
            notes TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_time ON events(fixture_id, time_s);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn load_players(conn: &Connection) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                player_id, first_name, last_name, status, injury_notes,
                shirt_number, rfu_id, front_row_trained, suspected_concussions
            FROM players
            ORDER BY player_id ASC
            "#,
        )
        .context("prepare load players query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Player {
                player_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                status: PlayerStatus::parse(&row.get::<_, String>(3)?),
                injury_notes: row.get(4)?,
                shirt_number: row.get(5)?,
                rfu_id: row.get(6)?,
                front_row_trained: row.get::<_, i64>(7)? != 0,
                suspected_concussions: row.get(8)?,
            })
        })
        .context("query load players")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player row")?);
    }
    Ok(out)
}

/// Full-table replace used by the roster bulk editor.
pub fn replace_players(conn: &mut Connection, players: &[Player]) -> Result<()> {
    let tx = conn.transaction().context("begin replace players")?;
    replace_players_in(&tx, players)?;
    tx.commit().context("commit replace players")?;
    Ok(())
}

pub fn replace_players_in(tx: &Transaction<'_>, players: &[Player]) -> Result<()> {
    tx.execute("DELETE FROM players", [])
        .context("clear players")?;
    for player in players {
        insert_player(tx, player)?;
    }
    Ok(())
}

pub fn append_players(conn: &mut Connection, players: &[Player]) -> Result<()> {
    let tx = conn.transaction().context("begin append players")?;
    for player in players {
        insert_player(&tx, player)?;
    }
    tx.commit().context("commit append players")?;
    Ok(())
}

pub fn next_player_id(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(player_id), 0) + 1 FROM players",
        [],
        |row| row.get(0),
    )
    .context("query next player id")
}

fn insert_player(tx: &Transaction<'_>, p: &Player) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO players (
            player_id, first_name, last_name, status, injury_notes,
            shirt_number, rfu_id, front_row_trained, suspected_concussions
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            p.player_id,
            p.first_name,
            p.last_name,
            p.status.as_str(),
            p.injury_notes,
            p.shirt_number,
            p.rfu_id,
            bool_to_i64(p.front_row_trained),
            p.suspected_concussions,
        ],
    )
    .with_context(|| format!("insert player {}", p.player_id))?;
    Ok(())
}

pub fn load_fixtures(conn: &Connection) -> Result<Vec<Fixture>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                fixture_id, team, opposition, venue, ground_address,
                date, kickoff, video_url
            FROM fixtures
            ORDER BY fixture_id ASC
            "#,
        )
        .context("prepare load fixtures query")?;

    let rows = stmt
        .query_map([], |row| {
            let date: Option<String> = row.get(5)?;
            let kickoff: Option<String> = row.get(6)?;
            Ok(Fixture {
                fixture_id: row.get(0)?,
                team: row.get(1)?,
                opposition: row.get(2)?,
                venue: Venue::parse(&row.get::<_, String>(3)?),
                ground_address: row.get(4)?,
                date: date.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
                kickoff: kickoff.and_then(|t| NaiveTime::parse_from_str(&t, KICKOFF_FORMAT).ok()),
                selected_player_ids: Vec::new(),
                video_url: row.get(7)?,
            })
        })
        .context("query load fixtures")?;

    let mut out = Vec::new();
    for row in rows {
        let mut fixture = row.context("decode fixture row")?;
        fixture.selected_player_ids = load_selection(conn, fixture.fixture_id)?;
        out.push(fixture);
    }
    Ok(out)
}

pub fn load_fixture(conn: &Connection, fixture_id: i64) -> Result<Option<Fixture>> {
    let found = conn
        .query_row(
            "SELECT fixture_id FROM fixtures WHERE fixture_id = ?1",
            params![fixture_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("query fixture")?;
    if found.is_none() {
        return Ok(None);
    }
    Ok(load_fixtures(conn)?
        .into_iter()
        .find(|f| f.fixture_id == fixture_id))
}

fn load_selection(conn: &Connection, fixture_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT player_id FROM fixture_selections WHERE fixture_id = ?1 ORDER BY position ASC",
        )
        .context("prepare load selection query")?;
    let rows = stmt
        .query_map(params![fixture_id], |row| row.get::<_, i64>(0))
        .context("query load selection")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode selection row")?);
    }
    Ok(out)
}

/// Inserts or replaces the fixture row together with its selection.
pub fn upsert_fixture(conn: &mut Connection, f: &Fixture) -> Result<()> {
    let tx = conn.transaction().context("begin fixture upsert")?;
    upsert_fixture_in(&tx, f)?;
    tx.commit().context("commit fixture upsert")?;
    Ok(())
}

pub fn upsert_fixture_in(tx: &Transaction<'_>, f: &Fixture) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO fixtures (
            fixture_id, team, opposition, venue, ground_address, date, kickoff, video_url
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(fixture_id) DO UPDATE SET
            team = excluded.team,
            opposition = excluded.opposition,
            venue = excluded.venue,
            ground_address = excluded.ground_address,
            date = excluded.date,
            kickoff = excluded.kickoff,
            video_url = excluded.video_url
        "#,
        params![
            f.fixture_id,
            f.team,
            f.opposition,
            f.venue.label(),
            f.ground_address,
            f.date.map(|d| d.format(DATE_FORMAT).to_string()),
            f.kickoff.map(|t| t.format(KICKOFF_FORMAT).to_string()),
            f.video_url,
        ],
    )
    .with_context(|| format!("upsert fixture {}", f.fixture_id))?;
    write_selection(tx, f.fixture_id, &f.selected_player_ids)
}

pub fn save_selection(conn: &mut Connection, fixture_id: i64, player_ids: &[i64]) -> Result<()> {
    let tx = conn.transaction().context("begin selection save")?;
    write_selection(&tx, fixture_id, player_ids)?;
    tx.commit().context("commit selection save")?;
    Ok(())
}

pub fn save_video_url(conn: &Connection, fixture_id: i64, url: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE fixtures SET video_url = ?2 WHERE fixture_id = ?1",
        params![fixture_id, url],
    )
    .context("update fixture video url")?;
    Ok(())
}

fn write_selection(tx: &Transaction<'_>, fixture_id: i64, player_ids: &[i64]) -> Result<()> {
    tx.execute(
        "DELETE FROM fixture_selections WHERE fixture_id = ?1",
        params![fixture_id],
    )
    .context("clear fixture selection")?;
    for (position, player_id) in player_ids.iter().enumerate() {
        tx.execute(
            "INSERT INTO fixture_selections (fixture_id, position, player_id) VALUES (?1, ?2, ?3)",
            params![fixture_id, position as i64, player_id],
        )
        .context("insert fixture selection")?;
    }
    Ok(())
}

pub fn load_availability(conn: &Connection) -> Result<Vec<Availability>> {
    let mut stmt = conn
        .prepare("SELECT player_id, available, reason FROM availability ORDER BY row_id ASC")
        .context("prepare load availability query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Availability {
                player_id: row.get(0)?,
                available: row.get::<_, i64>(1)? != 0,
                reason: row.get(2)?,
            })
        })
        .context("query load availability")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode availability row")?);
    }
    Ok(out)
}

pub fn replace_availability(conn: &mut Connection, rows: &[Availability]) -> Result<()> {
    let tx = conn.transaction().context("begin replace availability")?;
    replace_availability_in(&tx, rows)?;
    tx.commit().context("commit replace availability")?;
    Ok(())
}

pub fn replace_availability_in(tx: &Transaction<'_>, rows: &[Availability]) -> Result<()> {
    tx.execute("DELETE FROM availability", [])
        .context("clear availability")?;
    for row in rows {
        tx.execute(
            "INSERT INTO availability (player_id, available, reason) VALUES (?1, ?2, ?3)",
            params![row.player_id, bool_to_i64(row.available), row.reason],
        )
        .with_context(|| format!("insert availability for player {}", row.player_id))?;
    }
    Ok(())
}

pub fn load_analysis_scores(conn: &Connection) -> Result<Vec<AnalysisScore>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT fixture_id, player_id, go_forward, attitude, mighty_defence, energy, notes
            FROM analysis_scores
            ORDER BY row_id ASC
            "#,
        )
        .context("prepare load analysis query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AnalysisScore {
                fixture_id: row.get(0)?,
                player_id: row.get(1)?,
                go_forward: row.get(2)?,
                attitude: row.get(3)?,
                mighty_defence: row.get(4)?,
                energy: row.get(5)?,
                notes: row.get(6)?,
            })
        })
        .context("query load analysis")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode analysis row")?);
    }
    Ok(out)
}

pub fn append_analysis_score(conn: &Connection, s: &AnalysisScore) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO analysis_scores (
            fixture_id, player_id, go_forward, attitude, mighty_defence, energy, notes, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            s.fixture_id,
            s.player_id,
            s.go_forward,
            s.attitude,
            s.mighty_defence,
            s.energy,
            s.notes,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert analysis score")?;
    Ok(())
}

pub fn load_tracking(conn: &Connection) -> Result<Vec<TrackingPoint>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT fixture_id, time_s, player_id, x_pct, y_pct, team, bench
            FROM tracking
            ORDER BY row_id ASC
            "#,
        )
        .context("prepare load tracking query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TrackingPoint {
                fixture_id: row.get(0)?,
                time_s: row.get(1)?,
                player_id: row.get(2)?,
                x_pct: row.get(3)?,
                y_pct: row.get(4)?,
                team: TeamSide::parse(&row.get::<_, String>(5)?),
                bench: row.get::<_, i64>(6)? != 0,
            })
        })
        .context("query load tracking")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode tracking row")?);
    }
    Ok(out)
}

pub fn append_tracking_points(conn: &mut Connection, points: &[TrackingPoint]) -> Result<()> {
    let tx = conn.transaction().context("begin tracking append")?;
    append_tracking_points_in(&tx, points)?;
    tx.commit().context("commit tracking append")?;
    Ok(())
}

pub fn append_tracking_points_in(tx: &Transaction<'_>, points: &[TrackingPoint]) -> Result<()> {
    for p in points {
        tx.execute(
            r#"
            INSERT INTO tracking (fixture_id, time_s, player_id, x_pct, y_pct, team, bench)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                p.fixture_id,
                p.time_s,
                p.player_id,
                p.x_pct,
                p.y_pct,
                p.team.label(),
                bool_to_i64(p.bench),
            ],
        )
        .context("insert tracking point")?;
    }
    Ok(())
}

pub fn load_events(conn: &Connection) -> Result<Vec<Event>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT fixture_id, time_s, event, player_id, notes
            FROM events
            ORDER BY row_id ASC
            "#,
        )
        .context("prepare load events query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .context("query load events")?;
    let mut out = Vec::new();
    for row in rows {
        let (fixture_id, time_s, label, player_id, notes) = row.context("decode event row")?;
        let Some(kind) = EventKind::parse(&label) else {
            log::warn!("skipping event with unknown type {label:?} at {time_s}s");
            continue;
        };
        out.push(Event {
            fixture_id,
            time_s,
            kind,
            player_id,
            notes,
        });
    }
    Ok(out)
}

pub fn append_event(conn: &Connection, e: &Event) -> Result<()> {
    conn.execute(
        "INSERT INTO events (fixture_id, time_s, event, player_id, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![e.fixture_id, e.time_s, e.kind.label(), e.player_id, e.notes],
    )
    .context("insert event")?;
    Ok(())
}

fn bool_to_i64(value: bool) -> i64 {
    if value { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_player_id_starts_at_one() {
        let conn = open_in_memory().expect("db");
        assert_eq!(next_player_id(&conn).expect("id"), 1);
        let mut conn = conn;
        append_players(&mut conn, &[Player::new(7, "A", "B")]).expect("append");
        assert_eq!(next_player_id(&conn).expect("id"), 8);
    }

    #[test]
    fn replace_players_rejects_duplicate_ids() {
        let mut conn = open_in_memory().expect("db");
        replace_players(&mut conn, &[Player::new(1, "A", "One")]).expect("seed");
        let err = replace_players(
            &mut conn,
            &[Player::new(2, "B", "Two"), Player::new(2, "C", "Three")],
        );
        assert!(err.is_err());
        // The failed transaction leaves the previous roster in place.
        let players = load_players(&conn).expect("load");
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].last_name, "One");
    }
}

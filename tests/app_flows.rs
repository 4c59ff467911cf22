use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::LevelFilter;

use coaching_hub::app::App;
use coaching_hub::cache::HubData;
use coaching_hub::config::Config;
use coaching_hub::model::{Availability, EventKind, Fixture, Player, Venue};
use coaching_hub::persist::{SessionFile, load_session_file, save_session_file};
use coaching_hub::state::{AppState, LOG_CAPACITY};
use coaching_hub::store;
use coaching_hub::timeline::PlaybackSpeed;
use coaching_hub::views::Page;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_path(name: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("coaching_hub_flow_{}_{n}_{name}", std::process::id()))
}

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn test_config() -> Config {
    Config {
        db_path: PathBuf::from(":memory:"),
        data_dir: fixture_path("legacy"),
        export_path: temp_path("export.xlsx"),
        playback_base: Duration::from_millis(400),
        log_file: temp_path("hub.log"),
        log_level: LevelFilter::Off,
    }
}

fn roster() -> Vec<Player> {
    let mut tom = Player::new(1, "Tom", "Hartley");
    tom.shirt_number = Some(9);
    let sam = Player::new(2, "Sam", "Birkett");
    vec![tom, sam]
}

fn kendal() -> Fixture {
    Fixture {
        fixture_id: 1,
        team: "KLRUFC U17 Colts".to_string(),
        opposition: "Kendal".to_string(),
        venue: Venue::Away,
        ground_address: "Mint Bridge".to_string(),
        date: None,
        kickoff: None,
        selected_player_ids: Vec::new(),
        video_url: Some("https://video.example/1".to_string()),
    }
}

fn empty_app() -> App {
    let conn = store::open_in_memory().unwrap();
    App::new(HubData::new(conn), test_config())
}

fn seeded_app() -> App {
    let mut conn = store::open_in_memory().unwrap();
    store::append_players(&mut conn, &roster()).unwrap();
    store::upsert_fixture(&mut conn, &kendal()).unwrap();
    App::new(HubData::new(conn), test_config())
}

fn press(app: &mut App, code: KeyCode) {
    app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn keys(app: &mut App, chars: &str) {
    for c in chars.chars() {
        press(app, KeyCode::Char(c));
    }
}

/// Opens the editor with Enter, replaces its contents and commits.
fn edit(app: &mut App, value: &str) {
    press(app, KeyCode::Enter);
    let len = app.state.input.as_ref().map(|i| i.buffer.len()).unwrap_or(0);
    for _ in 0..len {
        press(app, KeyCode::Backspace);
    }
    keys(app, value);
    press(app, KeyCode::Enter);
}

fn last_log(app: &App) -> &str {
    app.state.logs.back().map(String::as_str).unwrap_or("")
}

#[test]
fn settings_form_creates_the_fixture() {
    let mut app = empty_app();
    keys(&mut app, "6");
    assert_eq!(app.state.page, Page::Settings);

    keys(&mut app, "j");
    edit(&mut app, "Kendal");
    keys(&mut app, "j");
    press(&mut app, KeyCode::Enter);
    keys(&mut app, "jj");
    edit(&mut app, "2025-09-14");
    keys(&mut app, "j");
    edit(&mut app, "10:30");
    keys(&mut app, "s");

    let fixture = app.data.snapshot().active_fixture().cloned().expect("fixture saved");
    assert_eq!(fixture.team, "KLRUFC U17 Colts");
    assert_eq!(fixture.opposition, "Kendal");
    assert_eq!(fixture.venue, Venue::Away);
    assert_eq!(fixture.ground_address, "Underley Park, Kirkby Lonsdale");
    assert_eq!(fixture.date_label(), "2025-09-14");
    assert_eq!(fixture.kickoff_label(), "10:30");
    assert!(last_log(&app).starts_with("[INFO] Saved fixture: KLRUFC U17 Colts vs Kendal"));
}

#[test]
fn bad_fixture_date_is_rejected() {
    let mut app = empty_app();
    app.state.settings.form.date = "14/09/2025".to_string();
    app.save_fixture();
    assert!(last_log(&app).starts_with("[WARN] Date must be YYYY-MM-DD"));
    assert!(app.data.snapshot().fixtures.is_empty());
}

#[test]
fn saving_the_fixture_keeps_video_and_clears_selection() {
    let mut app = seeded_app();
    app.data
        .write(|conn| store::save_selection(conn, 1, &[1, 2]))
        .unwrap();
    app.refresh();
    assert_eq!(app.state.selection.chosen, vec![1, 2]);
    app.save_fixture();
    app.refresh();

    let fixture = app.data.snapshot().active_fixture().cloned().unwrap();
    assert_eq!(fixture.video_url.as_deref(), Some("https://video.example/1"));
    assert!(fixture.selected_player_ids.is_empty());
    assert!(app.state.selection.chosen.is_empty());
}

#[test]
fn squad_picks_save_in_pick_order() {
    let mut app = seeded_app();
    keys(&mut app, "2");
    press(&mut app, KeyCode::Tab);
    // Squad list is ordered by last name: Birkett then Hartley.
    keys(&mut app, " j ");
    assert!(app.state.selection.dirty);
    keys(&mut app, "s");

    assert_eq!(
        app.data.snapshot().active_fixture().unwrap().selected_player_ids,
        vec![2, 1]
    );
    assert!(!app.state.selection.dirty);
    assert_eq!(app.state.selection.chosen, vec![2, 1]);
}

#[test]
fn squad_save_without_fixture_warns() {
    let mut conn = store::open_in_memory().unwrap();
    store::append_players(&mut conn, &roster()).unwrap();
    let mut app = App::new(HubData::new(conn), test_config());
    keys(&mut app, "2");
    press(&mut app, KeyCode::Tab);
    keys(&mut app, " s");
    assert_eq!(last_log(&app), "[WARN] No fixtures yet. Add one in Settings");
}

#[test]
fn availability_toggle_and_fill() {
    let mut conn = store::open_in_memory().unwrap();
    store::append_players(&mut conn, &roster()).unwrap();
    store::replace_availability(
        &mut conn,
        &[Availability {
            player_id: 1,
            available: true,
            reason: String::new(),
        }],
    )
    .unwrap();
    let mut app = App::new(HubData::new(conn), test_config());
    keys(&mut app, "2");

    keys(&mut app, " ");
    assert!(!app.data.snapshot().availability[0].available);
    assert_eq!(last_log(&app), "[INFO] Player 1 marked unavailable");

    keys(&mut app, "e");
    keys(&mut app, "Cup tie");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.data.snapshot().availability[0].reason, "Cup tie");

    keys(&mut app, "f");
    let rows = &app.data.snapshot().availability;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].player_id, 2);
    assert!(rows[1].available);
}

#[test]
fn game_rating_appends_each_save() {
    let mut app = seeded_app();
    keys(&mut app, "3");
    keys(&mut app, "jjll");
    keys(&mut app, "s");
    keys(&mut app, "s");

    let scores = &app.data.snapshot().analysis;
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].player_id, 1);
    assert_eq!(scores[0].go_forward, 7);
    assert_eq!(scores[0].attitude, 5);
    assert_eq!(scores[0].fixture_id, 1);
}

#[test]
fn rating_ratchets_at_the_scale_ends() {
    let mut app = seeded_app();
    keys(&mut app, "3");
    keys(&mut app, "jjj");
    keys(&mut app, "llllllllll");
    assert_eq!(app.state.analysis.ratings[1], 9);
    keys(&mut app, "hhhhhhhhhhhh");
    assert_eq!(app.state.analysis.ratings[1], 1);
}

#[test]
fn rating_without_players_warns() {
    let mut app = empty_app();
    keys(&mut app, "3s");
    assert!(last_log(&app).starts_with("[WARN] No players yet"));
    assert!(app.data.snapshot().analysis.is_empty());
}

#[test]
fn tagging_a_player_event_at_a_time() {
    let mut app = seeded_app();
    keys(&mut app, "4");
    press(&mut app, KeyCode::Tab);
    keys(&mut app, "l");
    keys(&mut app, "j");
    keys(&mut app, "lllllll");
    assert_eq!(app.state.tracking.tag_event_kind(), EventKind::Pass);
    keys(&mut app, "j");
    edit(&mut app, "42");
    keys(&mut app, "s");

    let events = &app.data.snapshot().events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Pass);
    assert_eq!(events[0].time_s, 42);
    assert_eq!(events[0].player_id, Some(1));
    assert_eq!(app.state.timeline.bounds(), (42, 42));
}

#[test]
fn team_events_have_no_player() {
    let mut app = seeded_app();
    keys(&mut app, "4");
    press(&mut app, KeyCode::Tab);
    keys(&mut app, "s");
    let events = &app.data.snapshot().events;
    assert_eq!(events[0].player_id, None);
    assert_eq!(events[0].kind, EventKind::Carry);
}

#[test]
fn markers_save_rounded_and_skip_unmapped() {
    let mut app = seeded_app();
    keys(&mut app, "4");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    keys(&mut app, "s");
    assert_eq!(last_log(&app), "[WARN] Map at least one marker to a player before saving");

    app.state.tracking.cursor = (12.3456, 6.781);
    keys(&mut app, "mp");
    keys(&mut app, "Lm");
    keys(&mut app, "b");
    app.state.timeline.scrub(30);
    keys(&mut app, "s");

    let tracking = &app.data.snapshot().tracking;
    assert_eq!(tracking.len(), 1);
    let point = &tracking[0];
    assert_eq!(point.player_id, 1);
    assert_eq!(point.time_s, 30);
    assert_eq!(point.x_pct, 12.35);
    assert_eq!(point.y_pct, 6.78);
    assert!(point.bench);
    assert!(app.state.tracking.markers.is_empty());
}

#[test]
fn video_link_is_saved_to_the_fixture() {
    let mut app = seeded_app();
    keys(&mut app, "4u");
    let len = app.state.input.as_ref().map(|i| i.buffer.len()).unwrap_or(0);
    for _ in 0..len {
        press(&mut app, KeyCode::Backspace);
    }
    keys(&mut app, "https://video.example/2");
    press(&mut app, KeyCode::Enter);
    assert_eq!(
        app.data.snapshot().active_fixture().unwrap().video_url.as_deref(),
        Some("https://video.example/2")
    );
}

#[test]
fn import_preview_then_commit_appends_fresh_ids() {
    let mut app = seeded_app();
    keys(&mut app, "5c");
    assert!(last_log(&app).starts_with("[WARN] Nothing to commit"));

    app.state.sync.path = fixture_path("gms_players.csv").display().to_string();
    keys(&mut app, "p");
    let preview = app.state.sync.preview.as_ref().expect("preview");
    assert_eq!(preview.players.len(), 3);
    assert_eq!(preview.players[0].player_id, 3);

    keys(&mut app, "c");
    let ids = app
        .data
        .snapshot()
        .players
        .iter()
        .map(|p| p.player_id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(app.state.sync.preview.is_none());
    assert_eq!(
        app.state.sync.message.as_deref(),
        Some(format!("[INFO] Imported 3 players from {}", app.state.sync.path).as_str())
    );
}

#[test]
fn import_of_a_missing_file_reports_failure() {
    let mut app = seeded_app();
    app.state.sync.path = temp_path("missing.csv").display().to_string();
    app.preview_import();
    assert!(app.state.sync.preview.is_none());
    assert!(last_log(&app).starts_with("[WARN] Import failed"));
}

#[test]
fn legacy_migration_from_the_sync_page() {
    let mut app = empty_app();
    keys(&mut app, "5m");
    let snap = app.data.snapshot();
    assert_eq!(snap.players.len(), 3);
    assert_eq!(snap.events.len(), 2);
    assert_eq!(app.state.selection.chosen, vec![1, 2, 3]);
    assert!(last_log(&app).contains("(2 skipped)"));

    app.state.sync.legacy_dir = temp_path("nowhere").display().to_string();
    app.migrate_legacy();
    assert!(last_log(&app).starts_with("[WARN] Legacy data dir"));
}

#[test]
fn export_writes_the_workbook() {
    let mut app = seeded_app();
    let path = temp_path("hub.xlsx");
    app.state.sync.export_path = path.display().to_string();
    keys(&mut app, "5x");
    assert!(path.exists());
    assert!(last_log(&app).starts_with("[INFO] Exported 2 players"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn roster_grid_adds_and_saves_a_player() {
    let mut app = seeded_app();
    keys(&mut app, "6");
    press(&mut app, KeyCode::Tab);
    keys(&mut app, "a");
    edit(&mut app, "Ella");
    keys(&mut app, "l");
    edit(&mut app, "Dawson");
    keys(&mut app, "ll");
    press(&mut app, KeyCode::Enter);
    assert!(app.state.settings.roster_dirty);
    keys(&mut app, "s");

    let players = &app.data.snapshot().players;
    assert_eq!(players.len(), 3);
    assert_eq!(players[2].player_id, 3);
    assert_eq!(players[2].display_name(), "Ella Dawson");
    assert_eq!(players[2].status.as_str(), "injured");
    assert!(!app.state.settings.roster_dirty);
}

#[test]
fn roster_cell_rejects_bad_numbers() {
    let mut app = seeded_app();
    keys(&mut app, "6");
    press(&mut app, KeyCode::Tab);
    keys(&mut app, "ll");
    edit(&mut app, "ten");
    assert!(last_log(&app).starts_with("[WARN] shirt number must be a number"));
    assert_eq!(app.state.settings.roster[0].shirt_number, Some(9));
    assert!(!app.state.settings.roster_dirty);
}

#[test]
fn help_overlay_swallows_keys() {
    let mut app = seeded_app();
    keys(&mut app, "?3");
    assert!(app.state.help_overlay);
    assert_eq!(app.state.page, Page::Dashboard);
    press(&mut app, KeyCode::Esc);
    keys(&mut app, "]]");
    assert_eq!(app.state.page, Page::Analysis);
    keys(&mut app, "q");
    assert!(app.should_quit);
}

#[test]
fn playback_ticks_follow_the_interval() {
    let mut app = seeded_app();
    keys(&mut app, "4");
    assert_eq!(app.playback_remaining(std::time::Instant::now()), None);
    keys(&mut app, " ");
    assert!(app.state.timeline.is_playing());
    keys(&mut app, "+");
    assert_eq!(app.playback_interval(), Duration::from_millis(200));

    let later = std::time::Instant::now() + Duration::from_millis(250);
    assert!(app.poll_playback(later));
    assert_eq!(app.state.timeline.cursor(), 1);
}

#[test]
fn session_file_round_trips() {
    let mut state = AppState::new();
    state.page = Page::Tracking;
    state.timeline.scrub(30);
    state.timeline.set_speed(PlaybackSpeed::Double);
    state.analysis.fixture_id = 2;

    let path = temp_path("session.json");
    save_session_file(&path, &SessionFile::capture(&state)).unwrap();
    let loaded = load_session_file(&path).expect("session file");
    let _ = std::fs::remove_file(&path);

    let mut restored = AppState::new();
    loaded.apply(&mut restored);
    assert_eq!(restored.page, Page::Tracking);
    assert_eq!(restored.timeline.cursor(), 30);
    assert_eq!(restored.timeline.speed(), PlaybackSpeed::Double);
    assert_eq!(restored.analysis.fixture_id, 2);
}

#[test]
fn stale_or_broken_session_files_are_ignored() {
    let path = temp_path("old_session.json");
    std::fs::write(
        &path,
        r#"{"version":0,"page":"tracking","timeline_cursor":5,"speed":"Normal"}"#,
    )
    .unwrap();
    assert!(load_session_file(&path).is_none());
    std::fs::write(&path, "not json").unwrap();
    assert!(load_session_file(&path).is_none());
    let _ = std::fs::remove_file(&path);
    assert!(load_session_file(&path).is_none());
}

#[test]
fn console_log_is_bounded() {
    let mut state = AppState::new();
    for i in 0..(LOG_CAPACITY + 25) {
        state.push_log(format!("[INFO] line {i}"));
    }
    assert_eq!(state.logs.len(), LOG_CAPACITY);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 25"));
}

use coaching_hub::model::{Event, EventKind, TeamSide, TrackingPoint};
use coaching_hub::timeline::{DEFAULT_WINDOW, PlaybackSpeed, Timeline, time_bounds};

fn point(fixture_id: i64, time_s: i64) -> TrackingPoint {
    TrackingPoint {
        fixture_id,
        time_s,
        player_id: 1,
        x_pct: 0.0,
        y_pct: 0.0,
        team: TeamSide::Klr,
        bench: false,
    }
}

fn event(fixture_id: i64, time_s: i64) -> Event {
    Event {
        fixture_id,
        time_s,
        kind: EventKind::Kick,
        player_id: None,
        notes: String::new(),
    }
}

#[test]
fn bounds_span_tracking_and_events_for_the_fixture() {
    let tracking = vec![point(1, 30), point(1, 45), point(2, 500)];
    let events = vec![event(1, 12), event(2, -4)];
    assert_eq!(time_bounds(&tracking, &events, 1), (12, 45));
    assert_eq!(time_bounds(&[], &[], 1), DEFAULT_WINDOW);
    assert_eq!(time_bounds(&tracking, &events, 3), DEFAULT_WINDOW);
}

#[test]
fn cursor_is_clamped_to_bounds() {
    let mut t = Timeline::new();
    t.set_bounds(10, 20);
    assert_eq!(t.cursor(), 10);
    t.step(-5);
    assert_eq!(t.cursor(), 10);
    t.scrub(100);
    assert_eq!(t.cursor(), 20);
    t.set_bounds(0, 15);
    assert_eq!(t.cursor(), 15);
    t.scrub(-3);
    assert_eq!(t.cursor(), 0);
}

#[test]
fn ticking_at_upper_bound_stops_playback() {
    let mut t = Timeline::new();
    t.set_bounds(0, 3);
    t.toggle_play();
    assert!(t.is_playing());
    assert!(t.tick());
    assert!(t.tick());
    assert!(t.tick());
    assert_eq!(t.cursor(), 3);
    assert!(!t.is_playing());
    assert!(!t.tick());
    assert_eq!(t.cursor(), 3);
}

#[test]
fn play_from_the_end_rewinds_first() {
    let mut t = Timeline::new();
    t.set_bounds(5, 9);
    t.seek_end();
    t.toggle_play();
    assert!(t.is_playing());
    assert_eq!(t.cursor(), 5);
    t.toggle_play();
    assert!(!t.is_playing());
}

#[test]
fn single_point_window_cannot_play() {
    let mut t = Timeline::new();
    t.set_bounds(7, 7);
    t.toggle_play();
    assert!(!t.is_playing());
    assert_eq!(t.cursor(), 7);
}

#[test]
fn speed_cycles_through_all_settings() {
    let mut t = Timeline::new();
    assert_eq!(t.speed(), PlaybackSpeed::Normal);
    t.cycle_speed();
    assert_eq!(t.speed(), PlaybackSpeed::Double);
    t.cycle_speed();
    assert_eq!(t.speed(), PlaybackSpeed::Half);
}

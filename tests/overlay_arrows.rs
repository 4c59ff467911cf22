use coaching_hub::model::{Event, EventKind, Player, TeamSide, TrackingPoint};
use coaching_hub::overlay::{
    ArrowKind, LINEBREAK_ARROW_LENGTH, build_overlay, events_near, marker_label, snapshot_at,
};

fn at(time_s: i64, player_id: i64, x: f64, y: f64) -> TrackingPoint {
    TrackingPoint {
        fixture_id: 1,
        time_s,
        player_id,
        x_pct: x,
        y_pct: y,
        team: TeamSide::Klr,
        bench: false,
    }
}

fn ev(time_s: i64, kind: EventKind, player_id: Option<i64>) -> Event {
    Event {
        fixture_id: 1,
        time_s,
        kind,
        player_id,
        notes: String::new(),
    }
}

#[test]
fn pass_with_two_players_targets_the_other_regardless_of_distance() {
    let tracking = vec![at(30, 1, 2.0, 2.0), at(30, 2, 98.0, 68.0)];
    let events = vec![ev(30, EventKind::Pass, Some(1))];
    let overlay = build_overlay(&tracking, &events, &[], 1, 30);

    assert_eq!(overlay.markers.len(), 2);
    assert_eq!(overlay.arrows.len(), 1);
    let arrow = &overlay.arrows[0];
    assert_eq!(arrow.kind, ArrowKind::Pass);
    assert_eq!(arrow.from_player, 1);
    assert_eq!(arrow.to_player, Some(2));
    assert_eq!(arrow.to, (98.0, 68.0));
}

#[test]
fn pass_picks_nearest_teammate() {
    let tracking = vec![
        at(10, 1, 50.0, 35.0),
        at(10, 2, 80.0, 35.0),
        at(10, 3, 55.0, 30.0),
    ];
    let events = vec![ev(11, EventKind::Pass, Some(1))];
    let overlay = build_overlay(&tracking, &events, &[], 1, 10);
    assert_eq!(overlay.arrows[0].to_player, Some(3));
}

#[test]
fn pass_without_a_second_player_draws_nothing() {
    let tracking = vec![at(10, 1, 50.0, 35.0)];
    let events = vec![ev(10, EventKind::Pass, Some(1))];
    assert!(build_overlay(&tracking, &events, &[], 1, 10).arrows.is_empty());
}

#[test]
fn linebreak_arrow_is_fixed_length_along_x() {
    let tracking = vec![at(20, 4, 40.0, 12.0)];
    let events = vec![ev(21, EventKind::Linebreak, Some(4))];
    let overlay = build_overlay(&tracking, &events, &[], 1, 20);

    assert_eq!(overlay.arrows.len(), 1);
    let arrow = &overlay.arrows[0];
    assert_eq!(arrow.kind, ArrowKind::Linebreak);
    assert_eq!(arrow.to_player, None);
    assert_eq!(arrow.from, (40.0, 12.0));
    assert_eq!(arrow.to, (40.0 + LINEBREAK_ARROW_LENGTH, 12.0));
}

#[test]
fn events_window_is_two_seconds_inclusive() {
    let events = vec![
        ev(7, EventKind::Tackle, None),
        ev(8, EventKind::Tackle, None),
        ev(10, EventKind::Tackle, None),
        ev(12, EventKind::Tackle, None),
        ev(13, EventKind::Tackle, None),
    ];
    let times = events_near(&events, 1, 10)
        .into_iter()
        .map(|e| e.time_s)
        .collect::<Vec<_>>();
    assert_eq!(times, vec![8, 10, 12]);
}

#[test]
fn arrows_need_a_tracked_source_player() {
    let tracking = vec![at(5, 1, 10.0, 10.0), at(5, 2, 20.0, 20.0)];
    let events = vec![
        ev(5, EventKind::Pass, None),
        ev(5, EventKind::Pass, Some(9)),
        ev(5, EventKind::Carry, Some(1)),
    ];
    assert!(build_overlay(&tracking, &events, &[], 1, 5).arrows.is_empty());
}

#[test]
fn snapshot_is_exact_time_and_fixture() {
    let mut other_fixture = at(5, 3, 1.0, 1.0);
    other_fixture.fixture_id = 2;
    let tracking = vec![at(5, 1, 1.0, 1.0), at(6, 2, 1.0, 1.0), other_fixture];
    let snap = snapshot_at(&tracking, 1, 5);
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].player_id, 1);
}

#[test]
fn marker_labels_prefer_shirt_then_initials() {
    let mut numbered = Player::new(1, "Tom", "Hartley");
    numbered.shirt_number = Some(10);
    let plain = Player::new(2, "sam", "birkett");
    let nameless = Player::new(3, "", "");
    let players = vec![numbered, plain, nameless];

    assert_eq!(marker_label(&players, 1), "10");
    assert_eq!(marker_label(&players, 2), "SB");
    assert_eq!(marker_label(&players, 3), "?");
    assert_eq!(marker_label(&players, 99), "?");
}

#[test]
fn bench_and_team_flags_carry_to_markers() {
    let mut bench = at(3, 2, 95.0, 65.0);
    bench.bench = true;
    bench.team = TeamSide::Opp;
    let tracking = vec![at(3, 1, 5.0, 5.0), bench];
    let overlay = build_overlay(&tracking, &[], &[], 1, 3);
    assert!(!overlay.markers[0].bench);
    assert!(overlay.markers[1].bench);
    assert_eq!(overlay.markers[1].team, TeamSide::Opp);
}

#[test]
fn repeated_player_uses_later_position_but_keeps_first_slot() {
    let tracking = vec![
        at(15, 1, 0.0, 0.0),
        at(15, 2, 10.0, 0.0),
        at(15, 1, 50.0, 0.0),
        at(15, 3, 40.0, 0.0),
    ];
    let events = vec![ev(15, EventKind::Pass, Some(1))];
    let overlay = build_overlay(&tracking, &events, &[], 1, 15);

    assert_eq!(overlay.markers.len(), 4);
    assert_eq!(overlay.arrows.len(), 1);
    let arrow = &overlay.arrows[0];
    assert_eq!(arrow.from, (50.0, 0.0));
    assert_eq!(arrow.to_player, Some(3));
    assert_eq!(arrow.to, (40.0, 0.0));
}

use coaching_hub::cache::HubSnapshot;
use coaching_hub::model::{
    Availability, Event, EventKind, Fixture, Player, PlayerStatus, TeamSide, TrackingPoint, Venue,
};
use coaching_hub::views::{
    Page, TRACKING_TAIL, availability_rows, dashboard_metrics, event_rows, roster_by_last_name,
    selected_names, status_rows, tracking_rows, tracking_tail,
};

fn roster() -> Vec<Player> {
    let mut tom = Player::new(1, "Tom", "Hartley");
    tom.shirt_number = Some(9);
    let mut sam = Player::new(2, "Sam", "Birkett");
    sam.status = PlayerStatus::Injured;
    sam.injury_notes = "Ankle".to_string();
    vec![tom, sam]
}

fn snapshot() -> HubSnapshot {
    HubSnapshot {
        players: roster(),
        fixtures: vec![Fixture {
            fixture_id: 1,
            team: "KLRUFC U17 Colts".to_string(),
            opposition: "TBC".to_string(),
            venue: Venue::Home,
            ground_address: String::new(),
            date: None,
            kickoff: None,
            selected_player_ids: vec![2, 42],
            video_url: None,
        }],
        availability: vec![
            Availability {
                player_id: 1,
                available: true,
                reason: String::new(),
            },
            Availability {
                player_id: 77,
                available: false,
                reason: "Left club".to_string(),
            },
            Availability {
                player_id: 2,
                available: false,
                reason: "Ankle".to_string(),
            },
        ],
        ..HubSnapshot::default()
    }
}

#[test]
fn unmatched_availability_rows_stay_with_blank_names() {
    let rows = availability_rows(&snapshot());
    assert_eq!(rows.len(), 3);
    // Blank name sorts first.
    assert_eq!(rows[0].player_id, 77);
    assert_eq!(rows[0].player.name(), "");
    assert_eq!(rows[0].reason, "Left club");
    assert_eq!(rows[1].player.name(), "Sam Birkett");
    assert_eq!(rows[1].player.status, "injured");
    assert_eq!(rows[2].player.name(), "Tom Hartley");
}

#[test]
fn events_and_tracking_left_join_players() {
    let players = roster();
    let events = vec![
        Event {
            fixture_id: 1,
            time_s: 4,
            kind: EventKind::Carry,
            player_id: Some(1),
            notes: String::new(),
        },
        Event {
            fixture_id: 1,
            time_s: 5,
            kind: EventKind::Kick,
            player_id: Some(404),
            notes: String::new(),
        },
        Event {
            fixture_id: 1,
            time_s: 6,
            kind: EventKind::TurnoverWon,
            player_id: None,
            notes: "team".to_string(),
        },
    ];
    let rows = event_rows(&events, &players);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].player.name(), "Tom Hartley");
    assert_eq!(rows[1].player.name(), "");
    assert_eq!(rows[1].player_id, Some(404));
    assert_eq!(rows[2].event, "Turnover Won");
    assert_eq!(rows[2].player_id, None);

    let points = vec![TrackingPoint {
        fixture_id: 1,
        time_s: 4,
        player_id: 1,
        x_pct: 10.0,
        y_pct: 20.0,
        team: TeamSide::Klr,
        bench: false,
    }];
    let rows = tracking_rows(&points, &players);
    assert_eq!(rows[0].player.shirt_number, Some(9));
}

#[test]
fn tracking_tail_keeps_latest_points() {
    let mut snap = snapshot();
    snap.tracking = (0..(TRACKING_TAIL as i64 + 20))
        .map(|t| TrackingPoint {
            fixture_id: 1,
            time_s: t,
            player_id: 1,
            x_pct: 50.0,
            y_pct: 35.0,
            team: TeamSide::Klr,
            bench: false,
        })
        .collect();
    let tail = tracking_tail(&snap);
    assert_eq!(tail.len(), TRACKING_TAIL);
    assert_eq!(tail.first().map(|r| r.time_s), Some(20));
    assert_eq!(tail.last().map(|r| r.time_s), Some(TRACKING_TAIL as i64 + 19));
}

#[test]
fn dashboard_counts_and_selected_names() {
    let snap = snapshot();
    let metrics = dashboard_metrics(&snap);
    assert_eq!(metrics.players, 2);
    assert_eq!(metrics.fixtures, 1);
    assert_eq!(metrics.available, 1);
    assert_eq!(metrics.selected, 2);
    assert_eq!(selected_names(&snap), vec!["Sam Birkett".to_string(), "#42".to_string()]);

    let empty = HubSnapshot::default();
    assert_eq!(dashboard_metrics(&empty).selected, 0);
    assert!(selected_names(&empty).is_empty());
}

#[test]
fn roster_orderings() {
    let players = roster();
    let by_last = roster_by_last_name(&players)
        .into_iter()
        .map(|p| p.player_id)
        .collect::<Vec<_>>();
    assert_eq!(by_last, vec![2, 1]);

    let by_status = status_rows(&players)
        .into_iter()
        .map(|p| p.player_id)
        .collect::<Vec<_>>();
    assert_eq!(by_status, vec![1, 2]);
}

#[test]
fn page_keys_round_trip() {
    for page in Page::ALL {
        assert_eq!(Page::from_key(page.key()), Some(page));
        assert_eq!(Page::from_index(page.index()), page);
    }
    assert_eq!(Page::from_key("nope"), None);
}

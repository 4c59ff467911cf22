use crate::model::{Event, EventKind, Player, TeamSide, TrackingPoint, find_player};

pub const PITCH_LENGTH: f64 = 100.0;
pub const PITCH_WIDTH: f64 = 70.0;
pub const EVENT_WINDOW_SECS: i64 = 2;
pub const LINEBREAK_ARROW_LENGTH: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub player_id: i64,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub team: TeamSide,
    pub bench: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKind {
    Pass,
    Linebreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub kind: ArrowKind,
    pub from_player: i64,
    pub to_player: Option<i64>,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub markers: Vec<Marker>,
    pub arrows: Vec<Arrow>,
}

/// Tracking rows sampled exactly at `time_s` for the fixture.
pub fn snapshot_at(tracking: &[TrackingPoint], fixture_id: i64, time_s: i64) -> Vec<&TrackingPoint> {
    tracking
        .iter()
        .filter(|p| p.fixture_id == fixture_id && p.time_s == time_s)
        .collect()
}

/// Events within `±EVENT_WINDOW_SECS` of `time_s`, inclusive.
pub fn events_near(events: &[Event], fixture_id: i64, time_s: i64) -> Vec<&Event> {
    let lo = time_s.saturating_sub(EVENT_WINDOW_SECS);
    let hi = time_s.saturating_add(EVENT_WINDOW_SECS);
    events
        .iter()
        .filter(|e| e.fixture_id == fixture_id && e.time_s >= lo && e.time_s <= hi)
        .collect()
}

pub fn marker_label(players: &[Player], player_id: i64) -> String {
    match find_player(players, player_id) {
        Some(player) => match player.shirt_number {
            Some(num) => num.to_string(),
            None => {
                let initials = player.initials();
                if initials.is_empty() {
                    "?".to_string()
                } else {
                    initials
                }
            }
        },
        None => "?".to_string(),
    }
}

pub fn build_overlay(
    tracking: &[TrackingPoint],
    events: &[Event],
    players: &[Player],
    fixture_id: i64,
    time_s: i64,
) -> Overlay {
    let snap = snapshot_at(tracking, fixture_id, time_s);
    let markers = snap
        .iter()
        .map(|p| Marker {
            player_id: p.player_id,
            x: p.x_pct,
            y: p.y_pct,
            label: marker_label(players, p.player_id),
            team: p.team,
            bench: p.bench,
        })
        .collect::<Vec<_>>();

    let coords = player_coords(&snap);
    let mut arrows = Vec::new();
    for event in events_near(events, fixture_id, time_s) {
        let Some(src) = event.player_id else {
            continue;
        };
        let Some(&(_, sx, sy)) = coords.iter().find(|(id, ..)| *id == src) else {
            continue;
        };
        match event.kind {
            EventKind::Pass => {
                if let Some((target, tx, ty)) = nearest_other(&coords, src, sx, sy) {
                    arrows.push(Arrow {
                        kind: ArrowKind::Pass,
                        from_player: src,
                        to_player: Some(target),
                        from: (sx, sy),
                        to: (tx, ty),
                    });
                }
            }
            EventKind::Linebreak => arrows.push(Arrow {
                kind: ArrowKind::Linebreak,
                from_player: src,
                to_player: None,
                from: (sx, sy),
                to: (sx + LINEBREAK_ARROW_LENGTH, sy),
            }),
            _ => {}
        }
    }

    Overlay { markers, arrows }
}

/// One position per player in first-seen order; a repeated player takes the
/// later row's position.
fn player_coords(snap: &[&TrackingPoint]) -> Vec<(i64, f64, f64)> {
    let mut coords: Vec<(i64, f64, f64)> = Vec::with_capacity(snap.len());
    for p in snap {
        match coords.iter_mut().find(|(id, ..)| *id == p.player_id) {
            Some(slot) => *slot = (p.player_id, p.x_pct, p.y_pct),
            None => coords.push((p.player_id, p.x_pct, p.y_pct)),
        }
    }
    coords
}

/// Strict `<` keeps the first of equally-near candidates.
fn nearest_other(coords: &[(i64, f64, f64)], src: i64, sx: f64, sy: f64) -> Option<(i64, f64, f64)> {
    let mut best: Option<(f64, (i64, f64, f64))> = None;
    for &(id, x, y) in coords {
        if id == src {
            continue;
        }
        let d = (x - sx).powi(2) + (y - sy).powi(2);
        let closer = match best {
            Some((best_d, _)) => d < best_d,
            None => true,
        };
        if closer {
            best = Some((d, (id, x, y)));
        }
    }
    best.map(|(_, hit)| hit)
}

/// Arrowhead wings for drawing: two short segments back from `to`.
pub fn arrowhead(from: (f64, f64), to: (f64, f64), size: f64) -> [((f64, f64), (f64, f64)); 2] {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f64::EPSILON {
        return [(to, to), (to, to)];
    }
    let (ux, uy) = (dx / len, dy / len);
    let back = (to.0 - ux * size, to.1 - uy * size);
    let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
    [
        (to, (back.0 + px, back.1 + py)),
        (to, (back.0 - px, back.1 - py)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrowhead_points_back_along_shaft() {
        let wings = arrowhead((0.0, 0.0), (10.0, 0.0), 2.0);
        for (tip, end) in wings {
            assert_eq!(tip, (10.0, 0.0));
            assert!((end.0 - 8.0).abs() < 1e-9);
            assert!((end.1.abs() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn identical_coordinates_pick_first_in_order() {
        let coords = vec![(1, 0.0, 0.0), (2, 5.0, 5.0), (3, 5.0, 5.0)];
        let hit = nearest_other(&coords, 1, 0.0, 0.0).expect("target");
        assert_eq!(hit.0, 2);
    }
}

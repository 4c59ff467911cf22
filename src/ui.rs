use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, Paragraph, Wrap};

use coaching_hub::app::App;
use coaching_hub::cache::HubSnapshot;
use coaching_hub::model::{
    ACTIVE_FIXTURE_ID, AnalysisScore, EventKind, PlayerStatus, RATING_MAX, TeamSide,
};
use coaching_hub::overlay::{
    ArrowKind, Overlay, PITCH_LENGTH, PITCH_WIDTH, arrowhead, build_overlay, events_near,
};
use coaching_hub::state::{
    AnalysisField, AppState, FixtureField, RosterColumn, SelectionPanel, SettingsPanel, SyncField,
    TagField, TrackingMode, TrackingPanel,
};
use coaching_hub::views::{
    Page, PlayerRef, availability_rows, dashboard_metrics, event_rows, latest_rating,
    rating_history, roster_by_last_name, selected_names, status_rows, tracking_tail,
};

const SIDEBAR_WIDTH: u16 = 28;
const ACTIVE_BORDER: Color = Color::Yellow;
const KLR_COLOR: Color = Color::Yellow;
const OPP_COLOR: Color = Color::LightRed;
const LINE_COLOR: Color = Color::White;

pub fn draw(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let snap = app.data.snapshot();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state, snap))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(rows[1]);
    render_sidebar(frame, body[0], state);

    match state.page {
        Page::Dashboard => render_dashboard(frame, body[1], snap),
        Page::Selection => render_selection(frame, body[1], state, snap),
        Page::Analysis => render_analysis(frame, body[1], state, snap),
        Page::Tracking => render_tracking(frame, body[1], state, snap),
        Page::DataSync => render_sync(frame, body[1], state),
        Page::Settings => render_settings(frame, body[1], state),
    }

    let console = Paragraph::new(console_text(state, rows[2].height.saturating_sub(2)))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, rows[3]);

    if state.input.is_some() {
        render_input_popup(frame, frame.size(), state);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState, snap: &HubSnapshot) -> String {
    let fixture = snap
        .active_fixture()
        .map(|f| f.headline())
        .unwrap_or_else(|| "No fixture set".to_string());
    let line1 = format!("  /\\   KLRUFC COACHING HUB | {} | {}", state.page.label(), fixture);
    let line2 = " (  )".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.input.is_some() {
        return "Enter Confirm | Esc Cancel | Backspace Delete".to_string();
    }
    let page_keys = match state.page {
        Page::Dashboard => "",
        Page::Selection => match state.selection.panel {
            SelectionPanel::Availability => "Tab Squad | j/k Move | Space Toggle | e Reason | f Fill missing",
            SelectionPanel::Squad => "Tab Availability | j/k Move | Space Pick | c Clear | r Revert | s Save",
        },
        Page::Analysis => "j/k Field | h/l Adjust | Enter Notes | s Save rating",
        Page::Tracking => match state.tracking.panel {
            TrackingPanel::Timeline => "Tab Panel | v View | u Video | h/l Step | Space Play | +/- Speed | g/G Ends | t Go to",
            TrackingPanel::Tagging => "Tab Panel | v View | j/k Field | h/l Adjust | Enter Edit | c Use cursor | s Save event",
            TrackingPanel::Markers => "Tab Panel | v View | hjkl Move | m Drop | ,/. Pick | p Player | t Team | b Bench | x Remove | s Save",
        },
        Page::DataSync => "j/k Field | Enter Edit | p Preview | c Commit | m Migrate | x Export",
        Page::Settings => match state.settings.panel {
            SettingsPanel::Fixture => "Tab Roster | j/k Field | Enter Edit | s Save fixture",
            SettingsPanel::Roster => "Tab Fixture | hjkl Cell | Enter Edit | a Add | d Delete | r Revert | s Save",
        },
    };
    if page_keys.is_empty() {
        "1-6 Page | [/] Prev/Next | ? Help | q Quit".to_string()
    } else {
        format!("1-6 Page | {page_keys} | ? Help | q Quit")
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines = Page::ALL
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let text = format!(" {} {}", idx + 1, page.label());
            if *page == state.page {
                Line::from(Span::styled(
                    format!(">{}", &text[1..]),
                    Style::default().fg(ACTIVE_BORDER).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect::<Vec<_>>();
    let sidebar = Paragraph::new(lines).block(Block::default().title("KLRUFC").borders(Borders::ALL));
    frame.render_widget(sidebar, area);
}

fn panel_block(title: &str, active: bool) -> Block<'static> {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    if active {
        block.border_style(Style::default().fg(ACTIVE_BORDER))
    } else {
        block
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, snap: &HubSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(area);

    let metrics = dashboard_metrics(snap);
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);
    for (tile, (title, value)) in tiles.iter().zip([
        ("Players", metrics.players),
        ("Fixtures", metrics.fixtures),
        ("Available", metrics.available),
        ("Selected", metrics.selected),
    ]) {
        let widget = Paragraph::new(format!("\n{value}"))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(widget, *tile);
    }

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let mut fixture_lines = Vec::new();
    match snap.active_fixture() {
        Some(f) => {
            fixture_lines.push(format!("{} vs {}", f.team, f.opposition));
            fixture_lines.push(format!("Venue: {} ({})", f.venue.label(), f.ground_address));
            fixture_lines.push(format!(
                "Date: {} {}",
                or_dash(&f.date_label()),
                f.kickoff_label()
            ));
            fixture_lines.push(String::new());
            let names = selected_names(snap);
            if names.is_empty() {
                fixture_lines.push("No squad selected yet".to_string());
            } else {
                fixture_lines.push(format!("Squad ({}):", names.len()));
                fixture_lines.extend(names.into_iter().map(|n| format!("  {n}")));
            }
        }
        None => fixture_lines.push("No fixtures yet. Add one in Settings".to_string()),
    }
    let fixture = Paragraph::new(fixture_lines.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Next fixture").borders(Borders::ALL));
    frame.render_widget(fixture, lower[0]);

    let unavailable = status_rows(&snap.players)
        .into_iter()
        .filter(|p| p.status != PlayerStatus::Available)
        .map(|p| {
            let notes = if p.injury_notes.is_empty() {
                String::new()
            } else {
                format!(" - {}", p.injury_notes)
            };
            format!("{:<12} {}{}", p.status.as_str(), p.display_name(), notes)
        })
        .collect::<Vec<_>>();
    let text = if snap.players.is_empty() {
        "No players yet. Import a roster in Data Sync".to_string()
    } else if unavailable.is_empty() {
        "Whole squad available".to_string()
    } else {
        unavailable.join("\n")
    };
    let status = Paragraph::new(text)
        .block(Block::default().title("Unavailable / injured").borders(Borders::ALL));
    frame.render_widget(status, lower[1]);
}

fn render_selection(frame: &mut Frame, area: Rect, state: &AppState, snap: &HubSnapshot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let sel = &state.selection;

    let avail_active = sel.panel == SelectionPanel::Availability;
    let rows = availability_rows(snap);
    let height = columns[0].height.saturating_sub(3) as usize;
    let text = if rows.is_empty() {
        "No availability yet. Press f to add every player as available".to_string()
    } else {
        let (start, end) = visible_range(sel.availability_cursor, rows.len(), height);
        let mut lines = vec![format!("  {:<24} {:<5} {}", "Player", "Avail", "Reason")];
        for (idx, row) in rows.iter().enumerate().take(end).skip(start) {
            let prefix = if avail_active && idx == sel.availability_cursor {
                "> "
            } else {
                "  "
            };
            let name = if row.player.name().is_empty() {
                format!("(id {})", row.player_id)
            } else {
                row.player.name()
            };
            lines.push(format!(
                "{prefix}{:<24} {:<5} {}",
                truncate(&name, 24),
                if row.available { "yes" } else { "no" },
                row.reason
            ));
        }
        lines.join("\n")
    };
    frame.render_widget(
        Paragraph::new(text).block(panel_block("Availability", avail_active)),
        columns[0],
    );

    let squad_active = sel.panel == SelectionPanel::Squad;
    let roster = roster_by_last_name(&snap.players);
    let title = format!("Squad selection ({} picked)", sel.chosen.len());
    let text = if snap.active_fixture().is_none() {
        "No fixtures yet. Add one in Settings".to_string()
    } else if roster.is_empty() {
        "No players yet. Import a roster in Data Sync".to_string()
    } else {
        let height = columns[1].height.saturating_sub(2) as usize;
        let (start, end) = visible_range(sel.squad_cursor, roster.len(), height);
        let mut lines = Vec::new();
        for (idx, p) in roster.iter().enumerate().take(end).skip(start) {
            let prefix = if squad_active && idx == sel.squad_cursor {
                "> "
            } else {
                "  "
            };
            let mark = if sel.is_chosen(p.player_id) { "[x]" } else { "[ ]" };
            lines.push(format!("{prefix}{mark} {}", p.display_name()));
        }
        if sel.dirty {
            lines.push(String::new());
            lines.push("(unsaved, press s to save)".to_string());
        }
        lines.join("\n")
    };
    frame.render_widget(
        Paragraph::new(text).block(panel_block(&title, squad_active)),
        columns[1],
    );
}

fn render_analysis(frame: &mut Frame, area: Rect, state: &AppState, snap: &HubSnapshot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    if snap.players.is_empty() {
        let placeholder = Paragraph::new("No players yet. Import a roster in Data Sync")
            .block(Block::default().title("GAME ratings").borders(Borders::ALL));
        frame.render_widget(placeholder, area);
        return;
    }

    let form = &state.analysis;
    let player = state.analysis_player(snap);
    let mut lines = vec![
        "G Go forward | A Attitude | M Mighty defence | E Energy".to_string(),
        String::new(),
    ];
    for field in AnalysisField::ALL {
        let prefix = if field == form.field { "> " } else { "  " };
        let value = match field {
            AnalysisField::Player => player.map(|p| p.display_name()).unwrap_or_default(),
            AnalysisField::Fixture => form.fixture_id.to_string(),
            AnalysisField::Notes => or_dash(&form.notes),
            other => other
                .rating_index()
                .map(|idx| rating_pips(form.ratings[idx]))
                .unwrap_or_default(),
        };
        lines.push(format!("{prefix}{:<15} {value}", analysis_field_label(field)));
    }
    frame.render_widget(
        Paragraph::new(lines.join("\n"))
            .wrap(Wrap { trim: false })
            .block(panel_block("Rate player", true)),
        columns[0],
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(7)])
        .split(columns[1]);

    let Some(player) = player else {
        return;
    };
    let chart_title = format!("Latest GAME: {}", player.display_name());
    match latest_rating(&snap.analysis, player.player_id) {
        Some(score) => frame.render_widget(game_bar_chart(score, &chart_title), right[0]),
        None => frame.render_widget(
            Paragraph::new("No ratings yet for this player")
                .block(Block::default().title(chart_title).borders(Borders::ALL)),
            right[0],
        ),
    }

    let history = rating_history(&snap.analysis, player.player_id);
    let text = if history.is_empty() {
        "No history".to_string()
    } else {
        history
            .iter()
            .rev()
            .take(right[1].height.saturating_sub(2) as usize)
            .map(|s| {
                format!(
                    "F{:<3} G{} A{} M{} E{} {}",
                    s.fixture_id, s.go_forward, s.attitude, s.mighty_defence, s.energy, s.notes
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .title(format!("History ({})", history.len()))
                .borders(Borders::ALL),
        ),
        right[1],
    );
}

fn analysis_field_label(field: AnalysisField) -> &'static str {
    match field {
        AnalysisField::Player => "Player",
        AnalysisField::Fixture => "Fixture ID",
        AnalysisField::GoForward => "Go forward",
        AnalysisField::Attitude => "Attitude",
        AnalysisField::MightyDefence => "Mighty defence",
        AnalysisField::Energy => "Energy",
        AnalysisField::Notes => "Notes",
    }
}

fn rating_pips(value: u8) -> String {
    let filled = "#".repeat(value as usize);
    let empty = ".".repeat(RATING_MAX.saturating_sub(value) as usize);
    format!("{value} {filled}{empty}")
}

fn game_bar_chart(score: &AnalysisScore, title: &str) -> BarChart<'static> {
    let colors = [Color::Green, Color::Cyan, Color::Blue, Color::Magenta];
    let bars = AnalysisScore::AXES
        .iter()
        .zip(score.values())
        .zip(colors)
        .map(|((axis, value), color)| {
            Bar::default()
                .value(value as u64)
                .label(Line::from(axis.to_string()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect::<Vec<_>>();

    BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(14)
        .bar_gap(2)
        .max(RATING_MAX as u64)
}

fn render_tracking(frame: &mut Frame, area: Rect, state: &AppState, snap: &HubSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let video = snap
        .active_fixture()
        .and_then(|f| f.video_url.clone())
        .unwrap_or_else(|| "(none, press u to set)".to_string());
    let mode = match state.tracking.mode {
        TrackingMode::List => "List",
        TrackingMode::Pitch => "Pitch",
    };
    frame.render_widget(
        Paragraph::new(format!("Video: {video}"))
            .block(Block::default().title(format!("Match video | View: {mode}")).borders(Borders::ALL)),
        rows[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(40)])
        .split(rows[1]);

    match state.tracking.mode {
        TrackingMode::List => render_tracking_lists(frame, columns[0], snap),
        TrackingMode::Pitch => {
            let overlay = build_overlay(
                &snap.tracking,
                &snap.events,
                &snap.players,
                ACTIVE_FIXTURE_ID,
                state.timeline.cursor(),
            );
            let pitch_rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(10), Constraint::Length(7)])
                .split(columns[0]);
            render_pitch(frame, pitch_rows[0], &overlay, state);
            render_events_near(frame, pitch_rows[1], state, snap);
        }
    }

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Min(4),
        ])
        .split(columns[1]);
    render_timeline_panel(frame, side[0], state);
    render_tagging_panel(frame, side[1], state, snap);
    render_markers_panel(frame, side[2], state, snap);
}

fn render_tracking_lists(frame: &mut Frame, area: Rect, snap: &HubSnapshot) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let events = event_rows(&snap.events, &snap.players);
    let visible = halves[0].height.saturating_sub(3) as usize;
    let text = if events.is_empty() {
        "No events tagged yet".to_string()
    } else {
        let mut lines = vec![format!("{:>6} {:<14} {:<22} {}", "Time", "Event", "Player", "Notes")];
        let start = events.len().saturating_sub(visible);
        for row in &events[start..] {
            let who = if row.player_id.is_none() {
                "(team)".to_string()
            } else {
                row.player.name()
            };
            lines.push(format!(
                "{:>5}s {:<14} {:<22} {}",
                row.time_s,
                row.event,
                truncate(&who, 22),
                row.notes
            ));
        }
        lines.join("\n")
    };
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Events").borders(Borders::ALL)),
        halves[0],
    );

    let tail = tracking_tail(snap);
    let visible = halves[1].height.saturating_sub(3) as usize;
    let text = if tail.is_empty() {
        "No tracking points yet".to_string()
    } else {
        let mut lines = vec![format!(
            "{:>6} {:<22} {:>3} {:>6} {:>6} {:<4} {}",
            "Time", "Player", "#", "X%", "Y%", "Team", "Bench"
        )];
        let start = tail.len().saturating_sub(visible);
        for row in &tail[start..] {
            lines.push(format!(
                "{:>5}s {:<22} {:>3} {:>6.2} {:>6.2} {:<4} {}",
                row.time_s,
                truncate(&row.player.name(), 22),
                row.player
                    .shirt_number
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                row.x_pct,
                row.y_pct,
                row.team.label(),
                if row.bench { "yes" } else { "" }
            ));
        }
        lines.join("\n")
    };
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .title(format!("Tracking (latest {})", tail.len()))
                .borders(Borders::ALL),
        ),
        halves[1],
    );
}

fn render_pitch(frame: &mut Frame, area: Rect, overlay: &Overlay, state: &AppState) {
    let tracking = &state.tracking;
    let placing = tracking.panel == TrackingPanel::Markers;
    let title = format!(
        "Pitch @ {}s ({} players)",
        state.timeline.cursor(),
        overlay.markers.len()
    );
    let canvas = Canvas::default()
        .block(panel_block(&title, placing))
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, PITCH_LENGTH])
        .y_bounds([0.0, PITCH_WIDTH])
        .paint(|ctx| {
            draw_pitch_lines(ctx);
            ctx.layer();

            for arrow in &overlay.arrows {
                let color = match arrow.kind {
                    ArrowKind::Pass => Color::Cyan,
                    ArrowKind::Linebreak => Color::Green,
                };
                ctx.draw(&CanvasLine::new(arrow.from.0, arrow.from.1, arrow.to.0, arrow.to.1, color));
                for (tip, end) in arrowhead(arrow.from, arrow.to, 2.0) {
                    ctx.draw(&CanvasLine::new(tip.0, tip.1, end.0, end.1, color));
                }
            }

            for marker in &overlay.markers {
                let color = team_color(marker.team);
                ctx.draw(&Circle {
                    x: marker.x,
                    y: marker.y,
                    radius: 1.8,
                    color,
                });
                if !marker.bench {
                    for radius in [1.2, 0.6] {
                        ctx.draw(&Circle {
                            x: marker.x,
                            y: marker.y,
                            radius,
                            color,
                        });
                    }
                }
            }
            ctx.layer();
            for marker in &overlay.markers {
                ctx.print(
                    marker.x + 2.0,
                    marker.y,
                    Span::styled(
                        marker.label.clone(),
                        Style::default()
                            .fg(team_color(marker.team))
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            }

            for (idx, pending) in tracking.markers.iter().enumerate() {
                let style = if idx == tracking.marker_selected {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default().fg(Color::White)
                };
                ctx.print(pending.x_pct, pending.y_pct, Span::styled(format!("{}", idx + 1), style));
            }
            if placing {
                ctx.print(
                    tracking.cursor.0,
                    tracking.cursor.1,
                    Span::styled("+", Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD)),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn team_color(team: TeamSide) -> Color {
    match team {
        TeamSide::Klr => KLR_COLOR,
        TeamSide::Opp => OPP_COLOR,
    }
}

/// Touchlines, try lines, halfway, 22s, dashed 10m/5m/15m lines and posts,
/// scaled to the 100 x 70 pitch.
fn draw_pitch_lines(ctx: &mut Context) {
    ctx.draw(&Rectangle {
        x: 0.0,
        y: 0.0,
        width: PITCH_LENGTH,
        height: PITCH_WIDTH,
        color: LINE_COLOR,
    });
    for x in [22.0, 50.0, 78.0] {
        ctx.draw(&CanvasLine::new(x, 0.0, x, PITCH_WIDTH, LINE_COLOR));
    }
    for x in [5.0, 40.0, 60.0, 95.0] {
        dashed(ctx, (x, 0.0), (x, PITCH_WIDTH), Color::DarkGray);
    }
    for y in [5.0, 15.0, PITCH_WIDTH - 15.0, PITCH_WIDTH - 5.0] {
        dashed(ctx, (0.0, y), (PITCH_LENGTH, y), Color::DarkGray);
    }
    let mid = PITCH_WIDTH / 2.0;
    for x in [0.0, PITCH_LENGTH] {
        for y in [mid - 2.8, mid + 2.8] {
            ctx.draw(&Circle {
                x,
                y,
                radius: 0.5,
                color: Color::White,
            });
        }
    }
}

fn dashed(ctx: &mut Context, from: (f64, f64), to: (f64, f64), color: Color) {
    const DASH: f64 = 2.0;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f64::EPSILON {
        return;
    }
    let steps = (len / DASH).floor() as usize;
    for step in (0..steps).step_by(2) {
        let a = step as f64 * DASH / len;
        let b = ((step + 1) as f64 * DASH / len).min(1.0);
        ctx.draw(&CanvasLine::new(
            from.0 + dx * a,
            from.1 + dy * a,
            from.0 + dx * b,
            from.1 + dy * b,
            color,
        ));
    }
}

fn render_events_near(frame: &mut Frame, area: Rect, state: &AppState, snap: &HubSnapshot) {
    let t = state.timeline.cursor();
    let near = events_near(&snap.events, ACTIVE_FIXTURE_ID, t);
    let text = if near.is_empty() {
        "No events within 2s".to_string()
    } else {
        event_rows(near, &snap.players)
            .into_iter()
            .map(|row| {
                let who = if row.player_id.is_none() {
                    "(team)".to_string()
                } else {
                    or_dash(&row.player.name())
                };
                format!("{:>5}s {:<14} {} {}", row.time_s, row.event, who, row.notes)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title(format!("Events near {t}s")).borders(Borders::ALL)),
        area,
    );
}

fn render_timeline_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let active = state.tracking.panel == TrackingPanel::Timeline;
    let timeline = &state.timeline;
    let (lo, hi) = timeline.bounds();
    let block = panel_block(TrackingPanel::Timeline.label(), active);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let status = if timeline.is_playing() { "Playing" } else { "Paused" };
    frame.render_widget(
        Paragraph::new(format!(
            "{status} | Speed {}\nRange {lo}s - {hi}s",
            timeline.speed().label()
        )),
        parts[0],
    );

    let span = (hi - lo).max(1) as f64;
    let ratio = ((timeline.cursor() - lo) as f64 / span).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(ratio)
        .label(format!("{}s", timeline.cursor()));
    frame.render_widget(gauge, parts[1]);
}

fn render_tagging_panel(frame: &mut Frame, area: Rect, state: &AppState, snap: &HubSnapshot) {
    let tag = &state.tracking;
    let active = tag.panel == TrackingPanel::Tagging;
    let player = match state.tag_player_id(snap) {
        Some(id) => or_dash(&PlayerRef::lookup(&snap.players, Some(id)).name()),
        None => "(team)".to_string(),
    };
    let mut lines = Vec::new();
    for field in TagField::ALL {
        let prefix = if active && field == tag.tag_field { "> " } else { "  " };
        let (label, value) = match field {
            TagField::Player => ("Player", player.clone()),
            TagField::Event => ("Event", tag.tag_event_kind().label().to_string()),
            TagField::Time => ("Time (s)", tag.tag_time.to_string()),
            TagField::Notes => ("Notes", or_dash(&tag.tag_notes)),
        };
        lines.push(format!("{prefix}{label:<9} {value}"));
    }
    frame.render_widget(
        Paragraph::new(lines.join("\n")).block(panel_block(TrackingPanel::Tagging.label(), active)),
        area,
    );
}

fn render_markers_panel(frame: &mut Frame, area: Rect, state: &AppState, snap: &HubSnapshot) {
    let tracking = &state.tracking;
    let active = tracking.panel == TrackingPanel::Markers;
    let mut lines = vec![
        format!(
            "Cursor {:.0},{:.0} | Team {} | Bench {}",
            tracking.cursor.0,
            tracking.cursor.1,
            tracking.marker_team.label(),
            if tracking.marker_bench { "yes" } else { "no" }
        ),
        format!("Saves at {}s", state.timeline.cursor()),
    ];
    if tracking.markers.is_empty() {
        lines.push("No markers. Press m to drop one".to_string());
    }
    for (idx, marker) in tracking.markers.iter().enumerate() {
        let prefix = if idx == tracking.marker_selected { "> " } else { "  " };
        let who = match marker.player_id {
            Some(id) => or_dash(&PlayerRef::lookup(&snap.players, Some(id)).name()),
            None => "(skip)".to_string(),
        };
        lines.push(format!(
            "{prefix}{} ({:.0},{:.0}) {who}",
            idx + 1,
            marker.x_pct,
            marker.y_pct
        ));
    }
    frame.render_widget(
        Paragraph::new(lines.join("\n")).block(panel_block(TrackingPanel::Markers.label(), active)),
        area,
    );
}

fn render_sync(frame: &mut Frame, area: Rect, state: &AppState) {
    let sync = &state.sync;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(1)])
        .split(area);

    let mut lines = Vec::new();
    for field in SyncField::ALL {
        let prefix = if field == sync.field { "> " } else { "  " };
        let (label, value) = match field {
            SyncField::Path => ("Import file", or_dash(&sync.path)),
            SyncField::Kind => ("Import type", sync.kind.label().to_string()),
            SyncField::LegacyDir => ("Legacy data dir", or_dash(&sync.legacy_dir)),
            SyncField::ExportPath => ("Export workbook", or_dash(&sync.export_path)),
        };
        lines.push(format!("{prefix}{label:<16} {value}"));
    }
    if let Some(msg) = &sync.message {
        lines.push(String::new());
        lines.push(msg.clone());
    }
    frame.render_widget(
        Paragraph::new(lines.join("\n"))
            .wrap(Wrap { trim: false })
            .block(panel_block("Data sync", true)),
        rows[0],
    );

    let text = match &sync.preview {
        None => "No preview. Choose a CSV or XLSX file and press p".to_string(),
        Some(preview) if preview.players.is_empty() => {
            format!("{} contains no player rows", preview.source)
        }
        Some(preview) => {
            let mut lines = vec![format!(
                "{:>5} {:<16} {:<16} {:<12} {:<9} {}",
                "ID", "First", "Last", "RFU ID", "Front row", "Concussions"
            )];
            let visible = rows[1].height.saturating_sub(3) as usize;
            for p in preview.players.iter().take(visible) {
                lines.push(format!(
                    "{:>5} {:<16} {:<16} {:<12} {:<9} {}",
                    p.player_id,
                    truncate(&p.first_name, 16),
                    truncate(&p.last_name, 16),
                    p.rfu_id.clone().unwrap_or_default(),
                    if p.front_row_trained { "yes" } else { "no" },
                    p.suspected_concussions
                ));
            }
            if preview.players.len() > visible {
                lines.push(format!("... {} more", preview.players.len() - visible));
            }
            lines.join("\n")
        }
    };
    let title = match &sync.preview {
        Some(preview) => format!("Preview: {} ({} rows)", preview.kind.label(), preview.players.len()),
        None => "Preview".to_string(),
    };
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL)),
        rows[1],
    );
}

fn render_settings(frame: &mut Frame, area: Rect, state: &AppState) {
    let settings = &state.settings;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(1)])
        .split(area);

    let fixture_active = settings.panel == SettingsPanel::Fixture;
    let lines = FixtureField::ALL
        .iter()
        .map(|field| {
            let prefix = if fixture_active && *field == settings.fixture_field {
                "> "
            } else {
                "  "
            };
            format!("{prefix}{:<18} {}", field.label(), settings.form.value(*field))
        })
        .collect::<Vec<_>>();
    frame.render_widget(
        Paragraph::new(lines.join("\n")).block(panel_block("Fixture (saved as fixture 1)", fixture_active)),
        rows[0],
    );

    let roster_active = settings.panel == SettingsPanel::Roster;
    let title = if settings.roster_dirty {
        format!("Roster ({} players, unsaved)", settings.roster.len())
    } else {
        format!("Roster ({} players)", settings.roster.len())
    };
    let widths = [5usize, 12, 14, 5, 11, 18, 10, 9, 11];
    let header = RosterColumn::ALL
        .iter()
        .zip(widths)
        .map(|(col, w)| format!("{:<w$}", truncate(col.label(), w)))
        .collect::<Vec<_>>()
        .join(" ");
    let mut lines = vec![Line::from(format!("  {header}"))];
    let visible = rows[1].height.saturating_sub(3) as usize;
    let (start, end) = visible_range(settings.roster_row, settings.roster.len(), visible);
    for (idx, player) in settings.roster.iter().enumerate().take(end).skip(start) {
        let selected_row = roster_active && idx == settings.roster_row;
        let mut spans = vec![Span::raw(if selected_row { "> " } else { "  " })];
        for (col_idx, (col, w)) in RosterColumn::ALL.iter().zip(widths).enumerate() {
            let cell = format!("{:<w$}", truncate(&col.cell(player), w));
            let style = if selected_row && col_idx == settings.roster_col {
                Style::default().fg(Color::Black).bg(ACTIVE_BORDER)
            } else {
                Style::default()
            };
            spans.push(Span::styled(cell, style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }
    if settings.roster.is_empty() {
        lines.push(Line::from("  No players. Press a to add a row"));
    }
    frame.render_widget(
        Paragraph::new(lines).block(panel_block(&title, roster_active)),
        rows[1],
    );
}

fn console_text(state: &AppState, visible: u16) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let visible = visible.max(1) as usize;
    let start = state.logs.len().saturating_sub(visible);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_input_popup(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(input) = &state.input else {
        return;
    };
    let popup = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup);
    let widget = Paragraph::new(format!("{}_", input.buffer))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(input.target.prompt())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACTIVE_BORDER)),
        );
    frame.render_widget(widget, popup);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup_area);

    let event_types = EventKind::ALL
        .iter()
        .map(|k| k.label())
        .collect::<Vec<_>>()
        .join(", ");
    let text = [
        "KLRUFC Coaching Hub - Help".to_string(),
        String::new(),
        "Global:".to_string(),
        "  1-6          Jump to page".to_string(),
        "  [ / ]        Previous / next page".to_string(),
        "  ?            Toggle help".to_string(),
        "  q            Quit".to_string(),
        String::new(),
        "Forms:".to_string(),
        "  j/k or ↑/↓   Move between fields / rows".to_string(),
        "  h/l or ←/→   Adjust value / column".to_string(),
        "  Enter        Edit text, Esc cancels".to_string(),
        "  s            Save".to_string(),
        String::new(),
        "Video & Tracking:".to_string(),
        "  Tab          Timeline / tagging / markers".to_string(),
        "  v            List or pitch view".to_string(),
        "  Space        Play / pause".to_string(),
        "  + / -        Playback speed".to_string(),
        "  m, p, t, b   Drop marker, map player, team, bench".to_string(),
        String::new(),
        format!("Event types: {event_types}"),
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    text.chars().take(width.saturating_sub(1)).chain(['~']).collect()
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

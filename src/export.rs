use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::cache::HubSnapshot;
use crate::model::{Availability, Fixture, Player};
use crate::views::{PlayerRef, event_rows, tracking_rows};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub players: usize,
    pub fixtures: usize,
    pub availability: usize,
    pub ratings: usize,
    pub tracking: usize,
    pub events: usize,
}

pub fn export_workbook(path: &Path, snap: &HubSnapshot) -> Result<ExportReport> {
    let mut players_rows = vec![vec![
        "Player ID".to_string(),
        "First Name".to_string(),
        "Last Name".to_string(),
        "Shirt #".to_string(),
        "Status".to_string(),
        "Injury Notes".to_string(),
        "RFU ID".to_string(),
        "Front Row Trained".to_string(),
        "Suspected Concussions".to_string(),
    ]];
    players_rows.extend(snap.players.iter().map(player_row));

    let mut fixtures_rows = vec![vec![
        "Fixture ID".to_string(),
        "Team".to_string(),
        "Opposition".to_string(),
        "Venue".to_string(),
        "Ground".to_string(),
        "Date".to_string(),
        "Kickoff".to_string(),
        "Selected".to_string(),
        "Video".to_string(),
    ]];
    fixtures_rows.extend(snap.fixtures.iter().map(|f| fixture_row(f, &snap.players)));

    let mut availability_rows = vec![vec![
        "Player ID".to_string(),
        "Player".to_string(),
        "Available".to_string(),
        "Reason".to_string(),
    ]];
    availability_rows.extend(
        snap.availability
            .iter()
            .map(|a| availability_row(a, &snap.players)),
    );

    let mut rating_rows = vec![vec![
        "Fixture ID".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Go Forward".to_string(),
        "Attitude".to_string(),
        "Mighty Defence".to_string(),
        "Energy".to_string(),
        "Notes".to_string(),
    ]];
    for s in &snap.analysis {
        rating_rows.push(vec![
            s.fixture_id.to_string(),
            s.player_id.to_string(),
            PlayerRef::lookup(&snap.players, Some(s.player_id)).name(),
            s.go_forward.to_string(),
            s.attitude.to_string(),
            s.mighty_defence.to_string(),
            s.energy.to_string(),
            s.notes.clone(),
        ]);
    }

    let mut tracking_sheet = vec![vec![
        "Fixture ID".to_string(),
        "Time (s)".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Shirt #".to_string(),
        "X %".to_string(),
        "Y %".to_string(),
        "Team".to_string(),
        "Bench".to_string(),
    ]];
    for row in tracking_rows(&snap.tracking, &snap.players) {
        tracking_sheet.push(vec![
            row.fixture_id.to_string(),
            row.time_s.to_string(),
            row.player_id.to_string(),
            row.player.name(),
            opt_to_string(row.player.shirt_number),
            format!("{:.2}", row.x_pct),
            format!("{:.2}", row.y_pct),
            row.team.label().to_string(),
            yes_no(row.bench),
        ]);
    }

    let mut events_sheet = vec![vec![
        "Fixture ID".to_string(),
        "Time (s)".to_string(),
        "Event".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Notes".to_string(),
    ]];
    for row in event_rows(&snap.events, &snap.players) {
        events_sheet.push(vec![
            row.fixture_id.to_string(),
            row.time_s.to_string(),
            row.event,
            opt_to_string(row.player_id),
            row.player.name(),
            row.notes,
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_rows(sheet, &players_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Fixtures")?;
        write_rows(sheet, &fixtures_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Availability")?;
        write_rows(sheet, &availability_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("GAME")?;
        write_rows(sheet, &rating_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Tracking")?;
        write_rows(sheet, &tracking_sheet)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Events")?;
        write_rows(sheet, &events_sheet)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        players: players_rows.len().saturating_sub(1),
        fixtures: fixtures_rows.len().saturating_sub(1),
        availability: availability_rows.len().saturating_sub(1),
        ratings: rating_rows.len().saturating_sub(1),
        tracking: tracking_sheet.len().saturating_sub(1),
        events: events_sheet.len().saturating_sub(1),
    })
}

fn player_row(p: &Player) -> Vec<String> {
    vec![
        p.player_id.to_string(),
        p.first_name.clone(),
        p.last_name.clone(),
        opt_to_string(p.shirt_number),
        p.status.as_str().to_string(),
        p.injury_notes.clone(),
        p.rfu_id.clone().unwrap_or_default(),
        yes_no(p.front_row_trained),
        p.suspected_concussions.to_string(),
    ]
}

fn fixture_row(f: &Fixture, players: &[Player]) -> Vec<String> {
    let selected = f
        .selected_player_ids
        .iter()
        .map(|id| {
            let name = PlayerRef::lookup(players, Some(*id)).name();
            if name.is_empty() {
                id.to_string()
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        f.fixture_id.to_string(),
        f.team.clone(),
        f.opposition.clone(),
        f.venue.label().to_string(),
        f.ground_address.clone(),
        f.date_label(),
        f.kickoff_label(),
        selected,
        f.video_url.clone().unwrap_or_default(),
    ]
}

fn availability_row(a: &Availability, players: &[Player]) -> Vec<String> {
    vec![
        a.player_id.to_string(),
        PlayerRef::lookup(players, Some(a.player_id)).name(),
        yes_no(a.available),
        a.reason.clone(),
    ]
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

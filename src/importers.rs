use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Reader, open_workbook_auto};

use crate::model::{Player, PlayerStatus};

const FIRST_NAME_ALIASES: &[&str] = &["first name", "first_name", "firstname", "given name"];
const LAST_NAME_ALIASES: &[&str] = &[
    "last name",
    "last_name",
    "lastname",
    "surname",
    "family name",
];
const RFU_ID_ALIASES: &[&str] = &["rfu id", "rfu_id", "rfuid"];
const FRONT_ROW_ALIASES: &[&str] = &["front row trained", "front_row_trained"];
const CONCUSSION_ALIASES: &[&str] = &["suspected concussions", "suspected_concussions"];

/// A header row plus string cells, whatever the source format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// Index of the first header matching any alias, ignoring case and
    /// surrounding whitespace.
    pub fn column(&self, aliases: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| {
            let h = h.trim().to_lowercase();
            aliases.iter().any(|alias| *alias == h)
        })
    }

    pub fn cell<'a>(row: &'a [String], col: Option<usize>) -> Option<&'a str> {
        let value = row.get(col?)?.trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    GmsPlayers,
    SpondPlayers,
}

impl ImportKind {
    pub const ALL: [ImportKind; 2] = [ImportKind::GmsPlayers, ImportKind::SpondPlayers];

    pub fn label(self) -> &'static str {
        match self {
            ImportKind::GmsPlayers => "RFU GMS players",
            ImportKind::SpondPlayers => "Spond players",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ImportKind::GmsPlayers => ImportKind::SpondPlayers,
            ImportKind::SpondPlayers => ImportKind::GmsPlayers,
        }
    }

    pub fn parse_sheet(self, sheet: &RawSheet, first_id: i64) -> Vec<Player> {
        match self {
            ImportKind::GmsPlayers => parse_players_from_gms(sheet, first_id),
            ImportKind::SpondPlayers => parse_players_from_spond(sheet, first_id),
        }
    }
}

pub fn import_players(path: &Path, kind: ImportKind, first_id: i64) -> Result<Vec<Player>> {
    let sheet = read_sheet(path)?;
    Ok(kind.parse_sheet(&sheet, first_id))
}

/// Inclusive id range of an import batch, e.g. "ids 4..=6"; empty batches have none.
pub fn id_range_label(players: &[Player]) -> Option<String> {
    let first = players.first()?.player_id;
    let last = players.last()?.player_id;
    Some(format!("ids {first}..={last}"))
}

/// Maps an RFU GMS report export onto the player schema.
pub fn parse_players_from_gms(sheet: &RawSheet, first_id: i64) -> Vec<Player> {
    let rfu = sheet.column(RFU_ID_ALIASES);
    let first = sheet.column(FIRST_NAME_ALIASES);
    let last = sheet.column(LAST_NAME_ALIASES);
    let front_row = sheet.column(FRONT_ROW_ALIASES);
    let concussions = sheet.column(CONCUSSION_ALIASES);

    sheet
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| Player {
            player_id: first_id + idx as i64,
            first_name: RawSheet::cell(row, first).unwrap_or_default().to_string(),
            last_name: RawSheet::cell(row, last).unwrap_or_default().to_string(),
            status: PlayerStatus::Available,
            injury_notes: String::new(),
            shirt_number: None,
            rfu_id: RawSheet::cell(row, rfu).map(str::to_string),
            front_row_trained: RawSheet::cell(row, front_row)
                .map(parse_bool_lenient)
                .unwrap_or(false),
            suspected_concussions: RawSheet::cell(row, concussions)
                .and_then(parse_int_lenient)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
        })
        .collect()
}

/// Maps a Spond member export onto the player schema. Only names carry over.
pub fn parse_players_from_spond(sheet: &RawSheet, first_id: i64) -> Vec<Player> {
    let first = sheet.column(FIRST_NAME_ALIASES);
    let last = sheet.column(LAST_NAME_ALIASES);

    sheet
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            Player::new(
                first_id + idx as i64,
                RawSheet::cell(row, first).unwrap_or_default(),
                RawSheet::cell(row, last).unwrap_or_default(),
            )
        })
        .collect()
}

pub fn read_sheet(path: &Path) -> Result<RawSheet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv_sheet(path),
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook_sheet(path),
        _ => bail!(
            "unsupported import file {} (expected .csv or .xlsx)",
            path.display()
        ),
    }
}

pub fn read_csv_sheet(path: &Path) -> Result<RawSheet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read import file {}", path.display()))?;
    parse_csv_str(&raw).with_context(|| format!("parse csv {}", path.display()))
}

pub fn parse_csv_str(raw: &str) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .context("read csv header row")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(anyhow!("missing header row"));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read csv row {}", idx + 2))?;
        let row = record.iter().map(str::to_string).collect::<Vec<_>>();
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(row);
    }
    Ok(RawSheet { headers, rows })
}

/// Reads the first worksheet; the first row is the header.
pub fn read_workbook_sheet(path: &Path) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("open workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook {} has no worksheets", path.display()))?
        .with_context(|| format!("read first worksheet of {}", path.display()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(anyhow!("missing header row"));
    };
    let headers = header.iter().map(cell_to_string).collect::<Vec<_>>();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(anyhow!("missing header row"));
    }

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();
    Ok(RawSheet { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

/// Integer from cells like `"7"`, `" 7 "` or `"7.0"`.
pub fn parse_int_lenient(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_bool_lenient(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "t" | "1" | "1.0" | "x"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_int_accepts_float_text() {
        assert_eq!(parse_int_lenient("3.0"), Some(3));
        assert_eq!(parse_int_lenient(" 12 "), Some(12));
        assert_eq!(parse_int_lenient("3.5"), None);
        assert_eq!(parse_int_lenient("nan"), None);
    }

    #[test]
    fn column_match_ignores_case_and_padding() {
        let sheet = RawSheet {
            headers: vec!["  First Name ".to_string(), "SURNAME".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(sheet.column(FIRST_NAME_ALIASES), Some(0));
        assert_eq!(sheet.column(LAST_NAME_ALIASES), Some(1));
        assert_eq!(sheet.column(RFU_ID_ALIASES), None);
    }

    #[test]
    fn csv_without_header_is_rejected() {
        assert!(parse_csv_str("").is_err());
    }
}

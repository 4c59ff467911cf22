use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_xlsxwriter::Workbook;

use coaching_hub::importers::{
    ImportKind, id_range_label, import_players, parse_csv_str, parse_players_from_gms,
    parse_players_from_spond, read_sheet,
};
use coaching_hub::model::PlayerStatus;
use coaching_hub::store;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn temp_file(ext: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "coaching_hub_import_{}_{n}.{ext}",
        std::process::id()
    ))
}

#[test]
fn gms_export_maps_aliases_and_defaults() {
    let players = import_players(&fixture_path("gms_players.csv"), ImportKind::GmsPlayers, 10)
        .expect("gms fixture should import");
    assert_eq!(players.len(), 3);

    let tom = &players[0];
    assert_eq!(tom.player_id, 10);
    assert_eq!(tom.first_name, "Tom");
    assert_eq!(tom.last_name, "Hartley");
    assert_eq!(tom.rfu_id.as_deref(), Some("100231"));
    assert!(tom.front_row_trained);
    assert_eq!(tom.status, PlayerStatus::Available);
    assert_eq!(tom.shirt_number, None);

    assert_eq!(players[1].suspected_concussions, 1);
    assert!(!players[1].front_row_trained);
    assert_eq!(players[2].player_id, 12);
    assert_eq!(players[2].suspected_concussions, 0);
    assert!(!players[2].front_row_trained);
}

#[test]
fn spond_export_keeps_only_names() {
    let players = import_players(
        &fixture_path("spond_members.csv"),
        ImportKind::SpondPlayers,
        1,
    )
    .expect("spond fixture should import");
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].display_name(), "Ella Dawson");
    assert_eq!(players[1].player_id, 2);
    assert_eq!(players[1].rfu_id, None);
    assert_eq!(players[1].status, PlayerStatus::Available);
}

#[test]
fn missing_name_columns_give_blank_names() {
    let sheet = parse_csv_str("Email,Phone\na@example.com,1\n").unwrap();
    let players = parse_players_from_spond(&sheet, 1);
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].first_name, "");
    assert_eq!(players[0].last_name, "");

    let gms = parse_players_from_gms(&sheet, 5);
    assert_eq!(gms[0].rfu_id, None);
    assert_eq!(gms[0].player_id, 5);
}

#[test]
fn reimporting_twice_gives_distinct_ids() {
    let mut conn = store::open_in_memory().unwrap();
    let path = fixture_path("spond_members.csv");

    let first = import_players(&path, ImportKind::SpondPlayers, store::next_player_id(&conn).unwrap())
        .unwrap();
    store::append_players(&mut conn, &first).unwrap();
    let second = import_players(&path, ImportKind::SpondPlayers, store::next_player_id(&conn).unwrap())
        .unwrap();
    store::append_players(&mut conn, &second).unwrap();

    let first_ids = first.iter().map(|p| p.player_id).collect::<Vec<_>>();
    let second_ids = second.iter().map(|p| p.player_id).collect::<Vec<_>>();
    assert_eq!(first_ids, vec![1, 2]);
    assert_eq!(second_ids, vec![3, 4]);
    assert_eq!(store::load_players(&conn).unwrap().len(), 4);
}

#[test]
fn xlsx_workbook_reads_first_sheet() {
    let path = temp_file("xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "RFU ID").unwrap();
    sheet.write_string(0, 1, "First Name").unwrap();
    sheet.write_string(0, 2, "Last Name").unwrap();
    sheet.write_string(0, 3, "Suspected Concussions").unwrap();
    sheet.write_number(1, 0, 555123.0).unwrap();
    sheet.write_string(1, 1, "Ella").unwrap();
    sheet.write_string(1, 2, "Dawson").unwrap();
    sheet.write_number(1, 3, 2.0).unwrap();
    workbook.save(&path).unwrap();

    let players = import_players(&path, ImportKind::GmsPlayers, 1).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(players.len(), 1);
    assert_eq!(players[0].rfu_id.as_deref(), Some("555123"));
    assert_eq!(players[0].display_name(), "Ella Dawson");
    assert_eq!(players[0].suspected_concussions, 2);
}

#[test]
fn unsupported_extension_is_an_error() {
    let path = temp_file("txt");
    fs::write(&path, "First Name,Last Name\nA,B\n").unwrap();
    let err = read_sheet(&path).expect_err("txt should be rejected");
    let _ = fs::remove_file(&path);
    assert!(err.to_string().contains("unsupported import file"));
}

#[test]
fn missing_file_is_an_error() {
    let path = temp_file("csv");
    assert!(import_players(&path, ImportKind::GmsPlayers, 1).is_err());
}

#[test]
fn blank_rows_are_skipped() {
    let sheet = parse_csv_str("First Name,Last Name\nA,B\n,\n\nC,D\n").unwrap();
    assert_eq!(sheet.rows.len(), 2);
}

#[test]
fn id_range_label_is_inclusive_and_absent_for_empty_batches() {
    let sheet = parse_csv_str("First Name,Last Name\nA,B\nC,D\nE,F\n").unwrap();
    let players = parse_players_from_spond(&sheet, 4);
    assert_eq!(id_range_label(&players).as_deref(), Some("ids 4..=6"));
    assert_eq!(id_range_label(&players[..1]).as_deref(), Some("ids 4..=4"));
    assert_eq!(id_range_label(&[]), None);
}

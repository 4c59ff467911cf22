use std::path::PathBuf;

use anyhow::{Result, anyhow};

use coaching_hub::cache::HubSnapshot;
use coaching_hub::config::{Config, arg_value};
use coaching_hub::importers::{ImportKind, id_range_label, import_players};
use coaching_hub::{export, legacy, logs, store};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::load(&args)?;
    if let Err(err) = logs::init_logger(&config.log_file, config.log_level, true) {
        eprintln!("warning: file logging disabled: {err:#}");
    }

    let gms = arg_value(&args, "--gms").map(PathBuf::from);
    let spond = arg_value(&args, "--spond").map(PathBuf::from);
    let legacy_dir = arg_value(&args, "--legacy").map(PathBuf::from);
    let export_path = arg_value(&args, "--export").map(PathBuf::from);
    if gms.is_none() && spond.is_none() && legacy_dir.is_none() && export_path.is_none() {
        return Err(anyhow!(
            "nothing to do: pass --gms <file>, --spond <file>, --legacy <dir> or --export <file>"
        ));
    }

    let mut conn = store::open_db(&config.db_path)?;
    println!("DB: {}", config.db_path.display());

    if let Some(dir) = legacy_dir {
        let summary = legacy::migrate_data_dir(&dir, &mut conn)?;
        println!("Legacy migration from {}", dir.display());
        println!(
            "  players={} fixtures={} availability={} ratings={} tracking={} events={}",
            summary.players,
            summary.fixtures,
            summary.availability,
            summary.analysis,
            summary.tracking,
            summary.events
        );
        if !summary.skipped.is_empty() {
            println!("  skipped: {}", summary.skipped.len());
            for item in summary.skipped.iter().take(8) {
                println!("   - {item}");
            }
        }
    }

    for (kind, path) in [(ImportKind::GmsPlayers, gms), (ImportKind::SpondPlayers, spond)] {
        let Some(path) = path else {
            continue;
        };
        let first_id = store::next_player_id(&conn)?;
        let players = import_players(&path, kind, first_id)?;
        store::append_players(&mut conn, &players)?;
        log::info!(
            "imported {} players from {} ({})",
            players.len(),
            path.display(),
            kind.label()
        );
        let range = id_range_label(&players)
            .map(|label| format!(" ({label})"))
            .unwrap_or_default();
        println!(
            "{}: {} players from {}{range}",
            kind.label(),
            players.len(),
            path.display()
        );
    }

    if let Some(path) = export_path {
        let snap = HubSnapshot::load(&conn)?;
        let report = export::export_workbook(&path, &snap)?;
        println!("Export written to {}", path.display());
        println!(
            "  players={} fixtures={} availability={} ratings={} tracking={} events={}",
            report.players,
            report.fixtures,
            report.availability,
            report.ratings,
            report.tracking,
            report.events
        );
    }

    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::logs::parse_level;
use crate::store;
use crate::timeline::DEFAULT_TICK_MS;

const MIN_PLAYBACK_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub export_path: PathBuf,
    pub playback_base: Duration,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
}

impl Config {
    /// Environment first (after `.env.local` / `.env` are loaded by the
    /// binary), then `--db` from the command line.
    pub fn load(args: &[String]) -> Result<Self> {
        let db_path = arg_value(args, "--db")
            .map(PathBuf::from)
            .or_else(|| env_nonempty("HUB_DB_PATH").map(PathBuf::from))
            .or_else(store::default_db_path)
            .context("unable to resolve sqlite path")?;

        let playback_ms = env_nonempty("HUB_PLAYBACK_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TICK_MS)
            .max(MIN_PLAYBACK_MS);

        let log_file = env_nonempty("HUB_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| db_path.with_file_name("coaching_hub.log"));

        Ok(Self {
            data_dir: env_nonempty("HUB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            export_path: env_nonempty("HUB_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("coaching_hub_export.xlsx")),
            playback_base: Duration::from_millis(playback_ms),
            log_file,
            log_level: env_nonempty("HUB_LOG_LEVEL")
                .map(|raw| parse_level(&raw))
                .unwrap_or(LevelFilter::Info),
            db_path,
        })
    }
}

/// Value of `--flag <value>` or `--flag=<value>`; blank values are ignored.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::arg_value;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_accepts_both_spellings() {
        assert_eq!(
            arg_value(&args(&["--db", "/tmp/a.sqlite"]), "--db").as_deref(),
            Some("/tmp/a.sqlite")
        );
        assert_eq!(
            arg_value(&args(&["--db=/tmp/b.sqlite"]), "--db").as_deref(),
            Some("/tmp/b.sqlite")
        );
    }

    #[test]
    fn blank_or_dangling_flag_is_ignored() {
        assert_eq!(arg_value(&args(&["--db="]), "--db"), None);
        assert_eq!(arg_value(&args(&["--db"]), "--db"), None);
        assert_eq!(arg_value(&args(&["--gms", "x.csv"]), "--db"), None);
    }
}

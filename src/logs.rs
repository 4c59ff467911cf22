use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::{
    Config, Handle,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            RollingFileAppender,
            policy::compound::{
                CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
            },
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use once_cell::sync::OnceCell;

const LOG_SIZE_LIMIT: u64 = 5 * 1024 * 1024; // 5 MB

const LOG_FILE_COUNT: u32 = 3;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}";

static HANDLE: OnceCell<Handle> = OnceCell::new();

pub fn parse_level(raw: &str) -> LevelFilter {
    raw.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
}

/// Routes the `log` macros to a size-rolled file. `stderr` adds a console
/// appender at info level; the TUI never sets it since it owns the terminal.
pub fn init_logger(file_path: &Path, level: LevelFilter, stderr: bool) -> Result<()> {
    if let Some(dir) = file_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log dir {}", dir.display()))?;
        }
    }
    let archive_pattern = format!("{}.{{}}", file_path.display());

    let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, LOG_FILE_COUNT)
        .context("build log roller")?;
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(file_path, Box::new(policy))
        .with_context(|| format!("open log file {}", file_path.display()))?;

    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(level)))
            .build("logfile", Box::new(logfile)),
    );
    let mut root = Root::builder().appender("logfile");
    if stderr {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new("{l} - {m}{n}")))
            .build();
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Info)))
                .build("stderr", Box::new(console)),
        );
        root = root.appender("stderr");
    }
    let config = builder
        .build(root.build(LevelFilter::Trace))
        .context("build log config")?;

    if let Some(handle) = HANDLE.get() {
        handle.set_config(config);
        return Ok(());
    }
    let handle = log4rs::init_config(config).context("install logger")?;
    let _ = HANDLE.set(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_level;
    use log::LevelFilter;

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }
}

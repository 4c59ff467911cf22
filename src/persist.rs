use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::timeline::PlaybackSpeed;
use crate::views::Page;

const CACHE_DIR: &str = "coaching_hub";
const CACHE_FILE: &str = "session.json";
const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub version: u32,
    pub page: String,
    pub timeline_cursor: i64,
    pub speed: PlaybackSpeed,
    #[serde(default = "default_fixture_id")]
    pub analysis_fixture_id: i64,
}

fn default_fixture_id() -> i64 {
    1
}

impl SessionFile {
    pub fn capture(state: &AppState) -> Self {
        Self {
            version: SESSION_VERSION,
            page: state.page.key().to_string(),
            timeline_cursor: state.timeline.cursor(),
            speed: state.timeline.speed(),
            analysis_fixture_id: state.analysis.fixture_id,
        }
    }

    /// Restores into a state whose timeline bounds are already known, so the
    /// saved cursor is clamped to the current data.
    pub fn apply(&self, state: &mut AppState) {
        if let Some(page) = Page::from_key(&self.page) {
            state.page = page;
        }
        state.timeline.set_speed(self.speed);
        state.timeline.scrub(self.timeline_cursor);
        state.analysis.fixture_id = self.analysis_fixture_id.max(1);
    }
}

pub fn load_into_state(state: &mut AppState) {
    let Some(path) = session_path() else {
        return;
    };
    if let Some(session) = load_session_file(&path) {
        session.apply(state);
    }
}

pub fn save_from_state(state: &AppState) {
    let Some(path) = session_path() else {
        return;
    };
    if let Err(err) = save_session_file(&path, &SessionFile::capture(state)) {
        log::warn!("session save to {} failed: {err}", path.display());
    }
}

/// `None` when the file is missing, unreadable or from another version.
pub fn load_session_file(path: &Path) -> Option<SessionFile> {
    let raw = fs::read_to_string(path).ok()?;
    let session = serde_json::from_str::<SessionFile>(&raw).ok()?;
    if session.version != SESSION_VERSION {
        log::info!("ignoring session file {} (version {})", path.display(), session.version);
        return None;
    }
    Some(session)
}

pub fn save_session_file(path: &Path, session: &SessionFile) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string(session)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn session_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}

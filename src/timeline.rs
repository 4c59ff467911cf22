use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::model::{Event, TrackingPoint};

pub const DEFAULT_WINDOW: (i64, i64) = (0, 120);
pub const DEFAULT_TICK_MS: u64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    Half,
    Normal,
    Double,
}

impl PlaybackSpeed {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackSpeed::Half => "0.5x",
            PlaybackSpeed::Normal => "1x",
            PlaybackSpeed::Double => "2x",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PlaybackSpeed::Half => PlaybackSpeed::Normal,
            PlaybackSpeed::Normal => PlaybackSpeed::Double,
            PlaybackSpeed::Double => PlaybackSpeed::Half,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PlaybackSpeed::Half => PlaybackSpeed::Double,
            PlaybackSpeed::Normal => PlaybackSpeed::Half,
            PlaybackSpeed::Double => PlaybackSpeed::Normal,
        }
    }

    /// Wall-clock delay between one-second steps.
    pub fn tick_interval(self, base: Duration) -> Duration {
        match self {
            PlaybackSpeed::Half => base * 2,
            PlaybackSpeed::Normal => base,
            PlaybackSpeed::Double => base / 2,
        }
    }
}

/// Inclusive `[min, max]` of observed times, or the default window when
/// neither table has rows for the fixture.
pub fn time_bounds(tracking: &[TrackingPoint], events: &[Event], fixture_id: i64) -> (i64, i64) {
    let times = tracking
        .iter()
        .filter(|p| p.fixture_id == fixture_id)
        .map(|p| p.time_s)
        .chain(
            events
                .iter()
                .filter(|e| e.fixture_id == fixture_id)
                .map(|e| e.time_s),
        );

    let mut bounds: Option<(i64, i64)> = None;
    for t in times {
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(t), hi.max(t)),
            None => (t, t),
        });
    }
    bounds.unwrap_or(DEFAULT_WINDOW)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    cursor: i64,
    playing: bool,
    speed: PlaybackSpeed,
    min: i64,
    max: i64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            cursor: DEFAULT_WINDOW.0,
            playing: false,
            speed: PlaybackSpeed::Normal,
            min: DEFAULT_WINDOW.0,
            max: DEFAULT_WINDOW.1,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    pub fn set_bounds(&mut self, min: i64, max: i64) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.min = min;
        self.max = max;
        self.cursor = self.clamp(self.cursor);
        if self.playing && self.cursor >= self.max {
            self.playing = false;
        }
    }

    pub fn step(&mut self, delta: i64) {
        self.cursor = self.clamp(self.cursor.saturating_add(delta));
    }

    pub fn scrub(&mut self, t: i64) {
        self.cursor = self.clamp(t);
    }

    pub fn rewind(&mut self) {
        self.cursor = self.min;
    }

    pub fn seek_end(&mut self) {
        self.cursor = self.max;
    }

    /// Starting playback from the upper bound rewinds first.
    pub fn toggle_play(&mut self) {
        if self.playing {
            self.playing = false;
            return;
        }
        if self.cursor >= self.max {
            if self.min == self.max {
                return;
            }
            self.cursor = self.min;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    pub fn cycle_speed(&mut self) {
        self.speed = self.speed.next();
    }

    /// One playback step. Returns whether the cursor moved.
    pub fn tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        if self.cursor >= self.max {
            self.playing = false;
            return false;
        }
        self.cursor += 1;
        if self.cursor >= self.max {
            self.playing = false;
        }
        true
    }

    fn clamp(&self, t: i64) -> i64 {
        t.clamp(self.min, self.max)
    }
}

/// Timer that fires once per elapsed interval. The run loop owns it and
/// feeds each fire into [`Timeline::tick`].
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last: Instant,
}

impl Ticker {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            last: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .checked_sub(now.saturating_duration_since(self.last))
            .unwrap_or(Duration::ZERO)
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            return true;
        }
        false
    }
}

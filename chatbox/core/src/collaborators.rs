//! Read-Only Collaborators
//!
//! The idle status block shows the local time and the current avatar name.
//! Both come from outside the transport, behind narrow traits so hosts and
//! tests can substitute their own.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Local};
use parking_lot::Mutex;
use serde::Deserialize;

/// Shown when no avatar name is available
pub const UNKNOWN_AVATAR: &str = "Unknown";

/// File the avatar switcher writes the current avatar to
pub const AVATAR_FILE: &str = "last_avatar.json";

/// How long [`FileAvatarSource`] reuses a name before reading the file again
pub const AVATAR_CACHE_TTL: Duration = Duration::from_secs(30);

/// Source of the current avatar name
///
/// Called synchronously from the transport's background tasks (the marquee
/// handing over to the idle block) as well as from callers. Implementations
/// must return promptly: cache anything that needs I/O.
pub trait AvatarNameSource: Send + Sync {
    /// The current avatar name, or `None` if it is not known
    fn avatar_name(&self) -> Option<String>;
}

/// Source of the local wall-clock time
pub trait LocalClock: Send + Sync {
    /// Current local time with its UTC offset
    fn now(&self) -> DateTime<FixedOffset>;

    /// Display name of the local timezone, if the clock knows one
    fn zone_name(&self) -> Option<String> {
        None
    }
}

/// Reads `{"name": "..."}` from a JSON file, re-reading at most once per TTL
///
/// Clones share the cache.
#[derive(Clone, Debug)]
pub struct FileAvatarSource {
    path: PathBuf,
    max_age: Duration,
    cached: Arc<Mutex<Option<(Instant, Option<String>)>>>,
}

#[derive(Deserialize)]
struct AvatarRecord {
    #[serde(default)]
    name: Option<String>,
}

impl FileAvatarSource {
    /// Read from an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_age: AVATAR_CACHE_TTL,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Reuse a read name for `max_age` (zero reads the file on every lookup)
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Read `last_avatar.json` from the working directory
    #[must_use]
    pub fn in_working_dir() -> Self {
        let dir = std::env::current_dir().unwrap_or_default();
        Self::new(dir.join(AVATAR_FILE))
    }

    /// The file being read
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_name(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<AvatarRecord>(&content) {
            Ok(record) => record.name.filter(|name| !name.trim().is_empty()),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Unreadable avatar file");
                None
            }
        }
    }
}

impl Default for FileAvatarSource {
    fn default() -> Self {
        Self::in_working_dir()
    }
}

impl AvatarNameSource for FileAvatarSource {
    fn avatar_name(&self) -> Option<String> {
        let mut cached = self.cached.lock();
        if let Some((read_at, ref name)) = *cached {
            if read_at.elapsed() < self.max_age {
                return name.clone();
            }
        }
        let name = self.read_name();
        *cached = Some((Instant::now(), name.clone()));
        name
    }
}

/// A fixed avatar name
#[derive(Clone, Debug)]
pub struct StaticAvatar(pub String);

impl AvatarNameSource for StaticAvatar {
    fn avatar_name(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// The system clock in the system timezone
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl LocalClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant
#[derive(Clone, Debug)]
pub struct FixedClock {
    /// The instant reported by `now`
    pub at: DateTime<FixedOffset>,
    /// Optional zone label
    pub zone: Option<String>,
}

impl LocalClock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }

    fn zone_name(&self) -> Option<String> {
        self.zone.clone()
    }
}

/// Format a clock reading as `3:07PM`, optionally followed by the zone
///
/// Without a zone name the UTC offset is shown instead.
#[must_use]
pub fn format_local_time(clock: &dyn LocalClock, show_timezone: bool) -> String {
    let now = clock.now();
    let formatted = now.format("%I:%M%p").to_string();
    let time = formatted.strip_prefix('0').unwrap_or(&formatted).to_string();
    if !show_timezone {
        return time;
    }
    let zone = clock
        .zone_name()
        .filter(|z| !z.is_empty())
        .unwrap_or_else(|| now.format("UTC%:z").to_string());
    format!("{time} {zone}")
}

/// Format an elapsed duration as `h:mm:ss`, or `mm:ss` under an hour
#[must_use]
pub fn format_active_time(elapsed: std::time::Duration) -> String {
    let seconds = elapsed.as_secs();
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;

    fn clock_at(h: u32, m: u32, zone: Option<&str>) -> FixedClock {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        FixedClock {
            at: offset.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap(),
            zone: zone.map(str::to_string),
        }
    }

    #[test]
    fn test_local_time_strips_leading_zero() {
        assert_eq!(format_local_time(&clock_at(15, 7, None), false), "3:07PM");
        assert_eq!(format_local_time(&clock_at(10, 30, None), false), "10:30AM");
    }

    #[test]
    fn test_local_time_with_zone() {
        assert_eq!(
            format_local_time(&clock_at(9, 5, Some("JST")), true),
            "9:05AM JST"
        );
        assert_eq!(
            format_local_time(&clock_at(9, 5, None), true),
            "9:05AM UTC+09:00"
        );
    }

    #[test]
    fn test_active_time() {
        assert_eq!(format_active_time(Duration::ZERO), "00:00");
        assert_eq!(format_active_time(Duration::from_secs(75)), "01:15");
        assert_eq!(format_active_time(Duration::from_secs(3 * 3600 + 62)), "3:01:02");
    }

    #[test]
    fn test_file_avatar_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "Hoppou", "id": "avtr_1"}}"#).unwrap();
        let source = FileAvatarSource::new(file.path());
        assert_eq!(source.avatar_name().as_deref(), Some("Hoppou"));
    }

    #[test]
    fn test_file_avatar_source_missing_or_blank() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileAvatarSource::new(dir.path().join(AVATAR_FILE));
        assert_eq!(missing.avatar_name(), None);

        let blank_path = dir.path().join("blank.json");
        std::fs::write(&blank_path, r#"{"name": ""}"#).unwrap();
        assert_eq!(FileAvatarSource::new(&blank_path).avatar_name(), None);

        let garbage_path = dir.path().join("garbage.json");
        std::fs::write(&garbage_path, "not json").unwrap();
        assert_eq!(FileAvatarSource::new(&garbage_path).avatar_name(), None);
    }

    #[test]
    fn test_file_avatar_source_caches_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AVATAR_FILE);
        std::fs::write(&path, r#"{"name": "Hoppou"}"#).unwrap();

        let cached = FileAvatarSource::new(&path);
        let uncached = FileAvatarSource::new(&path).with_max_age(Duration::ZERO);
        assert_eq!(cached.avatar_name().as_deref(), Some("Hoppou"));
        assert_eq!(uncached.avatar_name().as_deref(), Some("Hoppou"));

        std::fs::write(&path, r#"{"name": "Gabriel"}"#).unwrap();
        assert_eq!(cached.avatar_name().as_deref(), Some("Hoppou"));
        assert_eq!(cached.clone().avatar_name().as_deref(), Some("Hoppou"));
        assert_eq!(uncached.avatar_name().as_deref(), Some("Gabriel"));
    }
}

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Playback configuration, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the video files and their annotation files.
    pub video_folder: PathBuf,
    /// Number of videos, named `1.<ext>` up to `<video_count>.<ext>`.
    pub video_count: usize,
    pub file_extension: String,
    pub annotation_extension: String,
    /// Display ticks per wall-clock second. Also the force-resync
    /// period in ticks.
    pub ticks_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_folder: PathBuf::from("data"),
            video_count: 4,
            file_extension: "y4m".into(),
            annotation_extension: "txt".into(),
            ticks_per_second: 5,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_second == 0 {
            return Err(Error::Config("ticks_per_second must be at least 1".into()));
        }
        if self.video_count == 0 {
            return Err(Error::Config("video_count must be at least 1".into()));
        }
        if self.file_extension().is_empty() {
            return Err(Error::Config("file_extension must not be empty".into()));
        }
        if self.annotation_extension().is_empty() {
            return Err(Error::Config(
                "annotation_extension must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The video extension without a leading dot.
    pub fn file_extension(&self) -> &str {
        self.file_extension.trim_start_matches('.')
    }

    /// The annotation extension without a leading dot.
    pub fn annotation_extension(&self) -> &str {
        self.annotation_extension.trim_start_matches('.')
    }

    pub fn video_paths(&self) -> Vec<PathBuf> {
        (1..=self.video_count)
            .map(|idx| {
                self.video_folder
                    .join(format!("{idx}.{}", self.file_extension()))
            })
            .collect()
    }

    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.ticks_per_second)
    }
}

/// The fixed timer interval of one tick, `1000 / ticks_per_second`
/// whole milliseconds.
pub fn tick_interval(ticks_per_second: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(ticks_per_second.max(1)))
}

use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while loading, validating or opening streams.
///
/// Everything here is fatal for the affected stream and is reported
/// before playback starts. Transient read misses never surface as an
/// [Error]; the driver degrades them to a stale frame instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unable to read configuration file {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse configuration file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("video file {0} does not exist")]
    MissingVideo(PathBuf),

    #[error("no annotation track for video {0}")]
    MissingAnnotation(String),

    #[error("annotation track {0} is empty")]
    EmptyAnnotation(String),

    #[error("malformed timestamp in {source_name} at line {line}: {text:?}")]
    MalformedTimestamp {
        source_name: String,
        line: usize,
        text: String,
    },

    #[error("annotation track for {stream} has {track_len} timestamps but the video has {frame_count} frames")]
    LengthMismatch {
        stream: String,
        track_len: usize,
        frame_count: usize,
    },

    #[error("unable to open video {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

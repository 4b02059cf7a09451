use crate::error::{Error, Result};
use indexmap::IndexMap;
use itertools::Itertools as _;
use std::{
    fs,
    io::{BufRead, BufReader},
    ops::Index,
    path::Path,
};
use tracing::debug;

/// Per-frame timestamps of one stream, in seconds. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTrack {
    timestamps: Vec<f64>,
}

impl AnnotationTrack {
    pub fn new(timestamps: Vec<f64>) -> Result<Self> {
        Self::with_name("<memory>", timestamps)
    }

    fn with_name(name: &str, timestamps: Vec<f64>) -> Result<Self> {
        if timestamps.is_empty() {
            return Err(Error::EmptyAnnotation(name.to_string()));
        }
        Ok(Self { timestamps })
    }

    /// Parses one timestamp per line. `source` names the input in
    /// error messages.
    pub fn parse<R>(reader: R, source: &str) -> Result<Self>
    where
        R: BufRead,
    {
        let timestamps: Vec<f64> = reader
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                let line = line.map_err(|err| Error::io(source, err))?;
                let text = line.trim();
                match text.parse::<f64>() {
                    Ok(ts) if ts.is_finite() => Ok(ts),
                    _ => Err(Error::MalformedTimestamp {
                        source_name: source.to_string(),
                        line: idx + 1,
                        text: text.to_string(),
                    }),
                }
            })
            .collect::<Result<_>>()?;

        Self::with_name(source, timestamps)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Tracks are never empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.timestamps.get(index).copied()
    }

    pub fn first(&self) -> f64 {
        self.timestamps[0]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.timestamps
    }
}

impl Index<usize> for AnnotationTrack {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.timestamps[index]
    }
}

/// Loads every annotation file whose name ends in `.{extension}` in
/// `folder`, keyed by the name without that suffix and ordered by it.
/// `extension` may itself contain dots, as in `ts.txt`.
pub fn load_annotations(
    folder: impl AsRef<Path>,
    extension: &str,
) -> Result<IndexMap<String, AnnotationTrack>> {
    let folder = folder.as_ref();
    let suffix = format!(".{}", extension.trim_start_matches('.'));

    let entries = fs::read_dir(folder).map_err(|err| Error::io(folder, err))?;
    let paths = entries
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| Error::io(folder, err))?;

    paths
        .into_iter()
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let stem = path.file_name()?.to_str()?.strip_suffix(&suffix)?;
            let stem = (!stem.is_empty()).then(|| stem.to_string())?;
            Some((stem, path))
        })
        .sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs))
        .map(|(stem, path)| {
            let file = fs::File::open(&path).map_err(|err| Error::io(&path, err))?;
            let source = path.display().to_string();
            let track = AnnotationTrack::parse(BufReader::new(file), &source)?;
            debug!(
                stream = %stem,
                frames = track.len(),
                "loaded annotation track"
            );
            Ok((stem, track))
        })
        .collect()
}

/// The integer second every stream starts synchronizing from: the
/// floor of the earliest first timestamp.
pub fn shared_baseline<'a, I>(tracks: I) -> Option<i64>
where
    I: IntoIterator<Item = &'a AnnotationTrack>,
{
    tracks
        .into_iter()
        .map(|track| track.first())
        .min_by(f64::total_cmp)
        .map(|ts| ts.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_one_timestamp_per_line() {
        let track = AnnotationTrack::parse(Cursor::new("0.1\n 0.9 \n1.2\n"), "a.txt").unwrap();
        assert_eq!(track.as_slice(), &[0.1, 0.9, 1.2]);
    }

    #[test]
    fn reports_malformed_line() {
        let err = AnnotationTrack::parse(Cursor::new("0.1\nabc\n"), "a.txt").unwrap_err();
        match err {
            Error::MalformedTimestamp { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_timestamps() {
        let err = AnnotationTrack::parse(Cursor::new("nan\n"), "a.txt").unwrap_err();
        assert!(matches!(err, Error::MalformedTimestamp { line: 1, .. }));
    }

    #[test]
    fn empty_track_is_an_error() {
        assert!(matches!(
            AnnotationTrack::parse(Cursor::new(""), "a.txt"),
            Err(Error::EmptyAnnotation(_))
        ));
        assert!(AnnotationTrack::new(vec![]).is_err());
    }

    #[test]
    fn loads_annotations_with_multi_dot_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("2.ts.txt"), "5.5\n").unwrap();
        fs::write(dir.path().join("1.ts.txt"), "4.0\n4.5\n").unwrap();
        fs::write(dir.path().join("3.txt"), "1.0\n").unwrap();
        fs::write(dir.path().join(".ts.txt"), "1.0\n").unwrap();

        let tracks = load_annotations(dir.path(), ".ts.txt").unwrap();
        assert_eq!(tracks.keys().map(String::as_str).collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(tracks["1"].as_slice(), &[4.0, 4.5]);

        let tracks = load_annotations(dir.path(), "txt").unwrap();
        assert_eq!(
            tracks.keys().map(String::as_str).collect::<Vec<_>>(),
            [".ts", "1.ts", "2.ts", "3"]
        );
    }

    #[test]
    fn baseline_is_floor_of_earliest_start() {
        let a = AnnotationTrack::new(vec![12.7, 13.0]).unwrap();
        let b = AnnotationTrack::new(vec![11.2, 11.9]).unwrap();
        assert_eq!(shared_baseline([&a, &b]), Some(11));
        assert_eq!(shared_baseline(std::iter::empty()), None);
    }
}

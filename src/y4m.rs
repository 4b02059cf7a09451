//! YUV4MPEG2 input.
//!
//! A `.y4m` file is a one-line stream header followed by frames, each
//! introduced by a `FRAME` line and holding raw planar YUV bytes. The
//! decoder indexes every frame at open time so seeking is a table
//! lookup.

use crate::{
    error::{Error, Result},
    frame::{Chroma, Frame},
    types::FrameDecoder,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const MAGIC: &str = "YUV4MPEG2";

/// Stream parameters from a YUV4MPEG2 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Y4mFormat {
    pub width: usize,
    pub height: usize,
    pub chroma: Chroma,
    /// Frame rate as numerator and denominator.
    pub frame_rate: (u32, u32),
}

impl Y4mFormat {
    /// Bytes of pixel data per frame, `None` if the dimensions are too
    /// large to address.
    pub fn frame_size(&self) -> Option<usize> {
        self.chroma
            .frame_size(self.width, self.height)
            .filter(|&size| i64::try_from(size).is_ok())
    }

    pub fn parse(header: &str) -> Result<Self, String> {
        let mut tags = header.split_ascii_whitespace();
        if tags.next() != Some(MAGIC) {
            return Err("missing YUV4MPEG2 signature".into());
        }

        let mut width = None;
        let mut height = None;
        let mut chroma = Chroma::C420;
        let mut frame_rate = (25, 1);

        for tag in tags {
            let Some(key) = tag.get(..1) else {
                continue;
            };
            let value = &tag[1..];
            match key {
                "W" => width = value.parse().ok(),
                "H" => height = value.parse().ok(),
                "C" => {
                    chroma = Chroma::from_tag(value)
                        .ok_or_else(|| format!("unsupported colorspace {value}"))?;
                }
                "F" => {
                    frame_rate = value
                        .split_once(':')
                        .and_then(|(num, den)| Some((num.parse().ok()?, den.parse().ok()?)))
                        .filter(|&(_, den)| den != 0)
                        .ok_or_else(|| format!("invalid frame rate {value}"))?;
                }
                _ => {}
            }
        }

        let (Some(width), Some(height)) = (width, height) else {
            return Err("missing frame dimensions".into());
        };
        if width == 0 || height == 0 {
            return Err("zero frame dimensions".into());
        }

        let format = Self {
            width,
            height,
            chroma,
            frame_rate,
        };
        if format.frame_size().is_none() {
            return Err(format!("frame dimensions {width}x{height} are too large"));
        }
        Ok(format)
    }

    pub fn header_line(&self) -> String {
        let (num, den) = self.frame_rate;
        format!(
            "{MAGIC} W{} H{} F{num}:{den} Ip A1:1 C{}\n",
            self.width,
            self.height,
            self.chroma.tag()
        )
    }
}

/// Reads frames of a `.y4m` file by index.
#[derive(Debug)]
pub struct Y4mDecoder {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    format: Y4mFormat,
    frame_size: usize,
    /// Byte offset of the pixel data of every complete frame.
    offsets: Vec<u64>,
    cursor: usize,
}

impl Y4mDecoder {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::open(path, err.to_string()))?;
        let file_len = file
            .metadata()
            .map_err(|err| Error::open(path, err.to_string()))?
            .len();
        let mut reader = BufReader::new(file);

        let header = read_line(&mut reader)
            .map_err(|err| Error::open(path, err.to_string()))?
            .ok_or_else(|| Error::open(path, "empty file"))?;
        let format = Y4mFormat::parse(&header).map_err(|reason| Error::open(path, reason))?;
        let frame_size = format
            .frame_size()
            .ok_or_else(|| Error::open(path, "frame dimensions are too large"))?;
        let offsets = index_frames(&mut reader, file_len, frame_size as u64)
            .map_err(|err| Error::open(path, err.to_string()))?;

        debug!(
            path = %path.display(),
            width = format.width,
            height = format.height,
            frames = offsets.len(),
            "opened y4m video"
        );

        Ok(Self {
            path: path.to_owned(),
            reader: Some(reader),
            format,
            frame_size,
            offsets,
            cursor: 0,
        })
    }

    pub fn format(&self) -> &Y4mFormat {
        &self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameDecoder for Y4mDecoder {
    fn frame_count(&self) -> usize {
        self.offsets.len()
    }

    fn read(&mut self) -> Option<Frame> {
        let reader = self.reader.as_mut()?;
        let offset = *self.offsets.get(self.cursor)?;
        let frame_index = self.cursor;
        self.cursor += 1;

        let mut data = vec![0; self.frame_size];
        let result = reader
            .seek(SeekFrom::Start(offset))
            .and_then(|_| reader.read_exact(&mut data));

        if let Err(err) = result {
            warn!(
                path = %self.path.display(),
                frame_index,
                "unable to read frame: {err}"
            );
            return None;
        }

        let Y4mFormat {
            width,
            height,
            chroma,
            ..
        } = self.format;
        Some(Frame::new(width, height, chroma, data))
    }

    fn seek(&mut self, frame_index: usize) {
        self.cursor = frame_index;
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            debug!(path = %self.path.display(), "released y4m video");
        }
    }
}

/// Reads one `\n`-terminated line. Returns `None` at end of file or
/// on an unterminated trailing line.
fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: BufRead,
{
    let mut buf = Vec::new();
    reader.read_until(b'\n', &mut buf)?;

    if buf.pop() != Some(b'\n') {
        return Ok(None);
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn index_frames(
    reader: &mut BufReader<File>,
    file_len: u64,
    frame_size: u64,
) -> io::Result<Vec<u64>> {
    let mut offsets = vec![];

    while let Some(line) = read_line(reader)? {
        if !line.starts_with("FRAME") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected FRAME marker before frame {}", offsets.len()),
            ));
        }

        let data_start = reader.stream_position()?;
        if data_start.saturating_add(frame_size) > file_len {
            debug!(frame = offsets.len(), "ignore truncated trailing frame");
            break;
        }

        offsets.push(data_start);
        reader.seek_relative(frame_size as i64)?;
    }

    Ok(offsets)
}

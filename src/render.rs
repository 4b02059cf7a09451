use crate::{
    error::{Error, Result},
    frame::Frame,
    types::{Overlay, Renderer},
    y4m::Y4mFormat,
};
use std::{
    borrow::Cow,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Headless renderer that reports every displayed frame as a tracing
/// event.
#[derive(Debug, Clone)]
pub struct TracingRenderer {
    stream: String,
    displayed: usize,
}

impl TracingRenderer {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            displayed: 0,
        }
    }

    /// Number of frames displayed so far.
    pub fn displayed(&self) -> usize {
        self.displayed
    }
}

impl Renderer for TracingRenderer {
    fn display(&mut self, frame: &Frame, overlay: Option<Overlay>) -> Result<()> {
        self.displayed += 1;
        debug!(
            stream = %self.stream,
            width = frame.width,
            height = frame.height,
            ?overlay,
            "display frame"
        );
        Ok(())
    }
}

/// Writes the frames shown for one stream to a `.y4m` file, one
/// output frame per tick. Stale frames get the marker burnt in.
#[derive(Debug)]
pub struct Y4mRenderer {
    path: PathBuf,
    writer: BufWriter<File>,
    ticks_per_second: u32,
    format: Option<Y4mFormat>,
}

impl Y4mRenderer {
    pub fn create(path: impl AsRef<Path>, ticks_per_second: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| Error::io(path, err))?;

        Ok(Self {
            path: path.to_owned(),
            writer: BufWriter::new(file),
            ticks_per_second,
            format: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        let format = Y4mFormat {
            width: frame.width,
            height: frame.height,
            chroma: frame.chroma,
            frame_rate: (self.ticks_per_second, 1),
        };

        match self.format {
            None => {
                self.writer.write_all(format.header_line().as_bytes())?;
                self.format = Some(format);
            }
            Some(expected) if expected != format => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "frame is {}x{} {:?}, output is {}x{} {:?}",
                        frame.width,
                        frame.height,
                        frame.chroma,
                        expected.width,
                        expected.height,
                        expected.chroma
                    ),
                ));
            }
            Some(_) => {}
        }

        self.writer.write_all(b"FRAME\n")?;
        self.writer.write_all(&frame.data)?;
        self.writer.flush()
    }
}

impl Renderer for Y4mRenderer {
    fn display(&mut self, frame: &Frame, overlay: Option<Overlay>) -> Result<()> {
        let frame = match overlay {
            Some(Overlay::Stale) => {
                let mut marked = frame.clone();
                marked.burn_stale_marker();
                Cow::Owned(marked)
            }
            None => Cow::Borrowed(frame),
        };

        self.write_frame(&frame)
            .map_err(|err| Error::io(&self.path, err))
    }
}

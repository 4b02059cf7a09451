use crate::{error::Result, frame::Frame};
use std::fmt;

/// Identifies a stream inside the [Coordinator](crate::Coordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub usize);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A source of decoded frames with a movable read cursor.
pub trait FrameDecoder {
    /// Total number of decodable frames.
    fn frame_count(&self) -> usize;

    /// Reads the frame at the cursor and moves the cursor past it.
    /// Returns `None` on a read miss or past the last frame.
    fn read(&mut self) -> Option<Frame>;

    /// Positions the cursor at `frame_index`.
    fn seek(&mut self, frame_index: usize);

    /// Releases the underlying handle. Calling it again is a no-op.
    fn release(&mut self);
}

impl<D> FrameDecoder for Box<D>
where
    D: FrameDecoder + ?Sized,
{
    fn frame_count(&self) -> usize {
        (**self).frame_count()
    }

    fn read(&mut self) -> Option<Frame> {
        (**self).read()
    }

    fn seek(&mut self, frame_index: usize) {
        (**self).seek(frame_index)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// A visual marker drawn over a displayed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    /// The frame is a repeat of an earlier one.
    Stale,
}

/// Displays frames of one stream.
pub trait Renderer {
    fn display(&mut self, frame: &Frame, overlay: Option<Overlay>) -> Result<()>;
}

impl<R> Renderer for Box<R>
where
    R: Renderer + ?Sized,
{
    fn display(&mut self, frame: &Frame, overlay: Option<Overlay>) -> Result<()> {
        (**self).display(frame, overlay)
    }
}

/// The lifecycle of a [PlaybackDriver](crate::PlaybackDriver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverStatus {
    /// Constructed, never started.
    Idle,
    Playing,
    /// Timer unregistered, decoder kept open.
    Paused,
    /// Reached the end of its track.
    Finished,
    /// Stopped and released.
    Stopped,
}

impl DriverStatus {
    /// Terminal drivers never tick again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverStatus::Finished | DriverStatus::Stopped)
    }
}

/// The observable position of one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSnapshot {
    pub name: String,
    pub frame_index: usize,
    pub timestamp: f64,
    pub stale: bool,
    pub status: DriverStatus,
}

/// Notifications published by drivers for a front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A frame could not be read and the last good frame was repeated.
    FrameMissed { stream: String, frame_index: usize },
    /// The stream reached the end of its track.
    EndOfStream { stream: String, frame_index: usize },
}

/// Control messages accepted by [Coordinator::run](crate::Coordinator::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    StartAll,
    PauseAll,
    StopAll,
    Shutdown,
}

use crate::{
    frame::Frame,
    state::{SyncState, Transition},
    track::AnnotationTrack,
    types::{
        DriverStatus, FrameDecoder, Overlay, PlaybackEvent, Renderer, StreamId, StreamSnapshot,
    },
};
use tracing::{debug, info, warn};

/// What happened on one [tick](PlaybackDriver::tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    Continue,
    EndOfStream,
}

/// Runs the decode, render and advance cycle of one stream.
///
/// The driver exclusively owns the decoder cursor, the renderer and
/// the last good frame of its stream.
pub struct PlaybackDriver<D, R>
where
    D: FrameDecoder,
    R: Renderer,
{
    id: StreamId,
    name: String,
    track: AnnotationTrack,
    state: SyncState,
    decoder: D,
    renderer: R,
    last_good_frame: Option<Frame>,
    ticks_per_second: u32,
    status: DriverStatus,
    events: Option<flume::Sender<PlaybackEvent>>,
}

impl<D, R> PlaybackDriver<D, R>
where
    D: FrameDecoder,
    R: Renderer,
{
    pub fn new(
        id: StreamId,
        name: String,
        track: AnnotationTrack,
        baseline: i64,
        decoder: D,
        renderer: R,
        ticks_per_second: u32,
    ) -> Self {
        let state = SyncState::new(&track, baseline);

        Self {
            id,
            name,
            track,
            state,
            decoder,
            renderer,
            last_good_frame: None,
            ticks_per_second,
            status: DriverStatus::Idle,
            events: None,
        }
    }

    /// Publishes warnings and end-of-stream notices on `events`.
    pub fn set_event_sender(&mut self, events: flume::Sender<PlaybackEvent>) {
        self.events = Some(events);
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot {
            name: self.name.clone(),
            frame_index: self.state.frame_index(),
            timestamp: self.state.timestamp(),
            stale: self.state.is_stale(),
            status: self.status,
        }
    }

    /// Marks the driver as playing. Terminal drivers stay terminal.
    pub fn play(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = DriverStatus::Playing;
        true
    }

    /// Stops ticking but keeps the decoder open.
    pub fn pause(&mut self) {
        if self.status == DriverStatus::Playing {
            self.status = DriverStatus::Paused;
        }
    }

    /// Stops the stream for good and releases the decoder. Calling it
    /// again is a no-op.
    pub fn stop(&mut self) {
        if self.status == DriverStatus::Stopped {
            return;
        }
        self.decoder.release();
        self.status = DriverStatus::Stopped;
        debug!(stream = %self.name, "stream stopped");
    }

    /// Runs one tick: decode, render, then advance the sync state.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status.is_terminal() {
            return TickOutcome::EndOfStream;
        }

        match self.decoder.read() {
            Some(frame) => {
                let overlay = self.state.is_stale().then_some(Overlay::Stale);
                self.render(&frame, overlay);
                info!(
                    stream = %self.name,
                    frame_index = self.state.frame_index(),
                    timestamp = self.state.timestamp(),
                    "frame displayed"
                );
                self.last_good_frame = Some(frame);
            }
            None => {
                if let Some(frame) = self.last_good_frame.take() {
                    self.render(&frame, Some(Overlay::Stale));
                    self.last_good_frame = Some(frame);
                }
                warn!(
                    stream = %self.name,
                    frame_index = self.state.frame_index(),
                    "unable to read frame, repeating the previous one"
                );
                self.publish(PlaybackEvent::FrameMissed {
                    stream: self.name.clone(),
                    frame_index: self.state.frame_index(),
                });
            }
        }

        match self.state.advance(&self.track, self.ticks_per_second) {
            Transition::Continue(next) => {
                self.state = next;
                self.decoder.seek(next.seek_position());
                TickOutcome::Continue
            }
            Transition::EndOfStream => {
                self.finish();
                TickOutcome::EndOfStream
            }
        }
    }

    fn render(&mut self, frame: &Frame, overlay: Option<Overlay>) {
        if let Err(err) = self.renderer.display(frame, overlay) {
            warn!(stream = %self.name, "unable to render frame: {err}");
        }
    }

    fn finish(&mut self) {
        self.decoder.release();
        self.status = DriverStatus::Finished;
        info!(
            stream = %self.name,
            frame_index = self.state.frame_index(),
            "end of stream"
        );
        self.publish(PlaybackEvent::EndOfStream {
            stream: self.name.clone(),
            frame_index: self.state.frame_index(),
        });
    }

    fn publish(&mut self, event: PlaybackEvent) {
        let Some(events) = &self.events else {
            return;
        };

        if events.send(event).is_err() {
            self.events = None;
        }
    }
}

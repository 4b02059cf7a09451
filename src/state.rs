use crate::track::AnnotationTrack;

/// The synchronization state of one stream.
///
/// Each stream keeps its own copy of the baseline, seeded once from
/// the shared minimum. Streams stay aligned because they all run the
/// same per-second correction against timestamps drawn from a common
/// real-world clock, not because they share state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncState {
    /// The frame considered current.
    frame_index: usize,

    /// Mirrors `track[frame_index]`.
    current_timestamp: f64,

    /// The integer second the stream currently treats as "now".
    baseline: i64,

    /// Ticks since the last forced resync, in `[0, ticks_per_second)`
    /// between calls.
    tick_counter: u32,

    /// Whether the frame on display is a repeat.
    stale: bool,
}

/// The result of [SyncState::advance].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Keep playing; position the decoder at
    /// [seek_position](SyncState::seek_position) of the new state.
    Continue(SyncState),
    /// The current frame is the last one.
    EndOfStream,
}

impl SyncState {
    pub fn new(track: &AnnotationTrack, baseline: i64) -> Self {
        Self {
            frame_index: 0,
            current_timestamp: track.first(),
            baseline,
            tick_counter: 0,
            stale: false,
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn timestamp(&self) -> f64 {
        self.current_timestamp
    }

    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    pub fn tick_counter(&self) -> u32 {
        self.tick_counter
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The frame the decoder has to read on the next tick.
    pub fn seek_position(&self) -> usize {
        self.frame_index
    }

    /// Decides what the next tick shows, once per tick after the
    /// current frame was rendered.
    ///
    /// The stream moves to its next frame while that frame still
    /// belongs to the baseline second, and otherwise repeats the
    /// current one as stale. Every `ticks_per_second` calls a forced
    /// resync either pushes the stream one frame forward or rebases
    /// it onto the second of the current frame, so no stream can
    /// starve.
    ///
    /// The transition only depends on `self`, `track` and
    /// `ticks_per_second`.
    pub fn advance(self, track: &AnnotationTrack, ticks_per_second: u32) -> Transition {
        let Some(next_timestamp) = track.get(self.frame_index + 1) else {
            return Transition::EndOfStream;
        };

        let mut next = self;
        next.tick_counter += 1;

        if second_of(next.current_timestamp).saturating_sub(next.baseline) < 1 {
            next.baseline = second_of(next.current_timestamp);
        }

        if second_of(next_timestamp).saturating_sub(next.baseline) < 1 {
            next.frame_index += 1;
            next.current_timestamp = next_timestamp;
            next.stale = false;
        } else {
            next.stale = true;
        }

        if next.tick_counter == ticks_per_second {
            next.force_resync(track);
        }

        Transition::Continue(next)
    }

    fn force_resync(&mut self, track: &AnnotationTrack) {
        let current_second = second_of(self.current_timestamp);

        if current_second.saturating_sub(self.baseline) < 1 {
            // The last frame was already reached by the regular step.
            if let Some(timestamp) = track.get(self.frame_index + 1) {
                self.frame_index += 1;
                self.current_timestamp = timestamp;
                self.stale = false;
            }
            self.baseline = second_of(self.current_timestamp);
        } else {
            self.baseline = current_second;
            self.stale = true;
        }

        self.tick_counter = 0;
    }
}

fn second_of(timestamp: f64) -> i64 {
    timestamp.floor() as i64
}

use crate::{
    config::tick_interval,
    driver::{PlaybackDriver, TickOutcome},
    error::{Error, Result},
    track::{shared_baseline, AnnotationTrack},
    types::{Command, FrameDecoder, PlaybackEvent, Renderer, StreamId, StreamSnapshot},
};
use chrono::{DateTime, Utc};
use futures::future;
use indexmap::IndexMap;
use itertools::Itertools as _;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace};

/// Everything needed to play one stream.
#[derive(Debug)]
pub struct StreamSource<D, R> {
    pub name: String,
    pub track: AnnotationTrack,
    pub decoder: D,
    pub renderer: R,
}

struct Slot<D, R>
where
    D: FrameDecoder,
    R: Renderer,
{
    driver: PlaybackDriver<D, R>,
    /// When the next tick is due. `None` while the timer is not
    /// registered.
    due: Option<Instant>,
}

/// Owns every stream and schedules their ticks on one cooperative
/// loop.
///
/// Each stream has its own timer with the same interval. Timers are
/// not phase-locked; streams never talk to each other after
/// construction.
pub struct Coordinator<D, R>
where
    D: FrameDecoder,
    R: Renderer,
{
    slots: IndexMap<StreamId, Slot<D, R>>,
    baseline: i64,
    interval: Duration,
}

impl<D, R> Coordinator<D, R>
where
    D: FrameDecoder,
    R: Renderer,
{
    /// Validates every source and builds one driver per stream, all
    /// seeded with the shared baseline.
    pub fn new(sources: Vec<StreamSource<D, R>>, ticks_per_second: u32) -> Result<Self> {
        if ticks_per_second == 0 {
            return Err(Error::Config("ticks_per_second must be at least 1".into()));
        }
        if sources.is_empty() {
            return Err(Error::Config("no streams to play".into()));
        }

        for source in &sources {
            let frame_count = source.decoder.frame_count();
            if source.track.len() != frame_count {
                return Err(Error::LengthMismatch {
                    stream: source.name.clone(),
                    track_len: source.track.len(),
                    frame_count,
                });
            }
        }

        let Some(baseline) = shared_baseline(sources.iter().map(|source| &source.track)) else {
            return Err(Error::Config("no streams to play".into()));
        };

        let slots: IndexMap<_, _> = sources
            .into_iter()
            .enumerate()
            .map(|(idx, source)| {
                let StreamSource {
                    name,
                    track,
                    decoder,
                    renderer,
                } = source;
                let id = StreamId(idx);
                let driver = PlaybackDriver::new(
                    id,
                    name,
                    track,
                    baseline,
                    decoder,
                    renderer,
                    ticks_per_second,
                );
                (id, Slot { driver, due: None })
            })
            .collect();

        info!(
            streams = slots.len(),
            baseline,
            baseline_utc = %DateTime::<Utc>::from_timestamp(baseline, 0)
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            "streams ready"
        );

        Ok(Self {
            slots,
            baseline,
            interval: tick_interval(ticks_per_second),
        })
    }

    /// Publishes every driver's events on `events`.
    pub fn with_events(mut self, events: flume::Sender<PlaybackEvent>) -> Self {
        self.slots
            .values_mut()
            .for_each(|slot| slot.driver.set_event_sender(events.clone()));
        self
    }

    /// The shared startup baseline.
    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn driver(&self, id: StreamId) -> Option<&PlaybackDriver<D, R>> {
        self.slots.get(&id).map(|slot| &slot.driver)
    }

    pub fn snapshot(&self, id: StreamId) -> Option<StreamSnapshot> {
        self.driver(id).map(|driver| driver.snapshot())
    }

    pub fn snapshots(&self) -> IndexMap<StreamId, StreamSnapshot> {
        self.slots
            .iter()
            .map(|(id, slot)| (*id, slot.driver.snapshot()))
            .collect()
    }

    /// Registers the timer of every stream that can still play. The
    /// first tick is due immediately.
    pub fn start_all(&mut self) {
        let now = Instant::now();

        for slot in self.slots.values_mut() {
            if slot.driver.play() && slot.due.is_none() {
                slot.due = Some(now);
            }
        }
        debug!("start all streams");
    }

    /// Unregisters every timer, keeping decoders open.
    pub fn pause_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.driver.pause();
            slot.due = None;
        }
        debug!("pause all streams");
    }

    /// Unregisters every timer and releases every decoder.
    pub fn stop_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.driver.stop();
            slot.due = None;
        }
        debug!("stop all streams");
    }

    /// True once no stream can tick again.
    pub fn is_finished(&self) -> bool {
        self.slots
            .values()
            .all(|slot| slot.driver.status().is_terminal())
    }

    /// The earliest due tick among registered timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().filter_map(|slot| slot.due).min()
    }

    /// Runs every tick due at `now`, earliest first. Each stream ticks
    /// at most once per call. Returns the number of ticks run.
    pub fn poll_due(&mut self, now: Instant) -> usize {
        let due: Vec<(Instant, usize)> = self
            .slots
            .values()
            .enumerate()
            .filter_map(|(idx, slot)| Some((slot.due.filter(|&due| due <= now)?, idx)))
            .sorted()
            .collect();

        let interval = self.interval;

        for &(deadline, idx) in &due {
            let Some((id, slot)) = self.slots.get_index_mut(idx) else {
                continue;
            };
            trace!(stream = %id, "tick");

            slot.due = match slot.driver.tick() {
                TickOutcome::Continue => {
                    let next = deadline + interval;
                    Some(if next > now { next } else { now + interval })
                }
                TickOutcome::EndOfStream => None,
            };
        }

        due.len()
    }

    /// Plays until every stream reached its end. Starts all streams
    /// first.
    pub async fn run_to_end(&mut self) {
        self.start_all();

        while let Some(deadline) = self.next_deadline() {
            time::sleep_until(deadline).await;
            self.poll_due(Instant::now());
        }
    }

    /// Drives the streams while reacting to `commands`.
    ///
    /// Returns after [Command::Shutdown], once every stream is
    /// terminal, or when the command channel is closed and no timer is
    /// registered.
    pub async fn run(&mut self, commands: flume::Receiver<Command>) {
        let mut commands = Some(commands);

        loop {
            if self.is_finished() {
                info!("all streams finished");
                break;
            }

            let deadline = self.next_deadline();
            if deadline.is_none() && commands.is_none() {
                debug!("nothing scheduled and no commands pending");
                break;
            }

            let wake = async move {
                match deadline {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => future::pending().await,
                }
            };
            let received = {
                let commands = commands.clone();
                async move {
                    match commands {
                        Some(commands) => commands.recv_async().await,
                        None => future::pending().await,
                    }
                }
            };

            tokio::select! {
                _ = wake => {
                    self.poll_due(Instant::now());
                }
                received = received => match received {
                    Ok(Command::StartAll) => self.start_all(),
                    Ok(Command::PauseAll) => self.pause_all(),
                    Ok(Command::StopAll) => self.stop_all(),
                    Ok(Command::Shutdown) => {
                        self.stop_all();
                        break;
                    }
                    Err(_) => {
                        debug!("command channel closed");
                        commands = None;
                    }
                },
            }
        }
    }
}

impl<D, R> Drop for Coordinator<D, R>
where
    D: FrameDecoder,
    R: Renderer,
{
    fn drop(&mut self) {
        self.stop_all();
    }
}

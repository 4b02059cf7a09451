mod config;
mod coordinator;
mod driver;
mod error;
mod frame;
mod render;
mod session;
mod state;
mod track;
mod types;
mod y4m;

pub use config::{tick_interval, Config};
pub use coordinator::{Coordinator, StreamSource};
pub use driver::{PlaybackDriver, TickOutcome};
pub use error::{Error, Result};
pub use frame::{Chroma, Frame};
pub use render::{TracingRenderer, Y4mRenderer};
pub use session::load_sources;
pub use state::{SyncState, Transition};
pub use track::{load_annotations, shared_baseline, AnnotationTrack};
pub use types::*;
pub use y4m::{Y4mDecoder, Y4mFormat};

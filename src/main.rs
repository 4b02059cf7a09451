use clap::Parser;
use eyre::{Result, WrapErr as _};
use multi_stream_player::{
    load_sources, Command, Config, Coordinator, PlaybackEvent, Renderer, TracingRenderer,
    Y4mRenderer,
};
use std::{fs, io::BufRead as _, path::PathBuf, thread};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Parser)]
/// Plays timestamp-annotated videos side by side, aligned to a shared
/// wall clock.
///
/// Type `play`, `pause`, `stop` or `quit` on stdin to control playback.
struct Args {
    /// config path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// write the frames shown for each stream to <OUTPUT>/<stream>.y4m
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// wait for a `play` command before starting
    #[arg(long)]
    pub paused: bool,
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // parse arguments
    let Args {
        config: config_path,
        output,
        paused,
    } = Args::parse();

    // load config
    let config = match &config_path {
        Some(path) => Config::load(path)
            .wrap_err_with(|| format!("unable to load config {}", path.display()))?,
        None => Config::default(),
    };
    let ticks_per_second = config.ticks_per_second;

    if let Some(dir) = &output {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("unable to create output folder {}", dir.display()))?;
    }

    // open every stream before anything plays
    let sources = load_sources(&config, |name| {
        let renderer: Box<dyn Renderer> = match &output {
            Some(dir) => Box::new(Y4mRenderer::create(
                dir.join(format!("{name}.y4m")),
                ticks_per_second,
            )?),
            None => Box::new(TracingRenderer::new(name)),
        };
        Ok(renderer)
    })
    .wrap_err("unable to load streams")?;

    let (event_tx, event_rx) = flume::unbounded();
    let mut coordinator = Coordinator::new(sources, ticks_per_second)
        .wrap_err("invalid streams")?
        .with_events(event_tx);

    let (command_tx, command_rx) = flume::unbounded();

    {
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = command_tx.send(Command::Shutdown);
            }
        });
    }

    // stdin is read on a plain thread so it never blocks runtime shutdown
    thread::spawn(move || read_commands(command_tx));

    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv_async().await {
            report(&event);
        }
    });

    if paused {
        info!("playback paused, type `play` to start");
    } else {
        coordinator.start_all();
    }

    coordinator.run(command_rx).await;
    Ok(())
}

fn read_commands(command_tx: flume::Sender<Command>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };

        let command = match line.trim() {
            "" => continue,
            "play" | "start" => Command::StartAll,
            "pause" => Command::PauseAll,
            "stop" => Command::StopAll,
            "quit" | "exit" => Command::Shutdown,
            other => {
                warn!("unknown command {other:?}");
                continue;
            }
        };

        if command_tx.send(command).is_err() {
            break;
        }
    }
}

fn report(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::FrameMissed {
            stream,
            frame_index,
        } => {
            eprintln!("warning: unable to read frame {frame_index} of video {stream}, showing the previous frame");
        }
        PlaybackEvent::EndOfStream {
            stream,
            frame_index,
        } => {
            eprintln!("video {stream} finished at frame {frame_index}");
        }
    }
}

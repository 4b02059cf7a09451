use multi_stream_player::{
    load_sources, Chroma, Config, Coordinator, DriverStatus, Error, Frame, FrameDecoder, Overlay,
    Renderer, StreamId, TracingRenderer, Y4mDecoder, Y4mRenderer,
};
use std::{fs, path::Path};
use tempfile::TempDir;

const WIDTH: usize = 4;
const HEIGHT: usize = 4;

/// A mono y4m file whose frames are filled with their index.
fn write_video(path: &Path, frames: usize) {
    let mut bytes = format!("YUV4MPEG2 W{WIDTH} H{HEIGHT} F5:1 Ip A1:1 Cmono\n").into_bytes();
    for idx in 0..frames {
        bytes.extend_from_slice(b"FRAME\n");
        bytes.extend(std::iter::repeat(idx as u8).take(WIDTH * HEIGHT));
    }
    fs::write(path, bytes).unwrap();
}

fn write_annotations(path: &Path, timestamps: &[f64]) {
    let text: String = timestamps.iter().map(|ts| format!("{ts}\n")).collect();
    fs::write(path, text).unwrap();
}

fn config(dir: &TempDir, video_count: usize) -> Config {
    Config {
        video_folder: dir.path().to_owned(),
        video_count,
        file_extension: "y4m".into(),
        annotation_extension: ".txt".into(),
        ticks_per_second: 5,
    }
}

fn tracing_renderer(name: &str) -> multi_stream_player::Result<TracingRenderer> {
    Ok(TracingRenderer::new(name))
}

#[test]
fn decoder_reads_and_seeks_by_index() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("1.y4m");
    write_video(&path, 3);

    let mut decoder = Y4mDecoder::open(&path).unwrap();
    assert_eq!(decoder.frame_count(), 3);
    assert_eq!(decoder.format().chroma, Chroma::Mono);

    assert_eq!(decoder.read().unwrap().data[0], 0);
    assert_eq!(decoder.read().unwrap().data[0], 1);
    decoder.seek(0);
    assert_eq!(decoder.read().unwrap().data, vec![0; WIDTH * HEIGHT]);
    decoder.seek(2);
    assert_eq!(decoder.read().unwrap().data[0], 2);
    assert!(decoder.read().is_none());

    decoder.seek(0);
    decoder.release();
    decoder.release();
    assert!(decoder.read().is_none());
}

#[test]
fn truncated_trailing_frame_is_not_counted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("1.y4m");
    write_video(&path, 2);
    let mut bytes = fs::read(&path).unwrap();
    bytes.extend_from_slice(b"FRAME\n\x01\x02\x03");
    fs::write(&path, bytes).unwrap();

    assert_eq!(Y4mDecoder::open(&path).unwrap().frame_count(), 2);
}

#[test]
fn open_rejects_non_y4m_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("1.y4m");
    fs::write(&path, b"RIFF....AVI LIST\n").unwrap();

    assert!(matches!(Y4mDecoder::open(&path), Err(Error::Open { .. })));

    fs::write(&path, b"YUV4MPEG2 W4000000000 H4000000000 C420\nFRAME\n").unwrap();
    assert!(matches!(Y4mDecoder::open(&path), Err(Error::Open { .. })));

    assert!(matches!(
        Y4mDecoder::open(dir.path().join("missing.y4m")),
        Err(Error::Open { .. })
    ));
}

#[test]
fn y4m_renderer_burns_marker_into_stale_frames() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.y4m");
    let frame = Frame::blank(32, 32, Chroma::C420);

    {
        let mut renderer = Y4mRenderer::create(&path, 5).unwrap();
        renderer.display(&frame, None).unwrap();
        renderer.display(&frame, Some(Overlay::Stale)).unwrap();
        assert!(renderer
            .display(&Frame::blank(16, 16, Chroma::C420), None)
            .is_err());
    }

    let mut decoder = Y4mDecoder::open(&path).unwrap();
    assert_eq!(decoder.frame_count(), 2);
    assert_eq!(decoder.format().frame_rate, (5, 1));

    let fresh = decoder.read().unwrap();
    let stale = decoder.read().unwrap();
    assert_eq!(fresh, frame);
    assert_eq!(stale.luma()[8 * 32 + 8], 235);
    assert_ne!(stale, frame);
}

#[tokio::test(start_paused = true)]
async fn loads_and_plays_configured_videos() {
    let dir = TempDir::new().unwrap();
    write_video(&dir.path().join("1.y4m"), 3);
    write_video(&dir.path().join("2.y4m"), 2);
    write_annotations(&dir.path().join("1.txt"), &[10.1, 10.5, 10.9]);
    write_annotations(&dir.path().join("2.txt"), &[9.8, 10.2]);

    let sources = load_sources(&config(&dir, 2), tracing_renderer).unwrap();
    let names: Vec<_> = sources.iter().map(|source| source.name.as_str()).collect();
    assert_eq!(names, ["1", "2"]);

    let mut coordinator = Coordinator::new(sources, 5).unwrap();
    assert_eq!(coordinator.baseline(), 9);

    coordinator.run_to_end().await;

    let snapshots = coordinator.snapshots();
    assert!(snapshots
        .values()
        .all(|snapshot| snapshot.status == DriverStatus::Finished));
    assert_eq!(snapshots[&StreamId(0)].frame_index, 2);
    assert_eq!(snapshots[&StreamId(1)].frame_index, 1);
    assert!(coordinator.driver(StreamId(0)).unwrap().renderer().displayed() >= 3);
}

#[test]
fn missing_video_is_reported() {
    let dir = TempDir::new().unwrap();
    write_video(&dir.path().join("1.y4m"), 1);
    write_annotations(&dir.path().join("1.txt"), &[0.0]);

    let err = load_sources(&config(&dir, 2), tracing_renderer).unwrap_err();
    assert!(matches!(err, Error::MissingVideo(path) if path.ends_with("2.y4m")));
}

#[test]
fn missing_annotation_is_reported() {
    let dir = TempDir::new().unwrap();
    write_video(&dir.path().join("1.y4m"), 1);
    write_video(&dir.path().join("2.y4m"), 1);
    write_annotations(&dir.path().join("1.txt"), &[0.0]);

    let err = load_sources(&config(&dir, 2), tracing_renderer).unwrap_err();
    assert!(matches!(err, Error::MissingAnnotation(name) if name == "2"));
}

#[test]
fn malformed_annotation_is_reported() {
    let dir = TempDir::new().unwrap();
    write_video(&dir.path().join("1.y4m"), 2);
    fs::write(dir.path().join("1.txt"), "0.5\nfoo\n").unwrap();

    let err = load_sources(&config(&dir, 1), tracing_renderer).unwrap_err();
    assert!(matches!(err, Error::MalformedTimestamp { line: 2, .. }));
}

#[test]
fn track_length_must_match_frame_count() {
    let dir = TempDir::new().unwrap();
    write_video(&dir.path().join("1.y4m"), 3);
    write_annotations(&dir.path().join("1.txt"), &[0.0, 0.5]);

    let sources = load_sources(&config(&dir, 1), tracing_renderer).unwrap();
    let err = Coordinator::new(sources, 5).err().unwrap();
    assert!(matches!(
        err,
        Error::LengthMismatch {
            track_len: 2,
            frame_count: 3,
            ..
        }
    ));
}

#[test]
fn config_loads_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("player.toml");
    fs::write(
        &path,
        "video_folder = \"videos\"\nvideo_count = 2\nticks_per_second = 10\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.video_count, 2);
    assert_eq!(config.ticks_per_second, 10);
    assert_eq!(config.file_extension(), "y4m");

    fs::write(&path, "ticks_per_second = 0\n").unwrap();
    assert!(matches!(Config::load(&path), Err(Error::Config(_))));

    fs::write(&path, "ticks_per_second = \"fast\"\n").unwrap();
    assert!(matches!(Config::load(&path), Err(Error::ConfigParse { .. })));
}

use crate::{
    config::Config,
    coordinator::StreamSource,
    error::{Error, Result},
    track::load_annotations,
    types::Renderer,
    y4m::Y4mDecoder,
};
use tracing::info;

/// Builds one [StreamSource] per configured video: checks the video
/// exists, pairs it with its annotation track and opens it.
///
/// `make_renderer` is called with the stream name, the file stem of
/// the video.
pub fn load_sources<R, F>(
    config: &Config,
    mut make_renderer: F,
) -> Result<Vec<StreamSource<Y4mDecoder, R>>>
where
    R: Renderer,
    F: FnMut(&str) -> Result<R>,
{
    config.validate()?;

    let video_paths = config.video_paths();
    if let Some(missing) = video_paths.iter().find(|path| !path.is_file()) {
        return Err(Error::MissingVideo(missing.clone()));
    }

    let mut annotations = load_annotations(&config.video_folder, config.annotation_extension())?;

    video_paths
        .into_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let track = annotations
                .shift_remove(&name)
                .ok_or_else(|| Error::MissingAnnotation(name.clone()))?;
            let decoder = Y4mDecoder::open(&path)?;
            let renderer = make_renderer(&name)?;

            info!(
                stream = %name,
                path = %path.display(),
                frames = track.len(),
                "stream loaded"
            );

            Ok(StreamSource {
                name,
                track,
                decoder,
                renderer,
            })
        })
        .collect()
}

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use log::{error, info};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

const BACKGROUND_VOLUME: f32 = 0.5;

/// Keeps the background track alive. Dropping this stops playback, so the
/// launcher holds on to it for the lifetime of the window.
pub struct AudioPlayer {
    // the handle and sink go silent as soon as the stream drops
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    _sink: Sink,
}

/// Starts the looping background track.
///
/// Audio is decoration: when no output device exists or the file is missing,
/// the error is logged and the scene runs silently.
#[must_use]
pub fn start_background_track(path: &Path) -> Option<AudioPlayer> {
    match try_start(path) {
        Ok(player) => {
            info!("background track playing: {}", path.display());
            Some(player)
        }
        Err(audio_error) => {
            error!("background track unavailable: {audio_error:#}");
            None
        }
    }
}

fn try_start(path: &Path) -> anyhow::Result<AudioPlayer> {
    let (stream, handle) = OutputStream::try_default().context("no audio output device")?;
    let sink = Sink::try_new(&handle).context("failed to open audio sink")?;

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))?;

    sink.set_volume(BACKGROUND_VOLUME);
    sink.append(source.repeat_infinite());

    Ok(AudioPlayer {
        _stream: stream,
        _handle: handle,
        _sink: sink,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_none() {
        // may also fail earlier on machines without an audio device;
        // either way the caller sees a clean `None`
        assert!(start_background_track(Path::new("does/not/exist.ogg")).is_none());
    }
}

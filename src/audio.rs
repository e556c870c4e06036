//! Completion-sound playback
//!
//! Best-effort collaborator: a failed or unavailable audio stack logs a
//! warning and never propagates back to the dispatcher. Playback is
//! fire-and-forget so it cannot stall event processing.

use std::path::Path;

use tracing::warn;

#[cfg(feature = "audio")]
mod backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
    use tracing::{debug, warn};

    /// Plays completion sounds through the default output device.
    ///
    /// The output stream is held for the life of the player; appending a
    /// decoded source to the sink returns immediately.
    pub struct SoundPlayer {
        _stream: Option<OutputStream>,
        sink: Option<Sink>,
    }

    impl SoundPlayer {
        pub fn new() -> Self {
            match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => {
                    let sink = Sink::connect_new(stream.mixer());
                    Self {
                        _stream: Some(stream),
                        sink: Some(sink),
                    }
                }
                Err(e) => {
                    warn!(?e, "no audio output available, completion sounds disabled");
                    Self::disabled()
                }
            }
        }

        pub fn disabled() -> Self {
            Self {
                _stream: None,
                sink: None,
            }
        }

        pub fn play(&self, path: &Path) {
            let Some(sink) = &self.sink else {
                return;
            };

            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(?path, ?e, "failed to open completion sound");
                    return;
                }
            };

            match Decoder::new(BufReader::new(file)) {
                Ok(source) => {
                    debug!(?path, "playing completion sound");
                    sink.append(source);
                }
                Err(e) => warn!(?path, ?e, "failed to decode completion sound"),
            }
        }
    }
}

#[cfg(not(feature = "audio"))]
mod backend {
    use std::path::Path;

    use tracing::debug;

    /// Log-only stand-in used when the daemon is built without audio.
    pub struct SoundPlayer;

    impl SoundPlayer {
        pub fn new() -> Self {
            Self::disabled()
        }

        pub fn disabled() -> Self {
            Self
        }

        pub fn play(&self, path: &Path) {
            debug!(?path, "completion sound skipped (built without audio)");
        }
    }
}

pub use backend::SoundPlayer;

impl Default for SoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Plays a completion sound if the path exists, warning otherwise.
pub fn play_completion_sound(player: &SoundPlayer, path: &Path) {
    if path.exists() {
        player.play(path);
    } else {
        warn!(?path, "completion sound file does not exist");
    }
}

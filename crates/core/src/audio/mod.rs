use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::{AnchorFieldError, Result};

/// Playback backend for a decoded audio clip.
pub trait AudioSink: Send {
    fn play(&mut self) -> Result<()>;
}

#[derive(Default)]
struct AudioState {
    sink: Option<Box<dyn AudioSink>>,
    started: bool,
    playing: bool,
}

/// The session's single soundtrack.
///
/// Created once at startup and started at most once. The clip may still be
/// loading when [`start`](Self::start) is called; playback then begins as
/// soon as it is attached. Nothing ever stops it.
#[derive(Clone, Default)]
pub struct SharedAudioHandle {
    shared: Arc<Mutex<AudioState>>,
}

impl SharedAudioHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the loaded clip, playing it right away if a start was
    /// already requested.
    pub fn attach(&self, sink: Box<dyn AudioSink>) -> Result<()> {
        let mut state = self.lock()?;
        state.sink = Some(sink);
        if state.started && !state.playing {
            Self::play_locked(&mut state);
        }
        Ok(())
    }

    /// Starts playback. Returns `true` only for the first call.
    pub fn start(&self) -> Result<bool> {
        let mut state = self.lock()?;
        if state.started {
            return Ok(false);
        }

        state.started = true;
        if state.sink.is_some() {
            Self::play_locked(&mut state);
        } else {
            info!("audio not loaded yet; playback deferred until it arrives");
        }
        Ok(true)
    }

    pub fn is_started(&self) -> Result<bool> {
        Ok(self.lock()?.started)
    }

    pub fn is_playing(&self) -> Result<bool> {
        Ok(self.lock()?.playing)
    }

    pub fn is_loaded(&self) -> Result<bool> {
        Ok(self.lock()?.sink.is_some())
    }

    fn play_locked(state: &mut AudioState) {
        if let Some(sink) = state.sink.as_mut() {
            match sink.play() {
                Ok(()) => {
                    state.playing = true;
                    info!("soundtrack started");
                }
                Err(err) => warn!(%err, "soundtrack failed to play"),
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AudioState>> {
        self.shared
            .lock()
            .map_err(|_| AnchorFieldError::msg("audio handle has been poisoned"))
    }
}

impl std::fmt::Debug for SharedAudioHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAudioHandle").finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink that counts how often it was asked to play.
    pub(crate) struct CountingSink(pub Arc<AtomicUsize>);

    impl AudioSink for CountingSink {
        fn play(&mut self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn starts_exactly_once() {
        let plays = Arc::new(AtomicUsize::new(0));
        let audio = SharedAudioHandle::new();
        audio.attach(Box::new(CountingSink(plays.clone()))).unwrap();

        assert!(audio.start().unwrap());
        assert!(!audio.start().unwrap());
        assert_eq!(plays.load(Ordering::SeqCst), 1);
        assert!(audio.is_playing().unwrap());
    }

    #[test]
    fn deferred_start_plays_on_attach() {
        let plays = Arc::new(AtomicUsize::new(0));
        let audio = SharedAudioHandle::new();

        audio.start().unwrap();
        assert!(!audio.is_playing().unwrap());

        audio.attach(Box::new(CountingSink(plays.clone()))).unwrap();
        assert_eq!(plays.load(Ordering::SeqCst), 1);
        assert!(audio.is_playing().unwrap());
    }

    #[test]
    fn attaching_without_start_stays_silent() {
        let plays = Arc::new(AtomicUsize::new(0));
        let audio = SharedAudioHandle::new();
        audio.attach(Box::new(CountingSink(plays.clone()))).unwrap();

        assert_eq!(plays.load(Ordering::SeqCst), 0);
        assert!(audio.is_loaded().unwrap());
        assert!(!audio.is_started().unwrap());
    }
}

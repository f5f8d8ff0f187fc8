//! The `rodio` implementation of [`AudioEngine`].
//!
//! Each loaded track gets its own paused `Sink` on the shared mixer. The
//! decoded source is wrapped in [`Tracked`], which counts samples handed to
//! the mixer (so the position survives pause and seek) and restarts the
//! stream in place when looping is enabled.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use lofty::file::AudioFile;
use rodio::mixer::Mixer;
use rodio::source::SeekError;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sample, Sink, Source};
use tracing::{debug, warn};

use crate::config::EngineSettings;
use crate::error::EngineError;

use super::engine::{AudioEngine, EngineFactory};

/// Opens the default output device with the configured format.
pub struct RodioFactory {
    settings: EngineSettings,
}

impl RodioFactory {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

impl EngineFactory for RodioFactory {
    // The stream is not `Send`; it stays on the initializer thread.
    type Guard = OutputStream;

    fn open(self) -> Result<(Box<dyn AudioEngine>, OutputStream), EngineError> {
        let mut stream = OutputStreamBuilder::from_default_device()
            .map_err(|e| EngineError::Device(e.to_string()))?
            .with_sample_rate(self.settings.sample_rate)
            .with_channels(self.settings.channels)
            .open_stream_or_fallback()
            .map_err(|e| EngineError::Device(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which garbles the TUI.
        stream.log_on_drop(false);

        debug!(
            sample_rate = self.settings.sample_rate,
            channels = self.settings.channels,
            "opened output stream"
        );
        let engine = RodioEngine {
            mixer: stream.mixer().clone(),
            loaded: None,
        };
        Ok((Box::new(engine), stream))
    }
}

struct LoadedSink {
    sink: Sink,
    samples: Arc<AtomicU64>,
    looping: Arc<AtomicBool>,
    samples_per_sec: f64,
    duration: Option<f64>,
}

pub struct RodioEngine {
    mixer: Mixer,
    loaded: Option<LoadedSink>,
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let file = File::open(path)?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode(e.to_string()))?;

        let samples_per_sec = f64::from(decoder.sample_rate()) * f64::from(decoder.channels());
        let duration = decoder
            .total_duration()
            .map(|d| d.as_secs_f64())
            .or_else(|| tagged_duration(path));

        // Only release the old track once the new one decoded.
        self.unload();

        let samples = Arc::new(AtomicU64::new(0));
        let looping = Arc::new(AtomicBool::new(false));
        let sink = Sink::connect_new(&self.mixer);
        sink.pause();
        sink.append(Tracked {
            inner: decoder,
            samples: samples.clone(),
            looping: looping.clone(),
            samples_per_sec,
        });

        debug!(path = %path.display(), ?duration, "track loaded");
        self.loaded = Some(LoadedSink {
            sink,
            samples,
            looping,
            samples_per_sec,
            duration,
        });
        Ok(())
    }

    fn unload(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            loaded.sink.stop();
        }
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn start(&mut self) {
        if let Some(loaded) = &self.loaded {
            loaded.sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(loaded) = &self.loaded {
            loaded.sink.pause();
        }
    }

    fn elapsed_secs(&self) -> Result<f64, EngineError> {
        let loaded = self.loaded.as_ref().ok_or(EngineError::NotLoaded)?;
        if loaded.samples_per_sec <= 0.0 {
            return Ok(0.0);
        }
        Ok(loaded.samples.load(Ordering::Relaxed) as f64 / loaded.samples_per_sec)
    }

    fn duration_secs(&self) -> Option<f64> {
        self.loaded.as_ref().and_then(|l| l.duration)
    }

    fn at_end(&self) -> bool {
        self.loaded.as_ref().is_some_and(|l| l.sink.empty())
    }

    fn seek_to_secs(&mut self, secs: f64) -> Result<(), EngineError> {
        let loaded = self.loaded.as_ref().ok_or(EngineError::NotLoaded)?;
        if !secs.is_finite() {
            return Err(EngineError::Seek(format!("invalid target {secs}")));
        }
        loaded
            .sink
            .try_seek(Duration::from_secs_f64(secs.max(0.0)))
            .map_err(|e| EngineError::Seek(e.to_string()))
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(loaded) = &self.loaded {
            loaded.sink.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    fn set_looping(&mut self, looping: bool) {
        if let Some(loaded) = &self.loaded {
            loaded.looping.store(looping, Ordering::Relaxed);
        }
    }

    fn shutdown(&mut self) {
        self.unload();
    }
}

/// Length from the container tags, for streams that do not report one.
fn tagged_duration(path: &Path) -> Option<f64> {
    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let secs = tagged.properties().duration().as_secs_f64();
            (secs > 0.0).then_some(secs)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read duration from tags");
            None
        }
    }
}

/// Decoded source that tracks its own position.
struct Tracked<S> {
    inner: S,
    samples: Arc<AtomicU64>,
    looping: Arc<AtomicBool>,
    samples_per_sec: f64,
}

impl<S: Source> Tracked<S> {
    fn pull(&mut self) -> Option<Sample> {
        let sample = self.inner.next()?;
        self.samples.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }
}

impl<S: Source> Iterator for Tracked<S> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if let Some(sample) = self.pull() {
            return Some(sample);
        }
        if !self.looping.load(Ordering::Relaxed) {
            return None;
        }
        match self.inner.try_seek(Duration::ZERO) {
            Ok(()) => {
                self.samples.store(0, Ordering::Relaxed);
                self.pull()
            }
            Err(e) => {
                warn!(error = %e, "cannot rewind track for looping");
                None
            }
        }
    }
}

impl<S: Source> Source for Tracked<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.inner.try_seek(pos)?;
        let samples = (pos.as_secs_f64() * self.samples_per_sec).round() as u64;
        self.samples.store(samples, Ordering::Relaxed);
        Ok(())
    }
}

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::error::{EngineError, Result};

use super::engine::EngineFactory;
use super::handle::EngineHandle;

/// Owns the thread that opens the audio device.
///
/// The thread opens the engine, stores it in the shared [`EngineHandle`],
/// signals completion and then parks holding the factory's guard until
/// [`release_and_join`](Self::release_and_join) is called.
pub struct EngineInitializer {
    handle: EngineHandle,
    done: Option<Receiver<()>>,
    release: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl EngineInitializer {
    pub fn spawn<F: EngineFactory>(handle: EngineHandle, factory: F) -> Self {
        let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let thread_handle = handle.clone();

        let spawned = thread::Builder::new()
            .name("engine-init".to_string())
            .spawn(move || {
                let guard = match factory.open() {
                    Ok((engine, guard)) => {
                        thread_handle.complete_init(Ok(engine));
                        info!("audio engine ready");
                        Some(guard)
                    }
                    Err(e) => {
                        error!(error = %e, "audio engine failed to initialize");
                        thread_handle.complete_init(Err(e));
                        None
                    }
                };
                let _ = done_tx.send(());

                if let Some(guard) = guard {
                    // Blocks until released or the initializer is dropped.
                    let _ = release_rx.recv();
                    drop(guard);
                    debug!("audio output released");
                }
            });

        let join = match spawned {
            Ok(join) => Some(join),
            Err(e) => {
                error!(error = %e, "could not spawn the engine thread");
                handle.complete_init(Err(EngineError::Device(format!(
                    "could not spawn the engine thread: {e}"
                ))));
                None
            }
        };

        Self {
            handle,
            done: Some(done_rx),
            release: Some(release_tx),
            join,
        }
    }

    /// Block until initialization has finished. Returns the init outcome.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(done) = self.done.take()
            && done.recv().is_err()
        {
            // The thread died before reporting; make that permanent.
            self.handle.complete_init(Err(EngineError::Device(
                "engine thread exited during initialization".to_string(),
            )));
        }
        self.handle.ready()
    }

    /// Let the thread drop its guard and wait for it to exit. Idempotent.
    pub fn release_and_join(&mut self) {
        if let Some(release) = self.release.take() {
            let _ = release.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("engine thread panicked");
            }
        }
    }
}

impl Drop for EngineInitializer {
    fn drop(&mut self) {
        self.release_and_join();
    }
}

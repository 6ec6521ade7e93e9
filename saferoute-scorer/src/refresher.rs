//! Dedicated worker thread that sweeps the score cache periodically.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::cache::ScoreCache;
use crate::error::RefreshError;

const WORKER_NAME: &str = "saferoute-cache-refresh";

/// Handle to a running sweep worker.
///
/// Dropping the handle without calling [`RefreshWorker::stop`] disconnects
/// the stop channel, which also ends the worker after its current sweep.
pub(crate) struct RefreshWorker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl RefreshWorker {
    pub(crate) fn spawn(cache: Arc<ScoreCache>, interval: Duration) -> Result<Self, RefreshError> {
        let (stop, signal) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || run(&cache, &signal, interval))
            .map_err(|source| RefreshError::Spawn { source })?;
        info!("started cache refresh worker (interval {interval:?})");
        Ok(Self { stop, handle })
    }

    /// Wake the worker, ask it to exit and wait for it.
    pub(crate) fn stop(self) {
        if self.stop.send(()).is_err() {
            debug!("cache refresh worker had already exited");
        }
        if self.handle.join().is_err() {
            warn!("cache refresh worker panicked");
        } else {
            info!("stopped cache refresh worker");
        }
    }
}

fn run(cache: &ScoreCache, signal: &Receiver<()>, interval: Duration) {
    loop {
        match signal.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let report = cache.sweep();
                debug!(
                    "cache sweep evicted {} and refreshed {} entries",
                    report.evicted, report.refreshed
                );
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

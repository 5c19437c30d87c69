//! Asynchronous renderer detection.
//!
//! Every supported graphics API gets a probe on its present entry point;
//! the candidate that proves it is actually driving frame presentation
//! wins. Detection runs on its own single-thread runtime so the host's
//! frame loop only ever performs a zero-wait poll. An internal floor on
//! the observation window avoids mis-picking when multiple APIs present
//! (a compatibility layer translating onto a native API makes both look
//! alive for a moment).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use scrim_core::renderer::{Renderer, RendererCandidate};
use thiserror::Error;
use tokio::sync::Notify;

/// Minimum observation window. Caller timeouts below this are upgraded.
pub const DETECTION_FLOOR: Duration = Duration::from_secs(1);

/// Bounded wait for the detection task to quiesce at teardown.
pub const DETECTION_GRACE: Duration = Duration::from_millis(500);

/// How often probes are sampled.
const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("no renderer candidates supplied")]
    NoCandidates,

    #[error("failed to start the detection runtime")]
    Runtime(#[source] std::io::Error),
}

/// Zero-wait view of an in-flight detection.
pub enum DetectionPoll {
    /// Still observing.
    Pending,
    /// A candidate proved itself; hooks of the losers are gone.
    Detected(Arc<dyn Renderer>),
    /// Timed out or was cancelled with no winner.
    NoRenderer,
}

/// Handle to a running detection task.
pub struct RendererDetection {
    runtime: Option<tokio::runtime::Runtime>,
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    result: Receiver<Option<Arc<dyn Renderer>>>,
    finished: bool,
}

/// Launch detection over `candidates`.
///
/// `timeout` of `None` means "just the floor"; any value below
/// [`DETECTION_FLOOR`] is upgraded to it.
pub fn detect_renderer(
    candidates: Vec<Box<dyn RendererCandidate>>,
    timeout: Option<Duration>,
) -> Result<RendererDetection, DetectorError> {
    if candidates.is_empty() {
        return Err(DetectorError::NoCandidates);
    }
    let timeout = timeout.unwrap_or(DETECTION_FLOOR).max(DETECTION_FLOOR);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("scrim-renderer-detect")
        .enable_time()
        .build()
        .map_err(DetectorError::Runtime)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let wake = Arc::new(Notify::new());
    let (tx, rx) = mpsc::channel();

    runtime.spawn(detection_task(
        candidates,
        timeout,
        cancel.clone(),
        wake.clone(),
        tx,
    ));

    Ok(RendererDetection {
        runtime: Some(runtime),
        cancel,
        wake,
        result: rx,
        finished: false,
    })
}

impl RendererDetection {
    /// Zero-wait check of the detection outcome. Once the task resolved,
    /// further polls keep returning [`DetectionPoll::NoRenderer`] (the
    /// winner is handed out exactly once).
    pub fn poll(&mut self) -> DetectionPoll {
        if self.finished {
            return DetectionPoll::NoRenderer;
        }
        match self.result.try_recv() {
            Ok(Some(renderer)) => {
                self.finished = true;
                DetectionPoll::Detected(renderer)
            }
            Ok(None) | Err(TryRecvError::Disconnected) => {
                self.finished = true;
                DetectionPoll::NoRenderer
            }
            Err(TryRecvError::Empty) => DetectionPoll::Pending,
        }
    }

    /// Request cancellation. Never blocks; the task notices within one
    /// poll interval.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Release);
        self.wake.notify_waiters();
    }

    /// Cancel and wait (bounded) for the task to quiesce, then release
    /// probe resources. Shutdown cannot hang on a stuck probe: after
    /// `grace` the runtime is dropped in the background.
    pub fn shutdown(mut self, grace: Duration) {
        self.stop();
        if !self.finished {
            match self.result.recv_timeout(grace) {
                Ok(_) | Err(RecvTimeoutError::Disconnected) => {}
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!("renderer detection did not quiesce within the grace period");
                }
            }
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for RendererDetection {
    fn drop(&mut self) {
        self.stop();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn detection_task(
    candidates: Vec<Box<dyn RendererCandidate>>,
    timeout: Duration,
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    tx: mpsc::Sender<Option<Arc<dyn Renderer>>>,
) {
    // Install probes; APIs not even loaded in the process drop out here.
    let mut probes: Vec<Box<dyn RendererCandidate>> = Vec::new();
    for candidate in candidates {
        if candidate.install_probe() {
            tracing::debug!(api = candidate.name(), "present probe installed");
            probes.push(candidate);
        } else {
            tracing::debug!(api = candidate.name(), "api not present, skipping");
        }
    }
    if probes.is_empty() {
        let _ = tx.send(None);
        return;
    }

    let started = tokio::time::Instant::now();
    // Index of the probe that presented first, for tie-breaking.
    let mut first_seen: Option<usize> = None;

    let winner = loop {
        if cancel.load(Ordering::Acquire) {
            break None;
        }

        tokio::select! {
            _ = tokio::time::sleep(PROBE_POLL_INTERVAL) => {}
            _ = wake.notified() => {}
        }

        let counts: Vec<u64> = probes.iter().map(|p| p.present_count()).collect();
        if first_seen.is_none() {
            first_seen = counts.iter().position(|c| *c > 0);
        }

        let elapsed = started.elapsed();
        let any_presented = counts.iter().any(|c| *c > 0);

        // Resolve once the floor has passed and someone presented: the
        // probe with the most observed presents is the API actually
        // driving frames; first-observed breaks ties.
        if elapsed >= DETECTION_FLOOR && any_presented {
            let best = counts
                .iter()
                .enumerate()
                .max_by_key(|(i, c)| (**c, std::cmp::Reverse(*i)))
                .map(|(i, _)| i);
            let pick = match (best, first_seen) {
                (Some(b), Some(f)) if counts[b] == counts[f] => f,
                (Some(b), _) => b,
                (None, _) => break None,
            };
            break Some(pick);
        }

        if elapsed >= timeout {
            break None;
        }
    };

    match winner {
        Some(index) => {
            let winner = probes.swap_remove(index);
            for loser in &probes {
                loser.uninstall_probe();
            }
            tracing::debug!(api = winner.name(), "renderer detected");
            let _ = tx.send(Some(winner.into_renderer()));
        }
        None => {
            for probe in &probes {
                probe.uninstall_probe();
            }
            tracing::debug!("renderer detection resolved with no winner");
            let _ = tx.send(None);
        }
    }
}

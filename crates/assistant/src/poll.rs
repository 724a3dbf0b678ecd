//! Drives a run to completion with linearly growing backoff.

use std::time::Duration;

use {
    tokio::time::Instant,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    api::{AssistantBackend, RunId, RunStatus, ThreadId},
    error::{Error, Result},
};

const BASE_INTERVAL_SECS: f64 = 1.0;
const MAX_INTERVAL_SECS: f64 = 5.0;

/// Poll `run` until the backend reports it completed.
///
/// The wait between polls starts at one second and grows by one second per
/// ten seconds of elapsed wall-clock time, capped at five seconds. There is
/// no overall deadline: generation takes as long as it takes. The loop exits
/// early when `cancel` fires, when the transport fails, or when the run
/// reaches a terminal status other than completed.
pub async fn await_completion(
    backend: &dyn AssistantBackend,
    thread: &ThreadId,
    run: &RunId,
    cancel: &CancellationToken,
) -> Result<()> {
    let started = Instant::now();

    loop {
        let status = backend.run_status(thread, run).await?;
        match status {
            RunStatus::Completed => {
                debug!(thread = %thread, run = %run, "run completed");
                return Ok(());
            },
            status if status.is_terminal() => {
                warn!(thread = %thread, run = %run, status = %status, "run ended without completing");
                return Err(Error::RunEnded {
                    run_id: run.clone(),
                    status,
                });
            },
            _ => {},
        }

        let elapsed = started.elapsed().as_secs_f64();
        let delay = (BASE_INTERVAL_SECS + elapsed / 10.0).min(MAX_INTERVAL_SECS);
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(thread = %thread, run = %run, "run polling cancelled");
                return Err(Error::PollCancelled);
            },
            () = tokio::time::sleep(Duration::from_secs_f64(delay)) => {},
        }
    }
}

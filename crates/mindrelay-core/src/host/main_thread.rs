//! Single-owner job loop for the game host.
//!
//! `MainThread` owns the `GameHost` and drains a job queue on one task.
//! Workers hold a cloneable `MainThreadHandle`, submit closures, and await
//! the result through a oneshot. A panicking job is caught and reported
//! to the caller as [`HostError::JobPanicked`]; the loop keeps running.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use mindrelay_types::error::HostError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::GameHost;

type Job = Box<dyn FnOnce(&mut dyn GameHost) + Send>;

/// Owner of the host; run it on the task that represents the main thread.
pub struct MainThread {
    host: Box<dyn GameHost>,
    jobs: mpsc::UnboundedReceiver<Job>,
}

/// Cloneable sender side of the job queue.
#[derive(Clone)]
pub struct MainThreadHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

impl MainThread {
    pub fn new(host: Box<dyn GameHost>) -> (Self, MainThreadHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { host, jobs: rx }, MainThreadHandle { jobs: tx })
    }

    /// Drain jobs until every handle is dropped or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                job = self.jobs.recv() => match job {
                    Some(job) => job(self.host.as_mut()),
                    None => break,
                },
            }
        }
        tracing::debug!("main thread job loop stopped");
    }

    /// Run every queued job without waiting. Returns how many ran.
    ///
    /// For hosts that tick the loop themselves instead of calling [`run`](Self::run).
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job(self.host.as_mut());
            ran += 1;
        }
        ran
    }

    /// Direct access for code already on the main thread.
    pub fn host_mut(&mut self) -> &mut dyn GameHost {
        self.host.as_mut()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl MainThreadHandle {
    /// Run `f` on the main thread and wait for its result.
    pub async fn call<R, F>(&self, f: F) -> Result<R, HostError>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn GameHost) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |host| {
            let result = catch_unwind(AssertUnwindSafe(|| f(host))).map_err(panic_message);
            // The caller may have been cancelled; nothing to do then.
            let _ = tx.send(result);
        });
        self.jobs.send(job).map_err(|_| HostError::MainThreadGone)?;
        rx.await
            .map_err(|_| HostError::MainThreadGone)?
            .map_err(HostError::JobPanicked)
    }

    /// Queue `f` without waiting for it.
    pub fn post<F>(&self, f: F) -> Result<(), HostError>
    where
        F: FnOnce(&mut dyn GameHost) + Send + 'static,
    {
        let job: Job = Box::new(move |host| {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(host))) {
                tracing::error!(panic = %panic_message(payload), "posted host job panicked");
            }
        });
        self.jobs.send(job).map_err(|_| HostError::MainThreadGone)
    }

    /// Whether the main thread is still accepting jobs.
    pub fn is_running(&self) -> bool {
        !self.jobs.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use mindrelay_types::host::Executor;

    fn spawn_host() -> (MainThreadHandle, CancellationToken, tokio::task::JoinHandle<()>) {
        let (main, handle) = MainThread::new(Box::new(FakeHost::new()));
        let cancel = CancellationToken::new();
        let join = tokio::spawn(main.run(cancel.clone()));
        (handle, cancel, join)
    }

    #[tokio::test]
    async fn test_call_returns_job_result() {
        let (handle, cancel, join) = spawn_host();
        let report = handle
            .call(|host| host.dispatch(Executor::Console, "time set day"))
            .await
            .unwrap()
            .unwrap();
        assert!(report.accepted);
        cancel.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_job_is_reported_and_loop_survives() {
        let (handle, cancel, join) = spawn_host();
        let err = handle
            .call(|_host| -> u32 { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::JobPanicked(ref m) if m == "boom"));

        let worlds = handle.call(|host| host.worlds().len()).await.unwrap();
        assert_eq!(worlds, 1);
        cancel.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_call_after_shutdown_fails() {
        let (handle, cancel, join) = spawn_host();
        cancel.cancel();
        join.await.unwrap();
        assert!(!handle.is_running());
        let err = handle.call(|host| host.worlds().len()).await.unwrap_err();
        assert!(matches!(err, HostError::MainThreadGone));
    }

    #[test]
    fn test_run_pending_drains_queue() {
        let (mut main, handle) = MainThread::new(Box::new(FakeHost::new()));
        handle.post(|host| host.send_message(&Default::default(), "a")).unwrap();
        handle.post(|_| panic!("ignored")).unwrap();
        handle.post(|host| host.send_message(&Default::default(), "b")).unwrap();
        assert_eq!(main.run_pending(), 3);
        assert_eq!(main.run_pending(), 0);
    }
}

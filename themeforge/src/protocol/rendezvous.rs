//! Filesystem-based readiness semaphore.
//!
//! The editor and the render process are launched by different parents, so
//! there is no shared handle to wait on; three presence-only marker files
//! under a rendezvous directory act as the signals instead. Each marker
//! carries a single human-readable diagnostic line, but presence, not
//! content, is authoritative.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::core::prelude::*;

pub const READY_MARKER: &str = "listener-ready";
pub const STOP_MARKER: &str = "stop-requested";
pub const ACK_MARKER: &str = "start-acknowledged";

/// Default polling budget: ~5s.
pub const DEFAULT_POLLS: u32 = 50;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extended budget for process-launch scenarios: ~40s.
pub const LAUNCH_POLLS: u32 = 80;
pub const LAUNCH_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct Rendezvous {
    dir: PathBuf,
}

impl Rendezvous {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn marker_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn write_marker(&self, name: &str, label: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let line = format!(
            "[{}] {} at {}\n",
            std::process::id(),
            label,
            Utc::now().to_rfc3339()
        );
        fs::write(self.marker_path(name), line)?;
        Ok(())
    }

    fn clear_marker(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.marker_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn signal_ready(&self) -> Result<()> {
        self.write_marker(READY_MARKER, "listener ready")
    }

    pub fn request_stop(&self) -> Result<()> {
        self.write_marker(STOP_MARKER, "stop requested")
    }

    pub fn acknowledge_start(&self) -> Result<()> {
        self.write_marker(ACK_MARKER, "start acknowledged")
    }

    pub fn ready(&self) -> bool {
        self.marker_path(READY_MARKER).exists()
    }

    pub fn stop_requested(&self) -> bool {
        self.marker_path(STOP_MARKER).exists()
    }

    /// Removes markers left behind by a crashed prior session. Run by
    /// whichever side starts first, to avoid false-positive readiness.
    pub fn clear_stale(&self) -> Result<()> {
        for marker in [READY_MARKER, STOP_MARKER, ACK_MARKER] {
            self.clear_marker(marker)?;
        }
        Ok(())
    }

    /// Polls for the ready marker, sleeping `interval` between polls, and
    /// fails with [`Error::ListenerTimeout`] once the budget is exhausted.
    pub fn await_ready(&self, polls: u32, interval: Duration) -> Result<()> {
        self.await_ready_with(polls, interval, thread::sleep)
    }

    /// Same as [`Rendezvous::await_ready`] with an injectable sleep, so tests
    /// can drive the poll loop without real time passing.
    pub fn await_ready_with(
        &self,
        polls: u32,
        interval: Duration,
        mut sleep: impl FnMut(Duration),
    ) -> Result<()> {
        for _ in 0..polls {
            if self.ready() {
                return Ok(());
            }
            sleep(interval);
        }

        Err(Error::ListenerTimeout {
            polls,
            waited: interval * polls,
        })
    }

    /// Cooperative stop check: if a stop was requested, removes the stop
    /// marker and this side's start acknowledgement, and returns true. The
    /// caller is expected to terminate.
    pub fn observe_stop(&self) -> Result<bool> {
        if !self.stop_requested() {
            return Ok(false);
        }
        info!("Stop requested; clearing markers");
        self.clear_marker(STOP_MARKER)?;
        self.clear_marker(ACK_MARKER)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendezvous() -> (tempfile::TempDir, Rendezvous) {
        let dir = tempfile::tempdir().unwrap();
        let rv = Rendezvous::new(dir.path());
        (dir, rv)
    }

    #[test]
    fn await_ready_succeeds_once_marker_exists() {
        let (_dir, rv) = rendezvous();
        rv.signal_ready().unwrap();

        let mut slept = 0;
        rv.await_ready_with(5, Duration::from_millis(100), |_| slept += 1)
            .unwrap();
        assert_eq!(slept, 0);
    }

    #[test]
    fn await_ready_times_out_after_the_poll_budget() {
        let (_dir, rv) = rendezvous();

        let mut slept = 0u32;
        let result = rv.await_ready_with(
            5,
            Duration::from_millis(100),
            |interval| {
                assert_eq!(interval, Duration::from_millis(100));
                slept += 1;
            },
        );

        assert_eq!(slept, 5);
        match result {
            Err(Error::ListenerTimeout { polls, waited }) => {
                assert_eq!(polls, 5);
                assert_eq!(waited, Duration::from_millis(500));
            }
            other => panic!("expected ListenerTimeout, got {:?}", other),
        }
    }

    #[test]
    fn marker_appearing_mid_poll_is_observed() {
        let (_dir, rv) = rendezvous();
        let signal_side = rv.clone();

        let mut polls = 0;
        rv.await_ready_with(10, Duration::from_millis(1), |_| {
            polls += 1;
            if polls == 3 {
                signal_side.signal_ready().unwrap();
            }
        })
        .unwrap();
        assert_eq!(polls, 3);
    }

    #[test]
    fn observe_stop_clears_stop_and_ack_markers() {
        let (_dir, rv) = rendezvous();
        rv.acknowledge_start().unwrap();
        rv.request_stop().unwrap();

        assert!(rv.observe_stop().unwrap());
        assert!(!rv.stop_requested());
        assert!(!rv.dir().join(ACK_MARKER).exists());

        assert!(!rv.observe_stop().unwrap());
    }

    #[test]
    fn clear_stale_removes_markers_from_a_prior_session() {
        let (_dir, rv) = rendezvous();
        rv.signal_ready().unwrap();
        rv.request_stop().unwrap();

        rv.clear_stale().unwrap();
        assert!(!rv.ready());
        assert!(!rv.stop_requested());
    }

    #[test]
    fn marker_content_is_a_single_diagnostic_line() {
        let (_dir, rv) = rendezvous();
        rv.signal_ready().unwrap();

        let content =
            fs::read_to_string(rv.dir().join(READY_MARKER)).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with(&format!("[{}]", std::process::id())));
        assert!(content.contains("listener ready at "));
    }
}

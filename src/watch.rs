// src/watch.rs
//
// Change detection for watch mode.
//
// A background thread polls the input file and calls back on every change. The
// `Debouncer` lives with the caller's event loop and turns a burst of changes
// into a single reconversion.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet-period timer. Every [`Debouncer::trigger`] pushes the deadline back;
/// [`Debouncer::fire`] reports true once, after the deadline has passed.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Time left before firing, or `None` when nothing is pending.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// What the watcher compares between polls. `None` while the file is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

fn stamp(path: &Path) -> Option<Stamp> {
    let meta = fs::metadata(path).ok()?;
    Some(Stamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

/// Poll `path` every `interval` and call `on_change` whenever its modification time
/// or size differs from the previous poll (including appearing or disappearing).
/// The thread stops once `on_change` returns false.
pub fn spawn_watcher<F>(path: PathBuf, interval: Duration, mut on_change: F) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    thread::spawn(move || {
        let mut last = stamp(&path);
        log::debug!("watching {} (every {:?})", path.display(), interval);
        loop {
            thread::sleep(interval);
            let current = stamp(&path);
            if current != last {
                last = current;
                log::trace!("change detected in {}", path.display());
                if !on_change() {
                    break;
                }
            }
        }
    })
}

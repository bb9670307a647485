use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::project_io::is_live_set;

/// Events sent from the file watcher to the watch loop.
#[derive(Debug, PartialEq, Eq)]
pub enum SetEvent {
    /// One or more Live sets were written.
    Changed(Vec<PathBuf>),
}

/// A file system watcher for the `.als` files in a directory.
pub struct AlsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<SetEvent>,
}

impl AlsWatcher {
    /// Start watching `dir` (not recursively; Live keeps its backups one
    /// level down).
    pub fn start(dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::warn!("watch error: {}", e);
                        return;
                    }
                };
                if let Some(changed) = relevant_event(&event)
                    && tx.send(changed).is_err()
                {
                    tracing::debug!("watch loop has stopped, dropping event");
                }
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(AlsWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending events.
    pub fn poll(&self) -> Vec<SetEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Block up to `timeout` for the next event, then drain anything else
    /// that is already queued.
    pub fn wait(&self, timeout: Duration) -> Vec<SetEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(first) => {
                let mut events = vec![first];
                events.extend(self.poll());
                events
            }
            Err(_) => Vec::new(),
        }
    }
}

/// Keep creates and modifications of Live sets. Generated summaries and
/// Live's backups are ignored, so writing a summary never retriggers.
fn relevant_event(event: &Event) -> Option<SetEvent> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {}
        _ => return None,
    }
    let paths: Vec<PathBuf> = event
        .paths
        .iter()
        .filter(|p| is_live_set(p))
        .cloned()
        .collect();
    if paths.is_empty() {
        None
    } else {
        tracing::debug!(?paths, "live set changed");
        Some(SetEvent::Changed(paths))
    }
}

/// Collapses bursts of events per path: a path is ready once it has been
/// quiet for the debounce interval.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Debouncer {
            interval,
            pending: HashMap::new(),
        }
    }

    /// Note an event for `path` at `now`, restarting its quiet period
    pub fn touch(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path, now);
    }

    /// Paths that have been quiet long enough, removed from the pending set
    /// and sorted for a stable processing order
    pub fn ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, last)| now.duration_since(**last) >= self.interval)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.pending.remove(path);
        }
        ready.sort();
        ready
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

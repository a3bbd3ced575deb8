use log::*;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// Whole seconds since the unix epoch.
pub type Timestamp = u64;

/// Time source shared by the table and the failure detector.
///
/// Production nodes read the wall clock. Tests build a manual clock and move
/// it forward explicitly, which makes detector boundaries deterministic.
#[derive(Clone)]
pub struct Clock {
    inner: Arc<Mutex<Inner>>,
}

enum Inner {
    Wall,
    Manual { now: Duration },
}

impl Clock {
    pub fn new() -> Self {
        Self::with_inner(Inner::Wall)
    }

    pub fn manual(start: Duration) -> Self {
        Self::with_inner(Inner::Manual { now: start })
    }

    fn with_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Time since the unix epoch, with sub-second precision.
    pub fn now(&self) -> Duration {
        match *self.inner.lock().unwrap_or_else(PoisonError::into_inner) {
            Inner::Wall => wall_now(),
            Inner::Manual { now } => now,
        }
    }

    pub fn now_secs(&self) -> Timestamp {
        self.now().as_secs()
    }

    pub fn advance(&self, by: Duration) {
        let mut locked = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match *locked {
            Inner::Wall => warn!("Ignoring attempt to advance the wall clock"),
            Inner::Manual { ref mut now } => *now += by,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Time elapsed between a stored timestamp and `now`, zero if the timestamp
/// lies in the future.
pub fn elapsed_since(now: Duration, timestamp: Timestamp) -> Duration {
    now.saturating_sub(Duration::from_secs(timestamp))
}

fn wall_now() -> Duration {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::config::TrackingConfig;
use crate::tracking::TrackingState;

#[derive(Debug)]
struct SessionEntry {
    state: TrackingState,
    last_seen: Instant,
}

/// Tracking state keyed by client session id.
///
/// Sessions idle longer than the TTL are dropped by [`SessionStore::sweep`];
/// creating a session at capacity evicts the least recently seen one.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    max_sessions: usize,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            ttl,
            max_sessions: max_sessions.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(
            Duration::from_secs(config.session_ttl_secs),
            config.max_sessions,
        )
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the session's state under the store lock, creating the
    /// session if needed and marking it as seen.
    pub fn with_state<R>(&self, session_id: &str, f: impl FnOnce(&mut TrackingState) -> R) -> R {
        let now = Instant::now();
        let mut map = self.lock();

        if !map.contains_key(session_id) && map.len() >= self.max_sessions {
            let oldest = map
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                map.remove(&id);
                tracing::info!(session_id = %id, "Tracking session evicted at capacity");
            }
        }

        let entry = map
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                state: TrackingState::default(),
                last_seen: now,
            });
        entry.last_seen = now;
        f(&mut entry.state)
    }

    /// Copy of the session's state; unknown sessions read as fresh state.
    pub fn snapshot(&self, session_id: &str) -> TrackingState {
        self.lock()
            .get(session_id)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    /// Returns `false` when the session did not exist.
    pub fn reset(&self, session_id: &str) -> bool {
        match self.lock().get_mut(session_id) {
            Some(entry) => {
                entry.state.reset();
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Puts `previous` back if the session still holds `expected`.
    ///
    /// Returns `false` when another frame has advanced the session since, or
    /// the session is gone; the state is left alone in both cases.
    pub fn restore_if_unchanged(
        &self,
        session_id: &str,
        expected: &TrackingState,
        previous: TrackingState,
    ) -> bool {
        match self.lock().get_mut(session_id) {
            Some(entry) if entry.state == *expected => {
                entry.state = previous;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drops sessions idle longer than the TTL as of `now`.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.ttl);
        before - map.len()
    }
}

pub async fn session_sweep_loop(
    store: Arc<SessionStore>,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let evicted = store.sweep();
                if evicted > 0 {
                    tracing::info!(evicted, remaining = store.len(), "Idle tracking sessions evicted");
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
    tracing::debug!("session sweep stopped");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::vision::BoundingBox;

    fn two_eyes() -> Vec<BoundingBox> {
        vec![BoundingBox::new(10, 20, 20, 20), BoundingBox::new(70, 20, 20, 20)]
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        store.with_state("a", |s| s.commit(&two_eyes(), false, Utc::now()));

        assert!(store.snapshot("a").is_calibrated());
        assert!(!store.snapshot("b").is_calibrated());
        assert!(!store.contains("b"));
    }

    #[test]
    fn reset_only_touches_one_session() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        store.with_state("a", |s| s.commit(&two_eyes(), false, Utc::now()));
        store.with_state("b", |s| s.commit(&two_eyes(), false, Utc::now()));

        assert!(store.reset("a"));
        assert!(!store.snapshot("a").is_calibrated());
        assert!(store.snapshot("a").previous().is_empty());
        assert!(store.snapshot("b").is_calibrated());
        assert!(!store.reset("missing"));
    }

    #[test]
    fn restore_only_when_untouched() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        let before = store.snapshot("a");
        store.with_state("a", |s| s.commit(&two_eyes(), false, Utc::now()));
        let after = store.snapshot("a");

        assert!(store.restore_if_unchanged("a", &after, before.clone()));
        assert!(!store.snapshot("a").is_calibrated());

        store.with_state("a", |s| s.commit(&two_eyes(), false, Utc::now()));
        store.with_state("a", |s| {
            s.commit(&[BoundingBox::new(0, 0, 8, 8)], true, Utc::now())
        });
        assert!(!store.restore_if_unchanged("a", &after, before.clone()));
        assert!(store.snapshot("a").is_calibrated());
        assert!(!store.restore_if_unchanged("missing", &after, before));
    }

    #[test]
    fn sweep_drops_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(5), 8);
        store.with_state("a", |_| ());
        assert_eq!(store.sweep_at(Instant::now()), 0);
        assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(10)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recently_seen() {
        let store = SessionStore::new(Duration::from_secs(60), 2);
        store.with_state("a", |_| ());
        std::thread::sleep(Duration::from_millis(2));
        store.with_state("b", |_| ());
        std::thread::sleep(Duration::from_millis(2));
        store.with_state("a", |_| ());
        store.with_state("c", |_| ());

        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert!(store.contains("c"));
        assert!(!store.contains("b"));
    }

    #[tokio::test]
    async fn sweep_loop_stops_on_shutdown() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60), 4));
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(session_sweep_loop(store, Duration::from_millis(5), rx));
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop exits")
            .unwrap();
    }
}

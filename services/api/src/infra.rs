use chrono::{DateTime, Duration, NaiveDate, Utc};
use maturity_assessment::assessment::session::{apply_staged, SessionId, SessionStore, StoreError};
use maturity_assessment::assessment::{AssessmentState, Sector};
use maturity_assessment::config::SessionConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

struct SessionEntry {
    state: AssessmentState,
    touched: DateTime<Utc>,
}

/// Session store for the running service. Sessions end on DELETE or after sitting idle longer
/// than the configured timeout; expired entries are swept whenever a session starts.
#[derive(Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
    idle_timeout: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(SessionConfig::default().idle_timeout())
    }
}

impl InMemorySessionStore {
    pub(crate) fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionEntry>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session mutex poisoned".to_string()))
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.touched > self.idle_timeout
    }

    /// Returns the live entry for `id`, dropping it first when it has expired.
    fn live_entry<'a>(
        &self,
        sessions: &'a mut HashMap<SessionId, SessionEntry>,
        id: &SessionId,
        now: DateTime<Utc>,
    ) -> Option<&'a mut SessionEntry> {
        if sessions
            .get(id)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            sessions.remove(id);
            debug!(session = %id, "idle session expired");
            return None;
        }
        let entry = sessions.get_mut(id)?;
        entry.touched = now;
        Some(entry)
    }

    #[cfg(test)]
    fn backdate(&self, id: &SessionId, by: Duration) {
        let mut sessions = self.sessions.lock().expect("session mutex");
        if let Some(entry) = sessions.get_mut(id) {
            entry.touched = entry.touched - by;
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.lock().expect("session mutex").len()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, id: SessionId, state: AssessmentState) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut sessions = self.guard()?;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, "swept idle sessions");
        }

        if sessions.contains_key(&id) {
            return Err(StoreError::Conflict);
        }
        sessions.insert(
            id,
            SessionEntry {
                state,
                touched: now,
            },
        );
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentState>, StoreError> {
        let mut sessions = self.guard()?;
        Ok(self
            .live_entry(&mut sessions, id, Utc::now())
            .map(|entry| entry.state.clone()))
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut sessions = self.guard()?;
        self.live_entry(&mut sessions, id, Utc::now())
            .ok_or(StoreError::NotFound)?;
        sessions.remove(id);
        Ok(())
    }

    fn modify<T, E, F>(&self, id: &SessionId, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut AssessmentState) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut sessions = self.guard()?;
        let entry = self
            .live_entry(&mut sessions, id, Utc::now())
            .ok_or(StoreError::NotFound)?;
        apply_staged(&mut entry.state, change)
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_sector(raw: &str) -> Result<Sector, String> {
    raw.parse::<Sector>().map_err(|err| {
        let known: Vec<&str> = Sector::ordered().iter().map(|sector| sector.label()).collect();
        format!("{err}; expected one of: {}", known.join(", "))
    })
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::assessment::catalog::{domains_for, Sector};
use crate::assessment::report::PdfRenderer;
use crate::assessment::session::store::{apply_staged, SessionId, SessionStore, StoreError};
use crate::assessment::session::{assessment_router, AssessmentService};
use crate::assessment::state::AssessmentState;
use crate::config::ReportConfig;

#[derive(Default, Clone)]
pub(super) struct MemorySessions {
    sessions: Arc<Mutex<HashMap<SessionId, AssessmentState>>>,
}

impl MemorySessions {
    pub(super) fn len(&self) -> usize {
        self.sessions.lock().expect("sessions mutex").len()
    }
}

impl SessionStore for MemorySessions {
    fn insert(&self, id: SessionId, state: AssessmentState) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().expect("sessions mutex");
        if guard.contains_key(&id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(id, state);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentState>, StoreError> {
        Ok(self.sessions.lock().expect("sessions mutex").get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .expect("sessions mutex")
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn modify<T, E, F>(&self, id: &SessionId, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut AssessmentState) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.sessions.lock().expect("sessions mutex");
        let slot = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        apply_staged(slot, change)
    }
}

pub(super) struct UnavailableSessions;

impl SessionStore for UnavailableSessions {
    fn insert(&self, _id: SessionId, _state: AssessmentState) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("maintenance".to_string()))
    }


    fn fetch(&self, _id: &SessionId) -> Result<Option<AssessmentState>, StoreError> {
        Err(StoreError::Unavailable("maintenance".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("maintenance".to_string()))
    }

    fn modify<T, E, F>(&self, _id: &SessionId, _change: F) -> Result<T, E>
    where
        F: FnOnce(&mut AssessmentState) -> Result<T, E>,
        E: From<StoreError>,
    {
        Err(StoreError::Unavailable("maintenance".to_string()).into())
    }
}

pub(super) type TestService = AssessmentService<MemorySessions, PdfRenderer>;

pub(super) fn build_service() -> (Arc<TestService>, MemorySessions) {
    let sessions = MemorySessions::default();
    let service = AssessmentService::new(
        Arc::new(sessions.clone()),
        Arc::new(PdfRenderer),
        ReportConfig::default(),
    );
    (Arc::new(service), sessions)
}

pub(super) fn router_with_service(service: Arc<TestService>) -> axum::Router {
    assessment_router(service)
}

/// Rates every criterion of every domain with the same level.
pub(super) fn rate_all(service: &TestService, session_id: &SessionId, level: i64) {
    for domain in domains_for(Sector::Energy) {
        for index in 0..domain.criteria.len() {
            service
                .set_score(session_id, domain.name, index, level)
                .expect("score accepted");
        }
    }
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}

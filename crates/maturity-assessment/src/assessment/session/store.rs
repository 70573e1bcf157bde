use serde::{Deserialize, Serialize};
use std::fmt;

use super::super::state::AssessmentState;

/// Opaque handle for one questionnaire session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds one independent assessment state per session.
pub trait SessionStore: Send + Sync {
    fn insert(&self, id: SessionId, state: AssessmentState) -> Result<(), StoreError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentState>, StoreError>;
    fn remove(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Runs `change` against a staged copy of the session while no other change to it can
    /// interleave; the copy replaces the stored state only when `change` succeeds.
    fn modify<T, E, F>(&self, id: &SessionId, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut AssessmentState) -> Result<T, E>,
        E: From<StoreError>;
}

/// Applies `change` to a clone of `slot` and commits it on success.
pub fn apply_staged<T, E, F>(slot: &mut AssessmentState, change: F) -> Result<T, E>
where
    F: FnOnce(&mut AssessmentState) -> Result<T, E>,
{
    let mut staged = slot.clone();
    let outcome = change(&mut staged)?;
    *slot = staged;
    Ok(outcome)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

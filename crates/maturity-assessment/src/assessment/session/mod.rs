//! Session-scoped assessment workflow: the service facade, its storage seam, and HTTP routes.

pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use router::assessment_router;
pub use service::{
    AssessmentService, RenderedReport, ReportRequest, SessionServiceError, SessionView,
};
pub use store::{apply_staged, SessionId, SessionStore, StoreError};

use std::io::Read;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::super::aggregate::{domain_averages, overall_average};
use super::super::catalog::Sector;
use super::super::charts::{heatmap_chart, summary_chart, ChartImage, ChartKind};
use super::super::report::{
    build_report, optional_logo, write_recommendations_csv, Report, ReportError, ReportMetadata,
    ReportRenderer,
};
use super::super::responses::{apply_responses, parse_responses, ResponseImportError};
use super::super::state::{AssessmentState, Completion, ScoreError};
use super::super::summary::{heatmap_rows, AssessmentSummary, HeatmapRow, IncompleteAssessment};
use super::store::{SessionId, SessionStore, StoreError};
use crate::config::ReportConfig;

/// Service owning the per-session assessment lifecycle, from sector choice to PDF export.
pub struct AssessmentService<S, R> {
    store: Arc<S>,
    renderer: Arc<R>,
    report: ReportConfig,
}

/// Random identifiers, so one client cannot guess another's session.
fn next_session_id() -> SessionId {
    SessionId(Uuid::new_v4().to_string())
}

impl<S, R> AssessmentService<S, R>
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    pub fn new(store: Arc<S>, renderer: Arc<R>, report: ReportConfig) -> Self {
        Self {
            store,
            renderer,
            report,
        }
    }

    /// Opens a session with an empty questionnaire for the sector.
    pub fn start(&self, sector: Sector) -> Result<SessionView, SessionServiceError> {
        let session_id = next_session_id();
        let state = AssessmentState::new(sector);
        let view = SessionView::new(&session_id, &state);
        self.store.insert(session_id.clone(), state)?;
        info!(session = %session_id, sector = sector.label(), "assessment session started");
        Ok(view)
    }

    pub fn get(&self, session_id: &SessionId) -> Result<SessionView, SessionServiceError> {
        let state = self.load(session_id)?;
        Ok(SessionView::new(session_id, &state))
    }

    /// Discards the session and every rating it holds.
    pub fn end(&self, session_id: &SessionId) -> Result<(), SessionServiceError> {
        self.store.remove(session_id)?;
        info!(session = %session_id, "assessment session ended");
        Ok(())
    }

    /// Switches sector, clearing all prior ratings.
    pub fn select_sector(
        &self,
        session_id: &SessionId,
        sector: Sector,
    ) -> Result<SessionView, SessionServiceError> {
        self.mutate(session_id, |state| {
            state.reset_for_sector(sector);
            info!(session = %session_id, sector = sector.label(), "sector reset");
            Ok(())
        })
    }

    pub fn set_score(
        &self,
        session_id: &SessionId,
        domain: &str,
        criterion_index: usize,
        level: i64,
    ) -> Result<SessionView, SessionServiceError> {
        self.mutate(session_id, |state| {
            let criterion = state.set_score(domain, criterion_index, level)?;
            debug!(session = %session_id, %criterion, level, "score recorded");
            Ok(())
        })
    }

    pub fn clear_score(
        &self,
        session_id: &SessionId,
        domain: &str,
        criterion_index: usize,
    ) -> Result<SessionView, SessionServiceError> {
        self.mutate(session_id, |state| {
            state.clear_score(domain, criterion_index)?;
            Ok(())
        })
    }

    /// Bulk-loads ratings from a `Domain,Criterion,Level` CSV; all rows apply or none do.
    pub fn import_responses<T: Read>(
        &self,
        session_id: &SessionId,
        reader: T,
    ) -> Result<SessionView, SessionServiceError> {
        let entries = parse_responses(reader)?;
        self.mutate(session_id, |state| {
            let applied = apply_responses(state, &entries)?;
            info!(session = %session_id, applied, "responses imported");
            Ok(())
        })
    }

    pub fn summary(
        &self,
        session_id: &SessionId,
    ) -> Result<AssessmentSummary, SessionServiceError> {
        let state = self.load(session_id)?;
        Ok(AssessmentSummary::from_state(&state)?)
    }

    pub fn chart(
        &self,
        session_id: &SessionId,
        kind: ChartKind,
    ) -> Result<ChartImage, SessionServiceError> {
        let state = self.load(session_id)?;
        let averages = domain_averages(&state);
        let summary =
            AssessmentSummary::from_aggregates(&state, &averages, overall_average(&state))?;
        Ok(match kind {
            ChartKind::Summary => summary_chart(&averages),
            ChartKind::Heatmap => heatmap_chart(&summary.heatmap),
        })
    }

    /// Recommendations table as CSV, matching the rows printed in the report.
    pub fn recommendations_csv(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<u8>, SessionServiceError> {
        let summary = self.summary(session_id)?;
        let mut buffer = Vec::new();
        write_recommendations_csv(&summary.domains, &mut buffer)?;
        Ok(buffer)
    }

    /// Assembles the report from one pass of aggregation shared with its charts.
    pub fn build_report(
        &self,
        session_id: &SessionId,
        request: ReportRequest,
    ) -> Result<Report, SessionServiceError> {
        let state = self.load(session_id)?;
        let averages = domain_averages(&state);
        let overall = overall_average(&state);
        let summary = AssessmentSummary::from_aggregates(&state, &averages, overall)?;

        let charts = vec![summary_chart(&averages), heatmap_chart(&summary.heatmap)];
        let metadata = request.into_metadata(&self.report, Local::now().date_naive());
        let report = build_report(metadata, &averages, overall, charts)?
            .with_logo(optional_logo(self.report.logo_path.as_deref()));
        Ok(report)
    }

    pub fn export(
        &self,
        session_id: &SessionId,
        request: ReportRequest,
    ) -> Result<RenderedReport, SessionServiceError> {
        let report = self.build_report(session_id, request)?;
        let bytes = self
            .renderer
            .render(&report)
            .map_err(|err| SessionServiceError::Report(ReportError::Render(err)))?;
        info!(
            session = %session_id,
            bytes = bytes.len(),
            organization = %report.metadata.organization,
            "report exported"
        );
        Ok(RenderedReport {
            bytes,
            content_type: self.renderer.content_type(),
            file_name: self.renderer.file_name(),
        })
    }

    fn load(&self, session_id: &SessionId) -> Result<AssessmentState, SessionServiceError> {
        let state = self
            .store
            .fetch(session_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(state)
    }

    /// Applies a change atomically through the store; a failed change leaves the session as it was.
    fn mutate<F>(
        &self,
        session_id: &SessionId,
        change: F,
    ) -> Result<SessionView, SessionServiceError>
    where
        F: FnOnce(&mut AssessmentState) -> Result<(), SessionServiceError>,
    {
        self.store.modify(session_id, |state| {
            change(state)?;
            Ok(SessionView::new(session_id, state))
        })
    }
}

/// Header fields supplied at export time; missing values fall back to configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub assessor: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ReportRequest {
    pub fn into_metadata(self, defaults: &ReportConfig, today: NaiveDate) -> ReportMetadata {
        ReportMetadata {
            organization: self
                .organization
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| defaults.organization.clone()),
            assessor: self.assessor.unwrap_or_default(),
            date: self.date.unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: &'static str,
}

/// Public view of a session's answers and progress.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub sector: Sector,
    pub sector_label: &'static str,
    pub completion: Completion,
    pub scores: Vec<HeatmapRow>,
}

impl SessionView {
    fn new(session_id: &SessionId, state: &AssessmentState) -> Self {
        Self {
            session_id: session_id.clone(),
            sector: state.sector(),
            sector_label: state.sector().label(),
            completion: state.completion(),
            scores: heatmap_rows(state),
        }
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Incomplete(#[from] IncompleteAssessment),
    #[error(transparent)]
    Import(#[from] ResponseImportError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("failed to write recommendations table: {0}")]
    Table(#[from] csv::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

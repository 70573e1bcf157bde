use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::super::catalog::{domain_views, sector_views, DomainView, Sector, SectorView};
use super::super::charts::ChartKind;
use super::super::report::ReportRenderer;
use super::super::rubric::{scale, MaturityLevelView};
use super::service::{AssessmentService, ReportRequest, SessionServiceError};
use super::store::{SessionId, SessionStore, StoreError};

/// Router builder exposing the questionnaire, summary, and export endpoints.
pub fn assessment_router<S, R>(service: Arc<AssessmentService<S, R>>) -> Router
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    Router::new()
        .route("/api/v1/catalog", get(catalog_handler))
        .route("/api/v1/assessments", post(start_handler::<S, R>))
        .route(
            "/api/v1/assessments/:session_id",
            get(session_handler::<S, R>).delete(end_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/sector",
            put(sector_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/scores",
            put(score_handler::<S, R>).delete(clear_score_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/responses",
            post(responses_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/summary",
            get(summary_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/charts/:kind",
            get(chart_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/recommendations",
            get(recommendations_handler::<S, R>),
        )
        .route(
            "/api/v1/assessments/:session_id/report",
            post(report_handler::<S, R>),
        )
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogView {
    pub(crate) levels: Vec<MaturityLevelView>,
    pub(crate) sectors: Vec<SectorView>,
    pub(crate) domains: Vec<DomainView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SectorRequest {
    pub(crate) sector: Sector,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) domain: String,
    pub(crate) criterion: usize,
    pub(crate) level: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CriterionRequest {
    pub(crate) domain: String,
    pub(crate) criterion: usize,
}

pub(crate) async fn catalog_handler() -> Json<CatalogView> {
    Json(CatalogView {
        levels: scale(),
        sectors: sector_views(),
        domains: domain_views(Sector::Energy),
    })
}

pub(crate) async fn start_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Json(request): Json<SectorRequest>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    match service.start(request.sector) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn session_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    respond_json(service.get(&SessionId(session_id)))
}

pub(crate) async fn end_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    match service.end(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn sector_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
    Json(request): Json<SectorRequest>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    respond_json(service.select_sector(&SessionId(session_id), request.sector))
}

pub(crate) async fn score_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    respond_json(service.set_score(
        &SessionId(session_id),
        &request.domain,
        request.criterion,
        request.level,
    ))
}

pub(crate) async fn clear_score_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
    Json(request): Json<CriterionRequest>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    respond_json(service.clear_score(
        &SessionId(session_id),
        &request.domain,
        request.criterion,
    ))
}

pub(crate) async fn responses_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
    body: String,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    respond_json(service.import_responses(&SessionId(session_id), Cursor::new(body.into_bytes())))
}

pub(crate) async fn summary_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    respond_json(service.summary(&SessionId(session_id)))
}

pub(crate) async fn chart_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path((session_id, kind)): Path<(String, String)>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    let kind = match kind.parse::<ChartKind>() {
        Ok(kind) => kind,
        Err(message) => {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
        }
    };

    match service.chart(&SessionId(session_id), kind) {
        Ok(chart) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::IMAGE_SVG.as_ref())],
            chart.to_svg(),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn recommendations_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    match service.recommendations_csv(&SessionId(session_id)) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref())],
            bytes,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn report_handler<S, R>(
    State(service): State<Arc<AssessmentService<S, R>>>,
    Path(session_id): Path<String>,
    Json(request): Json<ReportRequest>,
) -> Response
where
    S: SessionStore + 'static,
    R: ReportRenderer + 'static,
{
    match service.export(&SessionId(session_id), request) {
        Ok(rendered) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, rendered.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", rendered.file_name),
                ),
            ],
            rendered.bytes,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

fn respond_json<T: Serialize>(result: Result<T, SessionServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl SessionServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionServiceError::Score(_) | SessionServiceError::Import(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SessionServiceError::Incomplete(_) => StatusCode::CONFLICT,
            SessionServiceError::Report(super::super::report::ReportError::Incomplete(_)) => {
                StatusCode::CONFLICT
            }
            SessionServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            SessionServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            SessionServiceError::Report(_)
            | SessionServiceError::Table(_)
            | SessionServiceError::Store(StoreError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SessionServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "assessment request failed");
        }
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

use std::io::Cursor;
use std::sync::Arc;

use chrono::NaiveDate;

use super::common::*;
use crate::assessment::catalog::{domains_for, Sector};
use crate::assessment::charts::{ChartElement, ChartKind};
use crate::assessment::report::{PdfRenderer, ReportError};
use crate::assessment::session::{
    AssessmentService, ReportRequest, SessionId, SessionServiceError, StoreError,
};
use crate::assessment::state::ScoreError;
use crate::config::ReportConfig;

#[test]
fn sessions_hold_independent_state() {
    let (service, sessions) = build_service();
    let first = service.start(Sector::Energy).expect("first session");
    let second = service.start(Sector::Energy).expect("second session");
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(sessions.len(), 2);

    service
        .set_score(&first.session_id, "Governance", 0, 5)
        .expect("score accepted");

    let untouched = service.get(&second.session_id).expect("second session");
    assert_eq!(untouched.completion.rated, 0);
    let scored = service.get(&first.session_id).expect("first session");
    assert_eq!(scored.completion.rated, 1);
    assert_eq!(scored.scores[0].scores[0], Some(5));
}

#[test]
fn rejected_scores_do_not_touch_the_session() {
    let (service, _) = build_service();
    let session = service.start(Sector::Banking).expect("session");
    service
        .set_score(&session.session_id, "Governance", 1, 2)
        .expect("score accepted");

    for level in [6, -1] {
        let err = service
            .set_score(&session.session_id, "Governance", 1, level)
            .expect_err("out of range level rejected");
        assert!(matches!(err, SessionServiceError::Score(ScoreError::Level(_))));
    }

    let view = service.get(&session.session_id).expect("session");
    assert_eq!(view.scores[0].scores[1], Some(2));
    assert_eq!(view.completion.rated, 1);
}

#[test]
fn switching_sector_clears_scores() {
    let (service, _) = build_service();
    let session = service.start(Sector::Energy).expect("session");
    rate_all(&service, &session.session_id, 3);

    let view = service
        .select_sector(&session.session_id, Sector::Space)
        .expect("sector switched");

    assert_eq!(view.sector, Sector::Space);
    assert_eq!(view.completion.rated, 0);
    assert!(view
        .scores
        .iter()
        .all(|row| row.scores.iter().all(Option::is_none)));
}

#[test]
fn summary_requires_every_domain_to_be_rated() {
    let (service, _) = build_service();
    let session = service.start(Sector::Health).expect("session");
    service
        .set_score(&session.session_id, "Governance", 0, 1)
        .expect("score accepted");

    let err = service
        .summary(&session.session_id)
        .expect_err("incomplete assessment");
    assert!(matches!(err, SessionServiceError::Incomplete(_)));

    let err = service
        .export(&session.session_id, ReportRequest::default())
        .expect_err("report blocked");
    assert!(matches!(err, SessionServiceError::Incomplete(_)));
}

#[test]
fn summary_and_report_agree_on_displayed_averages() {
    let (service, _) = build_service();
    let session = service.start(Sector::Transport).expect("session");
    let id = &session.session_id;
    for (index, level) in [0, 1, 2, 3].into_iter().enumerate() {
        service.set_score(id, "Governance", index, level).unwrap();
    }
    for (index, level) in [2, 3, 3].into_iter().enumerate() {
        service.set_score(id, "Risk Management", index, level).unwrap();
    }
    service.set_score(id, "Operational Security", 0, 5).unwrap();
    service.set_score(id, "Incident Management", 3, 4).unwrap();

    let summary = service.summary(id).expect("summary");
    let report = service
        .build_report(id, ReportRequest::default())
        .expect("report");

    assert_eq!(summary.domains[0].average, 1.5);
    assert_eq!(summary.domains[1].average_display, "2.67");
    let expected: Vec<String> = summary
        .domains
        .iter()
        .map(|entry| {
            format!(
                "{}: {} ({})",
                entry.domain, entry.recommendation, entry.average_display
            )
        })
        .collect();
    assert_eq!(report.recommendation_lines(), expected);
    assert_eq!(report.overall_average, summary.overall_average);
    assert_eq!(report.charts.len(), 2);
}

#[test]
fn uniform_rating_exports_a_pdf() {
    let (service, _) = build_service();
    let session = service.start(Sector::DrinkingWater).expect("session");
    rate_all(&service, &session.session_id, 4);

    let summary = service.summary(&session.session_id).expect("summary");
    assert_eq!(summary.overall_average, 4.0);
    assert!(summary
        .domains
        .iter()
        .all(|entry| entry.recommendation == "Consider optimization and automation."));

    let rendered = service
        .export(
            &session.session_id,
            ReportRequest {
                organization: None,
                assessor: Some("A. Auditor".to_string()),
                date: NaiveDate::from_ymd_opt(2025, 1, 31),
            },
        )
        .expect("export succeeds");

    assert_eq!(rendered.content_type, "application/pdf");
    assert_eq!(rendered.file_name, "maturity_report.pdf");
    assert!(rendered.bytes.starts_with(b"%PDF-"));
}

#[test]
fn report_metadata_falls_back_to_configured_defaults() {
    let (service, _) = build_service();
    let session = service.start(Sector::Energy).expect("session");
    rate_all(&service, &session.session_id, 2);

    let report = service
        .build_report(
            &session.session_id,
            ReportRequest {
                organization: Some("  ".to_string()),
                assessor: None,
                date: NaiveDate::from_ymd_opt(2024, 11, 5),
            },
        )
        .expect("report");

    assert_eq!(report.metadata.organization, ReportConfig::DEFAULT_ORGANIZATION);
    assert_eq!(report.metadata.assessor, "");
    assert_eq!(report.header_lines()[2], "Date: 2024-11-05");
    assert!(report.logo.is_none());
}

#[test]
fn missing_logo_does_not_block_export() {
    let sessions = MemorySessions::default();
    let service = AssessmentService::new(
        Arc::new(sessions),
        Arc::new(PdfRenderer),
        ReportConfig {
            organization: "Tools of Tech P.C.".to_string(),
            logo_path: Some("/nonexistent/tools_of_tech_logo.jpg".into()),
        },
    );
    let session = service.start(Sector::Energy).expect("session");
    rate_all(&service, &session.session_id, 5);

    let rendered = service
        .export(&session.session_id, ReportRequest::default())
        .expect("export succeeds without logo");
    assert!(rendered.bytes.starts_with(b"%PDF-"));
}

#[test]
fn responses_import_is_atomic() {
    let (service, _) = build_service();
    let session = service.start(Sector::Energy).expect("session");

    let err = service
        .import_responses(
            &session.session_id,
            Cursor::new("Domain,Criterion,Level\nGovernance,1,3\nGovernance,9,3\n"),
        )
        .expect_err("criterion 9 rejected");
    assert!(matches!(err, SessionServiceError::Import(_)));
    assert_eq!(
        service.get(&session.session_id).unwrap().completion.rated,
        0
    );

    let view = service
        .import_responses(
            &session.session_id,
            Cursor::new("Domain,Criterion,Level\nGovernance,1,3\nIncident Management,4,1\n"),
        )
        .expect("rows applied");
    assert_eq!(view.completion.rated, 2);
}

#[test]
fn charts_are_built_from_session_scores() {
    let (service, _) = build_service();
    let session = service.start(Sector::Energy).expect("session");
    rate_all(&service, &session.session_id, 3);

    let heatmap = service
        .chart(&session.session_id, ChartKind::Heatmap)
        .expect("heatmap");
    assert_eq!(heatmap.title, "Heatmap of Scores");
    let labels = heatmap
        .elements
        .iter()
        .filter(|element| matches!(element, ChartElement::Text { content, .. } if content == "3"))
        .count();
    assert_eq!(labels, 16);

    let csv = service
        .recommendations_csv(&session.session_id)
        .expect("csv");
    let text = String::from_utf8(csv).expect("utf8");
    assert!(text.starts_with("Domain,Avg Score,Recommendation\n"));
    assert!(text.contains("Governance,3.00,Develop structured monitoring and review."));
}

#[test]
fn ended_sessions_are_gone() {
    let (service, sessions) = build_service();
    let session = service.start(Sector::Energy).expect("session");
    service.end(&session.session_id).expect("session ended");
    assert_eq!(sessions.len(), 0);

    let err = service
        .get(&session.session_id)
        .expect_err("session discarded");
    assert!(matches!(err, SessionServiceError::Store(StoreError::NotFound)));
    assert!(matches!(
        service.end(&SessionId("sess-unknown".to_string())),
        Err(SessionServiceError::Store(StoreError::NotFound))
    ));
}

#[test]
fn render_failures_surface_as_report_errors() {
    let err = SessionServiceError::from(ReportError::Incomplete(
        crate::assessment::summary::IncompleteAssessment {
            unscored_domains: vec!["Governance"],
        },
    ));
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}

#[test]
fn concurrent_ratings_on_one_session_are_all_kept() {
    let (service, _) = build_service();
    let criteria: Vec<(&'static str, usize)> = domains_for(Sector::Energy)
        .iter()
        .flat_map(|domain| (0..domain.criteria.len()).map(move |index| (domain.name, index)))
        .collect();

    for _ in 0..50 {
        let session = service.start(Sector::Energy).expect("session");
        std::thread::scope(|scope| {
            for &(domain, index) in &criteria {
                let service = &service;
                let session_id = &session.session_id;
                scope.spawn(move || {
                    service
                        .set_score(session_id, domain, index, 3)
                        .expect("score accepted");
                });
            }
        });

        let view = service.get(&session.session_id).expect("session");
        assert_eq!(view.completion.rated, criteria.len());
        service.end(&session.session_id).expect("session ends");
    }
}

#[test]
fn session_ids_are_random_uuids() {
    let (service, _) = build_service();
    let first = service.start(Sector::Space).expect("session");
    let second = service.start(Sector::Space).expect("session");

    for id in [&first.session_id, &second.session_id] {
        assert!(uuid::Uuid::parse_str(&id.0).is_ok(), "{id}");
    }
    assert_ne!(first.session_id, second.session_id);
}
